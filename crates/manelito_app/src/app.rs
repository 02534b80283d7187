use std::io::{self, Write};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail};
use engine_logging::{engine_info, engine_warn};
use manelito_core::{update, AppState, Effect, Msg, SessionState};

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::effects::EffectRunner;
use crate::render::Renderer;

const FRAME: Duration = Duration::from_millis(75);
/// Slack on top of the configured probe and fetch limits before giving up on the engine.
const ENGINE_GRACE: Duration = Duration::from_secs(10);

struct App {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
    pending_writes: usize,
}

impl App {
    fn dispatch(&mut self, msg: Msg) {
        if let Msg::PersistCompleted { session_id, .. } = &msg {
            if *session_id == self.state.session_id() {
                self.pending_writes = self.pending_writes.saturating_sub(1);
            }
        }

        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;

        self.pending_writes += effects
            .iter()
            .filter(|effect| matches!(effect, Effect::WriteTemp { .. } | Effect::WriteAs { .. }))
            .count();
        self.runner.enqueue(effects);

        if self.state.consume_dirty() {
            self.renderer.draw(&self.state.view());
        }
    }

    /// Feeds engine events into the state machine while `busy` holds.
    fn pump(&mut self, budget: Duration, busy: impl Fn(&App) -> bool) -> anyhow::Result<()> {
        let deadline = Instant::now() + budget;
        while busy(self) {
            if Instant::now() >= deadline {
                self.runner.shutdown();
                bail!("The scraper engine stopped responding");
            }
            let msg = self.runner.next_msg(FRAME)?.unwrap_or(Msg::Tick);
            self.dispatch(msg);
        }
        Ok(())
    }

    fn check_persist(&self) -> anyhow::Result<()> {
        match self.state.persist_failure() {
            Some(failure) => Err(anyhow!(
                "{}: {}",
                failure.message,
                failure.detail.as_deref().unwrap_or("unknown cause")
            )),
            None => Ok(()),
        }
    }
}

pub fn run(cli: Cli, config: AppConfig) -> anyhow::Result<ExitCode> {
    let engine_config = config.engine_config();
    let scrape_budget = engine_config.probe.timeout
        + engine_config.fetch.connect_timeout
        + engine_config.fetch.request_timeout
        + ENGINE_GRACE;

    let mut app = App {
        state: AppState::with_policy(config.failure_policy()),
        runner: EffectRunner::new(engine_config),
        renderer: Renderer::default(),
        pending_writes: 0,
    };
    app.renderer.draw(&app.state.view());

    app.dispatch(Msg::InputChanged(cli.url.clone()));
    app.dispatch(Msg::ScrapeClicked);
    app.pump(scrape_budget, |app| {
        matches!(
            app.state.session(),
            SessionState::Validating | SessionState::Fetching
        )
    })?;
    app.renderer.finish();

    if let Some(failure) = app.state.failure() {
        engine_warn!("Scrape of {:?} failed: {:?}", cli.url, failure);
        let message = match &failure.detail {
            Some(detail) => format!("{} ({detail})", failure.message),
            None => failure.message.clone(),
        };
        app.dispatch(Msg::FailureAcknowledged);
        bail!(message);
    }

    let Some(page) = app.state.page().cloned() else {
        bail!("No page was produced for {}", cli.url);
    };
    engine_info!(
        "Scraped {} (final {}) title={:?} fetched_utc={}",
        page.source_url,
        page.final_url,
        page.title,
        page.fetched_utc
    );
    if let Some(title) = &page.title {
        eprintln!("Title: {title}");
    }

    if cli.open {
        app.dispatch(Msg::OpenClicked);
        app.pump(ENGINE_GRACE, |app| app.pending_writes > 0)?;
        app.check_persist()?;
        if let Some(path) = app.state.view().last_temp_path {
            println!("{}", path.display());
        }
    }

    if let Some(path) = cli.save.clone() {
        app.dispatch(Msg::SaveAsChosen(path));
        app.pump(ENGINE_GRACE, |app| app.pending_writes > 0)?;
        app.check_persist()?;
        if let Some(path) = app.state.view().last_saved_path {
            println!("{}", path.display());
        }
    }

    if cli.prints_to_stdout() {
        let mut out = io::stdout().lock();
        out.write_all(page.html.as_bytes())?;
        writeln!(out)?;
    }

    app.renderer.finish();
    Ok(ExitCode::SUCCESS)
}
