use std::io::{self, Write};

use manelito_core::AppViewModel;

const BAR_WIDTH: usize = 30;

/// Draws view-model frames as status lines and a progress bar on stderr.
#[derive(Default)]
pub struct Renderer {
    last_status: String,
    last_progress: Option<u8>,
    bar_open: bool,
}

impl Renderer {
    pub fn draw(&mut self, view: &AppViewModel) {
        let mut err = io::stderr().lock();

        if view.progress_visible && self.last_progress != Some(view.progress) {
            let _ = write!(err, "\r{}", progress_line(view.progress));
            self.last_progress = Some(view.progress);
            self.bar_open = true;
        }

        if view.status_text != self.last_status {
            self.close_bar(&mut err);
            let _ = writeln!(err, "{}", view.status_text);
            self.last_status.clone_from(&view.status_text);
            if !view.progress_visible {
                self.last_progress = None;
            }
        }
        let _ = err.flush();
    }

    pub fn finish(&mut self) {
        let mut err = io::stderr().lock();
        self.close_bar(&mut err);
        let _ = err.flush();
    }

    fn close_bar(&mut self, out: &mut impl Write) {
        if self.bar_open {
            let _ = writeln!(out);
            self.bar_open = false;
        }
    }
}

fn progress_line(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = BAR_WIDTH * usize::from(percent) / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        percent
    )
}
