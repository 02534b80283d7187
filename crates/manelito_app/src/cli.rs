use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use engine_logging::LogDestination;
use log::LevelFilter;

/// Fetch one web page and store it as canonical HTML.
#[derive(Debug, Parser)]
#[command(name = "manelito", version)]
pub struct Cli {
    /// Page to scrape; a bare domain gets `http://` prepended.
    pub url: String,

    /// Save the canonical HTML here (`.html` is added when there is no extension).
    #[arg(short, long, value_name = "PATH")]
    pub save: Option<PathBuf>,

    /// Write the page to the viewer temp file and print its path.
    #[arg(short, long)]
    pub open: bool,

    /// RON configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where log output goes (overrides the config file).
    #[arg(long, value_enum)]
    pub log: Option<LogTarget>,

    /// More log output; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

impl Cli {
    /// The terminal shares stderr with the progress line, so it stays quiet by default.
    pub fn log_level(&self, destination: LogDestination) -> LevelFilter {
        match (self.verbose, destination) {
            (0, LogDestination::File) => LevelFilter::Info,
            (0, _) => LevelFilter::Warn,
            (1, _) => LevelFilter::Info,
            (2, _) => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Without `--save` or `--open` the page goes to stdout.
    pub fn prints_to_stdout(&self) -> bool {
        self.save.is_none() && !self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "manelito",
            "example.com",
            "--save",
            "out.html",
            "--open",
            "--log",
            "both",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.url, "example.com");
        assert_eq!(cli.save, Some(PathBuf::from("out.html")));
        assert!(cli.open);
        assert_eq!(cli.log, Some(LogTarget::Both));
        assert_eq!(cli.log_level(LogDestination::Both), LevelFilter::Debug);
        assert!(!cli.prints_to_stdout());
    }

    #[test]
    fn quiet_terminal_by_default() {
        let cli = Cli::try_parse_from(["manelito", "example.com"]).unwrap();
        assert_eq!(cli.log_level(LogDestination::Terminal), LevelFilter::Warn);
        assert_eq!(cli.log_level(LogDestination::File), LevelFilter::Info);
        assert!(cli.prints_to_stdout());
    }
}
