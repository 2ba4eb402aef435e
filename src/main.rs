//! chordline demo: a small shell-like prompt that echoes each accepted line.
//!
//! Logging is off unless `CHORDLINE_LOG` holds a filter (e.g. `debug` or
//! `chordline::core=trace`); output goes to `CHORDLINE_LOG_FILE` or stderr.

mod cli;

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use chordline::config::{Config, HistorySaveStyle};
use chordline::core::completion::WordListCompleter;
use chordline::core::editor::ReadLineOutcome;
use chordline::core::history_file::HistoryFile;
use chordline::core::session::EditorSession;
use chordline::terminal::raw::RawMode;
use chordline::terminal::transport::CrosstermTerminal;
use tracing::info;

const DEMO_WORDS: &[&str] = &[
    "cargo", "build", "check", "clippy", "test", "run", "git", "status", "commit", "checkout",
    "exit", "help", "history",
];

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let Ok(filter) = std::env::var("CHORDLINE_LOG") else {
        return Ok(());
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_ansi(false);
    match std::env::var("CHORDLINE_LOG_FILE") {
        Ok(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_writer(Mutex::new(file)).init();
        }
        Err(_) => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli::Cli::parse()?;
    init_logging()?;

    let mut config = Config::default();
    cli.apply_to_config(&mut config);

    let mut session = EditorSession::from_config(&config)?;
    session.set_completer(Box::new(WordListCompleter::new(DEMO_WORDS.iter().copied())));
    if let Some(path) = &cli.history {
        session.set_history_file(HistoryFile::new(path, HistorySaveStyle::Incremental))?;
    }

    let prompt = cli.prompt.clone().unwrap_or_else(|| "chordline> ".to_string());
    let mut term = CrosstermTerminal::new()?;
    let raw = RawMode::new()?;

    loop {
        match session.read_line(&mut term, &prompt)? {
            ReadLineOutcome::Accepted(line) if line.trim() == "exit" => break,
            ReadLineOutcome::Accepted(line) if line.trim() == "history" => {
                let mut out = std::io::stdout();
                for (i, entry) in session.history().entries().enumerate() {
                    write!(out, "{:5}  {}\r\n", i + 1, entry.line)?;
                }
                out.flush()?;
            }
            ReadLineOutcome::Accepted(line) => {
                let mut out = std::io::stdout();
                write!(out, "{}\r\n", line.replace('\n', "\r\n"))?;
                out.flush()?;
            }
            ReadLineOutcome::Cancelled => continue,
            ReadLineOutcome::Eof => break,
        }
    }

    drop(raw);
    session.end_session()?;
    info!("demo finished");
    Ok(())
}
