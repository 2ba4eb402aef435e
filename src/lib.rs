//! chordline: an interactive line editor for terminal programs.
//!
//! ```no_run
//! use chordline::config::Options;
//! use chordline::core::editor::ReadLineOutcome;
//! use chordline::core::session::EditorSession;
//! use chordline::terminal::raw::RawMode;
//! use chordline::terminal::transport::CrosstermTerminal;
//!
//! # fn main() -> chordline::error::Result<()> {
//! let mut session = EditorSession::new(Options::default());
//! let mut term = CrosstermTerminal::new()?;
//! let _raw = RawMode::new()?;
//! while let ReadLineOutcome::Accepted(line) = session.read_line(&mut term, "> ")? {
//!     println!("{line}\r");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod terminal;

pub use crate::config::{Config, Options};
pub use crate::core::editor::ReadLineOutcome;
pub use crate::core::session::EditorSession;
pub use crate::error::{EditError, Result};
