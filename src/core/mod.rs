//! The headless editing engine.
//!
//! Everything here works on plain values and key presses: the input buffer,
//! history, kill ring, undo, key tables and the command set. The terminal
//! side lives in [`crate::terminal`]; [`session::EditorSession`] ties the two
//! together.

pub mod buffer;
pub mod colorizer;
pub mod command;
pub mod commands;
pub mod completion;
pub mod decoder;
pub mod dispatcher;
pub mod editor;
pub mod history;
pub mod history_file;
pub mod input;
pub mod keymap;
pub mod kill_ring;
pub mod prediction;
pub mod search;
pub mod session;
pub mod undo;
pub mod vi;
pub mod words;
