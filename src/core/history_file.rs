//! History persistence
//!
//! One entry per line, UTF-8. Multi-line entries escape their newlines as
//! `\n` and literal backslashes as `\\`, so every physical line of the file
//! is exactly one entry.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::HistorySaveStyle;
use crate::core::history::History;
use crate::error::Result;

pub fn escape_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

pub fn unescape_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
    style: HistorySaveStyle,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>, style: HistorySaveStyle) -> Self {
        Self {
            path: path.into(),
            style,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every entry into `history`. A missing file is an empty history.
    pub fn load_into(&self, history: &mut History) -> Result<usize> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut loaded = 0;
        for line in content.lines() {
            if history.add(&unescape_line(line)) {
                loaded += 1;
            }
        }
        debug!(path = %self.path.display(), loaded, "history loaded");
        Ok(loaded)
    }

    /// Called after each accepted line
    pub fn line_accepted(&self, line: &str) -> Result<()> {
        if self.style != HistorySaveStyle::Incremental {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", escape_line(line))?;
        Ok(())
    }

    /// Called when the session ends
    pub fn session_ended(&self, history: &History) -> Result<()> {
        match self.style {
            // incremental appends can leave duplicates behind; compact them too
            HistorySaveStyle::OnExit | HistorySaveStyle::Incremental => self.save_all(history),
            HistorySaveStyle::None => Ok(()),
        }
    }

    /// Rewrite the whole file atomically
    pub fn save_all(&self, history: &History) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut temp_file = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file_mut());
            for entry in history.entries() {
                writeln!(writer, "{}", escape_line(&entry.line))?;
            }
            writer.flush()?;
        }
        // data must hit the disk before the rename
        temp_file.as_file().sync_all()?;
        temp_file.persist(&self.path).map_err(|e| {
            warn!(path = %self.path.display(), "could not replace history file");
            e.error
        })?;
        Ok(())
    }
}
