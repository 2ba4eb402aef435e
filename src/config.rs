// Configuration module
// Raw key/value configuration plus the typed options the editor reads

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::core::words::WordDelimiters;
use crate::error::{EditError, Result};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub keybindings: HashMap<String, String>,
    pub settings: HashMap<String, ConfigValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl Config {
    /// Bind a key sequence to a command
    pub fn bind(&mut self, key: &str, command: &str) {
        self.keybindings
            .insert(key.to_string(), command.to_string());
    }

    /// Set a configuration value
    pub fn set<V: Into<ConfigValue>>(&mut self, key: &str, value: V) {
        self.settings.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.settings.get(key)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Int(i)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Cmd,
    Emacs,
    Vi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BellStyle {
    None,
    #[default]
    Audible,
    Visual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictionView {
    None,
    #[default]
    Inline,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistorySaveStyle {
    None,
    #[default]
    Incremental,
    OnExit,
}

fn invalid(key: &str, reason: impl Into<String>) -> EditError {
    EditError::InvalidSetting {
        key: key.to_string(),
        reason: reason.into(),
    }
}

impl FromStr for EditMode {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cmd" | "windows" => Ok(EditMode::Cmd),
            "emacs" => Ok(EditMode::Emacs),
            "vi" => Ok(EditMode::Vi),
            other => Err(invalid("edit_mode", format!("unknown mode `{}`", other))),
        }
    }
}

impl FromStr for BellStyle {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(BellStyle::None),
            "audible" => Ok(BellStyle::Audible),
            "visual" => Ok(BellStyle::Visual),
            other => Err(invalid("bell_style", format!("unknown bell style `{}`", other))),
        }
    }
}

impl FromStr for PredictionView {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(PredictionView::None),
            "inline" => Ok(PredictionView::Inline),
            "list" => Ok(PredictionView::List),
            other => Err(invalid("prediction_view", format!("unknown view `{}`", other))),
        }
    }
}

impl FromStr for HistorySaveStyle {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(HistorySaveStyle::None),
            "incremental" => Ok(HistorySaveStyle::Incremental),
            "on-exit" | "onexit" => Ok(HistorySaveStyle::OnExit),
            other => Err(invalid("history_save_style", format!("unknown style `{}`", other))),
        }
    }
}

/// Typed editor options
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub edit_mode: EditMode,
    pub history_no_duplicates: bool,
    pub maximum_history_count: usize,
    pub maximum_kill_ring_count: usize,
    pub escape_timeout: Duration,
    pub max_chord_length: usize,
    pub completion_query_items: usize,
    pub continuation_prompt: String,
    pub word_delimiters: WordDelimiters,
    pub bell_style: BellStyle,
    pub prediction_view: PredictionView,
    pub history_save_style: HistorySaveStyle,
    pub history_search_cursor_moves_to_end: bool,
    pub vi_start_in_insert: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            edit_mode: EditMode::Cmd,
            history_no_duplicates: true,
            maximum_history_count: 4096,
            maximum_kill_ring_count: 10,
            escape_timeout: Duration::from_millis(100),
            max_chord_length: 4,
            completion_query_items: 100,
            continuation_prompt: ">> ".to_string(),
            word_delimiters: WordDelimiters::default(),
            bell_style: BellStyle::Audible,
            prediction_view: PredictionView::Inline,
            history_save_style: HistorySaveStyle::Incremental,
            history_search_cursor_moves_to_end: true,
            vi_start_in_insert: true,
        }
    }
}

fn expect_bool(key: &str, value: &ConfigValue) -> Result<bool> {
    match value {
        ConfigValue::Bool(b) => Ok(*b),
        _ => Err(invalid(key, "expected a boolean")),
    }
}

fn expect_count(key: &str, value: &ConfigValue, min: i64) -> Result<usize> {
    match value {
        ConfigValue::Int(i) if *i >= min => Ok(*i as usize),
        ConfigValue::Int(i) => Err(invalid(key, format!("{} is below the minimum of {}", i, min))),
        _ => Err(invalid(key, "expected an integer")),
    }
}

fn expect_str<'a>(key: &str, value: &'a ConfigValue) -> Result<&'a str> {
    match value {
        ConfigValue::String(s) => Ok(s),
        _ => Err(invalid(key, "expected a string")),
    }
}

impl Options {
    /// Build options from raw settings. Unknown keys are ignored.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut options = Options::default();
        for (key, value) in &config.settings {
            options.apply(key, value)?;
        }
        Ok(options)
    }

    /// Apply a single setting
    pub fn apply(&mut self, key: &str, value: &ConfigValue) -> Result<()> {
        match key {
            "edit_mode" => self.edit_mode = expect_str(key, value)?.parse()?,
            "history_no_duplicates" => self.history_no_duplicates = expect_bool(key, value)?,
            "maximum_history_count" => self.maximum_history_count = expect_count(key, value, 1)?,
            "maximum_kill_ring_count" => {
                self.maximum_kill_ring_count = expect_count(key, value, 1)?
            }
            "escape_timeout_ms" => {
                self.escape_timeout = Duration::from_millis(expect_count(key, value, 0)? as u64)
            }
            "max_chord_length" => self.max_chord_length = expect_count(key, value, 1)?,
            "completion_query_items" => {
                self.completion_query_items = expect_count(key, value, 0)?
            }
            "continuation_prompt" => {
                self.continuation_prompt = expect_str(key, value)?.to_string()
            }
            "word_delimiters" => {
                self.word_delimiters = WordDelimiters::new(expect_str(key, value)?)
            }
            "bell_style" => self.bell_style = expect_str(key, value)?.parse()?,
            "prediction_view" => self.prediction_view = expect_str(key, value)?.parse()?,
            "history_save_style" => self.history_save_style = expect_str(key, value)?.parse()?,
            "history_search_cursor_moves_to_end" => {
                self.history_search_cursor_moves_to_end = expect_bool(key, value)?
            }
            "vi_start_in_insert" => self.vi_start_in_insert = expect_bool(key, value)?,
            _ => {}
        }
        Ok(())
    }
}
