//! Command-line argument parsing for the chordline demo.

use std::path::PathBuf;

use chordline::config::{Config, ConfigValue};

/// Command-line interface configuration.
#[derive(Debug, Default)]
pub struct Cli {
    /// Key handling style: cmd, emacs or vi
    pub mode: Option<String>,

    /// History file to load and append to
    pub history: Option<PathBuf>,

    /// Prompt text
    pub prompt: Option<String>,

    /// Show predictions as a list below the input
    pub list_view: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse() -> Result<Self, Box<dyn std::error::Error>> {
        Self::parse_from(std::env::args().skip(1))
    }

    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut cli = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-m" | "--mode" => match args.next() {
                    Some(mode) => cli.mode = Some(mode),
                    None => return Err("--mode requires a value".into()),
                },
                "-H" | "--history" => match args.next() {
                    Some(path) => cli.history = Some(PathBuf::from(path)),
                    None => return Err("--history requires a value".into()),
                },
                "-p" | "--prompt" => match args.next() {
                    Some(prompt) => cli.prompt = Some(prompt),
                    None => return Err("--prompt requires a value".into()),
                },
                "-l" | "--list-view" => cli.list_view = true,
                "-h" | "--help" => {
                    println!("chordline - interactive line editing demo");
                    println!();
                    println!("Usage: chordline [OPTIONS]");
                    println!();
                    println!("Options:");
                    println!("  -h, --help          Show this help message");
                    println!("  -m, --mode MODE     Key handling: cmd, emacs or vi");
                    println!("  -H, --history FILE  Load and save history in FILE");
                    println!("  -p, --prompt TEXT   Prompt to show");
                    println!("  -l, --list-view     Show history predictions as a list");
                    println!();
                    println!("Set CHORDLINE_LOG (e.g. debug) to enable logging;");
                    println!("CHORDLINE_LOG_FILE picks the log file (default stderr).");
                    std::process::exit(0);
                }
                arg => {
                    return Err(format!("Unknown argument: {}. Use --help for usage.", arg).into());
                }
            }
        }

        Ok(cli)
    }

    /// Apply CLI overrides to a configuration object.
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(mode) = &self.mode {
            config.set("edit_mode", ConfigValue::String(mode.clone()));
        }
        if self.list_view {
            config.set("prediction_view", "list");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, Box<dyn std::error::Error>> {
        Cli::parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_flags() {
        let cli = parse(&["--mode", "vi", "-H", "/tmp/h", "--prompt", "$ ", "-l"]).unwrap();
        assert_eq!(cli.mode.as_deref(), Some("vi"));
        assert_eq!(cli.history, Some(PathBuf::from("/tmp/h")));
        assert_eq!(cli.prompt.as_deref(), Some("$ "));
        assert!(cli.list_view);

        let mut config = Config::default();
        cli.apply_to_config(&mut config);
        assert_eq!(config.get("edit_mode"), Some(&ConfigValue::String("vi".into())));
        assert_eq!(config.get("prediction_view"), Some(&ConfigValue::String("list".into())));
    }

    #[test]
    fn test_missing_value_and_unknown_flag() {
        assert!(parse(&["--mode"]).is_err());
        assert!(parse(&["--frobnicate"]).is_err());
    }
}
