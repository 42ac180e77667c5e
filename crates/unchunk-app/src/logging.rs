//! Logging configured from command line arguments.

use std::{fs::OpenOptions, path::PathBuf, sync::Mutex};

use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, prelude::*, EnvFilter};

const DEFAULT_LEVEL: &str = "warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Where log events go and which of them are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Directives for [EnvFilter].
    pub filter: String,
    pub format: LogFormat,
    /// Log file opened for appending. Standard error if none.
    pub file: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_args(arg_matches: &ArgMatches) -> Self {
        let filter = match arg_matches.get_one::<String>("log_filter") {
            Some(filter) => filter.clone(),
            None => {
                let level = match arg_matches.get_one::<String>("log_level") {
                    Some(level) => level.as_str(),
                    None if arg_matches.contains_id("verbose") => "info",
                    None => DEFAULT_LEVEL,
                };
                crate_filter(level)
            }
        };

        let format = match arg_matches.get_one::<String>("log_format").map(String::as_str) {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            filter,
            format,
            file: arg_matches.get_one::<PathBuf>("log_file").cloned(),
        }
    }

    /// Installs the global subscriber.
    pub fn init(&self) -> anyhow::Result<()> {
        let filter = EnvFilter::try_new(&self.filter)
            .with_context(|| format!("invalid log filter {:?}", self.filter))?;

        let (writer, ansi) = match &self.file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("failed to open log file {}", path.display()))?;
                (BoxMakeWriter::new(Mutex::new(file)), false)
            }
            None => (BoxMakeWriter::new(std::io::stderr), use_console_color_stderr()),
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi);
        let registry = tracing_subscriber::registry().with(filter);

        match self.format {
            LogFormat::Text => registry.with(layer).init(),
            LogFormat::Json => registry.with(layer.json()).init(),
        }

        Ok(())
    }
}

/// Filter that applies `level` to the library and this program only.
fn crate_filter(level: &str) -> String {
    format!("unchunk={level},unchunk_app={level}")
}

pub fn add_logging_args(command: Command<'static>) -> Command<'static> {
    command
        .arg(
            Arg::new("log_level")
                .long("log-level")
                .short('l')
                .takes_value(true)
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .help("Severity of logging messages to show. [default: warn]"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .conflicts_with("log_level")
                .help("Show informative messages. Same as '--log-level info'."),
        )
        .arg(
            Arg::new("log_filter")
                .long("log-filter")
                .takes_value(true)
                .conflicts_with_all(&["log_level", "verbose"])
                .help("Filter directives for logging messages, such as 'unchunk=debug'."),
        )
        .arg(
            Arg::new("log_file")
                .long("log-file")
                .takes_value(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Append logging messages to a file instead of standard error."),
        )
        .arg(
            Arg::new("log_format")
                .long("log-format")
                .value_parser(["default", "json"])
                .default_value("default")
                .help("Format of logging messages."),
        )
}

fn use_console_color_stderr() -> bool {
    console::colors_enabled_stderr() && std::env::var_os("NO_COLOR").is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(args: &[&str]) -> LogSettings {
        let matches = crate::argutil::build_commands()
            .try_get_matches_from(args.iter().copied().chain(["body"]))
            .unwrap();

        LogSettings::from_args(&matches)
    }

    #[test]
    fn test_default_settings() {
        assert_eq!(
            settings(&["unchunk-app"]),
            LogSettings {
                filter: "unchunk=warn,unchunk_app=warn".to_string(),
                format: LogFormat::Text,
                file: None,
            }
        );
    }

    #[test]
    fn test_level_settings() {
        assert_eq!(
            settings(&["unchunk-app", "--verbose"]).filter,
            "unchunk=info,unchunk_app=info"
        );
        assert_eq!(
            settings(&["unchunk-app", "-l", "trace"]).filter,
            "unchunk=trace,unchunk_app=trace"
        );
        assert_eq!(
            settings(&["unchunk-app", "--log-filter", "unchunk::io=debug"]).filter,
            "unchunk::io=debug"
        );
    }

    #[test]
    fn test_output_settings() {
        let settings = settings(&[
            "unchunk-app",
            "--log-format",
            "json",
            "--log-file",
            "out.log",
        ]);

        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.file, Some(PathBuf::from("out.log")));
    }

    #[test]
    fn test_conflicting_levels() {
        let result = crate::argutil::build_commands().try_get_matches_from([
            "unchunk-app",
            "--verbose",
            "--log-filter",
            "unchunk=debug",
            "body",
        ]);

        assert!(result.is_err());
    }
}
