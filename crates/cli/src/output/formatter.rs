//! Output formatter for human-readable and JSON output
//!
//! s3sum prints two kinds of results: the transfer report of `up`/`dl` and
//! the listing of `ls`. Both go to stdout and are suppressed by `--quiet`;
//! errors always go to stderr. In JSON mode every line printed is JSON.

use serde::Serialize;

use s3sum_core::ObjectInfo;

use super::{OutputConfig, StatusReport};

/// Formatter for CLI output
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

#[derive(Serialize)]
struct Listing<'a> {
    items: &'a [ObjectInfo],
}

#[derive(Serialize)]
struct ErrorMessage<'a> {
    error: &'a str,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Print a transfer report, followed on stderr by the failure if any
    pub fn report(&self, report: &StatusReport<'_>, failure: Option<&str>) {
        if !self.config.quiet {
            println!("{}", self.render_report(report));
        }
        if let Some(message) = failure {
            self.error(message);
        }
    }

    /// Print listed items, one line per item in human mode
    pub fn listing(&self, items: &[ObjectInfo], line: impl Fn(&ObjectInfo) -> String) {
        if self.config.quiet {
            return;
        }

        let text = self.render_listing(items, line);
        if !text.is_empty() {
            println!("{text}");
        }
    }

    /// Print an error message to stderr
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.render_error(message));
    }

    fn render_report(&self, report: &StatusReport<'_>) -> String {
        if self.config.json {
            to_json(report)
        } else {
            report.to_string()
        }
    }

    fn render_listing(
        &self,
        items: &[ObjectInfo],
        line: impl Fn(&ObjectInfo) -> String,
    ) -> String {
        if self.config.json {
            return to_json(&Listing { items });
        }

        items.iter().map(line).collect::<Vec<_>>().join("\n")
    }

    fn render_error(&self, message: &str) -> String {
        if self.config.json {
            to_json(&ErrorMessage { error: message })
        } else if self.colors_enabled() {
            format!("\x1b[31m✗\x1b[0m {message}")
        } else {
            format!("✗ {message}")
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serializing output: {e}\"}}"))
}
