//! # Output Configuration
//!
//! Color detection and the plain-text rendering of sources and run reports
//! used by the CLI.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sourcepipe::output::{render_report, OutputConfig};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! print!("{}", render_report(&config, &report));
//! ```

use std::env;
use std::fmt::Write;

use console::style;

use crate::phases::RunReport;
use crate::source::{Source, SourceState};

/// Output configuration for controlling colors.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve the `--color` flag (`always`, `never` or `auto`).
    ///
    /// In auto mode colors are off when `NO_COLOR` is set, when `CLICOLOR=0`,
    /// when `TERM=dumb`, or when stdout is not a color terminal.
    /// `CLICOLOR_FORCE` turns them back on for non-terminals.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_ascii_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        let set = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());

        if env::var_os("NO_COLOR").is_some() || set("CLICOLOR").as_deref() == Some("0") {
            false
        } else if set("CLICOLOR_FORCE").is_some_and(|v| v != "0") {
            true
        } else if set("TERM").as_deref() == Some("dumb") {
            false
        } else {
            console::Term::stdout().features().colors_supported()
        }
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// A state name, colored by how far along the lifecycle it is.
pub fn state_label(config: &OutputConfig, state: SourceState) -> String {
    let label = format!("{:<8}", state.as_str());
    if !config.use_color {
        return label;
    }
    match state {
        SourceState::New => style(label).force_styling(true).dim().to_string(),
        SourceState::Cloned => style(label).force_styling(true).cyan().to_string(),
        SourceState::Finished => style(label).force_styling(true).green().to_string(),
    }
}

fn mark(config: &OutputConfig, ok: bool) -> String {
    match (config.use_color, ok) {
        (true, true) => style("ok").force_styling(true).green().to_string(),
        (true, false) => style("FAILED").force_styling(true).red().bold().to_string(),
        (false, true) => "ok".to_string(),
        (false, false) => "FAILED".to_string(),
    }
}

/// One line per source: id, state, URL and the recorded fault, if any.
pub fn render_source(config: &OutputConfig, source: &Source) -> String {
    let mut line = format!(
        "{:>4}  {}  {}",
        source.id,
        state_label(config, source.state),
        source.url
    );
    if let Some(error) = &source.error {
        let _ = write!(line, "\n      {} {}", mark(config, false), error);
    }
    line
}

/// Per-source outcome lines followed by a one-line tally.
pub fn render_report(config: &OutputConfig, report: &RunReport) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        let _ = writeln!(
            out,
            "{:>4}  {:<6}  {}",
            outcome.id,
            mark(config, outcome.is_success()),
            outcome.url
        );
        if let Some(error) = &outcome.error {
            let _ = writeln!(out, "      {}", error);
        }
    }
    for def in &report.missing {
        let _ = writeln!(out, "   ?  {:<6}  {}", mark(config, false), def);
    }

    let _ = writeln!(
        out,
        "{}: {} succeeded, {} failed, {} not found",
        report.operation,
        report.succeeded().count(),
        report.failed().count(),
        report.missing.len()
    );
    out
}
