//! User-facing diagnostics.
//!
//! Validation problems are collected and rendered together as one
//! [`Diagnostic`]. Conditions that make generation impossible are
//! [`GenerateError`]s and halt the run.

use std::fmt::{self, Write as _};
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::SpecificationError;

/// Common suggestion messages.
pub mod suggestions {
    /// Shown when the configuration does not validate.
    pub const INVALID_CONFIG: &str = "Run `podgen gen --help` to see the available options";

    /// Shown when no podspecs were found.
    pub const NO_PODSPECS: &str =
        "Pass podspec paths or run from a directory containing a `.podspec.json`";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }

    fn ansi(self) -> &'static str {
        match self {
            Severity::Error => "1;31",
            Severity::Warning => "1;33",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A message for the user, with detail lines and hints.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    /// Detail lines, printed indented under the message
    pub context: Vec<String>,
    /// Hints, printed as a numbered list
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Render for the terminal, with ANSI colors when `color` is set.
    pub fn format(&self, color: bool) -> String {
        let paint = |code: &str, text: &str| {
            if color {
                format!("\x1b[{}m{}\x1b[0m", code, text)
            } else {
                text.to_string()
            }
        };

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}: {}",
            paint(self.severity.ansi(), self.severity.label()),
            self.message
        );
        for line in &self.context {
            let _ = writeln!(out, "    {}", line);
        }
        if !self.suggestions.is_empty() {
            let _ = writeln!(out, "\n{}: consider:", paint("1;32", "help"));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", i + 1, suggestion);
            }
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Render configuration validation errors as one diagnostic.
pub fn validation_report(errors: &[String]) -> Diagnostic {
    let mut diag = Diagnostic::error("invalid `pod gen` configuration");
    for error in errors {
        diag = diag.with_context(error.clone());
    }
    if errors.iter().any(|e| e.contains("podspecs")) {
        diag = diag.with_suggestion(suggestions::NO_PODSPECS);
    }
    diag.with_suggestion(suggestions::INVALID_CONFIG)
}

/// A condition that makes generating a workspace impossible.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum GenerateError {
    #[error("No available platforms in podspecs {pods} match requested platforms: {requested}")]
    #[diagnostic(
        code(podgen::generate::no_platforms),
        help("Drop `--platforms` or list a platform the podspecs support")
    )]
    NoPlatforms { pods: String, requested: String },

    #[error(
        "Conflicting `use_modular_headers` option. Cannot specify both \
         `--use-modular-headers` and `--use-podfile`."
    )]
    #[diagnostic(
        code(podgen::generate::conflicting_modular_headers),
        help("Pass `--no-use-podfile` to set modular headers from the command line")
    )]
    ConflictingModularHeaders,

    #[error("Multiple use_frameworks! values detected in user Podfile.")]
    #[diagnostic(
        code(podgen::generate::ambiguous_linkage),
        help("Use the same `use_frameworks!` setting in every target of the Podfile")
    )]
    AmbiguousLinkage,

    #[error("Failed to load podspec: {}", path.display())]
    #[diagnostic(code(podgen::generate::local_podspec))]
    LocalPodspec {
        path: PathBuf,
        #[source]
        source: SpecificationError,
    },
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("invalid `pod gen` configuration")
            .with_context("\"maybe\" invalid for clean, got type string, expected object of type bool")
            .with_suggestion("Set `clean` to true or false");

        let output = diag.format(false);
        assert!(output.starts_with("error: invalid `pod gen` configuration\n"));
        assert!(output.contains("    \"maybe\" invalid for clean"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Set `clean`"));
    }

    #[test]
    fn test_warning_colors() {
        let output = Diagnostic::warning("repo update skipped").format(true);
        assert!(output.starts_with("\x1b[1;33mwarning\x1b[0m: repo update skipped"));
    }

    #[test]
    fn test_validation_report() {
        let errors = vec![
            "Error computing podspecs, no specs found in /work".to_string(),
            "\"x\" invalid for platforms, must be a subset of ios, macos, tvos, watchos".to_string(),
        ];
        let output = validation_report(&errors).format(false);
        assert!(output.contains("    Error computing podspecs"));
        assert!(output.contains("    \"x\" invalid for platforms"));
        assert!(output.contains(suggestions::NO_PODSPECS));
        assert!(output.contains(suggestions::INVALID_CONFIG));
    }

    #[test]
    fn test_generate_error_messages() {
        let err = GenerateError::NoPlatforms {
            pods: "A and B".to_string(),
            requested: "watchos".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No available platforms in podspecs A and B match requested platforms: watchos"
        );
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("podgen::generate::no_platforms")
        );
        assert!(GenerateError::ConflictingModularHeaders
            .to_string()
            .starts_with("Conflicting `use_modular_headers` option."));
    }
}
