//! Manifest diagnostics, rendered with ariadne against the manifest text.

use std::fmt;
use std::io::Write;
use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::span::Span;

/// A problem found in a manifest.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Fails the manifest.
    Error,
    /// Reported, generation goes ahead.
    Warning,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl Diagnostic {
    fn with_severity(severity: Severity, message: String, span: Span) -> Self {
        Self {
            severity,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn error(message: String, span: Span) -> Self {
        Self::with_severity(Severity::Error, message, span)
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self::with_severity(Severity::Warning, message, span)
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    fn report<'a>(&self, filename: &'a str, color: bool) -> Report<'a, (&'a str, Range<usize>)> {
        let (kind, paint) = match self.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };
        let range = self.span.start as usize..self.span.end as usize;

        let mut report = Report::build(kind, filename, range.start)
            .with_config(Config::default().with_color(color))
            .with_message(&self.message);
        // Problems without a location (e.g. a missing key) get no label.
        if !range.is_empty() {
            report = report.with_label(
                Label::new((filename, range))
                    .with_message(&self.message)
                    .with_color(paint),
            );
        }
        for note in &self.notes {
            report = report.with_note(note);
        }
        if let Some(help) = &self.help {
            report = report.with_help(help);
        }
        report.finish()
    }

    /// Render the diagnostic to stderr.
    pub fn render(&self, filename: &str, source: &str) {
        // stderr is the last resort for reporting; nothing to do if it fails
        let _ = self
            .report(filename, true)
            .eprint((filename, Source::from(source)));
    }

    /// Render without colors into `out`.
    pub fn write_to(&self, filename: &str, source: &str, out: &mut impl Write) -> std::io::Result<()> {
        self.report(filename, false)
            .write((filename, Source::from(source)), out)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.label(), self.message)
    }
}

/// Render a list of diagnostics, errors first.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: &str) {
    let (errors, warnings): (Vec<&Diagnostic>, Vec<&Diagnostic>) =
        diagnostics.iter().partition(|d| d.is_error());
    for diag in errors.into_iter().chain(warnings) {
        diag.render(filename, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes_severity() {
        let diag = Diagnostic::warning("arity ignored".to_string(), Span::dummy());
        assert_eq!(diag.to_string(), "warning: arity ignored");
        assert!(!diag.is_error());
    }

    #[test]
    fn test_write_includes_label_and_help() {
        let source = r#"{ "skeleton": "MapImp" }"#;
        let diag = Diagnostic::error("unknown skeleton 'MapImp'".to_string(), Span::new(14, 22))
            .with_help("known skeletons: MapImpl".to_string());
        let mut out = Vec::new();
        diag.write_to("prog.json", source, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("unknown skeleton 'MapImp'"));
        assert!(text.contains("prog.json"));
        assert!(text.contains("known skeletons: MapImpl"));
    }

    #[test]
    fn test_write_without_location() {
        let diag = Diagnostic::error("manifest has no instances".to_string(), Span::dummy());
        let mut out = Vec::new();
        diag.write_to("prog.json", "{}", &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("manifest has no instances"));
    }
}
