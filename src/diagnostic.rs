use crate::span::Span;

/// A translation diagnostic (error or warning) tied to one expression line.
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
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Render the diagnostic to stderr using ariadne, with the offending
    /// expression line as the source snippet.
    pub fn render(&self, filename: &str, line: &str) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };

        let color = match self.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let end = (self.span.end as usize).min(line.len());
        let start = (self.span.start as usize).min(end);

        let mut report = Report::build(kind, filename, start)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        let _ = report.finish().eprint((filename, Source::from(line)));
    }
}

/// Render a list of diagnostics against the same source line.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, line: &str) {
    for diag in diagnostics {
        diag.render(filename, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let span = Span::new(3, 10, 15);
        let d = Diagnostic::error("unbalanced bracket".to_string(), span);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "unbalanced bracket");
        assert_eq!(d.span.line, 3);
        assert_eq!(d.span.start, 10);
        assert!(d.notes.is_empty());
        assert!(d.help.is_none());
    }

    #[test]
    fn test_with_note_and_help() {
        let d = Diagnostic::error("unexpected token".to_string(), Span::dummy())
            .with_note("while parsing Sqrt[...]".to_string())
            .with_help("close the bracket with ']'".to_string());
        assert_eq!(d.notes.len(), 1);
        assert_eq!(d.help.as_deref(), Some("close the bracket with ']'"));
    }

    #[test]
    fn test_render_does_not_panic() {
        let line = "Sqrt[lam / (4 * Pi) + Log[mssq]";
        let d = Diagnostic::error("unclosed '['".to_string(), Span::new(0, 4, 5))
            .with_note("bracket opened here".to_string());
        d.render("bounded.txt", line);
    }

    #[test]
    fn test_render_clamps_span_to_line() {
        let line = "x + y";
        let d =
            Diagnostic::error("unexpected end of expression".to_string(), Span::new(0, 90, 99));
        d.render("rge.txt", line);
    }
}
