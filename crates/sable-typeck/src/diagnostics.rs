//! Ariadne-based diagnostic rendering.
//!
//! Core errors stay plain data; this module turns one [`TypeckError`]
//! plus its module's source text into a labeled report. Output is
//! colorless so tests and logs stay stable.

use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};

use crate::error::TypeckError;

/// Render an error against the source text of the module it points into.
pub fn render_diagnostic(error: &TypeckError, source: &str) -> String {
    let config = Config::default().with_color(false);
    let source_len = source.len();

    // Ariadne needs an in-bounds, non-empty span.
    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        if s == e {
            s..e.saturating_add(1).min(source_len)
        } else {
            s..e
        }
    };

    let span = clamp(error.span.start.offset as usize..error.span.end.offset as usize);
    let message = error.kind.to_string();

    let report = Report::build(ReportKind::Error, span.clone())
        .with_message(&message)
        .with_config(config)
        .with_label(Label::new(span).with_message(&message))
        .finish();

    let mut buf = Vec::new();
    if report.write(Source::from(source), &mut buf).is_err() {
        return format!("{error}");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypeckErrorKind;
    use sable_common::span::{Pos, Span};
    use std::path::PathBuf;

    #[test]
    fn renders_a_labeled_report() {
        let source = "const x = y\n";
        let error = TypeckError::new(
            TypeckErrorKind::ValueNotDefined { name: "y".into() },
            PathBuf::from("/main.sab"),
            Span::new(Pos::new(10, 1, 11), Pos::new(11, 1, 12)),
        );
        let rendered = render_diagnostic(&error, source);
        assert!(rendered.contains("value `y` is not defined"));
        assert!(rendered.contains("Error"));
    }

    #[test]
    fn survives_out_of_bounds_spans() {
        let error = TypeckError::new(
            TypeckErrorKind::ExportClash { name: "a".into() },
            PathBuf::from("/main.sab"),
            Span::new(Pos::new(100, 9, 1), Pos::new(120, 9, 21)),
        );
        let rendered = render_diagnostic(&error, "short");
        assert!(rendered.contains("already declared"));
    }
}
