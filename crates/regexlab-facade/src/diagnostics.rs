//! Diagnostics printer: renders [`regexlab_syntax::Issue`]s (validator and
//! linter findings) as plain-text reports. Grounded on the teacher's
//! `plotnik-lib::diagnostics` printer — same `annotate-snippets` renderer,
//! same "no source means no snippet, fall back to plain lines" behavior —
//! generalized from query diagnostics to regex `Issue`s and from
//! `rowan::TextRange` to [`regexlab_core::Span`].

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};
use regexlab_syntax::Issue;
use std::fmt::Write;

/// A sequence of non-fatal findings (validator or linter output) ready to
/// print. This is a thin wrapper, not a second collection type: validator
/// and linter already hand back plain `Vec<Issue>`, and `Diagnostics` only
/// exists to carry a `printer()` method next to them.
#[derive(Debug, Clone)]
pub struct Diagnostics<'a> {
    issues: &'a [Issue],
}

impl<'a> Diagnostics<'a> {
    pub fn new(issues: &'a [Issue]) -> Self {
        Self { issues }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn printer(&self) -> DiagnosticsPrinter<'a, '_> {
        DiagnosticsPrinter { issues: self.issues, source: None, path: None, colored: false }
    }
}

pub struct DiagnosticsPrinter<'d, 's> {
    issues: &'d [Issue],
    source: Option<&'s str>,
    path: Option<&'s str>,
    colored: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn source(mut self, source: &'s str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn path(mut self, path: &'s str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let Some(source) = self.source else {
            return self.format_plain(w);
        };
        if self.issues.is_empty() {
            return Ok(());
        }

        let renderer = if self.colored { Renderer::styled() } else { Renderer::plain() };

        for (i, issue) in self.issues.iter().enumerate() {
            let range = adjust_range(issue.span, source.len());
            let mut snippet = Snippet::source(source)
                .line_start(1)
                .annotation(AnnotationKind::Primary.span(range).label(&issue.message));
            if let Some(p) = self.path {
                snippet = snippet.path(p);
            }
            let title_group = Level::WARNING.primary_title(&issue.message).element(snippet);
            if i > 0 {
                w.write_char('\n')?;
            }
            write!(w, "{}", renderer.render(&[title_group]))?;
        }
        Ok(())
    }

    fn format_plain(&self, w: &mut impl Write) -> std::fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }
            write!(w, "{} [{}] at {}: {}", "warning", issue.issue_id, issue.span, issue.message)?;
        }
        Ok(())
    }
}

fn adjust_range(span: regexlab_core::Span, limit: usize) -> std::ops::Range<usize> {
    let start = span.start as usize;
    let end = span.end as usize;
    if start == end {
        return start..(start + 1).min(limit);
    }
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use regexlab_core::Span;

    #[test]
    fn plain_rendering_lists_every_issue() {
        let issues = vec![
            Issue::new("regex.lint.flag.useless.i", "flag 'i' has no effect", Span::new(0, 3)),
            Issue::new("regex.validate.duplicate_name", "duplicate group name 'x'", Span::new(4, 8)),
        ];
        let rendered = Diagnostics::new(&issues).printer().render();
        assert!(rendered.contains("regex.lint.flag.useless.i"));
        assert!(rendered.contains("duplicate group name 'x'"));
    }

    #[test]
    fn plain_rendering_joins_multiple_issues_with_newlines() {
        use indoc::indoc;
        let issues = vec![
            Issue::new("regex.lint.flag.useless.i", "flag 'i' has no effect", Span::new(0, 3)),
            Issue::new("regex.validate.duplicate_name", "duplicate group name 'x'", Span::new(4, 8)),
        ];
        let rendered = Diagnostics::new(&issues).printer().render();
        let expected = indoc! {"
            warning [regex.lint.flag.useless.i] at 0..3: flag 'i' has no effect
            warning [regex.validate.duplicate_name] at 4..8: duplicate group name 'x'"};
        assert_eq!(rendered, expected);
    }

    #[test]
    fn plain_rendering_matches_its_snapshot() {
        let issues = vec![Issue::new("regex.lint.flag.useless.i", "flag 'i' has no effect", Span::new(0, 3))];
        let rendered = Diagnostics::new(&issues).printer().render();
        insta::assert_snapshot!(rendered, @"warning [regex.lint.flag.useless.i] at 0..3: flag 'i' has no effect");
    }

    #[test]
    fn empty_diagnostics_render_nothing() {
        let issues: Vec<Issue> = Vec::new();
        assert!(Diagnostics::new(&issues).printer().render().is_empty());
    }

    #[test]
    fn source_backed_rendering_includes_the_snippet() {
        let issues = vec![Issue::new("regex.lint.x", "oops", Span::new(1, 2))];
        let rendered = Diagnostics::new(&issues).printer().source("/ab/").render();
        assert!(rendered.contains("oops"));
    }
}
