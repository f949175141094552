//! Linter visitor (spec.md §4.5): typed warnings with stable issue IDs.
//! Two rules — useless-flag-`i` and impossible-anchor — are specified in
//! detail; the rest are straightforward structural checks in the same
//! style, one category each, grounded on the same [`crate::visit::Visitor`]
//! walk as [`crate::analyze::validate`].

use crate::analyze::charset::first_set;
use crate::ast::*;
use crate::error::Issue;
use crate::visit::{self, Visitor};
use indexmap::IndexSet;

pub fn lint(regex: &Node) -> Vec<Issue> {
    let Node::Regex(r) = regex else {
        return Vec::new();
    };
    let mut pass = LintPass { flags: r.flags, min_consumed_before: 0, issues: Vec::new() };
    pass.visit_node(&r.pattern);
    if r.flags.case_insensitive && !pattern_has_case_sensitive_atom(&r.pattern) {
        pass.issues.push(Issue::new(
            "regex.lint.flag.useless.i",
            "flag 'i' has no effect: the pattern contains no letter whose case folding would matter",
            r.span,
        ));
    }
    pass.issues
}

struct LintPass {
    flags: Flags,
    /// Minimum number of bytes consumed by everything walked so far in the
    /// enclosing sequence, used by the impossible-anchor rule.
    min_consumed_before: u32,
    issues: Vec<Issue>,
}

impl Visitor for LintPass {
    fn visit_sequence(&mut self, n: &SequenceNode) {
        let saved = self.min_consumed_before;
        let mut consumed = saved;
        for (i, child) in n.children.iter().enumerate() {
            self.min_consumed_before = consumed;
            if let Node::Anchor(a) = child {
                self.check_anchor_position(a, consumed, trailing_min_consumed(&n.children[i + 1..]));
            }
            self.visit_node(child);
            consumed += min_consumed(child);
        }
        self.min_consumed_before = saved;
    }

    fn visit_quantifier(&mut self, n: &QuantifierNode) {
        if n.min == 1 && n.max == Some(1) {
            self.issues.push(Issue::new("regex.lint.quantifier.useless", "quantifier {1} has no effect", n.span));
        }
        if n.min == 0 && n.max == Some(0) {
            self.issues.push(Issue::new("regex.lint.quantifier.zero", "quantifier {0} or {0,0} always matches nothing", n.span));
        }
        if let Node::Quantifier(inner) = n.inner.as_ref() {
            let outer_first = first_set(&n.inner, self.flags);
            let nested_first = first_set(&inner.inner, self.flags);
            if !outer_first.is_disjoint(&nested_first) {
                self.issues.push(Issue::new(
                    "regex.lint.quantifier.nested",
                    "nested unbounded quantifiers on overlapping atoms can cause catastrophic backtracking",
                    n.span,
                ));
            }
            if n.max.is_none() && inner.max.is_none() && matches!(inner.inner.as_ref(), Node::Dot(_)) {
                self.issues.push(Issue::new(
                    "regex.lint.dotstar.nested",
                    "nested unbounded '.' repetition matches everything redundantly; a single '.*' is equivalent",
                    n.span,
                ));
            }
        }
        visit::walk_quantifier(self, n);
    }

    fn visit_group(&mut self, n: &GroupNode) {
        if n.kind == GroupType::NonCapturing && n.flags.is_none() && !matches!(n.child.as_ref(), Node::Alternation(_) | Node::Sequence(_)) {
            self.issues.push(Issue::new(
                "regex.lint.group.redundant",
                "non-capturing group around a single atom has no effect",
                n.span,
            ));
        }
        visit::walk_group(self, n);
    }

    fn visit_alternation(&mut self, n: &AlternationNode) {
        let mut seen = IndexSet::new();
        for branch in &n.branches {
            if matches!(branch, Node::Sequence(s) if s.children.is_empty()) {
                self.issues.push(Issue::new("regex.lint.alternation.empty", "empty alternative always matches nothing", branch.span()));
            }
            let rendered = crate::compile::compile(branch);
            if !seen.insert(rendered) {
                self.issues.push(Issue::new(
                    "regex.lint.alternation.duplicate_disjunction",
                    "duplicate alternative in disjunction",
                    branch.span(),
                ));
            }
        }
        for pair in n.branches.windows(2) {
            let a = first_set(&pair[0], self.flags);
            let b = first_set(&pair[1], self.flags);
            if !a.is_disjoint(&b) {
                self.issues.push(Issue::new(
                    "regex.lint.overlap.charset",
                    "adjacent alternatives share characters in their first set",
                    n.span,
                ));
                break;
            }
        }
        visit::walk_alternation(self, n);
    }

    fn visit_char_class(&mut self, n: &CharClassNode) {
        let mut seen_chars = IndexSet::new();
        for item in &n.items {
            if let Node::Literal(lit) = item {
                if !seen_chars.insert(lit.text.clone()) {
                    self.issues.push(Issue::new(
                        "regex.lint.charclass.duplicate_chars",
                        format!("'{}' appears more than once in this character class", lit.text),
                        item.span(),
                    ));
                }
            }
            if let Node::Range(r) = item {
                if let (Some(a), Some(b)) = (literal_codepoint(&r.start), literal_codepoint(&r.end)) {
                    if a == b {
                        self.issues.push(Issue::new(
                            "regex.lint.range.useless",
                            "range with identical endpoints is equivalent to a single character",
                            item.span(),
                        ));
                    }
                }
            }
        }
        if n.items.len() == 1 {
            self.issues.push(Issue::new(
                "regex.lint.charclass.redundant",
                "character class with a single member is equivalent to that member alone",
                n.span,
            ));
        }
        visit::walk_char_class(self, n);
    }

    fn visit_literal(&mut self, n: &LiteralNode) {
        // `parse_literal` strips a leading backslash before storing `text`;
        // a span two bytes wider than the text itself means the source had
        // one, and PCRE2 gives a backslash-letter with no special meaning no
        // effect beyond the literal letter itself — almost always a typo for
        // an intended escape.
        let text_len = n.text.len() as u32;
        let mut chars = n.text.chars();
        let is_single_ascii_letter = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic()) && chars.next().is_none();
        if is_single_ascii_letter && n.span.end - n.span.start == text_len + 1 {
            self.issues.push(Issue::new(
                "regex.lint.escape.suspicious",
                format!("'\\{}' has no special meaning and is read as a literal '{}'", n.text, n.text),
                n.span,
            ));
        }
    }
}

fn literal_codepoint(node: &Node) -> Option<u32> {
    match node {
        Node::CharLiteral(c) => Some(c.codepoint),
        Node::Literal(l) => l.text.chars().next().map(|c| c as u32),
        _ => None,
    }
}

impl LintPass {
    fn check_anchor_position(&mut self, anchor: &AnchorNode, preceding_min: u32, following_min: u32) {
        if self.flags.multi_line {
            return;
        }
        match anchor.kind {
            AnchorKind::CaretStart if preceding_min > 0 => {
                self.issues.push(Issue::new(
                    "regex.lint.anchor.impossible.start",
                    "'^' can never match here: a preceding atom always consumes at least one character",
                    anchor.span,
                ));
            }
            AnchorKind::DollarEnd if following_min > 0 => {
                self.issues.push(Issue::new(
                    "regex.lint.anchor.impossible.end",
                    "'$' can never match here: a following atom always consumes at least one character",
                    anchor.span,
                ));
            }
            _ => {}
        }
    }
}

fn min_consumed(node: &Node) -> u32 {
    match node {
        Node::Literal(n) => n.text.chars().count() as u32,
        Node::CharLiteral(_) | Node::CharType(_) | Node::Dot(_) | Node::CharClass(_) | Node::PosixClass(_) | Node::UnicodeProp(_) => 1,
        Node::Sequence(n) => n.children.iter().map(min_consumed).sum(),
        Node::Alternation(n) => n.branches.iter().map(min_consumed).min().unwrap_or(0),
        Node::Group(n) => min_consumed(&n.child),
        Node::Quantifier(n) => n.min * min_consumed(&n.inner),
        Node::Conditional(n) => {
            let yes = min_consumed(&n.yes);
            let no = n.no.as_deref().map(min_consumed).unwrap_or(0);
            yes.min(no)
        }
        _ => 0,
    }
}

fn trailing_min_consumed(rest: &[Node]) -> u32 {
    rest.iter().map(min_consumed).sum()
}

fn pattern_has_case_sensitive_atom(node: &Node) -> bool {
    match node {
        Node::Literal(n) => n.text.chars().any(|c| c.is_alphabetic()),
        Node::CharLiteral(n) => char::from_u32(n.codepoint).is_some_and(|c| c.is_alphabetic()),
        Node::CharType(n) => matches!(n.kind, CharTypeKind::Word | CharTypeKind::NotWord),
        Node::UnicodeProp(_) => true,
        Node::PosixClass(n) => matches!(n.name.as_str(), "alpha" | "alnum" | "upper" | "lower"),
        Node::CharClass(n) => n.items.iter().any(pattern_has_case_sensitive_atom),
        Node::Range(n) => pattern_has_case_sensitive_atom(&n.start) || pattern_has_case_sensitive_atom(&n.end),
        _ => node.children().into_iter().any(pattern_has_case_sensitive_atom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn ids(pattern: &str) -> Vec<String> {
        let ast = parse(pattern).expect("valid pattern");
        lint(&ast).into_iter().map(|i| i.issue_id).collect()
    }

    #[test]
    fn flags_useless_case_insensitive_flag() {
        assert!(ids("/[0-9]+/i").contains(&"regex.lint.flag.useless.i".to_string()));
    }

    #[test]
    fn does_not_flag_useful_case_insensitive_flag() {
        assert!(!ids("/[a-z]+/i").contains(&"regex.lint.flag.useless.i".to_string()));
    }

    #[test]
    fn flags_impossible_start_anchor() {
        assert!(ids("/a^b/").contains(&"regex.lint.anchor.impossible.start".to_string()));
    }

    #[test]
    fn multiline_flag_suppresses_anchor_rule() {
        assert!(!ids("/a^b/m").contains(&"regex.lint.anchor.impossible.start".to_string()));
    }

    #[test]
    fn flags_redundant_non_capturing_group() {
        assert!(ids("/(?:a)/").contains(&"regex.lint.group.redundant".to_string()));
    }

    #[test]
    fn flags_duplicate_disjunction() {
        assert!(ids("/a|a/").contains(&"regex.lint.alternation.duplicate_disjunction".to_string()));
    }

    #[test]
    fn flags_nested_dotstar() {
        assert!(ids("/(.*)*/").contains(&"regex.lint.dotstar.nested".to_string()));
    }

    #[test]
    fn flags_useless_range() {
        assert!(ids("/[a-a]/").contains(&"regex.lint.range.useless".to_string()));
    }

    #[test]
    fn does_not_flag_a_real_range() {
        assert!(!ids("/[a-z]/").contains(&"regex.lint.range.useless".to_string()));
    }

    #[test]
    fn flags_suspicious_escape() {
        assert!(ids(r"/\q/").contains(&"regex.lint.escape.suspicious".to_string()));
    }

    #[test]
    fn does_not_flag_an_unescaped_letter() {
        assert!(!ids("/q/").contains(&"regex.lint.escape.suspicious".to_string()));
    }
}
