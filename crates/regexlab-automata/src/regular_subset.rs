//! Regular-subset validator (spec.md §4.8.1): rejects any AST containing a
//! construct no finite automaton can represent. Named captures and
//! non-capturing groups are "ignorable" rather than rejected — `nfa::build`
//! strips them to their child directly.

use crate::error::UnsupportedFeatureError;
use regexlab_syntax::ast::*;
use regexlab_syntax::visit::{self, Visitor};

/// Returns the first non-regular construct found, walked in source order.
/// `None` means `regex` can be fed to [`crate::nfa::build`] as-is.
pub fn check(regex: &Node) -> Option<UnsupportedFeatureError> {
    let Node::Regex(r) = regex else { return None };
    let mut pass = SubsetCheck { found: None };
    pass.visit_node(&r.pattern);
    pass.found
}

struct SubsetCheck {
    found: Option<UnsupportedFeatureError>,
}

impl SubsetCheck {
    fn reject(&mut self, feature: &str, message: &str, span: regexlab_core::Span) {
        if self.found.is_none() {
            self.found = Some(UnsupportedFeatureError { feature: feature.into(), message: message.into(), span });
        }
    }
}

impl Visitor for SubsetCheck {
    fn visit_group(&mut self, n: &GroupNode) {
        if n.kind.is_lookaround() {
            self.reject("lookaround", "lookahead/lookbehind assertions have no finite-automaton equivalent", n.span);
            return;
        }
        visit::walk_group(self, n);
    }

    fn visit_backref(&mut self, n: &BackrefNode) {
        self.reject("backreference", "a backreference's match depends on prior capture contents, which is not a regular language feature", n.span);
    }

    fn visit_subroutine(&mut self, n: &SubroutineNode) {
        let feature = if n.origin == SubroutineOrigin::WholeRecursion { "recursion" } else { "subroutine" };
        self.reject(feature, "subroutine calls and pattern recursion require a pushdown, not a finite, automaton", n.span);
    }

    /// All conditionals are treated as capture-dependent here, including
    /// version-only conditions: nothing downstream needs to distinguish a
    /// `(?(VERSION>=...))` conditional from a capture-group one, so the
    /// simpler, more conservative rejection is kept rather than threading a
    /// narrower check through `ConditionalNode::condition`.
    fn visit_conditional(&mut self, n: &ConditionalNode) {
        self.reject("conditional", "conditional subpatterns branch on capture state, which a byte automaton cannot observe", n.span);
    }

    fn visit_pcre_verb(&mut self, n: &PcreVerbNode) {
        self.reject("pcre_verb", "backtracking-control verbs have no meaning once backtracking itself is compiled away", n.span);
    }

    fn visit_keep(&mut self, n: &KeepNode) {
        self.reject("keep", "\\K rewrites the reported match start, which has no automaton analogue", n.span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regexlab_syntax::parser::parse;

    fn feature(pattern: &str) -> Option<String> {
        check(&parse(pattern).unwrap()).map(|e| e.feature)
    }

    #[test]
    fn accepts_plain_pattern() {
        assert_eq!(feature("/a(bc)*d|e/"), None);
    }

    #[test]
    fn rejects_lookahead() {
        assert_eq!(feature("/a(?=b)/"), Some("lookaround".to_string()));
    }

    #[test]
    fn rejects_backreference() {
        assert_eq!(feature("/(a)\\1/"), Some("backreference".to_string()));
    }

    #[test]
    fn rejects_recursion() {
        assert_eq!(feature("/(a(?R)?b)/"), Some("recursion".to_string()));
    }

    #[test]
    fn rejects_keep() {
        assert_eq!(feature("/a\\Kb/"), Some("keep".to_string()));
    }

    #[test]
    fn accepts_non_capturing_and_named_groups() {
        assert_eq!(feature("/(?:a)(?<x>b)/"), None);
    }
}
