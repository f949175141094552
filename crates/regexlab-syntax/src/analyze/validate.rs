//! Validator visitor (spec.md §4.4): collects semantic issues rather than
//! throwing, exactly like the linter it sits next to — the two differ only
//! in what they look for, not in shape.

use crate::ast::*;
use crate::error::Issue;
use crate::visit::{self, Visitor};
use indexmap::IndexMap;
use indexmap::IndexSet;

/// Walk `regex` and return every validator issue found (spec.md §4.4's five
/// checks). Order follows AST traversal order, not severity.
pub fn validate(regex: &Node) -> Vec<Issue> {
    let Node::Regex(r) = regex else {
        return Vec::new();
    };
    let known = collect_defined_names_and_indices(&r.pattern);
    let mut pass = ValidatorPass { known, seen_names: IndexMap::new(), in_char_class: 0, issues: Vec::new() };
    pass.visit_node(&r.pattern);
    pass.issues
}

struct DefinedRefs {
    names: IndexSet<String>,
    indices: IndexSet<u32>,
    max_index: u32,
}

struct ValidatorPass {
    known: DefinedRefs,
    /// name -> the group kind stack it was declared under; `BranchReset`
    /// groups legitimately reuse a name per spec.md §4.4 ("unless under
    /// branch-reset").
    seen_names: IndexMap<String, GroupType>,
    in_char_class: u32,
    issues: Vec<Issue>,
}

impl Visitor for ValidatorPass {
    fn visit_group(&mut self, n: &GroupNode) {
        if let Some(name) = &n.name {
            if let Some(prior_kind) = self.seen_names.get(name) {
                if *prior_kind != GroupType::BranchReset || n.kind != GroupType::BranchReset {
                    self.issues.push(Issue::new(
                        "regex.validate.group.duplicate_name",
                        format!("group name '{name}' is declared more than once"),
                        n.span,
                    ));
                }
            }
            self.seen_names.insert(name.clone(), n.kind);
        }
        visit::walk_group(self, n);
    }

    fn visit_range(&mut self, n: &RangeNode) {
        if let (Node::CharLiteral(a), Node::CharLiteral(b)) = (n.start.as_ref(), n.end.as_ref()) {
            if a.codepoint > b.codepoint {
                self.issues.push(Issue::new(
                    "regex.validate.range.reversed",
                    format!("character range is reversed: {:#x}-{:#x}", a.codepoint, b.codepoint),
                    n.span,
                ));
            }
        }
        visit::walk_range(self, n);
    }

    fn visit_char_literal(&mut self, n: &CharLiteralNode) {
        if matches!(n.kind, CharLiteralType::Octal | CharLiteralType::OctalLegacy) && n.codepoint > 0x10FFFF {
            self.issues.push(Issue::new(
                "regex.validate.escape.octal_out_of_range",
                format!("octal escape {} is out of the valid codepoint range", n.original),
                n.span,
            ));
        }
    }

    fn visit_unicode_prop(&mut self, n: &UnicodePropNode) {
        if n.spec.is_empty() || !n.spec.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '=') {
            self.issues.push(Issue::new(
                "regex.validate.escape.malformed_unicode_property",
                format!("malformed Unicode property \\p{{{}}}", n.spec),
                n.span,
            ));
        }
    }

    /// `[:alpha:]` (single brackets) never tokenizes as a [`PosixClassNode`]
    /// — PCRE2 only recognizes `[:name:]` nested inside an enclosing class,
    /// i.e. `[[:alpha:]]`. Written bare, it's a literal character class
    /// matching `:`, `a`, `l`, `p`, `h`, `a`, `:` individually, almost
    /// certainly not what the author intended; that's what this rule flags.
    fn visit_char_class(&mut self, n: &CharClassNode) {
        if self.in_char_class == 0 {
            if let Some(name) = posix_lookalike_name(n) {
                self.issues.push(Issue::new(
                    "regex.validate.charclass.posix_outside_class",
                    format!("[:{name}:] has no POSIX meaning outside an enclosing character class; did you mean [[:{name}:]]?"),
                    n.span,
                ));
            }
        }
        self.in_char_class += 1;
        visit::walk_char_class(self, n);
        self.in_char_class -= 1;
    }

    fn visit_quantifier(&mut self, n: &QuantifierNode) {
        if let Some(max) = n.max {
            if n.min > max {
                self.issues.push(Issue::new(
                    "regex.validate.quantifier.min_exceeds_max",
                    format!("quantifier min {} exceeds max {max}", n.min),
                    n.span,
                ));
            }
        }
        visit::walk_quantifier(self, n);
    }

    fn visit_backref(&mut self, n: &BackrefNode) {
        if !self.known.names.contains(&n.reference) && !resolves_as_index(&n.reference, &self.known) {
            self.issues.push(Issue::new(
                "regex.validate.backref.undefined",
                format!("backreference to undefined group '{}'", n.reference),
                n.span,
            ));
        }
    }

    fn visit_subroutine(&mut self, n: &SubroutineNode) {
        let resolved = match n.origin {
            SubroutineOrigin::WholeRecursion => true,
            SubroutineOrigin::Relative(_) => true,
            _ => self.known.names.contains(&n.reference) || resolves_as_index(&n.reference, &self.known),
        };
        if !resolved {
            self.issues.push(Issue::new(
                "regex.validate.subroutine.undefined",
                format!("subroutine call to undefined group '{}'", n.reference),
                n.span,
            ));
        }
    }
}

fn resolves_as_index(reference: &str, known: &DefinedRefs) -> bool {
    reference.parse::<u32>().map(|n| known.indices.contains(&n)).unwrap_or(false)
}

const POSIX_NAMES: &[&str] = &[
    "alpha", "digit", "alnum", "upper", "lower", "space", "punct", "xdigit", "cntrl", "print", "graph", "blank",
];

/// `n`'s items are all plain [`Node::Literal`]s whose concatenated text is
/// `:name:` for a recognized POSIX class name.
fn posix_lookalike_name(n: &CharClassNode) -> Option<&'static str> {
    if n.negated {
        return None;
    }
    let mut text = String::new();
    for item in &n.items {
        match item {
            Node::Literal(lit) => text.push_str(&lit.text),
            _ => return None,
        }
    }
    let inner = text.strip_prefix(':')?.strip_suffix(':')?;
    POSIX_NAMES.iter().copied().find(|name| *name == inner)
}

fn collect_defined_names_and_indices(root: &Node) -> DefinedRefs {
    struct Collector {
        names: IndexSet<String>,
        indices: IndexSet<u32>,
        max_index: u32,
    }
    impl Visitor for Collector {
        fn visit_group(&mut self, n: &GroupNode) {
            if let Some(name) = &n.name {
                self.names.insert(name.clone());
            }
            if let Some(index) = n.index {
                self.indices.insert(index);
                self.max_index = self.max_index.max(index);
            }
            visit::walk_group(self, n);
        }
    }
    let mut collector = Collector { names: IndexSet::new(), indices: IndexSet::new(), max_index: 0 };
    collector.visit_node(root);
    DefinedRefs { names: collector.names, indices: collector.indices, max_index: collector.max_index }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn issues(pattern: &str) -> Vec<Issue> {
        let ast = parse(pattern).expect("valid pattern");
        validate(&ast)
    }

    #[test]
    fn flags_duplicate_group_names() {
        let found = issues("/(?<x>a)(?<x>b)/");
        assert!(found.iter().any(|i| i.issue_id == "regex.validate.group.duplicate_name"));
    }

    #[test]
    fn branch_reset_duplicate_names_are_allowed() {
        let found = issues("/(?|(?<x>a)|(?<x>b))/");
        assert!(!found.iter().any(|i| i.issue_id == "regex.validate.group.duplicate_name"));
    }

    #[test]
    fn flags_reversed_range() {
        let found = issues("/[z-a]/");
        assert!(found.iter().any(|i| i.issue_id == "regex.validate.range.reversed"));
    }

    #[test]
    fn flags_undefined_backref() {
        let found = issues("/\\k<missing>/");
        assert!(found.iter().any(|i| i.issue_id == "regex.validate.backref.undefined"));
    }

    #[test]
    fn flags_posix_class_outside_bracket() {
        let found = issues("/[:digit:]/");
        assert!(found.iter().any(|i| i.issue_id == "regex.validate.charclass.posix_outside_class"));
    }

    #[test]
    fn accepts_posix_class_inside_bracket() {
        let found = issues("/[[:digit:]]/");
        assert!(!found.iter().any(|i| i.issue_id == "regex.validate.charclass.posix_outside_class"));
    }
}
