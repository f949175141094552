//! First-/last-set computation over the AST (spec.md §4.7 "CharSet support"),
//! shared by the linter's impossible-anchor rule and the ReDoS analyzer's
//! disjointness checks.

use crate::ast::*;
use regexlab_core::CharSet;

const DIGIT: (u8, u8) = (b'0', b'9');
const WORD_RANGES: [(u8, u8); 4] = [(b'0', b'9'), (b'A', b'Z'), (b'_', b'_'), (b'a', b'z')];
const SPACE_CHARS: [u8; 6] = [b'\t', b'\n', 0x0b, 0x0c, b'\r', b' '];

/// The set of bytes a node's match can *start* with, conservatively over-
/// approximated. `flags.unicode` widens `\d \w \s` complements to
/// [`CharSet::unknown`] per spec.md §4.7 since we cannot enumerate non-ASCII
/// codepoints as bytes.
pub fn first_set(node: &Node, flags: Flags) -> CharSet {
    match node {
        Node::Literal(n) => literal_first_byte(&n.text),
        Node::CharLiteral(n) => CharSet::single((n.codepoint & 0xff) as u8),
        Node::CharType(n) => char_type_set(n.kind, flags),
        Node::Dot(_) => CharSet::universe(),
        Node::Anchor(_) | Node::Assertion(_) | Node::Keep(_) | Node::Comment(_) => CharSet::empty(),
        Node::CharClass(n) => char_class_set(n, flags),
        Node::PosixClass(n) => posix_class_set(&n.name, n.negated),
        Node::UnicodeProp(_) => CharSet::unknown(),
        Node::Group(n) => first_set(&n.child, flags),
        Node::Quantifier(n) => first_set(&n.inner, flags),
        Node::Sequence(n) => sequence_first_set(&n.children, flags),
        Node::Alternation(n) => n.branches.iter().fold(CharSet::empty(), |acc, b| acc.union(&first_set(b, flags))),
        Node::Range(n) => first_set(&n.start, flags).union(&first_set(&n.end, flags)),
        Node::ClassOperation(n) => {
            let left = first_set(&n.left, flags);
            let right = first_set(&n.right, flags);
            if n.op == ClassOp::Intersection { left.intersection(&right) } else { left }
        }
        Node::Backref(_) | Node::Subroutine(_) | Node::Callout(_) | Node::PcreVerb(_) | Node::LimitMatch(_) | Node::VersionCondition(_) => {
            CharSet::unknown()
        }
        Node::Conditional(n) => {
            let mut set = first_set(&n.yes, flags);
            if let Some(no) = &n.no {
                set = set.union(&first_set(no, flags));
            }
            set
        }
        Node::Define(_) => CharSet::empty(),
        Node::ScriptRun(n) => first_set(&n.child, flags),
        Node::Regex(n) => first_set(&n.pattern, flags),
    }
}

fn sequence_first_set(children: &[Node], flags: Flags) -> CharSet {
    let mut set = CharSet::empty();
    for child in children {
        set = set.union(&first_set(child, flags));
        if !can_match_empty(child, flags) {
            break;
        }
    }
    set
}

/// Conservative: `true` only for constructs that provably always match the
/// empty string. Unknown/variable-width constructs count as non-empty so
/// `sequence_first_set` doesn't overreach past them.
pub fn can_match_empty(node: &Node, flags: Flags) -> bool {
    match node {
        Node::Anchor(_) | Node::Assertion(_) | Node::Keep(_) | Node::Comment(_) | Node::Callout(_) | Node::PcreVerb(_) | Node::Define(_) => true,
        Node::Quantifier(n) => n.min == 0 || can_match_empty(&n.inner, flags),
        Node::Group(n) => can_match_empty(&n.child, flags),
        Node::Sequence(n) => n.children.iter().all(|c| can_match_empty(c, flags)),
        Node::Alternation(n) => n.branches.iter().any(|b| can_match_empty(b, flags)),
        Node::Conditional(n) => can_match_empty(&n.yes, flags) || n.no.as_deref().map_or(true, |no| can_match_empty(no, flags)),
        Node::ScriptRun(n) => can_match_empty(&n.child, flags),
        Node::Regex(n) => can_match_empty(&n.pattern, flags),
        _ => false,
    }
}

fn literal_first_byte(text: &str) -> CharSet {
    match text.chars().next() {
        Some(c) if c.is_ascii() => CharSet::single(c as u8),
        Some(_) => CharSet::unknown(),
        None => CharSet::empty(),
    }
}

/// Exposed within the crate so the optimizer's charclass-to-shorthand rule
/// (spec.md §4.6 rule 4) can compare a literal class's byte set against the
/// canonical `\d`/`\w`/`\s` sets without duplicating this table.
pub(crate) fn char_type_set(kind: CharTypeKind, flags: Flags) -> CharSet {
    let positive = match kind {
        CharTypeKind::Digit | CharTypeKind::NotDigit => CharSet::from_ranges([DIGIT]),
        CharTypeKind::Word | CharTypeKind::NotWord => CharSet::from_ranges(WORD_RANGES),
        CharTypeKind::Space | CharTypeKind::NotSpace => {
            let mut set = CharSet::empty();
            for b in SPACE_CHARS {
                set = set.union(&CharSet::single(b));
            }
            set
        }
    };
    if !kind.is_negated() {
        return positive;
    }
    if flags.unicode {
        CharSet::unknown()
    } else {
        positive.complement()
    }
}

fn char_class_set(n: &CharClassNode, flags: Flags) -> CharSet {
    let mut set = CharSet::empty();
    for item in &n.items {
        set = set.union(&first_set(item, flags));
    }
    if n.negated { set.complement() } else { set }
}

fn posix_class_set(name: &str, negated: bool) -> CharSet {
    let set = match name {
        "digit" => CharSet::from_ranges([DIGIT]),
        "alpha" => CharSet::from_ranges([(b'A', b'Z'), (b'a', b'z')]),
        "alnum" => CharSet::from_ranges([(b'0', b'9'), (b'A', b'Z'), (b'a', b'z')]),
        "upper" => CharSet::from_ranges([(b'A', b'Z')]),
        "lower" => CharSet::from_ranges([(b'a', b'z')]),
        "space" => {
            let mut s = CharSet::empty();
            for b in SPACE_CHARS {
                s = s.union(&CharSet::single(b));
            }
            s
        }
        "punct" => CharSet::from_ranges([(0x21, 0x2f), (0x3a, 0x40), (0x5b, 0x60), (0x7b, 0x7e)]),
        "xdigit" => CharSet::from_ranges([(b'0', b'9'), (b'A', b'F'), (b'a', b'f')]),
        "cntrl" => CharSet::from_ranges([(0x00, 0x1f), (0x7f, 0x7f)]),
        "print" => CharSet::from_ranges([(0x20, 0x7e)]),
        "graph" => CharSet::from_ranges([(0x21, 0x7e)]),
        "blank" => CharSet::from_ranges([(b' ', b' '), (b'\t', b'\t')]),
        _ => CharSet::unknown(),
    };
    if negated { set.complement() } else { set }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn first(pattern: &str) -> CharSet {
        let ast = parse(pattern).expect("valid pattern");
        let Node::Regex(r) = &ast else { unreachable!() };
        first_set(&r.pattern, r.flags)
    }

    #[test]
    fn literal_sequence_uses_first_literal() {
        let set = first("/abc/");
        assert!(set.contains(b'a'));
        assert!(!set.contains(b'b'));
    }

    #[test]
    fn optional_prefix_widens_to_next_atom() {
        let set = first("/a?b/");
        assert!(set.contains(b'a'));
        assert!(set.contains(b'b'));
    }

    #[test]
    fn digit_class_is_ascii_digit_range() {
        let set = first("/\\d+/");
        assert!(set.contains(b'5'));
        assert!(!set.contains(b'a'));
    }

    #[test]
    fn negated_digit_under_unicode_flag_is_unknown() {
        assert!(first("/\\D+/u").is_unknown());
        assert!(!first("/\\D+/").is_unknown());
    }
}
