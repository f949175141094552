//! Optimizer visitor (spec.md §4.6): produces a *new* AST with the nine
//! listed rewrites applied bottom-up. Every rewrite is idempotent — running
//! it twice leaves the tree unchanged — because each one already normalizes
//! its target to the canonical form it would otherwise converge to.

use crate::analyze::charset::{char_type_set, first_set};
use crate::ast::*;
use regexlab_core::{CharSet, Span};

#[derive(Debug, Clone, Copy)]
pub struct OptimizerOptions {
    /// Rule 4: `[0-9]` -> `\d`, `[a-zA-Z0-9_]` -> `\w`, whitespace class -> `\s`.
    pub charclass_to_shorthand: bool,
    /// Rule 8: factor common prefixes/suffixes in alternation. Off by
    /// default per spec.md §4.6 ("when explicitly enabled").
    pub factor_common_affixes: bool,
    /// Rule 9: auto-possessify `a*` before a disjoint atom. Off by default,
    /// same reason.
    pub auto_possessify: bool,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self { charclass_to_shorthand: true, factor_common_affixes: false, auto_possessify: false }
    }
}

/// Rewrite `node` under `options`, discarding the record of which rules
/// fired. Most callers that only want the rewritten tree (tests, the
/// safety-gate re-parse in [`optimize_checked`]) use this; [`optimize_with_changes`]
/// is for callers that need to report what changed.
pub fn optimize(node: &Node, options: &OptimizerOptions) -> Node {
    let mut changes = Vec::new();
    optimize_inner(node, options, &mut changes)
}

/// Like [`optimize`], but also returns an itemized, human-readable list of
/// which of the nine rules actually rewrote something (spec.md §6's
/// `optimize(...) -> { ..., changes[] }`, e.g. `"Replaced [0-9] with \d"`).
pub fn optimize_with_changes(node: &Node, options: &OptimizerOptions) -> (Node, Vec<String>) {
    let mut changes = Vec::new();
    let rewritten = optimize_inner(node, options, &mut changes);
    (rewritten, changes)
}

fn optimize_inner(node: &Node, options: &OptimizerOptions, changes: &mut Vec<String>) -> Node {
    match node {
        Node::Regex(n) => Node::Regex(RegexNode { pattern: Box::new(optimize_inner(&n.pattern, options, changes)), ..n.clone() }),
        Node::Sequence(n) => optimize_sequence(n, options, changes),
        Node::Alternation(n) => optimize_alternation(n, options, changes),
        Node::Group(n) => optimize_group(n, options, changes),
        Node::Quantifier(n) => optimize_quantifier(n, options, changes),
        Node::CharClass(n) => optimize_char_class(n, options, changes),
        Node::Range(n) => Node::Range(RangeNode {
            start: Box::new(optimize_inner(&n.start, options, changes)),
            end: Box::new(optimize_inner(&n.end, options, changes)),
            ..n.clone()
        }),
        Node::ClassOperation(n) => Node::ClassOperation(ClassOperationNode {
            left: Box::new(optimize_inner(&n.left, options, changes)),
            right: Box::new(optimize_inner(&n.right, options, changes)),
            ..n.clone()
        }),
        Node::Conditional(n) => Node::Conditional(ConditionalNode {
            condition: Box::new(optimize_inner(&n.condition, options, changes)),
            yes: Box::new(optimize_inner(&n.yes, options, changes)),
            no: n.no.as_ref().map(|no| Box::new(optimize_inner(no, options, changes))),
            ..n.clone()
        }),
        Node::Define(n) => Node::Define(DefineNode { definitions: Box::new(optimize_inner(&n.definitions, options, changes)), ..n.clone() }),
        Node::ScriptRun(n) => {
            Node::ScriptRun(ScriptRunNode { child: Box::new(optimize_inner(&n.child, options, changes)), ..n.clone() })
        }
        leaf => leaf.clone(),
    }
}

fn optimize_sequence(n: &SequenceNode, options: &OptimizerOptions, changes: &mut Vec<String>) -> Node {
    let optimized: Vec<Node> = n.children.iter().map(|c| optimize_inner(c, options, changes)).collect();

    // Rule 1: merge adjacent Literal siblings.
    let before = optimized.len();
    let mut merged: Vec<Node> = Vec::with_capacity(optimized.len());
    for child in optimized {
        match (merged.last_mut(), &child) {
            (Some(Node::Literal(prev)), Node::Literal(next)) => {
                prev.text.push_str(&next.text);
                prev.span = Span::new(prev.span.start, next.span.end);
            }
            _ => merged.push(child),
        }
    }
    if merged.len() < before {
        changes.push("Merged adjacent literals".to_string());
    }

    // Rule 9: auto-possessify `a*`/`a+` before a disjoint following atom.
    if options.auto_possessify {
        for i in 0..merged.len().saturating_sub(1) {
            let disjoint = first_set(&merged[i], Flags::default()).is_disjoint(&first_set(&merged[i + 1], Flags::default()));
            if let Node::Quantifier(q) = &mut merged[i] {
                if disjoint && q.max.is_none() && q.kind == QuantifierType::Greedy {
                    q.kind = QuantifierType::Possessive;
                    q.raw = build_raw(q.min, q.max, q.kind);
                    changes.push(format!("Made quantifier '{}' possessive", q.raw));
                }
            }
        }
    }

    if merged.len() == 1 {
        return merged.into_iter().next().expect("len 1");
    }
    let span = sequence_span(n.span, &merged);
    Node::Sequence(SequenceNode { span, children: merged })
}

fn sequence_span(fallback: Span, children: &[Node]) -> Span {
    match (children.first(), children.last()) {
        (Some(a), Some(b)) => Span::new(a.span().start, b.span().end),
        _ => fallback,
    }
}

fn optimize_alternation(n: &AlternationNode, options: &OptimizerOptions, changes: &mut Vec<String>) -> Node {
    // Rule 2: flatten nested Alternation.
    let mut branches = Vec::with_capacity(n.branches.len());
    let mut flattened_any = false;
    for branch in &n.branches {
        match optimize_inner(branch, options, changes) {
            Node::Alternation(nested) => {
                flattened_any = true;
                branches.extend(nested.branches);
            }
            other => branches.push(other),
        }
    }
    if flattened_any {
        changes.push("Flattened nested alternation".to_string());
    }

    // Rule 5: fuse an alternation of single-character branches into a class.
    if branches.len() >= 2 && branches.iter().all(is_single_char_atom) {
        changes.push("Fused single-character alternation into a character class".to_string());
        let fused = CharClassNode { span: n.span, items: branches, negated: false };
        return optimize_char_class(&fused, options, changes);
    }

    if options.factor_common_affixes {
        if let Some(factored) = factor_common_prefix(&branches, n.span) {
            changes.push("Factored common prefix in alternation".to_string());
            return factored;
        }
    }

    Node::Alternation(AlternationNode { span: n.span, branches })
}

fn is_single_char_atom(node: &Node) -> bool {
    matches!(node, Node::Literal(l) if l.text.chars().count() == 1) || matches!(node, Node::CharLiteral(_))
}

/// Rule 8 (opt-in): when every branch is a plain literal and shares a common
/// prefix, rewrite `foo|foot` as `foo(?:|t)`.
fn factor_common_prefix(branches: &[Node], span: Span) -> Option<Node> {
    if branches.len() < 2 {
        return None;
    }
    let texts: Vec<&str> = branches
        .iter()
        .map(|b| match b {
            Node::Literal(l) => Some(l.text.as_str()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    let prefix_len = texts
        .iter()
        .skip(1)
        .fold(texts[0].len(), |acc, t| common_prefix_len(texts[0], t).min(acc));
    if prefix_len == 0 {
        return None;
    }
    let prefix = &texts[0][..prefix_len];

    let tails: Vec<Node> = texts
        .iter()
        .map(|t| {
            let rest = &t[prefix_len..];
            if rest.is_empty() {
                Node::Sequence(SequenceNode { span, children: Vec::new() })
            } else {
                Node::Literal(LiteralNode { span, text: rest.to_string() })
            }
        })
        .collect();

    Some(Node::Sequence(SequenceNode {
        span,
        children: vec![
            Node::Literal(LiteralNode { span, text: prefix.to_string() }),
            Node::Group(GroupNode {
                span,
                child: Box::new(Node::Alternation(AlternationNode { span, branches: tails })),
                kind: GroupType::NonCapturing,
                name: None,
                index: None,
                flags: None,
            }),
        ],
    }))
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

fn optimize_group(n: &GroupNode, options: &OptimizerOptions, changes: &mut Vec<String>) -> Node {
    let child = optimize_inner(&n.child, options, changes);
    // Rule 3: collapse a non-capturing group wrapping a single atom.
    if n.kind == GroupType::NonCapturing && n.flags.is_none() && !matches!(child, Node::Sequence(_) | Node::Alternation(_)) {
        changes.push("Removed redundant non-capturing group around a single atom".to_string());
        return child;
    }
    Node::Group(GroupNode { span: n.span, child: Box::new(child), ..n.clone() })
}

fn optimize_quantifier(n: &QuantifierNode, options: &OptimizerOptions, changes: &mut Vec<String>) -> Node {
    let inner = optimize_inner(&n.inner, options, changes);
    // Rule 6: drop `{1}`.
    if n.min == 1 && n.max == Some(1) {
        changes.push("Dropped redundant {1} quantifier".to_string());
        return inner;
    }
    let raw = build_raw(n.min, n.max, n.kind);
    if raw != n.raw {
        changes.push(format!("Canonicalized quantifier '{}' to '{}'", n.raw, raw));
    }
    Node::Quantifier(QuantifierNode { span: n.span, inner: Box::new(inner), raw, kind: n.kind, min: n.min, max: n.max })
}

/// Rule 6's `{0,1}` -> `?`, `{0,}` -> `*`, `{1,}` -> `+` simplification,
/// folded into a single canonical-form builder so every quantifier (not
/// just ones literally written as `{m,n}`) renders its shortest spelling.
fn build_raw(min: u32, max: Option<u32>, kind: QuantifierType) -> String {
    let base = match (min, max) {
        (0, Some(1)) => "?".to_string(),
        (0, None) => "*".to_string(),
        (1, None) => "+".to_string(),
        (m, Some(x)) if m == x => format!("{{{m}}}"),
        (m, None) => format!("{{{m},}}"),
        (m, Some(x)) => format!("{{{m},{x}}}"),
    };
    match kind {
        QuantifierType::Greedy => base,
        QuantifierType::Lazy => format!("{base}?"),
        QuantifierType::Possessive => format!("{base}+"),
    }
}

fn optimize_char_class(n: &CharClassNode, options: &OptimizerOptions, changes: &mut Vec<String>) -> Node {
    let items: Vec<Node> = n.items.iter().map(|i| optimize_inner(i, options, changes)).collect();
    let before = crate::compile::compile(&Node::CharClass(CharClassNode { span: n.span, items: items.clone(), negated: n.negated }));
    let canonical = canonicalize_char_class(&CharClassNode { span: n.span, items, negated: n.negated });
    let after = crate::compile::compile(&Node::CharClass(canonical.clone()));
    if after != before {
        changes.push("Canonicalized character class (deduped and merged ranges)".to_string());
    }

    if options.charclass_to_shorthand {
        if let Some(kind) = shorthand_for(&canonical) {
            changes.push(format!("Replaced {after} with {}", render_char_type(kind)));
            return Node::CharType(CharTypeNode { span: n.span, kind });
        }
    }
    Node::CharClass(canonical)
}

fn render_char_type(kind: CharTypeKind) -> &'static str {
    match kind {
        CharTypeKind::Digit => "\\d",
        CharTypeKind::NotDigit => "\\D",
        CharTypeKind::Word => "\\w",
        CharTypeKind::NotWord => "\\W",
        CharTypeKind::Space => "\\s",
        CharTypeKind::NotSpace => "\\S",
    }
}

/// Rule 7: dedupe literal members, sort and merge overlapping ranges.
/// Non-literal members (`\d`, POSIX classes, nested operations) aren't byte
/// sets we can fold, so they pass through untouched.
fn canonicalize_char_class(n: &CharClassNode) -> CharClassNode {
    let mut bytes = CharSet::empty();
    let mut rest = Vec::new();
    for item in &n.items {
        match item {
            Node::Literal(l) => match single_ascii_byte_text(&l.text) {
                Some(b) => bytes.insert(b),
                None => rest.push(item.clone()),
            },
            Node::CharLiteral(c) if c.codepoint <= 255 => bytes.insert(c.codepoint as u8),
            Node::Range(r) => match (single_byte(&r.start), single_byte(&r.end)) {
                (Some(lo), Some(hi)) if lo <= hi => bytes.insert_range(lo, hi),
                _ => rest.push(item.clone()),
            },
            other => rest.push(other.clone()),
        }
    }
    for range in bytes.ranges() {
        if range.lo == range.hi {
            rest.push(Node::Literal(LiteralNode { span: n.span, text: (range.lo as char).to_string() }));
        } else {
            rest.push(Node::Range(RangeNode {
                span: n.span,
                start: Box::new(byte_literal(n.span, range.lo)),
                end: Box::new(byte_literal(n.span, range.hi)),
            }));
        }
    }
    CharClassNode { span: n.span, items: rest, negated: n.negated }
}

fn byte_literal(span: Span, b: u8) -> Node {
    Node::CharLiteral(CharLiteralNode { span, codepoint: b as u32, original: format!("\\x{b:02x}"), kind: CharLiteralType::Unicode })
}

fn single_ascii_byte_text(text: &str) -> Option<u8> {
    let mut chars = text.chars();
    let c = chars.next()?;
    if chars.next().is_some() || !c.is_ascii() {
        return None;
    }
    Some(c as u8)
}

fn single_byte(node: &Node) -> Option<u8> {
    match node {
        Node::Literal(l) => single_ascii_byte_text(&l.text),
        Node::CharLiteral(c) => u8::try_from(c.codepoint).ok(),
        _ => None,
    }
}

fn shorthand_for(n: &CharClassNode) -> Option<CharTypeKind> {
    if n.items.iter().any(|i| !matches!(i, Node::Literal(_) | Node::CharLiteral(_) | Node::Range(_))) {
        return None;
    }
    let mut set = CharSet::empty();
    for item in &n.items {
        match item {
            Node::Literal(l) => set.insert(single_ascii_byte_text(&l.text)?),
            Node::CharLiteral(c) => set.insert(u8::try_from(c.codepoint).ok()?),
            Node::Range(r) => {
                let lo = single_byte(&r.start)?;
                let hi = single_byte(&r.end)?;
                set.insert_range(lo, hi);
            }
            _ => return None,
        }
    }
    let candidates = [CharTypeKind::Digit, CharTypeKind::Word, CharTypeKind::Space];
    for kind in candidates {
        if set == char_type_set(kind, Flags::default()) {
            return Some(if n.negated { negate(kind) } else { kind });
        }
    }
    None
}

fn negate(kind: CharTypeKind) -> CharTypeKind {
    match kind {
        CharTypeKind::Digit => CharTypeKind::NotDigit,
        CharTypeKind::Word => CharTypeKind::NotWord,
        CharTypeKind::Space => CharTypeKind::NotSpace,
        other => other,
    }
}

/// Re-parses `compile::compile(optimized)` and checks it reproduces
/// `optimized` itself, ignoring byte spans (spec.md §4.6's safety gate
/// applied at this layer). A rewrite is meant to change shape relative to
/// the *original* — that's the whole point of rules like shorthand-folding
/// — so the structural half of the gate instead catches compiler bugs: a
/// `compile`/`parse` mismatch means the rendered text doesn't mean what the
/// optimizer thought it did. Confirming the rewrite is still *equivalent to
/// the original pattern's language* is `regexlab-facade`'s job, via the
/// `regexlab-automata` solver it depends on and `regexlab-syntax` doesn't.
pub fn optimize_checked(original: &Node, options: &OptimizerOptions) -> Option<Node> {
    optimize_checked_with_changes(original, options).map(|(node, _)| node)
}

/// Like [`optimize_checked`], but also returns the itemized change list
/// from [`optimize_with_changes`].
pub fn optimize_checked_with_changes(original: &Node, options: &OptimizerOptions) -> Option<(Node, Vec<String>)> {
    let (optimized, changes) = optimize_with_changes(original, options);
    let rendered = crate::compile::compile(&optimized);
    let reparsed = crate::parser::parse(&rendered).ok()?;
    if structurally_equal(&optimized, &reparsed) { Some((optimized, changes)) } else { None }
}

/// Structural equality ignoring `Span`: the safety gate needs to compare an
/// original AST against a freshly re-parsed one, whose spans never line up
/// byte-for-byte with the input even when the trees are equivalent.
pub fn structurally_equal(a: &Node, b: &Node) -> bool {
    if !leaf_equal(a, b) {
        return false;
    }
    let (ca, cb) = (a.children(), b.children());
    ca.len() == cb.len() && ca.iter().zip(cb).all(|(x, y)| structurally_equal(x, y))
}

fn leaf_equal(a: &Node, b: &Node) -> bool {
    match (a, b) {
        (Node::Regex(x), Node::Regex(y)) => x.flags == y.flags && x.delimiter == y.delimiter,
        (Node::Sequence(_), Node::Sequence(_)) => true,
        (Node::Alternation(_), Node::Alternation(_)) => true,
        (Node::Group(x), Node::Group(y)) => x.kind == y.kind && x.name == y.name && x.index == y.index && x.flags == y.flags,
        (Node::Quantifier(x), Node::Quantifier(y)) => x.kind == y.kind && x.min == y.min && x.max == y.max,
        (Node::Literal(x), Node::Literal(y)) => x.text == y.text,
        (Node::CharLiteral(x), Node::CharLiteral(y)) => x.codepoint == y.codepoint && x.kind == y.kind,
        (Node::CharType(x), Node::CharType(y)) => x.kind == y.kind,
        (Node::Dot(_), Node::Dot(_)) => true,
        (Node::Anchor(x), Node::Anchor(y)) => x.kind == y.kind,
        (Node::Assertion(x), Node::Assertion(y)) => x.kind == y.kind,
        (Node::Keep(_), Node::Keep(_)) => true,
        (Node::Comment(x), Node::Comment(y)) => x.text == y.text,
        (Node::CharClass(x), Node::CharClass(y)) => x.negated == y.negated,
        (Node::Range(_), Node::Range(_)) => true,
        (Node::PosixClass(x), Node::PosixClass(y)) => x.name == y.name && x.negated == y.negated,
        (Node::UnicodeProp(x), Node::UnicodeProp(y)) => x.spec == y.spec && x.negated == y.negated,
        (Node::ClassOperation(x), Node::ClassOperation(y)) => x.op == y.op,
        (Node::Backref(x), Node::Backref(y)) => x.reference == y.reference,
        (Node::Subroutine(x), Node::Subroutine(y)) => x.reference == y.reference && x.origin == y.origin,
        (Node::Conditional(_), Node::Conditional(_)) => true,
        (Node::Define(_), Node::Define(_)) => true,
        (Node::Callout(x), Node::Callout(y)) => x.id == y.id,
        (Node::PcreVerb(x), Node::PcreVerb(y)) => x.name == y.name,
        (Node::LimitMatch(x), Node::LimitMatch(y)) => x.limit == y.limit,
        (Node::VersionCondition(x), Node::VersionCondition(y)) => x.op == y.op && x.version == y.version,
        (Node::ScriptRun(x), Node::ScriptRun(y)) => x.script == y.script,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn optimized_pattern(pattern: &str, options: OptimizerOptions) -> String {
        let ast = parse(pattern).expect("valid pattern");
        crate::compile::compile(&optimize(&ast, &options))
    }

    #[test]
    fn merges_adjacent_literals() {
        assert_eq!(optimized_pattern("/a(?:b)c/", OptimizerOptions::default()), "/abc/");
    }

    #[test]
    fn drops_exactly_one_quantifier() {
        assert_eq!(optimized_pattern("/a{1}/", OptimizerOptions::default()), "/a/");
    }

    #[test]
    fn simplifies_bounded_quantifiers() {
        assert_eq!(optimized_pattern("/a{0,1}b{0,}c{1,}/", OptimizerOptions::default()), "/a?b*c+/");
    }

    #[test]
    fn folds_digit_class_to_shorthand() {
        assert_eq!(optimized_pattern("/[0-9]+/", OptimizerOptions::default()), "/\\d+/");
    }

    #[test]
    fn fuses_single_char_alternation_into_class() {
        // Rule 5 fuses a|b|c into a class; rule 7's range-merging then
        // coalesces the three adjacent singles into one range.
        assert_eq!(optimized_pattern("/a|b|c/", OptimizerOptions::default()), "/[a-c]/");
    }

    #[test]
    fn fuses_nonadjacent_single_char_alternation_into_class() {
        assert_eq!(optimized_pattern("/a|z|m/", OptimizerOptions::default()), "/[amz]/");
    }

    #[test]
    fn safety_gate_accepts_sound_rewrite() {
        let ast = parse("/[0-9]+/").expect("valid pattern");
        assert!(optimize_checked(&ast, &OptimizerOptions::default()).is_some());
    }

    #[test]
    fn reports_which_rule_replaced_a_digit_class_with_shorthand() {
        let ast = parse("/[0-9]+/").expect("valid pattern");
        let (_, changes) = optimize_with_changes(&ast, &OptimizerOptions::default());
        assert!(changes.iter().any(|c| c.contains("[0-9]") && c.contains("\\d")));
    }

    #[test]
    fn reports_no_changes_for_an_already_canonical_pattern() {
        let ast = parse("/abc/").expect("valid pattern");
        let (_, changes) = optimize_with_changes(&ast, &OptimizerOptions::default());
        assert!(changes.is_empty());
    }

    #[test]
    fn reports_merged_literals_and_dropped_quantifier() {
        let ast = parse("/a(?:b)c{1}/").expect("valid pattern");
        let (_, changes) = optimize_with_changes(&ast, &OptimizerOptions::default());
        assert!(changes.iter().any(|c| c.contains("Merged adjacent literals")));
        assert!(changes.iter().any(|c| c.contains("non-capturing group")));
    }

    #[test]
    fn checked_with_changes_surfaces_the_same_list() {
        let ast = parse("/[0-9]+/").expect("valid pattern");
        let (_, changes) = optimize_checked_with_changes(&ast, &OptimizerOptions::default()).expect("sound rewrite");
        assert!(!changes.is_empty());
    }

    #[test]
    fn digit_class_change_message_matches_the_documented_wording() {
        let ast = parse("/[0-9]+/").expect("valid pattern");
        let (_, changes) = optimize_with_changes(&ast, &OptimizerOptions::default());
        insta::assert_snapshot!(changes.join("\n"), @r"Replaced [0-9] with \d");
    }

    #[test]
    fn a_long_alternation_written_across_lines_optimizes_to_one_char_class() {
        use indoc::indoc;
        // indoc! keeps the fixture readable in source; .lines().collect()
        // joins it back into the single-line pattern the lexer expects.
        let pattern: String = indoc! {"
            /a
            |b
            |c
            |d/"}
        .lines()
        .collect();
        assert_eq!(optimized_pattern(&pattern, OptimizerOptions::default()), "/[a-d]/");
    }
}
