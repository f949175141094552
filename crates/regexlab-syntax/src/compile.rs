//! Round-trip compiler (spec.md §4.3): renders an AST back to pattern text
//! such that re-parsing the result yields a structurally identical tree.

use crate::ast::*;

const OUTER_ESCAPES: &[char] = &['^', '$', '.', '|', '?', '*', '+', '(', ')', '[', ']', '{', '}', '\\'];

/// Render `node` (expected to be a [`Node::Regex`]) back to `/pattern/flags`
/// form, delimiter and flags taken from the node itself.
pub fn compile(node: &Node) -> String {
    let Node::Regex(regex) = node else {
        return render(node);
    };
    let close = crate::lexer::closing_for(regex.delimiter);
    let body = render(&regex.pattern);
    let body = escape_delimiter(&body, regex.delimiter, close);
    format!("{}{}{}{}", regex.delimiter, body, close, regex.flags.to_chars())
}

fn escape_delimiter(body: &str, open: char, close: char) -> String {
    if open == close {
        body.replace(open, &format!("\\{open}"))
    } else {
        body.replace(open, &format!("\\{open}")).replace(close, &format!("\\{close}"))
    }
}

fn render(node: &Node) -> String {
    match node {
        Node::Regex(n) => render(&n.pattern),
        Node::Sequence(n) => n.children.iter().map(render).collect(),
        Node::Alternation(n) => n.branches.iter().map(render).collect::<Vec<_>>().join("|"),
        Node::Group(n) => render_group(n),
        Node::Quantifier(n) => format!("{}{}", render(&n.inner), n.raw),
        Node::Literal(n) => escape_literal_outer(&n.text),
        Node::CharLiteral(n) => n.original.clone(),
        Node::CharType(n) => format!("\\{}", n.kind.letter()),
        Node::Dot(_) => ".".to_string(),
        Node::Anchor(n) => render_anchor(n.kind),
        Node::Assertion(n) => if n.kind == AssertionKind::WordBoundary { "\\b" } else { "\\B" }.to_string(),
        Node::Keep(_) => "\\K".to_string(),
        Node::Comment(n) => format!("(?#{})", n.text),
        Node::CharClass(n) => render_char_class(n),
        Node::Range(n) => format!("{}-{}", render_class_member(&n.start), render_class_member(&n.end)),
        Node::PosixClass(n) => format!("[:{}{}:]", if n.negated { "^" } else { "" }, n.name),
        Node::UnicodeProp(n) => render_unicode_prop(n),
        Node::ClassOperation(n) => {
            let op = if n.op == ClassOp::Intersection { "&&" } else { "--" };
            format!("{}{op}{}", render_class_member(&n.left), render_class_member(&n.right))
        }
        Node::Backref(n) => format!("\\k<{}>", n.reference),
        Node::Subroutine(n) => render_subroutine(n),
        Node::Conditional(n) => render_conditional(n),
        Node::Define(n) => format!("(?(DEFINE){})", render(&n.definitions)),
        Node::Callout(n) => render_callout(n),
        Node::PcreVerb(n) => format!("(*{})", n.name),
        Node::LimitMatch(n) => format!("(*LIMIT_MATCH={})", n.limit),
        Node::VersionCondition(n) => {
            let op = if n.op == VersionOp::GreaterEq { ">=" } else { "=" };
            format!("VERSION{op}{}", n.version)
        }
        Node::ScriptRun(n) => format!("(*script_run:{})", render(&n.child)),
    }
}

fn render_anchor(kind: AnchorKind) -> String {
    match kind {
        AnchorKind::CaretStart => "^".to_string(),
        AnchorKind::DollarEnd => "$".to_string(),
        AnchorKind::StringStart => "\\A".to_string(),
        AnchorKind::StringEndAbsolute => "\\z".to_string(),
        AnchorKind::StringEndBeforeNewline => "\\Z".to_string(),
    }
}

fn render_group(n: &GroupNode) -> String {
    let inner = render(&n.child);
    match n.kind {
        GroupType::Capturing => format!("({inner})"),
        GroupType::NonCapturing => format!("(?:{inner})"),
        GroupType::Atomic => format!("(?>{inner})"),
        GroupType::Named => format!("(?<{}>{inner})", n.name.as_deref().unwrap_or_default()),
        GroupType::LookaheadPositive => format!("(?={inner})"),
        GroupType::LookaheadNegative => format!("(?!{inner})"),
        GroupType::LookbehindPositive => format!("(?<={inner})"),
        GroupType::LookbehindNegative => format!("(?<!{inner})"),
        GroupType::BranchReset => format!("(?|{inner})"),
        GroupType::InlineFlags => render_inline_flags(n, &inner),
    }
}

fn render_inline_flags(n: &GroupNode, inner: &str) -> String {
    let change = n.flags.unwrap_or_default();
    let enable = change.enable.to_chars();
    let disable = change.disable.to_chars();
    let flags_text = if disable.is_empty() { enable } else { format!("{enable}-{disable}") };
    format!("(?{flags_text}:{inner})")
}

fn render_subroutine(n: &SubroutineNode) -> String {
    match &n.origin {
        SubroutineOrigin::G => format!("\\g<{}>", n.reference),
        SubroutineOrigin::Ampersand => format!("(?&{})", n.reference),
        SubroutineOrigin::PGreater => format!("(?P>{})", n.reference),
        SubroutineOrigin::WholeRecursion => "(?R)".to_string(),
        SubroutineOrigin::Bare | SubroutineOrigin::Relative(_) => format!("({})", n.reference),
    }
}

fn render_conditional(n: &ConditionalNode) -> String {
    let cond = render_condition(&n.condition);
    let yes = render(&n.yes);
    match &n.no {
        Some(no) => format!("(?({cond}){yes}|{})", render(no)),
        None => format!("(?({cond}){yes})"),
    }
}

fn render_condition(node: &Node) -> String {
    match node {
        Node::Subroutine(n) if n.origin == SubroutineOrigin::WholeRecursion => "R".to_string(),
        Node::Subroutine(n) => format!("R&{}", n.reference),
        Node::VersionCondition(_) => render(node),
        Node::Backref(n) => n.reference.clone(),
        other => render(other),
    }
}

fn render_callout(n: &CalloutNode) -> String {
    match &n.id {
        None => "(?C)".to_string(),
        Some(CalloutId::Numeric(num)) => format!("(?C{num})"),
        Some(CalloutId::Named(name)) => format!("(?C{name})"),
    }
}

fn render_unicode_prop(n: &UnicodePropNode) -> String {
    let letter = if n.negated { "P" } else { "p" };
    if n.braces {
        format!("\\{letter}{{{}}}", n.spec)
    } else {
        format!("\\{letter}{}", n.spec)
    }
}

fn render_char_class(n: &CharClassNode) -> String {
    let body: String = n.items.iter().map(render_class_member).collect();
    format!("[{}{body}]", if n.negated { "^" } else { "" })
}

/// Inside a class, only `] \ ^ -` need escaping, and only where PCRE2
/// requires it positionally; we escape them unconditionally since an
/// over-escaped literal round-trips to the same codepoint.
fn render_class_member(node: &Node) -> String {
    match node {
        Node::Literal(n) => escape_literal_inner(&n.text),
        Node::CharClass(inner) => render_char_class(inner),
        other => render(other),
    }
}

fn escape_literal_outer(text: &str) -> String {
    text.chars()
        .map(|c| if OUTER_ESCAPES.contains(&c) { format!("\\{c}") } else { c.to_string() })
        .collect()
}

fn escape_literal_inner(text: &str) -> String {
    text.chars()
        .map(|c| if matches!(c, ']' | '\\' | '^' | '-') { format!("\\{c}") } else { c.to_string() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn roundtrip(pattern: &str) {
        let ast = parse(pattern).unwrap_or_else(|e| panic!("parsing {pattern:?} failed: {e}"));
        let rendered = compile(&ast);
        let reparsed = parse(&rendered).unwrap_or_else(|e| panic!("reparsing {rendered:?} failed: {e}"));
        assert_eq!(ast, reparsed, "round-trip mismatch: {pattern:?} -> {rendered:?}");
    }

    #[test]
    fn roundtrips_literals_and_groups() {
        roundtrip("/ab(cd)ef/");
        roundtrip("/a(?:b|c)+d/");
        roundtrip("/(?<year>\\d{4})-(?<month>\\d{2})/");
    }

    #[test]
    fn roundtrips_char_classes() {
        roundtrip("/[a-z0-9_]+/");
        roundtrip("/[^\\]\\\\]/");
        roundtrip("/[\\w&&[^aeiou]]/");
    }

    #[test]
    fn roundtrips_lookaround_and_flags() {
        roundtrip("/foo(?=bar)(?<!baz)/i");
        roundtrip("/(?i:abc)def/");
    }

    #[test]
    fn escapes_delimiter_occurring_in_body() {
        roundtrip("/a\\/b/");
    }
}
