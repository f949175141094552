//! Leaf and near-leaf grammar productions: literals, char types, anchors,
//! assertions, comments, backreferences, subroutine calls, PCRE verbs.

use crate::ast::*;
use crate::error::ParseError;
use crate::parser::Parser;
use crate::token::TokenKind;

impl Parser<'_> {
    /// Dispatch on the current token's kind to the matching atom production.
    pub(crate) fn parse_atom(&mut self) -> Result<Node, ParseError> {
        match self.current_kind() {
            TokenKind::Literal => self.parse_literal(),
            TokenKind::CharType => self.parse_char_type(),
            TokenKind::Dot => self.parse_dot(),
            TokenKind::Anchor => self.parse_anchor(),
            TokenKind::Assertion => self.parse_assertion(),
            TokenKind::Keep => self.parse_keep(),
            TokenKind::GroupOpenComment => self.parse_comment(),
            TokenKind::GroupOpenCallout => self.parse_callout(),
            TokenKind::ClassOpen | TokenKind::ClassNegation => self.parse_char_class(),
            TokenKind::Backref => self.parse_backref(),
            TokenKind::Subroutine => self.parse_subroutine(),
            TokenKind::Verb => self.parse_verb(),
            TokenKind::ScriptRun => self.parse_script_run(),
            TokenKind::GroupOpenPlain
            | TokenKind::GroupOpenNonCapturing
            | TokenKind::GroupOpenAtomic
            | TokenKind::GroupOpenBranchReset
            | TokenKind::GroupOpenNamed
            | TokenKind::GroupOpenLookahead
            | TokenKind::GroupOpenLookbehind
            | TokenKind::GroupOpenInlineFlags
            | TokenKind::GroupOpenVerbOrCondition => self.parse_group(),
            other => Err(self.err(format!("unexpected token {other:?}"))),
        }
    }

    fn parse_literal(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        let text = tok.text.strip_prefix('\\').unwrap_or(&tok.text).to_string();
        Ok(Node::Literal(LiteralNode { span: tok.span, text }))
    }

    fn parse_char_type(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        let letter = tok.text.chars().nth(1).unwrap_or('d');
        let kind = CharTypeKind::from_letter(letter).unwrap_or(CharTypeKind::Digit);
        Ok(Node::CharType(CharTypeNode { span: tok.span, kind }))
    }

    fn parse_dot(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        Ok(Node::Dot(DotNode { span: tok.span }))
    }

    fn parse_anchor(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        let kind = match tok.text.as_str() {
            "^" => AnchorKind::CaretStart,
            "$" => AnchorKind::DollarEnd,
            "\\A" => AnchorKind::StringStart,
            "\\z" => AnchorKind::StringEndAbsolute,
            "\\Z" => AnchorKind::StringEndBeforeNewline,
            other => return Err(ParseError::new(format!("unrecognized anchor {other}"), tok.span.start)),
        };
        Ok(Node::Anchor(AnchorNode { span: tok.span, kind }))
    }

    fn parse_assertion(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        let kind = if tok.text == "\\B" { AssertionKind::NotWordBoundary } else { AssertionKind::WordBoundary };
        Ok(Node::Assertion(AssertionNode { span: tok.span, kind }))
    }

    fn parse_keep(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        Ok(Node::Keep(KeepNode { span: tok.span }))
    }

    fn parse_comment(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        let text = tok.text.strip_prefix("(?#").and_then(|s| s.strip_suffix(')')).unwrap_or_default().to_string();
        Ok(Node::Comment(CommentNode { span: tok.span, text }))
    }

    fn parse_callout(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        let inner = tok.text.strip_prefix("(?C").and_then(|s| s.strip_suffix(')')).unwrap_or_default();
        let id = if inner.is_empty() {
            None
        } else if let Ok(n) = inner.parse::<u32>() {
            Some(CalloutId::Numeric(n))
        } else {
            Some(CalloutId::Named(inner.to_string()))
        };
        Ok(Node::Callout(CalloutNode { span: tok.span, id }))
    }

    fn parse_backref(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        if tok.text.starts_with("(?P=") {
            let e = ParseError::new("Backreferences (?P=name) are not supported yet.", tok.span.start);
            return self.recover(e);
        }
        let reference = extract_backref_reference(&tok.text);
        Ok(Node::Backref(BackrefNode { span: tok.span, reference }))
    }

    fn parse_subroutine(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        let (reference, origin) = decode_subroutine(&tok.text);
        Ok(Node::Subroutine(SubroutineNode { span: tok.span, reference, origin }))
    }

    fn parse_verb(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        let name = tok.text.strip_prefix("(*").and_then(|s| s.strip_suffix(')')).unwrap_or_default();
        if let Some(limit) = name.strip_prefix("LIMIT_MATCH=").and_then(|n| n.parse::<u32>().ok()) {
            return Ok(Node::LimitMatch(LimitMatchNode { span: tok.span, limit }));
        }
        Ok(Node::PcreVerb(PcreVerbNode { span: tok.span, name: name.to_string() }))
    }

    fn parse_script_run(&mut self) -> Result<Node, ParseError> {
        let opener = self.bump();
        let script = opener.text.strip_prefix("(*").and_then(|s| s.strip_suffix(':')).unwrap_or_default().to_string();
        let child = self.parse_alternation()?;
        self.expect(TokenKind::GroupClose, "')' closing the script-run group")?;
        let span = regexlab_core::Span::new(opener.span.start, child.span().end);
        Ok(Node::ScriptRun(ScriptRunNode { span, script, child: Box::new(child) }))
    }
}

fn extract_backref_reference(text: &str) -> String {
    for (prefix, suffix) in [("\\k<", ">"), ("\\k'", "'"), ("\\k{", "}"), ("\\g{", "}")] {
        if let Some(rest) = text.strip_prefix(prefix) {
            return rest.trim_end_matches(suffix).to_string();
        }
    }
    if let Some(rest) = text.strip_prefix("\\g") {
        return rest.to_string();
    }
    text.trim_start_matches('\\').to_string()
}

fn decode_subroutine(text: &str) -> (String, SubroutineOrigin) {
    if let Some(rest) = text.strip_prefix("\\g<") {
        return (rest.trim_end_matches('>').to_string(), SubroutineOrigin::G);
    }
    if text == "(?R)" {
        return (String::new(), SubroutineOrigin::WholeRecursion);
    }
    if let Some(inner) = text.strip_prefix("(?&").and_then(|s| s.strip_suffix(')')) {
        return (inner.to_string(), SubroutineOrigin::Ampersand);
    }
    if let Some(inner) = text.strip_prefix("(?P>").and_then(|s| s.strip_suffix(')')) {
        return (inner.to_string(), SubroutineOrigin::PGreater);
    }
    if let Some(inner) = text.strip_prefix("(?").and_then(|s| s.strip_suffix(')')) {
        if let Ok(n) = inner.parse::<i32>() {
            if inner.starts_with('-') {
                return (inner.to_string(), SubroutineOrigin::Relative(n));
            }
        }
        return (inner.to_string(), SubroutineOrigin::Bare);
    }
    (text.to_string(), SubroutineOrigin::Bare)
}
