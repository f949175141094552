//! Quantifier suffixes (spec.md §4.2): `? ?? * *+ + ++ {m} {m,} {m,n}`, each
//! with an optional trailing `?`/`+` switching greedy to lazy/possessive.

use crate::ast::{Node, QuantifierNode, QuantifierType};
use crate::error::{ParseError, SyntaxError};
use crate::parser::Parser;
use crate::token::TokenKind;
use regexlab_core::Span;

impl Parser<'_> {
    /// `inner` has already been parsed; if the current token is a quantifier
    /// suffix, wrap `inner` in a `Quantifier` node, otherwise return it as-is.
    pub(crate) fn try_parse_quantifier(&mut self, inner: Node) -> Result<Node, ParseError> {
        if !self.at(TokenKind::Quantifier) {
            return Ok(inner);
        }
        let tok = self.bump();
        if inner.is_unquantifiable() {
            let e = ParseError::syntax(SyntaxError::InvalidQuantifierTarget(tok.span.start));
            return self.recover_quantified(inner, tok.text, e);
        }

        let (min, max, kind) = decode_quantifier(&tok.text);
        if let Some(max) = max {
            if min > max {
                let e = ParseError::syntax(SyntaxError::QuantifierMinExceedsMax(tok.span.start, min, max));
                return self.recover_quantified(inner, tok.text, e);
            }
        }

        let span = Span::new(inner.span().start, tok.span.end);
        Ok(Node::Quantifier(QuantifierNode { span, inner: Box::new(inner), raw: tok.text, kind, min, max }))
    }

    /// In tolerant mode keep `inner` wrapped with a best-effort quantifier
    /// instead of discarding it entirely; in strict mode this just
    /// propagates `e` as usual through `recover`.
    fn recover_quantified(&mut self, inner: Node, raw: String, e: ParseError) -> Result<Node, ParseError> {
        if !self.tolerant {
            return Err(e);
        }
        self.errors.push(e);
        let span = inner.span();
        Ok(Node::Quantifier(QuantifierNode { span, inner: Box::new(inner), raw, kind: QuantifierType::Greedy, min: 0, max: None }))
    }
}

fn decode_quantifier(raw: &str) -> (u32, Option<u32>, QuantifierType) {
    let (body, kind) = if let Some(b) = raw.strip_suffix("+") {
        if b.ends_with('+') || b.ends_with('*') || b.ends_with('?') || b.ends_with('}') {
            (b, QuantifierType::Possessive)
        } else {
            (raw, QuantifierType::Greedy)
        }
    } else if let Some(b) = raw.strip_suffix('?') {
        if b.ends_with('?') || b.ends_with('*') || b.ends_with('+') || b.ends_with('}') {
            (b, QuantifierType::Lazy)
        } else {
            (raw, QuantifierType::Greedy)
        }
    } else {
        (raw, QuantifierType::Greedy)
    };

    let (min, max) = match body {
        "?" => (0, Some(1)),
        "*" => (0, None),
        "+" => (1, None),
        other if other.starts_with('{') => decode_braced(other.trim_start_matches('{').trim_end_matches('}')),
        _ => (0, None),
    };
    (min, max, kind)
}

fn decode_braced(inner: &str) -> (u32, Option<u32>) {
    match inner.split_once(',') {
        None => {
            let n = inner.parse().unwrap_or(0);
            (n, Some(n))
        }
        Some((min_text, "")) => (min_text.parse().unwrap_or(0), None),
        Some((min_text, max_text)) => (min_text.parse().unwrap_or(0), max_text.parse().ok()),
    }
}
