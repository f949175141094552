//! Character-class grammar (spec.md §4.1 "Inside `[…]`" and §3.3's list of
//! legal `CharClass` children): literals, escapes, ranges, POSIX classes,
//! Unicode properties, and `&&`/`--` set operations.

use crate::ast::*;
use crate::error::ParseError;
use crate::parser::Parser;
use crate::token::TokenKind;
use regexlab_core::Span;

impl Parser<'_> {
    pub(crate) fn parse_char_class(&mut self) -> Result<Node, ParseError> {
        let opener = self.bump();
        let negated = opener.kind == TokenKind::ClassNegation;

        let mut operands: Vec<(Vec<Node>, u32)> = vec![(Vec::new(), self.current_span().start)];
        let mut ops: Vec<ClassOp> = Vec::new();

        while !self.at(TokenKind::ClassClose) && !self.at(TokenKind::EndOfInput) {
            if self.at(TokenKind::ClassOperation) {
                let op = if self.current().text == "&&" { ClassOp::Intersection } else { ClassOp::Subtraction };
                self.bump();
                ops.push(op);
                operands.push((Vec::new(), self.current_span().start));
                continue;
            }
            let item = self.parse_class_item()?;
            operands.last_mut().expect("seeded with one operand").0.push(item);
        }
        let close = self.expect(TokenKind::ClassClose, "']' closing the character class")?;
        let span = Span::new(opener.span.start, close.span.end);

        if ops.is_empty() {
            let (items, _) = operands.into_iter().next().expect("seeded with one operand");
            return Ok(Node::CharClass(CharClassNode { span, items, negated }));
        }

        let mut sides = operands.into_iter().map(|(items, start)| wrap_operand(items, start));
        let mut acc = sides.next().expect("at least one operand when ops is non-empty");
        for op in ops {
            let right = sides.next().expect("one more operand than operator");
            let op_span = Span::new(acc.span().start, right.span().end);
            acc = Node::ClassOperation(ClassOperationNode { span: op_span, op, left: Box::new(acc), right: Box::new(right) });
        }
        Ok(Node::CharClass(CharClassNode { span, items: vec![acc], negated }))
    }

    fn parse_class_item(&mut self) -> Result<Node, ParseError> {
        let atom = match self.current_kind() {
            TokenKind::PosixClass => self.parse_posix_class()?,
            TokenKind::UnicodeProperty => self.parse_unicode_prop()?,
            TokenKind::CharType => self.parse_class_char_type()?,
            TokenKind::ClassOpen | TokenKind::ClassNegation => self.parse_char_class()?,
            _ => self.parse_class_literal_like()?,
        };
        if self.at(TokenKind::RangeHyphen) && class_item_is_range_endpoint(&atom) {
            self.bump();
            let end = self.parse_class_literal_like()?;
            let span = Span::new(atom.span().start, end.span().end);
            return Ok(Node::Range(RangeNode { span, start: Box::new(atom), end: Box::new(end) }));
        }
        Ok(atom)
    }

    fn parse_class_literal_like(&mut self) -> Result<Node, ParseError> {
        match self.current_kind() {
            TokenKind::UnicodeEscape | TokenKind::Octal => self.parse_class_char_literal(),
            TokenKind::RangeHyphen => {
                let tok = self.bump();
                Ok(Node::Literal(LiteralNode { span: tok.span, text: "-".to_string() }))
            }
            _ => {
                let tok = self.bump();
                let text = tok.text.strip_prefix('\\').unwrap_or(&tok.text).to_string();
                Ok(Node::Literal(LiteralNode { span: tok.span, text }))
            }
        }
    }

    fn parse_class_char_type(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        let letter = tok.text.chars().nth(1).unwrap_or('d');
        let kind = CharTypeKind::from_letter(letter).unwrap_or(CharTypeKind::Digit);
        Ok(Node::CharType(CharTypeNode { span: tok.span, kind }))
    }

    fn parse_class_char_literal(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        let (codepoint, kind) = decode_char_literal(&tok.text);
        Ok(Node::CharLiteral(CharLiteralNode { span: tok.span, codepoint, original: tok.text, kind }))
    }

    fn parse_posix_class(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        let inner = tok.text.trim_start_matches("[:").trim_end_matches(":]");
        let (negated, name) = match inner.strip_prefix('^') {
            Some(rest) => (true, rest.to_string()),
            None => (false, inner.to_string()),
        };
        Ok(Node::PosixClass(PosixClassNode { span: tok.span, name, negated }))
    }

    fn parse_unicode_prop(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump();
        let negated = tok.text.starts_with("\\P");
        let braces = tok.text.contains('{');
        let spec = if braces {
            tok.text.chars().skip(3).take_while(|c| *c != '}').collect()
        } else {
            tok.text.chars().nth(2).map(|c| c.to_string()).unwrap_or_default()
        };
        Ok(Node::UnicodeProp(UnicodePropNode { span: tok.span, spec, negated, braces }))
    }
}

fn wrap_operand(items: Vec<Node>, start: u32) -> Node {
    if items.len() == 1 {
        items.into_iter().next().expect("len 1")
    } else {
        let end = items.last().map(|n| n.span().end).unwrap_or(start);
        Node::CharClass(CharClassNode { span: Span::new(start, end), items, negated: false })
    }
}

fn class_item_is_range_endpoint(node: &Node) -> bool {
    matches!(node, Node::Literal(_) | Node::CharLiteral(_))
}

/// Outside a class, `\x{H...}`/`\xHH`/`\u{H...}`/`\uHHHH` and `\o{O...}`/`\NNN`
/// decode to a single code point; used both here and by the outer-scope
/// version of the same escapes (spec.md §4.1's Unicode/Octal token rules).
pub(crate) fn decode_char_literal(text: &str) -> (u32, CharLiteralType) {
    if let Some(rest) = text.strip_prefix("\\x{").or_else(|| text.strip_prefix("\\u{")) {
        let hex = rest.trim_end_matches('}');
        return (u32::from_str_radix(hex, 16).unwrap_or(0), CharLiteralType::Unicode);
    }
    if let Some(rest) = text.strip_prefix("\\x") {
        return (u32::from_str_radix(rest, 16).unwrap_or(0), CharLiteralType::Unicode);
    }
    if let Some(rest) = text.strip_prefix("\\u") {
        return (u32::from_str_radix(rest, 16).unwrap_or(0), CharLiteralType::UnicodeNamed);
    }
    if let Some(rest) = text.strip_prefix("\\o{") {
        let oct = rest.trim_end_matches('}');
        return (u32::from_str_radix(oct, 8).unwrap_or(0), CharLiteralType::Octal);
    }
    if let Some(rest) = text.strip_prefix('\\') {
        return (u32::from_str_radix(rest, 8).unwrap_or(0), CharLiteralType::OctalLegacy);
    }
    (text.chars().next().map(|c| c as u32).unwrap_or(0), CharLiteralType::Unicode)
}
