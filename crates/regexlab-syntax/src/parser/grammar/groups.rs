//! `(` dispatch table (spec.md §4.2's group-dispatch table) plus conditional
//! parsing (§4.2.1).

use crate::ast::*;
use crate::error::ParseError;
use crate::parser::Parser;
use crate::token::{Token, TokenKind};
use regexlab_core::Span;

impl Parser<'_> {
    pub(crate) fn parse_group(&mut self) -> Result<Node, ParseError> {
        let opener = self.bump();
        match opener.kind {
            TokenKind::GroupOpenPlain => {
                let index = self.alloc_group_index();
                self.finish_group_body(opener, GroupType::Capturing, None, Some(index), None)
            }
            TokenKind::GroupOpenNonCapturing => self.finish_group_body(opener, GroupType::NonCapturing, None, None, None),
            TokenKind::GroupOpenAtomic => self.finish_group_body(opener, GroupType::Atomic, None, None, None),
            TokenKind::GroupOpenLookahead => {
                let kind = if opener.text.ends_with('!') { GroupType::LookaheadNegative } else { GroupType::LookaheadPositive };
                self.finish_group_body(opener, kind, None, None, None)
            }
            TokenKind::GroupOpenLookbehind => {
                let kind = if opener.text.ends_with('!') { GroupType::LookbehindNegative } else { GroupType::LookbehindPositive };
                self.finish_group_body(opener, kind, None, None, None)
            }
            TokenKind::GroupOpenNamed => {
                let name = extract_group_name(&opener.text);
                let index = self.alloc_group_index();
                self.finish_group_body(opener, GroupType::Named, Some(name), Some(index), None)
            }
            TokenKind::GroupOpenBranchReset => {
                self.enter_branch_reset();
                let base = self.next_group_index;
                let child = self.parse_branch_reset_alternation()?;
                self.exit_branch_reset();
                self.expect(TokenKind::GroupClose, "')' closing the branch-reset group")?;
                let span = Span::new(opener.span.start, child.span().end);
                Ok(Node::Group(GroupNode { span, child: Box::new(child), kind: GroupType::BranchReset, name: None, index: Some(base), flags: None }))
            }
            TokenKind::GroupOpenInlineFlags => self.parse_inline_flags(opener),
            TokenKind::GroupOpenVerbOrCondition => self.parse_conditional(opener),
            other => Err(ParseError::new(format!("{other:?} is not a group opener"), opener.span.start)),
        }
    }

    fn finish_group_body(
        &mut self,
        opener: Token,
        kind: GroupType,
        name: Option<String>,
        index: Option<u32>,
        flags: Option<FlagChange>,
    ) -> Result<Node, ParseError> {
        let child = self.parse_alternation()?;
        self.expect(TokenKind::GroupClose, "')' closing the group")?;
        let span = Span::new(opener.span.start, child.span().end);
        Ok(Node::Group(GroupNode { span, child: Box::new(child), kind, name, index, flags }))
    }

    fn parse_inline_flags(&mut self, opener: Token) -> Result<Node, ParseError> {
        let inner = opener.text.strip_prefix("(?").unwrap_or(&opener.text);
        let scoped = inner.ends_with(':');
        let flags_text = inner.trim_end_matches(':').trim_end_matches(')');
        let (enable_text, disable_text) = flags_text.split_once('-').unwrap_or((flags_text, ""));
        let enable = Flags::from_chars(enable_text.chars()).unwrap_or_default();
        let disable = Flags::from_chars(disable_text.chars()).unwrap_or_default();

        let child = if scoped {
            let body = self.parse_alternation()?;
            self.expect(TokenKind::GroupClose, "')' closing the flag group")?;
            body
        } else {
            self.parse_sequence()?
        };
        let span = Span::new(opener.span.start, child.span().end);
        Ok(Node::Group(GroupNode {
            span,
            child: Box::new(child),
            kind: GroupType::InlineFlags,
            name: None,
            index: None,
            flags: Some(FlagChange { enable, disable }),
        }))
    }

    fn parse_conditional(&mut self, opener: Token) -> Result<Node, ParseError> {
        let cond_text = opener.text.strip_prefix("(?(").and_then(|s| s.strip_suffix(')')).unwrap_or_default().to_string();

        if cond_text == "DEFINE" {
            let definitions = self.parse_alternation()?;
            self.expect(TokenKind::GroupClose, "')' closing the DEFINE block")?;
            let span = Span::new(opener.span.start, definitions.span().end);
            return Ok(Node::Define(DefineNode { span, definitions: Box::new(definitions) }));
        }

        let cond_start = opener.span.start + 3;
        let condition = parse_condition_text(&cond_text, Span::new(cond_start, cond_start + cond_text.len() as u32));

        let yes = self.parse_sequence()?;
        let no = if self.at(TokenKind::Alternation) {
            self.bump();
            Some(Box::new(self.parse_alternation()?))
        } else {
            None
        };
        self.expect(TokenKind::GroupClose, "')' closing the conditional")?;
        let end = no.as_ref().map(|n| n.span().end).unwrap_or_else(|| yes.span().end);
        let span = Span::new(opener.span.start, end);
        Ok(Node::Conditional(ConditionalNode { span, condition: Box::new(condition), yes: Box::new(yes), no }))
    }
}

fn extract_group_name(text: &str) -> String {
    for (prefix, suffix) in [("(?<", ">"), ("(?'", "'"), ("(?P<", ">")] {
        if let Some(rest) = text.strip_prefix(prefix) {
            return rest.trim_end_matches(suffix).to_string();
        }
    }
    text.to_string()
}

/// A `(?(cond)...)` condition is itself a small closed grammar: a group
/// number, a relative number, a name, `R`/`R&name`, a `VERSION` comparison,
/// or a parenthesized lookaround (already fully tokenized inside `cond`
/// since the opener captured through the matching `)`). We don't re-lex the
/// lookaround form here — it is represented as a [`BackrefNode`] carrying
/// the raw condition text, which the validator resolves the same way it
/// resolves any other backref/subroutine reference.
fn parse_condition_text(text: &str, span: Span) -> Node {
    if let Some(rest) = text.strip_prefix("VERSION") {
        let (op, version) = if let Some(v) = rest.strip_prefix(">=") {
            (VersionOp::GreaterEq, v)
        } else {
            (VersionOp::Eq, rest.trim_start_matches('='))
        };
        return Node::VersionCondition(VersionConditionNode { span, op, version: version.to_string() });
    }
    if text == "R" {
        return Node::Subroutine(SubroutineNode { span, reference: String::new(), origin: SubroutineOrigin::WholeRecursion });
    }
    if let Some(rest) = text.strip_prefix("R&") {
        return Node::Subroutine(SubroutineNode { span, reference: rest.to_string(), origin: SubroutineOrigin::Ampersand });
    }
    Node::Backref(BackrefNode { span, reference: text.to_string() })
}
