//! Hand-written lexer driver (spec.md §4.1): delimiter detection and
//! stripping, flag parsing, and the outer/class mode switch between the two
//! `logos` grammars in `token.rs`. `logos` itself can't express "switch
//! grammars on `[`/`]`", so this module drives two short-lived sub-lexers by
//! hand over the remaining input, the same split the teacher's own
//! hand-written lexer uses despite also depending on `logos`.

use crate::ast::Flags;
use crate::error::LexerError;
use crate::token::{ClassToken, OuterToken, Token, TokenKind};
use logos::Logos;
use regexlab_core::Span;

const DELIMITERS: &[char] = &['/', '#', '~', '%', '@', '!', '(', ')', ';', '<', '>', '{', '['];

pub(crate) fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        other => other,
    }
}

fn is_paired(open: char) -> bool {
    matches!(open, '(' | '{' | '[' | '<')
}

/// The result of splitting and lexing a full `delimiter pattern delimiter
/// flags` string (spec.md §4.1).
#[derive(Debug, Clone)]
pub struct LexOutput {
    pub delimiter: char,
    pub flags: Flags,
    pub body: String,
    pub tokens: Vec<Token>,
}

/// Split `pattern` into delimiter, body and flags, validate the flags, and
/// tokenize the body.
pub fn lex(pattern: &str) -> Result<LexOutput, LexerError> {
    if pattern.chars().count() < 2 {
        return Err(LexerError::PatternTooShort);
    }
    let open = pattern.chars().next().expect("checked non-empty above");
    if !DELIMITERS.contains(&open) {
        return Err(LexerError::UnterminatedDelimiter(open));
    }
    let close = closing_for(open);
    let body_start = open.len_utf8();

    let close_byte = if is_paired(open) {
        find_paired_close(pattern, body_start, open, close)
    } else {
        find_last_unescaped(pattern, body_start, close)
    }
    .ok_or(LexerError::UnterminatedDelimiter(open))?;

    let body = &pattern[body_start..close_byte];
    let flags_text = &pattern[close_byte + close.len_utf8()..];
    let flags = parse_flags(flags_text, close_byte + close.len_utf8())?;
    let tokens = tokenize_body(body);

    Ok(LexOutput { delimiter: open, flags, body: body.to_string(), tokens })
}

/// Depth-counted search for the closing delimiter of a paired form like
/// `(pattern)flags`, respecting backslash escapes. Nested unescaped opens
/// (the regex's own group parens, when `(` is also the chosen delimiter)
/// increase the depth so the delimiter's own nesting matches correctly.
fn find_paired_close(s: &str, start: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 1i32;
    let mut escaped = false;
    for (i, c) in s[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Search for the *last* unescaped occurrence of `close` in a self-paired
/// delimiter form like `/pattern/flags`.
fn find_last_unescaped(s: &str, start: usize, close: char) -> Option<usize> {
    let mut escaped = false;
    let mut last = None;
    for (i, c) in s[start..].char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == close {
            last = Some(start + i);
        }
    }
    last
}

fn parse_flags(flags_text: &str, base_offset: usize) -> Result<Flags, LexerError> {
    let mut flags = Flags::default();
    for (i, c) in flags_text.char_indices() {
        match c {
            'i' => flags.case_insensitive = true,
            'm' => flags.multi_line = true,
            's' => flags.dot_all = true,
            'x' => flags.extended = true,
            'u' => flags.unicode = true,
            'U' => flags.ungreedy = true,
            'D' => flags.dollar_end_only = true,
            'J' => flags.dup_names = true,
            'X' => flags.extra = true,
            'A' => flags.anchored = true,
            other => return Err(LexerError::UnknownFlag(other, (base_offset + i) as u32)),
        }
    }
    Ok(flags)
}

/// Classify what follows an unescaped `(` into a `TokenKind` and the number
/// of bytes of `rest` (after the `(`) the opener consumes. Constructs that
/// are complete in themselves — comment groups, named callouts, `(?P=name)`
/// backreferences, `(*VERB)` atoms — consume all the way through their own
/// closing `)`; true group openers consume only their prefix, leaving the
/// body to be tokenized normally up to a later `GroupClose`.
fn classify_group_open(rest: &str) -> (TokenKind, usize) {
    if let Some(after_star) = rest.strip_prefix('*') {
        if let Some(colon) = after_star.find(':') {
            let name = &after_star[..colon];
            if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
                return (TokenKind::ScriptRun, 1 + colon + 1);
            }
        }
        let end = after_star.find(')').map(|i| i + 1).unwrap_or(after_star.len());
        return (TokenKind::Verb, 1 + end);
    }
    if !rest.starts_with('?') {
        return (TokenKind::GroupOpenPlain, 0);
    }
    let after_q = &rest[1..];
    if let Some(body) = after_q.strip_prefix('#') {
        let end = body.find(')').map(|i| i + 1).unwrap_or(body.len());
        return (TokenKind::GroupOpenComment, 1 + end);
    }
    if after_q.starts_with(':') {
        return (TokenKind::GroupOpenNonCapturing, 2);
    }
    if after_q.starts_with('>') {
        return (TokenKind::GroupOpenAtomic, 2);
    }
    if after_q.starts_with('|') {
        return (TokenKind::GroupOpenBranchReset, 2);
    }
    if after_q.starts_with("<=") || after_q.starts_with("<!") {
        return (TokenKind::GroupOpenLookbehind, 3);
    }
    if after_q.starts_with('=') || after_q.starts_with('!') {
        return (TokenKind::GroupOpenLookahead, 2);
    }
    if let Some(body) = after_q.strip_prefix("P=") {
        let end = body.find(')').map(|i| i + 1).unwrap_or(body.len());
        return (TokenKind::Backref, 2 + end);
    }
    if after_q == "R)" {
        return (TokenKind::Subroutine, 2);
    }
    if let Some(body) = after_q.strip_prefix('&') {
        let end = body.find(')').map(|i| i + 1).unwrap_or(body.len());
        return (TokenKind::Subroutine, 1 + end);
    }
    if let Some(body) = after_q.strip_prefix("P>") {
        let end = body.find(')').map(|i| i + 1).unwrap_or(body.len());
        return (TokenKind::Subroutine, 2 + end);
    }
    if after_q.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '-') {
        let digits_end = after_q
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '-'))
            .map(|(i, _)| i)
            .unwrap_or(after_q.len());
        if digits_end > 0 && after_q[digits_end..].starts_with(')') {
            return (TokenKind::Subroutine, digits_end + 1);
        }
    }
    if let Some(body) = after_q.strip_prefix("P<") {
        let end = body.find('>').map(|i| i + 1).unwrap_or(body.len());
        return (TokenKind::GroupOpenNamed, 2 + end);
    }
    if let Some(body) = after_q.strip_prefix('<') {
        let end = body.find('>').map(|i| i + 1).unwrap_or(body.len());
        return (TokenKind::GroupOpenNamed, 1 + end);
    }
    if let Some(body) = after_q.strip_prefix('\'') {
        let end = body.find('\'').map(|i| i + 1).unwrap_or(body.len());
        return (TokenKind::GroupOpenNamed, 1 + end);
    }
    if let Some(body) = after_q.strip_prefix('(') {
        let end = find_matching_paren(body).map(|i| i + 1).unwrap_or(body.len());
        return (TokenKind::GroupOpenVerbOrCondition, 1 + end);
    }
    if let Some(body) = after_q.strip_prefix('C') {
        let end = body.find(')').map(|i| i).unwrap_or(body.len());
        return (TokenKind::GroupOpenCallout, 1 + end);
    }
    // Inline-flags group: `(?imsx)` or `(?imsx-i:)`, terminated by `:` or `)`.
    let end = after_q.find([':', ')']).map(|i| i + 1).unwrap_or(after_q.len());
    (TokenKind::GroupOpenInlineFlags, 1 + end)
}

/// Find the byte offset of the `)` matching the implicit opening `(` at the
/// start of `s`'s depth-0 level (used for `(?(condition)` where the
/// condition may itself contain a parenthesized lookaround assertion).
fn find_matching_paren(s: &str) -> Option<usize> {
    let mut depth = 1i32;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn outer_kind(tok: OuterToken, text: &str) -> TokenKind {
    match tok {
        OuterToken::Dot => TokenKind::Dot,
        OuterToken::CaretAnchor | OuterToken::DollarAnchor | OuterToken::StringAnchor => TokenKind::Anchor,
        OuterToken::WordBoundary => TokenKind::Assertion,
        OuterToken::Keep => TokenKind::Keep,
        OuterToken::CharType => TokenKind::CharType,
        OuterToken::UnicodeProperty => TokenKind::UnicodeProperty,
        OuterToken::UnicodeEscape => TokenKind::UnicodeEscape,
        OuterToken::Octal => TokenKind::Octal,
        OuterToken::Control => TokenKind::Control,
        OuterToken::NamedBackrefOrSubroutine => {
            // `\g<name>` calls a subroutine; every other `\g`/`\k` form
            // (`\g{...}`, `\g-N`, `\k<...>`, `\k'...'`) is a backreference.
            if text.starts_with("\\g<") {
                TokenKind::Subroutine
            } else {
                TokenKind::Backref
            }
        }
        OuterToken::ParenClose => TokenKind::GroupClose,
        OuterToken::Pipe => TokenKind::Alternation,
        OuterToken::Quantifier => TokenKind::Quantifier,
        OuterToken::EscapedLiteral | OuterToken::PlainText => TokenKind::Literal,
        OuterToken::ParenOpen | OuterToken::BracketOpen => {
            unreachable!("ParenOpen/BracketOpen are classified by the driver, not this table")
        }
    }
}

fn class_kind(tok: ClassToken) -> TokenKind {
    match tok {
        ClassToken::BracketClose => TokenKind::ClassClose,
        ClassToken::Hyphen => TokenKind::RangeHyphen,
        ClassToken::Intersection | ClassToken::Subtraction => TokenKind::ClassOperation,
        ClassToken::PosixClass => TokenKind::PosixClass,
        ClassToken::UnicodeProperty => TokenKind::UnicodeProperty,
        ClassToken::CharType => TokenKind::CharType,
        ClassToken::UnicodeEscape => TokenKind::UnicodeEscape,
        ClassToken::Octal => TokenKind::Octal,
        ClassToken::EscapedLiteral | ClassToken::PlainText => TokenKind::Literal,
    }
}

/// Count the capturing groups `(` and `(?<name>...)` open anywhere in
/// `body`, skipping character-class contents and escaped characters. Used
/// by [`lex_backslash_digit`] to resolve PCRE2's octal-vs-backreference
/// ambiguity, which depends on how many capturing groups the whole pattern
/// declares, not just how many precede the escape.
fn count_capturing_groups(body: &str) -> u32 {
    let mut count = 0u32;
    let mut pos = 0usize;
    let mut class_depth = 0u32;
    while pos < body.len() {
        let rest = &body[pos..];
        let c = rest.chars().next().expect("pos < body.len()");
        if c == '\\' {
            pos += c.len_utf8();
            if let Some(next) = body[pos..].chars().next() {
                pos += next.len_utf8();
            }
            continue;
        }
        if class_depth > 0 {
            match c {
                '[' => class_depth += 1,
                ']' => class_depth -= 1,
                _ => {}
            }
            pos += c.len_utf8();
            continue;
        }
        match c {
            '[' => {
                class_depth += 1;
                pos += 1;
            }
            '(' => {
                let (kind, consumed) = classify_group_open(&rest[1..]);
                if matches!(kind, TokenKind::GroupOpenPlain | TokenKind::GroupOpenNamed) {
                    count += 1;
                }
                pos += 1 + consumed;
            }
            _ => pos += c.len_utf8(),
        }
    }
    count
}

/// Resolve a bare `\` + digits escape into [`TokenKind::Backref`] or
/// [`TokenKind::Octal`] per PCRE2's rule: the longest digit prefix that
/// names a capturing group which exists anywhere in the pattern is read as
/// a backreference; failing that, a leading `0`-`7` is read as an octal
/// character code (up to three digits); failing both (a lone `\8`/`\9` with
/// no matching group), the digit is read as a literal.
fn lex_backslash_digit(rest: &str, total_captures: u32) -> (TokenKind, usize) {
    let after = &rest[1..];
    let digit_len = after.bytes().take_while(|b| b.is_ascii_digit()).count();
    let digits = &after[..digit_len];

    if digits.starts_with('0') {
        let octal_len = digits.bytes().take_while(|b| (b'0'..=b'7').contains(b)).count().clamp(1, 3);
        return (TokenKind::Octal, 1 + octal_len);
    }

    for len in (1..=digit_len).rev() {
        if let Ok(n) = digits[..len].parse::<u32>() {
            if n > 0 && n <= total_captures {
                return (TokenKind::Backref, 1 + len);
            }
        }
    }

    let octal_len = digits.bytes().take_while(|b| (b'0'..=b'7').contains(b)).count().min(3);
    if octal_len > 0 {
        (TokenKind::Octal, 1 + octal_len)
    } else {
        (TokenKind::Literal, 1 + 1)
    }
}

/// Drive the outer/class mode switch over `body`, producing a flat token
/// stream terminated by [`TokenKind::EndOfInput`]. Never fails: any byte
/// neither sub-grammar recognizes is emitted as a one-byte literal, leaving
/// semantic rejection to the parser and validator (spec.md §4.1/§4.3's
/// "lexing never fails on content, only on the delimiter/flag envelope").
fn tokenize_body(body: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    let total_captures = count_capturing_groups(body);
    // Stack of "this class level's next member may still be a literal `]`"
    // flags — non-empty length is the current character-class nesting depth.
    let mut class_stack: Vec<bool> = Vec::new();

    while pos < body.len() {
        let rest = &body[pos..];
        if class_stack.is_empty() {
            if rest.as_bytes().first() == Some(&b'\\') && rest[1..].chars().next().is_some_and(|c| c.is_ascii_digit()) {
                let (kind, len) = lex_backslash_digit(rest, total_captures);
                tokens.push(Token::new(kind, &rest[..len], Span::new(pos as u32, (pos + len) as u32)));
                pos += len;
                continue;
            }
            let mut lex = OuterToken::lexer(rest);
            match lex.next() {
                Some(Ok(OuterToken::BracketOpen)) => {
                    let negated = rest[1..].starts_with('^');
                    let len = if negated { 2 } else { 1 };
                    let kind = if negated { TokenKind::ClassNegation } else { TokenKind::ClassOpen };
                    tokens.push(Token::new(kind, &rest[..len], Span::new(pos as u32, (pos + len) as u32)));
                    class_stack.push(true);
                    pos += len;
                }
                Some(Ok(OuterToken::ParenOpen)) => {
                    let (kind, consumed) = classify_group_open(&rest[1..]);
                    let len = 1 + consumed;
                    tokens.push(Token::new(kind, &rest[..len], Span::new(pos as u32, (pos + len) as u32)));
                    pos += len;
                }
                Some(Ok(tok)) => {
                    let span = lex.span();
                    let text = &rest[span.clone()];
                    let kind = outer_kind(tok, text);
                    tokens.push(Token::new(kind, text, Span::new((pos + span.start) as u32, (pos + span.end) as u32)));
                    pos += span.end;
                }
                Some(Err(())) | None => {
                    let c = rest.chars().next().expect("pos < body.len()");
                    tokens.push(Token::new(TokenKind::Literal, c.to_string(), Span::new(pos as u32, (pos + c.len_utf8()) as u32)));
                    pos += c.len_utf8();
                }
            }
        } else {
            let first_member = *class_stack.last().expect("class_stack non-empty");
            if first_member && rest.starts_with(']') {
                tokens.push(Token::new(TokenKind::Literal, "]", Span::new(pos as u32, (pos + 1) as u32)));
                *class_stack.last_mut().expect("class_stack non-empty") = false;
                pos += 1;
                continue;
            }
            let mut lex = ClassToken::lexer(rest);
            match lex.next() {
                Some(Ok(ClassToken::BracketClose)) => {
                    tokens.push(Token::new(TokenKind::ClassClose, "]", Span::new(pos as u32, (pos + 1) as u32)));
                    class_stack.pop();
                    pos += 1;
                }
                Some(Ok(tok)) => {
                    let span = lex.span();
                    let text = &rest[span.clone()];
                    tokens.push(Token::new(class_kind(tok), text, Span::new((pos + span.start) as u32, (pos + span.end) as u32)));
                    if let Some(top) = class_stack.last_mut() {
                        *top = false;
                    }
                    pos += span.end;
                }
                Some(Err(())) | None => {
                    if rest.starts_with('[') {
                        tokens.push(Token::new(TokenKind::ClassOpen, "[", Span::new(pos as u32, (pos + 1) as u32)));
                        class_stack.push(true);
                        pos += 1;
                    } else {
                        let c = rest.chars().next().expect("pos < body.len()");
                        tokens.push(Token::new(TokenKind::Literal, c.to_string(), Span::new(pos as u32, (pos + c.len_utf8()) as u32)));
                        if let Some(top) = class_stack.last_mut() {
                            *top = false;
                        }
                        pos += c.len_utf8();
                    }
                }
            }
        }
    }

    tokens.push(Token::new(TokenKind::EndOfInput, "", Span::at(body.len() as u32)));
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_slash_delimiter_and_flags() {
        let out = lex("/abc/i").unwrap();
        assert_eq!(out.delimiter, '/');
        assert_eq!(out.body, "abc");
        assert!(out.flags.case_insensitive);
    }

    #[test]
    fn splits_paired_paren_delimiter_with_nesting() {
        let out = lex("(a(b)c)x").unwrap();
        assert_eq!(out.delimiter, '(');
        assert_eq!(out.body, "a(b)c");
    }

    #[test]
    fn rejects_unknown_flag() {
        let err = lex("/abc/q").unwrap_err();
        assert_eq!(err, LexerError::UnknownFlag('q', 5));
    }

    #[test]
    fn rejects_unterminated_delimiter() {
        assert_eq!(lex("/abc").unwrap_err(), LexerError::UnterminatedDelimiter('/'));
    }

    #[test]
    fn rejects_pattern_too_short() {
        assert_eq!(lex("/").unwrap_err(), LexerError::PatternTooShort);
    }

    #[test]
    fn tokenizes_plain_group_and_quantifier() {
        let out = lex("/(ab)+/").unwrap();
        let kinds: Vec<_> = out.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::GroupOpenPlain,
                TokenKind::Literal,
                TokenKind::GroupClose,
                TokenKind::Quantifier,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn tokenizes_named_group() {
        let out = lex("/(?<name>a)/").unwrap();
        assert_eq!(out.tokens[0].kind, TokenKind::GroupOpenNamed);
        assert_eq!(out.tokens[0].text, "(?<name>");
    }

    #[test]
    fn tokenizes_noncapturing_group() {
        let out = lex("/(?:ab)/").unwrap();
        assert_eq!(out.tokens[0].kind, TokenKind::GroupOpenNonCapturing);
    }

    #[test]
    fn leading_bracket_in_class_is_literal() {
        let out = lex("/[]a]/").unwrap();
        let kinds: Vec<_> = out.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::ClassOpen, TokenKind::Literal, TokenKind::Literal, TokenKind::ClassClose, TokenKind::EndOfInput]
        );
    }

    #[test]
    fn negated_class_is_tagged() {
        let out = lex("/[^a-z]/").unwrap();
        assert_eq!(out.tokens[0].kind, TokenKind::ClassNegation);
    }

    #[test]
    fn nested_class_set_subtraction() {
        let out = lex(r"/[\w&&[^aeiou]]/").unwrap();
        let kinds: Vec<_> = out.tokens.iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TokenKind::ClassOperation));
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::ClassClose).count(), 2);
    }

    #[test]
    fn backslash_digit_is_a_backreference_when_the_group_exists() {
        let out = lex(r"/(a)\1/").unwrap();
        let tok = out.tokens.iter().find(|t| t.kind == TokenKind::Backref).unwrap();
        assert_eq!(tok.text, "\\1");
    }

    #[test]
    fn backslash_digit_is_octal_when_no_matching_group_exists() {
        let out = lex(r"/\1/").unwrap();
        let tok = &out.tokens[0];
        assert_eq!(tok.kind, TokenKind::Octal);
        assert_eq!(tok.text, "\\1");
    }

    #[test]
    fn backslash_zero_is_always_octal() {
        let out = lex(r"/(a)\012/").unwrap();
        let tok = out.tokens.iter().find(|t| t.kind == TokenKind::Octal).unwrap();
        assert_eq!(tok.text, "\\012");
    }

    #[test]
    fn backslash_digit_picks_the_longest_matching_group_number() {
        let out = lex(&format!("/{}\\12/", "(a)".repeat(12))).unwrap();
        let tok = out.tokens.iter().rev().find(|t| t.kind == TokenKind::Backref || t.kind == TokenKind::Octal).unwrap();
        assert_eq!(tok.kind, TokenKind::Backref);
        assert_eq!(tok.text, "\\12");
    }

    #[test]
    fn backslash_nine_without_a_matching_group_is_a_literal_digit() {
        let out = lex(r"/\9/").unwrap();
        let tok = &out.tokens[0];
        assert_eq!(tok.kind, TokenKind::Literal);
        assert_eq!(tok.text, "\\9");
    }

    #[test]
    fn pcre_verb_is_a_single_token() {
        let out = lex("/a(*FAIL)/").unwrap();
        let verb = out.tokens.iter().find(|t| t.kind == TokenKind::Verb).unwrap();
        assert_eq!(verb.text, "(*FAIL)");
    }
}
