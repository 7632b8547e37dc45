// src/manifest/lexer.rs - Tokenizer for OpenStep property lists

use crate::error::{PatchError, Result};
use crate::splice::line_col;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Equals,
    Semicolon,
    Comma,
    Quoted,
    Bare,
    Comment,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'{' | b'}' | b'(' | b')' | b'=' | b';' | b',' | b'"')
}

pub(crate) fn tokenize(text: &str) -> Result<Vec<Token>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let single = match b {
            b'{' => Some(TokenKind::OpenBrace),
            b'}' => Some(TokenKind::CloseBrace),
            b'(' => Some(TokenKind::OpenParen),
            b')' => Some(TokenKind::CloseParen),
            b'=' => Some(TokenKind::Equals),
            b';' => Some(TokenKind::Semicolon),
            b',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = single {
            tokens.push(Token { kind, span: i..i + 1 });
            i += 1;
            continue;
        }

        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
            let end = text[i + 2..]
                .find("*/")
                .map(|p| i + 2 + p + 2)
                .ok_or_else(|| error_at(text, i, "unterminated comment"))?;
            tokens.push(Token {
                kind: TokenKind::Comment,
                span: i..end,
            });
            i = end;
            continue;
        }

        if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
            let end = text[i..].find('\n').map(|p| i + p).unwrap_or(text.len());
            tokens.push(Token {
                kind: TokenKind::Comment,
                span: i..end,
            });
            i = end;
            continue;
        }

        if b == b'"' {
            let mut j = i + 1;
            loop {
                match bytes.get(j) {
                    None => return Err(error_at(text, i, "unterminated string")),
                    Some(b'\\') => j += 2,
                    Some(b'"') => break,
                    Some(_) => j += 1,
                }
            }
            tokens.push(Token {
                kind: TokenKind::Quoted,
                span: i..j + 1,
            });
            i = j + 1;
            continue;
        }

        let mut j = i;
        while j < bytes.len() && !is_delimiter(bytes[j]) {
            if bytes[j] == b'/' && bytes.get(j + 1) == Some(&b'*') {
                break;
            }
            j += 1;
        }
        tokens.push(Token {
            kind: TokenKind::Bare,
            span: i..j,
        });
        i = j;
    }

    Ok(tokens)
}

pub(crate) fn error_at(text: &str, offset: usize, message: impl Into<String>) -> PatchError {
    let (line, column) = line_col(text, offset);
    PatchError::Parse {
        line,
        column,
        message: message.into(),
    }
}

/// Inner text of a `/* ... */` or `// ...` comment token.
pub(crate) fn comment_text(raw: &str) -> &str {
    if let Some(inner) = raw.strip_prefix("/*").and_then(|r| r.strip_suffix("*/")) {
        inner.trim()
    } else {
        raw.trim_start_matches('/').trim()
    }
}

/// Decode a quoted string token, quotes included.
pub(crate) fn unquote(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(raw);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Encode `value` as a manifest scalar, quoting when required.
pub fn render_scalar(value: &str, force_quotes: bool) -> String {
    let bare_ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.' | '-'))
        && !value.contains("//")
        && !value.contains("/*");
    if bare_ok && !force_quotes {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_record_line() {
        let text = r#"ABC /* x.swift */ = {isa = PBXFileReference; path = "a b.swift"; };"#;
        assert_eq!(
            kinds(text),
            vec![
                TokenKind::Bare,
                TokenKind::Comment,
                TokenKind::Equals,
                TokenKind::OpenBrace,
                TokenKind::Bare,
                TokenKind::Equals,
                TokenKind::Bare,
                TokenKind::Semicolon,
                TokenKind::Bare,
                TokenKind::Equals,
                TokenKind::Quoted,
                TokenKind::Semicolon,
                TokenKind::CloseBrace,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_bare_path_keeps_slashes() {
        let text = "path = Managers/ApplePlacesManager.swift;";
        let tokens = tokenize(text).unwrap();
        assert_eq!(&text[tokens[2].span.clone()], "Managers/ApplePlacesManager.swift");
    }

    #[test]
    fn test_unterminated_string_reports_position() {
        let err = tokenize("a = \"oops").unwrap_err();
        assert!(matches!(err, PatchError::Parse { line: 1, column: 5, .. }));
    }

    #[test]
    fn test_unquote_and_render() {
        assert_eq!(unquote(r#""say \"hi\"""#), "say \"hi\"");
        assert_eq!(render_scalar("Views/A.swift", false), "Views/A.swift");
        assert_eq!(render_scalar("Views/A.swift", true), "\"Views/A.swift\"");
        assert_eq!(render_scalar("My File.swift", false), "\"My File.swift\"");
        assert_eq!(render_scalar("<group>", false), "\"<group>\"");
    }

    #[test]
    fn test_comment_text() {
        assert_eq!(comment_text("/* Begin PBXGroup section */"), "Begin PBXGroup section");
        assert_eq!(comment_text("// !$*UTF8*$!"), "!$*UTF8*$!");
    }
}
