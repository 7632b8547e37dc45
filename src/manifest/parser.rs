// src/manifest/parser.rs - Recursive descent over the token stream
//
// document := dict
// dict     := '{' { field } '}'
// field    := string [comment] '=' value [comment] ';'
// value    := string | list | dict
// list     := '(' { value [comment] [','] } ')'

use super::lexer::{comment_text, error_at, unquote, Token, TokenKind};
use super::value::{Dict, Field, List, ListItem, Scalar, Value};
use crate::error::Result;

pub(crate) struct Parser<'t> {
    text: &'t str,
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    pub fn new(text: &'t str, tokens: &'t [Token]) -> Self {
        Self {
            text,
            tokens,
            pos: 0,
        }
    }

    pub fn parse_document(mut self) -> Result<Dict> {
        self.skip_comments();
        let root = self.parse_dict()?;
        self.skip_comments();
        if let Some(extra) = self.tokens.get(self.pos) {
            return Err(error_at(
                self.text,
                extra.span.start,
                "unexpected content after the root dictionary",
            ));
        }
        Ok(root)
    }

    /// Consume consecutive comments, returning the last one's text and end.
    fn skip_comments(&mut self) -> Option<(String, usize)> {
        let mut last = None;
        while let Some(token) = self.tokens.get(self.pos) {
            if token.kind != TokenKind::Comment {
                break;
            }
            let raw = &self.text[token.span.clone()];
            last = Some((comment_text(raw).to_string(), token.span.end));
            self.pos += 1;
        }
        last
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<&'t Token> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            Some(token) => Err(error_at(
                self.text,
                token.span.start,
                format!("expected {what}"),
            )),
            None => Err(error_at(
                self.text,
                self.text.len(),
                format!("expected {what}, found end of input"),
            )),
        }
    }

    fn parse_dict(&mut self) -> Result<Dict> {
        let open = self.expect(TokenKind::OpenBrace, "'{'")?.span.start;
        let mut fields = Vec::new();
        loop {
            self.skip_comments();
            match self.peek() {
                Some(token) if token.kind == TokenKind::CloseBrace => {
                    self.pos += 1;
                    return Ok(Dict {
                        fields,
                        open,
                        close: token.span.start,
                    });
                }
                Some(_) => fields.push(self.parse_field()?),
                None => {
                    return Err(error_at(self.text, open, "unclosed '{'"));
                }
            }
        }
    }

    fn parse_field(&mut self) -> Result<Field> {
        let key = self.parse_scalar("a key")?;
        let key_comment = self.skip_comments().map(|(text, _)| text);
        self.expect(TokenKind::Equals, "'='")?;
        self.skip_comments();
        let value = self.parse_value()?;
        let value_comment = self.skip_comments().map(|(text, _)| text);
        let semicolon = self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Field {
            span: key.span.start..semicolon.span.end,
            key,
            key_comment,
            value,
            value_comment,
        })
    }

    fn parse_value(&mut self) -> Result<Value> {
        match self.peek().map(|t| t.kind) {
            Some(TokenKind::OpenBrace) => Ok(Value::Dict(self.parse_dict()?)),
            Some(TokenKind::OpenParen) => Ok(Value::List(self.parse_list()?)),
            _ => Ok(Value::Scalar(self.parse_scalar("a value")?)),
        }
    }

    fn parse_list(&mut self) -> Result<List> {
        let open = self.expect(TokenKind::OpenParen, "'('")?.span.start;
        let mut items = Vec::new();
        loop {
            self.skip_comments();
            match self.peek() {
                Some(token) if token.kind == TokenKind::CloseParen => {
                    self.pos += 1;
                    return Ok(List {
                        items,
                        open,
                        close: token.span.start,
                    });
                }
                Some(_) => {}
                None => return Err(error_at(self.text, open, "unclosed '('")),
            }

            let value = self.parse_value()?;
            let start = value.span().start;
            let mut end = value.span().end;
            let comment = self.skip_comments().map(|(text, comment_end)| {
                end = comment_end;
                text
            });
            match self.peek() {
                Some(token) if token.kind == TokenKind::Comma => {
                    end = token.span.end;
                    self.pos += 1;
                }
                Some(token) if token.kind == TokenKind::CloseParen => {}
                Some(token) => {
                    return Err(error_at(
                        self.text,
                        token.span.start,
                        "expected ',' or ')'",
                    ))
                }
                None => return Err(error_at(self.text, open, "unclosed '('")),
            }
            items.push(ListItem {
                value,
                comment,
                span: start..end,
            });
        }
    }

    fn parse_scalar(&mut self, what: &str) -> Result<Scalar> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Quoted => {
                self.pos += 1;
                Ok(Scalar {
                    text: unquote(&self.text[token.span.clone()]),
                    quoted: true,
                    span: token.span.clone(),
                })
            }
            Some(token) if token.kind == TokenKind::Bare => {
                self.pos += 1;
                Ok(Scalar {
                    text: self.text[token.span.clone()].to_string(),
                    quoted: false,
                    span: token.span.clone(),
                })
            }
            Some(token) => Err(error_at(
                self.text,
                token.span.start,
                format!("expected {what}"),
            )),
            None => Err(error_at(
                self.text,
                self.text.len(),
                format!("expected {what}, found end of input"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;
    use crate::error::PatchError;

    fn parse(text: &str) -> Result<Dict> {
        let tokens = tokenize(text)?;
        Parser::new(text, &tokens).parse_document()
    }

    #[test]
    fn test_parse_nested_values() {
        let text = "// !$*UTF8*$!\n{\n\ta = 1;\n\tb = (\n\t\tX /* x */,\n\t\tY,\n\t);\n\tc = {d = \"e f\"; };\n}\n";
        let root = parse(text).unwrap();

        assert_eq!(root.get("a").unwrap().value.as_str(), Some("1"));

        let list = root.get("b").unwrap().value.as_list().unwrap();
        assert_eq!(list.ids().collect::<Vec<_>>(), vec!["X", "Y"]);
        assert_eq!(list.items[0].comment.as_deref(), Some("x"));
        assert_eq!(&text[list.items[0].span.clone()], "X /* x */,");
        assert_eq!(&text[list.close..list.close + 1], ")");

        let inner = root.get("c").unwrap().value.as_dict().unwrap();
        let d = inner.get("d").unwrap().value.as_scalar().unwrap();
        assert_eq!(d.text, "e f");
        assert!(d.quoted);
    }

    #[test]
    fn test_field_span_covers_semicolon() {
        let text = "{ isa = PBXGroup; }";
        let root = parse(text).unwrap();
        let field = root.get("isa").unwrap();
        assert_eq!(&text[field.span.clone()], "isa = PBXGroup;");
    }

    #[test]
    fn test_missing_semicolon_is_an_error() {
        let err = parse("{\n\ta = 1\n}").unwrap_err();
        assert!(matches!(err, PatchError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_unclosed_list_is_an_error() {
        assert!(parse("{ a = ( X, ").is_err());
    }
}
