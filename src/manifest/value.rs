// src/manifest/value.rs - Parsed property list values with byte spans

use std::ops::Range;

/// A bare or quoted string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    /// Decoded text (quotes and escapes removed)
    pub text: String,
    /// Whether the source token was quoted
    pub quoted: bool,
    /// Byte span of the raw token, quotes included
    pub span: Range<usize>,
}

/// One entry of a `( ... )` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub value: Value,
    /// Trailing `/* ... */` annotation, if any
    pub comment: Option<String>,
    /// From the first byte of the value through its trailing comma
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub items: Vec<ListItem>,
    /// Offset of `(`
    pub open: usize,
    /// Offset of `)`
    pub close: usize,
}

impl List {
    /// Scalar entries of the list, in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| item.value.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids().any(|candidate| candidate == id)
    }
}

/// `key /* comment */ = value /* comment */;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: Scalar,
    pub key_comment: Option<String>,
    pub value: Value,
    pub value_comment: Option<String>,
    /// From the first byte of the key through the terminating `;`
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dict {
    pub fields: Vec<Field>,
    /// Offset of `{`
    pub open: usize,
    /// Offset of `}`
    pub close: usize,
}

impl Dict {
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key.text == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(Scalar),
    List(List),
    Dict(Dict),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(&s.text),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Byte span of the whole value.
    pub fn span(&self) -> Range<usize> {
        match self {
            Value::Scalar(s) => s.span.clone(),
            Value::List(l) => l.open..l.close + 1,
            Value::Dict(d) => d.open..d.close + 1,
        }
    }
}
