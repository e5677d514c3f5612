//! Structural scan of TSX source.
//!
//! This is not a TypeScript parser. It walks the text in two modes: script
//! mode skips strings, template literals, comments and regex literals, and
//! JSX mode records every element with its byte spans and attributes. A `<`
//! in script mode opens JSX only where an expression may start, so generic
//! type arguments such as `useState<string>` and comparisons are left alone.

use std::ops::Range;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("JSX scan error at byte {offset}: {message}")]
pub struct ScanError {
    pub offset: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsxElement {
    /// Tag name; empty for fragments.
    pub tag: String,
    /// Whole element, from `<` to the end of the closing tag or `/>`.
    pub span: Range<usize>,
    /// Opening tag only.
    pub open_tag: Range<usize>,
    /// Byte right after the tag name.
    pub name_end: usize,
    pub attributes: Vec<JsxAttribute>,
    pub self_closing: bool,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsxAttribute {
    pub name: String,
    /// From the first byte of the name to the end of the value.
    pub span: Range<usize>,
    pub value: Option<AttrValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// `"..."` or `'...'`, unquoted.
    Literal(String),
    /// `{...}`. `literal` is set when the braces hold a lone string literal.
    Expression {
        source: String,
        literal: Option<String>,
    },
}

impl AttrValue {
    /// The string value, if it is known statically.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            AttrValue::Literal(s) => Some(s),
            AttrValue::Expression { literal, .. } => literal.as_deref(),
        }
    }
}

/// Elements of a source file in document pre-order.
#[derive(Debug, Clone)]
pub struct JsxDocument<'s> {
    source: &'s str,
    elements: Vec<JsxElement>,
}

impl<'s> JsxDocument<'s> {
    pub fn parse(source: &'s str) -> Result<Self, ScanError> {
        let mut scanner = Scanner {
            src: source,
            bytes: source.as_bytes(),
            pos: 0,
            elements: Vec::new(),
        };
        scanner.scan_script(None, None)?;
        Ok(Self {
            source,
            elements: scanner.elements,
        })
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn elements(&self) -> &[JsxElement] {
        &self.elements
    }

    pub fn element(&self, index: usize) -> &JsxElement {
        &self.elements[index]
    }

    /// Source text of an element.
    pub fn text(&self, index: usize) -> &'s str {
        &self.source[self.elements[index].span.clone()]
    }

    pub fn attribute(&self, index: usize, name: &str) -> Option<&JsxAttribute> {
        self.elements[index]
            .attributes
            .iter()
            .find(|a| a.name == name)
    }

    /// Where a new attribute goes: after the last attribute, or after the tag name.
    pub fn attribute_insert_point(&self, index: usize) -> usize {
        let element = &self.elements[index];
        element
            .attributes
            .last()
            .map(|a| a.span.end)
            .unwrap_or(element.name_end)
    }

    /// First element in pre-order whose text contains `locator`, narrowed to
    /// the innermost descendant that still contains it.
    pub fn first_match(&self, locator: &str) -> Option<usize> {
        let mut found = (0..self.elements.len()).find(|&i| self.text(i).contains(locator))?;
        while let Some(child) = self.elements[found]
            .children
            .iter()
            .copied()
            .find(|&c| self.text(c).contains(locator))
        {
            found = child;
        }
        Some(found)
    }
}

/// A JSX attribute value for `value`: `"..."` when the text needs no escaping,
/// otherwise a braced JS string literal.
pub fn string_literal(value: &str) -> String {
    let plain = !value
        .chars()
        .any(|c| matches!(c, '"' | '\\' | '{' | '}' | '&' | '\n' | '\r') || c.is_control());
    if plain {
        format!("\"{}\"", value)
    } else {
        let json = serde_json::Value::String(value.to_string()).to_string();
        format!("{{{}}}", json)
    }
}

const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "yield", "await", "default", "case", "else", "do", "typeof", "void", "in", "of",
    "new", "throw", "delete",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Punct,
    Keyword,
    Value,
}

impl Prev {
    fn expression_may_start(self) -> bool {
        !matches!(self, Prev::Value)
    }
}

struct Scanner<'s> {
    src: &'s str,
    bytes: &'s [u8],
    pos: usize,
    elements: Vec<JsxElement>,
}

impl Scanner<'_> {
    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn error(&self, message: impl Into<String>) -> ScanError {
        ScanError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(0), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn opens_jsx(&self) -> bool {
        matches!(self.peek(1), Some(b) if b.is_ascii_alphabetic() || b == b'>')
    }

    // ─── Script mode ─────────────────────────────────────────────────────────

    /// Scan script until an unmatched `close` byte (consumed), or to the end
    /// of input when `close` is `None`.
    fn scan_script(&mut self, close: Option<u8>, parent: Option<usize>) -> Result<(), ScanError> {
        let mut open: Vec<u8> = Vec::new();
        let mut prev = Prev::Start;

        while let Some(b) = self.peek(0) {
            match b {
                b'"' | b'\'' => {
                    self.skip_string(b)?;
                    prev = Prev::Value;
                }
                b'`' => {
                    self.skip_template(parent)?;
                    prev = Prev::Value;
                }
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                b'/' if prev.expression_may_start() => {
                    self.skip_regex()?;
                    prev = Prev::Value;
                }
                b'<' if prev.expression_may_start() && self.opens_jsx() => {
                    self.parse_element(parent)?;
                    prev = Prev::Value;
                }
                b'(' | b'[' | b'{' => {
                    open.push(match b {
                        b'(' => b')',
                        b'[' => b']',
                        _ => b'}',
                    });
                    self.pos += 1;
                    prev = Prev::Punct;
                }
                b')' | b']' | b'}' => {
                    match open.pop() {
                        Some(expected) if expected == b => {}
                        Some(_) => return Err(self.error("mismatched bracket")),
                        None if close == Some(b) => {
                            self.pos += 1;
                            return Ok(());
                        }
                        None => return Err(self.error("unbalanced closing bracket")),
                    }
                    self.pos += 1;
                    prev = if b == b'}' { Prev::Punct } else { Prev::Value };
                }
                b if b.is_ascii_whitespace() => self.pos += 1,
                b if is_ident_byte(b) => {
                    let start = self.pos;
                    while matches!(self.peek(0), Some(b) if is_ident_byte(b)) {
                        self.pos += 1;
                    }
                    let word = &self.src[start..self.pos];
                    prev = if EXPRESSION_KEYWORDS.contains(&word) {
                        Prev::Keyword
                    } else {
                        Prev::Value
                    };
                }
                _ => {
                    self.pos += 1;
                    prev = Prev::Punct;
                }
            }
        }

        match close {
            Some(c) => Err(self.error(format!("expected '{}' before end of input", c as char))),
            None if !open.is_empty() => Err(self.error("unclosed bracket at end of input")),
            None => Ok(()),
        }
    }

    fn skip_string(&mut self, quote: u8) -> Result<(), ScanError> {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => self.pos += 2,
                b'\n' => break,
                b if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        self.pos = start;
        Err(self.error("unterminated string literal"))
    }

    fn skip_template(&mut self, parent: Option<usize>) -> Result<(), ScanError> {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    return Ok(());
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.scan_script(Some(b'}'), parent)?;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = start;
        Err(self.error("unterminated template literal"))
    }

    fn skip_line_comment(&mut self) {
        while let Some(b) = self.peek(0) {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), ScanError> {
        match self.src[self.pos + 2..].find("*/") {
            Some(end) => {
                self.pos += 2 + end + 2;
                Ok(())
            }
            None => Err(self.error("unterminated block comment")),
        }
    }

    fn skip_regex(&mut self) -> Result<(), ScanError> {
        let start = self.pos;
        self.pos += 1;
        let mut in_class = false;
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => self.pos += 2,
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    while matches!(self.peek(0), Some(b) if b.is_ascii_alphabetic()) {
                        self.pos += 1;
                    }
                    return Ok(());
                }
                b'\n' => break,
                _ => self.pos += 1,
            }
        }
        self.pos = start;
        Err(self.error("unterminated regular expression"))
    }

    // ─── JSX mode ────────────────────────────────────────────────────────────

    fn parse_element(&mut self, parent: Option<usize>) -> Result<usize, ScanError> {
        let start = self.pos;
        self.pos += 1;
        while matches!(self.peek(0), Some(b) if is_tag_byte(b)) {
            self.pos += 1;
        }
        let name_end = self.pos;
        let index = self.elements.len();
        self.elements.push(JsxElement {
            tag: self.src[start + 1..name_end].to_string(),
            span: start..start,
            open_tag: start..start,
            name_end,
            attributes: Vec::new(),
            self_closing: false,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.elements[p].children.push(index);
        }

        let mut attributes = Vec::new();
        let self_closing = loop {
            self.skip_ws();
            match self.peek(0) {
                None => return Err(self.error("unterminated opening tag")),
                Some(b'/') if self.peek(1) == Some(b'>') => {
                    self.pos += 2;
                    break true;
                }
                Some(b'>') => {
                    self.pos += 1;
                    break false;
                }
                Some(b'{') => {
                    self.pos += 1;
                    self.scan_script(Some(b'}'), Some(index))?;
                }
                Some(b) if is_attr_byte(b) => attributes.push(self.parse_attribute(index)?),
                Some(_) => return Err(self.error("unexpected character in tag")),
            }
        };
        let open_end = self.pos;

        if !self_closing {
            self.parse_children(index)?;
        }

        let element = &mut self.elements[index];
        element.span = start..self.pos;
        element.open_tag = start..open_end;
        element.attributes = attributes;
        element.self_closing = self_closing;
        Ok(index)
    }

    fn parse_attribute(&mut self, owner: usize) -> Result<JsxAttribute, ScanError> {
        let start = self.pos;
        while matches!(self.peek(0), Some(b) if is_attr_byte(b)) {
            self.pos += 1;
        }
        let name = self.src[start..self.pos].to_string();
        let name_end = self.pos;

        self.skip_ws();
        if self.peek(0) != Some(b'=') {
            self.pos = name_end;
            return Ok(JsxAttribute {
                name,
                span: start..name_end,
                value: None,
            });
        }
        self.pos += 1;
        self.skip_ws();

        let value = match self.peek(0) {
            Some(q @ (b'"' | b'\'')) => {
                let value_start = self.pos + 1;
                let len = self.bytes[value_start..]
                    .iter()
                    .position(|&b| b == q)
                    .ok_or_else(|| self.error("unterminated attribute string"))?;
                self.pos = value_start + len + 1;
                AttrValue::Literal(self.src[value_start..value_start + len].to_string())
            }
            Some(b'{') => {
                let expr_start = self.pos;
                self.pos += 1;
                self.scan_script(Some(b'}'), Some(owner))?;
                let inner = &self.src[expr_start + 1..self.pos - 1];
                AttrValue::Expression {
                    source: self.src[expr_start..self.pos].to_string(),
                    literal: lone_string_literal(inner),
                }
            }
            _ => return Err(self.error(format!("unsupported value for attribute '{}'", name))),
        };

        Ok(JsxAttribute {
            name,
            span: start..self.pos,
            value: Some(value),
        })
    }

    fn parse_children(&mut self, index: usize) -> Result<(), ScanError> {
        loop {
            match self.peek(0) {
                None => {
                    let tag = &self.elements[index].tag;
                    return Err(self.error(format!("unclosed element <{}>", tag)));
                }
                Some(b'<') if self.peek(1) == Some(b'/') => {
                    let close = self.src[self.pos..]
                        .find('>')
                        .ok_or_else(|| self.error("unterminated closing tag"))?;
                    let name = self.src[self.pos + 2..self.pos + close].trim();
                    if name != self.elements[index].tag {
                        return Err(self.error(format!(
                            "closing tag </{}> does not match <{}>",
                            name, self.elements[index].tag
                        )));
                    }
                    self.pos += close + 1;
                    return Ok(());
                }
                Some(b'<') if self.opens_jsx() => {
                    self.parse_element(Some(index))?;
                }
                Some(b'{') => {
                    self.pos += 1;
                    self.scan_script(Some(b'}'), Some(index))?;
                }
                Some(_) => self.pos += 1,
            }
        }
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_tag_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'.' | b':' | b'-')
}

fn is_attr_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b':' | b'-')
}

/// The value of `expr` when it is nothing but one string literal.
fn lone_string_literal(expr: &str) -> Option<String> {
    let expr = expr.trim();
    if expr.len() < 2 {
        return None;
    }
    let (first, last) = (expr.as_bytes()[0], expr.as_bytes()[expr.len() - 1]);
    if first != last || !matches!(first, b'"' | b'\'' | b'`') {
        return None;
    }
    let inner = &expr[1..expr.len() - 1];
    match first {
        b'"' => serde_json::from_str::<String>(expr).ok(),
        b'\'' if !inner.contains(['\'', '\\']) => Some(inner.to_string()),
        b'`' if !inner.contains(['`', '\\']) && !inner.contains("${") => Some(inner.to_string()),
        _ => None,
    }
}
