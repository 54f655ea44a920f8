//! Reader for emitted type declarations
//!
//! Parses the subset of TypeScript the emitter writes (`interface` and
//! `type` aliases over primitives, literals, arrays, `Record`, inline
//! objects, and unions) back into a [`TypeGraph`]. Anything else, such as
//! `declare function` or `export default`, is skipped statement by
//! statement. Interfaces with method members are client surfaces, not data
//! types, and are skipped too.

use clientgen_common::{Field, GeneratorError, Primitive, Result, TypeGraph, TypeId, TypeKind};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(serde_json::Number),
    Punct(char),
    Arrow,
}

/// Parsed type expression, before it is placed in the graph
#[derive(Debug, Clone, PartialEq)]
enum TsType {
    Primitive(Primitive),
    Unknown,
    Literal(Value),
    Ref(String),
    Array(Box<TsType>),
    Record(Box<TsType>),
    Object(Vec<TsField>),
    Union(Vec<TsType>),
    Group(Box<TsType>),
}

#[derive(Debug, Clone, PartialEq)]
struct TsField {
    name: String,
    ty: TsType,
    required: bool,
}

/// Parse declaration text into a type graph
///
/// # Example
/// ```
/// use clientgen_generator::parse_declarations;
///
/// let graph = parse_declarations("export interface Movie { id: number; sequel?: Movie }").unwrap();
/// assert!(graph.lookup("Movie").is_some());
/// ```
pub fn parse_declarations(text: &str) -> Result<TypeGraph> {
    let mut parser = DeclarationParser {
        tokens: tokenize(text)?,
        pos: 0,
        graph: TypeGraph::new(),
    };
    parser.parse_all()?;
    Ok(parser.graph)
}

fn syntax_error(message: impl Into<String>) -> GeneratorError {
    GeneratorError::Generation(format!("declaration syntax: {}", message.into()))
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            i += 1;
        } else if c == '/' && next == Some('/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '/' && next == Some('*') {
            let start = i;
            i += 2;
            loop {
                if i + 1 >= chars.len() {
                    return Err(syntax_error(format!("unterminated comment at {}", start)));
                }
                if chars[i] == '*' && chars[i + 1] == '/' {
                    i += 2;
                    break;
                }
                i += 1;
            }
        } else if c == '"' || c == '\'' {
            let (value, end) = string_literal(&chars, i)?;
            tokens.push(Token::Str(value));
            i = end;
        } else if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || matches!(chars[i], '.' | '+' | '-')) {
                i += 1;
            }
            let raw: String = chars[start..i].iter().collect();
            let number = serde_json::from_str::<serde_json::Number>(&raw)
                .map_err(|_| syntax_error(format!("bad number literal {}", raw)))?;
            tokens.push(Token::Num(number));
        } else if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else if c == '=' && next == Some('>') {
            tokens.push(Token::Arrow);
            i += 2;
        } else if "{}()[]<>,;:?|=&.*".contains(c) {
            tokens.push(Token::Punct(c));
            i += 1;
        } else {
            return Err(syntax_error(format!("unexpected character {:?}", c)));
        }
    }
    Ok(tokens)
}

/// Decode a quoted string starting at `start`; returns the value and the
/// index after the closing quote
fn string_literal(chars: &[char], start: usize) -> Result<(String, usize)> {
    let quote = chars[start];
    let mut i = start + 1;
    let mut raw = String::new();
    while i < chars.len() && chars[i] != quote {
        if chars[i] == '\\' && i + 1 < chars.len() {
            raw.push(chars[i]);
            i += 1;
        }
        raw.push(chars[i]);
        i += 1;
    }
    if i >= chars.len() {
        return Err(syntax_error("unterminated string literal"));
    }

    let json = if quote == '"' {
        format!("\"{}\"", raw)
    } else {
        format!("\"{}\"", raw.replace("\\'", "'").replace('"', "\\\""))
    };
    let value = serde_json::from_str::<String>(&json)
        .map_err(|e| syntax_error(format!("bad string literal: {}", e)))?;
    Ok((value, i + 1))
}

struct DeclarationParser {
    tokens: Vec<Token>,
    pos: usize,
    graph: TypeGraph,
}

impl DeclarationParser {
    fn parse_all(&mut self) -> Result<()> {
        while self.peek().is_some() {
            if self.eat_ident("export") && self.eat_ident("default") {
                self.skip_statement();
                continue;
            }
            if self.is_ident(0, "interface") && matches!(self.peek_at(1), Some(Token::Ident(_))) {
                self.pos += 1;
                let name = self.expect_ident()?;
                self.parse_interface(name)?;
            } else if self.is_ident(0, "type") && matches!(self.peek_at(1), Some(Token::Ident(_))) {
                self.pos += 1;
                let name = self.expect_ident()?;
                self.expect(Token::Punct('='))?;
                let ty = self.parse_type()?;
                self.eat(&Token::Punct(';'));
                self.define(&name, ty);
            } else {
                self.skip_statement();
            }
        }
        Ok(())
    }

    fn parse_interface(&mut self, name: String) -> Result<()> {
        if self.eat_ident("extends") {
            while !matches!(self.peek(), Some(Token::Punct('{')) | None) {
                self.pos += 1;
            }
        }
        self.expect(Token::Punct('{'))?;
        match self.members()? {
            Some(fields) => self.define(&name, TsType::Object(fields)),
            None => {
                tracing::debug!(interface = %name, "skipping interface with methods");
            }
        }
        Ok(())
    }

    /// Members up to and including the closing `}`; `None` if any member is a method
    fn members(&mut self) -> Result<Option<Vec<TsField>>> {
        let mut fields = Vec::new();
        let mut has_method = false;

        loop {
            if self.eat(&Token::Punct('}')) {
                break;
            }
            let name = match self.advance() {
                Some(Token::Ident(name)) | Some(Token::Str(name)) => name,
                other => return Err(syntax_error(format!("expected member name, got {:?}", other))),
            };
            let optional = self.eat(&Token::Punct('?'));
            if matches!(self.peek(), Some(Token::Punct('('))) {
                has_method = true;
                self.skip_member();
                continue;
            }
            self.expect(Token::Punct(':'))?;
            let ty = self.parse_type()?;
            fields.push(TsField {
                name,
                ty,
                required: !optional,
            });
            if !self.eat(&Token::Punct(';')) {
                self.eat(&Token::Punct(','));
            }
        }

        Ok(if has_method { None } else { Some(fields) })
    }

    fn parse_type(&mut self) -> Result<TsType> {
        self.eat(&Token::Punct('|'));
        let first = self.parse_postfix()?;
        if !matches!(self.peek(), Some(Token::Punct('|'))) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat(&Token::Punct('|')) {
            members.push(self.parse_postfix()?);
        }
        Ok(TsType::Union(members))
    }

    fn parse_postfix(&mut self) -> Result<TsType> {
        let mut ty = self.parse_primary()?;
        while matches!(self.peek(), Some(Token::Punct('[')))
            && matches!(self.peek_at(1), Some(Token::Punct(']')))
        {
            self.pos += 2;
            ty = TsType::Array(Box::new(ty));
        }
        Ok(ty)
    }

    fn parse_primary(&mut self) -> Result<TsType> {
        match self.advance() {
            Some(Token::Punct('(')) => {
                let inner = self.parse_type()?;
                self.expect(Token::Punct(')'))?;
                Ok(TsType::Group(Box::new(inner)))
            }
            Some(Token::Punct('{')) => match self.members()? {
                Some(fields) => Ok(TsType::Object(fields)),
                None => Ok(TsType::Unknown),
            },
            Some(Token::Str(value)) => Ok(TsType::Literal(Value::String(value))),
            Some(Token::Num(number)) => Ok(TsType::Literal(Value::Number(number))),
            Some(Token::Ident(ident)) => self.named_type(ident),
            other => Err(syntax_error(format!("expected a type, got {:?}", other))),
        }
    }

    fn named_type(&mut self, ident: String) -> Result<TsType> {
        let ty = match ident.as_str() {
            "string" => TsType::Primitive(Primitive::String),
            "number" => TsType::Primitive(Primitive::Number),
            "boolean" => TsType::Primitive(Primitive::Boolean),
            "null" => TsType::Primitive(Primitive::Null),
            "true" => TsType::Literal(Value::Bool(true)),
            "false" => TsType::Literal(Value::Bool(false)),
            "unknown" | "any" | "undefined" | "void" | "never" | "object" => TsType::Unknown,
            "Record" if self.eat(&Token::Punct('<')) => {
                self.parse_type()?;
                self.expect(Token::Punct(','))?;
                let value = self.parse_type()?;
                self.expect(Token::Punct('>'))?;
                TsType::Record(Box::new(value))
            }
            "Array" if self.eat(&Token::Punct('<')) => {
                let item = self.parse_type()?;
                self.expect(Token::Punct('>'))?;
                TsType::Array(Box::new(item))
            }
            _ => {
                if self.eat(&Token::Punct('<')) {
                    // generic arguments of unknown types carry no shape
                    self.skip_until_closing('<', '>');
                }
                TsType::Ref(ident)
            }
        };
        Ok(ty)
    }

    /// Bind a declared name to a parsed type
    fn define(&mut self, name: &str, ty: TsType) {
        let id = self.graph.reserve_named(name);
        let target = self.lower(&ty);
        let kind = if self.graph.name_of(target).is_some() {
            TypeKind::Union(vec![target])
        } else {
            self.graph.kind(target).clone()
        };
        self.graph.set_kind(id, kind);
    }

    fn lower(&mut self, ty: &TsType) -> TypeId {
        match ty {
            TsType::Primitive(p) => self.graph.primitive(*p),
            TsType::Unknown => self.graph.unknown(),
            TsType::Literal(value) => self.graph.add(TypeKind::Enum(vec![value.clone()])),
            TsType::Ref(name) => self.graph.reserve_named(name.as_str()),
            TsType::Array(item) => {
                let item = self.lower(item);
                self.graph.add(TypeKind::Array(item))
            }
            TsType::Record(value) => {
                let value = self.lower(value);
                self.graph.add(TypeKind::Map(value))
            }
            TsType::Object(fields) => {
                let fields = fields
                    .iter()
                    .map(|f| Field::new(f.name.clone(), self.lower(&f.ty), f.required))
                    .collect();
                self.graph.add(TypeKind::Object(fields))
            }
            TsType::Group(inner) => self.lower(inner),
            TsType::Union(members) => match enum_values(members) {
                Some(values) => self.graph.add(TypeKind::Enum(values)),
                None => {
                    let ids = members.iter().map(|m| self.lower(m)).collect();
                    self.graph.add(TypeKind::Union(ids))
                }
            },
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn is_ident(&self, offset: usize, word: &str) -> bool {
        matches!(self.peek_at(offset), Some(Token::Ident(ident)) if ident == word)
    }

    fn eat_ident(&mut self, word: &str) -> bool {
        if self.is_ident(0, word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(syntax_error(format!(
                "expected {:?}, got {:?}",
                token,
                self.peek()
            )))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.advance() {
            Some(Token::Ident(ident)) => Ok(ident),
            other => Err(syntax_error(format!("expected identifier, got {:?}", other))),
        }
    }

    /// Skip to the `;` ending the current statement, or past the block it opens
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.advance() {
            match token {
                Token::Punct('{') | Token::Punct('(') | Token::Punct('[') => depth += 1,
                Token::Punct('}') | Token::Punct(')') | Token::Punct(']') => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 && token == Token::Punct('}') && !self.continues_expression() {
                        return;
                    }
                }
                Token::Punct(';') if depth == 0 => return,
                _ => {}
            }
        }
    }

    /// Whether the token after a closing brace keeps the statement going
    fn continues_expression(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Punct(';' | ')' | ',' | '|' | '&' | '[' | '.' | '>')) | Some(Token::Arrow)
        )
    }

    /// Skip a method member, leaving a closing `}` of the interface in place
    fn skip_member(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek().cloned() {
            match token {
                Token::Punct('{') | Token::Punct('(') | Token::Punct('[') | Token::Punct('<') => {
                    depth += 1
                }
                Token::Punct('}') if depth == 0 => return,
                Token::Punct('}') | Token::Punct(')') | Token::Punct(']') | Token::Punct('>') => {
                    depth = depth.saturating_sub(1)
                }
                Token::Punct(';') | Token::Punct(',') if depth == 0 => {
                    self.pos += 1;
                    return;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn skip_until_closing(&mut self, open: char, close: char) {
        let mut depth = 1usize;
        while let Some(token) = self.advance() {
            if token == Token::Punct(open) {
                depth += 1;
            } else if token == Token::Punct(close) {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }
}

/// Values of a union written entirely as literals (plus `null`)
fn enum_values(members: &[TsType]) -> Option<Vec<Value>> {
    let mut values = Vec::with_capacity(members.len());
    let mut literals = 0;
    for member in members {
        match member {
            TsType::Literal(value) => {
                literals += 1;
                values.push(value.clone());
            }
            TsType::Primitive(Primitive::Null) => values.push(Value::Null),
            _ => return None,
        }
    }
    (literals > 0).then_some(values)
}
