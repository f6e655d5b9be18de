//! IDL Lexer
//!
//! Tokenizes IDL source text. The same tokenizer feeds the lint rule file
//! parser.

use std::fmt;

use crate::error::{IdlError, Result, Span};

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Identifiers and literals
    Ident(String),
    Integer(i64),
    HexInteger(i64),
    Float(f64),
    StringLiteral(String),

    // Punctuation
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    LParen,    // (
    RParen,    // )
    LAngle,    // <
    RAngle,    // >
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
    Equals,    // =
    Minus,     // -
    Dot,       // .

    // End of file
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "identifier `{}`", s),
            Token::Integer(n) => write!(f, "integer {}", n),
            Token::HexInteger(n) => write!(f, "integer 0x{:X}", n),
            Token::Float(v) => write!(f, "number {}", v),
            Token::StringLiteral(s) => write!(f, "string \"{}\"", s),
            Token::LBrace => f.write_str("`{`"),
            Token::RBrace => f.write_str("`}`"),
            Token::LBracket => f.write_str("`[`"),
            Token::RBracket => f.write_str("`]`"),
            Token::LParen => f.write_str("`(`"),
            Token::RParen => f.write_str("`)`"),
            Token::LAngle => f.write_str("`<`"),
            Token::RAngle => f.write_str("`>`"),
            Token::Comma => f.write_str("`,`"),
            Token::Semicolon => f.write_str("`;`"),
            Token::Colon => f.write_str("`:`"),
            Token::Equals => f.write_str("`=`"),
            Token::Minus => f.write_str("`-`"),
            Token::Dot => f.write_str("`.`"),
            Token::Eof => f.write_str("end of file"),
        }
    }
}

/// Contextual keywords
///
/// The grammar reuses these words as ordinary names (a struct may have a
/// field called `cluster` or `endpoint`), so the lexer emits identifiers and
/// the parser decides from context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Access,
    Administer,
    Attribute,
    Binding,
    Bitmap,
    Callback,
    Client,
    Cluster,
    Command,
    Critical,
    Debug,
    Default,
    Deprecated,
    Device,
    Emits,
    Endpoint,
    Enum,
    Event,
    Fabric,
    FabricScoped,
    FabricSensitive,
    Handle,
    Info,
    Internal,
    Invoke,
    Manage,
    Nosubscribe,
    Nullable,
    Operate,
    Optional,
    Persist,
    Provisional,
    Ram,
    Read,
    Readonly,
    Request,
    Response,
    Revision,
    Server,
    Stable,
    Struct,
    Timed,
    Type,
    Version,
    View,
    Write,
}

impl Keyword {
    pub fn from_ident(s: &str) -> Option<Keyword> {
        match s {
            "access" => Some(Keyword::Access),
            "administer" => Some(Keyword::Administer),
            "attribute" => Some(Keyword::Attribute),
            "binding" => Some(Keyword::Binding),
            "bitmap" => Some(Keyword::Bitmap),
            "callback" => Some(Keyword::Callback),
            "client" => Some(Keyword::Client),
            "cluster" => Some(Keyword::Cluster),
            "command" => Some(Keyword::Command),
            "critical" => Some(Keyword::Critical),
            "debug" => Some(Keyword::Debug),
            "default" => Some(Keyword::Default),
            "deprecated" => Some(Keyword::Deprecated),
            "device" => Some(Keyword::Device),
            "emits" => Some(Keyword::Emits),
            "endpoint" => Some(Keyword::Endpoint),
            "enum" => Some(Keyword::Enum),
            "event" => Some(Keyword::Event),
            "fabric" => Some(Keyword::Fabric),
            "fabric_scoped" => Some(Keyword::FabricScoped),
            "fabric_sensitive" => Some(Keyword::FabricSensitive),
            "handle" => Some(Keyword::Handle),
            "info" => Some(Keyword::Info),
            "internal" => Some(Keyword::Internal),
            "invoke" => Some(Keyword::Invoke),
            "manage" => Some(Keyword::Manage),
            "nosubscribe" => Some(Keyword::Nosubscribe),
            "nullable" => Some(Keyword::Nullable),
            "operate" => Some(Keyword::Operate),
            "optional" => Some(Keyword::Optional),
            "persist" => Some(Keyword::Persist),
            "provisional" => Some(Keyword::Provisional),
            "ram" => Some(Keyword::Ram),
            "read" => Some(Keyword::Read),
            "readonly" => Some(Keyword::Readonly),
            "request" => Some(Keyword::Request),
            "response" => Some(Keyword::Response),
            "revision" => Some(Keyword::Revision),
            "server" => Some(Keyword::Server),
            "stable" => Some(Keyword::Stable),
            "struct" => Some(Keyword::Struct),
            "timed" => Some(Keyword::Timed),
            "type" => Some(Keyword::Type),
            "version" => Some(Keyword::Version),
            "view" => Some(Keyword::View),
            "write" => Some(Keyword::Write),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Access => "access",
            Keyword::Administer => "administer",
            Keyword::Attribute => "attribute",
            Keyword::Binding => "binding",
            Keyword::Bitmap => "bitmap",
            Keyword::Callback => "callback",
            Keyword::Client => "client",
            Keyword::Cluster => "cluster",
            Keyword::Command => "command",
            Keyword::Critical => "critical",
            Keyword::Debug => "debug",
            Keyword::Default => "default",
            Keyword::Deprecated => "deprecated",
            Keyword::Device => "device",
            Keyword::Emits => "emits",
            Keyword::Endpoint => "endpoint",
            Keyword::Enum => "enum",
            Keyword::Event => "event",
            Keyword::Fabric => "fabric",
            Keyword::FabricScoped => "fabric_scoped",
            Keyword::FabricSensitive => "fabric_sensitive",
            Keyword::Handle => "handle",
            Keyword::Info => "info",
            Keyword::Internal => "internal",
            Keyword::Invoke => "invoke",
            Keyword::Manage => "manage",
            Keyword::Nosubscribe => "nosubscribe",
            Keyword::Nullable => "nullable",
            Keyword::Operate => "operate",
            Keyword::Optional => "optional",
            Keyword::Persist => "persist",
            Keyword::Provisional => "provisional",
            Keyword::Ram => "ram",
            Keyword::Read => "read",
            Keyword::Readonly => "readonly",
            Keyword::Request => "request",
            Keyword::Response => "response",
            Keyword::Revision => "revision",
            Keyword::Server => "server",
            Keyword::Stable => "stable",
            Keyword::Struct => "struct",
            Keyword::Timed => "timed",
            Keyword::Type => "type",
            Keyword::Version => "version",
            Keyword::View => "view",
            Keyword::Write => "write",
        }
    }
}

/// A token with its source location
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
    /// Text of a `/** ... */` comment directly preceding the token
    pub doc: Option<String>,
}

/// Lexer state
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    file_name: &'a str,
    pending_doc: Option<String>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, file_name: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            file_name,
            pending_doc: None,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.token == Token::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn error(&self, position: usize, message: impl Into<String>) -> IdlError {
        IdlError::parse(self.file_name, self.input, position, message)
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<SpannedToken> {
        self.skip_whitespace_and_comments()?;

        let start = self.pos;
        let doc = self.pending_doc.take();

        if self.pos >= self.bytes.len() {
            return Ok(SpannedToken {
                token: Token::Eof,
                span: Span::at(self.pos),
                doc,
            });
        }

        let ch = self.bytes[self.pos];

        let token = match ch {
            b'{' => { self.pos += 1; Token::LBrace }
            b'}' => { self.pos += 1; Token::RBrace }
            b'[' => { self.pos += 1; Token::LBracket }
            b']' => { self.pos += 1; Token::RBracket }
            b'(' => { self.pos += 1; Token::LParen }
            b')' => { self.pos += 1; Token::RParen }
            b'<' => { self.pos += 1; Token::LAngle }
            b'>' => { self.pos += 1; Token::RAngle }
            b',' => { self.pos += 1; Token::Comma }
            b';' => { self.pos += 1; Token::Semicolon }
            b':' => { self.pos += 1; Token::Colon }
            b'=' => { self.pos += 1; Token::Equals }
            b'.' => { self.pos += 1; Token::Dot }
            // Negative numbers are handled by the parser
            b'-' => { self.pos += 1; Token::Minus }
            b'"' => self.lex_string()?,
            b'0'..=b'9' => self.lex_number(start)?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_ident(),
            _ => {
                let found = self.input[self.pos..].chars().next().unwrap_or('?');
                return Err(self.error(self.pos, format!("unexpected character `{}`", found)));
            }
        };

        Ok(SpannedToken {
            token,
            span: Span::new(start, self.pos),
            doc,
        })
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }

            if self.pos + 1 < self.bytes.len() && self.bytes[self.pos] == b'/' {
                match self.bytes[self.pos + 1] {
                    b'/' => {
                        self.pos += 2;
                        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                            self.pos += 1;
                        }
                        continue;
                    }
                    b'*' => {
                        let start = self.pos;
                        let is_doc = self.bytes.get(self.pos + 2) == Some(&b'*')
                            && self.bytes.get(self.pos + 3) != Some(&b'/');
                        self.pos += 2;
                        let body_start = self.pos;
                        loop {
                            if self.pos + 1 >= self.bytes.len() {
                                return Err(self.error(start, "unterminated block comment"));
                            }
                            if self.bytes[self.pos] == b'*' && self.bytes[self.pos + 1] == b'/' {
                                break;
                            }
                            self.pos += 1;
                        }
                        let body = &self.input[body_start..self.pos];
                        self.pos += 2;
                        self.pending_doc = if is_doc { Some(clean_doc_comment(body)) } else { None };
                        continue;
                    }
                    _ => {}
                }
            }

            return Ok(());
        }
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.pos;

        while self.pos < self.bytes.len() {
            let ch = self.bytes[self.pos];
            if ch.is_ascii_alphanumeric() || ch == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }

        Token::Ident(self.input[start..self.pos].to_string())
    }

    fn lex_number(&mut self, start: usize) -> Result<Token> {
        if self.pos + 1 < self.bytes.len()
            && self.bytes[self.pos] == b'0'
            && (self.bytes[self.pos + 1] == b'x' || self.bytes[self.pos + 1] == b'X')
        {
            self.pos += 2;
            let hex_start = self.pos;
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_hexdigit() {
                self.pos += 1;
            }
            let hex_str = &self.input[hex_start..self.pos];
            let value = i64::from_str_radix(hex_str, 16)
                .map_err(|_| self.error(start, "invalid hex number"))?;
            return Ok(Token::HexInteger(value));
        }

        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }

        if self.pos + 1 < self.bytes.len()
            && self.bytes[self.pos] == b'.'
            && self.bytes[self.pos + 1].is_ascii_digit()
        {
            self.pos += 1;
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
            let value: f64 = self.input[start..self.pos]
                .parse()
                .map_err(|_| self.error(start, "invalid float"))?;
            return Ok(Token::Float(value));
        }

        let value: i64 = self.input[start..self.pos]
            .parse()
            .map_err(|_| self.error(start, "invalid integer"))?;
        Ok(Token::Integer(value))
    }

    fn lex_string(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;

        let input = self.input;
        let mut s = String::new();
        let mut chars = input[self.pos..].char_indices();
        loop {
            let Some((offset, ch)) = chars.next() else {
                return Err(self.error(start, "unterminated string"));
            };
            match ch {
                '"' => {
                    self.pos += offset + 1;
                    break;
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => s.push('\n'),
                    Some((_, 'r')) => s.push('\r'),
                    Some((_, 't')) => s.push('\t'),
                    Some((_, '\\')) => s.push('\\'),
                    Some((_, '"')) => s.push('"'),
                    Some((_, other)) => {
                        s.push('\\');
                        s.push(other);
                    }
                    None => return Err(self.error(start, "unterminated string")),
                },
                '\n' => return Err(self.error(start, "newline in string literal")),
                other => s.push(other),
            }
        }

        Ok(Token::StringLiteral(s))
    }
}

/// Strip the leading `*` decoration of a doc comment and join its lines
fn clean_doc_comment(body: &str) -> String {
    body.trim_start_matches('*')
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
