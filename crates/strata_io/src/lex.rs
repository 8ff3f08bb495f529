//! Shared byte-slice tokenizer for the file-format readers.
//!
//! LEF, DEF, Liberty and structural Verilog all tokenize into the same four
//! shapes: identifiers, numbers, quoted strings and single punctuation
//! characters. The languages differ only in their comment syntax and in
//! which characters count as punctuation, so the tokenizer takes a small
//! [`LexConfig`] and the parsers share one [`Cursor`] over the result.

use strata_common::ParseError;

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Ident,
    /// Numeric literal (sign included when the config allows it).
    Number,
    /// Double-quoted string, quotes stripped.
    Str,
    /// One punctuation character.
    Punct,
    /// End of input.
    Eof,
}

/// One token with its source location.
#[derive(Debug, Clone)]
pub struct Token {
    /// Classification.
    pub kind: TokenKind,
    /// Token text (for `Str`, without the quotes).
    pub text: String,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub col: u32,
}

impl Token {
    /// Parses the token text as `f64`.
    pub fn number(&self) -> Result<f64, ParseError> {
        self.text.parse::<f64>().map_err(|_| {
            ParseError::new(
                self.line,
                self.col,
                format!("expected a number, found '{}'", self.text),
            )
        })
    }
}

/// Language-specific tokenizer settings.
#[derive(Debug, Clone)]
pub struct LexConfig {
    /// Characters lexed as single-character punctuation tokens.
    pub punct: &'static str,
    /// Line-comment introducers.
    pub line_comments: &'static [&'static str],
    /// Whether `/* ... */` comments are recognized.
    pub block_comments: bool,
    /// Whether a backslash starts an escaped identifier running to the next
    /// whitespace (Verilog).
    pub escaped_idents: bool,
}

impl LexConfig {
    /// LEF / DEF tokens: `#` comments, structural punctuation.
    pub fn lefdef() -> Self {
        Self {
            punct: ";()+",
            line_comments: &["#"],
            block_comments: false,
            escaped_idents: false,
        }
    }

    /// Liberty tokens: C-style comments, attribute punctuation.
    pub fn liberty() -> Self {
        Self {
            punct: "{}();:,",
            line_comments: &["//"],
            block_comments: true,
            escaped_idents: false,
        }
    }

    /// Structural Verilog tokens.
    pub fn verilog() -> Self {
        Self {
            punct: "()[]{};,.:=",
            line_comments: &["//"],
            block_comments: true,
            escaped_idents: true,
        }
    }
}

/// Tokenizes `source` according to `config`.
pub fn tokenize(source: &str, config: &LexConfig) -> Result<Vec<Token>, ParseError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    let mut line = 1u32;
    let mut col = 1u32;

    let advance = |pos: &mut usize, line: &mut u32, col: &mut u32, b: u8| {
        *pos += 1;
        if b == b'\n' {
            *line += 1;
            *col = 1;
        } else {
            *col += 1;
        }
    };

    'outer: while pos < bytes.len() {
        let b = bytes[pos];

        if b.is_ascii_whitespace() {
            advance(&mut pos, &mut line, &mut col, b);
            continue;
        }

        for intro in config.line_comments {
            if source[pos..].starts_with(intro) {
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    let b = bytes[pos];
                    advance(&mut pos, &mut line, &mut col, b);
                }
                continue 'outer;
            }
        }

        if config.block_comments && source[pos..].starts_with("/*") {
            let start_line = line;
            let start_col = col;
            while pos < bytes.len() && !source[pos..].starts_with("*/") {
                let b = bytes[pos];
                advance(&mut pos, &mut line, &mut col, b);
            }
            if pos >= bytes.len() {
                return Err(ParseError::new(start_line, start_col, "unterminated comment"));
            }
            let b = bytes[pos];
            advance(&mut pos, &mut line, &mut col, b);
            let b = bytes[pos];
            advance(&mut pos, &mut line, &mut col, b);
            continue;
        }

        let tok_line = line;
        let tok_col = col;

        if b == b'"' {
            advance(&mut pos, &mut line, &mut col, b);
            let start = pos;
            while pos < bytes.len() && bytes[pos] != b'"' {
                let b = bytes[pos];
                advance(&mut pos, &mut line, &mut col, b);
            }
            if pos >= bytes.len() {
                return Err(ParseError::new(tok_line, tok_col, "unterminated string"));
            }
            let text = source[start..pos].to_owned();
            let b = bytes[pos];
            advance(&mut pos, &mut line, &mut col, b);
            tokens.push(Token {
                kind: TokenKind::Str,
                text,
                line: tok_line,
                col: tok_col,
            });
            continue;
        }

        if config.escaped_idents && b == b'\\' {
            advance(&mut pos, &mut line, &mut col, b);
            let start = pos;
            while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
                let b = bytes[pos];
                advance(&mut pos, &mut line, &mut col, b);
            }
            tokens.push(Token {
                kind: TokenKind::Ident,
                text: source[start..pos].to_owned(),
                line: tok_line,
                col: tok_col,
            });
            continue;
        }

        if config.punct.contains(b as char) {
            advance(&mut pos, &mut line, &mut col, b);
            tokens.push(Token {
                kind: TokenKind::Punct,
                text: (b as char).to_string(),
                line: tok_line,
                col: tok_col,
            });
            continue;
        }

        // number: digit, or sign/dot directly followed by a digit
        let is_number_start = b.is_ascii_digit()
            || ((b == b'-' || b == b'+' || b == b'.')
                && pos + 1 < bytes.len()
                && (bytes[pos + 1].is_ascii_digit() || bytes[pos + 1] == b'.'));
        if is_number_start {
            let start = pos;
            advance(&mut pos, &mut line, &mut col, b);
            while pos < bytes.len() {
                let c = bytes[pos];
                if c.is_ascii_digit() || c == b'.' || c == b'e' || c == b'E' {
                    advance(&mut pos, &mut line, &mut col, c);
                } else if (c == b'-' || c == b'+')
                    && matches!(bytes[pos - 1], b'e' | b'E')
                {
                    advance(&mut pos, &mut line, &mut col, c);
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Number,
                text: source[start..pos].to_owned(),
                line: tok_line,
                col: tok_col,
            });
            continue;
        }

        // identifier: everything up to whitespace or punctuation
        let start = pos;
        while pos < bytes.len() {
            let c = bytes[pos];
            if c.is_ascii_whitespace() || config.punct.contains(c as char) || c == b'"' {
                break;
            }
            advance(&mut pos, &mut line, &mut col, c);
        }
        if pos == start {
            return Err(ParseError::new(
                tok_line,
                tok_col,
                format!("unexpected character '{}'", b as char),
            ));
        }
        tokens.push(Token {
            kind: TokenKind::Ident,
            text: source[start..pos].to_owned(),
            line: tok_line,
            col: tok_col,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        line,
        col,
    });
    Ok(tokens)
}

/// Forward-only cursor over a token stream with error helpers.
#[derive(Debug)]
pub struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    /// Wraps a token stream.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// The current token.
    pub fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// True when the cursor sits on `Eof`.
    pub fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Consumes and returns the current token.
    pub fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Builds a parse error at the current token.
    pub fn error(&self, msg: impl Into<String>) -> ParseError {
        let token = self.peek();
        ParseError::new(token.line, token.col, msg)
    }

    /// Consumes an identifier (or returns an error naming `what`).
    pub fn expect_ident(&mut self, what: &str) -> Result<Token, ParseError> {
        if self.peek().kind == TokenKind::Ident {
            Ok(self.next())
        } else {
            Err(self.error(format!("expected {what}, found '{}'", self.peek().text)))
        }
    }

    /// Consumes a number token and parses it.
    pub fn expect_number(&mut self) -> Result<f64, ParseError> {
        if self.peek().kind == TokenKind::Number {
            self.next().number()
        } else {
            Err(self.error(format!("expected a number, found '{}'", self.peek().text)))
        }
    }

    /// Consumes the given punctuation character.
    pub fn expect_punct(&mut self, c: char) -> Result<(), ParseError> {
        if self.peek().kind == TokenKind::Punct && self.peek().text.starts_with(c) {
            self.next();
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}', found '{}'", self.peek().text)))
        }
    }

    /// Consumes the token when it is the given punctuation; returns whether
    /// it did.
    pub fn eat_punct(&mut self, c: char) -> bool {
        if self.peek().kind == TokenKind::Punct && self.peek().text.starts_with(c) {
            self.next();
            true
        } else {
            false
        }
    }

    /// Consumes the token when it is the given identifier; returns whether
    /// it did.
    pub fn eat_ident(&mut self, word: &str) -> bool {
        if self.peek().kind == TokenKind::Ident && self.peek().text == word {
            self.next();
            true
        } else {
            false
        }
    }
}
