//! Tokenizer and cursor for the site file's block syntax.
//!
//! ```text
//! # comment
//! jwt_signer 15m {env.SIGNER_SECRET} {
//!     sub     {http.request.header.X-User}
//!     profile {
//!         name "{http.request.uri.query.name}"
//!     }
//! }
//! ```
//!
//! Tokens are separated by whitespace. Double quotes group a token (`\"`
//! escapes a quote inside one). `#` at the start of a token comments out the
//! rest of the line. An unquoted `{` or `}` standing alone opens or closes a
//! block, so placeholders like `{env.X}` are ordinary tokens.

use crate::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub line: usize,
    pub quoted: bool,
}

impl Token {
    fn is_open(&self) -> bool {
        !self.quoted && self.text == "{"
    }

    fn is_close(&self) -> bool {
        !self.quoted && self.text == "}"
    }
}

/// Split `input` into tokens, checking quotes and braces are balanced.
pub fn tokenize(file: &str, input: &str) -> Result<Vec<Token>, AppError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        if c == '\n' {
            line += 1;
            chars.next();
            continue;
        }
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            while chars.next_if(|&c| c != '\n').is_some() {}
            continue;
        }

        if c == '"' {
            let start_line = line;
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some('\\') if chars.peek() == Some(&'"') => {
                        chars.next();
                        text.push('"');
                    }
                    Some('"') => break,
                    Some(c) => {
                        if c == '\n' {
                            line += 1;
                        }
                        text.push(c);
                    }
                    None => {
                        return Err(AppError::config(format!(
                            "{file}:{start_line}: unterminated quoted string"
                        )))
                    }
                }
            }
            tokens.push(Token {
                text,
                line: start_line,
                quoted: true,
            });
            continue;
        }

        let mut text = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
            text.push(c);
        }
        tokens.push(Token {
            text,
            line,
            quoted: false,
        });
    }

    let mut depth: usize = 0;
    for token in &tokens {
        if token.is_open() {
            depth += 1;
        } else if token.is_close() {
            depth = depth.checked_sub(1).ok_or_else(|| {
                AppError::config(format!("{file}:{}: unexpected '}}'", token.line))
            })?;
        }
    }
    if depth > 0 {
        return Err(AppError::config(format!(
            "{file}: unexpected end of file, missing '}}'"
        )));
    }

    Ok(tokens)
}

/// Cursor over a token stream, tracking block nesting.
#[derive(Debug)]
pub struct Dispenser {
    file: String,
    tokens: Vec<Token>,
    /// Index of the current token; `None` before the first call to `next`.
    cursor: Option<usize>,
    nesting: usize,
}

impl Dispenser {
    pub fn new(file: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            file: file.into(),
            tokens,
            cursor: None,
            nesting: 0,
        }
    }

    pub fn parse(file: &str, input: &str) -> Result<Self, AppError> {
        Ok(Self::new(file, tokenize(file, input)?))
    }

    fn current(&self) -> Option<&Token> {
        self.cursor.and_then(|i| self.tokens.get(i))
    }

    fn peek(&self) -> Option<&Token> {
        let next = self.cursor.map_or(0, |i| i + 1);
        self.tokens.get(next)
    }

    fn advance(&mut self) {
        self.cursor = Some(self.cursor.map_or(0, |i| i + 1));
    }

    fn next_on_same_line(&self) -> bool {
        match (self.current(), self.peek()) {
            (Some(cur), Some(next)) => cur.line == next.line,
            _ => false,
        }
    }

    /// Advance to the next token, on any line.
    pub fn next(&mut self) -> bool {
        if self.peek().is_none() {
            return false;
        }
        self.advance();
        true
    }

    /// Advance to the next token only if it is an argument of the current
    /// line. Block delimiters are not arguments.
    pub fn next_arg(&mut self) -> bool {
        if !self.next_on_same_line() {
            return false;
        }
        if self.peek().is_some_and(|t| t.is_open() || t.is_close()) {
            return false;
        }
        self.advance();
        true
    }

    /// Collect the remaining arguments on the current line.
    pub fn remaining_args(&mut self) -> Vec<String> {
        let mut args = Vec::new();
        while self.next_arg() {
            args.push(self.val().to_string());
        }
        args
    }

    /// Text of the current token, or `""` before the first token.
    pub fn val(&self) -> &str {
        self.current().map_or("", |t| t.text.as_str())
    }

    pub fn line(&self) -> usize {
        self.current().map_or(0, |t| t.line)
    }

    pub fn nesting(&self) -> usize {
        self.nesting
    }

    /// True if the current token is an unquoted `{` or `}`.
    pub fn is_block_delimiter(&self) -> bool {
        self.current()
            .is_some_and(|t| t.is_open() || t.is_close())
    }

    /// Step through the entries of a block opened at `initial_nesting`.
    ///
    /// On the first call the block must open on the current line; returns
    /// `false` if there is no block, if it is empty, or once its closing
    /// brace has been consumed.
    pub fn next_block(&mut self, initial_nesting: usize) -> bool {
        if self.nesting > initial_nesting {
            if !self.next() {
                return false;
            }
            if self.current().is_some_and(Token::is_close) {
                self.nesting -= 1;
                return self.nesting > initial_nesting;
            }
            if self.current().is_some_and(Token::is_open) {
                self.nesting += 1;
            }
            return true;
        }

        if !self.next_on_same_line() || !self.peek().is_some_and(Token::is_open) {
            return false;
        }
        self.advance(); // consume '{'
        if !self.next() {
            return false;
        }
        if self.current().is_some_and(Token::is_close) {
            // opened and closed right away
            return false;
        }
        self.nesting += 1;
        true
    }

    pub fn err(&self, msg: impl std::fmt::Display) -> AppError {
        AppError::config(format!("{}:{}: {msg}", self.file, self.line()))
    }

    pub fn arg_err(&self) -> AppError {
        self.err(format!(
            "wrong argument count or unexpected line ending after '{}'",
            self.val()
        ))
    }
}
