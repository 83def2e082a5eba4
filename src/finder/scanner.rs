/*!
    A small tokenizer for Python source code, only as
    detailed as needed to find every import statement.
*/

use std::{iter::Peekable, vec::IntoIter};

use thiserror::Error;

const STRING_PREFIXES: [&str; 11] = ["r", "u", "b", "f", "t", "br", "rb", "fr", "rf", "tr", "rt"];

/**
    A single import statement found in a source file.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    pub line: usize,
    pub kind: ImportKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    /// `import a.b` - one statement per comma-separated module.
    Import { module: String },
    /// `from ..a import b, c` - `names` contains `*` for star imports.
    From {
        level: usize,
        module: Option<String>,
        names: Vec<String>,
    },
}

/**
    Error returned for source code that could not be tokenized,
    or that contains an import statement with invalid syntax.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line})")]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl ScanError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/**
    Scans the given source code for import statements.

    Imports are found anywhere in the file, including inside of function
    bodies, conditional blocks and one-line compound statements such as
    `try: import foo`, since any of these may be executed at runtime.

    # Errors

    - If a string literal or a bracket is never closed.
    - If a closing bracket does not match its opening bracket.
    - If an import statement is malformed.
*/
pub fn scan_imports(source: &str) -> Result<Vec<ImportStatement>, ScanError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Dot,
    Comma,
    Star,
    LParen,
    RParen,
    // Only emitted outside of brackets, where it may start a new statement
    Colon,
    Semicolon,
    Newline,
    Other,
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    brackets: Vec<(char, usize)>,
    tokens: Vec<Spanned>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        let normalized = source.replace("\r\n", "\n").replace('\r', "\n");
        Self {
            chars: normalized.chars().collect(),
            pos: 0,
            line: 1,
            brackets: Vec::new(),
            tokens: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn push(&mut self, token: Token) {
        self.tokens.push(Spanned {
            token,
            line: self.line,
        });
    }

    fn push_newline(&mut self) {
        let after_newline = self
            .tokens
            .last()
            .map_or(true, |s| s.token == Token::Newline);
        if self.brackets.is_empty() && !after_newline {
            self.push(Token::Newline);
        }
    }

    fn tokenize(mut self) -> Result<Vec<Spanned>, ScanError> {
        while let Some(c) = self.peek(0) {
            match c {
                '#' => {
                    while self.peek(0).is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                }
                '\\' => {
                    if self.peek(1) != Some('\n') {
                        return Err(ScanError::new(
                            self.line,
                            "unexpected character after line continuation character",
                        ));
                    }
                    self.pos += 2;
                    self.line += 1;
                }
                '\n' => {
                    self.pos += 1;
                    self.push_newline();
                    self.line += 1;
                }
                '"' | '\'' => self.lex_string(c)?,
                c if is_ident_start(c) => self.lex_name()?,
                c if c.is_ascii_digit() => self.lex_number(),
                '.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
                '(' | '[' | '{' => {
                    self.brackets.push((c, self.line));
                    self.pos += 1;
                    self.push(if c == '(' { Token::LParen } else { Token::Other });
                }
                ')' | ']' | '}' => self.close_bracket(c)?,
                c if c.is_whitespace() => self.pos += 1,
                _ => {
                    self.pos += 1;
                    let token = match c {
                        '.' => Token::Dot,
                        ',' => Token::Comma,
                        '*' => Token::Star,
                        ';' => Token::Semicolon,
                        ':' if self.brackets.is_empty() => Token::Colon,
                        _ => Token::Other,
                    };
                    self.push(token);
                }
            }
        }

        if let Some(&(open, line)) = self.brackets.last() {
            return Err(ScanError::new(line, format!("'{open}' was never closed")));
        }

        self.push_newline();
        Ok(self.tokens)
    }

    fn lex_name(&mut self) -> Result<(), ScanError> {
        let start = self.pos;
        while self.peek(0).is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        // Names such as `rb` directly followed by a quote are string prefixes
        if let Some(quote @ ('"' | '\'')) = self.peek(0) {
            if STRING_PREFIXES.contains(&name.to_ascii_lowercase().as_str()) {
                return self.lex_string(quote);
            }
        }

        self.push(Token::Name(name));
        Ok(())
    }

    fn lex_number(&mut self) {
        while self
            .peek(0)
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            self.pos += 1;
        }
        self.push(Token::Other);
    }

    fn lex_string(&mut self, quote: char) -> Result<(), ScanError> {
        let start = self.line;
        let triple = self.peek(1) == Some(quote) && self.peek(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };

        loop {
            let Some(c) = self.peek(0) else {
                let message = if triple {
                    "unterminated triple-quoted string literal"
                } else {
                    "unterminated string literal"
                };
                return Err(ScanError::new(start, message));
            };
            self.pos += 1;
            match c {
                '\\' => {
                    if let Some(escaped) = self.peek(0) {
                        self.pos += 1;
                        if escaped == '\n' {
                            self.line += 1;
                        }
                    }
                }
                '\n' if triple => self.line += 1,
                '\n' => return Err(ScanError::new(start, "unterminated string literal")),
                c if c == quote => {
                    if !triple {
                        break;
                    }
                    if self.peek(0) == Some(quote) && self.peek(1) == Some(quote) {
                        self.pos += 2;
                        break;
                    }
                }
                _ => {}
            }
        }

        self.push(Token::Other);
        Ok(())
    }

    fn close_bracket(&mut self, close: char) -> Result<(), ScanError> {
        let expected = match close {
            ')' => '(',
            ']' => '[',
            _ => '{',
        };
        match self.brackets.pop() {
            Some((open, _)) if open == expected => {}
            Some((open, _)) => {
                return Err(ScanError::new(
                    self.line,
                    format!("closing parenthesis '{close}' does not match opening parenthesis '{open}'"),
                ))
            }
            None => return Err(ScanError::new(self.line, format!("unmatched '{close}'"))),
        }
        self.pos += 1;
        self.push(if close == ')' { Token::RParen } else { Token::Other });
        Ok(())
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

struct Parser {
    tokens: Peekable<IntoIter<Spanned>>,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
        }
    }

    fn parse(mut self) -> Result<Vec<ImportStatement>, ScanError> {
        let mut statements = Vec::new();
        let mut at_start = true;

        while let Some(Spanned { token, line }) = self.tokens.next() {
            match token {
                Token::Newline | Token::Semicolon | Token::Colon => {
                    at_start = true;
                    continue;
                }
                Token::Name(name) if at_start && name == "import" => {
                    self.parse_import(line, &mut statements)?;
                    self.expect_end(line)?;
                }
                Token::Name(name) if at_start && name == "from" => {
                    let kind = self.parse_from(line)?;
                    statements.push(ImportStatement { line, kind });
                    self.expect_end(line)?;
                }
                _ => {}
            }
            at_start = false;
        }

        Ok(statements)
    }

    fn peek_is(&mut self, token: &Token) -> bool {
        self.tokens.peek().is_some_and(|s| &s.token == token)
    }

    fn peek_is_name(&mut self, name: &str) -> bool {
        self.tokens
            .peek()
            .is_some_and(|s| matches!(&s.token, Token::Name(n) if n == name))
    }

    fn error_here(&mut self, line: usize, message: &str) -> ScanError {
        let line = self.tokens.peek().map_or(line, |s| s.line);
        ScanError::new(line, message)
    }

    fn expect_name(&mut self, line: usize, message: &str) -> Result<String, ScanError> {
        if matches!(self.tokens.peek().map(|s| &s.token), Some(Token::Name(_))) {
            if let Some(Spanned {
                token: Token::Name(name),
                ..
            }) = self.tokens.next()
            {
                return Ok(name);
            }
        }
        Err(self.error_here(line, message))
    }

    fn expect_end(&mut self, line: usize) -> Result<(), ScanError> {
        let at_end = matches!(
            self.tokens.peek().map(|s| &s.token),
            None | Some(Token::Newline | Token::Semicolon)
        );
        if at_end {
            Ok(())
        } else {
            Err(self.error_here(line, "invalid syntax in import statement"))
        }
    }

    fn parse_dotted(&mut self, line: usize) -> Result<String, ScanError> {
        let mut module = self.expect_name(line, "expected module name")?;
        while self.peek_is(&Token::Dot) {
            self.tokens.next();
            module.push('.');
            module.push_str(&self.expect_name(line, "expected name after '.'")?);
        }
        Ok(module)
    }

    fn skip_alias(&mut self, line: usize) -> Result<(), ScanError> {
        if self.peek_is_name("as") {
            self.tokens.next();
            self.expect_name(line, "expected name after 'as'")?;
        }
        Ok(())
    }

    fn parse_import(
        &mut self,
        line: usize,
        statements: &mut Vec<ImportStatement>,
    ) -> Result<(), ScanError> {
        loop {
            let module = self.parse_dotted(line)?;
            self.skip_alias(line)?;
            statements.push(ImportStatement {
                line,
                kind: ImportKind::Import { module },
            });
            if !self.peek_is(&Token::Comma) {
                return Ok(());
            }
            self.tokens.next();
        }
    }

    fn parse_from(&mut self, line: usize) -> Result<ImportKind, ScanError> {
        let mut level = 0;
        while self.peek_is(&Token::Dot) {
            self.tokens.next();
            level += 1;
        }

        let names_module = matches!(
            self.tokens.peek().map(|s| &s.token),
            Some(Token::Name(name)) if name != "import"
        );
        let module = if names_module {
            Some(self.parse_dotted(line)?)
        } else {
            None
        };
        if level == 0 && module.is_none() {
            return Err(self.error_here(line, "expected module name after 'from'"));
        }

        if !self.peek_is_name("import") {
            return Err(self.error_here(line, "expected 'import'"));
        }
        self.tokens.next();

        let names = if self.peek_is(&Token::Star) {
            self.tokens.next();
            vec!["*".to_string()]
        } else if self.peek_is(&Token::LParen) {
            self.tokens.next();
            let names = self.parse_names(line, true)?;
            if !self.peek_is(&Token::RParen) {
                return Err(self.error_here(line, "expected ')'"));
            }
            self.tokens.next();
            names
        } else {
            self.parse_names(line, false)?
        };

        Ok(ImportKind::From {
            level,
            module,
            names,
        })
    }

    fn parse_names(&mut self, line: usize, parenthesized: bool) -> Result<Vec<String>, ScanError> {
        let mut names = Vec::new();
        loop {
            names.push(self.expect_name(line, "expected name to import")?);
            self.skip_alias(line)?;
            if !self.peek_is(&Token::Comma) {
                return Ok(names);
            }
            self.tokens.next();
            // Trailing commas are only allowed inside of parentheses
            if parenthesized && self.peek_is(&Token::RParen) {
                return Ok(names);
            }
        }
    }
}

#[cfg(test)]
mod tests;
