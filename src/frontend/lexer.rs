use super::token::Token;
use super::token_type::{lookup_ident, TokenType};

/// The Hanna lexer.
///
/// Walks the source a character at a time; `#` starts a comment running to
/// the end of the line. Numbers are runs of digits with at most one `.`
/// making a real; a second dot turns the whole run into an illegal token
/// that the parser reports as a malformed number.
#[derive(Debug, Clone)]
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    read_position: usize,
    current_char: Option<char>,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: impl Into<String>) -> Self {
        let mut lexer = Self {
            input: input.into().chars().collect(),
            position: 0,
            read_position: 0,
            current_char: None,
            line: 1,
            column: 0,
        };
        lexer.read_char();
        lexer
    }

    /// Get the next token from the input.
    pub fn next_token(&mut self) -> Token {
        self.skip_ignorable();

        let line = self.line;
        let col = self.column;

        let token = match self.current_char {
            Some('+') => Token::new(TokenType::Plus, "+", line, col),
            Some('-') => Token::new(TokenType::Minus, "-", line, col),
            Some('*') => Token::new(TokenType::Asterisk, "*", line, col),
            Some('/') => Token::new(TokenType::Slash, "/", line, col),
            Some('(') => Token::new(TokenType::LParen, "(", line, col),
            Some(')') => Token::new(TokenType::RParen, ")", line, col),
            Some(',') => Token::new(TokenType::Comma, ",", line, col),

            // End of file
            None => Token::new(TokenType::Eof, "", line, col),

            // Identifiers and keywords
            Some(ch) if ch.is_ascii_alphabetic() => {
                let ident = self.read_identifier();
                let token_type = lookup_ident(&ident);
                return Token::new(token_type, ident, line, col);
            }

            // Numbers
            Some(ch) if ch.is_ascii_digit() => {
                let (literal, token_type) = self.read_number();
                return Token::new(token_type, literal, line, col);
            }

            // Illegal character
            Some(ch) => Token::new(TokenType::Illegal, ch.to_string(), line, col),
        };

        self.read_char();
        token
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.token_type == TokenType::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn read_char(&mut self) {
        self.current_char = if self.read_position >= self.input.len() {
            None
        } else {
            Some(self.input[self.read_position])
        };

        self.position = self.read_position;
        self.read_position += 1;

        match self.current_char {
            Some('\n') => {
                self.line += 1;
                self.column = 0;
            }
            Some(_) => {
                self.column += 1;
            }
            None => {}
        }
    }

    fn skip_ignorable(&mut self) {
        loop {
            while matches!(self.current_char, Some(c) if c.is_whitespace()) {
                self.read_char();
            }

            // Comments: '#' to end of line
            if self.current_char == Some('#') {
                while self.current_char.is_some() && self.current_char != Some('\n') {
                    self.read_char();
                }
                continue;
            }

            break;
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while self.current_char.is_some_and(|c| c.is_ascii_alphanumeric()) {
            self.read_char();
        }
        self.input[start..self.position].iter().collect()
    }

    /// Reads a number run. Returns the literal together with its token type:
    /// `Int`, `Real` once a dot appears (a bare trailing dot reads as `.0`),
    /// or `Illegal` when the run contains a second dot.
    fn read_number(&mut self) -> (String, TokenType) {
        let start = self.position;
        while self.current_char.is_some_and(|c| c.is_ascii_digit()) {
            self.read_char();
        }

        let mut token_type = TokenType::Int;
        if self.current_char == Some('.') {
            token_type = TokenType::Real;
            self.read_char(); // consume '.'
            while self.current_char.is_some_and(|c| c.is_ascii_digit()) {
                self.read_char();
            }

            // A second dot makes the run malformed; swallow the rest of it
            // so the parser can point at the whole thing.
            if self.current_char == Some('.') {
                token_type = TokenType::Illegal;
                while self
                    .current_char
                    .is_some_and(|c| c.is_ascii_digit() || c == '.')
                {
                    self.read_char();
                }
            }
        }

        let literal: String = self.input[start..self.position].iter().collect();
        (literal, token_type)
    }
}
