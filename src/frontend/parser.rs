use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{BinOp, Binary, Expr, MethodCall, MethodDecl, MethodDef};
use crate::error::HannaError;

use super::lexer::Lexer;
use super::precedence::token_precedence;
use super::token::Token;
use super::token_type::TokenType;

/// Parse result: the method definition templates (lazily specialized later)
/// and the ordered `main` expressions.
#[derive(Debug)]
pub struct Program {
    pub methods: HashMap<String, Rc<MethodDef>>,
    pub toplevel: Vec<Expr>,
}

/// Recursive-descent parser over the Hanna grammar:
///
/// ```text
/// program     := method* 'main' expression* EOF
/// method      := 'method' IDENT '(' (IDENT (',' IDENT)*)? ')' 'return' expression
/// expression  := call_or_var (op call_or_var)*
/// call_or_var := IDENT ('(' (expression (',' expression)*)? ')')?
///              | INT | REAL
/// ```
///
/// Errors are fail-fast; the first grammar violation aborts the parse.
pub struct Parser {
    lexer: Lexer,
    current: Token,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        let mut parser = Parser {
            lexer,
            current: Token::new(TokenType::Eof, "", 0, 0),
        };
        parser.advance();
        parser
    }

    pub fn parse_program(&mut self) -> Result<Program, HannaError> {
        let mut methods: HashMap<String, Rc<MethodDef>> = HashMap::new();

        // 1) All method definitions come before main.
        loop {
            match self.current.token_type {
                TokenType::Method => {
                    let method = self.parse_method()?;
                    if methods.contains_key(method.name()) {
                        return Err(HannaError::Parse {
                            message: format!("redefinition of method `{}`", method.name()),
                            position: self.current.position,
                        });
                    }
                    methods.insert(method.name().to_string(), method);
                }
                TokenType::Main => break,
                TokenType::Eof => {
                    return Err(HannaError::Parse {
                        message: "no main block defined in program".to_string(),
                        position: self.current.position,
                    });
                }
                TokenType::Illegal => return Err(self.illegal_token()),
                _ => {
                    return Err(HannaError::Parse {
                        message: format!(
                            "expected `method` or `main`, found `{}`",
                            self.current.literal
                        ),
                        position: self.current.position,
                    });
                }
            }
        }

        // 2) Eat `main`, then collect top-level expressions until EOF.
        self.advance();
        let mut toplevel = Vec::new();
        while self.current.token_type != TokenType::Eof {
            toplevel.push(self.parse_expression()?);
        }

        Ok(Program { methods, toplevel })
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn parse_method(&mut self) -> Result<Rc<MethodDef>, HannaError> {
        // Eat the `method` keyword.
        self.advance();

        let name = match self.current.token_type {
            TokenType::Ident => self.current.literal.clone(),
            _ => {
                return Err(HannaError::Parse {
                    message: "expected method name after `method`".to_string(),
                    position: self.current.position,
                });
            }
        };
        self.advance();

        self.expect(TokenType::LParen, || {
            format!("expected `(` in declaration of method `{}`", name)
        })?;

        let mut params = Vec::new();
        if self.current.token_type == TokenType::Ident {
            params.push(self.current.literal.clone());
            self.advance();
            while self.current.token_type == TokenType::Comma {
                self.advance();
                match self.current.token_type {
                    TokenType::Ident => {
                        params.push(self.current.literal.clone());
                        self.advance();
                    }
                    _ => {
                        return Err(HannaError::Parse {
                            message: format!(
                                "expected parameter name in declaration of method `{}`",
                                name
                            ),
                            position: self.current.position,
                        });
                    }
                }
            }
        }

        self.expect(TokenType::RParen, || {
            format!("expected `)` in declaration of method `{}`", name)
        })?;

        // Method bodies are single expressions and must be introduced by
        // `return`.
        self.expect(TokenType::Return, || {
            format!("method `{}` does not return anything", name)
        })?;

        let body = self.parse_expression()?;
        let decl = Rc::new(MethodDecl::new(name, params));
        Ok(Rc::new(MethodDef::new(decl, body)))
    }

    fn expect(
        &mut self,
        token_type: TokenType,
        message: impl FnOnce() -> String,
    ) -> Result<(), HannaError> {
        if self.current.token_type == token_type {
            self.advance();
            Ok(())
        } else {
            Err(HannaError::Parse {
                message: message(),
                position: self.current.position,
            })
        }
    }

    fn parse_expression(&mut self) -> Result<Expr, HannaError> {
        let lhs = self.parse_operand()?;
        self.parse_binary_rhs(0, lhs)
    }

    /// Operator-precedence climb: extend `lhs` while the current token is a
    /// binary operator binding at least as tightly as `min_precedence`.
    fn parse_binary_rhs(&mut self, min_precedence: i32, mut lhs: Expr) -> Result<Expr, HannaError> {
        loop {
            let Some(precedence) = token_precedence(self.current.token_type) else {
                return Ok(lhs);
            };
            if precedence < min_precedence {
                return Ok(lhs);
            }

            let op = match self.current.token_type {
                TokenType::Plus => BinOp::Add,
                TokenType::Minus => BinOp::Sub,
                TokenType::Asterisk => BinOp::Mul,
                TokenType::Slash => BinOp::Div,
                _ => unreachable!("token_precedence only accepts operators"),
            };
            self.advance();

            let mut rhs = self.parse_operand()?;
            if let Some(next) = token_precedence(self.current.token_type) {
                if precedence < next {
                    rhs = self.parse_binary_rhs(precedence + 1, rhs)?;
                }
            }

            lhs = Expr::Binary(Binary::new(op, lhs, rhs));
        }
    }

    fn parse_operand(&mut self) -> Result<Expr, HannaError> {
        match self.current.token_type {
            TokenType::Int => self.parse_int(),
            TokenType::Real => self.parse_real(),
            TokenType::Minus => self.parse_negation(),
            TokenType::Ident => self.parse_call_or_var(),
            TokenType::Illegal => Err(self.illegal_token()),
            _ => Err(HannaError::Parse {
                message: format!(
                    "expected an expression, found `{}`",
                    self.current.token_type
                ),
                position: self.current.position,
            }),
        }
    }

    fn parse_int(&mut self) -> Result<Expr, HannaError> {
        let value = self.current.literal.parse::<i64>().map_err(|_| {
            HannaError::Token {
                message: format!("malformed number `{}`", self.current.literal),
                position: self.current.position,
            }
        })?;
        self.advance();
        Ok(Expr::Int(value))
    }

    fn parse_real(&mut self) -> Result<Expr, HannaError> {
        let value = self.current.literal.parse::<f64>().map_err(|_| {
            HannaError::Token {
                message: format!("malformed number `{}`", self.current.literal),
                position: self.current.position,
            }
        })?;
        self.advance();
        Ok(Expr::Real(value))
    }

    /// Prefix minus. A negated literal folds into a negative literal so a
    /// call like `sq(-1)` still specializes on a plain int argument;
    /// anything else desugars to `0 - x`.
    fn parse_negation(&mut self) -> Result<Expr, HannaError> {
        self.advance();
        let operand = self.parse_operand()?;
        Ok(match operand {
            Expr::Int(value) => Expr::Int(-value),
            Expr::Real(value) => Expr::Real(-value),
            other => Expr::Binary(Binary::new(BinOp::Sub, Expr::Int(0), other)),
        })
    }

    fn parse_call_or_var(&mut self) -> Result<Expr, HannaError> {
        let name = self.current.literal.clone();
        self.advance();

        if self.current.token_type != TokenType::LParen {
            // Plain variable reference.
            return Ok(Expr::Variable(name));
        }

        // Method call: parentheses group arguments only.
        self.advance();
        let mut args = Vec::new();
        if self.current.token_type == TokenType::RParen {
            self.advance();
        } else {
            loop {
                args.push(self.parse_expression()?);
                match self.current.token_type {
                    TokenType::Comma => self.advance(),
                    TokenType::RParen => {
                        self.advance();
                        break;
                    }
                    _ => {
                        return Err(HannaError::Parse {
                            message: format!("expected `)` in call to `{}`", name),
                            position: self.current.position,
                        });
                    }
                }
            }
        }

        Ok(Expr::Call(MethodCall::new(name, args)))
    }

    fn illegal_token(&self) -> HannaError {
        let literal = &self.current.literal;
        if literal.starts_with(|c: char| c.is_ascii_digit()) {
            HannaError::Token {
                message: format!("malformed number `{}`", literal),
                position: self.current.position,
            }
        } else {
            HannaError::Parse {
                message: format!("unexpected character `{}`", literal),
                position: self.current.position,
            }
        }
    }
}
