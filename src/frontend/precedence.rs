use super::token_type::TokenType;

/// Binding strength of a binary operator token; `None` means the token does
/// not continue an expression. Additive operators bind at 20, multiplicative
/// at 40, so `a + b * c` parses as `a + (b * c)`.
pub fn token_precedence(token_type: TokenType) -> Option<i32> {
    match token_type {
        TokenType::Plus | TokenType::Minus => Some(20),
        TokenType::Asterisk | TokenType::Slash => Some(40),
        _ => None,
    }
}
