use crate::language::{Value, unescape};
use crate::lexer::{Lexer, Token};
use crate::pool::Pool;

// ============================================================================
// Parser
// ============================================================================

const RED_ZONE: usize = 100 * 1024;
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Parse source text into an S-Expression holding every top-level form.
///
/// Any lexical or syntactic failure yields a single `Error` value and
/// no partial structure.
pub fn parse(input: &str, pool: &mut Pool) -> Value {
    let mut lexer = Lexer::new(input);
    match parse_forms(&mut lexer, pool, &Token::Eof) {
        Ok(cells) => Value::SExpr(cells),
        Err(message) => Value::Error(message),
    }
}

/// Read forms until `close`, releasing everything read so far on failure.
fn parse_forms(lexer: &mut Lexer, pool: &mut Pool, close: &Token) -> Result<Vec<Value>, String> {
    let mut cells = pool.allocate();
    loop {
        let token = lexer.next_token();
        if token == *close {
            return Ok(cells);
        }
        let item = match token {
            Token::LParen => parse_nested(lexer, pool, &Token::RParen).map(Value::SExpr),
            Token::LBrace => parse_nested(lexer, pool, &Token::RBrace).map(Value::QExpr),
            Token::RParen | Token::RBrace => {
                Err("Unexpected closing parenthesis/brace".to_string())
            }
            Token::Eof => Err("Missing closing parenthesis/brace".to_string()),
            Token::Error(message) => Err(message),
            Token::Number(text) => read_number(&text),
            Token::Symbol(name) => Ok(Value::symbol(&name)),
            Token::Str(raw) => Ok(Value::Str(unescape(&raw))),
        };
        match item {
            Ok(value) => cells.push(value),
            Err(message) => {
                pool.release_cells(cells);
                return Err(message);
            }
        }
    }
}

fn parse_nested(lexer: &mut Lexer, pool: &mut Pool, close: &Token) -> Result<Vec<Value>, String> {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
        parse_forms(lexer, pool, close)
    })
}

/// Number atoms with a decimal point are decimals. A malformed or
/// out-of-range number fails the whole parse.
pub fn read_number(text: &str) -> Result<Value, String> {
    let parsed = if text.contains('.') {
        text.parse::<f64>().map(Value::Decimal).ok()
    } else {
        text.parse::<i64>().map(Value::Number).ok()
    };
    parsed.ok_or_else(|| "invalid number".to_string())
}
