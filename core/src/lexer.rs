// ============================================================================
// Lexer
// ============================================================================

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    finished: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            finished: false,
        }
    }

    fn current_char(&self) -> char {
        if self.position < self.input.len() {
            self.input[self.position]
        } else {
            '\0'
        }
    }

    fn peek_ahead(&self, n: usize) -> char {
        if self.position + n < self.input.len() {
            self.input[self.position + n]
        } else {
            '\0'
        }
    }

    fn advance(&mut self) {
        if self.position < self.input.len() {
            self.position += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        loop {
            while !self.is_eof() && self.current_char().is_whitespace() {
                self.advance();
            }

            // Comments run from a semicolon to end of line
            if self.current_char() == ';' {
                self.skip_comment();
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        while !self.is_eof() && self.current_char() != '\n' {
            self.advance();
        }
        if self.current_char() == '\n' {
            self.advance();
        }
    }

    // ========================================================================
    // Strings
    // ========================================================================

    /// Scan a string literal, returning its raw text between the quotes.
    /// A backslash keeps the following character from ending the string;
    /// escapes are decoded later when the atom is built.
    fn scan_string(&mut self) -> Result<String, String> {
        self.advance();
        let mut content = String::new();

        loop {
            if self.is_eof() {
                return Err("Unterminated string literal".to_string());
            }
            let ch = self.current_char();
            self.advance();
            match ch {
                '"' => return Ok(content),
                '\\' => {
                    content.push(ch);
                    if self.is_eof() {
                        return Err("Unterminated string literal".to_string());
                    }
                    content.push(self.current_char());
                    self.advance();
                }
                _ => content.push(ch),
            }
        }
    }

    // ========================================================================
    // Numbers and Symbols
    // ========================================================================

    fn is_symbol_char(c: char) -> bool {
        c.is_alphanumeric()
            || matches!(
                c,
                '!' | '$'
                    | '%'
                    | '&'
                    | '*'
                    | '/'
                    | ':'
                    | '<'
                    | '='
                    | '>'
                    | '?'
                    | '@'
                    | '^'
                    | '_'
                    | '~'
                    | '+'
                    | '-'
                    | '\\'
            )
    }

    /// A digit run that may contain dots; validity is checked at atom
    /// construction.
    fn read_number(&mut self) -> Token {
        let mut text = String::new();
        if self.current_char() == '-' {
            text.push('-');
            self.advance();
        }
        while !self.is_eof() && (self.current_char().is_ascii_digit() || self.current_char() == '.')
        {
            text.push(self.current_char());
            self.advance();
        }
        Token::Number(text)
    }

    fn read_symbol(&mut self) -> Token {
        let mut symbol = String::new();
        while !self.is_eof() && Self::is_symbol_char(self.current_char()) {
            symbol.push(self.current_char());
            self.advance();
        }
        Token::Symbol(symbol)
    }

    // ========================================================================
    // Main Tokenization
    // ========================================================================

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        if self.is_eof() {
            return Token::Eof;
        }

        match self.current_char() {
            '(' => {
                self.advance();
                Token::LParen
            }
            ')' => {
                self.advance();
                Token::RParen
            }
            '{' => {
                self.advance();
                Token::LBrace
            }
            '}' => {
                self.advance();
                Token::RBrace
            }
            '"' => self.scan_string().map_or_else(Token::Error, Token::Str),
            ch if ch.is_ascii_digit() => self.read_number(),
            '-' if self.peek_ahead(1).is_ascii_digit() => self.read_number(),
            ch if Self::is_symbol_char(ch) => self.read_symbol(),
            _ => {
                self.advance();
                Token::Error("Unexpected character".to_string())
            }
        }
    }
}

impl Iterator for Lexer {
    type Item = Token;

    /// Yields tokens up to and including a single `Eof`.
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token == Token::Eof {
            self.finished = true;
        }
        Some(token)
    }
}

// ============================================================================
// Token Types
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBrace,
    RBrace,
    Symbol(String),
    Number(String),
    /// Raw literal text, escapes not yet decoded
    Str(String),
    Eof,
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input).collect()
    }

    fn sym(s: &str) -> Token {
        Token::Symbol(s.to_string())
    }

    fn num(s: &str) -> Token {
        Token::Number(s.to_string())
    }

    #[test]
    fn test_brackets_and_atoms() {
        assert_eq!(
            tokens("(+ 1 {x 2.5})"),
            vec![
                Token::LParen,
                sym("+"),
                num("1"),
                Token::LBrace,
                sym("x"),
                num("2.5"),
                Token::RBrace,
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_symbol_punctuation() {
        assert_eq!(
            tokens("\\ &  == <= fun! a->b"),
            vec![
                sym("\\"),
                sym("&"),
                sym("=="),
                sym("<="),
                sym("fun!"),
                sym("a->b"),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_negative_numbers() {
        assert_eq!(tokens("-5 - -x"), vec![num("-5"), sym("-"), sym("-x"), Token::Eof]);
    }

    #[test]
    fn test_number_keeps_extra_dots() {
        assert_eq!(tokens("1.2.3"), vec![num("1.2.3"), Token::Eof]);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            tokens("; leading\n1 ; trailing\n; last"),
            vec![num("1"), Token::Eof]
        );
    }

    #[test]
    fn test_string_keeps_raw_escapes() {
        assert_eq!(
            tokens(r#""say \"hi\"\n""#),
            vec![Token::Str(r#"say \"hi\"\n"#.to_string()), Token::Eof]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            tokens("\"open"),
            vec![
                Token::Error("Unterminated string literal".to_string()),
                Token::Eof
            ]
        );
        assert_eq!(
            Lexer::new("\"trailing\\").next_token(),
            Token::Error("Unterminated string literal".to_string())
        );
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(
            Lexer::new("#").next_token(),
            Token::Error("Unexpected character".to_string())
        );
    }

    #[test]
    fn test_iterator_ends_after_eof() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next(), Some(Token::Eof));
        assert_eq!(lexer.next(), None);
    }
}
