use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers, dotted paths and keywords. Distinguished in the parser.
    Word(String),
    /// Single-quoted string literal (content without quotes)
    Str(String),
    /// Numeric literal, kept as text to preserve exact representation
    Number(String),
    /// Bare ISO-8601 instant, e.g. 2024-01-01T00:00:00Z
    DateTime(String),
    // Punctuation
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    // Comparison operators
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    // End of input
    Eof,
}

impl Token {
    /// Human-readable rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Word(w) => format!("'{}'", w),
            Token::Str(s) => format!("string '{}'", s),
            Token::Number(n) => format!("number {}", n),
            Token::DateTime(d) => format!("datetime {}", d),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Eq => "'='".to_string(),
            Token::Neq => "'!='".to_string(),
            Token::Lt => "'<'".to_string(),
            Token::Lte => "'<='".to_string(),
            Token::Gt => "'>'".to_string(),
            Token::Gte => "'>='".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
    pub column: u32,
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Cursor {
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn looks_like_date(&self) -> bool {
        (0..4).all(|i| self.peek_at(i).is_some_and(|c| c.is_ascii_digit()))
            && self.peek_at(4) == Some('-')
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn lex(src: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let mut cur = Cursor {
        chars: src.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
    };

    while let Some(c) = cur.peek_at(0) {
        // Line comment
        if c == '-' && cur.peek_at(1) == Some('-') {
            while cur.peek_at(0).is_some_and(|c| c != '\n') {
                cur.bump();
            }
            continue;
        }

        if c.is_whitespace() {
            cur.bump();
            continue;
        }

        let (line, column) = (cur.line, cur.column);
        let mut push = |token: Token| tokens.push(Spanned { token, line, column });

        // String literal. '' and \' escape a quote; any other backslash
        // sequence is kept verbatim so regex patterns survive.
        if c == '\'' {
            cur.bump();
            let mut s = String::new();
            loop {
                match cur.bump() {
                    None => {
                        return Err(ParseError::new(
                            line,
                            column,
                            "unterminated string literal",
                        ))
                    }
                    Some('\'') => {
                        if cur.peek_at(0) == Some('\'') {
                            cur.bump();
                            s.push('\'');
                        } else {
                            break;
                        }
                    }
                    Some('\\') if cur.peek_at(0) == Some('\'') => {
                        cur.bump();
                        s.push('\'');
                    }
                    Some(other) => s.push(other),
                }
            }
            push(Token::Str(s));
            continue;
        }

        // Bare datetime: 2024-01-01 or 2024-01-01T10:00:00Z / +02:00
        if cur.looks_like_date() {
            let mut s = String::new();
            while let Some(d) = cur.peek_at(0) {
                if d.is_ascii_alphanumeric() || matches!(d, '-' | ':' | '.' | '+') {
                    s.push(d);
                    cur.bump();
                } else {
                    break;
                }
            }
            push(Token::DateTime(s));
            continue;
        }

        // Number
        if c.is_ascii_digit() || (c == '-' && cur.peek_at(1).is_some_and(|d| d.is_ascii_digit()))
        {
            let mut s = String::new();
            if c == '-' {
                s.push('-');
                cur.bump();
            }
            while let Some(d) = cur.peek_at(0).filter(|d| d.is_ascii_digit()) {
                s.push(d);
                cur.bump();
            }
            if cur.peek_at(0) == Some('.') && cur.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
                s.push('.');
                cur.bump();
                while let Some(d) = cur.peek_at(0).filter(|d| d.is_ascii_digit()) {
                    s.push(d);
                    cur.bump();
                }
            }
            if cur.peek_at(0).is_some_and(is_ident_start) {
                return Err(ParseError::new(
                    line,
                    column,
                    format!("invalid numeric literal starting '{}'", s),
                ));
            }
            push(Token::Number(s));
            continue;
        }

        // Identifier, keyword or dotted path
        if is_ident_start(c) {
            let mut s = String::new();
            loop {
                while let Some(d) = cur.peek_at(0).filter(|d| is_ident_char(*d)) {
                    s.push(d);
                    cur.bump();
                }
                if cur.peek_at(0) == Some('.') && cur.peek_at(1).is_some_and(is_ident_char) {
                    s.push('.');
                    cur.bump();
                    continue;
                }
                break;
            }
            push(Token::Word(s));
            continue;
        }

        let token = match (c, cur.peek_at(1)) {
            ('!', Some('=')) | ('<', Some('>')) => {
                cur.bump();
                Token::Neq
            }
            ('<', Some('=')) => {
                cur.bump();
                Token::Lte
            }
            ('>', Some('=')) => {
                cur.bump();
                Token::Gte
            }
            ('=', Some('=')) => {
                cur.bump();
                Token::Eq
            }
            ('=', _) => Token::Eq,
            ('<', _) => Token::Lt,
            ('>', _) => Token::Gt,
            ('[', _) => Token::LBracket,
            (']', _) => Token::RBracket,
            ('(', _) => Token::LParen,
            (')', _) => Token::RParen,
            (',', _) => Token::Comma,
            _ => {
                return Err(ParseError::new(
                    line,
                    column,
                    format!("unexpected character '{}'", c),
                ))
            }
        };
        cur.bump();
        push(token);
    }

    tokens.push(Spanned {
        token: Token::Eof,
        line: cur.line,
        column: cur.column,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        lex(src)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn lexes_comparison_rule() {
        assert_eq!(
            kinds("WHEN user.age >= 18"),
            vec![
                Token::Word("WHEN".into()),
                Token::Word("user.age".into()),
                Token::Gte,
                Token::Number("18".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let toks = lex("WHEN\n  x = 1").unwrap();
        assert_eq!((toks[1].line, toks[1].column), (2, 3));
        assert_eq!((toks[2].line, toks[2].column), (2, 5));
        assert_eq!((toks[3].line, toks[3].column), (2, 7));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(kinds("'it''s'")[0], Token::Str("it's".into()));
        assert_eq!(kinds(r"'it\'s'")[0], Token::Str("it's".into()));
        assert_eq!(
            kinds(r"'.*@bank\.com'")[0],
            Token::Str(r".*@bank\.com".into())
        );
    }

    #[test]
    fn unterminated_string_reports_start() {
        let err = lex("WHEN x = 'abc").unwrap_err();
        assert_eq!((err.line, err.column), (1, 10));
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn bare_datetime_and_negative_number() {
        assert_eq!(
            kinds("2024-03-01T12:00:00Z -4.25"),
            vec![
                Token::DateTime("2024-03-01T12:00:00Z".into()),
                Token::Number("-4.25".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("x -- trailing note\n= 1"),
            vec![
                Token::Word("x".into()),
                Token::Eq,
                Token::Number("1".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn rejects_stray_characters() {
        let err = lex("WHEN x ? 1").unwrap_err();
        assert_eq!(err.column, 8);
        assert!(lex("WHEN x ! 1").is_err());
    }

    #[test]
    fn rejects_identifier_glued_to_number() {
        assert!(lex("12abc").is_err());
    }
}
