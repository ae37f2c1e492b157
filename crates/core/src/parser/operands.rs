use std::str::FromStr;

use rust_decimal::Decimal;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::Parser;
use crate::ast::{DurationUnit, Value};
use crate::error::ParseError;
use crate::lexer::Token;

/// Parse an ISO-8601 instant. A bare date is read as midnight UTC.
pub fn parse_instant(text: &str) -> Option<OffsetDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(dt);
    }
    if text.len() == 10 {
        return OffsetDateTime::parse(&format!("{}T00:00:00Z", text), &Rfc3339).ok();
    }
    None
}

impl<'a> Parser<'a> {
    pub(super) fn parse_operand(&mut self) -> Result<Value, ParseError> {
        match self.peek().clone() {
            Token::Str(s) => {
                self.advance();
                // Quoted ISO instants in UTC are datetimes, everything else is text.
                if s.ends_with('Z') {
                    if let Ok(value) = OffsetDateTime::parse(&s, &Rfc3339) {
                        return Ok(Value::DatetimeLiteral { value });
                    }
                }
                Ok(Value::StringLiteral { value: s })
            }
            Token::Number(n) => self.parse_number_or_duration(&n),
            Token::DateTime(d) => {
                let value = parse_instant(&d)
                    .ok_or_else(|| self.err(format!("invalid datetime literal '{}'", d)))?;
                self.advance();
                Ok(Value::DatetimeLiteral { value })
            }
            Token::Word(w) => self.parse_word_operand(w),
            other => Err(self.err(format!("expected a value, got {}", other.describe()))),
        }
    }

    fn parse_number_or_duration(&mut self, text: &str) -> Result<Value, ParseError> {
        let value = Decimal::from_str(text)
            .map_err(|e| self.err(format!("invalid number '{}': {}", text, e)))?;
        self.advance();

        let unit = match self.peek() {
            Token::Word(w) => DurationUnit::from_keyword(w),
            _ => None,
        };
        let Some(unit) = unit else {
            return Ok(Value::NumberLiteral { value });
        };
        let amount = text
            .parse::<i64>()
            .map_err(|_| self.err(format!("duration magnitude must be an integer, got {}", text)))?;
        self.advance();
        Ok(Value::DurationLiteral { amount, unit })
    }

    fn parse_word_operand(&mut self, word: String) -> Result<Value, ParseError> {
        if self.is_reserved() {
            return Err(self.err(format!("expected a value, got keyword '{}'", word)));
        }
        if word.eq_ignore_ascii_case("true") {
            self.advance();
            return Ok(Value::BooleanLiteral { value: true });
        }
        if word.eq_ignore_ascii_case("false") {
            self.advance();
            return Ok(Value::BooleanLiteral { value: false });
        }
        if word.eq_ignore_ascii_case("null") {
            self.advance();
            return Ok(Value::NullLiteral);
        }
        self.advance();

        // NAME() is a function call; NOW and TODAY may omit the parentheses.
        if self.peek() == &Token::LParen {
            if word.contains('.') {
                return Err(self.err(format!("'{}' is not a function name", word)));
            }
            self.advance();
            self.expect(Token::RParen, "')' to close function call")?;
            return Ok(Value::FunctionCall { name: word });
        }
        if word == "NOW" || word == "TODAY" {
            return Ok(Value::FunctionCall { name: word });
        }
        Ok(Value::Variable { path: word })
    }

    /// `[v, v, ...]`. An empty list is allowed.
    pub(super) fn parse_value_list(&mut self) -> Result<Vec<Value>, ParseError> {
        self.expect(Token::LBracket, "'[' to open value list")?;
        let mut values = Vec::new();
        if self.peek() == &Token::RBracket {
            self.advance();
            return Ok(values);
        }
        loop {
            values.push(self.parse_operand()?);
            match self.peek() {
                Token::Comma => {
                    self.advance();
                }
                Token::RBracket => {
                    self.advance();
                    return Ok(values);
                }
                other => {
                    return Err(self.err(format!(
                        "expected ',' or ']' in value list, got {}",
                        other.describe()
                    )))
                }
            }
        }
    }

    pub(super) fn parse_duration(&mut self) -> Result<Value, ParseError> {
        match self.parse_operand()? {
            d @ Value::DurationLiteral { .. } => Ok(d),
            other => Err(self.err(format!(
                "expected a duration such as '30 MINUTES', got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_date_is_midnight_utc() {
        let dt = parse_instant("2024-02-29").unwrap();
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.offset(), time::UtcOffset::UTC);
        assert!(parse_instant("2024-02-30").is_none());
    }

    #[test]
    fn offset_instants_parse() {
        let dt = parse_instant("2024-01-01T10:00:00+02:00").unwrap();
        assert_eq!(dt.to_offset(time::UtcOffset::UTC).hour(), 8);
    }
}
