use super::Parser;
use crate::ast::{CompareOp, Condition, LogicalOp, PatternOp, TemporalOp};
use crate::error::ParseError;
use crate::lexer::Token;

impl<'a> Parser<'a> {
    pub(super) fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        self.parse_or_condition()
    }

    fn parse_or_condition(&mut self) -> Result<Condition, ParseError> {
        let mut left = self.parse_and_condition()?;
        while self.is_word("OR") {
            self.advance();
            let right = self.parse_and_condition()?;
            left = Condition::Compound {
                left: Box::new(left),
                operator: LogicalOp::Or,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and_condition(&mut self) -> Result<Condition, ParseError> {
        let mut left = self.parse_not_condition()?;
        while self.is_word("AND") {
            self.advance();
            let right = self.parse_not_condition()?;
            left = Condition::Compound {
                left: Box::new(left),
                operator: LogicalOp::And,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not_condition(&mut self) -> Result<Condition, ParseError> {
        if self.is_word("NOT") {
            self.advance();
            let inner = self.parse_not_condition()?;
            return Ok(Condition::Not {
                inner: Box::new(inner),
            });
        }
        if self.peek() == &Token::LParen {
            self.advance();
            let c = self.parse_condition()?;
            self.expect(Token::RParen, "')'")?;
            return Ok(c);
        }
        self.parse_predicate()
    }

    /// A single test on an operand: comparison, list membership, pattern,
    /// temporal check, or bare truthiness.
    fn parse_predicate(&mut self) -> Result<Condition, ParseError> {
        let left = self.parse_operand()?;

        if let Some(operator) = self.compare_op() {
            self.advance();
            let right = self.parse_operand()?;
            return Ok(Condition::Simple {
                left,
                operator,
                right,
            });
        }

        let Token::Word(w) = self.peek().clone() else {
            return Ok(Condition::VariableTruthy { variable: left });
        };
        match w.as_str() {
            "IN" => {
                self.advance();
                let values = self.parse_value_list()?;
                Ok(Condition::List {
                    variable: left,
                    values,
                })
            }
            "NOT" if matches!(self.peek_next(), Token::Word(n) if n == "IN") => {
                self.advance();
                self.advance();
                let values = self.parse_value_list()?;
                Ok(Condition::Not {
                    inner: Box::new(Condition::List {
                        variable: left,
                        values,
                    }),
                })
            }
            "CONTAINS" | "MATCHES" => {
                let operator = if w == "CONTAINS" {
                    PatternOp::Contains
                } else {
                    PatternOp::Matches
                };
                self.advance();
                let pattern = self.parse_operand()?;
                Ok(Condition::Pattern {
                    variable: left,
                    operator,
                    pattern,
                })
            }
            "BEFORE" | "AFTER" => {
                let operator = if w == "BEFORE" {
                    TemporalOp::Before
                } else {
                    TemporalOp::After
                };
                self.advance();
                let value = self.parse_operand()?;
                Ok(Condition::Temporal {
                    variable: left,
                    operator,
                    value,
                })
            }
            "WITHIN" => {
                self.advance();
                let value = self.parse_duration()?;
                Ok(Condition::Temporal {
                    variable: left,
                    operator: TemporalOp::Within,
                    value,
                })
            }
            "EXPIRES" => {
                self.advance();
                self.expect_word("AFTER")?;
                let value = self.parse_duration()?;
                Ok(Condition::Temporal {
                    variable: left,
                    operator: TemporalOp::Expires,
                    value,
                })
            }
            _ => Ok(Condition::VariableTruthy { variable: left }),
        }
    }

    /// Comparison operator at the cursor, including the `LIKE` keyword.
    pub(super) fn compare_op(&self) -> Option<CompareOp> {
        match self.peek() {
            Token::Eq => Some(CompareOp::Eq),
            Token::Neq => Some(CompareOp::Neq),
            Token::Gt => Some(CompareOp::Gt),
            Token::Gte => Some(CompareOp::Gte),
            Token::Lt => Some(CompareOp::Lt),
            Token::Lte => Some(CompareOp::Lte),
            Token::Word(w) if w == "LIKE" => Some(CompareOp::Like),
            _ => None,
        }
    }
}
