use super::Parser;
use crate::ast::{BooleanExpression, Consequence, RequirementKeyword, Value};
use crate::error::ParseError;
use crate::lexer::Token;

impl<'a> Parser<'a> {
    pub(super) fn parse_consequence(&mut self) -> Result<Consequence, ParseError> {
        self.parse_or_consequence()
    }

    fn parse_or_consequence(&mut self) -> Result<Consequence, ParseError> {
        let mut left = self.parse_and_consequence()?;
        while self.is_word("OR") {
            self.advance();
            let right = self.parse_and_consequence()?;
            left = Consequence::BooleanExpression {
                expression: BooleanExpression::Or {
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
        }
        Ok(left)
    }

    fn parse_and_consequence(&mut self) -> Result<Consequence, ParseError> {
        let mut left = self.parse_not_consequence()?;
        while self.is_word("AND") {
            self.advance();
            let right = self.parse_not_consequence()?;
            left = Consequence::BooleanExpression {
                expression: BooleanExpression::And {
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
        }
        Ok(left)
    }

    fn parse_not_consequence(&mut self) -> Result<Consequence, ParseError> {
        if self.is_word("NOT") {
            self.advance();
            let inner = self.parse_not_consequence()?;
            return Ok(Consequence::BooleanExpression {
                expression: BooleanExpression::Not {
                    inner: Box::new(inner),
                },
            });
        }
        if self.peek() == &Token::LParen {
            self.advance();
            let c = self.parse_consequence()?;
            self.expect(Token::RParen, "')'")?;
            return Ok(c);
        }
        if self.is_word("REQUIRE") || self.is_word("RECOMMEND") {
            let keyword = if self.is_word("REQUIRE") {
                RequirementKeyword::Must
            } else {
                RequirementKeyword::Should
            };
            self.advance();
            let variable = self.parse_variable("requirement")?;
            return Ok(Consequence::Requirement { variable, keyword });
        }
        self.parse_constraint()
    }

    fn parse_variable(&mut self, context: &str) -> Result<Value, ParseError> {
        match self.parse_operand()? {
            v @ Value::Variable { .. } => Ok(v),
            other => Err(self.err(format!(
                "{} needs a variable, got {}",
                context, other
            ))),
        }
    }

    fn parse_constraint(&mut self) -> Result<Consequence, ParseError> {
        let variable = self.parse_operand()?;

        if let Some(operator) = self.compare_op() {
            self.advance();
            let value = self.parse_operand()?;
            return Ok(Consequence::Constraint {
                variable,
                operator,
                value,
            });
        }

        if self.is_word("IN") {
            self.advance();
            let values = self.parse_value_list()?;
            return Ok(Consequence::InConstraint { variable, values });
        }

        if self.is_word("NOT") && matches!(self.peek_next(), Token::Word(n) if n == "IN") {
            self.advance();
            self.advance();
            let values = self.parse_value_list()?;
            return Ok(Consequence::NotInConstraint { variable, values });
        }

        if self.is_word("BETWEEN") {
            self.advance();
            let lower = self.parse_operand()?;
            self.expect_word("AND")?;
            let upper = self.parse_operand()?;
            return Ok(Consequence::BetweenConstraint {
                variable,
                lower,
                upper,
            });
        }

        match variable {
            Value::BooleanLiteral { value } => Ok(Consequence::BooleanLiteral { value }),
            v @ Value::Variable { .. } => Ok(Consequence::VariableExpression { variable: v }),
            other => Err(self.err(format!(
                "expected a constraint on {}, got {}",
                other,
                self.peek().describe()
            ))),
        }
    }
}
