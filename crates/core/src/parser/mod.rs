//! Recursive-descent parser from rule text to a typed [`Rule`].
//!
//! Grammar (keywords are upper case):
//!
//! ```text
//! rule        := WHEN condition THEN MUST (action | consequence) EOF
//! action      := (FLAG | BLOCK | NOTIFY | ESCALATE | REPORT) variable label
//! condition   := and_cond (OR and_cond)*
//! and_cond    := not_cond (AND not_cond)*
//! not_cond    := NOT not_cond | '(' condition ')' | predicate
//! consequence := same connective structure over constraints
//! ```
//!
//! The parser either returns a complete rule or a [`ParseError`]; it never
//! recovers and never hands back a partial tree.

use crate::ast::{Action, ActionType, Rule, RuleBody, Value};
use crate::error::ParseError;
use crate::lexer::{self, Spanned, Token};

mod conditions;
mod consequences;
mod operands;

pub use operands::parse_instant;

/// Words that can never be used as variable names.
const RESERVED: &[&str] = &[
    "WHEN", "THEN", "MUST", "AND", "OR", "NOT", "IN", "LIKE", "CONTAINS", "MATCHES", "BEFORE",
    "AFTER", "WITHIN", "EXPIRES", "BETWEEN", "REQUIRE", "RECOMMEND",
];

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned]) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].token
    }

    fn advance(&mut self) -> &Spanned {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        let s = self.cur();
        ParseError::new(s.line, s.column, msg)
    }

    fn is_word(&self, w: &str) -> bool {
        matches!(self.peek(), Token::Word(x) if x == w)
    }

    fn is_reserved(&self) -> bool {
        matches!(self.peek(), Token::Word(x) if RESERVED.contains(&x.as_str()))
    }

    fn expect_word(&mut self, expected: &str) -> Result<(), ParseError> {
        if self.is_word(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!(
                "expected '{}', got {}",
                expected,
                self.peek().describe()
            )))
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), ParseError> {
        if self.peek() == &token {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {}, got {}", what, self.peek().describe())))
        }
    }

    // -- Rule structure -----------------------------------------

    fn parse_rule(&mut self) -> Result<Rule, ParseError> {
        if self.peek() == &Token::Eof {
            return Err(self.err("empty rule: expected 'WHEN'"));
        }
        self.expect_word("WHEN")?;
        let condition = self.parse_condition()?;
        self.expect_word("THEN")?;
        self.expect_word("MUST")?;
        if self.peek() == &Token::Eof {
            return Err(self.err("expected a consequence or action after 'THEN MUST'"));
        }

        let body = match self.action_type() {
            Some(action_type) => RuleBody::Action(self.parse_action(action_type)?),
            None => RuleBody::Consequence(self.parse_consequence()?),
        };

        if self.peek() != &Token::Eof {
            return Err(self.err(format!(
                "unexpected {} after end of rule",
                self.peek().describe()
            )));
        }
        Ok(Rule { condition, body })
    }

    /// An action verb is only an action when a target follows it, so a
    /// variable that happens to be called `FLAG` still parses as a value.
    fn action_type(&self) -> Option<ActionType> {
        match (self.peek(), self.peek_next()) {
            (Token::Word(verb), Token::Word(_)) => ActionType::from_keyword(verb),
            _ => None,
        }
    }

    fn parse_action(&mut self, action_type: ActionType) -> Result<Action, ParseError> {
        self.advance();
        let variable = match self.parse_operand()? {
            v @ Value::Variable { .. } => v,
            other => {
                return Err(self.err(format!(
                    "{} target must be a variable, got {}",
                    action_type.as_str(),
                    other
                )))
            }
        };
        let label = match self.peek().clone() {
            Token::Word(w) if !RESERVED.contains(&w.as_str()) => {
                self.advance();
                w
            }
            Token::Str(s) => {
                self.advance();
                s
            }
            other => {
                return Err(self.err(format!(
                    "expected label after {} target, got {}",
                    action_type.as_str(),
                    other.describe()
                )))
            }
        };
        Ok(Action {
            action_type,
            variable,
            label,
        })
    }
}

/// Parse rule text into a [`Rule`].
pub fn parse(source: &str) -> Result<Rule, ParseError> {
    let tokens = lexer::lex(source)?;
    let mut p = Parser::new(&tokens);
    p.parse_rule()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        BooleanExpression, CompareOp, Condition, Consequence, DurationUnit, LogicalOp, PatternOp,
        RequirementKeyword, TemporalOp,
    };

    fn consequence(rule: &Rule) -> &Consequence {
        rule.consequence().expect("rule should carry a consequence")
    }

    #[test]
    fn parses_simple_consequence_rule() {
        let rule = parse("WHEN user.age >= 18 THEN MUST account.is_active = TRUE").unwrap();
        assert_eq!(
            rule.condition,
            Condition::Simple {
                left: Value::variable("user.age"),
                operator: CompareOp::Gte,
                right: Value::number(18),
            }
        );
        assert_eq!(
            consequence(&rule),
            &Consequence::Constraint {
                variable: Value::variable("account.is_active"),
                operator: CompareOp::Eq,
                value: Value::boolean(true),
            }
        );
        assert!(rule.action().is_none());
    }

    #[test]
    fn parses_flag_action_with_list_condition() {
        let rule = parse(
            "WHEN transaction.amount > 10000 AND transaction.country IN ['IR','KP'] \
             THEN MUST FLAG transaction as_high_risk",
        )
        .unwrap();
        match &rule.condition {
            Condition::Compound {
                operator: LogicalOp::And,
                right,
                ..
            } => assert_eq!(
                right.as_ref(),
                &Condition::List {
                    variable: Value::variable("transaction.country"),
                    values: vec![Value::string("IR"), Value::string("KP")],
                }
            ),
            other => panic!("expected AND compound, got {:?}", other),
        }
        let action = rule.action().unwrap();
        assert_eq!(action.action_type, ActionType::Flag);
        assert_eq!(action.variable, Value::variable("transaction"));
        assert_eq!(action.label, "as_high_risk");
        assert!(rule.consequence().is_none());
    }

    #[test]
    fn parses_temporal_conditions() {
        let rule = parse("WHEN session.last_activity WITHIN 30 MINUTES THEN MUST session.is_active = TRUE")
            .unwrap();
        assert_eq!(
            rule.condition,
            Condition::Temporal {
                variable: Value::variable("session.last_activity"),
                operator: TemporalOp::Within,
                value: Value::duration(30, DurationUnit::Minutes),
            }
        );

        let rule = parse("WHEN consent.granted_at EXPIRES AFTER 365 DAYS THEN MUST consent.valid").unwrap();
        assert!(matches!(
            rule.condition,
            Condition::Temporal {
                operator: TemporalOp::Expires,
                ..
            }
        ));

        let rule = parse("WHEN order.placed_at BEFORE 2024-01-01T00:00:00Z THEN MUST order.archived")
            .unwrap();
        match rule.condition {
            Condition::Temporal {
                operator: TemporalOp::Before,
                value: Value::DatetimeLiteral { value },
                ..
            } => assert_eq!(value.year(), 2024),
            other => panic!("expected BEFORE datetime, got {:?}", other),
        }
    }

    #[test]
    fn quoted_iso_instant_is_datetime() {
        let rule = parse("WHEN x AFTER '2023-06-01T08:30:00Z' THEN MUST TRUE").unwrap();
        assert!(matches!(
            rule.condition,
            Condition::Temporal {
                value: Value::DatetimeLiteral { .. },
                ..
            }
        ));
        // Without the trailing Z it stays a string.
        let rule = parse("WHEN x = '2023-06-01' THEN MUST TRUE").unwrap();
        assert!(matches!(
            rule.condition,
            Condition::Simple {
                right: Value::StringLiteral { .. },
                ..
            }
        ));
    }

    #[test]
    fn parses_pattern_conditions() {
        let rule = parse(r"WHEN email MATCHES '.*@bank\.com' THEN MUST user.is_verified = TRUE").unwrap();
        assert_eq!(
            rule.condition,
            Condition::Pattern {
                variable: Value::variable("email"),
                operator: PatternOp::Matches,
                pattern: Value::string(r".*@bank\.com"),
            }
        );
        let rule = parse("WHEN note CONTAINS 'urgent' THEN MUST TRUE").unwrap();
        assert!(matches!(
            rule.condition,
            Condition::Pattern {
                operator: PatternOp::Contains,
                ..
            }
        ));
    }

    #[test]
    fn precedence_not_and_or() {
        let rule = parse("WHEN a OR b AND NOT c THEN MUST TRUE").unwrap();
        let expected = Condition::Compound {
            left: Box::new(Condition::VariableTruthy {
                variable: Value::variable("a"),
            }),
            operator: LogicalOp::Or,
            right: Box::new(Condition::Compound {
                left: Box::new(Condition::VariableTruthy {
                    variable: Value::variable("b"),
                }),
                operator: LogicalOp::And,
                right: Box::new(Condition::Not {
                    inner: Box::new(Condition::VariableTruthy {
                        variable: Value::variable("c"),
                    }),
                }),
            }),
        };
        assert_eq!(rule.condition, expected);
    }

    #[test]
    fn parentheses_override_precedence() {
        let rule = parse("WHEN (a OR b) AND c THEN MUST TRUE").unwrap();
        match rule.condition {
            Condition::Compound {
                operator: LogicalOp::And,
                left,
                ..
            } => assert!(matches!(
                *left,
                Condition::Compound {
                    operator: LogicalOp::Or,
                    ..
                }
            )),
            other => panic!("expected AND at the root, got {:?}", other),
        }
    }

    #[test]
    fn not_in_condition_is_negated_list() {
        let rule = parse("WHEN country NOT IN ['US', 'CA'] THEN MUST review.required").unwrap();
        match rule.condition {
            Condition::Not { inner } => assert!(matches!(*inner, Condition::List { .. })),
            other => panic!("expected NOT(list), got {:?}", other),
        }
    }

    #[test]
    fn parses_consequence_forms() {
        let rule = parse("WHEN x THEN MUST account.tier IN ['gold', 'silver']").unwrap();
        assert!(matches!(consequence(&rule), Consequence::InConstraint { .. }));

        let rule = parse("WHEN x THEN MUST account.tier NOT IN ['blocked']").unwrap();
        assert!(matches!(consequence(&rule), Consequence::NotInConstraint { .. }));

        let rule = parse("WHEN x THEN MUST risk.score BETWEEN 0 AND 100").unwrap();
        assert_eq!(
            consequence(&rule),
            &Consequence::BetweenConstraint {
                variable: Value::variable("risk.score"),
                lower: Value::number(0),
                upper: Value::number(100),
            }
        );

        let rule = parse("WHEN x THEN MUST REQUIRE customer.kyc_document").unwrap();
        assert_eq!(
            consequence(&rule),
            &Consequence::Requirement {
                variable: Value::variable("customer.kyc_document"),
                keyword: RequirementKeyword::Must,
            }
        );

        let rule = parse("WHEN x THEN MUST RECOMMEND customer.phone").unwrap();
        assert!(matches!(
            consequence(&rule),
            Consequence::Requirement {
                keyword: RequirementKeyword::Should,
                ..
            }
        ));

        let rule = parse("WHEN x THEN MUST FALSE").unwrap();
        assert_eq!(consequence(&rule), &Consequence::BooleanLiteral { value: false });

        let rule = parse("WHEN x THEN MUST account.verified").unwrap();
        assert!(matches!(
            consequence(&rule),
            Consequence::VariableExpression { .. }
        ));
    }

    #[test]
    fn parses_boolean_consequence() {
        let rule = parse("WHEN x THEN MUST a.ok = TRUE AND NOT (b.flagged OR c.blocked)").unwrap();
        match consequence(&rule) {
            Consequence::BooleanExpression {
                expression: BooleanExpression::And { right, .. },
            } => assert!(matches!(
                right.as_ref(),
                Consequence::BooleanExpression {
                    expression: BooleanExpression::Not { .. }
                }
            )),
            other => panic!("expected AND expression, got {:?}", other),
        }
    }

    #[test]
    fn between_binds_its_own_and() {
        let rule = parse("WHEN x THEN MUST v BETWEEN 1 AND 5 AND w = 2").unwrap();
        match consequence(&rule) {
            Consequence::BooleanExpression {
                expression: BooleanExpression::And { left, .. },
            } => assert!(matches!(left.as_ref(), Consequence::BetweenConstraint { .. })),
            other => panic!("expected AND expression, got {:?}", other),
        }
    }

    #[test]
    fn parses_builtin_functions() {
        let rule = parse("WHEN deadline BEFORE NOW() AND created AFTER TODAY THEN MUST TRUE").unwrap();
        match rule.condition {
            Condition::Compound { left, right, .. } => {
                assert!(matches!(
                    *left,
                    Condition::Temporal {
                        value: Value::FunctionCall { ref name },
                        ..
                    } if name == "NOW"
                ));
                assert!(matches!(
                    *right,
                    Condition::Temporal {
                        value: Value::FunctionCall { ref name },
                        ..
                    } if name == "TODAY"
                ));
            }
            other => panic!("expected compound, got {:?}", other),
        }
    }

    #[test]
    fn null_literal_and_lowercase_booleans() {
        let rule = parse("WHEN user.manager = NULL THEN MUST user.escalated = true").unwrap();
        assert!(matches!(
            rule.condition,
            Condition::Simple {
                right: Value::NullLiteral,
                ..
            }
        ));
        assert_eq!(
            consequence(&rule),
            &Consequence::Constraint {
                variable: Value::Variable {
                    path: "user.escalated".to_string()
                },
                operator: CompareOp::Eq,
                value: Value::BooleanLiteral { value: true },
            }
        );
        let rule = parse("WHEN x = null THEN MUST false").unwrap();
        assert!(matches!(
            rule.condition,
            Condition::Simple {
                right: Value::NullLiteral,
                ..
            }
        ));
        assert_eq!(consequence(&rule), &Consequence::BooleanLiteral { value: false });
    }

    #[test]
    fn rule_may_span_lines() {
        let src = "WHEN user.age >= 18\n  AND user.country = 'DE'\nTHEN MUST account.is_active = TRUE";
        assert!(parse(src).is_ok());
    }

    // -- Rejections -------------------------------------------

    fn assert_rejected(src: &str) -> ParseError {
        match parse(src) {
            Ok(rule) => panic!("expected ParseError for {:?}, got {:?}", src, rule),
            Err(e) => e,
        }
    }

    #[test]
    fn rejects_malformed_rules() {
        let e = assert_rejected("");
        assert_eq!((e.line, e.column), (1, 1));

        let e = assert_rejected("INVALID SYNTAX");
        assert!(e.message.contains("expected 'WHEN'"), "{}", e.message);

        let e = assert_rejected("WHEN condition THEN");
        assert!(e.message.contains("expected 'MUST'"), "{}", e.message);

        let e = assert_rejected("WHEN user.age >= 18 THEN MUST");
        assert!(e.message.contains("after 'THEN MUST'"), "{}", e.message);
    }

    #[test]
    fn rejects_missing_then() {
        let e = assert_rejected("WHEN user.age >= 18 MUST x = 1");
        assert!(e.message.contains("expected 'THEN'"), "{}", e.message);
        assert_eq!(e.column, 21);
    }

    #[test]
    fn rejects_unbalanced_brackets() {
        let e = assert_rejected("WHEN c IN ['a', 'b' THEN MUST TRUE");
        assert!(e.message.contains("']'"), "{}", e.message);

        let e = assert_rejected("WHEN (a AND b THEN MUST TRUE");
        assert!(e.message.contains("')'"), "{}", e.message);

        assert_rejected("WHEN a AND b) THEN MUST TRUE");
        assert_rejected("WHEN c IN 'a', 'b'] THEN MUST TRUE");
    }

    #[test]
    fn rejects_incomplete_operators() {
        assert_rejected("WHEN x > THEN MUST TRUE");
        assert_rejected("WHEN x WITHIN 'soon' THEN MUST TRUE");
        assert_rejected("WHEN x WITHIN 1.5 HOURS THEN MUST TRUE");
        assert_rejected("WHEN x EXPIRES 3 DAYS THEN MUST TRUE");
        assert_rejected("WHEN x THEN MUST v BETWEEN 1");
        assert_rejected("WHEN x THEN MUST FLAG transaction");
        assert_rejected("WHEN x THEN MUST FLAG 'txn' suspicious");
    }

    #[test]
    fn rejects_trailing_tokens() {
        let e = assert_rejected("WHEN x THEN MUST y = 1 z");
        assert!(e.message.contains("after end of rule"), "{}", e.message);
    }

    #[test]
    fn rejects_invalid_datetime() {
        let e = assert_rejected("WHEN x BEFORE 2024-13-45T00:00:00Z THEN MUST TRUE");
        assert!(e.message.contains("datetime"), "{}", e.message);
    }

    #[test]
    fn error_reports_line_of_failure() {
        let e = assert_rejected("WHEN a = 1\nTHEN MUST\n  b = ");
        assert_eq!(e.line, 3);
    }

    #[test]
    fn canonical_text_reparses_to_same_rule() {
        let sources = [
            "WHEN user.age >= 18 THEN MUST account.is_active = TRUE",
            "WHEN transaction.amount > 10000.50 AND NOT transaction.country IN ['IR', 'KP'] THEN MUST FLAG transaction as_high_risk",
            "WHEN s.last WITHIN 30 MINUTES OR s.pinned THEN MUST REQUIRE s.owner",
            "WHEN d BEFORE NOW() THEN MUST v BETWEEN -1 AND 1 OR name LIKE 'a%'",
            "WHEN t AFTER 2024-01-01T00:00:00Z THEN MUST note = 'it''s fine'",
        ];
        for src in sources {
            let rule = parse(src).unwrap();
            let rendered = rule.to_string();
            let reparsed = parse(&rendered)
                .unwrap_or_else(|e| panic!("re-parse of {:?} failed: {}", rendered, e));
            assert_eq!(reparsed, rule, "canonical text: {}", rendered);
        }
    }
}
