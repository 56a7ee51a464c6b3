//! Recursive descent parser for filter expressions.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::ast::{Concatenator, FilterNode, FilterValue};
use super::error::{FilterError, FilterResult};
use super::fields::resolve_field;
use super::lexer::{FilterToken, Lexer, LexerError, PositionedToken};
use super::value::{coerce_list, coerce_scalar, parse_timezone, RawValue, ValueContext};

/// Parser for task filter expressions.
///
/// # Grammar
///
/// ```text
/// list    ::= operand (("&&" | "||") operand)*
/// operand ::= "(" list ")" | clause
/// clause  ::= field comparator value
/// value   ::= everything up to the next "&&", "||" or group-closing ")"
/// ```
///
/// There is no operator precedence: nodes are kept in source order and each
/// remembers the operator that joined it to its predecessor. Parentheses are
/// the only way to group.
///
/// # Example
///
/// ```
/// use taskview_core::filter::FilterParser;
///
/// let nodes = FilterParser::parse("priority != 3", "UTC").unwrap();
/// assert_eq!(nodes.len(), 1);
/// assert_eq!(nodes[0].field_name(), Some("priority"));
/// ```
pub struct FilterParser<'a> {
    input: &'a str,
    tokens: Vec<PositionedToken>,
    position: usize,
    ctx: ValueContext,
}

impl<'a> FilterParser<'a> {
    /// Parses a filter string, evaluating `now` at the current time.
    ///
    /// # Arguments
    ///
    /// * `input` - The filter expression
    /// * `timezone` - IANA timezone for dates without an offset (`""` = UTC)
    ///
    /// # Errors
    ///
    /// Returns a `FilterError` describing the first problem found.
    pub fn parse(input: &'a str, timezone: &str) -> FilterResult<Vec<FilterNode>> {
        Self::parse_at(input, timezone, Utc::now())
    }

    /// Parses a filter string with an explicit reference time for `now`.
    ///
    /// # Errors
    ///
    /// Returns a `FilterError` describing the first problem found.
    pub fn parse_at(
        input: &'a str,
        timezone: &str,
        now: DateTime<Utc>,
    ) -> FilterResult<Vec<FilterNode>> {
        let tz = parse_timezone(timezone)?;

        if input.trim().is_empty() {
            return Err(FilterError::EmptyExpression);
        }

        let lexed = Lexer::new(input).tokenize_with_errors();
        if let Some(error) = lexed.errors.first() {
            return Err(match error {
                LexerError::UnterminatedQuote { position } => FilterError::UnterminatedQuote {
                    position: *position,
                },
            });
        }

        let mut parser = Self {
            input,
            tokens: lexed.tokens,
            position: 0,
            ctx: ValueContext { now, tz },
        };
        let nodes = parser.parse_list(0)?;

        // Check that we consumed all tokens
        if let Some(remaining) = parser.peek() {
            return Err(FilterError::unexpected_token(
                remaining.token.describe(),
                remaining.position,
            ));
        }

        debug!(filter = input, nodes = nodes.len(), "parsed filter");
        Ok(nodes)
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&PositionedToken> {
        self.tokens.get(self.position)
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Option<PositionedToken> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Parses operands joined by `&&` / `||` until the end of input or, when
    /// nested, the closing parenthesis (which is left for the caller).
    fn parse_list(&mut self, depth: usize) -> FilterResult<Vec<FilterNode>> {
        let mut nodes = Vec::new();
        let mut concatenator = Concatenator::And;

        loop {
            nodes.push(self.parse_operand(concatenator, depth)?);

            match self.peek().map(|t| &t.token) {
                Some(FilterToken::And) => {
                    self.advance();
                    concatenator = Concatenator::And;
                }
                Some(FilterToken::Or) => {
                    self.advance();
                    concatenator = Concatenator::Or;
                }
                _ => return Ok(nodes),
            }
        }
    }

    /// Parses a group or a clause.
    fn parse_operand(
        &mut self,
        concatenator: Concatenator,
        depth: usize,
    ) -> FilterResult<FilterNode> {
        let token = self.advance().ok_or_else(|| self.end_of_input_error())?;

        match token.token {
            FilterToken::OpenParen => {
                if matches!(self.peek().map(|t| &t.token), Some(FilterToken::CloseParen)) {
                    let close = self.advance().ok_or(FilterError::UnclosedParenthesis)?;
                    return Err(FilterError::unexpected_token(")", close.position));
                }
                let nodes = self.parse_list(depth + 1)?;
                match self.advance() {
                    Some(PositionedToken {
                        token: FilterToken::CloseParen,
                        ..
                    }) => Ok(FilterNode::Group {
                        nodes,
                        concatenator,
                    }),
                    _ => Err(FilterError::UnclosedParenthesis),
                }
            }
            FilterToken::Word(name) => self.parse_clause(&name, concatenator),
            other => Err(FilterError::unexpected_token(
                other.describe(),
                token.position,
            )),
        }
    }

    /// Error for input that ends where an operand was expected.
    fn end_of_input_error(&self) -> FilterError {
        match self.tokens.last() {
            Some(last) => FilterError::unexpected_token(last.token.describe(), last.position),
            None => FilterError::EmptyExpression,
        }
    }

    /// Parses `comparator value` after a field name.
    fn parse_clause(
        &mut self,
        name: &str,
        concatenator: Concatenator,
    ) -> FilterResult<FilterNode> {
        let field = resolve_field(name)?;

        let comparator = match self.advance() {
            Some(PositionedToken {
                token: FilterToken::Comparator(c),
                ..
            }) => c,
            _ => {
                return Err(FilterError::MissingComparator {
                    field: name.to_string(),
                })
            }
        };

        let raw = self.read_value().ok_or_else(|| FilterError::MissingValue {
            field: name.to_string(),
        })?;

        let value = if comparator.takes_list() {
            coerce_list(&raw, &self.ctx)?
        } else {
            FilterValue::Single(coerce_scalar(&raw, &self.ctx)?)
        };

        if let FilterValue::List(items) = &value {
            if items.is_empty() {
                return Err(FilterError::MissingValue {
                    field: name.to_string(),
                });
            }
        }

        Ok(FilterNode::Field {
            field,
            comparator,
            value,
            concatenator,
        })
    }

    /// Reads the raw value: every token up to the next logical operator or
    /// the parenthesis closing the enclosing group.
    ///
    /// A lone quoted token is returned as quoted text; anything longer is
    /// returned as the exact source slice, so inner whitespace survives.
    fn read_value(&mut self) -> Option<RawValue> {
        let start = self.position;
        let mut paren_depth = 0usize;

        while let Some(token) = self.peek() {
            match token.token {
                FilterToken::And | FilterToken::Or if paren_depth == 0 => break,
                FilterToken::CloseParen if paren_depth == 0 => break,
                FilterToken::OpenParen => paren_depth += 1,
                FilterToken::CloseParen => paren_depth -= 1,
                _ => {}
            }
            self.position += 1;
        }

        let tokens = &self.tokens[start..self.position];
        if let [PositionedToken {
            token: FilterToken::Quoted(text),
            ..
        }] = tokens
        {
            return Some(RawValue::Quoted(text.clone()));
        }

        let (first, last) = (tokens.first()?, tokens.last()?);
        Some(RawValue::Bare(
            self.input[first.position..last.end].to_string(),
        ))
    }
}
