//! Lexer (tokenizer) for filter expressions.

use std::iter::Peekable;
use std::str::CharIndices;

use super::ast::Comparator;

/// Error encountered during lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexerError {
    /// A quote was opened but never closed.
    UnterminatedQuote {
        /// Byte offset of the opening quote.
        position: usize,
    },
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexerError::UnterminatedQuote { position } => {
                write!(f, "unterminated quote at position {}", position)
            }
        }
    }
}

impl std::error::Error for LexerError {}

/// Result of tokenizing a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerResult {
    /// The tokens successfully scanned, with their spans.
    pub tokens: Vec<PositionedToken>,
    /// Any errors encountered.
    pub errors: Vec<LexerError>,
}

/// A token with its byte span in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken {
    /// The token.
    pub token: FilterToken,
    /// Byte offset where the token starts.
    pub position: usize,
    /// Byte offset just past the token.
    pub end: usize,
}

/// A token in a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterToken {
    /// An unquoted run of characters (field name or value fragment).
    Word(String),

    /// A quoted string, without its quotes.
    Quoted(String),

    /// A comparison operator.
    Comparator(Comparator),

    /// The AND operator (`&&`).
    And,

    /// The OR operator (`||`).
    Or,

    /// Opening parenthesis `(`.
    OpenParen,

    /// Closing parenthesis `)`.
    CloseParen,
}

impl FilterToken {
    /// Returns a short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            FilterToken::Word(w) => w.clone(),
            FilterToken::Quoted(q) => format!("'{}'", q),
            FilterToken::Comparator(c) => c.as_str().to_string(),
            FilterToken::And => "&&".to_string(),
            FilterToken::Or => "||".to_string(),
            FilterToken::OpenParen => "(".to_string(),
            FilterToken::CloseParen => ")".to_string(),
        }
    }
}

/// Lexer for tokenizing filter expressions.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    /// Errors encountered during tokenization.
    errors: Vec<LexerError>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            errors: Vec::new(),
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    /// Peeks at the character after the next one.
    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    /// Consumes the next character.
    fn next_char(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    /// Returns the byte offset of the next character.
    fn current_position(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(i, _)| *i)
            .unwrap_or(self.input.len())
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Returns true if the upcoming characters end the current word.
    fn at_word_boundary(&mut self) -> bool {
        match self.peek() {
            None => true,
            Some(c) if c.is_whitespace() => true,
            Some('(' | ')' | '=' | '<' | '>') => true,
            Some('!') => self.peek_second() == Some('='),
            Some('&') => self.peek_second() == Some('&'),
            Some('|') => self.peek_second() == Some('|'),
            Some(_) => false,
        }
    }

    /// Reads an unquoted word. Quote characters inside a word are literal.
    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while !self.at_word_boundary() {
            if let Some(c) = self.next_char() {
                word.push(c);
            }
        }
        word
    }

    /// Reads a quoted string verbatim. Returns `None` if it is never closed.
    fn read_quoted_string(&mut self, quote_char: char) -> Option<String> {
        // Consume the opening quote
        self.next_char();

        let mut result = String::new();
        while let Some(c) = self.next_char() {
            if c == quote_char {
                return Some(result);
            }
            result.push(c);
        }
        None
    }

    /// Tries to extend a `not` word into the `not in` comparator.
    fn try_not_in(&mut self) -> bool {
        let mut ahead = self.chars.clone();
        let mut saw_space = false;
        while let Some((_, c)) = ahead.peek() {
            if c.is_whitespace() {
                saw_space = true;
                ahead.next();
            } else {
                break;
            }
        }
        if !saw_space {
            return false;
        }

        let mut word = String::new();
        let mut probe = ahead.clone();
        while let Some((_, c)) = probe.peek() {
            if c.is_alphanumeric() || *c == '_' {
                word.push(*c);
                probe.next();
            } else {
                break;
            }
        }
        let boundary = match probe.peek() {
            None => true,
            Some((_, c)) => c.is_whitespace() || matches!(c, '(' | '\'' | '"'),
        };

        if word.eq_ignore_ascii_case("in") && boundary {
            self.chars = probe;
            true
        } else {
            false
        }
    }

    /// Returns the next token with its span, or None at end of input.
    pub fn next_token(&mut self) -> Option<PositionedToken> {
        self.skip_whitespace();

        let c = self.peek()?;
        let start = self.current_position();

        let token = match c {
            // Logical operators
            '&' if self.peek_second() == Some('&') => {
                self.next_char();
                self.next_char();
                FilterToken::And
            }
            '|' if self.peek_second() == Some('|') => {
                self.next_char();
                self.next_char();
                FilterToken::Or
            }

            // Grouping
            '(' => {
                self.next_char();
                FilterToken::OpenParen
            }
            ')' => {
                self.next_char();
                FilterToken::CloseParen
            }

            // Symbolic comparators, longest match first
            '!' if self.peek_second() == Some('=') => {
                self.next_char();
                self.next_char();
                FilterToken::Comparator(Comparator::NotEquals)
            }
            '=' => {
                self.next_char();
                FilterToken::Comparator(Comparator::Equals)
            }
            '>' => {
                self.next_char();
                if self.peek() == Some('=') {
                    self.next_char();
                    FilterToken::Comparator(Comparator::GreaterEquals)
                } else {
                    FilterToken::Comparator(Comparator::Greater)
                }
            }
            '<' => {
                self.next_char();
                if self.peek() == Some('=') {
                    self.next_char();
                    FilterToken::Comparator(Comparator::LessEquals)
                } else {
                    FilterToken::Comparator(Comparator::Less)
                }
            }

            // Quoted strings
            '"' | '\'' => match self.read_quoted_string(c) {
                Some(text) => FilterToken::Quoted(text),
                None => {
                    self.errors
                        .push(LexerError::UnterminatedQuote { position: start });
                    return None;
                }
            },

            // Words and keyword comparators
            _ => {
                let word = self.read_word();
                match word.to_lowercase().as_str() {
                    "like" => FilterToken::Comparator(Comparator::Like),
                    "in" => FilterToken::Comparator(Comparator::In),
                    "not" if self.try_not_in() => FilterToken::Comparator(Comparator::NotIn),
                    _ => FilterToken::Word(word),
                }
            }
        };

        Some(PositionedToken {
            token,
            position: start,
            end: self.current_position(),
        })
    }

    /// Collects all tokens into a vector (without spans).
    #[cfg(test)]
    pub fn tokenize(self) -> Vec<FilterToken> {
        self.tokenize_with_errors()
            .tokens
            .into_iter()
            .map(|pt| pt.token)
            .collect()
    }

    /// Collects all tokens and any errors encountered.
    ///
    /// Scanning stops at the first unterminated quote, since everything after
    /// it belongs to the unclosed string.
    pub fn tokenize_with_errors(mut self) -> LexerResult {
        let mut tokens = Vec::new();
        while let Some(positioned_token) = self.next_token() {
            tokens.push(positioned_token);
        }
        LexerResult {
            tokens,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> FilterToken {
        FilterToken::Word(s.to_string())
    }

    #[test]
    fn test_tokenize_simple_clause() {
        let tokens = Lexer::new("priority != 3").tokenize();
        assert_eq!(
            tokens,
            vec![
                word("priority"),
                FilterToken::Comparator(Comparator::NotEquals),
                word("3"),
            ]
        );
    }

    #[test]
    fn test_tokenize_comparators_longest_match() {
        let cases = [
            ("a = 1", Comparator::Equals),
            ("a != 1", Comparator::NotEquals),
            ("a > 1", Comparator::Greater),
            ("a >= 1", Comparator::GreaterEquals),
            ("a < 1", Comparator::Less),
            ("a <= 1", Comparator::LessEquals),
            ("a like 1", Comparator::Like),
            ("a in 1", Comparator::In),
            ("a not in 1", Comparator::NotIn),
            ("a NOT IN 1", Comparator::NotIn),
        ];
        for (input, expected) in cases {
            let tokens = Lexer::new(input).tokenize();
            assert_eq!(tokens[1], FilterToken::Comparator(expected), "{input}");
            assert_eq!(tokens.len(), 3, "{input}");
        }
    }

    #[test]
    fn test_tokenize_without_spaces() {
        let tokens = Lexer::new("priority>=4&&done=false").tokenize();
        assert_eq!(
            tokens,
            vec![
                word("priority"),
                FilterToken::Comparator(Comparator::GreaterEquals),
                word("4"),
                FilterToken::And,
                word("done"),
                FilterToken::Comparator(Comparator::Equals),
                word("false"),
            ]
        );
    }

    #[test]
    fn test_tokenize_logical_operators() {
        let tokens = Lexer::new("a = 1 || b = 2 && c = 3").tokenize();
        assert_eq!(tokens[3], FilterToken::Or);
        assert_eq!(tokens[7], FilterToken::And);
    }

    #[test]
    fn test_single_ampersand_is_word_character() {
        let tokens = Lexer::new("title = R&D").tokenize();
        assert_eq!(tokens[2], word("R&D"));
    }

    #[test]
    fn test_tokenize_quoted_keeps_other_quote() {
        let tokens = Lexer::new(r#"title = "it's here""#).tokenize();
        assert_eq!(tokens[2], FilterToken::Quoted("it's here".to_string()));

        let tokens = Lexer::new(r#"title = 'say "hi"'"#).tokenize();
        assert_eq!(tokens[2], FilterToken::Quoted(r#"say "hi""#.to_string()));
    }

    #[test]
    fn test_quote_inside_word_is_literal() {
        let tokens = Lexer::new("title = it's").tokenize();
        assert_eq!(tokens[2], word("it's"));
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        let result = Lexer::new("title = 'open").tokenize_with_errors();
        assert_eq!(
            result.errors,
            vec![LexerError::UnterminatedQuote { position: 8 }]
        );
    }

    #[test]
    fn test_not_without_in_is_word() {
        let tokens = Lexer::new("title = not done").tokenize();
        assert_eq!(tokens[2], word("not"));
        assert_eq!(tokens[3], word("done"));
    }

    #[test]
    fn test_in_inside_word_is_not_comparator() {
        let tokens = Lexer::new("title = inbox").tokenize();
        assert_eq!(tokens[2], word("inbox"));
    }

    #[test]
    fn test_parentheses() {
        let tokens = Lexer::new("(done = true)").tokenize();
        assert_eq!(tokens.first(), Some(&FilterToken::OpenParen));
        assert_eq!(tokens.last(), Some(&FilterToken::CloseParen));
    }

    #[test]
    fn test_token_spans() {
        let result = Lexer::new("title = foo  bar").tokenize_with_errors();
        let spans: Vec<(usize, usize)> =
            result.tokens.iter().map(|t| (t.position, t.end)).collect();
        assert_eq!(spans, vec![(0, 5), (6, 7), (8, 11), (13, 16)]);
    }

    #[test]
    fn test_relative_date_is_one_word() {
        let tokens = Lexer::new("due_date < now+30d").tokenize();
        assert_eq!(tokens[2], word("now+30d"));
    }
}
