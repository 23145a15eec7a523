//! Boolean query syntax.
//!
//! A query line is lexed into terms, quoted phrases, `AND` / `OR` / `NOT`
//! (upper case only) and parentheses, then converted to postfix form with the
//! shunting-yard algorithm. Precedence is `NOT > AND > OR`; binary operators
//! are left-associative. Two operands with nothing between them are joined
//! by an implicit `AND`.

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Not,
    And,
    Or,
}

impl Operator {
    fn precedence(self) -> u8 {
        match self {
            Operator::Not => 3,
            Operator::And => 2,
            Operator::Or => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Not => "NOT",
            Operator::And => "AND",
            Operator::Or => "OR",
        }
    }
}

/// Lexical token of a query line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryToken {
    /// Bare word, not yet normalized
    Term(String),
    /// Contents of a double-quoted span
    Phrase(String),
    Operator(Operator),
    LeftParen,
    RightParen,
}

/// Element of a postfix query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostfixItem {
    Term(String),
    Phrase(String),
    Operator(Operator),
}

/// Lexer for query lines
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.position += rest.len() - rest.trim_start().len();
    }

    /// Next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<QueryToken>, ParseError> {
        self.skip_whitespace();
        let mut chars = self.rest().chars();
        let ch = match chars.next() {
            Some(ch) => ch,
            None => return Ok(None),
        };

        match ch {
            '(' => {
                self.position += 1;
                Ok(Some(QueryToken::LeftParen))
            }
            ')' => {
                self.position += 1;
                Ok(Some(QueryToken::RightParen))
            }
            '"' => {
                let start = self.position;
                let body = &self.input[start + 1..];
                match body.find('"') {
                    Some(end) => {
                        self.position = start + 1 + end + 1;
                        Ok(Some(QueryToken::Phrase(body[..end].trim().to_string())))
                    }
                    None => Err(ParseError::UnterminatedPhrase(start)),
                }
            }
            _ => {
                let rest = self.rest();
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == '"')
                    .unwrap_or(rest.len());
                let word = &rest[..end];
                self.position += end;
                Ok(Some(match word {
                    "AND" => QueryToken::Operator(Operator::And),
                    "OR" => QueryToken::Operator(Operator::Or),
                    "NOT" => QueryToken::Operator(Operator::Not),
                    _ => QueryToken::Term(word.to_string()),
                }))
            }
        }
    }
}

pub fn lex(query: &str) -> Result<Vec<QueryToken>, ParseError> {
    let mut lexer = Lexer::new(query);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

/// A line is a boolean query when it uses an operator or balanced
/// grouping; anything else, stray parentheses included, is free text.
pub fn is_boolean(tokens: &[QueryToken]) -> bool {
    if tokens.iter().any(|t| matches!(t, QueryToken::Operator(_))) {
        return true;
    }
    let mut depth = 0usize;
    let mut grouped = false;
    for token in tokens {
        match token {
            QueryToken::LeftParen => {
                depth += 1;
                grouped = true;
            }
            QueryToken::RightParen => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    grouped && depth == 0
}

/// Whether any bare word of `query` is an operator keyword. Decides how
/// to treat a line the lexer rejects.
pub fn mentions_operator(query: &str) -> bool {
    query
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == '"')
        .any(|word| matches!(word, "AND" | "OR" | "NOT"))
}

enum StackEntry {
    Operator(Operator),
    LeftParen(usize),
}

struct ShuntingYard {
    output: Vec<PostfixItem>,
    stack: Vec<StackEntry>,
    expect_operand: bool,
}

impl ShuntingYard {
    fn push_binary(&mut self, op: Operator) {
        while let Some(StackEntry::Operator(top)) = self.stack.last() {
            if top.precedence() >= op.precedence() {
                self.output.push(PostfixItem::Operator(*top));
                self.stack.pop();
            } else {
                break;
            }
        }
        self.stack.push(StackEntry::Operator(op));
        self.expect_operand = true;
    }

    fn implicit_and(&mut self) {
        if !self.expect_operand {
            self.push_binary(Operator::And);
        }
    }
}

pub fn to_postfix(tokens: Vec<QueryToken>) -> Result<Vec<PostfixItem>, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut yard = ShuntingYard { output: Vec::new(), stack: Vec::new(), expect_operand: true };
    let mut last_operator: Option<(Operator, usize)> = None;

    for (position, token) in tokens.into_iter().enumerate() {
        match token {
            QueryToken::Term(term) => {
                yard.implicit_and();
                yard.output.push(PostfixItem::Term(term));
                yard.expect_operand = false;
            }
            QueryToken::Phrase(phrase) => {
                yard.implicit_and();
                yard.output.push(PostfixItem::Phrase(phrase));
                yard.expect_operand = false;
            }
            QueryToken::Operator(Operator::Not) => {
                yard.implicit_and();
                // unary prefix: nothing is popped
                yard.stack.push(StackEntry::Operator(Operator::Not));
                yard.expect_operand = true;
                last_operator = Some((Operator::Not, position));
            }
            QueryToken::Operator(op) => {
                if yard.expect_operand {
                    return Err(ParseError::DanglingOperator { operator: op.as_str(), position });
                }
                yard.push_binary(op);
                last_operator = Some((op, position));
            }
            QueryToken::LeftParen => {
                yard.implicit_and();
                yard.stack.push(StackEntry::LeftParen(position));
                yard.expect_operand = true;
            }
            QueryToken::RightParen => {
                if yard.expect_operand {
                    return match (yard.stack.last(), last_operator) {
                        (Some(StackEntry::LeftParen(_)), _) => Err(ParseError::EmptyGroup(position)),
                        (_, Some((op, at))) => Err(ParseError::DanglingOperator { operator: op.as_str(), position: at }),
                        _ => Err(ParseError::UnbalancedParenthesis(position)),
                    };
                }
                loop {
                    match yard.stack.pop() {
                        Some(StackEntry::Operator(op)) => yard.output.push(PostfixItem::Operator(op)),
                        Some(StackEntry::LeftParen(_)) => break,
                        None => return Err(ParseError::UnbalancedParenthesis(position)),
                    }
                }
                yard.expect_operand = false;
            }
        }
    }

    if yard.expect_operand {
        return Err(match last_operator {
            Some((op, position)) => ParseError::DanglingOperator { operator: op.as_str(), position },
            None => ParseError::Empty,
        });
    }
    while let Some(entry) = yard.stack.pop() {
        match entry {
            StackEntry::Operator(op) => yard.output.push(PostfixItem::Operator(op)),
            StackEntry::LeftParen(position) => return Err(ParseError::UnbalancedParenthesis(position)),
        }
    }
    Ok(yard.output)
}

/// Lex and convert a query line to postfix.
pub fn parse(query: &str) -> Result<Vec<PostfixItem>, ParseError> {
    to_postfix(lex(query)?)
}
