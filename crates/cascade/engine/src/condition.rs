//! Condition expressions over flag states
//!
//! Grammar (loosest binding first):
//!
//! ```text
//! expr    := and ( "||" and )*
//! and     := unary ( "&&" unary )*
//! unary   := "!" atom | atom | "(" expr ")"
//! atom    := FLAG | "defined" FLAG | "defined" "(" FLAG ")"
//! ```
//!
//! `FLAG` tests that the flag is on, `!FLAG` that it is off. Negation only
//! applies to a single flag.

use cascade_types::{CascadeError, FlagName, FlagState, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Boolean expression over flag states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Condition {
    /// `flag` is on (`on == true`) or off (`on == false`)
    Flag { flag: FlagName, on: bool },
    /// Every operand holds
    All(Vec<Condition>),
    /// At least one operand holds
    Any(Vec<Condition>),
}

impl Condition {
    pub fn is_on(flag: FlagName) -> Self {
        Condition::Flag { flag, on: true }
    }

    pub fn is_off(flag: FlagName) -> Self {
        Condition::Flag { flag, on: false }
    }

    /// Conjunction, flattening nested conjunctions and single operands
    pub fn all(operands: Vec<Condition>) -> Self {
        let mut flat = Vec::with_capacity(operands.len());
        for op in operands {
            match op {
                Condition::All(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Condition::All(flat)
        }
    }

    /// Disjunction, flattening nested disjunctions and single operands
    pub fn any(operands: Vec<Condition>) -> Self {
        let mut flat = Vec::with_capacity(operands.len());
        for op in operands {
            match op {
                Condition::Any(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Condition::Any(flat)
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            input,
            tokens,
            pos: 0,
        };
        parser.parse_condition()
    }

    /// Three-valued evaluation.
    ///
    /// `None` means undetermined: some referenced flag is still unset and the
    /// decided operands do not settle the result on their own. A conjunction
    /// with a false operand is false and a disjunction with a true operand is
    /// true regardless of unset operands.
    pub fn evaluate<F>(&self, state_of: &F) -> Option<bool>
    where
        F: Fn(&FlagName) -> FlagState,
    {
        match self {
            Condition::Flag { flag, on } => state_of(flag).as_bool().map(|v| v == *on),
            Condition::All(operands) => {
                let mut undetermined = false;
                for op in operands {
                    match op.evaluate(state_of) {
                        Some(false) => return Some(false),
                        Some(true) => {}
                        None => undetermined = true,
                    }
                }
                if undetermined {
                    None
                } else {
                    Some(true)
                }
            }
            Condition::Any(operands) => {
                let mut undetermined = false;
                for op in operands {
                    match op.evaluate(state_of) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => undetermined = true,
                    }
                }
                if undetermined {
                    None
                } else {
                    Some(false)
                }
            }
        }
    }

    /// Referenced flags, first occurrence order, without duplicates
    pub fn flags(&self) -> Vec<&FlagName> {
        let mut out = Vec::new();
        self.collect_flags(&mut out);
        out
    }

    fn collect_flags<'a>(&'a self, out: &mut Vec<&'a FlagName>) {
        match self {
            Condition::Flag { flag, .. } => {
                if !out.contains(&flag) {
                    out.push(flag);
                }
            }
            Condition::All(ops) | Condition::Any(ops) => {
                for op in ops {
                    op.collect_flags(out);
                }
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Flag { flag, on: true } => write!(f, "{flag}"),
            Condition::Flag { flag, on: false } => write!(f, "!{flag}"),
            Condition::All(ops) => {
                for (i, op) in ops.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" && ")?;
                    }
                    match op {
                        Condition::Any(_) => write!(f, "({op})")?,
                        _ => write!(f, "{op}")?,
                    }
                }
                Ok(())
            }
            Condition::Any(ops) => {
                for (i, op) in ops.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" || ")?;
                    }
                    write!(f, "{op}")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Condition {
    type Err = CascadeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Condition {
    type Error = CascadeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Ident(String),
    Bang,
    AndAnd,
    OrOr,
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn syntax_error(input: &str, offset: usize, message: impl Into<String>) -> CascadeError {
    CascadeError::ConditionSyntax {
        input: input.to_string(),
        offset,
        message: message.into(),
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((offset, ch)) = chars.peek().copied() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let mut value = String::new();
            while let Some((_, c)) = chars.peek().copied() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    value.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Ident(value),
                offset,
            });
            continue;
        }

        chars.next();
        let kind = match ch {
            '!' => TokenKind::Bang,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '&' | '|' => {
                if chars.peek().map(|(_, c)| *c) != Some(ch) {
                    return Err(syntax_error(
                        input,
                        offset,
                        format!("expected '{ch}{ch}'"),
                    ));
                }
                chars.next();
                if ch == '&' {
                    TokenKind::AndAnd
                } else {
                    TokenKind::OrOr
                }
            }
            other => {
                return Err(syntax_error(
                    input,
                    offset,
                    format!("unexpected character '{other}'"),
                ))
            }
        };
        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn parse_condition(&mut self) -> Result<Condition> {
        if self.tokens.is_empty() {
            return Err(syntax_error(self.input, 0, "empty condition"));
        }
        let condition = self.parse_or()?;
        if let Some(token) = self.peek() {
            return Err(syntax_error(
                self.input,
                token.offset,
                format!("unexpected {:?}", token.kind),
            ));
        }
        Ok(condition)
    }

    fn parse_or(&mut self) -> Result<Condition> {
        let mut terms = vec![self.parse_and()?];
        while self.eat(&TokenKind::OrOr) {
            terms.push(self.parse_and()?);
        }
        Ok(Condition::any(terms))
    }

    fn parse_and(&mut self) -> Result<Condition> {
        let mut terms = vec![self.parse_unary()?];
        while self.eat(&TokenKind::AndAnd) {
            terms.push(self.parse_unary()?);
        }
        Ok(Condition::all(terms))
    }

    fn parse_unary(&mut self) -> Result<Condition> {
        let Some(token) = self.next() else {
            return Err(syntax_error(self.input, self.input.len(), "unexpected end"));
        };
        match token.kind {
            TokenKind::Bang => {
                if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LParen)) {
                    return Err(syntax_error(
                        self.input,
                        token.offset,
                        "negation applies to a single flag",
                    ));
                }
                let Some(next) = self.next() else {
                    return Err(syntax_error(self.input, self.input.len(), "unexpected end"));
                };
                let flag = self.parse_atom(next)?;
                Ok(Condition::is_off(flag))
            }
            TokenKind::LParen => {
                let inner = self.parse_or()?;
                if !self.eat(&TokenKind::RParen) {
                    let offset = self.peek().map_or(self.input.len(), |t| t.offset);
                    return Err(syntax_error(self.input, offset, "expected ')'"));
                }
                Ok(inner)
            }
            _ => Ok(Condition::is_on(self.parse_atom(token)?)),
        }
    }

    /// Flag reference, with or without a `defined` prefix
    fn parse_atom(&mut self, token: Token) -> Result<FlagName> {
        let TokenKind::Ident(name) = token.kind else {
            return Err(syntax_error(
                self.input,
                token.offset,
                format!("expected flag name, found {:?}", token.kind),
            ));
        };

        if name == "defined" {
            match self.peek().map(|t| t.kind.clone()) {
                Some(TokenKind::LParen) => {
                    self.pos += 1;
                    let inner = self.expect_ident()?;
                    if !self.eat(&TokenKind::RParen) {
                        let offset = self.peek().map_or(self.input.len(), |t| t.offset);
                        return Err(syntax_error(self.input, offset, "expected ')'"));
                    }
                    return self.flag_name(inner, token.offset);
                }
                Some(TokenKind::Ident(_)) => {
                    let inner = self.expect_ident()?;
                    return self.flag_name(inner, token.offset);
                }
                _ => {}
            }
        }

        self.flag_name(name, token.offset)
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.next() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => Ok(name),
            Some(token) => Err(syntax_error(
                self.input,
                token.offset,
                format!("expected flag name, found {:?}", token.kind),
            )),
            None => Err(syntax_error(self.input, self.input.len(), "unexpected end")),
        }
    }

    fn flag_name(&self, name: String, offset: usize) -> Result<FlagName> {
        FlagName::new(name).map_err(|e| syntax_error(self.input, offset, e.to_string()))
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().map(|t| &t.kind) == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn flag(name: &str) -> FlagName {
        FlagName::new(name).unwrap()
    }

    fn states(pairs: &[(&str, FlagState)]) -> impl Fn(&FlagName) -> FlagState {
        let map: BTreeMap<String, FlagState> =
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        move |f: &FlagName| map.get(f.as_str()).copied().unwrap_or(FlagState::Unset)
    }

    #[test]
    fn parses_precedence() {
        let c = Condition::parse("A || B && !C").unwrap();
        assert_eq!(
            c,
            Condition::Any(vec![
                Condition::is_on(flag("A")),
                Condition::All(vec![Condition::is_on(flag("B")), Condition::is_off(flag("C"))]),
            ])
        );
    }

    #[test]
    fn parses_defined_forms() {
        let c = Condition::parse("defined GLS_MIXING || defined(MY25_MIXING)").unwrap();
        assert_eq!(c.to_string(), "GLS_MIXING || MY25_MIXING");
        let negated = Condition::parse("!defined(BULK_FLUXES)").unwrap();
        assert_eq!(negated, Condition::is_off(flag("BULK_FLUXES")));
    }

    #[test]
    fn display_round_trips_grouping() {
        let src = "(GLS_MIXING || MY25_MIXING) && !CANUTO_A && !CANUTO_B";
        let c = Condition::parse(src).unwrap();
        assert_eq!(c.to_string(), src);
        assert_eq!(Condition::parse(&c.to_string()).unwrap(), c);
    }

    #[test]
    fn syntax_errors_carry_offsets() {
        let err = Condition::parse("A & B").unwrap_err();
        assert!(matches!(err, CascadeError::ConditionSyntax { offset: 2, .. }));

        let err = Condition::parse("!(A || B)").unwrap_err();
        assert!(matches!(err, CascadeError::ConditionSyntax { offset: 0, .. }));

        assert!(Condition::parse("").is_err());
        assert!(Condition::parse("(A").is_err());
        assert!(Condition::parse("A B").is_err());
        assert!(Condition::parse("A ||").is_err());
    }

    #[test]
    fn three_valued_evaluation() {
        let any = Condition::parse("GLS_MIXING || MY25_MIXING").unwrap();
        assert_eq!(any.evaluate(&states(&[])), None);
        assert_eq!(
            any.evaluate(&states(&[("GLS_MIXING", FlagState::On)])),
            Some(true)
        );
        assert_eq!(
            any.evaluate(&states(&[("GLS_MIXING", FlagState::Off)])),
            None
        );
        assert_eq!(
            any.evaluate(&states(&[
                ("GLS_MIXING", FlagState::Off),
                ("MY25_MIXING", FlagState::Off)
            ])),
            Some(false)
        );

        let all = Condition::parse("BIO_FENNEL && !NEMURO").unwrap();
        assert_eq!(
            all.evaluate(&states(&[("NEMURO", FlagState::On)])),
            Some(false)
        );
        assert_eq!(
            all.evaluate(&states(&[("BIO_FENNEL", FlagState::On)])),
            None
        );
        assert_eq!(
            all.evaluate(&states(&[
                ("BIO_FENNEL", FlagState::On),
                ("NEMURO", FlagState::Off)
            ])),
            Some(true)
        );
    }

    #[test]
    fn referenced_flags_are_deduplicated() {
        let c = Condition::parse("A && (B || A) && !C").unwrap();
        let names: Vec<&str> = c.flags().into_iter().map(FlagName::as_str).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn serde_uses_expression_string() {
        let c: Condition = serde_json::from_str("\"PERFECT_RESTART\"").unwrap();
        assert_eq!(c, Condition::is_on(flag("PERFECT_RESTART")));
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"PERFECT_RESTART\"");
    }
}
