//! Equation parsing and evaluation
//!
//! Turns text like `y = x sin x` into a callable `f(x)`. Unknown names are
//! rejected when parsing, so evaluation never fails: domain errors come back
//! as NaN or infinities and are handled downstream as silence.

mod ast;
mod parser;

pub use ast::{BinOp, Func, Node, CONSTANTS};

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why an equation could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty equation")]
    Empty,

    #[error("unknown name `{name}` at column {column}")]
    UnknownName { name: String, column: usize },

    #[error("unexpected `{found}` at column {column}")]
    Unexpected { found: String, column: usize },
}

/// A parsed equation in `x`
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Node,
}

impl Expression {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let body = parser::assignment(text);
        let offset = text.len() - body.len();
        if body.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        check_names(body, offset)?;

        let unexpected = |rest: &str| {
            let found: String = rest.trim_start().chars().take(8).collect();
            let column = offset + body.len() - rest.trim_start().len() + 1;
            if found.is_empty() {
                ParseError::Unexpected {
                    found: "end of input".to_string(),
                    column,
                }
            } else {
                ParseError::Unexpected { found, column }
            }
        };

        match parser::sum(body) {
            Ok((rest, root)) if rest.trim().is_empty() => Ok(Self {
                source: text.trim().to_string(),
                root,
            }),
            Ok((rest, _)) => Err(unexpected(rest)),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(unexpected(e.input)),
            Err(nom::Err::Incomplete(_)) => Err(unexpected("")),
        }
    }

    /// The equation as typed
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.root.eval(x)
    }

    /// Fraction of `samples` evenly spaced points in `[min, max]` where the
    /// function is finite
    pub fn coverage(&self, min: f64, max: f64, samples: usize) -> f64 {
        if samples == 0 {
            return 0.0;
        }
        let step = if samples > 1 {
            (max - min) / (samples - 1) as f64
        } else {
            0.0
        };
        let finite = (0..samples)
            .filter(|i| self.eval(min + *i as f64 * step).is_finite())
            .count();
        finite as f64 / samples as f64
    }
}

/// Reject letter runs that are not made of known names
fn check_names(body: &str, offset: usize) -> Result<(), ParseError> {
    let mut start = None;
    for (i, c) in body.char_indices().chain(std::iter::once((body.len(), ' '))) {
        match (c.is_alphabetic(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                let word = &body[s..i];
                if parser::split_names(word).is_none() {
                    return Err(ParseError::UnknownName {
                        name: word.to_string(),
                        column: offset + s + 1,
                    });
                }
                start = None;
            }
            _ => {}
        }
    }
    Ok(())
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expression::parse(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
