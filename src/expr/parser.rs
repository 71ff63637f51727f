//! nom grammar for equations in `x`
//!
//! ```text
//! statement := ["y" "="] sum
//! sum       := product (("+" | "-") product)*
//! product   := unary (("*" | "/") unary | power)*      juxtaposition multiplies
//! unary     := ("-" | "+") unary | power
//! power     := primary ["^" unary]                     right associative
//! primary   := number | name | func "(" sum ")" | func unary | "(" sum ")"
//! ```
//!
//! Names are matched longest first with no separator needed, so `2xsinx`
//! reads as `2 * x * sin(x)`.

use super::ast::{BinOp, Func, Node, CONSTANTS};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{map, map_res, opt, recognize},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

/// Every name the grammar knows, longest first
pub(crate) fn known_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Func::ALL.iter().map(|f| f.name()).collect();
    names.extend(CONSTANTS.iter().map(|(name, _)| *name));
    names.push("x");
    names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    names
}

/// Split a run of letters into known names, longest match first
pub(crate) fn split_names(word: &str) -> Option<Vec<&'static str>> {
    let names = known_names();
    let mut rest = word;
    let mut parts = Vec::new();
    while !rest.is_empty() {
        let name = names.iter().find(|n| rest.starts_with(**n))?;
        parts.push(*name);
        rest = &rest[name.len()..];
    }
    Some(parts)
}

fn ws<'a, O>(
    inner: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    delimited(multispace0, inner, multispace0)
}

/// Unsigned decimal literal with optional exponent
fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

/// One known name, longest match first
fn name(input: &str) -> IResult<&str, &str> {
    for candidate in known_names() {
        if let Some(rest) = input.strip_prefix(candidate) {
            return Ok((rest, candidate));
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Tag,
    )))
}

fn named(input: &str) -> IResult<&str, Node> {
    let (input, word) = name(input)?;
    if word == "x" {
        return Ok((input, Node::X));
    }
    if let Some((_, value)) = CONSTANTS.iter().find(|(n, _)| *n == word) {
        return Ok((input, Node::Number(*value)));
    }
    match Func::from_name(word) {
        Some(func) => {
            let (input, arg) = alt((
                delimited(ws(char('(')), sum, char(')')),
                preceded(multispace0, unary),
            ))(input)?;
            Ok((input, Node::Call(func, Box::new(arg))))
        }
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        ))),
    }
}

fn primary(input: &str) -> IResult<&str, Node> {
    ws(alt((
        map(number, Node::Number),
        named,
        delimited(char('('), sum, char(')')),
    )))(input)
}

fn power(input: &str) -> IResult<&str, Node> {
    let (input, base) = primary(input)?;
    let (input, exponent) = opt(preceded(char('^'), unary))(input)?;
    Ok((
        input,
        match exponent {
            Some(exponent) => Node::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)),
            None => base,
        },
    ))
}

fn unary(input: &str) -> IResult<&str, Node> {
    alt((
        map(preceded(ws(char('-')), unary), |node| Node::Neg(Box::new(node))),
        preceded(ws(char('+')), unary),
        power,
    ))(input)
}

fn product(input: &str) -> IResult<&str, Node> {
    let (mut input, mut acc) = unary(input)?;
    loop {
        if let Ok((rest, (op, rhs))) = pair(ws(one_of("*/")), unary)(input) {
            let op = if op == '*' { BinOp::Mul } else { BinOp::Div };
            acc = Node::Binary(op, Box::new(acc), Box::new(rhs));
            input = rest;
        } else if let Ok((rest, rhs)) = power(input) {
            acc = Node::Binary(BinOp::Mul, Box::new(acc), Box::new(rhs));
            input = rest;
        } else {
            return Ok((input, acc));
        }
    }
}

pub(crate) fn sum(input: &str) -> IResult<&str, Node> {
    let (mut input, mut acc) = product(input)?;
    while let Ok((rest, (op, rhs))) = pair(ws(one_of("+-")), product)(input) {
        let op = if op == '+' { BinOp::Add } else { BinOp::Sub };
        acc = Node::Binary(op, Box::new(acc), Box::new(rhs));
        input = rest;
    }
    Ok((input, acc))
}

/// Strip an optional leading `y =`
pub(crate) fn assignment(input: &str) -> &str {
    let prefix: IResult<&str, _> = tuple((multispace0, tag("y"), ws(char('='))))(input);
    match prefix {
        Ok((rest, _)) => rest,
        Err(_) => input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Node {
        let (rest, node) = sum(assignment(text)).unwrap();
        assert!(rest.trim().is_empty(), "left over: {:?}", rest);
        node
    }

    fn eval(text: &str, x: f64) -> f64 {
        parse(text).eval(x)
    }

    #[test]
    fn test_numbers() {
        assert_eq!(number("42").unwrap(), ("", 42.0));
        assert_eq!(number("3.5x").unwrap(), ("x", 3.5));
        assert_eq!(number(".25").unwrap(), ("", 0.25));
        assert_eq!(number("1e3").unwrap(), ("", 1000.0));
        // No digits after `e`: the e is the constant
        assert_eq!(number("2e").unwrap(), ("e", 2.0));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3", 0.0), 7.0);
        assert_eq!(eval("(1 + 2) * 3", 0.0), 9.0);
        assert_eq!(eval("10 - 4 - 3", 0.0), 3.0);
        assert_eq!(eval("8 / 4 / 2", 0.0), 1.0);
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(eval("2^3^2", 0.0), 512.0);
        assert_eq!(eval("-x^2", 3.0), -9.0);
        assert_eq!(eval("2^-1", 0.0), 0.5);
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(eval("2x", 4.0), 8.0);
        assert_eq!(eval("3(x+1)", 1.0), 6.0);
        assert_eq!(eval("(x+1)(x-1)", 3.0), 8.0);
        assert!((eval("x sin x", 2.0) - 2.0 * 2f64.sin()).abs() < 1e-12);
        assert_eq!(eval("x -1", 5.0), 4.0);
    }

    #[test]
    fn test_function_calls() {
        assert!((eval("sin(x)", 1.0) - 1f64.sin()).abs() < 1e-12);
        assert!((eval("sin x", 1.0) - 1f64.sin()).abs() < 1e-12);
        assert!((eval("sinx", 1.0) - 1f64.sin()).abs() < 1e-12);
        assert!((eval("sin(x)^2", 2.0) - 2f64.sin().powi(2)).abs() < 1e-12);
        assert!((eval("sqrt(abs(x))", -16.0) - 4.0).abs() < 1e-12);
        assert!((eval("sinh x", 1.0) - 1f64.sinh()).abs() < 1e-12);
    }

    #[test]
    fn test_constants() {
        assert!((eval("2pi", 0.0) - std::f64::consts::TAU).abs() < 1e-12);
        assert!((eval("e^x", 1.0) - std::f64::consts::E).abs() < 1e-12);
        assert!((eval("exp x", 1.0) - std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn test_leading_assignment() {
        assert_eq!(assignment("y = x"), "x");
        assert_eq!(assignment("  y=x+1"), "x+1");
        assert_eq!(assignment("x + 1"), "x + 1");
    }

    #[test]
    fn test_split_names() {
        assert_eq!(split_names("xsinx"), Some(vec!["x", "sin", "x"]));
        assert_eq!(split_names("sinh"), Some(vec!["sinh"]));
        assert_eq!(split_names("pix"), Some(vec!["pi", "x"]));
        assert_eq!(split_names("foo"), None);
    }
}
