//! turns a String expression into a symbolic expression
//!
//! Grammar, lowest precedence first:
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary (('*' | '/') unary)*
//! unary := ('-' | '+') unary | power
//! power := atom (('^' | '**') unary)?        right associative
//! atom  := number | func '(' expr ')' | identifier | '(' expr ')'
//! ```
//! # Example
//! ```
//! use RustedNLD::symbolic::parse_expr::parse_expression_func;
//! let expr = parse_expression_func("x^2 * log(x + y)").unwrap();
//! assert_eq!(expr.to_string(), "((x ^ 2) * ln((x + y)))");
//! ```
use crate::symbolic::symbolic_engine::Expr;
use log::debug;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize},
    error::ErrorKind,
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
};
use std::fmt;

/// Error for text that is not a valid expression, number list or equation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// nothing but whitespace
    Empty,
    /// parsing stopped at byte `position` of `input`
    Syntax { input: String, position: usize },
    /// token is not a floating point number
    InvalidNumber(String),
    /// text is not of the form `state = expression`
    InvalidEquation(String),
    /// left-hand side is not usable as a state name
    InvalidStateName(String),
    /// more than `limit` of `what` in one expression
    TooComplex { what: &'static str, limit: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty expression"),
            ParseError::Syntax { input, position } => {
                let rest: String = input[*position..].chars().take(12).collect();
                if rest.is_empty() {
                    write!(f, "unexpected end of expression '{}'", input)
                } else {
                    write!(
                        f,
                        "cannot parse '{}' at position {} (near '{}')",
                        input, position, rest
                    )
                }
            }
            ParseError::InvalidNumber(token) => write!(f, "'{}' is not a number", token),
            ParseError::InvalidEquation(text) => write!(
                f,
                "'{}' is not an equation, expected <state>=<expression>",
                text
            ),
            ParseError::InvalidStateName(name) => {
                write!(f, "'{}' cannot be used as a state name", name)
            }
            ParseError::TooComplex { what, limit } => {
                write!(f, "expression is too complex, more than {} {}", limit, what)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Deepest bracket nesting accepted by [`parse_expression_func`].
pub const MAX_NESTING: usize = 32;
/// Most operators and signs accepted in one expression.
pub const MAX_OPERATIONS: usize = 256;

type FunctionCtor = fn(Box<Expr>) -> Expr;

/// Recognised function names and their aliases.
const FUNCTIONS: &[(&str, FunctionCtor)] = &[
    ("sin", Expr::sin),
    ("cos", Expr::cos),
    ("tan", Expr::tg),
    ("tg", Expr::tg),
    ("cot", Expr::ctg),
    ("ctg", Expr::ctg),
    ("asin", Expr::arcsin),
    ("arcsin", Expr::arcsin),
    ("acos", Expr::arccos),
    ("arccos", Expr::arccos),
    ("atan", Expr::arctg),
    ("arctan", Expr::arctg),
    ("arctg", Expr::arctg),
    ("acot", Expr::arcctg),
    ("arcctg", Expr::arcctg),
    ("exp", Expr::Exp),
    ("log", Expr::Ln),
    ("ln", Expr::Ln),
    ("sqrt", Expr::sqrt),
    ("abs", Expr::abs),
];

fn lookup_function(name: &str) -> Option<FunctionCtor> {
    FUNCTIONS
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, ctor)| *ctor)
}

/// Identifier: a letter or underscore followed by letters, digits or underscores.
pub fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

/// Unsigned decimal literal: `1`, `1.`, `1.5`, `.5`, with optional exponent.
fn number(input: &str) -> IResult<&str, f64> {
    let mantissa = alt((
        recognize((digit1, opt((char('.'), digit0)))),
        recognize((char('.'), digit1)),
    ));
    let exponent = opt((one_of("eE"), opt(one_of("+-")), digit1));
    map_res(recognize((mantissa, exponent)), str::parse::<f64>).parse(input)
}

fn function_call(input: &str) -> IResult<&str, Expr> {
    let (rest, name) = identifier(input)?;
    let Some(ctor) = lookup_function(name) else {
        return Err(nom::Err::Error(nom::error::Error::new(input, ErrorKind::Tag)));
    };
    let (rest, arg) = delimited(
        preceded(multispace0, char('(')),
        expr,
        preceded(multispace0, char(')')),
    )
    .parse(rest)?;
    Ok((rest, ctor(arg.boxed())))
}

fn atom(input: &str) -> IResult<&str, Expr> {
    preceded(
        multispace0,
        alt((
            map(number, Expr::Const),
            function_call,
            map(identifier, |name: &str| Expr::Var(name.to_string())),
            delimited(char('('), expr, preceded(multispace0, char(')'))),
        )),
    )
    .parse(input)
}

fn power(input: &str) -> IResult<&str, Expr> {
    let (rest, base) = atom(input)?;
    let (rest, exponent) = opt(preceded(
        delimited(multispace0, alt((tag("**"), tag("^"))), multispace0),
        unary,
    ))
    .parse(rest)?;
    let res = match exponent {
        Some(exponent) => base.pow(exponent),
        None => base,
    };
    Ok((rest, res))
}

fn negate(expr: Expr) -> Expr {
    match expr {
        Expr::Const(val) => Expr::Const(-val),
        other => -other,
    }
}

fn unary(input: &str) -> IResult<&str, Expr> {
    let (rest, sign) = opt(preceded(multispace0, one_of("+-"))).parse(input)?;
    match sign {
        Some('-') => {
            let (rest, operand) = unary(rest)?;
            Ok((rest, negate(operand)))
        }
        Some(_) => unary(rest),
        None => power(input),
    }
}

fn fold_operations(first: Expr, tail: Vec<(char, Expr)>) -> Expr {
    tail.into_iter().fold(first, |acc, (op, rhs)| match op {
        '+' => Expr::Add(acc.boxed(), rhs.boxed()),
        '-' => Expr::Sub(acc.boxed(), rhs.boxed()),
        '*' => Expr::Mul(acc.boxed(), rhs.boxed()),
        _ => Expr::Div(acc.boxed(), rhs.boxed()),
    })
}

fn term(input: &str) -> IResult<&str, Expr> {
    let (rest, first) = unary(input)?;
    let (rest, tail) = many0(pair(
        delimited(multispace0, one_of("*/"), multispace0),
        unary,
    ))
    .parse(rest)?;
    Ok((rest, fold_operations(first, tail)))
}

fn expr(input: &str) -> IResult<&str, Expr> {
    let (rest, first) = term(input)?;
    let (rest, tail) = many0(pair(
        delimited(multispace0, one_of("+-"), multispace0),
        term,
    ))
    .parse(rest)?;
    Ok((rest, fold_operations(first, tail)))
}

/// Tree height is bounded by operators plus nesting, both are capped here
/// before the recursive grammar runs.
fn check_complexity(input: &str) -> Result<(), ParseError> {
    let mut depth = 0usize;
    let mut operations = 0usize;
    for c in input.chars() {
        match c {
            '(' => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(ParseError::TooComplex {
                        what: "nested brackets",
                        limit: MAX_NESTING,
                    });
                }
            }
            ')' => depth = depth.saturating_sub(1),
            '+' | '-' | '*' | '/' | '^' => {
                operations += 1;
                if operations > MAX_OPERATIONS {
                    return Err(ParseError::TooComplex {
                        what: "operators",
                        limit: MAX_OPERATIONS,
                    });
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Parses the whole of `input` into an expression tree.
pub fn parse_expression_func(input: &str) -> Result<Expr, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    check_complexity(input)?;
    match all_consuming(terminated(expr, multispace0)).parse(input) {
        Ok((_, parsed)) => {
            debug!("parsed '{}' as {}", input, parsed);
            Ok(parsed)
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(ParseError::Syntax {
            input: input.to_string(),
            position: input.len() - e.input.len(),
        }),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::Syntax {
            input: input.to_string(),
            position: input.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Var(name.to_string()))
    }

    fn c(val: f64) -> Box<Expr> {
        Box::new(Expr::Const(val))
    }

    #[test]
    fn test_parse_constant() {
        assert_eq!(parse_expression_func("42").unwrap(), Expr::Const(42.0));
        assert_eq!(parse_expression_func(".5").unwrap(), Expr::Const(0.5));
        assert_eq!(parse_expression_func("1.5e-3").unwrap(), Expr::Const(1.5e-3));
        assert_eq!(parse_expression_func("2E2").unwrap(), Expr::Const(200.0));
    }

    #[test]
    fn test_parse_variable() {
        assert_eq!(parse_expression_func("x").unwrap(), *var("x"));
        assert_eq!(parse_expression_func(" omega_2 ").unwrap(), *var("omega_2"));
    }

    #[test]
    fn test_parse_addition_is_left_associative() {
        let expr = parse_expression_func("x^2 - x - 1").unwrap();
        let expected = Expr::Sub(
            Box::new(Expr::Sub(Box::new(Expr::Pow(var("x"), c(2.0))), var("x"))),
            c(1.0),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse_expression_func("a + b * c").unwrap();
        assert_eq!(
            expr,
            Expr::Add(var("a"), Box::new(Expr::Mul(var("b"), var("c"))))
        );
        let expr = parse_expression_func("a / b * c").unwrap();
        assert_eq!(
            expr,
            Expr::Mul(Box::new(Expr::Div(var("a"), var("b"))), var("c"))
        );
    }

    #[test]
    fn test_parse_power_both_spellings() {
        let caret = parse_expression_func("x^2").unwrap();
        let stars = parse_expression_func("x**2").unwrap();
        assert_eq!(caret, Expr::Pow(var("x"), c(2.0)));
        assert_eq!(caret, stars);
    }

    #[test]
    fn test_parse_power_is_right_associative() {
        let expr = parse_expression_func("2^3^2").unwrap();
        assert_eq!(
            expr,
            Expr::Pow(c(2.0), Box::new(Expr::Pow(c(3.0), c(2.0))))
        );
    }

    #[test]
    fn test_parse_unary_minus() {
        assert_eq!(parse_expression_func("-x").unwrap(), Expr::Mul(c(-1.0), var("x")));
        assert_eq!(parse_expression_func("-3").unwrap(), Expr::Const(-3.0));
        // binds weaker than power
        assert_eq!(
            parse_expression_func("-x^2").unwrap(),
            Expr::Mul(c(-1.0), Box::new(Expr::Pow(var("x"), c(2.0))))
        );
        assert_eq!(
            parse_expression_func("x*-y").unwrap(),
            Expr::Mul(var("x"), Box::new(Expr::Mul(c(-1.0), var("y"))))
        );
        assert_eq!(
            parse_expression_func("x^-1").unwrap(),
            Expr::Pow(var("x"), c(-1.0))
        );
    }

    #[test]
    fn test_parse_brackets() {
        let expr = parse_expression_func("(x + y) * z").unwrap();
        assert_eq!(
            expr,
            Expr::Mul(Box::new(Expr::Add(var("x"), var("y"))), var("z"))
        );
    }

    #[test]
    fn test_parse_functions_and_aliases() {
        assert_eq!(parse_expression_func("exp(x)").unwrap(), Expr::Exp(var("x")));
        assert_eq!(parse_expression_func("log(x)").unwrap(), Expr::Ln(var("x")));
        assert_eq!(parse_expression_func("ln(x)").unwrap(), Expr::Ln(var("x")));
        assert_eq!(parse_expression_func("tan(x)").unwrap(), Expr::tg(var("x")));
        assert_eq!(parse_expression_func("atan(x)").unwrap(), Expr::arctg(var("x")));
        assert_eq!(parse_expression_func("sqrt(x)").unwrap(), Expr::sqrt(var("x")));
        assert_eq!(parse_expression_func("abs (x)").unwrap(), Expr::abs(var("x")));
    }

    #[test]
    fn test_parse_nested_functions() {
        assert_eq!(
            parse_expression_func("sin(cos(x))").unwrap(),
            Expr::sin(Box::new(Expr::cos(var("x"))))
        );
    }

    #[test]
    fn test_parse_function_name_prefix_is_variable() {
        // "sinx" is an identifier, not sin applied to x
        assert_eq!(parse_expression_func("sinx").unwrap(), *var("sinx"));
        assert_eq!(parse_expression_func("exp").unwrap(), *var("exp"));
    }

    #[test]
    fn test_parse_equation_of_motion() {
        let expr = parse_expression_func("sin(y)-x*p").unwrap();
        assert_eq!(
            expr,
            Expr::Sub(
                Box::new(Expr::sin(var("y"))),
                Box::new(Expr::Mul(var("x"), var("p")))
            )
        );
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(parse_expression_func("   "), Err(ParseError::Empty));
    }

    #[test]
    fn test_unmatched_brackets() {
        assert!(parse_expression_func("(x + y").is_err());
        assert!(parse_expression_func("x + y)").is_err());
    }

    #[test]
    fn test_invalid_expression_reports_position() {
        let err = parse_expression_func("x + * 2").unwrap_err();
        match err {
            ParseError::Syntax { position, .. } => assert_eq!(position, 2),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(parse_expression_func("(x +").is_err());
        assert!(parse_expression_func("2x").is_err());
    }

    #[test]
    fn test_unknown_function_is_error() {
        assert!(parse_expression_func("foo(x)").is_err());
    }

    #[test]
    fn test_long_sum_is_too_complex() {
        let sum = vec!["1"; 20_000].join("+");
        assert_eq!(
            parse_expression_func(&sum),
            Err(ParseError::TooComplex {
                what: "operators",
                limit: MAX_OPERATIONS
            })
        );
        let signs = format!("{}x", "-".repeat(MAX_OPERATIONS + 1));
        assert!(matches!(
            parse_expression_func(&signs),
            Err(ParseError::TooComplex { .. })
        ));
    }

    #[test]
    fn test_deep_brackets_are_too_complex() {
        let nested = format!("{}x{}", "(".repeat(5000), ")".repeat(5000));
        assert_eq!(
            parse_expression_func(&nested),
            Err(ParseError::TooComplex {
                what: "nested brackets",
                limit: MAX_NESTING
            })
        );
        let calls = format!("{}x{}", "sin(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(matches!(
            parse_expression_func(&calls),
            Err(ParseError::TooComplex { .. })
        ));
    }

    #[test]
    fn test_expressions_at_the_limits() {
        let sum = vec!["1"; MAX_OPERATIONS + 1].join("+");
        let expr = parse_expression_func(&sum).unwrap();
        assert_eq!(
            expr.eval_expression(&[], &[]).unwrap(),
            (MAX_OPERATIONS + 1) as f64
        );
        assert!(expr.to_string().starts_with("((((("));

        let nested = format!("{}x{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(parse_expression_func(&nested).unwrap(), *var("x"));
    }
}
