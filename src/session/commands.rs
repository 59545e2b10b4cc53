//! Classification and parsing of the text commands of a session.
use crate::symbolic::parse_expr::ParseError;
use nalgebra::DVector;
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

/// Reserved words, looked up case-insensitively after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Keyword {
    /// enter equation authoring
    #[strum(serialize = "$nld")]
    Nld,
    /// ask for initial conditions and integrate
    #[strum(serialize = "solve")]
    Solve,
    /// forget all equations, keep authoring
    #[strum(serialize = "reset")]
    Reset,
    /// leave the mode and forget everything
    #[strum(serialize = "q")]
    Quit,
    #[strum(serialize = "hi")]
    Greet,
}

impl Keyword {
    pub fn lookup(text: &str) -> Option<Keyword> {
        Keyword::from_str(text.trim()).ok()
    }
}

/// Collapses `dx/dt`, `dX`, `x'` and `x` to `x`.
pub fn normalize_state_name(lhs: &str) -> String {
    let lower = lhs.trim().to_lowercase();
    let name = lower.strip_suffix("/dt").unwrap_or(lower.as_str()).trim_end();
    let name = name.strip_suffix('\'').unwrap_or(name).trim_end();
    name.trim_start_matches('d').trim().to_string()
}

/// Splits `lhs=rhs` into a normalized state name and the right-hand side text.
pub fn parse_equation(text: &str) -> Result<(String, String), ParseError> {
    let invalid = || ParseError::InvalidEquation(text.trim().to_string());
    let (lhs, rhs) = text.split_once('=').ok_or_else(invalid)?;
    if rhs.contains('=') || rhs.trim().is_empty() {
        return Err(invalid());
    }
    let state = normalize_state_name(lhs);
    if state.is_empty() {
        return Err(ParseError::InvalidStateName(lhs.trim().to_string()));
    }
    Ok((state, rhs.trim().to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitialConditions {
    pub y0: DVector<f64>,
    /// integration runs over [0, t_end]
    pub t_end: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    Parse(ParseError),
    /// number of initial values differs from the number of states
    DimensionMismatch { expected: usize, got: usize },
    InvalidEndTime { t_end: f64, max: f64 },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InputError::Parse(err) => write!(f, "{}", err),
            InputError::DimensionMismatch { expected, got } => write!(
                f,
                "expected {} initial values and the end time, got {} initial values",
                expected, got
            ),
            InputError::InvalidEndTime { t_end, max } => write!(
                f,
                "end time must be positive and at most {}, got {}",
                max, t_end
            ),
        }
    }
}

impl std::error::Error for InputError {}

impl From<ParseError> for InputError {
    fn from(err: ParseError) -> Self {
        InputError::Parse(err)
    }
}

/// Parses `y0_1, .., y0_n, t_end` for a system of `nstates` states.
pub fn parse_initial_conditions(
    text: &str,
    nstates: usize,
    max_end_time: f64,
) -> Result<InitialConditions, InputError> {
    let mut values = text
        .split(',')
        .map(|token| {
            let token = token.trim();
            match token.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(ParseError::InvalidNumber(token.to_string())),
            }
        })
        .collect::<Result<Vec<f64>, ParseError>>()?;
    // the last number is the end time
    let t_end = values.pop().ok_or(ParseError::Empty)?;
    if values.len() != nstates {
        return Err(InputError::DimensionMismatch {
            expected: nstates,
            got: values.len(),
        });
    }
    if !(t_end > 0.0 && t_end <= max_end_time) {
        return Err(InputError::InvalidEndTime {
            t_end,
            max: max_end_time,
        });
    }
    Ok(InitialConditions {
        y0: DVector::from_vec(values),
        t_end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(Keyword::lookup("$nld"), Some(Keyword::Nld));
        assert_eq!(Keyword::lookup("  SOLVE "), Some(Keyword::Solve));
        assert_eq!(Keyword::lookup("Reset"), Some(Keyword::Reset));
        assert_eq!(Keyword::lookup("Q"), Some(Keyword::Quit));
        assert_eq!(Keyword::lookup("hi"), Some(Keyword::Greet));
        assert_eq!(Keyword::lookup("x=y"), None);
        assert_eq!(Keyword::lookup("solve it"), None);
    }

    #[test]
    fn test_every_keyword_round_trips_through_display() {
        for keyword in Keyword::iter() {
            assert_eq!(Keyword::lookup(&keyword.to_string()), Some(keyword));
        }
    }

    #[test]
    fn test_normalize_state_name() {
        assert_eq!(normalize_state_name("x"), "x");
        assert_eq!(normalize_state_name(" dx/dt "), "x");
        assert_eq!(normalize_state_name("dX"), "x");
        assert_eq!(normalize_state_name("y'"), "y");
        assert_eq!(normalize_state_name("dtheta/dt"), "theta");
        assert_eq!(normalize_state_name("d"), "");
    }

    #[test]
    fn test_parse_equation() {
        assert_eq!(
            parse_equation("dx/dt = sin(y)-x*p").unwrap(),
            ("x".to_string(), "sin(y)-x*p".to_string())
        );
        assert_eq!(
            parse_equation("x=y").unwrap(),
            ("x".to_string(), "y".to_string())
        );
        assert!(matches!(
            parse_equation("x y"),
            Err(ParseError::InvalidEquation(_))
        ));
        assert!(matches!(
            parse_equation("x="),
            Err(ParseError::InvalidEquation(_))
        ));
        assert!(matches!(
            parse_equation("x=y=z"),
            Err(ParseError::InvalidEquation(_))
        ));
        assert!(matches!(
            parse_equation("d=x"),
            Err(ParseError::InvalidStateName(_))
        ));
    }

    #[test]
    fn test_parse_initial_conditions() {
        let ic = parse_initial_conditions("1.0, 2.0, 10.0", 2, 1e4).unwrap();
        assert_eq!(ic.y0, DVector::from_vec(vec![1.0, 2.0]));
        assert_eq!(ic.t_end, 10.0);
        let ic = parse_initial_conditions("-1e-2,5", 1, 1e4).unwrap();
        assert_eq!(ic.y0[0], -0.01);
        assert_eq!(ic.t_end, 5.0);
    }

    #[test]
    fn test_parse_initial_conditions_errors() {
        assert_eq!(
            parse_initial_conditions("1, a, 10", 2, 1e4).unwrap_err(),
            InputError::Parse(ParseError::InvalidNumber("a".to_string()))
        );
        assert_eq!(
            parse_initial_conditions("1,,10", 2, 1e4).unwrap_err(),
            InputError::Parse(ParseError::InvalidNumber("".to_string()))
        );
        assert_eq!(
            parse_initial_conditions("1, nan, 10", 2, 1e4).unwrap_err(),
            InputError::Parse(ParseError::InvalidNumber("nan".to_string()))
        );
        assert_eq!(
            parse_initial_conditions("1, 10", 2, 1e4).unwrap_err(),
            InputError::DimensionMismatch { expected: 2, got: 1 }
        );
        assert_eq!(
            parse_initial_conditions("1, 0, 0, 10", 2, 1e4).unwrap_err(),
            InputError::DimensionMismatch { expected: 2, got: 3 }
        );
        assert_eq!(
            parse_initial_conditions("1, 0, -3", 2, 1e4).unwrap_err(),
            InputError::InvalidEndTime { t_end: -3.0, max: 1e4 }
        );
        assert_eq!(
            parse_initial_conditions("1, 0, 1e9", 2, 1e4).unwrap_err(),
            InputError::InvalidEndTime { t_end: 1e9, max: 1e4 }
        );
    }
}
