//! # Symbolic Engine Module
//!
//! Core expression tree for the right-hand sides of the user's equations of motion.
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)` - state variables, free parameters and the time symbol
//! - **Constants**: `Const(f64)` - numerical constants
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Exp`, `Ln`, `sin`, `cos`, etc. - elementary functions
//!
//! ### Key Methods
//! - `parse_expression(text)` - string to tree (see `parse_expr`)
//! - `symbols()` - every variable name appearing in the tree
//! - `eval_expression(vars, values)` - numeric evaluation by name lookup
//!
//! Uses mathematical notation (tg, ctg, arctg) for the trigonometric variants,
//! the parser accepts both that and the programming spelling (tan, cot, atan).

#![allow(non_camel_case_types)]

use std::collections::BTreeSet;
use std::fmt;

use crate::symbolic::parse_expr::{ParseError, parse_expression_func};

/// Symbolic expression as an abstract syntax tree.
///
/// # Examples
/// ```
/// use RustedNLD::symbolic::symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let expr = Expr::Add(Box::new(x), Box::new(Expr::Const(2.0)));
/// assert_eq!(expr.to_string(), "(x + 2)");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x", "y", "velocity")
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Exponential function: e^x
    Exp(Box<Expr>),
    /// Natural logarithm: ln(x)
    Ln(Box<Expr>),
    sin(Box<Expr>),
    cos(Box<Expr>),
    /// Tangent
    tg(Box<Expr>),
    /// Cotangent
    ctg(Box<Expr>),
    arcsin(Box<Expr>),
    arccos(Box<Expr>),
    /// Arctangent
    arctg(Box<Expr>),
    /// Arccotangent
    arcctg(Box<Expr>),
    sqrt(Box<Expr>),
    abs(Box<Expr>),
}

/// Error raised when an expression cannot be reduced to a number.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A variable has no value in the substitution
    UnboundSymbol(String),
    /// `vars` and `values` have different lengths
    ArgumentMismatch { vars: usize, values: usize },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EvalError::UnboundSymbol(name) => write!(f, "symbol '{}' has no value", name),
            EvalError::ArgumentMismatch { vars, values } => write!(
                f,
                "{} variable names given but {} values",
                vars, values
            ),
        }
    }
}

impl std::error::Error for EvalError {}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ^ {})", base, exp),
            Expr::Exp(expr) => write!(f, "exp({})", expr),
            Expr::Ln(expr) => write!(f, "ln({})", expr),
            Expr::sin(expr) => write!(f, "sin({})", expr),
            Expr::cos(expr) => write!(f, "cos({})", expr),
            Expr::tg(expr) => write!(f, "tg({})", expr),
            Expr::ctg(expr) => write!(f, "ctg({})", expr),
            Expr::arcsin(expr) => write!(f, "arcsin({})", expr),
            Expr::arccos(expr) => write!(f, "arccos({})", expr),
            Expr::arctg(expr) => write!(f, "arctg({})", expr),
            Expr::arcctg(expr) => write!(f, "arcctg({})", expr),
            Expr::sqrt(expr) => write!(f, "sqrt({})", expr),
            Expr::abs(expr) => write!(f, "abs({})", expr),
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// Parses a string into a symbolic expression.
    ///
    /// # Examples
    /// ```
    /// use RustedNLD::symbolic::symbolic_engine::Expr;
    /// let expr = Expr::parse_expression("sin(y) - x*p").unwrap();
    /// assert_eq!(expr.to_string(), "(sin(y) - (x * p))");
    /// ```
    pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
        parse_expression_func(input)
    }

    /// Wraps expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Creates power expression self^rhs.
    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    /// Argument of a one-argument function node, `None` for leaves and binary nodes.
    fn unary_arg(&self) -> Option<&Expr> {
        match self {
            Expr::Exp(e)
            | Expr::Ln(e)
            | Expr::sin(e)
            | Expr::cos(e)
            | Expr::tg(e)
            | Expr::ctg(e)
            | Expr::arcsin(e)
            | Expr::arccos(e)
            | Expr::arctg(e)
            | Expr::arcctg(e)
            | Expr::sqrt(e)
            | Expr::abs(e) => Some(e),
            _ => None,
        }
    }

    /// Collects every variable name appearing in the expression.
    ///
    /// The result is ordered alphabetically and contains each name once.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut acc = BTreeSet::new();
        self.collect_symbols(&mut acc);
        acc
    }

    fn collect_symbols(&self, acc: &mut BTreeSet<String>) {
        match self {
            Expr::Var(name) => {
                acc.insert(name.clone());
            }
            Expr::Const(_) => {}
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                lhs.collect_symbols(acc);
                rhs.collect_symbols(acc);
            }
            other => {
                if let Some(arg) = other.unary_arg() {
                    arg.collect_symbols(acc);
                }
            }
        }
    }

    /// Evaluates the expression with `vars[i]` bound to `values[i]`.
    ///
    /// Fails with `EvalError::UnboundSymbol` for a variable missing from `vars`.
    /// Domain errors (log of a negative number, division by zero) are not
    /// errors here, they produce NaN or infinity like the f64 functions do.
    pub fn eval_expression(&self, vars: &[&str], values: &[f64]) -> Result<f64, EvalError> {
        if vars.len() != values.len() {
            return Err(EvalError::ArgumentMismatch {
                vars: vars.len(),
                values: values.len(),
            });
        }
        self.eval_unchecked(vars, values)
    }

    fn eval_unchecked(&self, vars: &[&str], values: &[f64]) -> Result<f64, EvalError> {
        let res = match self {
            Expr::Var(name) => {
                let index = vars
                    .iter()
                    .position(|&x| x == name)
                    .ok_or_else(|| EvalError::UnboundSymbol(name.clone()))?;
                values[index]
            }
            Expr::Const(val) => *val,
            Expr::Add(lhs, rhs) => lhs.eval_unchecked(vars, values)? + rhs.eval_unchecked(vars, values)?,
            Expr::Sub(lhs, rhs) => lhs.eval_unchecked(vars, values)? - rhs.eval_unchecked(vars, values)?,
            Expr::Mul(lhs, rhs) => lhs.eval_unchecked(vars, values)? * rhs.eval_unchecked(vars, values)?,
            Expr::Div(lhs, rhs) => lhs.eval_unchecked(vars, values)? / rhs.eval_unchecked(vars, values)?,
            Expr::Pow(base, exp) => {
                let base = base.eval_unchecked(vars, values)?;
                let exp = exp.eval_unchecked(vars, values)?;
                // integer exponents keep negative bases real
                if exp.fract() == 0.0 && exp.abs() <= i32::MAX as f64 {
                    base.powi(exp as i32)
                } else {
                    base.powf(exp)
                }
            }
            Expr::Exp(e) => e.eval_unchecked(vars, values)?.exp(),
            Expr::Ln(e) => e.eval_unchecked(vars, values)?.ln(),
            Expr::sin(e) => e.eval_unchecked(vars, values)?.sin(),
            Expr::cos(e) => e.eval_unchecked(vars, values)?.cos(),
            Expr::tg(e) => e.eval_unchecked(vars, values)?.tan(),
            Expr::ctg(e) => 1.0 / e.eval_unchecked(vars, values)?.tan(),
            Expr::arcsin(e) => e.eval_unchecked(vars, values)?.asin(),
            Expr::arccos(e) => e.eval_unchecked(vars, values)?.acos(),
            Expr::arctg(e) => e.eval_unchecked(vars, values)?.atan(),
            Expr::arcctg(e) => std::f64::consts::FRAC_PI_2 - e.eval_unchecked(vars, values)?.atan(),
            Expr::sqrt(e) => e.eval_unchecked(vars, values)?.sqrt(),
            Expr::abs(e) => e.eval_unchecked(vars, values)?.abs(),
        };
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    #[test]
    fn test_display() {
        let expr = Expr::sin(var("y").boxed()) - var("x") * var("p");
        assert_eq!(expr.to_string(), "(sin(y) - (x * p))");
        let expr = Expr::Exp(var("x").pow(Expr::Const(2.0)).boxed());
        assert_eq!(expr.to_string(), "exp((x ^ 2))");
    }

    #[test]
    fn test_symbols_are_unique_and_sorted() {
        let expr = var("y") * var("x") + Expr::cos(var("t").boxed()) - var("x");
        let symbols: Vec<String> = expr.symbols().into_iter().collect();
        assert_eq!(symbols, vec!["t", "x", "y"]);
        assert!(Expr::Const(3.0).symbols().is_empty());
    }

    #[test]
    fn test_eval_expression() {
        let expr = Expr::sin(var("y").boxed()) - var("x") * var("p");
        let value = expr
            .eval_expression(&["x", "y", "p"], &[2.0, 0.5, 3.0])
            .unwrap();
        assert_relative_eq!(value, 0.5_f64.sin() - 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eval_functions() {
        let vars = ["x"];
        let at = |e: Expr, x: f64| e.eval_expression(&vars, &[x]).unwrap();
        assert_relative_eq!(at(Expr::sqrt(var("x").boxed()), 9.0), 3.0);
        assert_relative_eq!(at(Expr::abs(var("x").boxed()), -2.5), 2.5);
        assert_relative_eq!(at(Expr::ctg(var("x").boxed()), 1.0), 1.0 / 1.0_f64.tan());
        assert_relative_eq!(
            at(Expr::arcctg(var("x").boxed()), 1.0),
            std::f64::consts::FRAC_PI_4,
            epsilon = 1e-12
        );
        // negative base with integer exponent stays real
        assert_relative_eq!(at(var("x").pow(Expr::Const(3.0)), -2.0), -8.0);
    }

    #[test]
    fn test_eval_unbound_symbol() {
        let expr = var("x") + var("q");
        let err = expr.eval_expression(&["x"], &[1.0]).unwrap_err();
        assert_eq!(err, EvalError::UnboundSymbol("q".to_string()));
    }

    #[test]
    fn test_eval_argument_mismatch() {
        let err = var("x").eval_expression(&["x", "y"], &[1.0]).unwrap_err();
        assert_eq!(err, EvalError::ArgumentMismatch { vars: 2, values: 1 });
    }
}
