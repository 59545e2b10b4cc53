#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use RustedNLD::symbolic::symbolic_engine::Expr;
/// let input = "x^2.3 * log(x+y+y^2.6)";
/// let parsed_expression = Expr::parse_expression(input).unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// let value = parsed_expression.eval_expression(&["x", "y"], &[1.0, 2.0]).unwrap();
/// println!("{}, at x=1, y=2: {}  \n", input, value);
///  ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// 1) expression tree for right-hand sides of equations of motion
/// 2) symbol extraction and substitution
/// 3) numeric evaluation with named arguments
///# Example#
/// ```
/// use RustedNLD::symbolic::symbolic_engine::Expr;
/// let f = Expr::parse_expression("sin(y) - x*p").unwrap();
/// // every name the expression depends on
/// let symbols: Vec<String> = f.symbols().into_iter().collect();
/// assert_eq!(symbols, vec!["p", "x", "y"]);
/// let res = f.eval_expression(&["x", "y", "p"], &[1.0, 0.0, 2.0]).unwrap();
/// assert_eq!(res, -2.0);
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
