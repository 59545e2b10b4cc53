//! Equation store and right-hand-side evaluator for a system of first-order ODEs
//! authored one equation at a time.
//!
//! Index `i` of every state vector corresponds to the `i`-th state name, which is
//! fixed by the order in which states received their first equation.
use crate::symbolic::parse_expr::{ParseError, identifier};
use crate::symbolic::symbolic_engine::{EvalError, Expr};
use log::{info, warn};
use nalgebra::DVector;
use nom::Parser;
use nom::combinator::all_consuming;
use std::collections::BTreeSet;
use std::fmt;

/// name of the independent variable unless configured otherwise
pub const DEFAULT_TIME_SYMBOL: &str = "t";

#[derive(Debug, Clone, PartialEq)]
pub enum EquationError {
    Parse(ParseError),
    /// the time symbol cannot be a state
    ReservedSymbol(String),
    /// coordinate vector length differs from the number of states
    DimensionMismatch { expected: usize, got: usize },
    /// a right-hand side refers to a name that is neither a state nor time
    UnboundSymbol(String),
}

impl fmt::Display for EquationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EquationError::Parse(err) => write!(f, "{}", err),
            EquationError::ReservedSymbol(name) => write!(
                f,
                "'{}' is reserved for time and cannot be a state",
                name
            ),
            EquationError::DimensionMismatch { expected, got } => write!(
                f,
                "expected {} values (one per state), got {}",
                expected, got
            ),
            EquationError::UnboundSymbol(name) => {
                write!(f, "symbol '{}' has no equation and no value", name)
            }
        }
    }
}

impl std::error::Error for EquationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EquationError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseError> for EquationError {
    fn from(err: ParseError) -> Self {
        EquationError::Parse(err)
    }
}

impl From<EvalError> for EquationError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::UnboundSymbol(name) => EquationError::UnboundSymbol(name),
            EvalError::ArgumentMismatch { vars, values } => EquationError::DimensionMismatch {
                expected: vars,
                got: values,
            },
        }
    }
}

/// What `add_equation` did.
#[derive(Debug, Clone, PartialEq)]
pub struct AddOutcome {
    pub state: String,
    /// position of the state in every state vector
    pub index: usize,
    /// the state already had an equation, which was replaced
    pub replaced: bool,
    /// advisory: symbols referenced but not defined, or states defined but never referenced
    pub equationless: Vec<String>,
}

/// Ordered collection of `d(state)/dt = expression` pairs.
#[derive(Debug, Clone)]
pub struct EquationSystem {
    pub name: String,
    time_symbol: String,
    states: Vec<String>,
    equations: Vec<Expr>,
    free_symbols: BTreeSet<String>,
}

impl Default for EquationSystem {
    fn default() -> Self {
        EquationSystem::new("NLD", DEFAULT_TIME_SYMBOL)
    }
}

impl EquationSystem {
    pub fn new(name: &str, time_symbol: &str) -> Self {
        EquationSystem {
            name: name.to_string(),
            time_symbol: time_symbol.to_string(),
            states: Vec::new(),
            equations: Vec::new(),
            free_symbols: BTreeSet::new(),
        }
    }

    /// Parses `rhs_text` and binds it to `state_name`.
    ///
    /// A new state is appended to the state list. A state that already has an
    /// equation keeps its index and gets the new right-hand side, `replaced` is
    /// set in the outcome. On error the store is left untouched.
    pub fn add_equation(
        &mut self,
        rhs_text: &str,
        state_name: &str,
    ) -> Result<AddOutcome, EquationError> {
        let state = state_name.trim();
        if all_consuming(identifier).parse(state).is_err() {
            return Err(ParseError::InvalidStateName(state.to_string()).into());
        }
        if state == self.time_symbol {
            return Err(EquationError::ReservedSymbol(state.to_string()));
        }
        let rhs = Expr::parse_expression(rhs_text)?;

        let (index, replaced) = match self.states.iter().position(|s| s == state) {
            Some(index) => {
                warn!(
                    "state '{}' already had an equation {}, replacing it with {}",
                    state, self.equations[index], rhs
                );
                self.equations[index] = rhs;
                (index, true)
            }
            None => {
                self.states.push(state.to_string());
                self.equations.push(rhs);
                (self.states.len() - 1, false)
            }
        };
        self.set_free_symbols();
        info!(
            "d{}/d{} = {} (state index {})",
            state, self.time_symbol, self.equations[index], index
        );

        let equationless = self.equationless();
        if !equationless.is_empty() {
            warn!("Following states are equationless: {:?}", equationless);
        }
        Ok(AddOutcome {
            state: state.to_string(),
            index,
            replaced,
            equationless,
        })
    }

    fn set_free_symbols(&mut self) {
        self.free_symbols = self
            .equations
            .iter()
            .flat_map(|eq| eq.symbols())
            .filter(|s| *s != self.time_symbol)
            .collect();
    }

    /// Symmetric difference between bound states and referenced symbols.
    pub fn equationless(&self) -> Vec<String> {
        let states: BTreeSet<String> = self.states.iter().cloned().collect();
        states
            .symmetric_difference(&self.free_symbols)
            .cloned()
            .collect()
    }

    /// Symbols referenced by some right-hand side that are not states.
    /// Evaluation fails while this is non-empty.
    pub fn unbound_symbols(&self) -> Vec<String> {
        self.free_symbols
            .iter()
            .filter(|s| !self.states.contains(s))
            .cloned()
            .collect()
    }

    pub fn restore_default(&mut self) {
        info!("erasing equations of system '{}'", self.name);
        self.states.clear();
        self.equations.clear();
        self.free_symbols.clear();
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn equations(&self) -> &[Expr] {
        &self.equations
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    /// Derivative of every state at `time` and `coordinates`, in state order.
    pub fn evaluate_at(
        &self,
        time: f64,
        coordinates: &DVector<f64>,
    ) -> Result<DVector<f64>, EquationError> {
        if coordinates.len() != self.states.len() {
            return Err(EquationError::DimensionMismatch {
                expected: self.states.len(),
                got: coordinates.len(),
            });
        }
        let mut vars: Vec<&str> = Vec::with_capacity(self.states.len() + 1);
        vars.push(&self.time_symbol);
        vars.extend(self.states.iter().map(String::as_str));
        let mut values: Vec<f64> = Vec::with_capacity(vars.len());
        values.push(time);
        values.extend(coordinates.iter());

        let derivatives = self
            .equations
            .iter()
            .map(|eq| eq.eval_expression(&vars, &values))
            .collect::<Result<Vec<f64>, EvalError>>()?;
        Ok(DVector::from_vec(derivatives))
    }
}
