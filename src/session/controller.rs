use crate::Utils::config::{NldConfig, SessionSettings};
use crate::Utils::plots::{Artifact, TrajectoryRenderer};
use crate::numerical::NonStiff_api::{IntegrationError, NonStiffODE, SolverSettings, Trajectory};
use crate::numerical::equation_system::EquationSystem;
use crate::session::commands::{Keyword, parse_equation, parse_initial_conditions};
use log::{info, warn};
use nalgebra::DVector;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    AuthoringEquations,
    AwaitingInitialConditions,
}

/// Message for the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Warning(String),
    Error(String),
    Artifact(Artifact),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Reply::Text(msg) => write!(f, "{}", msg),
            Reply::Warning(msg) => write!(f, "warning: {}", msg),
            Reply::Error(msg) => write!(f, "error: {}", msg),
            Reply::Artifact(a) => write!(f, "[{}] {} ({})", a.title, a.caption, a.path.display()),
        }
    }
}

fn text(msg: impl Into<String>) -> Reply {
    Reply::Text(msg.into())
}

const ENTER_EQUATIONS: &str = "You can now enter the equations of motion, or 'q' to exit";
const ADD_MORE: &str = "Add more, or solve added states? [solve]";

/// State machine sequencing equation authoring, integration and rendering.
///
/// Commands are processed one at a time in delivery order; equation insertion
/// order fixes the index of every state.
pub struct Session {
    mode: Mode,
    system: EquationSystem,
    last_trajectory: Option<Trajectory>,
    solver: NonStiffODE,
    settings: SessionSettings,
    renderer: Box<dyn TrajectoryRenderer + Send>,
    cancel: Arc<AtomicBool>,
}

impl Session {
    pub fn new(config: &NldConfig, renderer: Box<dyn TrajectoryRenderer + Send>) -> Self {
        Session::with_settings(config.solver.clone(), config.session.clone(), renderer)
    }

    pub fn with_settings(
        solver: SolverSettings,
        settings: SessionSettings,
        renderer: Box<dyn TrajectoryRenderer + Send>,
    ) -> Self {
        Session {
            mode: Mode::Idle,
            system: EquationSystem::new("NLD", &settings.time_symbol),
            last_trajectory: None,
            solver: NonStiffODE::new(solver),
            settings,
            renderer,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn system(&self) -> &EquationSystem {
        &self.system
    }

    pub fn last_trajectory(&self) -> Option<&Trajectory> {
        self.last_trajectory.as_ref()
    }

    /// Setting the token stops a running integration at its next step.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn handle(&mut self, input: &str) -> Vec<Reply> {
        let input = input.trim();
        if input.is_empty() {
            return Vec::new();
        }
        match Keyword::lookup(input) {
            Some(Keyword::Greet) => vec![text("Hi, welcome back!")],
            Some(Keyword::Nld) => self.enter(),
            Some(Keyword::Reset) => self.reset(),
            Some(Keyword::Quit) => self.quit(),
            Some(Keyword::Solve) => self.request_initial_conditions(),
            None => match self.mode {
                Mode::Idle => vec![text("Enter '$nld' to start writing equations of motion")],
                Mode::AuthoringEquations => self.add_equation(input),
                Mode::AwaitingInitialConditions => self.integrate(input),
            },
        }
    }

    fn enter(&mut self) -> Vec<Reply> {
        if self.mode != Mode::Idle {
            return vec![text(format!(
                "Already in nld mode, states so far: {:?}",
                self.system.states()
            ))];
        }
        self.mode = Mode::AuthoringEquations;
        info!("switched to nld mode");
        vec![text("Switched to nld mode"), text(ENTER_EQUATIONS)]
    }

    fn reset(&mut self) -> Vec<Reply> {
        self.system.restore_default();
        self.last_trajectory = None;
        self.mode = Mode::AuthoringEquations;
        vec![text("You can now enter new equations of motion, or 'q' to exit")]
    }

    fn quit(&mut self) -> Vec<Reply> {
        self.system.restore_default();
        self.last_trajectory = None;
        self.mode = Mode::Idle;
        info!("left nld mode");
        vec![text("Left nld mode, equations erased")]
    }

    fn request_initial_conditions(&mut self) -> Vec<Reply> {
        match self.mode {
            Mode::Idle => vec![text("Enter '$nld' first, then the equations of motion")],
            _ if self.system.is_empty() => vec![Reply::Error(
                "no equations to solve, enter them as <state>=<expression>".to_string(),
            )],
            _ => {
                self.mode = Mode::AwaitingInitialConditions;
                vec![text(format!(
                    "Please enter initial conditions for {:?} and time span separated by comma",
                    self.system.states()
                ))]
            }
        }
    }

    fn add_equation(&mut self, input: &str) -> Vec<Reply> {
        let (state, rhs) = match parse_equation(input) {
            Ok(eq) => eq,
            Err(e) => return vec![Reply::Error(e.to_string())],
        };
        match self.system.add_equation(&rhs, &state) {
            Ok(outcome) => {
                let mut replies = Vec::new();
                if outcome.replaced {
                    replies.push(Reply::Warning(format!(
                        "state '{}' already had an equation, it was replaced",
                        outcome.state
                    )));
                }
                replies.push(text(format!("equation for state '{}' added", outcome.state)));
                if !outcome.equationless.is_empty() {
                    replies.push(Reply::Warning(format!(
                        "Following states are equationless: {:?}",
                        outcome.equationless
                    )));
                }
                replies.push(text(ADD_MORE));
                replies
            }
            Err(e) => vec![Reply::Error(e.to_string())],
        }
    }

    fn integrate(&mut self, input: &str) -> Vec<Reply> {
        let ic = match parse_initial_conditions(
            input,
            self.system.len(),
            self.settings.max_end_time,
        ) {
            Ok(ic) => ic,
            Err(e) => {
                return vec![Reply::Error(format!(
                    "{}. Enter initial conditions for {:?} and the end time, or 'reset'",
                    e,
                    self.system.states()
                ))];
            }
        };
        // whatever happens next, the user is back to editing equations
        self.mode = Mode::AuthoringEquations;
        let mut replies = vec![text("Integrating the differentials")];

        let unbound = self.system.unbound_symbols();
        if !unbound.is_empty() {
            warn!("cannot integrate, unbound symbols {:?}", unbound);
            replies.push(Reply::Error(format!(
                "integration failed: symbols without equation {:?}",
                unbound
            )));
            replies.push(text(ADD_MORE));
            return replies;
        }

        match self.run_solver(&ic.y0, ic.t_end) {
            Ok(trajectory) => {
                match self.renderer.render(&trajectory, self.system.states()) {
                    Ok(artifact) => replies.push(Reply::Artifact(artifact)),
                    Err(e) => replies.push(Reply::Error(format!("rendering failed: {}", e))),
                }
                self.last_trajectory = Some(trajectory);
                replies.push(text(
                    "Enter solve to change initial conditions for current model.",
                ));
                replies.push(text(
                    "Enter 'reset' to change the equations of motion, 'q' to exit",
                ));
            }
            Err(IntegrationError::Cancelled { t }) => {
                // the request is consumed
                self.cancel.store(false, Ordering::SeqCst);
                replies.push(Reply::Warning(format!("integration cancelled at t = {}", t)));
            }
            Err(e) => {
                replies.push(Reply::Error(format!("integration failed: {}", e)));
                replies.push(text(ADD_MORE));
            }
        }
        replies
    }

    fn run_solver(&mut self, y0: &DVector<f64>, t_end: f64) -> Result<Trajectory, IntegrationError> {
        let system = &self.system;
        let rhs = |t: f64, y: &DVector<f64>| system.evaluate_at(t, y);
        self.solver.solve(
            &rhs,
            (0.0, t_end),
            y0,
            self.settings.sample_count,
            Some(self.cancel.as_ref()),
        )
    }
}
