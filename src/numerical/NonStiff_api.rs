//! Explicit solvers for non-stiff initial value problems.
//!
//! Two methods are available:
//! * `DOPRI` - adaptive Dormand-Prince 5(4) with embedded error estimate and a
//!   4th order continuous extension, used to resample the solution on a uniform grid
//! * `RK4` - classic fixed step Runge-Kutta, stepping the uniform grid directly
//!
//! # Example
//! ```
//! use RustedNLD::numerical::NonStiff_api::{NonStiffODE, SolverSettings};
//! use nalgebra::DVector;
//! use RustedNLD::numerical::equation_system::EquationError;
//! let rhs = |_t: f64, y: &DVector<f64>| -> Result<DVector<f64>, EquationError> { Ok(-y) };
//! let mut solver = NonStiffODE::new(SolverSettings::default());
//! let trajectory = solver
//!     .solve(&rhs, (0.0, 1.0), &DVector::from_vec(vec![1.0]), 11, None)
//!     .unwrap();
//! assert!((trajectory.y[(0, 10)] - (-1.0f64).exp()).abs() < 1e-6);
//! ```
use crate::numerical::equation_system::EquationError;
use enum_dispatch::enum_dispatch;
use log::{error, info, warn};
use nalgebra::{DMatrix, DVector};
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use strum_macros::{Display, EnumIter, EnumString};
use tabled::{builder::Builder, settings::Style};

/// right-hand side of y' = f(t, y)
pub type Rhs<'a> = dyn Fn(f64, &DVector<f64>) -> Result<DVector<f64>, EquationError> + 'a;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Method {
    #[default]
    DOPRI,
    RK4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    pub method: Method,
    pub rtol: f64,
    pub atol: f64,
    pub max_step: f64,
    /// initial step of the adaptive method, estimated when None
    pub first_step: Option<f64>,
    pub max_steps: usize,
    /// RK4 steps per sample interval
    pub rk4_substeps: usize,
    pub max_wall_time: Duration,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            method: Method::DOPRI,
            rtol: 1e-6,
            atol: 1e-9,
            max_step: f64::INFINITY,
            first_step: None,
            max_steps: 1_000_000,
            rk4_substeps: 10,
            max_wall_time: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntegrationError {
    InvalidTimeSpan { t0: f64, t1: f64 },
    InvalidSampleCount(usize),
    EmptySystem,
    DimensionMismatch { expected: usize, got: usize },
    NonFinite { t: f64 },
    StepSizeTooSmall { t: f64 },
    MaxStepsExceeded { t: f64 },
    WallTimeExceeded { t: f64 },
    Cancelled { t: f64 },
    Rhs(EquationError),
}

impl fmt::Display for IntegrationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IntegrationError::InvalidTimeSpan { t0, t1 } => write!(
                f,
                "invalid time span ({}, {}): end must be finite and greater than start",
                t0, t1
            ),
            IntegrationError::InvalidSampleCount(n) => {
                write!(f, "at least 2 samples are required, got {}", n)
            }
            IntegrationError::EmptySystem => write!(f, "the system has no equations"),
            IntegrationError::DimensionMismatch { expected, got } => write!(
                f,
                "initial conditions have {} values but the right-hand side returns {}",
                expected, got
            ),
            IntegrationError::NonFinite { t } => {
                write!(f, "solution is no longer finite at t = {}", t)
            }
            IntegrationError::StepSizeTooSmall { t } => {
                write!(f, "required step size is less than spacing between numbers at t = {}", t)
            }
            IntegrationError::MaxStepsExceeded { t } => {
                write!(f, "maximum number of steps exceeded at t = {}", t)
            }
            IntegrationError::WallTimeExceeded { t } => {
                write!(f, "time limit exceeded at t = {}", t)
            }
            IntegrationError::Cancelled { t } => write!(f, "integration cancelled at t = {}", t),
            IntegrationError::Rhs(err) => write!(f, "right-hand side failed: {}", err),
        }
    }
}

impl std::error::Error for IntegrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntegrationError::Rhs(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EquationError> for IntegrationError {
    fn from(err: EquationError) -> Self {
        IntegrationError::Rhs(err)
    }
}

/// Uniformly sampled solution: column j of `y` is the state at `t[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub t: DVector<f64>,
    pub y: DMatrix<f64>,
}

impl Trajectory {
    pub fn nstates(&self) -> usize {
        self.y.nrows()
    }

    pub fn nsamples(&self) -> usize {
        self.y.ncols()
    }

    /// # Panics
    /// if `j >= self.nsamples()`
    pub fn state_at(&self, j: usize) -> DVector<f64> {
        self.y.column(j).into_owned()
    }

    /// `None` for a trajectory without samples
    pub fn final_state(&self) -> Option<DVector<f64>> {
        self.nsamples()
            .checked_sub(1)
            .map(|last| self.state_at(last))
    }
}

fn rms_norm(v: &DVector<f64>) -> f64 {
    v.norm() / (v.len() as f64).sqrt()
}

fn all_finite(v: &DVector<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

fn initial_derivative(
    rhs: &Rhs<'_>,
    t0: f64,
    y0: &DVector<f64>,
) -> Result<DVector<f64>, IntegrationError> {
    if !all_finite(y0) {
        return Err(IntegrationError::NonFinite { t: t0 });
    }
    let f0 = rhs(t0, y0)?;
    if f0.len() != y0.len() {
        return Err(IntegrationError::DimensionMismatch {
            expected: y0.len(),
            got: f0.len(),
        });
    }
    if !all_finite(&f0) {
        return Err(IntegrationError::NonFinite { t: t0 });
    }
    Ok(f0)
}

#[enum_dispatch]
pub enum Solvers {
    DOPRI(DormandPrince),
    RK4(RK4),
}

impl Solvers {
    pub fn new(settings: &SolverSettings, sample_count: usize) -> Solvers {
        match settings.method {
            Method::DOPRI => Solvers::DOPRI(DormandPrince::new(settings)),
            Method::RK4 => Solvers::RK4(RK4::new(
                (sample_count.saturating_sub(1) * settings.rk4_substeps.max(1)).max(1),
            )),
        }
    }
}

#[enum_dispatch(Solvers)]
pub trait Solver {
    fn set_initial(
        &mut self,
        rhs: &Rhs<'_>,
        t0: f64,
        y0: DVector<f64>,
        t_bound: f64,
    ) -> Result<(), IntegrationError>;
    /// advances by one accepted step, never past `t_bound`
    fn step(&mut self, rhs: &Rhs<'_>, t_bound: f64) -> Result<(), IntegrationError>;
    fn t(&self) -> f64;
    fn y(&self) -> &DVector<f64>;
    /// solution inside the last step
    fn dense_output(&self, t: f64) -> DVector<f64>;
    /// accepted and rejected steps
    fn counters(&self) -> (usize, usize);
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////
//                              DORMAND-PRINCE 5(4)
///////////////////////////////////////////////////////////////////////////////////////////////////////////////
const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];
const A: [[f64; 5]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
    ],
];
const B: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];
// difference between the 5th and the embedded 4th order weights
const E: [f64; 7] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];
// continuous extension, y(t_old + x*h) = y_old + h * sum_j (K^T P)_j x^(j+1)
const P: [[f64; 4]; 7] = [
    [
        1.0,
        -8048581381.0 / 2820520608.0,
        8663915743.0 / 2820520608.0,
        -12715105075.0 / 11282082432.0,
    ],
    [0.0, 0.0, 0.0, 0.0],
    [
        0.0,
        131558114200.0 / 32700410799.0,
        -68118460800.0 / 10900136933.0,
        87487479700.0 / 32700410799.0,
    ],
    [
        0.0,
        -1754552775.0 / 470086768.0,
        14199869525.0 / 1410260304.0,
        -10690763975.0 / 1880347072.0,
    ],
    [
        0.0,
        127303824393.0 / 49829197408.0,
        -318862633887.0 / 49829197408.0,
        701980252875.0 / 199316789632.0,
    ],
    [
        0.0,
        -282668133.0 / 205662961.0,
        2019193451.0 / 616988883.0,
        -1453857185.0 / 822651844.0,
    ],
    [
        0.0,
        40617522.0 / 29380423.0,
        -110615467.0 / 29380423.0,
        69997945.0 / 29380423.0,
    ],
];
const ERROR_ESTIMATOR_ORDER: f64 = 4.0;
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

pub struct DormandPrince {
    pub t: f64,
    pub y: DVector<f64>,
    f: DVector<f64>,
    t_old: f64,
    y_old: DVector<f64>,
    h_abs: f64,
    k: Vec<DVector<f64>>,
    rtol: f64,
    atol: f64,
    max_step: f64,
    first_step: Option<f64>,
    naccepted: usize,
    nrejected: usize,
}

impl DormandPrince {
    pub fn new(settings: &SolverSettings) -> DormandPrince {
        DormandPrince {
            t: 0.0,
            y: DVector::zeros(0),
            f: DVector::zeros(0),
            t_old: 0.0,
            y_old: DVector::zeros(0),
            h_abs: 0.0,
            k: Vec::new(),
            rtol: settings.rtol,
            atol: settings.atol,
            max_step: settings.max_step,
            first_step: settings.first_step,
            naccepted: 0,
            nrejected: 0,
        }
    }

    fn scale(&self, y: &DVector<f64>, y_new: &DVector<f64>) -> DVector<f64> {
        y.zip_map(y_new, |a, b| self.atol + a.abs().max(b.abs()) * self.rtol)
    }

    /// Hairer's starting step heuristic based on the first two derivatives.
    fn select_initial_step(
        &self,
        rhs: &Rhs<'_>,
        t0: f64,
        y0: &DVector<f64>,
        f0: &DVector<f64>,
        interval_length: f64,
    ) -> Result<f64, IntegrationError> {
        let scale = self.scale(y0, y0);
        let d0 = rms_norm(&y0.component_div(&scale));
        let d1 = rms_norm(&f0.component_div(&scale));
        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };
        let h0 = h0.min(interval_length);
        let y1 = y0 + h0 * f0;
        let f1 = rhs(t0 + h0, &y1)?;
        let d2 = rms_norm(&(f1 - f0).component_div(&scale)) / h0;
        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / (ERROR_ESTIMATOR_ORDER + 1.0))
        };
        let h = (100.0 * h0).min(h1).min(interval_length);
        // a non-finite second derivative must not poison the step size
        Ok(if h.is_finite() && h > 0.0 { h } else { h0 })
    }

    /// Single trial step of size h, fills the stage derivatives.
    fn rk_step(
        &mut self,
        rhs: &Rhs<'_>,
        h: f64,
    ) -> Result<(DVector<f64>, DVector<f64>), IntegrationError> {
        let t = self.t;
        let n = self.y.len();
        self.k[0] = self.f.clone();
        for s in 1..6 {
            let mut dy = DVector::<f64>::zeros(n);
            for j in 0..s {
                dy += A[s][j] * &self.k[j];
            }
            self.k[s] = rhs(t + C[s] * h, &(&self.y + h * dy))?;
        }
        let mut y_new = self.y.clone();
        for i in 0..6 {
            y_new += (h * B[i]) * &self.k[i];
        }
        let f_new = rhs(t + h, &y_new)?;
        self.k[6] = f_new.clone();
        Ok((y_new, f_new))
    }

    fn error_norm(&self, h: f64, y_new: &DVector<f64>) -> f64 {
        let mut err = DVector::<f64>::zeros(self.y.len());
        for i in 0..7 {
            err += (h * E[i]) * &self.k[i];
        }
        rms_norm(&err.component_div(&self.scale(&self.y, y_new)))
    }
}

impl Solver for DormandPrince {
    fn set_initial(
        &mut self,
        rhs: &Rhs<'_>,
        t0: f64,
        y0: DVector<f64>,
        t_bound: f64,
    ) -> Result<(), IntegrationError> {
        let f0 = initial_derivative(rhs, t0, &y0)?;
        let interval_length = t_bound - t0;
        let h_abs = match self.first_step {
            Some(h) => h.min(interval_length),
            None => self.select_initial_step(rhs, t0, &y0, &f0, interval_length)?,
        };
        self.h_abs = h_abs.min(self.max_step);
        self.t = t0;
        self.t_old = t0;
        self.y_old = y0.clone();
        self.y = y0;
        self.f = f0;
        self.k = vec![DVector::zeros(self.y.len()); 7];
        self.naccepted = 0;
        self.nrejected = 0;
        Ok(())
    }

    fn step(&mut self, rhs: &Rhs<'_>, t_bound: f64) -> Result<(), IntegrationError> {
        let t = self.t;
        let min_step = 10.0 * (t.abs() * f64::EPSILON).max(f64::MIN_POSITIVE);
        let mut h_abs = self.h_abs.clamp(min_step, self.max_step.max(min_step));
        let mut step_rejected = false;
        let mut non_finite = false;
        loop {
            if h_abs < min_step {
                return Err(if non_finite {
                    IntegrationError::NonFinite { t }
                } else {
                    IntegrationError::StepSizeTooSmall { t }
                });
            }
            let t_new = (t + h_abs).min(t_bound);
            let h = t_new - t;
            let (y_new, f_new) = self.rk_step(rhs, h)?;

            let error_norm = if all_finite(&y_new) && all_finite(&f_new) {
                self.error_norm(h, &y_new)
            } else {
                f64::INFINITY
            };
            if !error_norm.is_finite() {
                non_finite = true;
                step_rejected = true;
                self.nrejected += 1;
                h_abs = h.abs() * MIN_FACTOR;
                continue;
            }
            let factor = SAFETY * error_norm.powf(-1.0 / (ERROR_ESTIMATOR_ORDER + 1.0));
            if error_norm < 1.0 {
                let mut factor = if error_norm == 0.0 {
                    MAX_FACTOR
                } else {
                    factor.min(MAX_FACTOR)
                };
                if step_rejected {
                    factor = factor.min(1.0);
                }
                self.h_abs = h.abs() * factor;
                self.t_old = t;
                self.y_old = std::mem::replace(&mut self.y, y_new);
                self.t = t_new;
                self.f = f_new;
                self.naccepted += 1;
                return Ok(());
            }
            h_abs = h.abs() * factor.max(MIN_FACTOR);
            step_rejected = true;
            self.nrejected += 1;
        }
    }

    fn t(&self) -> f64 {
        self.t
    }

    fn y(&self) -> &DVector<f64> {
        &self.y
    }

    fn dense_output(&self, t: f64) -> DVector<f64> {
        let h = self.t - self.t_old;
        if h == 0.0 {
            return self.y.clone();
        }
        let x = ((t - self.t_old) / h).clamp(0.0, 1.0);
        let mut y = self.y_old.clone();
        let mut x_pow = 1.0;
        for j in 0..4 {
            x_pow *= x;
            let mut q = DVector::<f64>::zeros(self.y.len());
            for (i, k) in self.k.iter().enumerate() {
                if P[i][j] != 0.0 {
                    q += P[i][j] * k;
                }
            }
            y += (h * x_pow) * q;
        }
        y
    }

    fn counters(&self) -> (usize, usize) {
        (self.naccepted, self.nrejected)
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////
//                              CLASSIC RUNGE-KUTTA 4
///////////////////////////////////////////////////////////////////////////////////////////////////////////////
pub struct RK4 {
    pub t: f64,
    pub y: DVector<f64>,
    t0: f64,
    t_old: f64,
    y_old: DVector<f64>,
    h: f64,
    n_steps: usize,
    k: usize,
}

impl RK4 {
    /// `n_steps` uniform steps cover the whole time span
    pub fn new(n_steps: usize) -> RK4 {
        RK4 {
            t: 0.0,
            y: DVector::zeros(0),
            t0: 0.0,
            t_old: 0.0,
            y_old: DVector::zeros(0),
            h: 0.0,
            n_steps,
            k: 0,
        }
    }

    fn _step_impl(
        &self,
        rhs: &Rhs<'_>,
        t: f64,
        y: &DVector<f64>,
        h: f64,
    ) -> Result<DVector<f64>, IntegrationError> {
        let k1 = rhs(t, y)?;
        let k2 = rhs(t + h / 2.0, &(y + (h / 2.0) * &k1))?;
        let k3 = rhs(t + h / 2.0, &(y + (h / 2.0) * &k2))?;
        let k4 = rhs(t + h, &(y + h * &k3))?;
        Ok(y + (h / 6.0) * (k1 + 2.0 * k2 + 2.0 * k3 + k4))
    }
}

impl Solver for RK4 {
    fn set_initial(
        &mut self,
        rhs: &Rhs<'_>,
        t0: f64,
        y0: DVector<f64>,
        t_bound: f64,
    ) -> Result<(), IntegrationError> {
        initial_derivative(rhs, t0, &y0)?;
        self.t0 = t0;
        self.t = t0;
        self.t_old = t0;
        self.h = (t_bound - t0) / self.n_steps as f64;
        self.y_old = y0.clone();
        self.y = y0;
        self.k = 0;
        Ok(())
    }

    fn step(&mut self, rhs: &Rhs<'_>, t_bound: f64) -> Result<(), IntegrationError> {
        // grid points are computed from t0 so rounding does not accumulate
        let t_new = if self.k + 1 >= self.n_steps {
            t_bound
        } else {
            self.t0 + (self.k + 1) as f64 * self.h
        };
        let y_new = self._step_impl(rhs, self.t, &self.y, t_new - self.t)?;
        if !all_finite(&y_new) {
            return Err(IntegrationError::NonFinite { t: t_new });
        }
        self.k += 1;
        self.t_old = self.t;
        self.y_old = std::mem::replace(&mut self.y, y_new);
        self.t = t_new;
        Ok(())
    }

    fn t(&self) -> f64 {
        self.t
    }

    fn y(&self) -> &DVector<f64> {
        &self.y
    }

    // samples sit on step boundaries, linear interpolation only absorbs rounding
    fn dense_output(&self, t: f64) -> DVector<f64> {
        let h = self.t - self.t_old;
        if h == 0.0 {
            return self.y.clone();
        }
        let x = ((t - self.t_old) / h).clamp(0.0, 1.0);
        &self.y_old + x * (&self.y - &self.y_old)
    }

    fn counters(&self) -> (usize, usize) {
        (self.k, 0)
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////
//                              DRIVER
///////////////////////////////////////////////////////////////////////////////////////////////////////////////
pub struct NonStiffODE {
    pub settings: SolverSettings,
    calc_statistics: HashMap<String, usize>,
}

impl NonStiffODE {
    pub fn new(settings: SolverSettings) -> Self {
        NonStiffODE {
            settings,
            calc_statistics: HashMap::new(),
        }
    }

    /// Integrates y' = rhs(t, y), y(t0) = y0 over `t_span` and returns the
    /// solution at `sample_count` uniformly spaced times, both ends included.
    ///
    /// `cancel` is polled once per step.
    pub fn solve(
        &mut self,
        rhs: &Rhs<'_>,
        t_span: (f64, f64),
        y0: &DVector<f64>,
        sample_count: usize,
        cancel: Option<&AtomicBool>,
    ) -> Result<Trajectory, IntegrationError> {
        let (t0, t1) = t_span;
        if !(t0.is_finite() && t1.is_finite() && t1 > t0) {
            return Err(IntegrationError::InvalidTimeSpan { t0, t1 });
        }
        if sample_count < 2 {
            return Err(IntegrationError::InvalidSampleCount(sample_count));
        }
        if y0.is_empty() {
            return Err(IntegrationError::EmptySystem);
        }
        info!(
            "solving with {} on [{}, {}], {} states, {} samples",
            self.settings.method,
            t0,
            t1,
            y0.len(),
            sample_count
        );
        let nfev = Cell::new(0usize);
        let counted = |t: f64, y: &DVector<f64>| {
            nfev.set(nfev.get() + 1);
            rhs(t, y)
        };
        let start = Instant::now();
        let mut solver = Solvers::new(&self.settings, sample_count);
        let res = self.main_loop(&mut solver, &counted, t_span, y0, sample_count, cancel, start);

        let (accepted, rejected) = solver.counters();
        self.calc_statistics = HashMap::from([
            ("number of rhs evaluations".to_string(), nfev.get()),
            ("accepted steps".to_string(), accepted),
            ("rejected steps".to_string(), rejected),
            ("number of samples".to_string(), sample_count),
            ("elapsed time, ms".to_string(), start.elapsed().as_millis() as usize),
        ]);
        self.calc_statistics();
        match &res {
            Ok(_) => info!("integration finished"),
            Err(IntegrationError::Cancelled { t }) => warn!("integration cancelled at t = {}", t),
            Err(e) => error!("integration failed: {}", e),
        }
        res
    }

    #[allow(clippy::too_many_arguments)]
    fn main_loop(
        &self,
        solver: &mut Solvers,
        rhs: &Rhs<'_>,
        t_span: (f64, f64),
        y0: &DVector<f64>,
        sample_count: usize,
        cancel: Option<&AtomicBool>,
        start: Instant,
    ) -> Result<Trajectory, IntegrationError> {
        let (t0, t1) = t_span;
        solver.set_initial(rhs, t0, y0.clone(), t1)?;

        let times = sample_times(t0, t1, sample_count);
        let mut y_res = DMatrix::<f64>::zeros(y0.len(), sample_count);
        y_res.set_column(0, y0);
        let mut next = 1;
        let mut steps = 0;
        while next < sample_count {
            let t = solver.t();
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                return Err(IntegrationError::Cancelled { t });
            }
            if start.elapsed() > self.settings.max_wall_time {
                return Err(IntegrationError::WallTimeExceeded { t });
            }
            if steps >= self.settings.max_steps {
                return Err(IntegrationError::MaxStepsExceeded { t });
            }
            solver.step(rhs, t1)?;
            steps += 1;

            let t_new = solver.t();
            let finished = t_new >= t1;
            while next < sample_count && (finished || times[next] <= t_new) {
                let y = if times[next] == t_new || (finished && next == sample_count - 1) {
                    solver.y().clone()
                } else {
                    solver.dense_output(times[next])
                };
                y_res.set_column(next, &y);
                next += 1;
            }
        }
        Ok(Trajectory {
            t: DVector::from_vec(times),
            y: y_res,
        })
    }

    pub fn get_statistics(&self) -> &HashMap<String, usize> {
        &self.calc_statistics
    }

    fn calc_statistics(&self) {
        let mut table = Builder::from(self.calc_statistics.clone()).build();
        table.with(Style::modern_rounded());
        info!("\n \n CALC STATISTICS \n \n {}", table.to_string());
    }
}

/// `n` uniformly spaced points, the last one exactly `t1`
pub fn sample_times(t0: f64, t1: f64, n: usize) -> Vec<f64> {
    let dt = (t1 - t0) / n.saturating_sub(1).max(1) as f64;
    (0..n)
        .map(|j| if j + 1 == n { t1 } else { t0 + j as f64 * dt })
        .collect()
}
