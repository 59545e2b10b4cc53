/// Equation store and right-hand-side evaluator of a first-order ODE system
///  Example#1
/// ```
/// use RustedNLD::numerical::equation_system::EquationSystem;
/// use nalgebra::DVector;
/// let mut system = EquationSystem::default();
/// // equations may arrive in any order, state index is fixed by the first one
/// let outcome = system.add_equation("sin(y)-x*p", "x").unwrap();
/// println!("equationless: {:?}", outcome.equationless);
/// system.add_equation("x", "y").unwrap();
/// system.add_equation("0", "p").unwrap();
/// assert_eq!(system.states(), &["x", "y", "p"]);
/// let dy = system.evaluate_at(0.0, &DVector::from_vec(vec![1.0, 0.0, 2.0])).unwrap();
/// assert_eq!(dy.as_slice(), &[-2.0, 1.0, 0.0]);
/// ```
pub mod equation_system;
/// Solvers of non-stiff initial value problems: adaptive Dormand-Prince 5(4) with dense output and classic RK4
///  Example#1
/// ```
/// use RustedNLD::numerical::equation_system::EquationSystem;
/// use RustedNLD::numerical::NonStiff_api::{Method, NonStiffODE, SolverSettings};
/// use nalgebra::DVector;
/// let mut system = EquationSystem::default();
/// system.add_equation("y", "x").unwrap();
/// system.add_equation("-x", "y").unwrap();
/// let rhs = |t: f64, y: &DVector<f64>| system.evaluate_at(t, y);
/// for method in [Method::DOPRI, Method::RK4] {
///     let settings = SolverSettings { method, ..SolverSettings::default() };
///     let mut solver = NonStiffODE::new(settings);
///     let trajectory = solver
///         .solve(&rhs, (0.0, 10.0), &DVector::from_vec(vec![1.0, 0.0]), 500, None)
///         .unwrap();
///     assert_eq!(trajectory.y.shape(), (2, 500));
///     println!("final state {}", trajectory.final_state().unwrap());
/// }
/// ```
pub mod NonStiff_api;
