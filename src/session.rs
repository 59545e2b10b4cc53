//! Session controller: sequences "collect equations -> collect initial
//! conditions -> integrate -> render -> repeat" driven by short text commands.
/// keyword lookup table, equation and initial condition parsing
pub mod commands;
/// the state machine itself
///# Example
/// ```
/// use RustedNLD::Utils::plots::{Artifact, RenderError, TrajectoryRenderer};
/// use RustedNLD::numerical::NonStiff_api::Trajectory;
/// use RustedNLD::session::controller::{Mode, Reply, Session};
/// use RustedNLD::Utils::config::NldConfig;
/// struct Caption;
/// impl TrajectoryRenderer for Caption {
///     fn render(&self, t: &Trajectory, labels: &[String]) -> Result<Artifact, RenderError> {
///         Ok(Artifact {
///             path: "solution.png".into(),
///             title: "solution".to_string(),
///             caption: format!("{} samples of {:?}", t.nsamples(), labels),
///         })
///     }
/// }
/// let mut session = Session::new(&NldConfig::default(), Box::new(Caption));
/// for command in ["$nld", "x=y", "y=-x", "solve"] {
///     for reply in session.handle(command) {
///         println!("{}", reply);
///     }
/// }
/// assert_eq!(session.mode(), Mode::AwaitingInitialConditions);
/// let replies = session.handle("1, 0, 10");
/// assert!(replies.iter().any(|r| matches!(r, Reply::Artifact(_))));
/// assert_eq!(session.last_trajectory().unwrap().y.shape(), (2, 5000));
/// ```
pub mod controller;
/// runs a command off the input thread so that `q` can cancel it
pub mod dispatch;
