//! Phase portraits of integrated trajectories.
//!
//! One state is drawn against time, two states as a phase plane and three or
//! more as a 3-D curve over the first three. The path is split into short
//! segments coloured along a hue ramp by sample index, so the direction of
//! time can be read off the picture.
use crate::numerical::NonStiff_api::Trajectory;
use chrono::Local;
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

pub const TITLE: &str = "Evolution of the state";

/// Rendered image ready to be handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub title: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    EmptyTrajectory,
    /// fewer labels than plotted states
    MissingLabels { expected: usize, got: usize },
    NonFiniteData,
    Backend(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RenderError::EmptyTrajectory => write!(f, "nothing to plot, the trajectory is empty"),
            RenderError::MissingLabels { expected, got } => {
                write!(f, "expected {} axis labels, got {}", expected, got)
            }
            RenderError::NonFiniteData => write!(f, "trajectory contains non-finite values"),
            RenderError::Backend(msg) => write!(f, "plotting failed: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

fn backend_error<E: fmt::Display>(e: E) -> RenderError {
    RenderError::Backend(e.to_string())
}

pub trait TrajectoryRenderer {
    fn render(&self, trajectory: &Trajectory, labels: &[String]) -> Result<Artifact, RenderError>;
}

/// PNG renderer built on plotters' bitmap backend.
#[derive(Debug, Clone)]
pub struct PhasePortraitRenderer {
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    /// samples per coloured segment
    pub segment_len: usize,
    pub time_label: String,
}

impl Default for PhasePortraitRenderer {
    fn default() -> Self {
        PhasePortraitRenderer {
            output_dir: PathBuf::from("."),
            width: 1000,
            height: 800,
            segment_len: 10,
            time_label: "t".to_string(),
        }
    }
}

/// axis range of the data with a 5% margin
fn padded_range<'a>(values: impl Iterator<Item = &'a f64>) -> Result<Range<f64>, RenderError> {
    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &v in values {
        if !v.is_finite() {
            return Err(RenderError::NonFiniteData);
        }
        min = min.min(v);
        max = max.max(v);
    }
    let span = max - min;
    let pad = if span > 0.0 {
        0.05 * span
    } else {
        (0.05 * max.abs()).max(1.0)
    };
    Ok(min - pad..max + pad)
}

/// red at the start of the path, violet at the end
fn progression_color(i: usize, n: usize) -> HSLColor {
    let frac = i as f64 / n.max(1) as f64;
    HSLColor(0.75 * frac, 0.8, 0.45)
}

/// Start indices of the segments, each covering `segment_len + 1` samples so
/// that consecutive segments share an end point.
fn segment_starts(nsamples: usize, segment_len: usize) -> impl Iterator<Item = usize> {
    (0..nsamples.saturating_sub(1)).step_by(segment_len.max(1))
}

impl PhasePortraitRenderer {
    pub fn new(output_dir: &Path, width: u32, height: u32) -> Self {
        PhasePortraitRenderer {
            output_dir: output_dir.to_path_buf(),
            width,
            height,
            ..PhasePortraitRenderer::default()
        }
    }

    fn file_path(&self) -> PathBuf {
        let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S%.3f");
        self.output_dir
            .join(format!("solution_{}.png", date_and_time))
    }

    fn draw_2d(
        &self,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        xs: &[f64],
        ys: &[f64],
        x_desc: &str,
        y_desc: &str,
    ) -> Result<(), RenderError> {
        let mut chart = ChartBuilder::on(root)
            .caption(TITLE, ("sans-serif", 40))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(padded_range(xs.iter())?, padded_range(ys.iter())?)
            .map_err(backend_error)?;
        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .draw()
            .map_err(backend_error)?;

        let n = xs.len();
        chart
            .draw_series(segment_starts(n, self.segment_len).map(|i| {
                let end = (i + self.segment_len + 1).min(n);
                let points: Vec<(f64, f64)> = (i..end).map(|j| (xs[j], ys[j])).collect();
                PathElement::new(points, progression_color(i, n).stroke_width(2))
            }))
            .map_err(backend_error)?;
        Ok(())
    }

    fn draw_3d(
        &self,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        coords: [&[f64]; 3],
        labels: &[String],
    ) -> Result<(), RenderError> {
        let [xs, ys, zs] = coords;
        let mut chart = ChartBuilder::on(root)
            .caption(TITLE, ("sans-serif", 40))
            .margin(20)
            .build_cartesian_3d(
                padded_range(xs.iter())?,
                padded_range(ys.iter())?,
                padded_range(zs.iter())?,
            )
            .map_err(backend_error)?;
        chart.with_projection(|mut pb| {
            pb.yaw = 0.6;
            pb.pitch = 0.35;
            pb.scale = 0.85;
            pb.into_matrix()
        });
        chart
            .configure_axes()
            .light_grid_style(BLACK.mix(0.15))
            .max_light_lines(3)
            .draw()
            .map_err(backend_error)?;

        let n = xs.len();
        chart
            .draw_series(segment_starts(n, self.segment_len).map(|i| {
                let end = (i + self.segment_len + 1).min(n);
                let points: Vec<(f64, f64, f64)> =
                    (i..end).map(|j| (xs[j], ys[j], zs[j])).collect();
                PathElement::new(points, progression_color(i, n).stroke_width(2))
            }))
            .map_err(backend_error)?;

        let axes = format!("x: {}, y: {}, z: {}", labels[0], labels[1], labels[2]);
        root.draw(&Text::new(
            axes,
            (20, self.height as i32 - 30),
            ("sans-serif", 20).into_font(),
        ))
        .map_err(backend_error)?;
        Ok(())
    }
}

impl TrajectoryRenderer for PhasePortraitRenderer {
    fn render(&self, trajectory: &Trajectory, labels: &[String]) -> Result<Artifact, RenderError> {
        let nstates = trajectory.nstates();
        if nstates == 0 || trajectory.nsamples() == 0 {
            return Err(RenderError::EmptyTrajectory);
        }
        let plotted = nstates.min(3);
        if labels.len() < plotted {
            return Err(RenderError::MissingLabels {
                expected: plotted,
                got: labels.len(),
            });
        }
        let rows: Vec<Vec<f64>> = (0..plotted)
            .map(|i| trajectory.y.row(i).iter().copied().collect())
            .collect();

        let path = self.file_path();
        {
            let root = BitMapBackend::new(&path, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(backend_error)?;
            match plotted {
                1 => self.draw_2d(
                    &root,
                    trajectory.t.as_slice(),
                    &rows[0],
                    &self.time_label,
                    &labels[0],
                )?,
                2 => self.draw_2d(&root, &rows[0], &rows[1], &labels[0], &labels[1])?,
                _ => self.draw_3d(&root, [&rows[0], &rows[1], &rows[2]], labels)?,
            }
            root.present().map_err(backend_error)?;
        }
        info!("trajectory plotted into {}", path.display());

        let caption = if nstates > 3 {
            format!(
                "{} (first 3 of {} states: {})",
                TITLE,
                nstates,
                labels[..3].join(", ")
            )
        } else {
            format!("{}: {}", TITLE, labels[..plotted].join(", "))
        };
        Ok(Artifact {
            path,
            title: "solution".to_string(),
            caption,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DMatrix, DVector};

    fn circle(nstates: usize, nsamples: usize) -> Trajectory {
        let t = DVector::from_fn(nsamples, |j, _| j as f64 * 0.01);
        let y = DMatrix::from_fn(nstates, nsamples, |i, j| {
            let phase = t[j] + i as f64;
            if i % 2 == 0 { phase.cos() } else { phase.sin() }
        });
        Trajectory { t, y }
    }

    fn labels(n: usize) -> Vec<String> {
        ["x", "y", "z", "w"][..n].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_padded_range() {
        let r = padded_range([0.0, 10.0].iter()).unwrap();
        assert_eq!(r, -0.5..10.5);
        let r = padded_range([2.0, 2.0].iter()).unwrap();
        assert_eq!(r, 1.0..3.0);
        assert_eq!(
            padded_range([1.0, f64::NAN].iter()).unwrap_err(),
            RenderError::NonFiniteData
        );
    }

    #[test]
    fn test_segments_cover_whole_path() {
        let starts: Vec<usize> = segment_starts(25, 10).collect();
        assert_eq!(starts, vec![0, 10, 20]);
        assert_eq!(segment_starts(1, 10).count(), 0);
    }

    #[test]
    fn test_render_phase_plane() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PhasePortraitRenderer::new(dir.path(), 400, 300);
        let artifact = renderer.render(&circle(2, 200), &labels(2)).unwrap();
        assert!(artifact.path.exists());
        assert!(artifact.path.starts_with(dir.path()));
        assert_eq!(artifact.path.extension().unwrap(), "png");
        assert!(artifact.caption.contains("x, y"));
    }

    #[test]
    fn test_render_single_state_against_time() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PhasePortraitRenderer::new(dir.path(), 400, 300);
        let artifact = renderer.render(&circle(1, 50), &labels(1)).unwrap();
        assert!(artifact.path.exists());
    }

    #[test]
    fn test_render_3d_uses_first_three_states() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PhasePortraitRenderer::new(dir.path(), 400, 300);
        let artifact = renderer.render(&circle(4, 100), &labels(4)).unwrap();
        assert!(artifact.path.exists());
        assert!(artifact.caption.contains("first 3 of 4"));
    }

    #[test]
    fn test_render_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PhasePortraitRenderer::new(dir.path(), 400, 300);
        assert_eq!(
            renderer.render(&circle(2, 10), &labels(1)).unwrap_err(),
            RenderError::MissingLabels { expected: 2, got: 1 }
        );
        let mut trajectory = circle(2, 10);
        trajectory.y[(1, 5)] = f64::INFINITY;
        assert_eq!(
            renderer.render(&trajectory, &labels(2)).unwrap_err(),
            RenderError::NonFiniteData
        );
        let empty = Trajectory {
            t: DVector::zeros(0),
            y: DMatrix::zeros(0, 0),
        };
        assert_eq!(
            renderer.render(&empty, &labels(0)).unwrap_err(),
            RenderError::EmptyTrajectory
        );
    }
}
