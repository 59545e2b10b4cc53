//! Settings of the solver, the session, the renderer and the logger, read from
//! an optional TOML file. Every key is optional.
//!
//! ```toml
//! [solver]
//! method = "DOPRI"        # or "RK4"
//! rtol = 1e-6
//! atol = 1e-9
//! max_step = 0.1
//! first_step = 1e-3
//! max_steps = 1000000
//! rk4_substeps = 10
//! max_wall_time = 60.0    # seconds
//!
//! [session]
//! sample_count = 5000
//! max_end_time = 1e4
//! time_symbol = "t"
//!
//! [render]
//! output_dir = "."
//! width = 1000
//! height = 800
//! segment_len = 10
//!
//! [logging]
//! level = "info"
//! to_file = false
//! ```
use crate::Utils::logger::parse_level;
use crate::numerical::NonStiff_api::{Method, SolverSettings};
use crate::numerical::equation_system::DEFAULT_TIME_SYMBOL;
use crate::symbolic::parse_expr::identifier;
use log::warn;
use nom::Parser;
use nom::combinator::all_consuming;
use simplelog::LevelFilter;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use toml::{Table, Value};

pub const DEFAULT_CONFIG_FILE: &str = "nld.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Toml { path: PathBuf, source: toml::de::Error },
    InvalidValue { key: String, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => {
                write!(f, "failed to parse TOML {}: {}", path.display(), source)
            }
            ConfigError::InvalidValue { key, message } => {
                write!(f, "invalid value of '{}': {}", key, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// uniform samples of every trajectory
    pub sample_count: usize,
    /// largest end time accepted with initial conditions
    pub max_end_time: f64,
    pub time_symbol: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            sample_count: 5000,
            max_end_time: 1e4,
            time_symbol: DEFAULT_TIME_SYMBOL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub segment_len: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            output_dir: PathBuf::from("."),
            width: 1000,
            height: 800,
            segment_len: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub to_file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: LevelFilter::Info,
            to_file: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NldConfig {
    pub solver: SolverSettings,
    pub session: SessionSettings,
    pub render: RenderSettings,
    pub logging: LoggingSettings,
}

/// Typed access to `[section] key` of a parsed table.
struct Section<'a> {
    name: &'static str,
    table: Option<&'a Table>,
}

impl<'a> Section<'a> {
    fn new(root: &'a Table, name: &'static str) -> Result<Self, ConfigError> {
        let table = match root.get(name) {
            None => None,
            Some(Value::Table(t)) => Some(t),
            Some(_) => return Err(invalid(name, "expected a table")),
        };
        Ok(Section { name, table })
    }

    fn key(&self, key: &str) -> String {
        format!("{}.{}", self.name, key)
    }

    fn warn_unknown(&self, known: &[&str]) {
        if let Some(table) = self.table {
            for k in table.keys().filter(|k| !known.contains(&k.as_str())) {
                warn!("unknown configuration key '{}' ignored", self.key(k));
            }
        }
    }

    fn value(&self, key: &str) -> Option<&'a Value> {
        self.table.and_then(|t| t.get(key))
    }

    fn f64(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Float(v)) => Ok(Some(*v)),
            Some(Value::Integer(v)) => Ok(Some(*v as f64)),
            Some(_) => Err(invalid(&self.key(key), "expected a number")),
        }
    }

    fn positive_f64(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        match self.f64(key)? {
            Some(v) if !(v > 0.0) => Err(invalid(&self.key(key), "must be positive")),
            other => Ok(other),
        }
    }

    fn usize(&self, key: &str, min: usize) -> Result<Option<usize>, ConfigError> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Integer(v)) if *v >= min as i64 => Ok(Some(*v as usize)),
            Some(Value::Integer(_)) => Err(invalid(
                &self.key(key),
                format!("must be an integer >= {}", min),
            )),
            Some(_) => Err(invalid(&self.key(key), "expected an integer")),
        }
    }

    fn str(&self, key: &str) -> Result<Option<&'a str>, ConfigError> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(invalid(&self.key(key), "expected a string")),
        }
    }

    fn bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Boolean(b)) => Ok(Some(*b)),
            Some(_) => Err(invalid(&self.key(key), "expected true or false")),
        }
    }
}

impl NldConfig {
    /// Reads `path`, or `nld.toml` in the working directory when no path is
    /// given. A missing default file yields the defaults, a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<NldConfig, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            return Ok(NldConfig::default());
        }
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let table: Table =
            toml::from_str(&text).map_err(|source| ConfigError::Toml { path, source })?;
        NldConfig::from_table(&table)
    }

    pub fn from_toml_str(text: &str) -> Result<NldConfig, ConfigError> {
        let table: Table = toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: PathBuf::from("<string>"),
            source,
        })?;
        NldConfig::from_table(&table)
    }

    pub fn from_table(root: &Table) -> Result<NldConfig, ConfigError> {
        for k in root.keys() {
            if !["solver", "session", "render", "logging"].contains(&k.as_str()) {
                warn!("unknown configuration section '{}' ignored", k);
            }
        }
        let mut config = NldConfig::default();

        let solver = Section::new(root, "solver")?;
        solver.warn_unknown(&[
            "method",
            "rtol",
            "atol",
            "max_step",
            "first_step",
            "max_steps",
            "rk4_substeps",
            "max_wall_time",
        ]);
        if let Some(m) = solver.str("method")? {
            config.solver.method = Method::from_str(m)
                .map_err(|_| invalid("solver.method", format!("unknown method '{}'", m)))?;
        }
        if let Some(v) = solver.positive_f64("rtol")? {
            config.solver.rtol = v;
        }
        if let Some(v) = solver.f64("atol")? {
            if !(v >= 0.0) {
                return Err(invalid("solver.atol", "must not be negative"));
            }
            config.solver.atol = v;
        }
        if let Some(v) = solver.positive_f64("max_step")? {
            config.solver.max_step = v;
        }
        if let Some(v) = solver.positive_f64("first_step")? {
            config.solver.first_step = Some(v);
        }
        if let Some(v) = solver.usize("max_steps", 1)? {
            config.solver.max_steps = v;
        }
        if let Some(v) = solver.usize("rk4_substeps", 1)? {
            config.solver.rk4_substeps = v;
        }
        if let Some(v) = solver.positive_f64("max_wall_time")? {
            config.solver.max_wall_time = Duration::try_from_secs_f64(v)
                .map_err(|e| invalid("solver.max_wall_time", e.to_string()))?;
        }

        let session = Section::new(root, "session")?;
        session.warn_unknown(&["sample_count", "max_end_time", "time_symbol"]);
        if let Some(v) = session.usize("sample_count", 2)? {
            config.session.sample_count = v;
        }
        if let Some(v) = session.positive_f64("max_end_time")? {
            config.session.max_end_time = v;
        }
        if let Some(v) = session.str("time_symbol")? {
            let v = v.trim();
            if all_consuming(identifier).parse(v).is_err() {
                return Err(invalid("session.time_symbol", "expected an identifier"));
            }
            config.session.time_symbol = v.to_string();
        }

        let render = Section::new(root, "render")?;
        render.warn_unknown(&["output_dir", "width", "height", "segment_len"]);
        if let Some(v) = render.str("output_dir")? {
            config.render.output_dir = PathBuf::from(v);
        }
        if let Some(v) = render.usize("width", 100)? {
            config.render.width =
                u32::try_from(v).map_err(|_| invalid("render.width", "too large"))?;
        }
        if let Some(v) = render.usize("height", 100)? {
            config.render.height =
                u32::try_from(v).map_err(|_| invalid("render.height", "too large"))?;
        }
        if let Some(v) = render.usize("segment_len", 1)? {
            config.render.segment_len = v;
        }

        let logging = Section::new(root, "logging")?;
        logging.warn_unknown(&["level", "to_file"]);
        if let Some(v) = logging.str("level")? {
            config.logging.level = parse_level(v).ok_or_else(|| {
                invalid(
                    "logging.level",
                    "loglevel must be debug, info, warn or error",
                )
            })?;
        }
        if let Some(v) = logging.bool("to_file")? {
            config.logging.to_file = v;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_gives_defaults() {
        let config = NldConfig::from_toml_str("").unwrap();
        assert_eq!(config, NldConfig::default());
        assert_eq!(config.session.sample_count, 5000);
        assert_eq!(config.session.max_end_time, 1e4);
        assert_eq!(config.render.width, 1000);
        assert_eq!(config.logging.level, LevelFilter::Info);
    }

    #[test]
    fn test_full_config() {
        let text = r#"
            [solver]
            method = "rk4"
            rtol = 1e-8
            atol = 0
            max_step = 0.5
            rk4_substeps = 4
            max_wall_time = 2.5

            [session]
            sample_count = 300
            max_end_time = 50

            [render]
            output_dir = "plots"
            width = 640
            height = 480

            [logging]
            level = "debug"
            to_file = true
        "#;
        let config = NldConfig::from_toml_str(text).unwrap();
        assert_eq!(config.solver.method, Method::RK4);
        assert_eq!(config.solver.rtol, 1e-8);
        assert_eq!(config.solver.atol, 0.0);
        assert_eq!(config.solver.max_step, 0.5);
        assert_eq!(config.solver.first_step, None);
        assert_eq!(config.solver.rk4_substeps, 4);
        assert_eq!(config.solver.max_wall_time, Duration::from_millis(2500));
        assert_eq!(config.session.sample_count, 300);
        assert_eq!(config.session.max_end_time, 50.0);
        assert_eq!(config.session.time_symbol, "t");
        assert_eq!(config.render.output_dir, PathBuf::from("plots"));
        assert_eq!((config.render.width, config.render.height), (640, 480));
        assert_eq!(config.logging.level, LevelFilter::Debug);
        assert!(config.logging.to_file);
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            ("[solver]\nmethod = \"AB4\"", "solver.method"),
            ("[solver]\nrtol = -1.0", "solver.rtol"),
            ("[solver]\nmax_steps = 0", "solver.max_steps"),
            ("[session]\nsample_count = 1", "session.sample_count"),
            ("[session]\nmax_end_time = \"long\"", "session.max_end_time"),
            ("[render]\nwidth = 10", "render.width"),
            ("[logging]\nlevel = \"loud\"", "logging.level"),
            ("[session]\ntime_symbol = \"1t\"", "session.time_symbol"),
            ("[session]\ntime_symbol = \"θ\"", "session.time_symbol"),
            ("[session]\ntime_symbol = \"t-1\"", "session.time_symbol"),
            ("solver = 3", "solver"),
        ];
        for (text, expected_key) in cases {
            match NldConfig::from_toml_str(text) {
                Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
                other => panic!("{} should be rejected, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_time_symbol_is_bound_by_equations() {
        let config = NldConfig::from_toml_str("[session]\ntime_symbol = \" tau_1 \"").unwrap();
        assert_eq!(config.session.time_symbol, "tau_1");
        let mut system = crate::numerical::equation_system::EquationSystem::new(
            "NLD",
            &config.session.time_symbol,
        );
        system.add_equation("cos(tau_1)", "x").unwrap();
        assert!(system.unbound_symbols().is_empty());
    }

    #[test]
    fn test_malformed_toml() {
        let err = NldConfig::from_toml_str("[solver\nrtol = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nsample_count = 42").unwrap();
        let config = NldConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.session.sample_count, 42);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            NldConfig::load(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }
}
