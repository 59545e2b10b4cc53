//! different utility modules used throughout the project
/// settings of the solver, session, renderer and logger from an optional TOML file
pub mod config;
/// terminal and file logger set up
pub mod logger;
/// phase portraits of the integrated trajectory
pub mod plots;
