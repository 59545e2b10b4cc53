// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
//! Authoring and integration of nonlinear dynamical systems from short text
//! commands: equations of motion are entered one at a time, integrated with an
//! adaptive Runge-Kutta method and drawn as a phase portrait.
pub mod Utils;
pub mod numerical;
pub mod session;
pub mod symbolic;
