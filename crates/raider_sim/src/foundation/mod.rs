//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the simulation:
//! - Math types and pixel/meter conversion
//! - Generational handles for bodies, fixtures and simulation objects
//! - Fixed-timestep clock and countdown helpers
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
