//! The `utils` module provides shared definitions used across `popbench`:
//! the error taxonomy and logging setup.

pub mod error;
pub mod logging;
