//! Library side of the `dq` command: configuration, suite files, the suite
//! runner, and logging setup.

pub mod config;
pub mod logging;
pub mod runner;
pub mod suite;
