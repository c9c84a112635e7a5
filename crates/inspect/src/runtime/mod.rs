//! Runtime — logging setup and the command-line front end.

pub mod boot;
pub mod cli;
