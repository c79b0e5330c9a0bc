//! jobtree CLI
//!
//! Command-line interface for creating, deleting and building jobs in a
//! Jenkins folder hierarchy.

pub mod commands;
pub mod connection;
pub mod output;
