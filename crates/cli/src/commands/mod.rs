//! CLI Commands

pub mod build;
pub mod folder;
pub mod job;
