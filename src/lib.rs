pub mod commands;
pub mod config;
pub mod git;
pub mod merge;
pub mod models;
pub mod store;
pub mod sync;
pub mod workspace;
