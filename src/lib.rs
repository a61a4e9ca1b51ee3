pub mod agent;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod executor;
pub mod gate;
pub mod plan;
pub mod shared;
pub mod tui;
