pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod tools;
pub mod workflow;
