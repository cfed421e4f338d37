// src/lib.rs

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

pub mod assets;
pub mod cli;
pub mod config;
pub mod core;
pub mod model;
pub mod runner;
pub mod scrape;
pub mod store;
