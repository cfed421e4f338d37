// src/scrape/mod.rs

pub mod classes;
pub mod items;
pub mod markup;
