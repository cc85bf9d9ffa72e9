// usbtime - core/mod.rs
//
// Core business logic layer: parse, accumulate, export.
// Must NOT depend on: platform, app, or touch the filesystem directly.

pub mod accumulator;
pub mod export;
pub mod model;
pub mod parser;
