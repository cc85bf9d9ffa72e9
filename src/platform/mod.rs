// usbtime - platform/mod.rs
//
// Platform abstraction layer: config directories, config.toml, file access.
// Must NOT depend on: app.

pub mod config;
pub mod fs;
