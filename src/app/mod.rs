// usbtime - app/mod.rs
//
// Application layer: pipeline orchestration.
// Dependencies: core, platform.

pub mod run;
