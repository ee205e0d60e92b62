#![forbid(unsafe_code)]

//! Render kernel: cells, shadow buffer, drawing context, and the console
//! boundary.

pub mod cell;
pub mod console;
pub mod context;
pub mod control;
pub mod headless;
pub mod shadow;
