//! egui studio window and its components

pub mod app;
pub mod components;
pub mod constants;

pub use app::{StudioServices, run_gui};
