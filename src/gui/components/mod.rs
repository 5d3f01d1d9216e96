pub mod color_input;
pub mod colors;
pub mod export_bar;
pub mod patterns;
pub mod payload;
pub mod scanner_modal;
pub mod signature;
