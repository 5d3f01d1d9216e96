//! Configuration for iLoveQR
//!
//! - **style**: the nested rendering configuration and its defaults
//! - **lens**: identity-preserving updates (typed lenses and dotted paths)
//! - **presets**: named style overlays
//! - **label**: the text label drawn with exports
//! - **settings**: persisted window/theme preferences (TOML)

pub mod label;
pub mod lens;
pub mod presets;
pub mod settings;
pub mod style;

pub use label::{LabelConfig, LabelPosition};
pub use lens::ConfigError;
pub use presets::{Preset, PRESETS, find_preset};
pub use settings::{Settings, Theme};
pub use style::StyleConfig;
