//! Persistent settings for the Selene viewer.
//!
//! Settings live in `config.ron` in the platform config directory. Missing
//! sections and fields fall back to defaults, unknown fields are ignored, and
//! command-line flags override whatever was loaded.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, CameraConfig, Config, DebugConfig, InputConfig, RenderConfig,
    SphereConfig, TextureConfig, WindowConfig, default_config_dir,
};
pub use error::ConfigError;
