pub mod composer;
pub mod config;
pub mod control;
pub mod error;

pub use composer::ViewComposer;
pub use config::{BaseMapConfig, ViewerConfig};
pub use error::{ConfigError, InitError};
