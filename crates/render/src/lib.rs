pub mod engine;
pub mod event;
pub mod headless;

pub use engine::*;
pub use event::*;
pub use headless::HeadlessMap;
