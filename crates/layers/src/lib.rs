pub mod keys;
pub mod layer;
pub mod legend;
pub mod popup;
pub mod state;
pub mod symbology;
pub mod vector;

pub use layer::*;
pub use state::{ConservationState, classify};
