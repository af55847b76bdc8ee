pub mod feature;
pub mod load;

pub use feature::*;
pub use load::*;
