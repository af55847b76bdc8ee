pub mod bounds;
pub mod math;

// Geographic primitives and Web-Mercator view math.
pub use bounds::*;
