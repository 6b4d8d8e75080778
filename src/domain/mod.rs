pub mod measurement;
pub mod standards;

pub use measurement::*;
pub use standards::*;
