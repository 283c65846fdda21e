//! Miscellaneous helpers shared by the UI core.
pub mod rounding;

pub use self::rounding::{round, RoundingMethod};
