pub mod cabin;

pub use cabin::{Cabin, CabinStatus};
