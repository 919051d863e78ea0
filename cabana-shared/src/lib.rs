pub mod dates;
pub mod pii;
pub mod stay;

pub use dates::DateRange;
pub use stay::{compute_stay, StayQuote};
