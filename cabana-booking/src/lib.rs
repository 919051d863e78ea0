pub mod availability;
pub mod error;
pub mod expiry;
pub mod form;
pub mod lifecycle;
pub mod payment;

pub use availability::{Availability, AvailabilityChecker};
pub use error::BookingError;
pub use expiry::ExpirySweeper;
pub use form::{CustomerSession, ReservationForm};
pub use lifecycle::ReservationManager;
pub use payment::PaymentHandoff;
