pub mod payment;
pub mod repository;
pub mod reservation;

pub use repository::{CabinRepository, ReservationRepository, StoreError};
pub use reservation::{Reservation, ReservationRequest, ReservationStatus};
