pub mod app_config;
pub mod cabin_repo;
pub mod database;
pub mod memory;
pub mod redis_repo;
pub mod reservation_repo;
pub mod stripe;

pub use cabin_repo::PgCabinRepository;
pub use database::DbClient;
pub use redis_repo::RedisClient;
pub use reservation_repo::PgReservationRepository;
pub use stripe::StripeCheckout;
