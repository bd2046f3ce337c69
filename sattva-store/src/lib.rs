pub mod app_config;
pub mod booking_repo;
pub mod database;

pub use booking_repo::StoreBookingRepository;
pub use database::DbClient;
