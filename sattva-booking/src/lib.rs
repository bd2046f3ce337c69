pub mod roster;
pub mod service;

pub use roster::InstructorRoster;
pub use service::{BookingError, BookingService};
