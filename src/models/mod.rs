// Models module - Database entity representations

pub mod booking;
pub mod bus_type;
pub mod session;
pub mod user;

pub use booking::Booking;
pub use bus_type::BusType;
pub use session::Session;
pub use user::User;
