// Service layer: one wrapper per API resource.

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod payments;
pub mod pets;
pub mod profile;

pub use admin::AdminService;
pub use auth::{AuthService, Registration};
pub use bookings::BookingService;
pub use payments::PaymentService;
pub use pets::PetService;
pub use profile::ProfileService;
