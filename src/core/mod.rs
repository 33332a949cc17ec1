pub mod calendar;
pub mod permissions;
pub mod reservation;
pub mod session;

pub use crate::domain::model::{Role, Service, ServiceKind, ServiceStatus};
pub use crate::domain::ports::{BookingGateway, ConfigProvider, Storage};
pub use crate::utils::error::Result;
