pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use app::console::Console;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{gateway::ApiGateway, http::ApiClient};
pub use config::{cli::LocalStorage, Settings};
pub use core::{reservation::ReservationFlow, session::SessionStore};
pub use utils::error::{PawcareError, Result};
