// Application layer: service wrappers over the API and the CLI console.

#[cfg(feature = "cli")]
pub mod console;
pub mod services;
