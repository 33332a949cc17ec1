// Domain layer: records mirrored from the booking API, request payloads and ports.

pub mod forms;
pub mod model;
pub mod ports;
