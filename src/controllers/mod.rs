pub(crate) mod dependencies;
mod http;

pub use dependencies::{ASSETS, CONTROLLER, DEVICE_STATE};
pub use http::ControlHttpController;
