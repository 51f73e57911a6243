pub(crate) mod control_server;
pub(crate) mod network;
pub(crate) mod render;

pub use control_server::control_server_task;
pub use network::{network_runner_task, wifi_connection_task};
pub use render::render_task;
