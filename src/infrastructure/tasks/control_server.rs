use embassy_net::Stack;
use log::{error, info};

use myrtio_pixel_core::PeerId;

use crate::controllers::ControlHttpController;
use crate::infrastructure::config::{self, SERVER_WORKERS};
use crate::infrastructure::services::http::HttpServer;

const RX_BUFFER_SIZE: usize = 4096;
const TX_BUFFER_SIZE: usize = 4096;

/// One peer slot of the control server.
///
/// Serves connections until accepting fails; the other slots and the
/// render task keep running.
#[embassy_executor::task(pool_size = SERVER_WORKERS)]
pub async fn control_server_task(
    peer: PeerId,
    stack: Stack<'static>,
    controller: &'static ControlHttpController,
) {
    let server = HttpServer::new(controller, peer);
    let mut rx_buffer = [0u8; RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; TX_BUFFER_SIZE];

    info!(
        "control_server: peer {} listening on port {}",
        peer,
        config::SERVER.port
    );
    if let Err(e) = server
        .listen_and_serve(stack, config::SERVER.port, &mut rx_buffer, &mut tx_buffer)
        .await
    {
        error!("control_server: peer {} stopped: {:?}", peer, e);
    }
}
