use embassy_net::Runner;
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{
    AuthMethod, ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent, WifiStaState,
};
use log::{error, info, warn};

use crate::infrastructure::config;

const RECONNECT_DELAY: Duration = Duration::from_millis(2000);
const RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Background task for connecting to the `WiFi` network
///
/// It connects to the `WiFi` network and waits for the connection to be established.
/// If the connection is lost, it tries to reconnect.
#[embassy_executor::task]
pub async fn wifi_connection_task(mut controller: WifiController<'static>) {
    loop {
        if esp_radio::wifi::sta_state() == WifiStaState::Connected {
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            warn!("network: disconnected");
            Timer::after(RECONNECT_DELAY).await;
        }
        if !matches!(controller.is_started(), Ok(true)) {
            let client_config = if config::WIFI.password.is_empty() {
                ClientConfig::default()
                    .with_ssid(config::WIFI.ssid.into())
                    .with_auth_method(AuthMethod::None)
            } else {
                ClientConfig::default()
                    .with_ssid(config::WIFI.ssid.into())
                    .with_password(config::WIFI.password.into())
            };
            let mode_config = ModeConfig::Client(client_config);
            if let Err(e) = controller.set_config(&mode_config) {
                error!("network: invalid client config: {:?}", e);
                Timer::after(RETRY_DELAY).await;
                continue;
            }
            if let Err(e) = controller.start_async().await {
                error!("network: radio start failed: {:?}", e);
                Timer::after(RETRY_DELAY).await;
                continue;
            }
        }

        info!("network: connecting to {}", config::WIFI.ssid);
        if let Err(e) = controller.connect_async().await {
            warn!("network: error connecting: {:?}", e);
            Timer::after(RETRY_DELAY).await;
        }
    }
}

/// Background task for running the network stack
#[embassy_executor::task]
pub async fn network_runner_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await;
}
