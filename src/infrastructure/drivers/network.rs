use embassy_net::{DhcpConfig, Runner, Stack, StackResources};
use embassy_time::{Duration, Timer};
use esp_hal::peripherals::WIFI;
use esp_radio::wifi::{Config as WifiConfig, WifiController, WifiDevice};
use heapless::String;
use log::{error, info};
use static_cell::make_static;

use super::random::get_seed;
use crate::infrastructure::config::{self, SERVER_WORKERS};

/// Server workers plus DHCP and DNS
const MAX_CONNECTIONS: usize = SERVER_WORKERS + 2;

#[derive(Debug)]
pub enum NetworkError {
    Radio,
    Hostname,
}

pub fn init_network_stack(
    wifi_device: WIFI<'static>,
) -> Result<
    (
        Stack<'static>,
        Runner<'static, WifiDevice<'static>>,
        WifiController<'static>,
    ),
    NetworkError,
> {
    let radio = esp_radio::init().map_err(|e| {
        error!("network: radio init failed: {:?}", e);
        NetworkError::Radio
    })?;
    let esp_radio_ctrl = &*make_static!(radio);
    let (controller, interfaces) =
        esp_radio::wifi::new(esp_radio_ctrl, wifi_device, WifiConfig::default()).map_err(|e| {
            error!("network: wifi init failed: {:?}", e);
            NetworkError::Radio
        })?;

    let mut dhcp_config = DhcpConfig::default();
    let hostname = String::try_from(config::DEVICE.hostname).map_err(|()| NetworkError::Hostname)?;
    dhcp_config.hostname = Some(hostname);

    let net_config = embassy_net::Config::dhcpv4(dhcp_config);
    let network_resources = make_static!(StackResources::<MAX_CONNECTIONS>::new());
    let (stack, runner) =
        embassy_net::new(interfaces.sta, net_config, network_resources, get_seed());

    Ok((stack, runner, controller))
}

/// Wait for full network connectivity (link + IP address)
pub async fn wait_for_connection(stack: Stack<'_>) -> embassy_net::StaticConfigV4 {
    while !stack.is_link_up() {
        Timer::after(Duration::from_millis(100)).await;
    }
    loop {
        if let Some(config) = stack.config_v4() {
            info!("network: address {}", config.address);
            return config;
        }
        Timer::after(Duration::from_millis(100)).await;
    }
}
