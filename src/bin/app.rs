#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{clock::CpuClock, system::software_reset, timer::timg::TimerGroup};
use esp_storage::FlashStorage;
use log::{error, info};

use myrtio_esp_pixel::controllers::{ASSETS, CONTROLLER, DEVICE_STATE};
use myrtio_esp_pixel::infrastructure::config::{DEVICE, FIRMWARE, SERVER_WORKERS};
use myrtio_esp_pixel::infrastructure::drivers::{
    EspLedDriver, init_network_stack, wait_for_connection,
};
use myrtio_esp_pixel::infrastructure::services::init_asset_store;
use myrtio_esp_pixel::infrastructure::tasks::{
    control_server_task, network_runner_task, render_task, wifi_connection_task,
};
use myrtio_pixel_core::PeerId;

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();
    info!("boot: {} {}", DEVICE.name, FIRMWARE.version);

    // Initialize hardware
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Allocate heap memory (64 + 32 KB) for the radio
    esp_alloc::heap_allocator!(
        #[unsafe(link_section = ".dram2_uninit")] size: 64 * 1024
    );
    esp_alloc::heap_allocator!(size: 32 * 1024);

    // Start rtos
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Rendering starts before the network is up
    let driver = match EspLedDriver::new(peripherals.RMT, myrtio_esp_pixel::led_gpio!(peripherals)) {
        Ok(driver) => driver,
        Err(e) => {
            error!("boot: LED output init failed: {:?}", e);
            software_reset();
        }
    };
    spawner.spawn(render_task(&DEVICE_STATE, driver)).ok();

    init_asset_store(&ASSETS, FlashStorage::new(peripherals.FLASH)).await;

    // Initialize network stack and spawn network tasks
    let (stack, runner, controller) = match init_network_stack(peripherals.WIFI) {
        Ok(parts) => parts,
        Err(e) => {
            error!("boot: network init failed: {:?}", e);
            software_reset();
        }
    };
    spawner.spawn(wifi_connection_task(controller)).ok();
    spawner.spawn(network_runner_task(runner)).ok();

    // Wait for network connection before accepting clients
    wait_for_connection(stack).await;

    for peer in (0..SERVER_WORKERS).filter_map(|slot| u8::try_from(slot).ok()) {
        spawner
            .spawn(control_server_task(PeerId(peer), stack, &CONTROLLER))
            .ok();
    }

    loop {
        Timer::after(Duration::from_secs(5)).await;
    }
}
