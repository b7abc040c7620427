//! Print the current battery status and follow changes.
//!
//! Run with: `cargo run --example monitor`

use battkit_hal::{SysfsConfig, SysfsPlatform};
use battkit_plugin::BatteryPlugin;
use std::sync::Arc;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut config = SysfsConfig::default();
    config.poll_interval_ms = 1000;

    let plugin = BatteryPlugin::new(Arc::new(SysfsPlatform::with_config(config)?));

    let info = plugin.get_battery_info()?;
    println!(
        "battery: {}% status={} charging={} low={}",
        info.level, info.status, info.is_charging, info.is_low_battery
    );

    let token = plugin.add_battery_listener(Box::new(|status| {
        println!(
            "batteryChanged: {}% status={} charging={}",
            status.level, status.status, status.is_charging
        );
    }))?;
    tracing::info!("Listening as {}", token);

    loop {
        std::thread::sleep(Duration::from_secs(60));
    }
}
