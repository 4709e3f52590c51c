mod camera;
mod config;
mod error;
mod models;
mod retention;
mod sampling;
mod scheduler;
mod sensors;
mod station;
mod storage;
mod transfer;
mod utils;

#[cfg(test)]
mod testing;

use log::{error, info, warn};
use tokio::sync::watch;

use camera::CommandCamera;
use config::StationConfig;
use scheduler::Scheduler;
use sensors::{HostMetrics, IioWeatherSensors, StationSensors};
use station::Station;
use transfer::ScpCopy;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match StationConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let sensors = StationSensors::new(
        IioWeatherSensors::new(&config.sensors),
        HostMetrics::new(&config.sensors),
    );
    let station = Station::new(
        &config,
        sensors,
        CommandCamera::new(&config.capture),
        ScpCopy::new(&config.transfer),
    )?;
    let mut scheduler = Scheduler::new(station, &config.schedule);

    // First Ctrl+C stops at the next iteration boundary, a second one exits now
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (force_tx, mut force_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            error!("Failed to listen for Ctrl+C");
            return;
        }
        info!("Interrupted; finishing the current iteration (Ctrl+C again to exit now)");
        let _ = shutdown_tx.send(true);
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = force_tx.send(());
        }
    });

    tokio::select! {
        result = scheduler.run(shutdown_rx) => {
            match result {
                Ok(stats) => info!("Program completed after {} iterations", stats.iterations),
                Err(e) => {
                    error!("Fatal error: {}", e);
                    return Err(e.into());
                }
            }
        }
        Ok(()) = &mut force_rx => {
            warn!("Program terminated by user. Exiting immediately.");
        }
    }

    Ok(())
}
