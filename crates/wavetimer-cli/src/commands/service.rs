use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{info, warn};
use wavetimer_core::channel::serve_background_stdio;
use wavetimer_core::{
    BackgroundController, Config, ControllerState, ServicePolicy, SettingsStore, TimerConfig,
    TomlSettingsStore,
};

use crate::devices::{forward_sensor_lines, BellAudio, LogNotifier};

const SENSOR_BUFFER: usize = 32;

#[derive(Args)]
pub struct ServiceArgs {
    /// Proximity source: a file or FIFO with one near/far reading per line
    #[arg(long)]
    pub sensor: Option<PathBuf>,
    /// Settings-store user key (defaults to user.key from the config)
    #[arg(long)]
    pub user: Option<String>,
}

/// Initial timer settings. Store failures fall back to defaults.
fn initial_timer_config(user: &str) -> TimerConfig {
    let stored = TomlSettingsStore::open_default()
        .map_err(wavetimer_core::CoreError::from)
        .and_then(|store| store.get(user).map_err(Into::into));
    match stored {
        Ok(stored) => TimerConfig::from_stored(&stored),
        Err(e) => {
            warn!(user, error = %e, "settings unavailable; using defaults");
            TimerConfig::default()
        }
    }
}

pub fn run(args: ServiceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let user = super::resolve_user(args.user, &config);
    let state = ControllerState::new(initial_timer_config(&user));
    let policy = ServicePolicy::from(&config.service);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let (channel, bridge) =
            serve_background_stdio(BufReader::new(tokio::io::stdin()), tokio::io::stdout());

        let (sensor_tx, sensor_rx) = mpsc::channel(SENSOR_BUFFER);
        // Without a source the sender stays alive and the stream never yields.
        let (sensor_task, _idle_sensor) = match args.sensor {
            Some(path) => (Some(tokio::spawn(forward_sensor_lines(path, sensor_tx))), None),
            None => (None, Some(sensor_tx)),
        };

        let controller = BackgroundController::new(
            state,
            policy,
            channel,
            sensor_rx,
            BellAudio::default(),
            LogNotifier::default(),
        );

        // Dropping the controller on interrupt still runs its teardown.
        tokio::select! {
            exit = controller.run() => info!(?exit, "service exiting"),
            _ = tokio::signal::ctrl_c() => info!("interrupted"),
        }

        if let Some(task) = sensor_task {
            task.abort();
        }
        bridge.finish().await;
    });
    // Stdin is read on a blocking thread that cannot be interrupted.
    rt.shutdown_timeout(Duration::from_millis(100));
    Ok(())
}
