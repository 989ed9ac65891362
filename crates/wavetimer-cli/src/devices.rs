//! Terminal stand-ins for the device capabilities the core consumes.

use std::io::Write;
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use wavetimer_core::{AudioError, AudioOutput, Notifier, ProximityReading};

/// Alarm output that rings the terminal bell on stderr.
#[derive(Debug, Default)]
pub struct BellAudio {
    asset: Option<String>,
    volume: f32,
    disposed: bool,
}

impl AudioOutput for BellAudio {
    fn load_asset(&mut self, id: &str) -> Result<(), AudioError> {
        if self.disposed {
            return Err(AudioError::Disposed);
        }
        if id.trim().is_empty() {
            return Err(AudioError::AssetUnavailable(id.to_string()));
        }
        self.asset = Some(id.to_string());
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        if self.disposed {
            return Err(AudioError::Disposed);
        }
        self.volume = volume;
        Ok(())
    }

    fn seek_to_start(&mut self) -> Result<(), AudioError> {
        if self.disposed {
            return Err(AudioError::Disposed);
        }
        self.asset.as_ref().map(|_| ()).ok_or(AudioError::NotLoaded)
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.disposed {
            return Err(AudioError::Disposed);
        }
        let asset = self.asset.as_deref().ok_or(AudioError::NotLoaded)?;
        info!(target: "wavetimer::alarm", asset, volume = self.volume, "alarm");
        if self.volume > 0.0 {
            let mut stderr = std::io::stderr();
            stderr
                .write_all(b"\x07")
                .and_then(|()| stderr.flush())
                .map_err(|e| AudioError::Device(e.to_string()))?;
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.asset = None;
        self.disposed = true;
    }
}

/// Notification surface that logs each distinct status line once.
#[derive(Debug, Default)]
pub struct LogNotifier {
    last: Option<String>,
}

impl Notifier for LogNotifier {
    fn show(&mut self, text: &str) {
        if self.last.as_deref() == Some(text) {
            return;
        }
        info!(target: "wavetimer::notification", "{text}");
        self.last = Some(text.to_string());
    }

    fn clear(&mut self) {
        self.last = None;
        info!(target: "wavetimer::notification", "cleared");
    }
}

/// Read proximity readings, one per line, from a file or FIFO and forward
/// them until the source ends. Dropping `tx` ends the sensor stream.
pub async fn forward_sensor_lines(path: PathBuf, tx: mpsc::Sender<ProximityReading>) {
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot open sensor source");
            return;
        }
    };
    let mut lines = BufReader::new(file).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match ProximityReading::parse(&line) {
                Some(reading) => {
                    if tx.send(reading).await.is_err() {
                        return;
                    }
                }
                None => debug!(line = %line, "ignoring sensor line"),
            },
            Ok(None) => {
                debug!(path = %path.display(), "sensor source ended");
                return;
            }
            Err(e) => {
                warn!(error = %e, "sensor source failed");
                return;
            }
        }
    }
}
