//! Alarm trigger.
//!
//! The audio device is an external capability; the core only drives it
//! through [`AudioOutput`]. Playback failures never reach the timer loop.

use tracing::{debug, warn};

use crate::error::AudioError;

/// Audio output capability consumed by the background process.
pub trait AudioOutput: Send {
    fn load_asset(&mut self, id: &str) -> Result<(), AudioError>;
    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError>;
    fn seek_to_start(&mut self) -> Result<(), AudioError>;
    fn play(&mut self) -> Result<(), AudioError>;
    fn dispose(&mut self);
}

impl<T: AudioOutput + ?Sized> AudioOutput for Box<T> {
    fn load_asset(&mut self, id: &str) -> Result<(), AudioError> {
        (**self).load_asset(id)
    }
    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        (**self).set_volume(volume)
    }
    fn seek_to_start(&mut self) -> Result<(), AudioError> {
        (**self).seek_to_start()
    }
    fn play(&mut self) -> Result<(), AudioError> {
        (**self).play()
    }
    fn dispose(&mut self) {
        (**self).dispose()
    }
}

/// Set the volume, rewind and play. Any failure is logged and swallowed.
pub fn trigger_alarm(volume: f32, audio: &mut dyn AudioOutput) {
    let result = audio
        .set_volume(volume)
        .and_then(|()| audio.seek_to_start())
        .and_then(|()| audio.play());
    match result {
        Ok(()) => debug!(volume, "alarm playing"),
        Err(e) => warn!(error = %e, "alarm could not be played"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_seek: bool,
    }

    impl AudioOutput for Recorder {
        fn load_asset(&mut self, id: &str) -> Result<(), AudioError> {
            self.calls.push(format!("load:{id}"));
            Ok(())
        }
        fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
            self.calls.push(format!("volume:{volume}"));
            Ok(())
        }
        fn seek_to_start(&mut self) -> Result<(), AudioError> {
            self.calls.push("seek".into());
            if self.fail_seek {
                return Err(AudioError::AssetUnavailable("alarm".into()));
            }
            Ok(())
        }
        fn play(&mut self) -> Result<(), AudioError> {
            self.calls.push("play".into());
            Ok(())
        }
        fn dispose(&mut self) {
            self.calls.push("dispose".into());
        }
    }

    #[test]
    fn volume_then_seek_then_play() {
        let mut audio = Recorder::default();
        trigger_alarm(0.5, &mut audio);
        assert_eq!(audio.calls, vec!["volume:0.5", "seek", "play"]);
    }

    #[test]
    fn failure_stops_sequence_without_panicking() {
        let mut audio = Recorder {
            fail_seek: true,
            ..Default::default()
        };
        trigger_alarm(1.0, &mut audio);
        assert_eq!(audio.calls, vec!["volume:1", "seek"]);
    }
}
