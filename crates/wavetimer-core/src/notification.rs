//! Human-readable status for the OS notification / service surface.

use crate::events::Snapshot;
use crate::timer::format_time;

/// Surface that displays the background process's status line.
pub trait Notifier: Send {
    fn show(&mut self, text: &str);
    /// Remove any externally visible service state.
    fn clear(&mut self);
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn show(&mut self, text: &str) {
        (**self).show(text)
    }
    fn clear(&mut self) {
        (**self).clear()
    }
}

pub fn status_text(snapshot: &Snapshot) -> String {
    let time = format_time(snapshot.remaining_seconds);
    if snapshot.is_running {
        format!("Timer Running: {time}")
    } else {
        format!("Timer Ready. Duration: {time}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_and_ready_texts() {
        let running = Snapshot {
            remaining_seconds: 65,
            is_running: true,
            is_near: false,
        };
        assert_eq!(status_text(&running), "Timer Running: 01:05");

        let ready = Snapshot {
            remaining_seconds: 60,
            is_running: false,
            is_near: true,
        };
        assert_eq!(status_text(&ready), "Timer Ready. Duration: 01:00");
    }
}
