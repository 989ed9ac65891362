//! Best-effort duplex channel between the UI and the background process.
//!
//! There is no acknowledgement and no backpressure. Snapshots travel over a
//! single-slot [`watch`] channel: a new snapshot overwrites one the UI has not
//! read yet, so a UI that stops listening for a while always comes back to the
//! current state rather than a backlog. UI messages are rare and small, so
//! that direction is an unbounded queue.
//!
//! [`serve_background_stdio`] and [`connect_ui_stdio`] expose the same ends
//! over a JSON-lines byte stream, which is how the two processes talk.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::events::{BackgroundMessage, Snapshot, UiMessage};
use crate::wire;

/// Create a connected pair of channel ends.
pub fn duplex() -> (UiEnd, BackgroundEnd) {
    let (to_background, from_ui) = mpsc::unbounded_channel();
    let (to_ui, from_background) = watch::channel(None);
    (
        UiEnd {
            outbound: to_background,
            inbound: from_background,
        },
        BackgroundEnd {
            inbound: from_ui,
            outbound: SnapshotSink { tx: Some(to_ui) },
        },
    )
}

/// Background side: outbound snapshots that never block or fail.
#[derive(Debug)]
pub struct SnapshotSink {
    tx: Option<watch::Sender<Option<Snapshot>>>,
}

impl SnapshotSink {
    /// Publish a snapshot, replacing any the UI has not read yet. Returns
    /// whether a UI is listening.
    pub fn send(&mut self, snapshot: Snapshot) -> bool {
        let Some(tx) = self.tx.as_ref() else {
            return false;
        };
        if tx.send(Some(snapshot)).is_err() {
            trace!("no ui listening; snapshot dropped");
            return false;
        }
        true
    }

    /// Stop sending for good. The UI still gets the last snapshot if it had
    /// not read it, then sees the end of the stream.
    pub fn close(&mut self) {
        self.tx = None;
    }

    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().map_or(true, watch::Sender::is_closed)
    }
}

/// Background side of the channel.
#[derive(Debug)]
pub struct BackgroundEnd {
    inbound: mpsc::UnboundedReceiver<UiMessage>,
    outbound: SnapshotSink,
}

impl BackgroundEnd {
    pub fn into_parts(self) -> (mpsc::UnboundedReceiver<UiMessage>, SnapshotSink) {
        (self.inbound, self.outbound)
    }
}

/// UI side of the channel.
#[derive(Debug)]
pub struct UiEnd {
    outbound: mpsc::UnboundedSender<UiMessage>,
    inbound: watch::Receiver<Option<Snapshot>>,
}

impl UiEnd {
    /// Queue a message for the background. Returns `false` when the
    /// background is gone.
    pub fn send(&self, message: UiMessage) -> bool {
        self.outbound.send(message).is_ok()
    }

    /// Newest snapshot not seen yet, waiting for one if needed. `None` once
    /// the background has closed and everything was read.
    pub async fn recv(&mut self) -> Option<BackgroundMessage> {
        next_published(&mut self.inbound)
            .await
            .map(BackgroundMessage::Snapshot)
    }

    /// Non-blocking receive; `None` when nothing new was published.
    pub fn try_recv(&mut self) -> Option<BackgroundMessage> {
        if !self.inbound.borrow().has_changed() {
            return None;
        }
        let latest = *self.inbound.borrow_and_update();
        latest.map(BackgroundMessage::Snapshot)
    }
}

async fn next_published(rx: &mut watch::Receiver<Option<Snapshot>>) -> Option<Snapshot> {
    loop {
        rx.changed().await.ok()?;
        let latest = *rx.borrow_and_update();
        if latest.is_some() {
            return latest;
        }
    }
}

/// Tasks pumping a byte stream into a channel end.
#[derive(Debug)]
pub struct StdioBridge {
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl StdioBridge {
    /// Stop reading and wait for everything already queued to be written.
    pub async fn finish(self) {
        self.reader.abort();
        if let Err(e) = self.writer.await {
            if !e.is_cancelled() {
                warn!(error = %e, "bridge writer task failed");
            }
        }
    }
}

/// Background process: UI messages arrive on `reader`, snapshots leave on
/// `writer`. End of input counts as a stop request since the UI can no longer
/// reach this process.
pub fn serve_background_stdio<R, W>(reader: R, writer: W) -> (BackgroundEnd, StdioBridge)
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (ui, background) = duplex();
    let UiEnd { outbound, inbound } = ui;

    let reader = tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    for message in wire::decode_ui_messages(&line) {
                        if outbound.send(message).is_err() {
                            return;
                        }
                    }
                }
                Ok(None) => {
                    debug!("ui input closed; requesting stop");
                    let _ = outbound.send(UiMessage::StopService);
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "ui input failed; requesting stop");
                    let _ = outbound.send(UiMessage::StopService);
                    return;
                }
            }
        }
    });

    let writer = tokio::spawn(write_snapshots(inbound, writer));

    (background, StdioBridge { reader, writer })
}

async fn write_snapshots<W>(mut inbound: watch::Receiver<Option<Snapshot>>, mut writer: W)
where
    W: AsyncWrite + Unpin,
{
    // A slow reader only ever gets the newest snapshot once the pipe drains.
    while let Some(snapshot) = next_published(&mut inbound).await {
        let line = match wire::encode_snapshot(&snapshot) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "snapshot could not be encoded");
                continue;
            }
        };
        if let Err(e) = write_line(&mut writer, &line).await {
            // Nobody is reading any more; later snapshots are dropped by the sink.
            debug!(error = %e, "ui output closed");
            return;
        }
    }
    let _ = writer.shutdown().await;
}

/// UI process: snapshots arrive on `reader`, UI messages leave on `writer`.
/// Dropping the returned [`UiEnd`] closes `writer`.
pub fn connect_ui_stdio<R, W>(reader: R, writer: W) -> (UiEnd, StdioBridge)
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (ui, background) = duplex();
    let (mut inbound, mut sink) = background.into_parts();

    let reader = tokio::spawn(async move {
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match wire::decode_snapshot(&line) {
                Ok(snapshot) => {
                    sink.send(snapshot);
                }
                Err(e) => debug!(error = %e, "ignoring background line"),
            }
        }
        sink.close();
    });

    let writer = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(message) = inbound.recv().await {
            let line = match wire::encode_ui_message(&message) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "ui message could not be encoded");
                    continue;
                }
            };
            if let Err(e) = write_line(&mut writer, &line).await {
                debug!(error = %e, "background input closed");
                return;
            }
        }
        let _ = writer.shutdown().await;
    });

    (ui, StdioBridge { reader, writer })
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    fn snap(remaining: u32) -> Snapshot {
        Snapshot {
            remaining_seconds: remaining,
            is_running: true,
            is_near: false,
        }
    }

    #[tokio::test]
    async fn send_without_receiver_is_a_quiet_noop() {
        let (ui, background) = duplex();
        drop(ui);
        let (_inbound, mut sink) = background.into_parts();
        assert!(!sink.send(snap(3)));
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn unread_snapshots_collapse_to_the_newest() {
        let (mut ui, background) = duplex();
        let (_inbound, mut sink) = background.into_parts();
        for i in 0..500 {
            assert!(sink.send(snap(i)));
        }
        assert_eq!(ui.try_recv(), Some(BackgroundMessage::Snapshot(snap(499))));
        assert_eq!(ui.try_recv(), None);
    }

    #[tokio::test]
    async fn last_snapshot_survives_close() {
        let (mut ui, background) = duplex();
        let (_inbound, mut sink) = background.into_parts();
        assert_eq!(ui.try_recv(), None);
        sink.send(snap(2));
        sink.close();
        assert_eq!(ui.recv().await, Some(BackgroundMessage::Snapshot(snap(2))));
        assert_eq!(ui.recv().await, None);
    }

    #[tokio::test]
    async fn ui_send_reports_missing_background() {
        let (ui, background) = duplex();
        assert!(ui.send(UiMessage::StartTimer));
        drop(background);
        assert!(!ui.send(UiMessage::StartTimer));
    }

    #[tokio::test]
    async fn background_bridge_decodes_lines_and_stops_on_eof() {
        let input = b"{\"durationSeconds\":30}\nnonsense\n{\"volume\":0.5}\n".to_vec();
        let (output, mut output_reader) = tokio::io::duplex(1024);
        let (background, bridge) =
            serve_background_stdio(BufReader::new(std::io::Cursor::new(input)), output);
        let (mut inbound, mut sink) = background.into_parts();

        assert_eq!(inbound.recv().await, Some(UiMessage::DurationChanged(30)));
        assert_eq!(inbound.recv().await, Some(UiMessage::VolumeChanged(0.5)));
        assert_eq!(inbound.recv().await, Some(UiMessage::StopService));

        sink.send(snap(9));
        sink.close();
        bridge.finish().await;

        let mut text = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut output_reader, &mut text)
            .await
            .unwrap();
        assert_eq!(
            text,
            "{\"remainingTime\":9,\"isTimerRunning\":true,\"isNear\":false}\n"
        );
    }

    #[tokio::test]
    async fn ui_bridge_skips_partial_snapshots() {
        let input = concat!(
            "{\"remainingTime\":5,\"isNear\":true}\n",
            "{\"remainingTime\":4,\"isTimerRunning\":true,\"isNear\":false}\n",
        )
        .as_bytes()
        .to_vec();
        let (to_background, mut background_reader) = tokio::io::duplex(1024);
        let (mut ui, bridge) =
            connect_ui_stdio(BufReader::new(std::io::Cursor::new(input)), to_background);

        assert_eq!(ui.recv().await, Some(BackgroundMessage::Snapshot(snap(4))));
        assert_eq!(ui.recv().await, None);

        assert!(ui.send(UiMessage::StopService));
        drop(ui);
        bridge.finish().await;

        let mut text = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut background_reader, &mut text)
            .await
            .unwrap();
        assert_eq!(text, "{\"action\":\"stopService\"}\n");
    }
}
