use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::warn;
use wavetimer_core::channel::connect_ui_stdio;
use wavetimer_core::{
    format_time, status_text, Config, Snapshot, TimerConfig, TomlSettingsStore, UiMessage,
    UiNotice, UiSession,
};

const CHILD_EXIT_GRACE: Duration = Duration::from_secs(5);

#[derive(Args)]
pub struct UiArgs {
    /// Proximity source handed to the background process
    #[arg(long)]
    pub sensor: Option<PathBuf>,
    /// Settings-store user key (defaults to user.key from the config)
    #[arg(long)]
    pub user: Option<String>,
}

const HELP: &str = "commands: start | duration <secs> | volume <0..1> | stop";

/// Parse one line typed by the user. Blank lines are `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<UiMessage>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();
    let message = match (verb.to_ascii_lowercase().as_str(), arg) {
        ("start", None) => UiMessage::StartTimer,
        ("stop" | "quit" | "exit", None) => UiMessage::StopService,
        ("duration", Some(value)) => {
            let secs = value
                .parse::<i64>()
                .map_err(|_| format!("not a number of seconds: {value}"))?;
            UiMessage::DurationChanged(TimerConfig::validate_duration(secs).map_err(|e| e.to_string())?)
        }
        ("volume", Some(value)) => {
            let volume = value
                .parse::<f64>()
                .map_err(|_| format!("not a volume: {value}"))?;
            UiMessage::VolumeChanged(TimerConfig::validate_volume(volume).map_err(|e| e.to_string())?)
        }
        _ => return Err(HELP.to_string()),
    };
    if parts.next().is_some() {
        return Err(HELP.to_string());
    }
    Ok(Some(message))
}

fn render(snapshot: &Snapshot) -> String {
    let hand = if snapshot.is_near { "  [hand near]" } else { "" };
    format!("{}{hand}", status_text(snapshot))
}

fn notice_text(notice: &UiNotice) -> String {
    match notice {
        UiNotice::StoreFailed(e) => format!("could not save setting: {e}"),
        UiNotice::SettingsUnavailable(e) => format!("saved settings unavailable, using defaults: {e}"),
        UiNotice::BackgroundGone => "background is not running".to_string(),
    }
}

fn describe(message: &UiMessage) -> Option<String> {
    match message {
        UiMessage::DurationChanged(secs) => Some(format!("duration set to {}", format_time(*secs))),
        UiMessage::VolumeChanged(volume) => Some(format!("volume set to {volume:.2}")),
        UiMessage::StartTimer | UiMessage::StopService => None,
    }
}

pub fn run(args: UiArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let user = super::resolve_user(args.user, &config);
    let store = TomlSettingsStore::open_default()?;

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async move {
        let mut command = Command::new(std::env::current_exe()?);
        command
            .arg("service")
            .arg("--user")
            .arg(&user)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(sensor) = &args.sensor {
            command.arg("--sensor").arg(sensor);
        }
        let mut child = command.spawn()?;
        let child_stdin = child.stdin.take().ok_or("background stdin unavailable")?;
        let child_stdout = child.stdout.take().ok_or("background stdout unavailable")?;

        let (end, bridge) = connect_ui_stdio(BufReader::new(child_stdout), child_stdin);
        let mut session = UiSession::new(end, store, user);
        let mut input = BufReader::new(tokio::io::stdin()).lines();
        println!("{HELP}");
        if let Err(notice) = session.load_settings() {
            println!("{}", notice_text(&notice));
        }

        loop {
            tokio::select! {
                snapshot = session.next_snapshot() => match snapshot {
                    Some(snapshot) => println!("{}", render(&snapshot)),
                    None => {
                        println!("background stopped");
                        break;
                    }
                },
                line = input.next_line() => match line {
                    Ok(Some(line)) => match parse_command(&line) {
                        Ok(Some(message)) => {
                            for notice in session.commit(message) {
                                println!("{}", notice_text(&notice));
                            }
                            if let Some(text) = describe(&message) {
                                println!("{text}");
                            }
                            if session.is_closed() {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => println!("{e}"),
                    },
                    _ => {
                        session.stop();
                        break;
                    }
                },
            }
        }

        // Closing our side closes the child's stdin, which also stops it.
        drop(session);
        bridge.finish().await;
        match tokio::time::timeout(CHILD_EXIT_GRACE, child.wait()).await {
            Ok(status) => {
                status?;
            }
            Err(_) => {
                warn!("background did not exit; killing it");
                child.kill().await?;
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    });
    rt.shutdown_timeout(Duration::from_millis(100));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("start"), Ok(Some(UiMessage::StartTimer)));
        assert_eq!(parse_command("  QUIT "), Ok(Some(UiMessage::StopService)));
        assert_eq!(
            parse_command("duration 90"),
            Ok(Some(UiMessage::DurationChanged(90)))
        );
        assert_eq!(
            parse_command("volume 0.5"),
            Ok(Some(UiMessage::VolumeChanged(0.5)))
        );
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(parse_command("duration 0").is_err());
        assert!(parse_command("duration soon").is_err());
        assert!(parse_command("volume 2").is_err());
        assert!(parse_command("start now").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn render_marks_hand() {
        let snap = Snapshot {
            remaining_seconds: 5,
            is_running: true,
            is_near: true,
        };
        assert_eq!(render(&snap), "Timer Running: 00:05  [hand near]");
    }

    #[test]
    fn unreadable_settings_are_explained() {
        let text = notice_text(&UiNotice::SettingsUnavailable("store unavailable".into()));
        assert_eq!(text, "saved settings unavailable, using defaults: store unavailable");
    }
}
