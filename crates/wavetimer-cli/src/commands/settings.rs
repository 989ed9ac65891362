use clap::{Subcommand, ValueEnum};
use serde::Serialize;
use wavetimer_core::{
    Config, SettingsStore, StoredSettings, TimerConfig, TomlSettingsStore, UiMessage,
};

#[derive(Clone, Copy, ValueEnum)]
pub enum SettingKey {
    Duration,
    Volume,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show stored and effective settings as JSON
    Get {
        #[arg(long)]
        user: Option<String>,
    },
    /// Save one setting
    Set {
        key: SettingKey,
        value: String,
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Serialize)]
struct SettingsView<'a> {
    user: &'a str,
    stored: StoredSettings,
    effective: TimerConfig,
}

fn parse_setting(key: SettingKey, value: &str) -> Result<UiMessage, Box<dyn std::error::Error>> {
    Ok(match key {
        SettingKey::Duration => {
            UiMessage::DurationChanged(TimerConfig::validate_duration(value.parse::<i64>()?)?)
        }
        SettingKey::Volume => {
            UiMessage::VolumeChanged(TimerConfig::validate_volume(value.parse::<f64>()?)?)
        }
    })
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = TomlSettingsStore::open_default()?;

    match action {
        SettingsAction::Get { user } => {
            let user = super::resolve_user(user, &config);
            let stored = store.get(&user)?;
            let view = SettingsView {
                user: &user,
                effective: TimerConfig::from_stored(&stored),
                stored,
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        SettingsAction::Set { key, value, user } => {
            let user = super::resolve_user(user, &config);
            let message = parse_setting(key, &value)?;
            let partial =
                StoredSettings::from_message(&message).ok_or("not a setting")?;
            store.merge_set(&user, &partial)?;
            println!("ok");
        }
    }
    Ok(())
}
