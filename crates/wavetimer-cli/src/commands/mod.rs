pub mod config;
pub mod service;
pub mod settings;
pub mod ui;

/// Settings-store user key: the flag wins, then the config file.
pub(crate) fn resolve_user(flag: Option<String>, config: &wavetimer_core::Config) -> String {
    flag.unwrap_or_else(|| config.user.key.clone())
}
