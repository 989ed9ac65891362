use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wavetimer_core::Config;

mod commands;
mod devices;

#[derive(Parser)]
#[command(name = "wavetimer", version, about = "Hands-free interval timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the background timer process (wire protocol on stdin/stdout)
    Service(commands::service::ServiceArgs),
    /// Run the terminal UI, spawning the background process
    Ui(commands::ui::UiArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Per-user timer settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Print seconds as MM:SS
    Format {
        seconds: u32,
    },
}

fn init_logging() {
    let level = Config::load_or_default().logging.level;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout belongs to the wire protocol in service mode.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Service(args) => commands::service::run(args),
        Commands::Ui(args) => commands::ui::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Format { seconds } => {
            println!("{}", wavetimer_core::format_time(seconds));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
