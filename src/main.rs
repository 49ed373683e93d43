use clap::Parser;
use photo_bridge::cli::{self, Args, Command};
use photo_bridge::config::Config;
use tracing_subscriber::EnvFilter;

/// Load environment variables from .env file if present.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

/// Log to stderr; stdout belongs to the channel in `serve`.
///
/// RUST_LOG wins over the configured level.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load config file.
///
/// If --config is specified, require the file to exist. Otherwise fall back
/// to defaults if the default config cannot be read.
fn load_config(args: &Args) -> Config {
    if let Some(path) = &args.config {
        match Config::load_explicit(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match Config::load(None) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                eprintln!("Using default settings.\n");
                Config::default()
            }
        }
    }
}

fn main() {
    // Load .env file before anything else
    load_env();

    let args = Args::parse();
    let config = load_config(&args);
    init_logging(&config);

    let settings = match cli::camera_settings(&args, &config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Command::Serve { channel } => {
            let channel = channel.unwrap_or_else(|| config.channel.name.clone());
            cli::serve(settings, &channel)
        }
        Command::Capture { output } => cli::capture(settings, &output),
        Command::Check => cli::check(settings),
        Command::Config { action } => {
            cli::handle_config_action(action, &config, &settings);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
