use clap::Parser;
use taskit::cli::commands::Cli;
use taskit::cli::handlers;
use taskit::io::config_io::load_config;

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), cli.command.file()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config.log.level);

    if let Err(e) = handlers::dispatch(cli, &config) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays parseable. `RUST_LOG` wins over the
/// configured level.
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();
}
