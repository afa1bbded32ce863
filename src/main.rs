use std::env;

use prodeff::cli;
use prodeff::config::Config;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_tracing() {
    let fallback = Config::load()
        .map(|config| config.log_filter)
        .unwrap_or_else(|_| Config::default().log_filter);
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() {
    init_tracing();
    let args: Vec<String> = env::args().collect();
    std::process::exit(cli::run_with_args(&args));
}
