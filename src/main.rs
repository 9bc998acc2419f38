use anyhow::Result;
use taskpin::commands::Cli;
use taskpin::libs::messages::macros::is_debug_mode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    if is_debug_mode() {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskpin=debug"));
        tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();
    }

    Cli::menu().await
}
