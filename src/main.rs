mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;
use tracing::info;

use logengine::config::Config;
use logengine::console::Console;
use logengine::engine::{Engine, EngineApi};
use logengine::{api, observability};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config = Config::load_with(cli.config)?;
    observability::init_tracing(&config.telemetry);

    let engine = Arc::new(Engine::from_config(&config));
    if !engine.init() {
        return Err(format!("engine init failed: {}", engine.last_error()).into());
    }

    match cli.command {
        Commands::Server(args) => api::run(config, engine, args.address).await?,
        Commands::Console => {
            let console = Console::new(EngineApi::new(Arc::clone(&engine)));
            tokio::task::spawn_blocking(move || {
                let stdin = std::io::stdin();
                console.run(stdin.lock(), &mut std::io::stdout(), &mut std::io::stderr())
            })
            .await??;

            if !engine.shutdown() {
                return Err(format!("engine shutdown failed: {}", engine.last_error()).into());
            }
            info!("Shutdown complete");
        }
    }

    Ok(())
}
