use anyhow::Result;
use clap::Parser;
use tracing::error;

use cli_interface::{execute, print_output, Cli};
use config::ConfigManager;
use model_orchestrator::ControlPlane;
use security::Credentials;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigManager::load(cli.config.as_deref())?;
    let _log_guard = logging::init(&config.get().logging)?;

    let default_owner = config.get().identity.default_owner.clone();
    let plane = ControlPlane::new(config)?;

    let credentials = match cli.owner {
        Some(owner) => {
            if owner != default_owner {
                plane.add_user(&owner);
            }
            Credentials::owner(owner)
        }
        None => Credentials::owner(default_owner),
    };

    let namespace = plane.namespace(&credentials).await?;
    let orchestrator = plane.orchestrator();

    match execute(cli.command, &*orchestrator, &namespace).await {
        Ok(output) => {
            print_output(&output);
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            Err(e)
        }
    }
}
