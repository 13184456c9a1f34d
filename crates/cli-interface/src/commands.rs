//! Subcommand execution

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::debug;

use common::models::Task;
use orchestrator_core::{ModelService, ModelUpdate, UploadRequest};
use storage_adapter::UploadPackage;

use crate::cli::Command;

/// Runs a subcommand for the owner of `namespace` and returns its result as JSON
pub async fn execute(command: Command, service: &dyn ModelService, namespace: &str) -> Result<Value> {
    debug!(?command, namespace, "Executing command");

    let output = match command {
        Command::Create {
            name,
            path,
            task,
            description,
            online,
        } => {
            let task: Task = task.parse()?;
            let package = UploadPackage::from_dir(&path)
                .with_context(|| format!("Failed to read model repository {}", path.display()))?;
            let request = UploadRequest {
                namespace: namespace.to_string(),
                name,
                task,
                description,
                package,
                online,
            };
            serde_json::to_value(service.create_model_by_upload(request).await?)?
        }
        Command::List => serde_json::to_value(service.list_models(namespace).await?)?,
        Command::Get { name } => serde_json::to_value(service.get_model(namespace, &name).await?)?,
        Command::Update {
            name,
            version,
            status,
            description,
        } => {
            let update = ModelUpdate { status, description };
            serde_json::to_value(service.update_model(namespace, &name, version, update).await?)?
        }
        Command::Delete { name } => {
            let cleanup = service.delete_model(namespace, &name).await?;
            json!({ "deleted": name, "cleanup": cleanup })
        }
        Command::DeleteVersion { name, version } => {
            let cleanup = service.delete_model_version(namespace, &name, version).await?;
            json!({ "deleted": name, "version": version, "cleanup": cleanup })
        }
        Command::Predict { name, version, inputs } => {
            let mut batch = Vec::with_capacity(inputs.len());
            for input in &inputs {
                let bytes = tokio::fs::read(input)
                    .await
                    .with_context(|| format!("Failed to read input {}", input.display()))?;
                batch.push(bytes);
            }
            serde_json::to_value(service.predict(namespace, &name, version, batch).await?)?
        }
    };

    Ok(output)
}
