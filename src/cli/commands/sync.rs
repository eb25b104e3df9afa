//! Sync command handler

use crate::clients::PlexClient;
use crate::config::Config;
use crate::sync::{SyncDriver, SyncError};
use anyhow::Context;
use std::sync::Arc;

pub async fn cmd_sync(config: &Config, force: bool, json: bool) -> anyhow::Result<()> {
    config.validate()?;

    let client = PlexClient::new(
        &config.server.base_url,
        config.server.token.clone(),
        config.server.client_identifier.clone(),
        config.server.request_timeout(),
    )?;

    let driver = SyncDriver::new(
        Arc::new(client),
        config.sync_settings(force),
        &config.general.database_path,
    );

    let report = match driver.run(force).await {
        Ok(report) => report,
        Err(SyncError::Catalog(e)) if e.is_auth() => {
            anyhow::bail!("Sync failed: {e}; check server.token or pass --token")
        }
        Err(e) => return Err(e).context("Sync failed"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.to_string().trim_end());
        if !report.is_fresh_skip() {
            println!("Mirror: {}", config.general.database_path.display());
        }
    }

    Ok(())
}
