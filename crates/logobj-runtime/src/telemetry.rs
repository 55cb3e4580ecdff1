//! Tracing subscriber setup

use logobj_core::{ObjError, ObjResult};
use tracing_subscriber::EnvFilter;

use crate::LogConfig;

fn build_filter(config: &LogConfig) -> ObjResult<EnvFilter> {
    if config.filter.is_empty() {
        return Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));
    }
    EnvFilter::try_new(&config.filter)
        .map_err(|e| ObjError::Config(format!("invalid log filter {:?}: {}", config.filter, e)))
}

/// Install the global tracing subscriber. Fails if one is already set.
pub fn init_tracing(config: &LogConfig) -> ObjResult<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ObjError::Config(format!("failed to install subscriber: {}", e)))?;

    tracing::debug!(json = config.json, filter = %config.filter, "tracing initialized");
    Ok(())
}
