//! Serves one `POST /validate_<name>` endpoint per schema component of an
//! OpenAPI 3 or Swagger 2 document.

pub mod apispec;
pub mod config;
pub mod error;
pub mod health;
pub mod loader;
pub mod observability;
pub mod openapi;
pub mod registry;
pub mod schema;
pub mod server;
pub mod shutdown;

use crate::config::Config;
use crate::error::JcvError;
use crate::loader::{Source, load_document};
use crate::openapi::ApiDocument;
use crate::registry::ComponentRegistry;
use crate::schema::{SchemaOptions, parse_draft};
use std::time::Duration;
use tracing::info;

pub use crate::server::{AppState, ShutdownHandle, ValidatorServer};

/// Schema compilation settings derived from the config, with external
/// references resolved relative to `source`.
pub fn schema_options(config: &Config, source: &Source) -> Result<SchemaOptions, JcvError> {
    let draft = match config.draft() {
        Some(raw) => Some(parse_draft(raw)?),
        None => None,
    };
    Ok(SchemaOptions {
        draft,
        remote_refs: config.remote_refs(),
        base_url: source.base_url(),
        fetch_timeout: Duration::from_secs(config.fetch_timeout_secs()),
    })
}

/// Loads `source_arg` (URL or path), parses it and compiles every component.
pub fn load_registry(
    source_arg: &str,
    config: &Config,
) -> Result<(Source, ComponentRegistry), JcvError> {
    let timeout = Duration::from_secs(config.fetch_timeout_secs());
    let (source, text) = load_document(source_arg, timeout)?;
    info!("loaded {} ({} bytes)", source, text.len());

    let document = ApiDocument::parse(&text, config.nullable())?;
    let options = schema_options(config, &source)?;
    let registry = ComponentRegistry::build(&document, &options)?;
    Ok((source, registry))
}

/// Loads the source and binds the listener without serving yet.
pub fn prepare_server(source_arg: &str, config: &Config) -> Result<ValidatorServer, JcvError> {
    let (_, registry) = load_registry(source_arg, config)?;
    let state = AppState::from_config(registry, config);
    ValidatorServer::bind(&config.bind_address(), state, config.workers())
}
