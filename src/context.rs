// Application context - everything a front end needs, built once at startup

use crate::auth::{Authenticator, HostedAuthenticator, StaticAuthenticator};
use crate::config::{AppConfig, AuthMode, Backend};
use crate::db::{KeyValueStorage, SqliteStorage};
use crate::error::ConfigError;
use crate::registry::ChurchRegistry;
use crate::store::RestClient;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ChurchContext {
    pub registry: ChurchRegistry,
    pub auth: Arc<dyn Authenticator>,
}

impl ChurchContext {
    pub fn new(registry: ChurchRegistry, auth: Arc<dyn Authenticator>) -> Self {
        ChurchContext { registry, auth }
    }

    /// Open storage and clients as configured.
    ///
    /// The key/value database is opened even for a remote backend when the
    /// static authenticator needs somewhere to remember the sign-in.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        config.check()?;

        let needs_storage = config.backend == Backend::Local || config.auth == AuthMode::Static;
        let storage: Option<Arc<dyn KeyValueStorage>> = if needs_storage {
            Some(Arc::new(SqliteStorage::open(&config.database_path)?))
        } else {
            None
        };

        let client = match (config.backend, config.auth) {
            (Backend::Local, AuthMode::Static) => None,
            _ => {
                let (url, key) = config.hosted_project()?;
                Some(RestClient::new(url, key)?)
            }
        };

        let registry = match (config.backend, &storage, &client) {
            (Backend::Local, Some(storage), _) if config.seed => {
                ChurchRegistry::local(storage.clone())
            }
            (Backend::Local, Some(storage), _) => ChurchRegistry::local_unseeded(storage.clone()),
            (Backend::Remote, _, Some(client)) => ChurchRegistry::remote(client.clone()),
            _ => return Err(ConfigError::Missing("SUPABASE_URL")),
        };

        let auth: Arc<dyn Authenticator> = match (config.auth, storage, client) {
            (AuthMode::Static, Some(storage), _) => {
                Arc::new(StaticAuthenticator::new(config.admin.clone(), storage))
            }
            (AuthMode::Hosted, _, Some(client)) => Arc::new(HostedAuthenticator::for_client(client)),
            _ => return Err(ConfigError::Missing("SUPABASE_URL")),
        };

        info!(
            backend = registry.members.backend_tag(),
            auth = ?config.auth,
            "church context ready"
        );
        Ok(ChurchContext { registry, auth })
    }
}
