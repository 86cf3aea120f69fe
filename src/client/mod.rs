//! Request/response client for the workshop service.
//!
//! The `Client` struct and its methods are organized by operation:
//! - [`registration`] - User id resolution (supplied or freshly registered)
//! - [`excavate`] - Digging up a bucket
//! - [`store`] - Reporting a gold bucket back
//! - [`callbacks`] - Success/failure/completion handler adapters

pub mod callbacks;
mod excavate;
mod registration;
mod store;


pub use callbacks::{ExcavateHandler, StoreHandler};
pub use registration::OnRegistered;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::transport::{HttpTransport, Transport};
use crate::types::UserId;
use registration::Registrar;
use std::sync::Arc;

/// Client instance (cloneable - all fields are Arc-wrapped)
///
/// Construction resolves the user id: a supplied id is used as-is, otherwise the
/// client registers `user_name` with the service. A client that exists always has
/// a user id.
#[derive(Clone)]
pub struct Client {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<ClientConfig>,
    /// Network layer
    pub(crate) transport: Arc<dyn Transport>,
    /// Write-once user id and the registration hook
    pub(crate) registrar: Arc<Registrar>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url)
            .field("user_name", &self.config.user_name)
            .field("user_id", &self.registrar.get())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client over HTTP, registering if no user id was supplied
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, and on any registration failure: without a
    /// user id the client is unusable.
    pub async fn new(config: ClientConfig) -> Result<Self> {
        Self::connect(config, None).await
    }

    /// Like [`Client::new`], invoking `on_registered` once if a fresh id is issued
    ///
    /// The hook is where callers persist the id so later runs can supply it.
    pub async fn with_registration_hook<F>(config: ClientConfig, on_registered: F) -> Result<Self>
    where
        F: FnOnce(&UserId) + Send + 'static,
    {
        Self::connect(config, Some(Box::new(on_registered))).await
    }

    async fn connect(config: ClientConfig, on_registered: Option<OnRegistered>) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Self::with_transport(config, transport, on_registered).await
    }

    /// Create a client over a custom [`Transport`]
    ///
    /// # Errors
    ///
    /// Same as [`Client::new`]; the configuration is validated before any request.
    pub async fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        on_registered: Option<OnRegistered>,
    ) -> Result<Self> {
        config.validate()?;
        let registrar = Registrar::new(config.supplied_user_id(), on_registered);
        let client = Self {
            config: Arc::new(config),
            transport,
            registrar: Arc::new(registrar),
        };

        client.resolve_user_id().await?;
        Ok(client)
    }

    /// Configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The resolved user id
    pub fn user_id(&self) -> Option<&UserId> {
        self.registrar.get()
    }

    /// Resolve the user id, registering at most once
    pub(crate) async fn resolve_user_id(&self) -> Result<&UserId> {
        self.registrar
            .resolve(&self.config, self.transport.as_ref())
            .await
    }
}
