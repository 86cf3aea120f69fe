//! User id resolution.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::protocol::{self, Endpoint};
use crate::transport::Transport;
use crate::types::UserId;
use std::sync::{Mutex, PoisonError};
use tokio::sync::OnceCell;

/// Hook invoked with a freshly issued user id
pub type OnRegistered = Box<dyn FnOnce(&UserId) + Send + 'static>;

/// Write-once holder for the user id
///
/// The id is either supplied up front or set by the first successful registration.
/// Readers only ever see it after the registration hook has run.
pub(crate) struct Registrar {
    user_id: OnceCell<UserId>,
    on_registered: Mutex<Option<OnRegistered>>,
}

impl Registrar {
    pub(crate) fn new(supplied: Option<&str>, on_registered: Option<OnRegistered>) -> Self {
        Self {
            user_id: OnceCell::new_with(supplied.map(UserId::from)),
            on_registered: Mutex::new(on_registered),
        }
    }

    pub(crate) fn get(&self) -> Option<&UserId> {
        self.user_id.get()
    }

    /// Return the user id, registering first if there is none yet
    ///
    /// Concurrent callers wait on the same registration; a failed registration
    /// leaves the cell empty.
    pub(crate) async fn resolve(
        &self,
        config: &ClientConfig,
        transport: &dyn Transport,
    ) -> Result<&UserId> {
        self.user_id
            .get_or_try_init(|| self.register(config, transport))
            .await
    }

    async fn register(&self, config: &ClientConfig, transport: &dyn Transport) -> Result<UserId> {
        tracing::info!(user_name = %config.user_name, "Registering user");

        let response = transport
            .post(Endpoint::Register, &[("userName", config.user_name.as_str())])
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Registration request failed"))?;
        let body = response.into_ok_body()?;
        let registration = protocol::parse_registration(&body)
            .inspect_err(|e| tracing::error!(error = %e, "Registration response rejected"))?;

        tracing::info!(
            user_id = %registration.user_id,
            name = registration.name.as_deref().unwrap_or_default(),
            "Registered user"
        );

        let hook = self
            .on_registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(hook) = hook {
            hook(&registration.user_id);
        }

        Ok(registration.user_id)
    }
}
