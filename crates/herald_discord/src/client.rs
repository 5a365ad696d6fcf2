//! Discord client setup and lifecycle management.

use crate::handler::{BackendSlot, HeraldHandler};
use crate::{SerenityHandle, resolve_intents};
use herald_core::{Backend, DiscordConfig, Framework};
use herald_error::{HeraldResult, TransportError};
use serenity::Client;
use serenity::all::GatewayIntents;
use std::sync::{Arc, OnceLock};
use tracing::{info, instrument, warn};

/// A serenity client wired to a [`Backend`].
///
/// # Example
///
/// ```no_run
/// use herald_core::HeraldConfig;
/// use herald_discord::HeraldBot;
/// # use std::sync::Arc;
/// # async fn run(framework: Arc<dyn herald_core::Framework>) -> herald_error::HeraldResult<()> {
/// let config = HeraldConfig::from_file("herald.toml")?;
/// let bot = HeraldBot::new(config.discord(), framework).await?;
/// bot.serve().await?;
/// # Ok(())
/// # }
/// ```
pub struct HeraldBot {
    client: Client,
    backend: Arc<Backend>,
}

impl HeraldBot {
    /// Build the serenity client and the backend around it.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is missing or serenity rejects it.
    #[instrument(skip_all)]
    pub async fn new(config: &DiscordConfig, framework: Arc<dyn Framework>) -> HeraldResult<Self> {
        let token = config.token()?;
        let intents = resolve_intents(config.initial_intents, &config.intents);
        if !intents.contains(GatewayIntents::MESSAGE_CONTENT) {
            warn!("MESSAGE_CONTENT intent is off; guild message bodies will arrive empty");
        }
        info!(intents = ?intents, "Building Serenity client");

        let slot: BackendSlot = Arc::new(OnceLock::new());
        let client = Client::builder(token, intents)
            .event_handler(HeraldHandler::new(Arc::clone(&slot)))
            .await
            .map_err(|e| TransportError::new(format!("Failed to build client: {}", e)))?;

        let handle = Arc::new(SerenityHandle::new(
            Arc::clone(&client.cache),
            Arc::clone(&client.http),
            Arc::clone(&client.shard_manager),
        ));
        let backend = Arc::new(Backend::new(config, handle.clone(), handle, framework));
        // Fresh slot, nothing else can have filled it.
        let _ = slot.set(Arc::clone(&backend));

        info!("Serenity client built");
        Ok(Self { client, backend })
    }

    /// The backend frameworks talk to.
    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }

    /// Connect and process events until the gateway closes or Ctrl+C.
    ///
    /// The backend is disconnected on the way out either way.
    #[instrument(skip(self))]
    pub async fn serve(mut self) -> HeraldResult<()> {
        self.backend.start();
        let shard_manager = Arc::clone(&self.client.shard_manager);

        let result = tokio::select! {
            result = self.client.start() => result.map_err(TransportError::from),
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("Interrupt received, shutting down"),
                    Err(e) => warn!(error = %e, "Failed to listen for interrupt, shutting down"),
                }
                shard_manager.shutdown_all().await;
                Ok(())
            }
        };

        self.backend.disconnect().await;
        Ok(result?)
    }
}

impl std::fmt::Debug for HeraldBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeraldBot")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}
