//! Wallet bootstrap. The provider itself lives outside the store; reactions only
//! keep a [`Wallet`] in the context bag and mirror its status into state.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{domain::WalletStatus, protocol::state_keys};
use store_core::{Patch, ReactionContext};
use tracing::{info, warn};

/// Injected browser-wallet provider (the `window.ethereum` object of a web
/// wallet, or anything that behaves like one).
#[async_trait]
pub trait EthereumProvider: Send + Sync {
    fn name(&self) -> Option<String>;
    fn is_connected(&self) -> bool;
    /// Asks the user to grant account access. Rejection is an error.
    async fn enable(&self) -> Result<()>;
}

#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Whatever is available synchronously; may lack a usable provider.
    fn detect(&self) -> Wallet;
    async fn initialize(&self) -> Result<Wallet>;
}

/// Connector for environments without any wallet. Reports an empty wallet
/// rather than failing, so the dashboard shows "not ready" instead of an error.
pub struct MissingWalletConnector;

#[async_trait]
impl WalletConnector for MissingWalletConnector {
    fn detect(&self) -> Wallet {
        Wallet::default()
    }

    async fn initialize(&self) -> Result<Wallet> {
        Ok(Wallet::default())
    }
}

/// Handle bundle stored in the context bag.
#[derive(Clone, Default)]
pub struct Wallet {
    pub ethereum: Option<Arc<dyn EthereumProvider>>,
    pub ready: bool,
}

impl Wallet {
    pub fn status(&self) -> WalletStatus {
        WalletStatus {
            is_ready: self.ready,
            is_connected: self.ready
                && self
                    .ethereum
                    .as_ref()
                    .is_some_and(|provider| provider.is_connected()),
            name: self.ethereum.as_ref().and_then(|provider| provider.name()),
        }
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("status", &self.status())
            .finish()
    }
}

fn status_patch(wallet: &Wallet) -> Result<Patch> {
    Ok(Patch::new().with_serialized(state_keys::WALLET, &wallet.status())?)
}

pub(crate) fn initialize_wallet(
    connector: Arc<dyn WalletConnector>,
) -> impl Fn(ReactionContext) -> Result<Option<Patch>> + Send + Sync + 'static {
    move |cx| {
        let detected = connector.detect();
        let patch = status_patch(&detected)?;
        cx.context().set(detected);

        let connector = Arc::clone(&connector);
        let reactor = cx.reactor();
        cx.spawn(async move {
            let wallet = connector
                .initialize()
                .await
                .context("wallet initialization failed")?;
            let patch = status_patch(&wallet)?;
            reactor.context().set(wallet);
            reactor.update(patch);
            Ok(())
        })?;

        Ok(Some(patch))
    }
}

pub(crate) fn connect_wallet(cx: ReactionContext) -> Result<Option<Patch>> {
    let provider = cx
        .context()
        .get_as::<Wallet>()
        .and_then(|wallet| wallet.ethereum.clone());

    let Some(provider) = provider else {
        warn!("no ethereum wallet to connect");
        return Ok(None);
    };

    let reactor = cx.reactor();
    cx.spawn(async move {
        if let Err(err) = provider.enable().await {
            info!(error = %err, "wallet connection canceled");
            return Ok(());
        }
        // Re-read: initialization may have replaced the wallet meanwhile.
        if let Some(wallet) = reactor.context().get_as::<Wallet>() {
            reactor.update(status_patch(&wallet)?);
        }
        Ok(())
    })?;
    Ok(None)
}
