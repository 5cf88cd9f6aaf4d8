//! Reactions behind the bundle dashboard.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use serde_json::{json, Value};
use shared::{
    domain::ConfiguratorTokens,
    protocol::{actions, state_keys},
};
use store_core::{AppState, Patch, ReactionContext, Reactions, StoreResult};

pub mod configurator;
pub mod inventory;
pub mod wallet;

pub use configurator::apply_token_change;
pub use wallet::{EthereumProvider, MissingWalletConnector, Wallet, WalletConnector};

/// Delays of the mocked chain calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionSettings {
    pub example_delay: Duration,
    pub token_load_delay: Duration,
    pub price_load_delay: Duration,
    pub bundling_delay: Duration,
}

impl Default for ReactionSettings {
    fn default() -> Self {
        Self {
            example_delay: Duration::from_millis(600),
            token_load_delay: Duration::from_millis(600),
            price_load_delay: Duration::from_millis(350),
            bundling_delay: Duration::from_millis(1400),
        }
    }
}

pub fn dashboard_reactions(
    settings: &ReactionSettings,
    wallet_connector: Arc<dyn WalletConnector>,
) -> Reactions {
    Reactions::new()
        .on(actions::EXAMPLE_ACTION, example_action(settings.example_delay))
        .on(
            actions::INITIALIZE_WALLET,
            wallet::initialize_wallet(wallet_connector),
        )
        .on(actions::CONNECT_WALLET, wallet::connect_wallet)
        .on(actions::CHANGE_MODAL, configurator::change_modal)
        .on(
            actions::LOAD_PUZZLE_TOKENS,
            inventory::load_puzzle_tokens(settings.token_load_delay),
        )
        .on(actions::CREATE_TEMPLATES, inventory::create_templates)
        .on(
            actions::LOAD_CURRENT_PRICES,
            inventory::load_current_prices(settings.price_load_delay),
        )
        .on(
            actions::CONFIGURATOR_TOKEN_CHANGE,
            configurator::configurator_token_change,
        )
        .on(
            actions::START_BUNDLING,
            configurator::start_bundling(settings.bundling_delay),
        )
        .on(actions::REFRESH_BUNDLING, configurator::refresh_bundling)
}

/// Store's initial inventory plus the empty collections the dashboard reads.
pub fn dashboard_initial_state() -> StoreResult<AppState> {
    let patch = Patch::new()
        .with(state_keys::TOKENS, json!([]))
        .with(state_keys::BUNDLES, json!([]))
        .with(state_keys::TEMPLATES, json!([]))
        .with_serialized(
            state_keys::CONFIGURATOR_TOKENS,
            &ConfiguratorTokens::default(),
        )?;
    Ok(AppState::initial().merged(&patch))
}

/// Template for new reactions: one synchronous patch now, one deferred later.
fn example_action(
    delay: Duration,
) -> impl Fn(ReactionContext) -> Result<Option<Patch>> + Send + Sync + 'static {
    move |cx| {
        cx.defer(delay, |reactor| {
            reactor.update(Patch::new().with("foo", true));
            Ok(())
        })?;
        Ok(Some(Patch::new().with("foo", Value::Null)))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
