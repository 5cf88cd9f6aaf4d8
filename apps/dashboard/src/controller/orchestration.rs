//! Action scripts the host runs against the store.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use shared::{
    domain::{ConfiguratorTokens, Token, TokenKind},
    protocol::{actions, state_keys},
};
use store_core::Store;
use tracing::{debug, info};

use crate::config::Settings;

pub fn dispatch_action(store: &Store, action: &str, payload: Value) -> Result<()> {
    debug!(action, "dispatching ui action");
    store
        .dispatch(action, payload)
        .with_context(|| format!("action {action} failed"))
}

/// Same actions, same order as the browser dashboard on page load.
pub async fn run_startup(store: &Store, settings: &Settings) -> Result<()> {
    dispatch_action(store, actions::INITIALIZE_WALLET, Value::Null)?;
    dispatch_action(store, actions::LOAD_PUZZLE_TOKENS, Value::Null)?;
    dispatch_action(store, actions::LOAD_CURRENT_PRICES, Value::Null)?;

    tokio::time::sleep(settings.wallet_connect_delay()).await;
    dispatch_action(store, actions::CONNECT_WALLET, Value::Null)?;

    store
        .settle()
        .await
        .context("startup reactions did not complete")?;
    info!("startup actions settled");
    Ok(())
}

/// Drags the first short and first long token into the configurator and
/// bundles them.
pub async fn run_bundling_demo(store: &Store) -> Result<()> {
    let tokens: Vec<Token> = store
        .get_state()
        .get_or_default(state_keys::TOKENS)
        .context("tokens in state are malformed")?;

    for kind in [TokenKind::Short, TokenKind::Long] {
        let token = tokens
            .iter()
            .find(|token| token.kind == kind && token.amount > 0.0)
            .with_context(|| format!("no {} token available to bundle", kind.as_str()))?;
        dispatch_action(
            store,
            actions::CONFIGURATOR_TOKEN_CHANGE,
            json!({ "token": token, "remove": false }),
        )?;
    }

    let slots: ConfiguratorTokens = store
        .get_state()
        .get_or_default(state_keys::CONFIGURATOR_TOKENS)
        .context("configurator in state is malformed")?;
    info!(
        short = slots.short.as_ref().map(|token| token.currency.as_str()),
        long = slots.long.as_ref().map(|token| token.currency.as_str()),
        "bundling configurator tokens"
    );

    dispatch_action(store, actions::START_BUNDLING, Value::Null)?;
    store
        .settle()
        .await
        .context("bundling reactions did not complete")?;
    Ok(())
}
