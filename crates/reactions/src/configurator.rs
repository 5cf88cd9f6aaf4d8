//! Bundle configurator: moving tokens in and out of the short/long slots, the
//! bundling flow, and the modal it drives.

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Value};
use shared::{
    domain::{Bundle, ConfiguratorTokens, Modal, Token},
    protocol::{actions, state_keys, TokenChangeRequest},
};
use store_core::{AppState, Patch, ReactionContext};
use tracing::debug;

pub(crate) fn change_modal(cx: ReactionContext) -> Result<Option<Patch>> {
    let modal = match cx.payload() {
        Value::String(name) => serde_json::to_value(Modal::named(name.as_str()))?,
        other => other.clone(),
    };
    Ok(Some(Patch::new().with(state_keys::MODAL, modal)))
}

pub(crate) fn configurator_token_change(cx: ReactionContext) -> Result<Option<Patch>> {
    let request: TokenChangeRequest = cx.payload_as()?;
    apply_token_change(cx.current_state(), &request)
}

/// Patch for one drop of a token onto (or off) the configurator, or `None`
/// when the drop changes nothing.
pub fn apply_token_change(state: &AppState, request: &TokenChangeRequest) -> Result<Option<Patch>> {
    let tokens: Vec<Token> = state.get_or_default(state_keys::TOKENS)?;
    let configurator: ConfiguratorTokens = state.get_or_default(state_keys::CONFIGURATOR_TOKENS)?;
    let token = &request.token;

    let (tokens, configurator) = if request.remove {
        // Give the dragged token its amount back in the inventory list.
        let tokens = tokens
            .into_iter()
            .map(|held| {
                if held.currency == token.currency {
                    token.clone()
                } else {
                    held
                }
            })
            .collect::<Vec<_>>();
        (tokens, configurator.with_slot(token.kind, None))
    } else {
        match configurator.slot(token.kind) {
            Some(occupant) if occupant.currency == token.currency => return Ok(None),
            Some(occupant) => {
                // Swap: the occupant goes back to the list, the new token's
                // entry stays in the list with no amount.
                let tokens = tokens
                    .into_iter()
                    .map(|held| {
                        if held.currency == occupant.currency {
                            occupant.clone()
                        } else if held.currency == token.currency {
                            token.emptied()
                        } else {
                            held
                        }
                    })
                    .collect::<Vec<_>>();
                (tokens, configurator.with_slot(token.kind, Some(token.clone())))
            }
            None => {
                let tokens = tokens
                    .into_iter()
                    .map(|held| {
                        if held.currency == token.currency {
                            token.emptied()
                        } else {
                            held
                        }
                    })
                    .collect::<Vec<_>>();
                (tokens, configurator.with_slot(token.kind, Some(token.clone())))
            }
        }
    };

    let patch = Patch::new()
        .with_serialized(state_keys::TOKENS, &tokens)?
        .with_serialized(state_keys::CONFIGURATOR_TOKENS, &configurator)?;
    Ok(Some(patch))
}

pub(crate) fn start_bundling(
    delay: Duration,
) -> impl Fn(ReactionContext) -> Result<Option<Patch>> + Send + Sync + 'static {
    move |cx| {
        let configurator: ConfiguratorTokens = cx
            .current_state()
            .get_or_default(state_keys::CONFIGURATOR_TOKENS)?;
        // Appended to when the bundle completes, so a bundle finished in the
        // meantime by another StartBundling is overwritten.
        let bundles: Vec<Bundle> = cx.current_state().get_or_default(state_keys::BUNDLES)?;

        cx.dispatch(actions::CHANGE_MODAL, json!("Bundling"))?;

        cx.defer(delay, move |reactor| {
            let ConfiguratorTokens { short, long } = configurator;
            let mut bundles = bundles;
            bundles.push(Bundle {
                detail: None,
                tokens: short.iter().chain(long.iter()).cloned().collect(),
                timestamp: Utc::now(),
            });

            reactor.update(
                Patch::new()
                    .with_serialized(state_keys::BUNDLES, &bundles)?
                    .with_serialized(
                        state_keys::CONFIGURATOR_TOKENS,
                        &ConfiguratorTokens::default(),
                    )?,
            );

            let bundled = Modal {
                name: "Bundled".to_string(),
                short_token: short,
                long_token: long,
            };
            reactor.dispatch(actions::CHANGE_MODAL, serde_json::to_value(bundled)?)?;
            Ok(())
        })?;
        Ok(None)
    }
}

/// Transaction status reload is not wired to a chain yet.
pub(crate) fn refresh_bundling(_cx: ReactionContext) -> Result<Option<Patch>> {
    debug!("bundling refresh requested");
    Ok(None)
}
