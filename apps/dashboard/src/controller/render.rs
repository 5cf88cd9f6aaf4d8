//! Text renderer: one summary line per state change.

use crossbeam_channel::Receiver;
use shared::{
    domain::{Bundle, ConfiguratorTokens, Modal, Template, Token, WalletStatus},
    protocol::state_keys,
};
use store_core::{AppState, Store};
use tracing::warn;

use crate::controller::events::UiEvent;

/// Renders on every [`UiEvent::StateChanged`] until [`UiEvent::Shutdown`] or
/// until every sender is gone. Returns the number of frames drawn.
pub fn run_render_loop(store: Store, ui_rx: Receiver<UiEvent>) -> usize {
    let mut frames = 0;
    while let Ok(event) = ui_rx.recv() {
        match event {
            UiEvent::StateChanged => {
                frames += 1;
                println!("[frame {frames}] {}", summarize(&store.get_state()));
            }
            UiEvent::Shutdown => break,
        }
    }
    frames
}

pub fn summarize(state: &AppState) -> String {
    let tokens = decode_or_default::<Vec<Token>>(state, state_keys::TOKENS);
    let bundles = decode_or_default::<Vec<Bundle>>(state, state_keys::BUNDLES);
    let templates = decode_or_default::<Vec<Template>>(state, state_keys::TEMPLATES);
    let slots = decode_or_default::<ConfiguratorTokens>(state, state_keys::CONFIGURATOR_TOKENS);
    let wallet = decode_or_default::<WalletStatus>(state, state_keys::WALLET);

    let slot = |token: Option<&Token>| {
        token
            .map(|token| token.currency.clone())
            .unwrap_or_else(|| "-".to_string())
    };
    let wallet_label = match (wallet.is_ready, wallet.is_connected) {
        (_, true) => "connected",
        (true, false) => "ready",
        (false, false) => "unavailable",
    };
    let modal = state
        .get_as::<Modal>(state_keys::MODAL)
        .ok()
        .flatten()
        .map(|modal| modal.name)
        .unwrap_or_else(|| "-".to_string());
    let prices = state
        .get(state_keys::PRICES_CURRENCY)
        .and_then(|currency| currency.as_str())
        .unwrap_or("-");

    format!(
        "tokens={} bundles={} templates={} configurator={}/{} prices={} wallet={} modal={}",
        tokens.len(),
        bundles.len(),
        templates.len(),
        slot(slots.short.as_ref()),
        slot(slots.long.as_ref()),
        prices,
        wallet_label,
        modal,
    )
}

fn decode_or_default<T>(state: &AppState, key: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    state.get_or_default(key).unwrap_or_else(|err| {
        warn!(key, error = %err, "state value has unexpected shape");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn summarizes_empty_dashboard() {
        let state = reactions::dashboard_initial_state().expect("state");
        assert_eq!(
            summarize(&state),
            "tokens=0 bundles=0 templates=0 configurator=-/- prices=- wallet=unavailable modal=-"
        );
    }

    #[test]
    fn summarizes_loaded_dashboard() {
        let state = AppState::from_value(json!({
            "tokens": reactions::inventory::puzzle_tokens(),
            "templates": reactions::inventory::templates_for(&reactions::inventory::puzzle_tokens()),
            "configuratorTokens": { "short": { "type": "short", "amount": 2.0, "currency": "L-ETH" }, "long": null },
            "pricesCurrency": "USD",
            "wallet": { "isReady": true, "isConnected": false, "name": "MetaMask" },
            "modal": { "name": "Bundling" },
        }))
        .expect("state");

        assert_eq!(
            summarize(&state),
            "tokens=4 bundles=0 templates=2 configurator=L-ETH/- prices=USD wallet=ready modal=Bundling"
        );
    }

    #[test]
    fn malformed_values_render_as_empty() {
        let state = AppState::from_value(json!({ "tokens": "oops", "modal": 3 })).expect("state");
        assert!(summarize(&state).starts_with("tokens=0 "));
        assert!(summarize(&state).ends_with("modal=-"));
    }

    #[test]
    fn render_loop_draws_one_frame_per_change() {
        let store = Store::default();
        let (ui_tx, ui_rx) = crossbeam_channel::unbounded();
        ui_tx.send(UiEvent::StateChanged).expect("send");
        ui_tx.send(UiEvent::StateChanged).expect("send");
        ui_tx.send(UiEvent::Shutdown).expect("send");
        ui_tx.send(UiEvent::StateChanged).expect("send");

        assert_eq!(run_render_loop(store, ui_rx), 2);
    }
}
