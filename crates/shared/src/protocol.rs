//! Action vocabulary shared by the store runtime, the reactions and the host.

use serde::{Deserialize, Serialize};

use crate::domain::Token;

/// Action types understood by the store's built-in reducer.
pub mod core_actions {
    pub const UPDATE_INVENTORY_BUNDLES: &str = "update-inventory-bundles";
    pub const UPDATE_INVENTORY_TOKENS: &str = "update-inventory-tokens";
    /// Merges the payload under the reserved [`super::state_keys::TEST`] key.
    pub const TEST: &str = "test";
}

/// Action types answered by dashboard reactions.
pub mod actions {
    pub const EXAMPLE_ACTION: &str = "ExampleAction";
    pub const INITIALIZE_WALLET: &str = "InitializeWallet";
    pub const CONNECT_WALLET: &str = "ConnectWallet";
    pub const CHANGE_MODAL: &str = "ChangeModal";
    pub const LOAD_PUZZLE_TOKENS: &str = "LoadPuzzleTokens";
    pub const CREATE_TEMPLATES: &str = "CreateTemplates";
    pub const LOAD_CURRENT_PRICES: &str = "LoadCurrentPrices";
    pub const CONFIGURATOR_TOKEN_CHANGE: &str = "ConfiguratorTokenChange";
    pub const START_BUNDLING: &str = "StartBundling";
    pub const REFRESH_BUNDLING: &str = "RefreshBundling";
}

/// Top-level keys of the application state.
pub mod state_keys {
    pub const INVENTORY: &str = "inventory";
    pub const TEST: &str = "test";
    pub const TOKENS: &str = "tokens";
    pub const BUNDLES: &str = "bundles";
    pub const TEMPLATES: &str = "templates";
    pub const CONFIGURATOR_TOKENS: &str = "configuratorTokens";
    pub const PRICES: &str = "prices";
    pub const PRICES_CURRENCY: &str = "pricesCurrency";
    pub const WALLET: &str = "wallet";
    pub const MODAL: &str = "modal";
}

/// Payload of `ConfiguratorTokenChange`, produced by the drag-and-drop layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenChangeRequest {
    pub token: Token,
    #[serde(default)]
    pub remove: bool,
}
