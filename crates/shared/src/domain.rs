use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(TemplateId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Short,
    Long,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Short => "short",
            TokenKind::Long => "long",
        }
    }
}

/// A leveraged position token held in the user's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub amount: f64,
    pub currency: String,
}

impl Token {
    pub fn new(kind: TokenKind, amount: f64, currency: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            currency: currency.into(),
        }
    }

    /// Copy of this token with the amount reset, as shown in the inventory
    /// while the original sits in the configurator.
    pub fn emptied(&self) -> Self {
        Self {
            amount: 0.0,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub detail: Option<serde_json::Value>,
    pub tokens: Vec<Token>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub tokens: Vec<Token>,
}

/// The two configurator slots, one per token kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfiguratorTokens {
    pub short: Option<Token>,
    pub long: Option<Token>,
}

impl ConfiguratorTokens {
    pub fn slot(&self, kind: TokenKind) -> Option<&Token> {
        match kind {
            TokenKind::Short => self.short.as_ref(),
            TokenKind::Long => self.long.as_ref(),
        }
    }

    pub fn with_slot(&self, kind: TokenKind, token: Option<Token>) -> Self {
        let mut next = self.clone();
        match kind {
            TokenKind::Short => next.short = token,
            TokenKind::Long => next.long = token,
        }
        next
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatus {
    pub is_ready: bool,
    pub is_connected: bool,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modal {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_token: Option<Token>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_token: Option<Token>,
}

impl Modal {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_token: None,
            long_token: None,
        }
    }
}
