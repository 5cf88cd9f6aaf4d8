//! Token, template and price loading. The chain calls are still mocked with
//! fixed data behind timers.

use std::{collections::BTreeMap, time::Duration};

use anyhow::Result;
use serde_json::Value;
use shared::{
    domain::{Template, TemplateId, Token, TokenKind},
    protocol::{actions, state_keys},
};
use store_core::{Patch, ReactionContext};

pub const PRICES_CURRENCY: &str = "USD";

pub fn puzzle_tokens() -> Vec<Token> {
    vec![
        Token::new(TokenKind::Short, 2.45, "L-DAI"),
        Token::new(TokenKind::Short, 2.0, "L-ETH"),
        Token::new(TokenKind::Long, 1000.0, "S-DAI"),
        Token::new(TokenKind::Long, 212.13, "S-ETH"),
    ]
}

pub fn current_prices() -> BTreeMap<String, f64> {
    BTreeMap::from([("ETH".to_string(), 185.87), ("DAI".to_string(), 1.004)])
}

/// The two preset bundles offered for a token inventory.
pub fn templates_for(tokens: &[Token]) -> Vec<Template> {
    let pick = |currencies: [&str; 2]| -> Vec<Token> {
        tokens
            .iter()
            .filter(|token| currencies.contains(&token.currency.as_str()))
            .cloned()
            .collect()
    };

    vec![
        Template {
            id: TemplateId(1),
            name: "Pure ETH Upside".to_string(),
            tokens: pick(["L-ETH", "S-DAI"]),
        },
        Template {
            id: TemplateId(2),
            name: "Pure ETH Downside".to_string(),
            tokens: pick(["L-DAI", "S-ETH"]),
        },
    ]
}

pub(crate) fn load_puzzle_tokens(
    delay: Duration,
) -> impl Fn(ReactionContext) -> Result<Option<Patch>> + Send + Sync + 'static {
    move |cx| {
        cx.defer(delay, |reactor| {
            let tokens = puzzle_tokens();
            reactor.update(Patch::new().with_serialized(state_keys::TOKENS, &tokens)?);
            reactor.dispatch(actions::CREATE_TEMPLATES, serde_json::to_value(&tokens)?)?;
            Ok(())
        })?;
        Ok(None)
    }
}

pub(crate) fn create_templates(cx: ReactionContext) -> Result<Option<Patch>> {
    let tokens: Vec<Token> = match cx.payload() {
        Value::Null => Vec::new(),
        _ => cx.payload_as()?,
    };
    let patch = Patch::new().with_serialized(state_keys::TEMPLATES, &templates_for(&tokens))?;
    Ok(Some(patch))
}

pub(crate) fn load_current_prices(
    delay: Duration,
) -> impl Fn(ReactionContext) -> Result<Option<Patch>> + Send + Sync + 'static {
    move |cx| {
        cx.defer(delay, |reactor| {
            let patch = Patch::new()
                .with(state_keys::PRICES_CURRENCY, PRICES_CURRENCY)
                .with_serialized(state_keys::PRICES, &current_prices())?;
            reactor.update(patch);
            Ok(())
        })?;
        Ok(None)
    }
}
