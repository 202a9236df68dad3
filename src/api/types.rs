// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// Envelope of every backend response. `data` is always present, `null` on errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// String level checks only. Nothing here proves the payment exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ConfirmPurchaseRequest {
    /// Payment transaction signature.
    #[validate(custom = "validate_signature")]
    pub signature: String,

    /// Buyer wallet address.
    #[validate(custom = "validate_pubkey")]
    pub buyer: String,

    /// Number of tokens bought.
    #[validate(range(min = 1.0, message = "must be at least 1"))]
    pub amount: f64,
}

fn invalid(code: &'static str, reason: impl fmt::Display) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(reason.to_string()));
    err
}

fn validate_signature(value: &str) -> Result<(), ValidationError> {
    Signature::from_str(value)
        .map(|_| ())
        .map_err(|err| invalid("signature", err))
}

fn validate_pubkey(value: &str) -> Result<(), ValidationError> {
    Pubkey::from_str(value)
        .map(|_| ())
        .map_err(|err| invalid("pubkey", err))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseConfirmation {
    pub signature: String,
    pub buyer: String,
    pub amount: f64,
    pub token_price: f64,
    pub total_cost: f64,
}

/// Presale parameters the front-end needs to render prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicConfig {
    pub token_name: String,
    pub token_symbol: String,
    pub token_price_sol: f64,
    pub network: String,
    pub total_supply: u64,
    pub owner_public_key: String,
    pub current_stage: u8,
}

impl From<&Settings> for PublicConfig {
    fn from(settings: &Settings) -> Self {
        let presale = &settings.presale;

        Self {
            token_name: presale.token_name.clone(),
            token_symbol: presale.token_symbol.clone(),
            token_price_sol: presale.token_price_sol,
            network: presale.network_name.clone(),
            total_supply: presale.total_supply,
            owner_public_key: presale.owner_public_key.clone(),
            current_stage: presale.current_stage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteQuery {
    pub amount: f64,
    pub stage: Option<u8>,
}
