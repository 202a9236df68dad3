// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::api::types::*;
use crate::pricing::{self, total_cost};
use crate::settings::Settings;
use log::*;
use serde::Serialize;
use std::convert::Infallible;
use triomphe::Arc;
use validator::{Validate, ValidationErrors};
use warp::http::StatusCode;
use warp::reply::{self, Json, WithStatus};

pub const OWNER_NOT_CONFIGURED: &str = "OWNER_PUBLIC_KEY not configured on server";

fn respond<T: Serialize>(response: &ApiResponse<T>, status: StatusCode) -> WithStatus<Json> {
    reply::with_status(reply::json(response), status)
}

pub(crate) fn error_reply(message: impl Into<String>, status: StatusCode) -> WithStatus<Json> {
    respond(&ApiResponse::<()>::error(message), status)
}

pub async fn health() -> Result<WithStatus<Json>, Infallible> {
    Ok(respond(
        &ApiResponse::<()>::ok("Backend is running", None),
        StatusCode::OK,
    ))
}

pub async fn confirm_purchase(
    request: ConfirmPurchaseRequest,
    settings: Arc<Settings>,
) -> Result<WithStatus<Json>, Infallible> {
    info!("Received purchase request: {:?}", request);
    let presale = &settings.presale;

    if !presale.owner_key_configured() {
        error!("Rejecting purchase confirmation: {}", OWNER_NOT_CONFIGURED);
        return Ok(error_reply(
            OWNER_NOT_CONFIGURED,
            StatusCode::INTERNAL_SERVER_ERROR,
        ));
    }

    if let Err(err) = validate_purchase(&request) {
        return Ok(error_reply(
            format!("Validation error: {err}"),
            StatusCode::BAD_REQUEST,
        ));
    }

    // The payment is not looked up on chain, the request is taken at its word
    let confirmation = PurchaseConfirmation {
        total_cost: total_cost(request.amount, presale.token_price_sol),
        token_price: presale.token_price_sol,
        amount: request.amount,
        signature: request.signature,
        buyer: request.buyer,
    };

    Ok(respond(
        &ApiResponse::ok(
            format!(
                "Mock: Purchase confirmed for {} {} tokens",
                confirmation.amount, presale.token_symbol
            ),
            Some(confirmation),
        ),
        StatusCode::OK,
    ))
}

pub async fn config(settings: Arc<Settings>) -> Result<WithStatus<Json>, Infallible> {
    Ok(respond(
        &ApiResponse::ok("Presale configuration", Some(PublicConfig::from(&*settings))),
        StatusCode::OK,
    ))
}

pub async fn quote(
    query: QuoteQuery,
    settings: Arc<Settings>,
) -> Result<WithStatus<Json>, Infallible> {
    if !query.amount.is_finite() || query.amount < 0.0 {
        return Ok(error_reply(
            "Validation error: amount must be a non-negative number",
            StatusCode::BAD_REQUEST,
        ));
    }

    let stage = match query.stage {
        Some(number) => match pricing::stage(number) {
            Some(stage) => stage,
            None => {
                return Ok(error_reply(
                    format!("Unknown presale stage: {number}"),
                    StatusCode::BAD_REQUEST,
                ))
            }
        },
        None => pricing::stage_or_first(settings.presale.current_stage),
    };

    Ok(respond(
        &ApiResponse::ok(stage.label, Some(stage.quote_tokens(query.amount))),
        StatusCode::OK,
    ))
}

/// Checks a confirmation request, rendering failures as `field: reason`
/// pairs sorted by field.
pub fn validate_purchase(request: &ConfirmPurchaseRequest) -> Result<(), String> {
    request.validate().map_err(|errors| describe(&errors))
}

fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let reasons: Vec<String> = errors
                .iter()
                .map(|err| match &err.message {
                    Some(message) => message.to_string(),
                    None => err.code.to_string(),
                })
                .collect();
            format!("{}: {}", field, reasons.join(", "))
        })
        .collect();

    fields.sort();
    fields.join("; ")
}
