// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Presale backend HTTP service.
//!
//! | Route                        | Description                           |
//! |------------------------------|---------------------------------------|
//! | `GET  /api/health`           | Health check                          |
//! | `POST /api/confirm-purchase` | Confirm a token purchase              |
//! | `GET  /api/config`           | Public presale configuration          |
//! | `GET  /api/quote`            | Price quote for a token amount        |
//! | `GET  /*`                    | Front-end files, `index.html` fallback |

mod handlers;
mod rejection;
pub mod types;

pub use crate::api::handlers::{validate_purchase, OWNER_NOT_CONFIGURED};
pub use crate::api::rejection::handle_rejection;

use crate::api::types::{ConfirmPurchaseRequest, QuoteQuery};
use crate::settings::Settings;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;
use triomphe::Arc;
use warp::filters::BoxedFilter;
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};

/// Maximum accepted request body.
pub const MAX_BODY_SIZE: u64 = 1024 * 64;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("invalid listen address {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Bind(#[from] warp::Error),
}

/// All presale routes, wrapped with error handling, CORS, the version header
/// and request logging.
pub fn routes(
    settings: Arc<Settings>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let static_dir = settings.network.static_dir.clone().map(PathBuf::from);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_headers(vec!["content-type", "authorization"]);

    // Rejections from the routes are answered inside the CORS layer so error
    // replies carry CORS headers. Forbidden preflights are answered outside it.
    api(settings)
        .or(static_files(static_dir))
        .recover(handle_rejection)
        .with(cors)
        .recover(handle_rejection)
        .with(warp::reply::with::header(
            "x-version",
            env!("CARGO_PKG_VERSION"),
        ))
        .with(warp::log("shibartum::api"))
}

fn api(settings: Arc<Settings>) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path!("api" / "health")
        .and(warp::get())
        .and_then(handlers::health);

    let confirm_purchase = warp::path!("api" / "confirm-purchase")
        .and(warp::post())
        .and(json_body())
        .and(with_settings(settings.clone()))
        .and_then(handlers::confirm_purchase);

    let config = warp::path!("api" / "config")
        .and(warp::get())
        .and(with_settings(settings.clone()))
        .and_then(handlers::config);

    let quote = warp::path!("api" / "quote")
        .and(warp::get())
        .and(warp::query::<QuoteQuery>())
        .and(with_settings(settings))
        .and_then(handlers::quote);

    health.or(confirm_purchase).or(config).or(quote)
}

/// Serves the built front-end. Unknown paths get `index.html` so client side
/// routing works. Paths under `/api` are never served from disk.
fn static_files(dir: Option<PathBuf>) -> BoxedFilter<(Box<dyn Reply>,)> {
    let Some(dir) = dir else {
        return warp::any()
            .and_then(|| async { Err::<Box<dyn Reply>, _>(warp::reject::not_found()) })
            .boxed();
    };

    let not_api = warp::path::full()
        .and_then(|path: FullPath| async move {
            if path.as_str() == "/api" || path.as_str().starts_with("/api/") {
                Err(warp::reject::not_found())
            } else {
                Ok(())
            }
        })
        .untuple_one();

    let index = dir.join("index.html");

    not_api
        .and(warp::get())
        .and(warp::fs::dir(dir).or(warp::fs::file(index)).unify())
        .map(|file: warp::fs::File| Box::new(file) as Box<dyn Reply>)
        .boxed()
}

fn with_settings(
    settings: Arc<Settings>,
) -> impl Filter<Extract = (Arc<Settings>,), Error = Infallible> + Clone {
    warp::any().map(move || settings.clone())
}

fn json_body() -> impl Filter<Extract = (ConfirmPurchaseRequest,), Error = Rejection> + Clone {
    // Reject huge payloads before parsing
    warp::body::content_length_limit(MAX_BODY_SIZE).and(warp::body::json())
}

/// Binds the service on the configured address. The returned future runs the
/// server until `shutdown` resolves.
pub fn bind(
    settings: Arc<Settings>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()> + Send), ServeError> {
    let addr_str = format!(
        "{}:{}",
        settings.network.listen_addr, settings.network.port
    );
    let addr: SocketAddr = addr_str
        .parse()
        .map_err(|_| ServeError::InvalidAddress(addr_str.clone()))?;

    Ok(warp::serve(routes(settings)).try_bind_with_graceful_shutdown(addr, shutdown)?)
}
