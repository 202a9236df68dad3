// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! # Shibartum
//! Presale backend and purchase client for the Shibartum (`SBT`) token.
//!
//! ## Components
//! * **Backend** ([`api`]): a `warp` service with a health check, a purchase
//!   confirmation endpoint, the public presale configuration, price quotes
//!   and the built front-end.
//! * **Purchase client** ([`client`]): pays the presale owner in native SOL
//!   from the buyer's wallet, waits for confirmation, asks the backend to
//!   confirm the purchase and keeps a local history of attempts.
//! * **Chain access** ([`rpc`], [`wallet`]): thin adapters over
//!   `solana-client` and `solana-sdk` keypairs, so the flow can run against
//!   fakes in tests.
//!
//! The confirmation endpoint does not verify payments on chain. Confirmations
//! are informational only.

pub mod api;
pub mod client;
pub mod global;
pub mod pricing;
pub mod rpc;
pub mod settings;
pub mod wallet;
