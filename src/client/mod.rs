// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Buyer side of the presale: the purchase flow and the services it talks to.

mod backend;
mod history;
mod notify;
mod purchase;

#[cfg(test)]
pub(crate) mod test_utils;

pub use crate::client::backend::*;
pub use crate::client::history::*;
pub use crate::client::notify::*;
pub use crate::client::purchase::*;
