// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use lazy_static::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

lazy_static! {
    /// Set once a termination signal has been received.
    pub static ref EXIT_SIGNAL: Arc<AtomicBool> = Arc::new(false.into());
}

pub fn shutdown_requested() -> bool {
    EXIT_SIGNAL.load(Ordering::Relaxed)
}

pub fn request_shutdown() {
    EXIT_SIGNAL.store(true, Ordering::Relaxed);
}

/// Resolves once [`EXIT_SIGNAL`] is set.
pub async fn wait_for_exit_signal() {
    while !shutdown_requested() {
        sleep(Duration::from_millis(50)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exit_signal_wakes_waiters() {
        let waiter = tokio::spawn(wait_for_exit_signal());
        request_shutdown();

        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(shutdown_requested());
    }
}
