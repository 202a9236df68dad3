// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use log::*;

/// Receives user facing progress and outcome messages.
pub trait Notifier: Send + Sync {
    /// Current step of a long running operation.
    fn status(&self, message: &str);

    fn info(&self, message: &str);

    fn success(&self, message: &str);

    fn error(&self, message: &str);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn status(&self, message: &str) {
        info!("{}", message);
    }

    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn success(&self, message: &str) {
        info!("✓ {}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }
}
