// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Presale price stages. Each stage sells at a fixed price and grants a
//! percentage of bonus tokens on top of the purchased amount.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceStage {
    pub stage: u8,
    pub label: &'static str,

    /// Price of one token in SOL.
    pub price: f64,

    /// Bonus in percent of the purchased tokens.
    pub bonus: u8,
}

pub const PRICE_STAGES: [PriceStage; 5] = [
    PriceStage {
        stage: 1,
        label: "Early Bird",
        price: 0.000045,
        bonus: 20,
    },
    PriceStage {
        stage: 2,
        label: "Phase 1",
        price: 0.000055,
        bonus: 15,
    },
    PriceStage {
        stage: 3,
        label: "Phase 2",
        price: 0.000065,
        bonus: 10,
    },
    PriceStage {
        stage: 4,
        label: "Phase 3",
        price: 0.000075,
        bonus: 5,
    },
    PriceStage {
        stage: 5,
        label: "Final",
        price: 0.000085,
        bonus: 0,
    },
];

pub fn stage(stage: u8) -> Option<&'static PriceStage> {
    PRICE_STAGES.iter().find(|s| s.stage == stage)
}

/// Unknown stages fall back to the first one.
pub fn stage_or_first(stage_number: u8) -> &'static PriceStage {
    stage(stage_number).unwrap_or(&PRICE_STAGES[0])
}

/// Price in SOL of `amount` tokens.
#[inline]
pub fn total_cost(amount: f64, price: f64) -> f64 {
    amount * price
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStage {
    pub stage: u8,
    pub label: String,
    pub price: f64,

    /// Price increase over the current stage in percent, one decimal.
    pub price_increase: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub stage: u8,
    pub label: String,
    pub price: f64,
    pub tokens: f64,
    pub sol_cost: f64,
    pub bonus_tokens: f64,
    pub total_tokens: f64,
    pub next_stage: Option<NextStage>,
}

impl PriceStage {
    pub fn next(&self) -> Option<&'static PriceStage> {
        stage(self.stage.checked_add(1)?)
    }

    pub fn bonus_tokens(&self, tokens: f64) -> f64 {
        tokens * (f64::from(self.bonus) / 100.0)
    }

    /// Whole tokens `sol` buys at this stage, rounded down.
    pub fn tokens_for_sol(&self, sol: f64) -> u64 {
        (sol / self.price).floor() as u64
    }

    pub fn quote_tokens(&self, tokens: f64) -> Quote {
        let bonus_tokens = self.bonus_tokens(tokens);
        let next_stage = self.next().map(|next| NextStage {
            stage: next.stage,
            label: next.label.to_owned(),
            price: next.price,
            price_increase: ((next.price - self.price) / self.price * 1000.0).round() / 10.0,
        });

        Quote {
            stage: self.stage,
            label: self.label.to_owned(),
            price: self.price,
            tokens,
            sol_cost: total_cost(tokens, self.price),
            bonus_tokens,
            total_tokens: tokens + bonus_tokens,
            next_stage,
        }
    }
}
