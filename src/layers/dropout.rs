// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dropout: zero out a random subset of entries during training, pass through unchanged during
//! evaluation.

use crate::error::Result;
use crate::module::{Module, ModuleState};
use crate::ops::arith::mul;
use crate::tensor::Tensor;
use crate::variable::Variable;
use rand::thread_rng;

#[derive(Debug, Clone, Copy)]
pub struct DropoutConfig {
    pub rate: f32,
}

impl Default for DropoutConfig {
    fn default() -> Self {
        DropoutConfig { rate: 0.5 }
    }
}

impl DropoutConfig {
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }
}

/// Zeroes each entry independently with probability `rate` while training. No inverse scaling is
/// applied to the surviving entries at train time, and `forward` is the identity in evaluation
/// mode; this matches the reference implementation this engine was checked against, which is not
/// scaled either. See DESIGN.md.
pub struct Dropout {
    state: ModuleState,
    rate: f32,
}

impl Dropout {
    pub fn new(rate: f32) -> Self {
        Dropout {
            state: ModuleState::default(),
            rate,
        }
    }

    pub fn with_config(config: DropoutConfig) -> Self {
        Self::new(config.rate)
    }
}

impl Module for Dropout {
    fn module_state(&self) -> &ModuleState {
        &self.state
    }

    fn module_state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    fn forward(&self, input: &Variable) -> Result<Variable> {
        if !self.is_training() {
            return Ok(input.clone());
        }
        let mut rng = thread_rng();
        let draws = Tensor::uniform(&input.shape(), 0.0, 1.0, &mut rng);
        let threshold = Tensor::full(&input.shape(), self.rate);
        let keep_mask = draws.gt(&threshold)?;
        let mask = Variable::new(keep_mask, false);
        mul(input, &mask)
    }
}
