// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A minimal fixed-learning-rate gradient descent step, just enough to drive a training loop
//! against the `Module`/`Loss` contract. Anything richer (momentum, weight decay, schedules) is
//! out of scope.

use crate::error::Result;
use crate::variable::Variable;

pub struct Sgd {
    learning_rate: f32,
}

impl Sgd {
    pub fn new(learning_rate: f32) -> Self {
        Sgd { learning_rate }
    }

    /// Apply one step to each parameter: `param -= lr * grad`, then clear the parameter's
    /// gradient accumulator so the next `backward` starts fresh.
    pub fn step(&self, params: &[Variable]) -> Result<()> {
        for p in params {
            let grad = p.grad()?.data();
            let delta = grad.scale(self.learning_rate);
            let updated = p.data().sub(&delta)?;
            p.set_data(updated);
            p.zero_grad();
        }
        Ok(())
    }
}
