// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The affine layer `y = W·x + b`.

use crate::error::{Error, Result};
use crate::func_name;
use crate::module::{Module, ModuleState};
use crate::ops::arith::add;
use crate::ops::array::tile_as;
use crate::ops::matrix::matmul;
use crate::tensor::Tensor;
use crate::variable::Variable;
use rand::thread_rng;

/// Construction knobs for [`Linear`], mirroring the positional arguments the reference
/// implementation takes.
#[derive(Debug, Clone, Copy)]
pub struct LinearConfig {
    pub bias: bool,
    /// Forwarded to the LeCun-Normal initializer's caller for parity with the reference
    /// constructor signature; this implementation's init variance depends only on `input_size`,
    /// so changing `spread` has no effect. See DESIGN.md.
    pub spread: f32,
}

impl Default for LinearConfig {
    fn default() -> Self {
        LinearConfig {
            bias: true,
            spread: 0.05,
        }
    }
}

impl LinearConfig {
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_spread(mut self, spread: f32) -> Self {
        self.spread = spread;
        self
    }
}

/// `y = W·x (+ b)`, with `W` of shape `(output_size, input_size)` and `b` of shape
/// `(output_size, 1)`, LeCun-Normal initialized.
pub struct Linear {
    state: ModuleState,
}

impl Linear {
    pub fn new(input_size: usize, output_size: usize) -> Self {
        Self::with_config(input_size, output_size, LinearConfig::default())
    }

    pub fn with_config(input_size: usize, output_size: usize, config: LinearConfig) -> Self {
        let _ = config.spread;
        let mut rng = thread_rng();
        let w = Variable::new(
            Tensor::lecun_normal(&[output_size, input_size], input_size, &mut rng),
            true,
        );
        let mut params = vec![w];
        if config.bias {
            let b = Variable::new(
                Tensor::lecun_normal(&[output_size, 1], input_size, &mut rng),
                true,
            );
            params.push(b);
        }
        Linear {
            state: ModuleState::new(params),
        }
    }

    /// Build directly from an existing weight matrix, with no bias.
    pub fn from_weights(w: Variable) -> Self {
        Linear {
            state: ModuleState::new(vec![w]),
        }
    }

    /// Build directly from an existing weight matrix and bias column. Fails if the bias shape
    /// isn't `(W.rows, 1)`.
    pub fn from_weights_and_bias(w: Variable, b: Variable) -> Result<Self> {
        let wshape = w.shape();
        let bshape = b.shape();
        if wshape.len() != 2 || bshape != [wshape[0], 1] {
            return Err(Error::shape_mismatch(func_name!(), &[&wshape, &bshape]));
        }
        Ok(Linear {
            state: ModuleState::new(vec![w, b]),
        })
    }
}

impl Module for Linear {
    fn module_state(&self) -> &ModuleState {
        &self.state
    }

    fn module_state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    fn forward(&self, input: &Variable) -> Result<Variable> {
        let params = self.parameters();
        let out = matmul(&params[0], input)?;
        if let Some(b) = params.get(1) {
            let b_tiled = tile_as(b, &out.shape())?;
            add(&out, &b_tiled)
        } else {
            Ok(out)
        }
    }
}
