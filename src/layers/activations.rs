// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Elementwise activation layers. Each wraps the corresponding free function from
//! [`crate::ops`], except where the activation needs a mask or a learnable parameter.

use crate::error::Result;
use crate::module::{Module, ModuleState};
use crate::ops::analytic::{exp, sigmoid, tanh};
use crate::ops::arith::{add, add_const, constant_like, mul, mul_const};
use crate::ops::array::tile_as;
use crate::ops::compare::{ge, logical_not, max};
use crate::tensor::Tensor;
use crate::variable::Variable;

macro_rules! stateless_activation {
    ($name:ident, $doc:expr, |$x:ident| $body:expr) => {
        #[doc = $doc]
        #[derive(Default)]
        pub struct $name {
            state: ModuleState,
        }

        impl $name {
            pub fn new() -> Self {
                $name {
                    state: ModuleState::default(),
                }
            }
        }

        impl Module for $name {
            fn module_state(&self) -> &ModuleState {
                &self.state
            }

            fn module_state_mut(&mut self) -> &mut ModuleState {
                &mut self.state
            }

            fn forward(&self, $x: &Variable) -> Result<Variable> {
                $body
            }
        }
    };
}

stateless_activation!(Sigmoid, "`σ(x) = 1/(1+e⁻ˣ)`.", |x| Ok(sigmoid(x)));
stateless_activation!(Tanh, "`tanh(x)`.", |x| Ok(tanh(x)));
stateless_activation!(ReLU, "`max(x, 0)`.", |x| max(x, &constant_like(x, 0.0)));

/// `max(x, slope·x)`, a fixed (non-learnable) leak coefficient.
pub struct LeakyReLU {
    state: ModuleState,
    slope: f32,
}

impl LeakyReLU {
    pub fn new(slope: f32) -> Self {
        LeakyReLU {
            state: ModuleState::default(),
            slope,
        }
    }
}

impl Module for LeakyReLU {
    fn module_state(&self) -> &ModuleState {
        &self.state
    }

    fn module_state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    fn forward(&self, input: &Variable) -> Result<Variable> {
        let scaled = mul_const(input, self.slope)?;
        max(input, &scaled)
    }
}

/// `x·[x≥0] + x·[x<0]·tile_as(a, x)`, with `a` a learnable per-row coefficient of shape
/// `(size, 1)`, broadcast across the input's remaining axes.
pub struct PReLU {
    state: ModuleState,
}

impl PReLU {
    pub fn new(size: usize, init: f32) -> Self {
        let a = Variable::new(Tensor::full(&[size, 1], init), true);
        PReLU {
            state: ModuleState::new(vec![a]),
        }
    }

    /// Build directly from an existing coefficient vector.
    pub fn from_param(a: Variable) -> Self {
        PReLU {
            state: ModuleState::new(vec![a]),
        }
    }
}

impl Module for PReLU {
    fn module_state(&self) -> &ModuleState {
        &self.state
    }

    fn module_state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    fn forward(&self, input: &Variable) -> Result<Variable> {
        let a = &self.parameters()[0];
        let zero = constant_like(input, 0.0);
        let mask_pos = ge(input, &zero)?;
        let mask_neg = logical_not(&mask_pos);
        let pos_part = mul(input, &mask_pos)?;
        let a_tiled = tile_as(a, &input.shape())?;
        let neg_part = mul(&mul(input, &mask_neg)?, &a_tiled)?;
        add(&pos_part, &neg_part)
    }
}

/// `x·[x≥0] + α·(e^x − 1)·[x<0]`.
pub struct ELU {
    state: ModuleState,
    alpha: f32,
}

impl ELU {
    pub fn new(alpha: f32) -> Self {
        ELU {
            state: ModuleState::default(),
            alpha,
        }
    }
}

impl Module for ELU {
    fn module_state(&self) -> &ModuleState {
        &self.state
    }

    fn module_state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    fn forward(&self, input: &Variable) -> Result<Variable> {
        let zero = constant_like(input, 0.0);
        let mask_pos = ge(input, &zero)?;
        let mask_neg = logical_not(&mask_pos);
        let pos_part = mul(input, &mask_pos)?;
        let exp_minus_one = add_const(&exp(input), -1.0)?;
        let scaled = mul_const(&exp_minus_one, self.alpha)?;
        let neg_part = mul(&scaled, &mask_neg)?;
        add(&pos_part, &neg_part)
    }
}

/// `x·[x≥θ]`.
pub struct ThresholdReLU {
    state: ModuleState,
    theta: f32,
}

impl ThresholdReLU {
    pub fn new(theta: f32) -> Self {
        ThresholdReLU {
            state: ModuleState::default(),
            theta,
        }
    }
}

impl Module for ThresholdReLU {
    fn module_state(&self) -> &ModuleState {
        &self.state
    }

    fn module_state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    fn forward(&self, input: &Variable) -> Result<Variable> {
        let threshold = constant_like(input, self.theta);
        let mask = ge(input, &threshold)?;
        mul(input, &mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_zeroes_negatives() {
        let relu = ReLU::new();
        let x = Variable::new(Tensor::from_shape_vec(&[3], vec![-2.0, 0.0, 3.0]).unwrap(), false);
        let y = relu.forward(&x).unwrap();
        assert_eq!(y.data().as_array().iter().cloned().collect::<Vec<_>>(), vec![0.0, 0.0, 3.0]);
    }

    #[test]
    fn leaky_relu_scales_negatives() {
        let layer = LeakyReLU::new(0.1);
        let x = Variable::new(Tensor::from_shape_vec(&[2], vec![-10.0, 10.0]).unwrap(), false);
        let y = layer.forward(&x).unwrap();
        let values: Vec<f32> = y.data().as_array().iter().cloned().collect();
        assert!((values[0] - (-1.0)).abs() < 1e-6);
        assert!((values[1] - 10.0).abs() < 1e-6);
    }

    #[test]
    fn prelu_has_one_learnable_parameter() {
        let layer = PReLU::new(2, 0.25);
        assert_eq!(layer.parameters().len(), 1);
        assert_eq!(layer.parameters()[0].shape(), vec![2, 1]);
    }

    #[test]
    fn threshold_relu_keeps_only_values_at_or_above_theta() {
        let layer = ThresholdReLU::new(1.0);
        let x = Variable::new(Tensor::from_shape_vec(&[3], vec![0.5, 1.0, 2.0]).unwrap(), false);
        let y = layer.forward(&x).unwrap();
        assert_eq!(y.data().as_array().iter().cloned().collect::<Vec<_>>(), vec![0.0, 1.0, 2.0]);
    }
}
