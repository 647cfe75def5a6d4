// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # gradvar
//!
//! A small reverse-mode automatic differentiation engine, plus a minimal neural-network
//! module toolkit built on top of it.
//!
//! ## Design
//!
//! `Variable` is a node in a dynamic computation graph: building an expression out of
//! `Variable`s and free functions (`add`, `mul`, `matmul`, ...) grows the graph, and calling
//! `backward` on the result walks it in reverse to accumulate gradients on every node that
//! requested one.
//!
//! ```
//! # use gradvar::prelude::*;
//! # fn main() -> Result<()> {
//! let a = Variable::new(Tensor::scalar(1.0), true);
//! let b = Variable::new(Tensor::scalar(2.0), true);
//! let c = mul(&a, &b)?;
//! c.backward_with_seed(Tensor::scalar(1.0), false)?;
//! assert_eq!(a.grad()?.data(), Tensor::scalar(2.0));
//! # Ok(())
//! # }
//! ```
//!
//! Unlike a tape shared across many expressions, each `Variable` is reference-counted and owns
//! its own subgraph; there is no global graph object to reset between calls. Gradient
//! accumulators are cleared per-node with `zero_grad`, typically by an optimizer after a step.
//!
//! ## Modules
//!
//! [`layers`] and [`loss`] provide a handful of concrete building blocks (`Linear`, the
//! elementwise activations, `Dropout`, the loss functions) behind the shared [`module::Module`]
//! trait, and [`container::Sequential`] chains them together. [`optim::Sgd`] is enough to drive a
//! training loop end to end; richer optimizers are out of scope.

/// Error and result types.
#[macro_use]
pub mod error;

/// The concrete dense array type the engine and layers are built against.
pub mod tensor;

/// The differentiable value type and the dynamic computation graph it builds.
pub mod variable;

/// Free-function operations over `Variable`, organized by category.
pub mod ops;

/// The `Module` trait shared by layers, losses and containers.
pub mod module;

/// Concrete layers: affine transforms, elementwise activations, dropout.
pub mod layers;

/// Loss modules.
pub mod loss;

/// `Sequential`, for chaining modules together.
pub mod container;

/// A minimal fixed-learning-rate optimizer.
pub mod optim;

/// Convenient prelude for building and training models.
pub mod prelude {
    pub use crate::container::Sequential;
    pub use crate::error::{Error, Result};
    pub use crate::func_name;
    pub use crate::layers::{Dropout, LeakyReLU, Linear, PReLU, ReLU, Sigmoid, Tanh, ELU, ThresholdReLU};
    pub use crate::loss::{BinaryCrossEntropy, Loss, MeanAbsoluteError, MeanSquaredError, BCELoss, MAE, MSE};
    pub use crate::module::Module;
    pub use crate::ops::analytic::{cos, exp, log, sigmoid, sin, tanh};
    pub use crate::ops::arith::{add, div, mul, neg, reciprocal, sub};
    pub use crate::ops::array::{flat, mean, reshape, sum, sum_as, tile, tile_as, transpose};
    pub use crate::ops::compare::{abs, ge, gt, le, logical_not, lt, max, min};
    pub use crate::ops::matrix::{matmul, matmul_nt, matmul_tn};
    pub use crate::optim::Sgd;
    pub use crate::tensor::Tensor;
    pub use crate::variable::{input, no_grad, Variable};
}
