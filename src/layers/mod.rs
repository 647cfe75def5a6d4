// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concrete layers: affine transforms, elementwise activations, dropout.

mod activations;
mod dropout;
mod linear;

pub use activations::{ELU, LeakyReLU, PReLU, ReLU, Sigmoid, Tanh, ThresholdReLU};
pub use dropout::{Dropout, DropoutConfig};
pub use linear::{Linear, LinearConfig};
