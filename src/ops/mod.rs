// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fixed operation algebra: free functions that consume `Variable`s, produce a result
//! `Variable`, and record a gradient closure. Split into one module per operation category,
//! mirroring how the reference engine organizes its own algebra traits.

pub mod analytic;
pub mod arith;
pub mod array;
pub mod compare;
pub mod matrix;
