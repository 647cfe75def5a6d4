// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A concrete, `ndarray`-backed dense array type.
//!
//! The autodiff engine in this crate is written against this single concrete type rather than
//! against a generic array trait: the specification treats the array backend as an external
//! collaborator, and `Tensor` is the one this crate ships so the engine can run without a GPU or
//! FFI dependency.

use crate::error::{Error, Result};
use crate::func_name;
use ndarray::{Array, Array2, Array3, ArrayD, ArrayView2, Axis, IxDyn};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::{Normal, Uniform};
use serde::{Deserialize, Serialize};

/// A dense n-dimensional array of `f32`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tensor(ArrayD<f32>);

impl Tensor {
    pub fn shape(&self) -> Vec<usize> {
        self.0.shape().to_vec()
    }

    pub fn ndim(&self) -> usize {
        self.0.ndim()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wrap an existing `ndarray` array.
    pub fn from_array(array: ArrayD<f32>) -> Self {
        Tensor(array)
    }

    pub fn into_array(self) -> ArrayD<f32> {
        self.0
    }

    pub fn as_array(&self) -> &ArrayD<f32> {
        &self.0
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Tensor(ArrayD::zeros(IxDyn(shape)))
    }

    pub fn ones(shape: &[usize]) -> Self {
        Tensor(ArrayD::ones(IxDyn(shape)))
    }

    pub fn full(shape: &[usize], value: f32) -> Self {
        Tensor(ArrayD::from_elem(IxDyn(shape), value))
    }

    pub fn from_shape_vec(shape: &[usize], data: Vec<f32>) -> Result<Self> {
        Array::from_shape_vec(IxDyn(shape), data)
            .map(Tensor)
            .map_err(|_| Error::shape_mismatch(func_name!(), &[shape]))
    }

    /// A single-element tensor of shape `[1]`.
    pub fn scalar(value: f32) -> Self {
        Tensor(ArrayD::from_elem(IxDyn(&[1]), value))
    }

    pub fn uniform<R: Rng>(shape: &[usize], low: f32, high: f32, rng: &mut R) -> Self {
        Tensor(ArrayD::random_using(
            IxDyn(shape),
            Uniform::new(low, high),
            rng,
        ))
    }

    /// LeCun-Normal-style fill: `N(0, 1/fan_in)` per entry.
    pub fn lecun_normal<R: Rng>(shape: &[usize], fan_in: usize, rng: &mut R) -> Self {
        let std = (1.0 / (fan_in.max(1) as f32)).sqrt();
        Tensor(ArrayD::random_using(
            IxDyn(shape),
            Normal::new(0.0, std).expect("std must be finite and positive"),
            rng,
        ))
    }

    /// Force evaluation of any lazy expression tree. `Tensor` is always eagerly evaluated, so
    /// this is a no-op kept only to mirror the reference engine's API shape.
    pub fn eval(&self) -> &Self {
        self
    }

    fn check_same_shape(&self, other: &Self, name: &str) -> Result<()> {
        crate::error::check_equal_shapes(name, &[&self.shape(), &other.shape()])
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other, func_name!())?;
        Ok(Tensor(&self.0 + &other.0))
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other, func_name!())?;
        Ok(Tensor(&self.0 - &other.0))
    }

    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other, func_name!())?;
        Ok(Tensor(&self.0 * &other.0))
    }

    pub fn div(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other, func_name!())?;
        Ok(Tensor(&self.0 / &other.0))
    }

    pub fn neg(&self) -> Self {
        Tensor(-&self.0)
    }

    pub fn reciprocal(&self) -> Self {
        Tensor(self.0.mapv(|x| 1.0 / x))
    }

    pub fn scale(&self, lambda: f32) -> Self {
        Tensor(&self.0 * lambda)
    }

    pub fn add_scalar(&self, c: f32) -> Self {
        Tensor(&self.0 + c)
    }

    /// Elementwise `>`, producing a 0.0/1.0 mask.
    pub fn gt(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other, func_name!())?;
        Ok(Tensor(ndarray::Zip::from(&self.0).and(&other.0).map_collect(
            |a, b| if a > b { 1.0 } else { 0.0 },
        )))
    }

    pub fn lt(&self, other: &Self) -> Result<Self> {
        other.gt(self)
    }

    pub fn ge(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other, func_name!())?;
        Ok(Tensor(ndarray::Zip::from(&self.0).and(&other.0).map_collect(
            |a, b| if a >= b { 1.0 } else { 0.0 },
        )))
    }

    pub fn le(&self, other: &Self) -> Result<Self> {
        other.ge(self)
    }

    /// Logical negation of a 0.0/1.0 mask.
    pub fn not(&self) -> Self {
        Tensor(self.0.mapv(|x| 1.0 - x))
    }

    pub fn max(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other, func_name!())?;
        Ok(Tensor(
            ndarray::Zip::from(&self.0)
                .and(&other.0)
                .map_collect(|a, b| a.max(*b)),
        ))
    }

    pub fn min(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other, func_name!())?;
        Ok(Tensor(
            ndarray::Zip::from(&self.0)
                .and(&other.0)
                .map_collect(|a, b| a.min(*b)),
        ))
    }

    pub fn abs(&self) -> Self {
        Tensor(self.0.mapv(f32::abs))
    }

    /// Maps nonnegative entries to `+1`, negative entries to `-1`.
    pub fn sign(&self) -> Self {
        Tensor(self.0.mapv(|x| 1.0 - 2.0 * (x.is_sign_negative() as i32 as f32)))
    }

    pub fn exp(&self) -> Self {
        Tensor(self.0.mapv(f32::exp))
    }

    pub fn log(&self) -> Self {
        Tensor(self.0.mapv(f32::ln))
    }

    pub fn sin(&self) -> Self {
        Tensor(self.0.mapv(f32::sin))
    }

    pub fn cos(&self) -> Self {
        Tensor(self.0.mapv(f32::cos))
    }

    pub fn tanh(&self) -> Self {
        Tensor(self.0.mapv(f32::tanh))
    }

    pub fn sigmoid(&self) -> Self {
        Tensor(self.0.mapv(|x| 1.0 / (1.0 + (-x).exp())))
    }

    /// Reduce along the given axes, keeping each reduced axis at size 1.
    pub fn sum(&self, axes: &[usize]) -> Self {
        let mut result = self.0.clone();
        for &axis in axes {
            let reduced = result.sum_axis(Axis(axis));
            result = reduced.insert_axis(Axis(axis));
        }
        Tensor(result)
    }

    pub fn mean(&self, axes: &[usize]) -> Self {
        let count: usize = axes.iter().map(|&ax| self.shape()[ax]).product();
        self.sum(axes).scale(1.0 / (count.max(1) as f32))
    }

    /// Reduce `self` along every axis whose size differs from `reference`'s.
    pub fn sum_as(&self, reference: &[usize]) -> Result<Self> {
        if self.ndim() != reference.len() {
            return Err(Error::shape_mismatch(
                func_name!(),
                &[&self.shape(), reference],
            ));
        }
        let axes: Vec<usize> = self
            .shape()
            .iter()
            .zip(reference.iter())
            .enumerate()
            .filter(|(_, (&s, &r))| s != r)
            .map(|(i, _)| i)
            .collect();
        Ok(self.sum(&axes))
    }

    /// Tile `self` so that its shape becomes `reference`, by per-axis integer-division factors.
    /// Does not check that `reference`'s sizes are divisible by `self`'s.
    pub fn tile_as(&self, reference: &[usize]) -> Result<Self> {
        if self.ndim() != reference.len() {
            return Err(Error::shape_mismatch(
                func_name!(),
                &[&self.shape(), reference],
            ));
        }
        let shape = self.shape();
        let mut factors = Vec::with_capacity(shape.len());
        for (&s, &r) in shape.iter().zip(reference.iter()) {
            if s != 0 && r % s != 0 {
                log::warn!(
                    "tile_as: target axis size {} is not a multiple of source axis size {}",
                    r,
                    s
                );
            }
            factors.push(if s == 0 { 0 } else { r / s });
        }
        Ok(self.tile(&factors))
    }

    pub fn tile(&self, repeats: &[usize]) -> Self {
        let mut result = self.0.clone();
        for (axis, &rep) in repeats.iter().enumerate() {
            if rep == 1 {
                continue;
            }
            let pieces: Vec<_> = std::iter::repeat(result.view()).take(rep).collect();
            result = ndarray::concatenate(Axis(axis), &pieces).expect("tile: concat failed");
        }
        Tensor(result)
    }

    pub fn flatten(&self) -> Self {
        let n = self.len();
        Tensor(self.0.clone().into_shape(IxDyn(&[n])).expect("flatten cannot fail"))
    }

    pub fn reshape(&self, dims: &[usize]) -> Result<Self> {
        self.0
            .clone()
            .into_shape(IxDyn(dims))
            .map(Tensor)
            .map_err(|_| Error::shape_mismatch(func_name!(), &[&self.shape(), dims]))
    }

    pub fn transpose(&self) -> Self {
        Tensor(self.0.clone().reversed_axes())
    }

    /// Split a shape of rank 2-4 into its leading matrix dims and its trailing batch dims.
    fn matrix_and_batch_dims(shape: &[usize], name: &str) -> Result<(usize, usize, &[usize])> {
        if shape.len() < 2 || shape.len() > 4 {
            return Err(Error::shape_mismatch(name, &[shape]));
        }
        Ok((shape[0], shape[1], &shape[2..]))
    }

    /// Apply a 2-D matrix operation over the leading two axes of `self` and `other`, treating any
    /// further axes (up to rank 4 total) as independent batch dimensions iterated one slice at a
    /// time. Both operands must carry the same batch shape.
    fn batched_matmul(
        &self,
        other: &Self,
        name: &str,
        op2d: impl Fn(ArrayView2<f32>, ArrayView2<f32>) -> Array2<f32>,
    ) -> Result<Self> {
        let a_shape = self.shape();
        let b_shape = other.shape();
        let (a_rows, a_cols, a_batch) = Self::matrix_and_batch_dims(&a_shape, name)?;
        let (b_rows, b_cols, b_batch) = Self::matrix_and_batch_dims(&b_shape, name)?;
        if a_batch != b_batch {
            return Err(Error::shape_mismatch(name, &[&a_shape, &b_shape]));
        }

        if a_batch.is_empty() {
            let a2 = self
                .0
                .view()
                .into_dimensionality::<ndarray::Ix2>()
                .map_err(|_| Error::shape_mismatch(name, &[&a_shape]))?;
            let b2 = other
                .0
                .view()
                .into_dimensionality::<ndarray::Ix2>()
                .map_err(|_| Error::shape_mismatch(name, &[&b_shape]))?;
            return Ok(Tensor(op2d(a2, b2).into_dyn()));
        }

        let batch_size: usize = a_batch.iter().product();
        let a3 = self
            .0
            .clone()
            .into_shape(IxDyn(&[a_rows, a_cols, batch_size]))
            .map_err(|_| Error::shape_mismatch(name, &[&a_shape]))?;
        let b3 = other
            .0
            .clone()
            .into_shape(IxDyn(&[b_rows, b_cols, batch_size]))
            .map_err(|_| Error::shape_mismatch(name, &[&b_shape]))?;

        let mut out: Option<Array3<f32>> = None;
        for i in 0..batch_size {
            let a_slice = a3
                .index_axis(Axis(2), i)
                .into_dimensionality::<ndarray::Ix2>()
                .map_err(|_| Error::shape_mismatch(name, &[&a_shape]))?;
            let b_slice = b3
                .index_axis(Axis(2), i)
                .into_dimensionality::<ndarray::Ix2>()
                .map_err(|_| Error::shape_mismatch(name, &[&b_shape]))?;
            let r = op2d(a_slice, b_slice);
            let slot = out.get_or_insert_with(|| {
                Array3::zeros((r.shape()[0], r.shape()[1], batch_size))
            });
            slot.index_axis_mut(Axis(2), i).assign(&r);
        }
        let out = out.unwrap_or_else(|| Array3::zeros((0, 0, batch_size)));
        let mut final_shape = vec![out.shape()[0], out.shape()[1]];
        final_shape.extend_from_slice(a_batch);
        Tensor(out.into_dyn())
            .reshape(&final_shape)
    }

    /// `A . B`, batched over any axes beyond the leading two.
    pub fn matmul(&self, other: &Self) -> Result<Self> {
        let a_shape = self.shape();
        let b_shape = other.shape();
        if a_shape.len() < 2 || b_shape.len() < 2 || a_shape[1] != b_shape[0] {
            return Err(Error::shape_mismatch(func_name!(), &[&a_shape, &b_shape]));
        }
        self.batched_matmul(other, func_name!(), |a, b| a.dot(&b))
    }

    /// `Aᵀ . B`, batched over any axes beyond the leading two.
    pub fn matmul_tn(&self, other: &Self) -> Result<Self> {
        let a_shape = self.shape();
        let b_shape = other.shape();
        if a_shape.len() < 2 || b_shape.len() < 2 || a_shape[0] != b_shape[0] {
            return Err(Error::shape_mismatch(func_name!(), &[&a_shape, &b_shape]));
        }
        self.batched_matmul(other, func_name!(), |a, b| a.t().dot(&b))
    }

    /// `A . Bᵀ`, batched over any axes beyond the leading two.
    pub fn matmul_nt(&self, other: &Self) -> Result<Self> {
        let a_shape = self.shape();
        let b_shape = other.shape();
        if a_shape.len() < 2 || b_shape.len() < 2 || a_shape[1] != b_shape[1] {
            return Err(Error::shape_mismatch(func_name!(), &[&a_shape, &b_shape]));
        }
        self.batched_matmul(other, func_name!(), |a, b| a.dot(&b.t()))
    }

    /// Slice a single index out of the given axis, used by training harnesses to iterate a
    /// dataset column-wise. Not used by the engine itself.
    pub fn slice_axis(&self, axis: usize, index: usize) -> Self {
        Tensor(
            self.0
                .index_axis(Axis(axis), index)
                .to_owned()
                .insert_axis(Axis(axis)),
        )
    }
}
