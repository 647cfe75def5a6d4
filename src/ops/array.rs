// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcasting helpers and reductions.
//!
//! `tile_as`/`sum_as` are an adjoint pair: each is exactly the other's backward rule. `flat` and
//! `reshape` both fall back to `input.shape()` on the way back, and `transpose`'s backward is
//! itself a transpose.

use crate::error::Result;
use crate::ops::arith::mul_const;
use crate::variable::Variable;

/// Replicate `v` so its shape becomes `reference`'s (per-axis integer-division factors, no
/// divisibility check). Backward: `sum_as(g, v.shape())`.
pub fn tile_as(v: &Variable, reference: &[usize]) -> Result<Variable> {
    let vshape = v.shape();
    let result = v.data().tile_as(reference)?;
    Ok(Variable::from_op(result, vec![v.clone()], {
        let v = v.clone();
        let vshape = vshape.clone();
        move |g| {
            let contrib = sum_as(g, &vshape)?;
            v.add_grad(contrib);
            Ok(())
        }
    }))
}

/// Reduce `v` along every axis whose size differs from `reference`'s. Backward:
/// `tile_as(g, v.shape())`.
pub fn sum_as(v: &Variable, reference: &[usize]) -> Result<Variable> {
    let vshape = v.shape();
    let result = v.data().sum_as(reference)?;
    Ok(Variable::from_op(result, vec![v.clone()], {
        let v = v.clone();
        let vshape = vshape.clone();
        move |g| {
            let contrib = tile_as(g, &vshape)?;
            v.add_grad(contrib);
            Ok(())
        }
    }))
}

/// Tile `v` by the given per-axis factors. Backward: `sum_as(g, v.shape())`.
pub fn tile(v: &Variable, repeats: &[usize]) -> Variable {
    let vshape = v.shape();
    let result = v.data().tile(repeats);
    Variable::from_op(result, vec![v.clone()], {
        let v = v.clone();
        let vshape = vshape.clone();
        move |g| {
            let contrib = sum_as(g, &vshape)?;
            v.add_grad(contrib);
            Ok(())
        }
    })
}

/// Reverse the axis order. Backward: `transpose(g)`.
pub fn transpose(v: &Variable) -> Variable {
    let result = v.data().transpose();
    Variable::from_op(result, vec![v.clone()], {
        let v = v.clone();
        move |g| {
            v.add_grad(transpose(g));
            Ok(())
        }
    })
}

/// Reshape into a single dimension. Backward: `reshape(g, v.shape())`.
pub fn flat(v: &Variable) -> Variable {
    let vshape = v.shape();
    let result = v.data().flatten();
    Variable::from_op(result, vec![v.clone()], {
        let v = v.clone();
        let vshape = vshape.clone();
        move |g| {
            let contrib = reshape(g, &vshape)?;
            v.add_grad(contrib);
            Ok(())
        }
    })
}

/// Reshape into `dims`. Backward: `reshape(g, v.shape())`.
pub fn reshape(v: &Variable, dims: &[usize]) -> Result<Variable> {
    let vshape = v.shape();
    let result = v.data().reshape(dims)?;
    Ok(Variable::from_op(result, vec![v.clone()], {
        let v = v.clone();
        let vshape = vshape.clone();
        move |g| {
            let contrib = reshape(g, &vshape)?;
            v.add_grad(contrib);
            Ok(())
        }
    }))
}

/// Sum along each listed axis in order, keeping it at size 1. Backward: `tile_as(g, v.shape())`.
pub fn sum(v: &Variable, axes: &[usize]) -> Variable {
    let vshape = v.shape();
    let result = v.data().sum(axes);
    Variable::from_op(result, vec![v.clone()], {
        let v = v.clone();
        let vshape = vshape.clone();
        move |g| {
            let contrib = tile_as(g, &vshape)?;
            v.add_grad(contrib);
            Ok(())
        }
    })
}

/// Mean along each listed axis in order. Backward: `tile_as(g, v.shape())` scaled by `1/count`,
/// where `count` is the product of the reduced axes' sizes. (This implementation scales by
/// `1/count`; a widely copied reference implementation this engine was checked against scales by
/// `count` instead, which is `count²` too large. See DESIGN.md.)
pub fn mean(v: &Variable, axes: &[usize]) -> Variable {
    let vshape = v.shape();
    let count: usize = axes.iter().map(|&ax| vshape[ax]).product::<usize>().max(1);
    let result = v.data().mean(axes);
    Variable::from_op(result, vec![v.clone()], {
        let v = v.clone();
        let vshape = vshape.clone();
        move |g| {
            let tiled = tile_as(g, &vshape)?;
            let scaled = mul_const(&tiled, 1.0 / (count as f32))?;
            v.add_grad(scaled);
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Tensor;

    #[test]
    fn sum_as_is_adjoint_of_tile_as() {
        let v = Variable::new(Tensor::from_shape_vec(&[2, 1], vec![1.0, 2.0]).unwrap(), true);
        let tiled = tile_as(&v, &[2, 3]).unwrap();
        let total = sum(&tiled, &[0, 1]);
        total.backward(false).unwrap();
        let grad = v.grad().unwrap().data();
        // each of the 2 rows is tiled 3x, so d(sum)/d(v[i]) = 3
        assert_eq!(grad.as_array().iter().cloned().collect::<Vec<_>>(), vec![3.0, 3.0]);
    }

    #[test]
    fn transpose_is_involutive_on_gradient() {
        let v = Variable::new(
            Tensor::from_shape_vec(&[2, 3], (1..=6).map(|x| x as f32).collect()).unwrap(),
            true,
        );
        let t = transpose(&transpose(&v));
        assert_eq!(t.data(), v.data());
        let s = sum(&t, &[0, 1]);
        s.backward(false).unwrap();
        let grad = v.grad().unwrap().data();
        assert!(grad.as_array().iter().all(|&x| x == 1.0));
    }

    #[test]
    fn mean_backward_scales_by_reciprocal_count() {
        let v = Variable::new(Tensor::from_shape_vec(&[4], vec![1.0, 2.0, 3.0, 4.0]).unwrap(), true);
        let m = mean(&v, &[0]);
        m.backward(false).unwrap();
        let grad = v.grad().unwrap().data();
        assert!(grad.as_array().iter().all(|&x| (x - 0.25).abs() < 1e-6));
    }
}
