// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

use gradvar::prelude::*;

#[test]
fn gradient_matches_finite_difference() -> Result<()> {
    // y = exp(x) * sin(x), checked against a centered finite difference at x=0.7.
    let eps = 1e-3;
    let f = |v: f32| v.exp() * v.sin();

    let x = Variable::new(Tensor::scalar(0.7), true);
    let y = mul(&exp(&x), &sin(&x))?;
    y.backward(false)?;
    let analytic = *x.grad()?.data().as_array().iter().next().unwrap();

    let numeric = (f(0.7 + eps) - f(0.7 - eps)) / (2.0 * eps);
    assert!((analytic - numeric).abs() < 1e-3, "{} vs {}", analytic, numeric);
    Ok(())
}

#[test]
fn repeated_backward_without_zero_grad_doubles_leaf_gradient() -> Result<()> {
    let x = Variable::new(Tensor::scalar(0.3), true);
    let y = sin(&x);
    y.backward(false)?;
    let first = *x.grad()?.data().as_array().iter().next().unwrap();
    y.backward(false)?;
    let second = *x.grad()?.data().as_array().iter().next().unwrap();
    assert!((second - 2.0 * first).abs() < 1e-6);
    Ok(())
}

#[test]
fn zero_grad_then_backward_reproduces_the_first_gradient() -> Result<()> {
    let x = Variable::new(Tensor::scalar(0.3), true);
    let y = sin(&x);
    y.backward(false)?;
    let first = x.grad()?.data();
    x.zero_grad();
    y.backward(false)?;
    let again = x.grad()?.data();
    assert_eq!(first, again);
    Ok(())
}

#[test]
fn constant_pruning_propagates_through_a_chain() -> Result<()> {
    let a = Variable::new(Tensor::scalar(1.0), false);
    let b = Variable::new(Tensor::scalar(2.0), false);
    let c = add(&a, &b)?;
    let d = mul(&c, &a)?;
    assert!(!c.calc_grad());
    assert!(!d.calc_grad());
    assert!(d.inputs().is_empty());
    Ok(())
}

#[test]
fn comparisons_never_require_gradients_even_with_differentiable_operands() -> Result<()> {
    let a = Variable::new(Tensor::scalar(1.0), true);
    let b = Variable::new(Tensor::scalar(2.0), true);
    assert!(!gt(&a, &b)?.calc_grad());
    assert!(!lt(&a, &b)?.calc_grad());
    assert!(!logical_not(&gt(&a, &b)?).calc_grad());
    Ok(())
}

#[test]
fn tile_as_and_sum_as_round_trip_on_divisible_shapes() -> Result<()> {
    let v = Variable::new(Tensor::from_shape_vec(&[2, 1], vec![3.0, 4.0])?, false);
    let tiled = tile_as(&v, &[2, 5])?;
    let back = sum_as(&tiled, &[2, 1])?;
    // each row was tiled 5x, so summing back multiplies by 5
    let values: Vec<f32> = back.data().as_array().iter().cloned().collect();
    assert_eq!(values, vec![15.0, 20.0]);
    Ok(())
}

#[test]
fn transpose_twice_is_identity_on_value_and_gradient() -> Result<()> {
    let v = Variable::new(Tensor::from_shape_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0])?, true);
    let round_tripped = transpose(&transpose(&v));
    assert_eq!(round_tripped.data(), v.data());
    sum(&round_tripped, &[0, 1]).backward(false)?;
    assert!(v.grad()?.data().as_array().iter().all(|&x| x == 1.0));
    Ok(())
}
