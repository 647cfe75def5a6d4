// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

use gradvar::prelude::*;

#[test]
fn one_argument_forward_fails_for_every_loss() -> Result<()> {
    let x = Variable::new(Tensor::scalar(1.0), false);
    assert!(MeanSquaredError::new().forward(&x).is_err());
    assert!(MeanAbsoluteError::new().forward(&x).is_err());
    assert!(BinaryCrossEntropy::new().forward(&x).is_err());
    Ok(())
}

#[test]
fn mse_backward_matches_twice_the_residual_over_n() -> Result<()> {
    let loss = MeanSquaredError::new();
    let x = Variable::new(Tensor::from_shape_vec(&[2], vec![3.0, 1.0])?, true);
    let t = Variable::new(Tensor::from_shape_vec(&[2], vec![1.0, 1.0])?, false);
    let out = loss.forward_with_targets(&x, &t)?;
    out.backward(false)?;
    // d/dx mean((x-t)^2) = 2*(x-t)/n
    let grad: Vec<f32> = x.grad()?.data().as_array().iter().cloned().collect();
    assert!((grad[0] - 2.0).abs() < 1e-5);
    assert!((grad[1] - 0.0).abs() < 1e-5);
    Ok(())
}

#[test]
fn binary_cross_entropy_standard_and_reference_formulas_diverge() -> Result<()> {
    let loss = BinaryCrossEntropy::new();
    let p = Variable::new(Tensor::from_shape_vec(&[2], vec![0.2, 0.8])?, false);
    let t = Variable::new(Tensor::from_shape_vec(&[2], vec![0.0, 1.0])?, false);

    let standard = *loss
        .forward_with_targets(&p, &t)?
        .data()
        .as_array()
        .iter()
        .next()
        .unwrap();
    let reference = *loss
        .reference_formula(&p, &t)?
        .data()
        .as_array()
        .iter()
        .next()
        .unwrap();

    assert!(standard > 0.0);
    assert!((standard - reference).abs() > 1e-3);
    Ok(())
}

#[test]
fn weighted_bce_zero_weight_gives_zero_loss() -> Result<()> {
    let loss = BinaryCrossEntropy::new();
    let p = Variable::new(Tensor::from_shape_vec(&[2], vec![0.1, 0.9])?, false);
    let t = Variable::new(Tensor::from_shape_vec(&[2], vec![1.0, 0.0])?, false);
    let weights = Variable::new(Tensor::zeros(&[2]), false);
    let out = loss.forward_weighted(&p, &t, &weights)?;
    let value = *out.data().as_array().iter().next().unwrap();
    assert_eq!(value, 0.0);
    Ok(())
}
