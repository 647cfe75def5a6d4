// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Elementwise transcendentals.

use crate::error::Result;
use crate::ops::arith::{const_sub, mul};
use crate::variable::Variable;

/// `exp(x)`. Backward: push `g·exp(x)`.
pub fn exp(a: &Variable) -> Variable {
    let result = a.data().exp();
    Variable::from_op(result, vec![a.clone()], {
        let a = a.clone();
        move |g| {
            let e = exp(&a);
            a.add_grad(mul(g, &e)?);
            Ok(())
        }
    })
}

/// `log(x)`. Backward: push `g/x`.
pub fn log(a: &Variable) -> Variable {
    let result = a.data().log();
    Variable::from_op(result, vec![a.clone()], {
        let a = a.clone();
        move |g| {
            let r = crate::ops::arith::reciprocal(&a);
            a.add_grad(mul(g, &r)?);
            Ok(())
        }
    })
}

/// `sin(x)`. Backward: push `g·cos(x)`.
pub fn sin(a: &Variable) -> Variable {
    let result = a.data().sin();
    Variable::from_op(result, vec![a.clone()], {
        let a = a.clone();
        move |g| {
            let c = cos(&a);
            a.add_grad(mul(g, &c)?);
            Ok(())
        }
    })
}

/// `cos(x)`. Backward: push `-g·sin(x)`.
pub fn cos(a: &Variable) -> Variable {
    let result = a.data().cos();
    Variable::from_op(result, vec![a.clone()], {
        let a = a.clone();
        move |g| {
            let s = sin(&a);
            let neg_g = crate::ops::arith::neg(g);
            a.add_grad(mul(&neg_g, &s)?);
            Ok(())
        }
    })
}

/// `tanh(x)`. Backward: push `g·(1 − tanh(x)²)`.
pub fn tanh(a: &Variable) -> Variable {
    let result = a.data().tanh();
    Variable::from_op(result, vec![a.clone()], {
        let a = a.clone();
        move |g| {
            let t = tanh(&a);
            let t2 = mul(&t, &t)?;
            let k = const_sub(1.0, &t2)?;
            a.add_grad(mul(g, &k)?);
            Ok(())
        }
    })
}

/// `sigmoid(x)`. Backward: push `g·σ(x)·(1 − σ(x))`.
pub fn sigmoid(a: &Variable) -> Variable {
    let result = a.data().sigmoid();
    Variable::from_op(result, vec![a.clone()], {
        let a = a.clone();
        move |g| {
            let s = sigmoid(&a);
            let one_minus_s = const_sub(1.0, &s)?;
            let k = mul(&s, &one_minus_s)?;
            a.add_grad(mul(g, &k)?);
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Tensor;

    #[test]
    fn exp_backward_matches_self() {
        let a = Variable::new(Tensor::scalar(1.0), true);
        let y = exp(&a);
        y.backward_with_seed(Tensor::scalar(1.0), false).unwrap();
        let grad = a.grad().unwrap().data();
        let expected = Tensor::scalar(1.0).exp();
        assert_eq!(grad, expected);
    }

    #[test]
    fn sigmoid_backward_formula() {
        let a = Variable::new(Tensor::scalar(0.0), true);
        let y = sigmoid(&a);
        y.backward_with_seed(Tensor::scalar(1.0), false).unwrap();
        let grad = a.grad().unwrap().data();
        // sigmoid(0) = 0.5, so grad = 0.5 * 0.5 = 0.25
        let value = *grad.as_array().iter().next().unwrap();
        assert!((value - 0.25).abs() < 1e-6);
    }
}
