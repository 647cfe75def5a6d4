// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Comparisons, `max`/`min`, and `abs`. Comparisons and logical negation always produce
//! non-differentiable `Variable`s, regardless of whether their inputs require gradients.

use crate::error::Result;
use crate::ops::arith::mul;
use crate::variable::Variable;

pub fn gt(a: &Variable, b: &Variable) -> Result<Variable> {
    Ok(Variable::new(a.data().gt(&b.data())?, false))
}

pub fn lt(a: &Variable, b: &Variable) -> Result<Variable> {
    Ok(Variable::new(a.data().lt(&b.data())?, false))
}

pub fn ge(a: &Variable, b: &Variable) -> Result<Variable> {
    Ok(Variable::new(a.data().ge(&b.data())?, false))
}

pub fn le(a: &Variable, b: &Variable) -> Result<Variable> {
    Ok(Variable::new(a.data().le(&b.data())?, false))
}

/// Logical negation of a comparison mask.
pub fn logical_not(mask: &Variable) -> Variable {
    Variable::new(mask.data().not(), false)
}

/// `max(a, b)`. The comparison mask `m = (a > b)` is recorded as a third, non-differentiable
/// input so the backward closure can retrieve it positionally. Backward: push `m·g` to `a`,
/// `(!m)·g` to `b`.
pub fn max(a: &Variable, b: &Variable) -> Result<Variable> {
    let mask = Variable::new(a.data().gt(&b.data())?, false);
    let result = a.data().max(&b.data())?;
    Ok(Variable::from_op(
        result,
        vec![a.clone(), b.clone(), mask.clone()],
        {
            let a = a.clone();
            let b = b.clone();
            let mask = mask.clone();
            move |g| {
                a.add_grad(mul(g, &mask)?);
                b.add_grad(mul(g, &logical_not(&mask))?);
                Ok(())
            }
        },
    ))
}

/// `min(a, b)`. Mask `m = (a < b)`. Backward: push `m·g` to `a`, `(!m)·g` to `b`.
pub fn min(a: &Variable, b: &Variable) -> Result<Variable> {
    let mask = Variable::new(a.data().lt(&b.data())?, false);
    let result = a.data().min(&b.data())?;
    Ok(Variable::from_op(
        result,
        vec![a.clone(), b.clone(), mask.clone()],
        {
            let a = a.clone();
            let b = b.clone();
            let mask = mask.clone();
            move |g| {
                a.add_grad(mul(g, &mask)?);
                b.add_grad(mul(g, &logical_not(&mask))?);
                Ok(())
            }
        },
    ))
}

/// `abs(x)`. Backward: push `sign(x)·g`, where `sign` maps nonneg → `+1`, neg → `-1`.
pub fn abs(a: &Variable) -> Variable {
    let result = a.data().abs();
    Variable::from_op(result, vec![a.clone()], {
        let a = a.clone();
        move |g| {
            let sign = Variable::new(a.data().sign(), false);
            a.add_grad(mul(g, &sign)?);
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Tensor;

    #[test]
    fn comparisons_are_never_differentiable() {
        let a = Variable::new(Tensor::scalar(1.0), true);
        let b = Variable::new(Tensor::scalar(2.0), true);
        let m = gt(&a, &b).unwrap();
        assert!(!m.calc_grad());
        assert!(m.inputs().is_empty());
    }

    #[test]
    fn max_routes_gradient_through_winner() {
        let a = Variable::new(Tensor::from_shape_vec(&[3], vec![-1.0, 0.5, 2.0]).unwrap(), true);
        let zero = Variable::new(Tensor::zeros(&[3]), false);
        let y = max(&a, &zero).unwrap();
        y.backward_with_seed(Tensor::ones(&[3]), false).unwrap();
        let grad = a.grad().unwrap().data();
        assert_eq!(
            grad.as_array().iter().cloned().collect::<Vec<_>>(),
            vec![0.0, 1.0, 1.0]
        );
    }

    #[test]
    fn abs_backward_is_sign_times_grad() {
        let a = Variable::new(Tensor::from_shape_vec(&[2], vec![-2.0, 3.0]).unwrap(), true);
        let y = abs(&a);
        y.backward_with_seed(Tensor::ones(&[2]), false).unwrap();
        let grad = a.grad().unwrap().data();
        assert_eq!(
            grad.as_array().iter().cloned().collect::<Vec<_>>(),
            vec![-1.0, 1.0]
        );
    }
}
