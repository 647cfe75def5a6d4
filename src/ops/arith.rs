// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Arithmetic: negation, reciprocal, and the four binary operators.

use crate::error::Result;
use crate::tensor::Tensor;
use crate::variable::Variable;
use std::ops::Neg as StdNeg;

/// `-a`. Backward: push `-g` to `a`.
pub fn neg(a: &Variable) -> Variable {
    let result = a.data().neg();
    Variable::from_op(result, vec![a.clone()], {
        let a = a.clone();
        move |g| {
            a.add_grad(neg(g));
            Ok(())
        }
    })
}

impl StdNeg for &Variable {
    type Output = Variable;

    fn neg(self) -> Variable {
        neg(self)
    }
}

/// `1/a`. Backward: push `-g·(1/a)²` to `a`.
pub fn reciprocal(a: &Variable) -> Variable {
    let result = a.data().reciprocal();
    Variable::from_op(result, vec![a.clone()], {
        let a = a.clone();
        move |g| {
            let r = reciprocal(&a);
            let r2 = mul(&r, &r)?;
            let contrib = mul(g, &neg(&r2))?;
            a.add_grad(contrib);
            Ok(())
        }
    })
}

/// `a + b`. Backward: push `g` to `a`, `g` to `b`.
pub fn add(a: &Variable, b: &Variable) -> Result<Variable> {
    let result = a.data().add(&b.data())?;
    Ok(Variable::from_op(result, vec![a.clone(), b.clone()], {
        let a = a.clone();
        let b = b.clone();
        move |g| {
            a.add_grad(g.clone());
            b.add_grad(g.clone());
            Ok(())
        }
    }))
}

/// `a - b`. Backward: push `g` to `a`, `-g` to `b`.
pub fn sub(a: &Variable, b: &Variable) -> Result<Variable> {
    let result = a.data().sub(&b.data())?;
    Ok(Variable::from_op(result, vec![a.clone(), b.clone()], {
        let a = a.clone();
        let b = b.clone();
        move |g| {
            a.add_grad(g.clone());
            b.add_grad(neg(g));
            Ok(())
        }
    }))
}

/// `a · b` (elementwise). Backward: push `g·b` to `a`, `g·a` to `b`.
pub fn mul(a: &Variable, b: &Variable) -> Result<Variable> {
    let result = a.data().mul(&b.data())?;
    Ok(Variable::from_op(result, vec![a.clone(), b.clone()], {
        let a = a.clone();
        let b = b.clone();
        move |g| {
            a.add_grad(mul(g, &b)?);
            b.add_grad(mul(g, &a)?);
            Ok(())
        }
    }))
}

/// `a / b`. Backward: let `r = 1/b`; push `g·r` to `a`, `g·r·(-a)·r` to `b`.
pub fn div(a: &Variable, b: &Variable) -> Result<Variable> {
    let result = a.data().div(&b.data())?;
    Ok(Variable::from_op(result, vec![a.clone(), b.clone()], {
        let a = a.clone();
        let b = b.clone();
        move |g| {
            let r = reciprocal(&b);
            let g_r = mul(g, &r)?;
            a.add_grad(g_r.clone());
            let contrib = mul(&mul(&g_r, &neg(&a))?, &r)?;
            b.add_grad(contrib);
            Ok(())
        }
    }))
}

/// Build a non-differentiable constant `Variable` matching `reference`'s shape, filled with
/// `value`, for the scalar-`Variable` overloads described in the operation algebra.
pub fn constant_like(reference: &Variable, value: f32) -> Variable {
    Variable::new(Tensor::full(&reference.shape(), value), false)
}

/// `a + c` for a scalar constant `c`, built by reusing the `Variable`-`Variable` form.
pub fn add_const(a: &Variable, c: f32) -> Result<Variable> {
    add(a, &constant_like(a, c))
}

/// `a · c` for a scalar constant `c`, built by reusing the `Variable`-`Variable` form.
pub fn mul_const(a: &Variable, c: f32) -> Result<Variable> {
    mul(a, &constant_like(a, c))
}

/// `c - a` for a scalar constant `c`, built by reusing the `Variable`-`Variable` form.
pub fn const_sub(c: f32, a: &Variable) -> Result<Variable> {
    sub(&constant_like(a, c), a)
}
