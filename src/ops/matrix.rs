// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Matrix multiplication in its three variants. The `_tn`/`_nt` forms exist so a backend can
//! fuse the transpose into a single kernel call rather than materializing it; each variant's
//! backward rule is expressed in terms of the others rather than by building an explicit
//! transpose of the result.

use crate::error::Result;
use crate::variable::Variable;

/// `A · B`. Backward: `A` gets `matmul_nt(g, B)`; `B` gets `matmul_tn(A, g)`.
pub fn matmul(a: &Variable, b: &Variable) -> Result<Variable> {
    let result = a.data().matmul(&b.data())?;
    Ok(Variable::from_op(result, vec![a.clone(), b.clone()], {
        let a = a.clone();
        let b = b.clone();
        move |g| {
            a.add_grad(matmul_nt(g, &b)?);
            b.add_grad(matmul_tn(&a, g)?);
            Ok(())
        }
    }))
}

/// `Aᵀ · B`. Backward: `A` gets `matmul_nt(B, g)`; `B` gets `matmul(A, g)`.
pub fn matmul_tn(a: &Variable, b: &Variable) -> Result<Variable> {
    let result = a.data().matmul_tn(&b.data())?;
    Ok(Variable::from_op(result, vec![a.clone(), b.clone()], {
        let a = a.clone();
        let b = b.clone();
        move |g| {
            a.add_grad(matmul_nt(&b, g)?);
            b.add_grad(matmul(&a, g)?);
            Ok(())
        }
    }))
}

/// `A · Bᵀ`. Backward: `A` gets `matmul(g, B)`; `B` gets `matmul_tn(g, A)`.
pub fn matmul_nt(a: &Variable, b: &Variable) -> Result<Variable> {
    let result = a.data().matmul_nt(&b.data())?;
    Ok(Variable::from_op(result, vec![a.clone(), b.clone()], {
        let a = a.clone();
        let b = b.clone();
        move |g| {
            a.add_grad(matmul(g, &b)?);
            b.add_grad(matmul_tn(g, &a)?);
            Ok(())
        }
    }))
}
