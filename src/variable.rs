// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The differentiable value type and the dynamic computation graph it builds.

use crate::error::{Error, Result};
use crate::func_name;
use crate::tensor::Tensor;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// A gradient contribution closure: given the upstream gradient accumulated on the node it is
/// attached to, deposits contributions into each of that node's differentiable inputs via
/// `add_grad`. State other than the inputs list itself is captured by the closure environment,
/// never read from anywhere else.
pub(crate) type GradFn = dyn Fn(&Variable) -> Result<()>;

struct Record {
    data: Tensor,
    calc_grad: bool,
    inputs: Vec<Variable>,
    grad_fn: Option<Rc<GradFn>>,
    grads: Vec<Variable>,
}

/// A node in the autodiff graph.
///
/// `Variable` is a handle to a shared, reference-counted record. Cloning a `Variable` is cheap
/// and produces another handle to the *same* record: mutating one handle (accumulating a
/// gradient, flipping `calc_grad`) is visible through every other handle. Identity for
/// deduplication purposes is the address of the underlying record, not structural equality of
/// its contents.
#[derive(Clone)]
pub struct Variable(Rc<RefCell<Record>>);

impl Variable {
    /// A leaf variable built directly from an array, with an explicit `calc_grad` flag.
    pub fn new(data: Tensor, calc_grad: bool) -> Self {
        log::trace!("new leaf variable, calc_grad={}", calc_grad);
        Variable(Rc::new(RefCell::new(Record {
            data,
            calc_grad,
            inputs: Vec::new(),
            grad_fn: None,
            grads: Vec::new(),
        })))
    }

    /// Build a derived variable from a forward result, its ordered inputs, and a gradient
    /// closure. If none of `inputs` requires a gradient, the result is pruned down to a plain
    /// constant: no inputs, no closure, `calc_grad = false`.
    pub fn from_op(
        data: Tensor,
        inputs: Vec<Variable>,
        grad_fn: impl Fn(&Variable) -> Result<()> + 'static,
    ) -> Self {
        let calc_grad = inputs.iter().any(|v| v.calc_grad());
        if !calc_grad {
            return Variable::new(data, false);
        }
        log::trace!("new derived variable, {} inputs", inputs.len());
        Variable(Rc::new(RefCell::new(Record {
            data,
            calc_grad: true,
            inputs,
            grad_fn: Some(Rc::new(grad_fn)),
            grads: Vec::new(),
        })))
    }

    /// Opaque identity of the underlying record, used only for DAG deduplication.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn data(&self) -> Tensor {
        self.0.borrow().data.clone()
    }

    /// Overwrite the array payload in place, leaving the graph/grad bookkeeping untouched. Used
    /// by optimizer steps to apply an update to a leaf parameter without rebuilding it.
    pub fn set_data(&self, data: Tensor) {
        self.0.borrow_mut().data = data;
    }

    pub fn shape(&self) -> Vec<usize> {
        self.0.borrow().data.shape()
    }

    pub fn calc_grad(&self) -> bool {
        self.0.borrow().calc_grad
    }

    pub fn inputs(&self) -> Vec<Variable> {
        self.0.borrow().inputs.clone()
    }

    /// Append `g` to the gradient accumulator, unless gradient calculation is disabled on this
    /// node, in which case this is a no-op.
    pub fn add_grad(&self, g: Variable) {
        let mut rec = self.0.borrow_mut();
        if rec.calc_grad {
            rec.grads.push(g);
        }
    }

    /// Clear the accumulator without touching the graph.
    pub fn zero_grad(&self) {
        self.0.borrow_mut().grads.clear();
    }

    /// Enable or disable gradient tracking. Disabling forcibly detaches the node from its
    /// graph: `grad_fn`, `inputs` and any pending `grads` are cleared.
    pub fn set_calc_grad(&self, flag: bool) {
        let mut rec = self.0.borrow_mut();
        rec.calc_grad = flag;
        if !flag {
            rec.grad_fn = None;
            rec.inputs.clear();
            rec.grads.clear();
        }
    }

    /// The single accumulated gradient, itself a `Variable` (differentiable iff
    /// `retain_grad_graph` was requested on the `backward` call that produced it).
    pub fn grad(&self) -> Result<Variable> {
        let rec = self.0.borrow();
        if !rec.calc_grad {
            return Err(Error::gradient_disabled(func_name!()));
        }
        rec.grads
            .first()
            .cloned()
            .ok_or_else(|| Error::gradient_not_available(func_name!()))
    }

    /// Sum pending gradient contributions into a single one, then set its own `calc_grad` to
    /// `retain` (this is what lets higher-order graphs survive past this point, or not).
    fn eval_grad(&self, retain: bool) -> Result<()> {
        let grads = self.0.borrow().grads.clone();
        if grads.is_empty() {
            return Ok(());
        }
        let summed = if grads.len() == 1 {
            grads.into_iter().next().unwrap()
        } else {
            let mut iter = grads.into_iter();
            let mut acc = iter.next().unwrap();
            for g in iter {
                acc = crate::ops::arith::add(&acc, &g)?;
            }
            acc.data().eval();
            acc
        };
        summed.set_calc_grad(retain);
        self.0.borrow_mut().grads = vec![summed];
        Ok(())
    }

    /// `eval_grad` followed by invoking `grad_fn` (if any) with the single accumulated gradient.
    ///
    /// A node with a `grad_fn` has already forwarded its accumulated gradient to its inputs once
    /// this returns, so its own accumulator is cleared: keeping it around would double-count on a
    /// later, separate `backward` call. Leaves (no `grad_fn`) keep theirs, since that is where
    /// `grad()` reads the final accumulated value from.
    fn calc_grad_inputs(&self, retain: bool) -> Result<()> {
        self.eval_grad(retain)?;
        let (grad_fn, grad0) = {
            let rec = self.0.borrow();
            match rec.grads.first() {
                None => return Ok(()),
                Some(g) => (rec.grad_fn.clone(), g.clone()),
            }
        };
        if let Some(f) = grad_fn {
            f(&grad0)?;
            self.zero_grad();
        }
        Ok(())
    }

    /// Depth-first, post-order traversal from `root`, deduplicated by record identity. The
    /// result has every Variable preceding all Variables that depend on it, with `root` last.
    fn build_dag(root: &Variable) -> Vec<Variable> {
        let mut seen = HashSet::new();
        let mut dag = Vec::new();
        let mut stack = vec![(root.clone(), false)];
        while let Some((v, expanded)) = stack.pop() {
            let id = v.id();
            if expanded {
                dag.push(v);
                continue;
            }
            if seen.contains(&id) {
                continue;
            }
            seen.insert(id);
            stack.push((v.clone(), true));
            for input in v.inputs() {
                stack.push((input, false));
            }
        }
        dag
    }

    /// Seed `self`'s gradient accumulator with `seed`, build the DAG rooted at `self`, and walk
    /// it root-first (reverse of the post-order build), invoking each node's
    /// `calc_grad_inputs`.
    pub fn backward_with_seed(&self, seed: Tensor, retain: bool) -> Result<()> {
        self.add_grad(Variable::new(seed, false));
        let dag = Self::build_dag(self);
        log::debug!("backward: {} nodes in graph", dag.len());
        for node in dag.iter().rev() {
            node.calc_grad_inputs(retain)?;
        }
        Ok(())
    }

    /// `backward` with no explicit seed: seeds with a constant-one array matching `self`'s
    /// shape. Does not check that `self` is scalar; a non-scalar root therefore back-propagates
    /// a ones-tensor seed.
    pub fn backward(&self, retain: bool) -> Result<()> {
        let seed = Tensor::ones(&self.shape());
        self.backward_with_seed(seed, retain)
    }
}

/// Wrap an array as a leaf `Variable` with `calc_grad = false`, for model inputs.
pub fn input(data: Tensor) -> Variable {
    Variable::new(data, false)
}

/// Wrap an array as a leaf `Variable` with `calc_grad = false`, for targets.
pub fn no_grad(data: Tensor) -> Variable {
    Variable::new(data, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_without_grad_has_no_inputs_or_fn() {
        let v = Variable::new(Tensor::scalar(1.0), false);
        assert!(!v.calc_grad());
        assert!(v.inputs().is_empty());
        assert!(v.grad().is_err());
    }

    #[test]
    fn add_grad_is_noop_when_disabled() {
        let v = Variable::new(Tensor::scalar(1.0), false);
        v.add_grad(Variable::new(Tensor::scalar(5.0), false));
        assert!(v.grad().is_err());
    }

    #[test]
    fn constant_pruning_when_no_input_requires_grad() {
        let a = Variable::new(Tensor::scalar(1.0), false);
        let b = Variable::new(Tensor::scalar(2.0), false);
        let c = Variable::from_op(Tensor::scalar(3.0), vec![a, b], |_| Ok(()));
        assert!(!c.calc_grad());
        assert!(c.inputs().is_empty());
    }

    #[test]
    fn zero_grad_clears_accumulator() {
        let v = Variable::new(Tensor::scalar(1.0), true);
        v.add_grad(Variable::new(Tensor::scalar(5.0), false));
        assert!(v.grad().is_ok());
        v.zero_grad();
        assert!(v.grad().is_err());
    }

    #[test]
    fn set_calc_grad_false_detaches_graph() {
        let a = Variable::new(Tensor::scalar(1.0), true);
        let b = Variable::from_op(Tensor::scalar(2.0), vec![a], |_| Ok(()));
        assert!(b.calc_grad());
        b.set_calc_grad(false);
        assert!(!b.calc_grad());
        assert!(b.inputs().is_empty());
    }

    #[test]
    fn dag_dedups_shared_inputs() {
        let a = Variable::new(Tensor::scalar(1.0), true);
        let b = Variable::from_op(Tensor::scalar(2.0), vec![a.clone(), a.clone()], |_| Ok(()));
        let dag = Variable::build_dag(&b);
        assert_eq!(dag.len(), 2);
        assert_eq!(dag.last().unwrap().id(), b.id());
    }
}
