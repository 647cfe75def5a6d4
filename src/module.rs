// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `Module` trait shared by layers, losses and containers.

use crate::error::Result;
use crate::variable::Variable;

/// The bookkeeping every `Module` needs: its learnable parameters and whether it is currently in
/// training mode. Concrete modules embed one of these rather than re-implementing `parameters`,
/// `train` and `eval` from scratch each time.
#[derive(Default)]
pub struct ModuleState {
    pub(crate) parameters: Vec<Variable>,
    pub(crate) training: bool,
}

impl ModuleState {
    pub fn new(parameters: Vec<Variable>) -> Self {
        ModuleState {
            parameters,
            training: false,
        }
    }
}

/// A differentiable computation with zero or more learnable parameters.
///
/// Implementors provide `module_state`/`module_state_mut` (almost always a plain accessor to an
/// embedded `ModuleState`) and `forward`; `parameters`, `train` and `eval` come from the default
/// implementations below.
pub trait Module {
    fn module_state(&self) -> &ModuleState;
    fn module_state_mut(&mut self) -> &mut ModuleState;

    /// Run the forward computation, building whatever graph is needed for a later `backward`.
    fn forward(&self, input: &Variable) -> Result<Variable>;

    /// This module's own learnable parameters, in construction order. Containers are expected to
    /// concatenate their children's.
    fn parameters(&self) -> Vec<Variable> {
        self.module_state().parameters.clone()
    }

    /// Replace this module's parameter list wholesale, e.g. after loading weights.
    fn set_params(&mut self, params: Vec<Variable>) {
        self.module_state_mut().parameters = params;
    }

    fn is_training(&self) -> bool {
        self.module_state().training
    }

    /// Enter training mode: flips the training flag and re-enables gradient tracking on every
    /// parameter.
    fn train(&mut self) {
        self.module_state_mut().training = true;
        for p in self.parameters() {
            p.set_calc_grad(true);
        }
    }

    /// Enter evaluation mode: flips the training flag and disables gradient tracking on every
    /// parameter, detaching them from any graph.
    fn eval(&mut self) {
        self.module_state_mut().training = false;
        for p in self.parameters() {
            p.set_calc_grad(false);
        }
    }
}
