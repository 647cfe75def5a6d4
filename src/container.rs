// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `Sequential`: chain modules into a single one, concatenating their parameters.

use crate::error::Result;
use crate::module::{Module, ModuleState};
use crate::variable::Variable;

#[derive(Default)]
pub struct Sequential {
    state: ModuleState,
    modules: Vec<Box<dyn Module>>,
}

impl Sequential {
    pub fn new() -> Self {
        Sequential {
            state: ModuleState::default(),
            modules: Vec::new(),
        }
    }

    /// Append a module, folding its parameters into this container's own list.
    pub fn add<M: Module + 'static>(&mut self, module: M) {
        self.state.parameters.extend(module.parameters());
        self.modules.push(Box::new(module));
    }

    pub fn modules(&self) -> &[Box<dyn Module>] {
        &self.modules
    }
}

impl Module for Sequential {
    fn module_state(&self) -> &ModuleState {
        &self.state
    }

    fn module_state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    fn forward(&self, input: &Variable) -> Result<Variable> {
        let mut x = input.clone();
        for module in &self.modules {
            x = module.forward(&x)?;
        }
        Ok(x)
    }

    fn train(&mut self) {
        self.state.training = true;
        for module in &mut self.modules {
            module.train();
        }
    }

    fn eval(&mut self) {
        self.state.training = false;
        for module in &mut self.modules {
            module.eval();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{Linear, ReLU};
    use crate::tensor::Tensor;

    #[test]
    fn forward_chains_modules_in_order() {
        let mut net = Sequential::new();
        net.add(Linear::new(3, 4));
        net.add(ReLU::new());
        net.add(Linear::new(4, 1));
        let x = Variable::new(Tensor::ones(&[3, 2]), false);
        let y = net.forward(&x).unwrap();
        assert_eq!(y.shape(), vec![1, 2]);
    }

    #[test]
    fn parameters_concatenate_across_children() {
        let mut net = Sequential::new();
        net.add(Linear::new(3, 4));
        net.add(Linear::new(4, 2));
        // two Linear layers, each with a weight and a bias by default
        assert_eq!(net.parameters().len(), 4);
    }

    #[test]
    fn train_and_eval_propagate_to_children() {
        let mut net = Sequential::new();
        net.add(Linear::new(2, 2));
        net.eval();
        assert!(!net.modules()[0].is_training());
        net.train();
        assert!(net.modules()[0].is_training());
    }
}
