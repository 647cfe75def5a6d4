// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the autodiff engine and the module layer built on top of it.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("gradient calculation is disabled for this variable, in {name}{trace}")]
    GradientDisabled { name: String, trace: String },

    #[error("no gradient has been accumulated yet for this variable, in {name}{trace}")]
    GradientNotAvailable { name: String, trace: String },

    #[error("shape mismatch in {name}: {shapes:?}{trace}")]
    ShapeMismatch {
        name: String,
        shapes: Vec<Vec<usize>>,
        trace: String,
    },

    #[error(
        "a loss module was called with a single argument; targets are required, in {name}{trace}"
    )]
    LossRequiresTargets { name: String, trace: String },
}

impl Error {
    fn backtrace() -> String {
        if std::env::var("RUST_BACKTRACE").is_ok() {
            format!("\n{:?}", backtrace::Backtrace::new())
        } else {
            String::new()
        }
    }

    pub fn gradient_disabled(name: &str) -> Self {
        Error::GradientDisabled {
            name: name.to_string(),
            trace: Self::backtrace(),
        }
    }

    pub fn gradient_not_available(name: &str) -> Self {
        Error::GradientNotAvailable {
            name: name.to_string(),
            trace: Self::backtrace(),
        }
    }

    pub fn shape_mismatch(name: &str, shapes: &[&[usize]]) -> Self {
        Error::ShapeMismatch {
            name: name.to_string(),
            shapes: shapes.iter().map(|s| s.to_vec()).collect(),
            trace: Self::backtrace(),
        }
    }

    pub fn loss_requires_targets(name: &str) -> Self {
        Error::LossRequiresTargets {
            name: name.to_string(),
            trace: Self::backtrace(),
        }
    }
}

/// Check that every given shape is equal to the first one.
pub fn check_equal_shapes(name: &str, shapes: &[&[usize]]) -> Result<()> {
    if let Some((first, rest)) = shapes.split_first() {
        if rest.iter().all(|s| s == first) {
            return Ok(());
        }
    }
    Err(Error::shape_mismatch(name, shapes))
}

/// Expands to the fully qualified name of the function it is called from, trimmed of the
/// trailing closure marker added by the `type_name` trick.
#[macro_export]
macro_rules! func_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        &name[..name.len() - 3]
    }};
}
