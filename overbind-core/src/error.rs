//! Error types for overbind.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`DispatchError`] - Top-level error type for resolver operations
//! - [`ResolveError`] - No handler, or no single most specific handler
//! - [`ConfigError`] - Setup defects: shapes, options, registrations
//! - [`InvokeError`] - A thunk was called with values it was not built for

use crate::descriptor::{TypeDescriptor, TypeList};
use thiserror::Error;

/// Top-level error type for all resolver operations.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Overload resolution failed.
    #[error("resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// The resolver or its handler table is misconfigured.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A thunk rejected the values it was invoked with.
    #[error("invocation error: {0}")]
    Invoke(#[from] InvokeError),
}

impl DispatchError {
    /// Whether this is a "no matching handler" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DispatchError::Resolve(ResolveError::NotFound { .. }))
    }
}

/// Errors from overload resolution.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No candidate accepts the argument types.
    #[error("no handler `{handler}` on `{receiver}` accepts ({arguments})")]
    NotFound {
        /// Effective handler name, routing key included.
        handler: String,
        /// Receiver type.
        receiver: TypeDescriptor,
        /// Argument types, in order.
        arguments: TypeList,
    },

    /// Several candidates match and none is more specific than the others.
    #[error(
        "ambiguous call to `{handler}` on `{receiver}` with ({arguments}): {}",
        .candidates.join(" | ")
    )]
    Ambiguous {
        /// Effective handler name, routing key included.
        handler: String,
        /// Receiver type.
        receiver: TypeDescriptor,
        /// Argument types, in order.
        arguments: TypeList,
        /// The equally specific candidates.
        candidates: Vec<String>,
    },
}

/// Errors caused by resolver or registration setup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The requested thunk shape does not fit the handler or request arity.
    #[error("shape `{shape}` takes {expected} argument(s), found {found}")]
    ShapeMismatch {
        /// Name of the requested shape.
        shape: &'static str,
        /// Arity of the requested shape.
        expected: usize,
        /// Arity that was found instead.
        found: usize,
    },

    /// Resolver options are invalid.
    #[error("invalid resolver options: {0}")]
    InvalidOptions(String),

    /// Two handlers share receiver, name and parameter types.
    #[error("handler `{0}` registered twice")]
    DuplicateHandler(String),

    /// A declared base would make a type its own ancestor.
    #[error("`{derived}` cannot extend `{base}`: the hierarchy would become cyclic")]
    CyclicHierarchy {
        /// The would-be subtype.
        derived: TypeDescriptor,
        /// The would-be base.
        base: TypeDescriptor,
    },

    /// A handler was compiled for types it cannot accept.
    #[error("`{from}` is not assignable to `{to}`")]
    NotAssignable {
        /// Resolved type.
        from: TypeDescriptor,
        /// Declared type.
        to: TypeDescriptor,
    },
}

/// Errors raised when invoking a thunk.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// Wrong number of argument values.
    #[error("expected {expected} argument(s), got {found}")]
    ArityMismatch {
        /// Handler arity.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },

    /// The receiver value has an incompatible runtime type.
    #[error("receiver is not a `{expected}`")]
    ReceiverMismatch {
        /// Type the thunk was built for.
        expected: TypeDescriptor,
    },

    /// An argument value has an incompatible runtime type.
    #[error("argument {position} is not a `{expected}`")]
    ArgumentMismatch {
        /// Zero-based argument position.
        position: usize,
        /// Type the thunk was built for.
        expected: TypeDescriptor,
    },
}
