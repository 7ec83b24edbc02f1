//! # overbind-core
//!
//! Core types for the overbind multiple-dispatch resolver.
//!
//! This crate has minimal dependencies and holds everything a handler table or
//! a custom [`HandlerProvider`] needs, without the resolver machinery of
//! `overbind-std`.
//!
//! # Building Blocks
//!
//! ## Type identity ([`TypeDescriptor`], [`TypeHierarchy`])
//!
//! Runtime types are identified by `TypeId`. Rust has no subtyping, so
//! "`Derived` is a `Base`" is declared through [`Extends`] and recorded in a
//! [`TypeHierarchy`], which also knows how to narrow a `Derived` value to its
//! `Base` view. [`TypeDescriptor::object`] is assignable from everything.
//!
//! ## Signatures ([`Signature`])
//!
//! The cache identity of a dispatch request: receiver type, ordered argument
//! types and an optional routing key folded into a `u64`.
//!
//! ## Handlers ([`CandidateHandler`])
//!
//! One member of an overload set, registered from a typed closure and erased
//! once at registration time.
//!
//! ## Thunks ([`Thunk`])
//!
//! The memoized invocation path for one resolved handler. A thunk is tagged
//! with a [`Shape`] that fixes how many arguments it takes.
//!
//! # Error Types
//!
//! - [`DispatchError`] - Top-level error type
//! - [`ResolveError`] - Not found / ambiguous
//! - [`ConfigError`] - Setup defects
//! - [`InvokeError`] - Values rejected at call time

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod descriptor;
mod error;
mod handler;
mod hierarchy;
mod provider;
mod signature;
mod thunk;

// Re-exports
pub use descriptor::{TypeDescriptor, TypeList};
pub use error::{ConfigError, DispatchError, InvokeError, ResolveError};
pub use handler::{CandidateHandler, IntoHandler, Value};
pub use hierarchy::{Extends, TypeHierarchy, UpcastPath};
pub use provider::HandlerProvider;
pub use signature::{SIGNATURE_MIX, Signature, compute_signature, hash_combine};
pub use thunk::{Binary, MAX_ARITY, Narrowing, Nullary, Quaternary, Shape, Ternary, Thunk, Unary};
