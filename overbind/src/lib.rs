//! # overbind - Dynamic Multiple Dispatch
//!
//! `overbind` picks a handler from the *runtime* types of a receiver and its
//! arguments, then memoizes the choice as a [`Thunk`] so that later calls with
//! the same types skip resolution entirely.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use overbind::prelude::*;
//!
//! let table = HandlerTable::builder()
//!     .handler("handle", |d: &mut Dispatcher, op: &AddOp| d.add(op))
//!     .handler("handle", |d: &mut Dispatcher, op: &RemoveOp| d.remove(op))
//!     .fallback("handle", |d: &mut Dispatcher, _: &dyn Any| d.skip())
//!     .build()?;
//!
//! let resolver = DispatchResolver::<Unary>::new(Arc::new(table), ResolverOptions::default())?;
//! let thunk = resolver.get_thunk(
//!     TypeDescriptor::of::<Dispatcher>(),
//!     &[TypeDescriptor::of::<AddOp>()],
//!     None,
//! )?;
//! thunk.call(&mut dispatcher, &AddOp)?;
//! ```
//!
//! ## Routing keys
//!
//! A routing key is prepended to the handler name, so `Some("on_")` selects
//! the `on_handle` overloads. Each key has its own cache entries.
//!
//! ## Threads
//!
//! [`DispatchResolver::new`] builds a single-threaded resolver (`!Sync`).
//! [`DispatchResolver::synchronized`] builds one that can be shared.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use overbind_core::{
    // Handlers
    CandidateHandler,
    // Errors
    ConfigError,
    DispatchError,
    // Types
    Extends,
    HandlerProvider,
    IntoHandler,
    InvokeError,
    ResolveError,
    // Signatures
    Signature,
    // Thunks
    Binary,
    Nullary,
    Quaternary,
    Shape,
    Ternary,
    Thunk,
    TypeDescriptor,
    TypeHierarchy,
    TypeList,
    Unary,
    Value,
    compute_signature,
};

pub use overbind_std::{
    DispatchCache, DispatchResolver, HandlerTable, HandlerTableBuilder, LocalCache,
    ResolverOptions, ResolverStats, SharedCache, ThunkCompiler, resolve_handler,
};

#[cfg(feature = "inventory")]
pub use overbind_std::HandlerRegistration;

/// Testing utilities.
pub mod testing {
    pub use overbind_std::testing::{CountingProvider, RecordingReceiver};
}

/// Prelude module - common imports for overbind.
///
/// # Usage
///
/// ```rust,ignore
/// use overbind::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Shapes
        Binary,
        // Errors
        DispatchError,
        // Resolution
        DispatchResolver,
        Extends,
        HandlerTable,
        Nullary,
        Quaternary,
        ResolverOptions,
        Ternary,
        Thunk,
        TypeDescriptor,
        Unary,
    };
    pub use std::{any::Any, sync::Arc};
}

#[cfg(feature = "inventory")]
pub use inventory;
