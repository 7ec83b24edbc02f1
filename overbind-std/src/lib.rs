//! # overbind-std
//!
//! Standard implementations for the overbind multiple-dispatch resolver.
//!
//! This crate provides:
//! - **Registration**: [`HandlerTable`], [`HandlerTableBuilder`]
//! - **Overload resolution**: [`resolve_handler`]
//! - **Thunk compilation**: [`ThunkCompiler`]
//! - **Caching**: [`LocalCache`], [`SharedCache`]
//! - **Facade**: [`DispatchResolver`]
//! - **Distributed registration**: `HandlerRegistration` (feature `inventory`)

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core crate
pub use overbind_core;

// Modules
pub mod cache;
pub mod compile;
pub mod resolve;
pub mod resolver;
pub mod table;
pub mod testing;

#[cfg(feature = "inventory")]
pub mod collected;

pub use cache::{DispatchCache, LocalCache, SharedCache};
pub use compile::ThunkCompiler;
pub use resolve::resolve_handler;
pub use resolver::{DispatchResolver, ResolverOptions, ResolverStats};
pub use table::{HandlerTable, HandlerTableBuilder};

#[cfg(feature = "inventory")]
pub use collected::HandlerRegistration;
#[cfg(feature = "inventory")]
pub use inventory;
