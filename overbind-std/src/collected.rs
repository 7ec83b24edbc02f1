//! Distributed handler registration via `inventory`.
//!
//! Each registration is a function that adds types and handlers to a
//! builder. Submit them anywhere in the program and gather them with
//! [`HandlerTable::collect`].
//!
//! ```rust,ignore
//! fn register_ops(builder: HandlerTableBuilder) -> HandlerTableBuilder {
//!     builder
//!         .handler("handle", |d: &mut Dispatcher, op: &AddOp| d.add(op))
//!         .handler("handle", |d: &mut Dispatcher, op: &RemoveOp| d.remove(op))
//! }
//!
//! inventory::submit! { HandlerRegistration::new("ops", register_ops) }
//!
//! let table = HandlerTable::collect()?;
//! ```

use crate::table::{HandlerTable, HandlerTableBuilder};
use overbind_core::ConfigError;

/// A registration function submitted to `inventory`.
pub struct HandlerRegistration {
    /// Name for debugging.
    pub name: &'static str,
    /// Adds this registration's types and handlers.
    pub register: fn(HandlerTableBuilder) -> HandlerTableBuilder,
}

impl HandlerRegistration {
    /// Create a registration entry.
    pub const fn new(
        name: &'static str,
        register: fn(HandlerTableBuilder) -> HandlerTableBuilder,
    ) -> Self {
        Self { name, register }
    }
}

inventory::collect!(HandlerRegistration);

impl HandlerTableBuilder {
    /// Apply every submitted [`HandlerRegistration`].
    pub fn collected(self) -> Self {
        inventory::iter::<HandlerRegistration>
            .into_iter()
            .fold(self, |builder, registration| {
                #[cfg(feature = "tracing")]
                tracing::trace!(registration = registration.name, "applying handler registration");
                (registration.register)(builder)
            })
    }
}

impl HandlerTable {
    /// Build a table from every submitted [`HandlerRegistration`].
    pub fn collect() -> Result<Self, ConfigError> {
        HandlerTableBuilder::new().collected().build()
    }
}
