//! The type-introspection seam.

use crate::{descriptor::TypeDescriptor, handler::CandidateHandler, hierarchy::TypeHierarchy};
use std::sync::Arc;

/// Source of candidate handlers and type relationships.
///
/// The resolver only ever talks to this trait, so the registration table can
/// be swapped or wrapped (e.g. instrumented in tests).
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot provide overload candidates",
    label = "missing `HandlerProvider` implementation",
    note = "Build a `HandlerTable` or implement `HandlerProvider` directly."
)]
pub trait HandlerProvider: Send + Sync {
    /// Declared subtype relationships.
    fn hierarchy(&self) -> &TypeHierarchy;

    /// Handlers named `name` declared directly on `receiver` (not inherited).
    fn candidates(&self, receiver: TypeDescriptor, name: &str) -> &[Arc<CandidateHandler>];

    /// Every handler named `name`, whatever its receiver.
    fn overloads(&self, name: &str) -> Vec<Arc<CandidateHandler>>;
}

impl<P: HandlerProvider + ?Sized> HandlerProvider for Arc<P> {
    fn hierarchy(&self) -> &TypeHierarchy {
        (**self).hierarchy()
    }

    fn candidates(&self, receiver: TypeDescriptor, name: &str) -> &[Arc<CandidateHandler>] {
        (**self).candidates(receiver, name)
    }

    fn overloads(&self, name: &str) -> Vec<Arc<CandidateHandler>> {
        (**self).overloads(name)
    }
}
