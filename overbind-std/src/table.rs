//! Handler table: the registration side of dispatch.
//!
//! Types and handlers are registered on a [`HandlerTableBuilder`], then frozen
//! into an immutable [`HandlerTable`] that can be shared across threads and
//! serves as the resolver's [`HandlerProvider`].

use overbind_core::{
    CandidateHandler, ConfigError, Extends, HandlerProvider, IntoHandler, TypeDescriptor,
    TypeHierarchy,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::{any::Any, sync::Arc};

type ByName = FxHashMap<String, Vec<Arc<CandidateHandler>>>;

// ============================================================================
// HandlerTableBuilder - for constructing tables
// ============================================================================

/// Builder for constructing a [`HandlerTable`].
///
/// Hierarchy errors are collected and reported by [`build`](Self::build), so
/// registrations can be chained.
///
/// # Example
/// ```ignore
/// let table = HandlerTable::builder()
///     .derive::<Circle, Shape>()
///     .handler("handle", |d: &mut Dispatcher, op: &AddOp| d.add(op))
///     .handler("handle", |d: &mut Dispatcher, s: &Shape| d.draw(s))
///     .fallback("handle", |d: &mut Dispatcher, _: &dyn Any| d.skip())
///     .build()?;
/// ```
#[derive(Default)]
pub struct HandlerTableBuilder {
    hierarchy: TypeHierarchy,
    handlers: Vec<CandidateHandler>,
    errors: Vec<ConfigError>,
}

impl HandlerTableBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `T` known by name without declaring bases.
    ///
    /// Only needed for types that appear in neither a handler nor a
    /// `derive`, so that diagnostics can name them.
    pub fn register_type<T: Any>(mut self) -> Self {
        self.hierarchy.register::<T>();
        self
    }

    /// Declare `D` as a subtype of `B`.
    pub fn derive<D: Extends<B>, B: Any>(mut self) -> Self {
        if let Err(err) = self.hierarchy.derive::<D, B>() {
            self.errors.push(err);
        }
        self
    }

    /// Register a typed handler closure.
    pub fn handler<R, Args, Out, F>(self, name: impl Into<String>, handler: F) -> Self
    where
        R: Any,
        F: IntoHandler<R, Args, Out>,
    {
        self.candidate(CandidateHandler::new(name, handler))
    }

    /// Register a one-argument handler accepting any value.
    pub fn fallback<R, Out, F>(self, name: impl Into<String>, handler: F) -> Self
    where
        R: Any,
        Out: Any + Send,
        F: Fn(&mut R, &dyn Any) -> Out + Send + Sync + 'static,
    {
        self.candidate(CandidateHandler::fallback(name, handler))
    }

    /// Register a handler with explicit parameter descriptors.
    pub fn erased<R, Out, F>(
        self,
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = TypeDescriptor>,
        handler: F,
    ) -> Self
    where
        R: Any,
        Out: Any + Send,
        F: Fn(&mut R, &[&dyn Any]) -> Out + Send + Sync + 'static,
    {
        self.candidate(CandidateHandler::erased(name, parameters, handler))
    }

    /// Register a prebuilt candidate.
    pub fn candidate(mut self, handler: CandidateHandler) -> Self {
        self.candidate_mut(handler);
        self
    }

    /// Register a prebuilt candidate (mutable version).
    pub fn candidate_mut(&mut self, handler: CandidateHandler) {
        self.hierarchy.record(handler.receiver());
        for parameter in handler.parameters() {
            self.hierarchy.record(*parameter);
        }
        self.handlers.push(handler);
    }

    /// Get the number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the builder has no handlers.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Build the immutable table.
    ///
    /// Fails on the first hierarchy error, or if two handlers share receiver,
    /// name and parameter types.
    pub fn build(self) -> Result<HandlerTable, ConfigError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        let mut seen = FxHashSet::default();
        let mut handlers: FxHashMap<TypeDescriptor, ByName> = FxHashMap::default();
        let count = self.handlers.len();

        for handler in self.handlers {
            let key = (
                handler.receiver(),
                handler.name().to_owned(),
                handler.parameters().to_vec(),
            );
            if !seen.insert(key) {
                return Err(ConfigError::DuplicateHandler(handler.to_string()));
            }
            handlers
                .entry(handler.receiver())
                .or_default()
                .entry(handler.name().to_owned())
                .or_default()
                .push(Arc::new(handler));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            handlers = count,
            types = self.hierarchy.len(),
            "handler table built"
        );

        Ok(HandlerTable {
            hierarchy: self.hierarchy,
            handlers,
            count,
        })
    }
}

// ============================================================================
// HandlerTable - immutable, thread-safe handler storage
// ============================================================================

/// An immutable, thread-safe registration table.
///
/// Created by [`HandlerTableBuilder::build`]. Wrap it in an `Arc` to share it
/// between resolvers.
pub struct HandlerTable {
    hierarchy: TypeHierarchy,
    handlers: FxHashMap<TypeDescriptor, ByName>,
    count: usize,
}

impl HandlerTable {
    /// Start a new builder.
    pub fn builder() -> HandlerTableBuilder {
        HandlerTableBuilder::new()
    }

    /// Get the number of registered handlers.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterate over every registered handler.
    pub fn iter(&self) -> impl Iterator<Item = &CandidateHandler> {
        self.handlers
            .values()
            .flat_map(|by_name| by_name.values())
            .flatten()
            .map(|handler| &**handler)
    }
}

impl HandlerProvider for HandlerTable {
    fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }

    fn candidates(&self, receiver: TypeDescriptor, name: &str) -> &[Arc<CandidateHandler>] {
        self.handlers
            .get(&receiver)
            .and_then(|by_name| by_name.get(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn overloads(&self, name: &str) -> Vec<Arc<CandidateHandler>> {
        self.handlers
            .values()
            .filter_map(|by_name| by_name.get(name))
            .flatten()
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerTable")
            .field("handlers", &self.count)
            .field("types", &self.hierarchy.len())
            .finish()
    }
}
