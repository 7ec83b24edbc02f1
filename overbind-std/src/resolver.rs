//! # Dispatch Resolver
//!
//! The entry point callers use: map a receiver type, argument types and an
//! optional routing key to a memoized [`Thunk`].
//!
//! # Flow
//!
//! ```text
//! get_thunk(receiver, arguments, key)
//!   -> shape check
//!   -> compute_signature ──hit──> cached thunk
//!        │ miss
//!        v
//!   resolve_handler(key + handler_name) -> ThunkCompiler::compile -> cache
//! ```
//!
//! The cache type decides the threading mode: [`LocalCache`] (the default)
//! keeps the resolver on one thread, [`SharedCache`] lets it be shared.

use crate::{
    cache::{DispatchCache, LocalCache, SharedCache},
    compile::ThunkCompiler,
    resolve::resolve_handler,
};
use overbind_core::{
    ConfigError, DispatchError, HandlerProvider, ResolveError, Shape, Thunk, TypeDescriptor,
    TypeList, Value, compute_signature,
};
use std::{
    any::Any,
    fmt,
    marker::PhantomData,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

// ============================================================================
// ResolverOptions
// ============================================================================

/// Construction options for a [`DispatchResolver`].
///
/// # Example
/// ```ignore
/// let options = ResolverOptions::new("handle").with_thread_safe(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolverOptions {
    /// Base name of the handler methods to dispatch to.
    pub handler_name: String,
    /// Whether the resolver will be shared between threads.
    pub thread_safe: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            handler_name: "handle".to_string(),
            thread_safe: false,
        }
    }
}

impl ResolverOptions {
    /// Options for handlers named `handler_name`.
    pub fn new(handler_name: impl Into<String>) -> Self {
        Self {
            handler_name: handler_name.into(),
            ..Self::default()
        }
    }

    /// Set whether the resolver will be shared between threads.
    pub fn with_thread_safe(mut self, thread_safe: bool) -> Self {
        self.thread_safe = thread_safe;
        self
    }
}

/// Cache counters of a [`DispatchResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolverStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that ran overload resolution.
    pub misses: u64,
}

// ============================================================================
// DispatchResolver
// ============================================================================

/// Resolves and memoizes thunks of shape `S`.
///
/// With the default [`LocalCache`] the resolver is `!Sync`; use
/// [`DispatchResolver::synchronized`] to share one between threads.
pub struct DispatchResolver<S: Shape, C = LocalCache<Thunk<S>>> {
    provider: Arc<dyn HandlerProvider>,
    handler_name: String,
    cache: C,
    hits: AtomicU64,
    misses: AtomicU64,
    _shape: PhantomData<fn() -> S>,
}

impl<S: Shape> DispatchResolver<S> {
    /// Create an unsynchronized resolver.
    ///
    /// Fails with [`ConfigError::InvalidOptions`] if `options.thread_safe`
    /// is set.
    pub fn new(
        provider: Arc<dyn HandlerProvider>,
        options: ResolverOptions,
    ) -> Result<Self, ConfigError> {
        Self::with_cache(provider, options)
    }
}

impl<S: Shape> DispatchResolver<S, SharedCache<Thunk<S>>> {
    /// Create a resolver that can be shared between threads.
    pub fn synchronized(
        provider: Arc<dyn HandlerProvider>,
        options: ResolverOptions,
    ) -> Result<Self, ConfigError> {
        Self::with_cache(provider, options)
    }
}

impl<S: Shape, C: DispatchCache<Thunk<S>>> DispatchResolver<S, C> {
    /// Create a resolver backed by cache type `C`.
    ///
    /// Handlers named exactly `options.handler_name` that exist with no
    /// overload of arity `S::ARITY` are reported here rather than on first
    /// use.
    pub fn with_cache(
        provider: Arc<dyn HandlerProvider>,
        options: ResolverOptions,
    ) -> Result<Self, ConfigError> {
        let ResolverOptions {
            handler_name,
            thread_safe,
        } = options;

        if handler_name.is_empty() {
            return Err(ConfigError::InvalidOptions(
                "handler name must not be empty".to_string(),
            ));
        }
        if thread_safe && !C::SYNCHRONIZED {
            return Err(ConfigError::InvalidOptions(format!(
                "thread-safe dispatch of `{handler_name}` needs a synchronized cache"
            )));
        }

        let overloads = provider.overloads(&handler_name);
        if !overloads.is_empty() && overloads.iter().all(|handler| handler.arity() != S::ARITY) {
            return Err(ConfigError::ShapeMismatch {
                shape: S::NAME,
                expected: S::ARITY,
                found: overloads[0].arity(),
            });
        }

        Ok(Self {
            provider,
            handler_name,
            cache: C::default(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            _shape: PhantomData,
        })
    }

    /// Get the thunk for `receiver` called with `arguments`.
    ///
    /// Fails with [`ResolveError::NotFound`] when no handler applies.
    pub fn get_thunk(
        &self,
        receiver: TypeDescriptor,
        arguments: &[TypeDescriptor],
        routing_key: Option<&str>,
    ) -> Result<Thunk<S>, DispatchError> {
        if arguments.len() != S::ARITY {
            return Err(ConfigError::ShapeMismatch {
                shape: S::NAME,
                expected: S::ARITY,
                found: arguments.len(),
            }
            .into());
        }

        let signature = compute_signature(receiver, arguments, routing_key);
        let mut missed = false;
        let thunk = self.cache.get_or_compile(signature, || {
            missed = true;
            self.compile(receiver, arguments, routing_key)
        });

        if missed {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        thunk
    }

    /// Like [`get_thunk`](Self::get_thunk), but "no handler" is `Ok(None)`.
    ///
    /// Ambiguity and configuration errors are still reported.
    pub fn try_get_thunk(
        &self,
        receiver: TypeDescriptor,
        arguments: &[TypeDescriptor],
        routing_key: Option<&str>,
    ) -> Result<Option<Thunk<S>>, DispatchError> {
        match self.get_thunk(receiver, arguments, routing_key) {
            Ok(thunk) => Ok(Some(thunk)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Resolve from the runtime types of live values and invoke.
    ///
    /// Types the hierarchy has never seen get an unregistered descriptor,
    /// which in practice only matches `&dyn Any` parameters.
    pub fn dispatch(
        &self,
        receiver: &mut dyn Any,
        args: &[&dyn Any],
        routing_key: Option<&str>,
    ) -> Result<Value, DispatchError> {
        let hierarchy = self.provider.hierarchy();
        let receiver_ty = hierarchy.descriptor((*receiver).type_id());
        let arguments: Vec<TypeDescriptor> =
            args.iter().map(|arg| hierarchy.descriptor_of(*arg)).collect();

        let thunk = self.get_thunk(receiver_ty, &arguments, routing_key)?;
        Ok(thunk.invoke(receiver, args)?)
    }

    /// Base handler name, without routing key.
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    /// Whether this resolver may be shared between threads.
    pub fn is_synchronized(&self) -> bool {
        C::SYNCHRONIZED
    }

    /// Number of memoized thunks.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Cache hit and miss counts so far.
    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn effective_name(&self, routing_key: Option<&str>) -> String {
        match routing_key {
            Some(key) => format!("{key}{}", self.handler_name),
            None => self.handler_name.clone(),
        }
    }

    fn compile(
        &self,
        receiver: TypeDescriptor,
        arguments: &[TypeDescriptor],
        routing_key: Option<&str>,
    ) -> Result<Thunk<S>, DispatchError> {
        let name = self.effective_name(routing_key);
        let Some(handler) = resolve_handler(&*self.provider, receiver, &name, arguments)? else {
            #[cfg(feature = "tracing")]
            tracing::trace!(handler = %name, receiver = %receiver, "no applicable handler");
            return Err(ResolveError::NotFound {
                handler: name,
                receiver,
                arguments: TypeList::from(arguments),
            }
            .into());
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            receiver = %receiver,
            arguments = %TypeList::from(arguments),
            resolved = %handler,
            "dispatch cache miss"
        );

        Ok(ThunkCompiler::compile::<S>(
            self.provider.hierarchy(),
            receiver,
            arguments,
            handler,
        )?)
    }
}

impl<S: Shape, C: DispatchCache<Thunk<S>>> fmt::Debug for DispatchResolver<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchResolver")
            .field("shape", &S::NAME)
            .field("handler_name", &self.handler_name)
            .field("synchronized", &C::SYNCHRONIZED)
            .field("cached", &self.cache.len())
            .finish()
    }
}
