//! Testing utilities for overbind.
//!
//! # Features
//!
//! - [`CountingProvider`]: wraps a provider and counts candidate lookups, to
//!   check that resolution runs once per signature
//! - [`RecordingReceiver`]: a receiver whose handlers append labels

use overbind_core::{CandidateHandler, HandlerProvider, TypeDescriptor, TypeHierarchy};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Counting Provider
// ============================================================================

/// A provider that counts how often overload candidates are requested.
///
/// # Example
///
/// ```rust,ignore
/// let provider = Arc::new(CountingProvider::new(table));
/// let resolver = DispatchResolver::<Unary>::new(provider.clone(), options)?;
///
/// resolver.get_thunk(recv, &[arg], None)?;
/// let after_first = provider.candidate_lookups();
/// resolver.get_thunk(recv, &[arg], None)?;
/// assert_eq!(provider.candidate_lookups(), after_first);
/// ```
pub struct CountingProvider<P> {
    inner: P,
    lookups: AtomicUsize,
}

impl<P: HandlerProvider> CountingProvider<P> {
    /// Wrap a provider.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    /// Number of `candidates` calls so far.
    pub fn candidate_lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.lookups.store(0, Ordering::SeqCst);
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: HandlerProvider> HandlerProvider for CountingProvider<P> {
    fn hierarchy(&self) -> &TypeHierarchy {
        self.inner.hierarchy()
    }

    fn candidates(&self, receiver: TypeDescriptor, name: &str) -> &[Arc<CandidateHandler>] {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.candidates(receiver, name)
    }

    fn overloads(&self, name: &str) -> Vec<Arc<CandidateHandler>> {
        self.inner.overloads(name)
    }
}

// ============================================================================
// Recording Receiver
// ============================================================================

/// A receiver that records what its handlers did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingReceiver {
    entries: Vec<String>,
}

impl RecordingReceiver {
    /// Create an empty receiver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a label.
    pub fn record(&mut self, label: impl Into<String>) {
        self.entries.push(label.into());
    }

    /// Recorded labels, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of recorded labels.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Clear all recorded labels.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
