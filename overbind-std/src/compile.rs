//! Thunk compilation.
//!
//! Turns a resolved [`CandidateHandler`] into a [`Thunk`] by precomputing
//! every narrowing the call will need: the receiver from the requested type
//! to the type the handler is declared on, and each argument from its
//! requested type to the declared parameter type. Paths from every
//! registered subtype of a declared type are precomputed as well, so a thunk
//! also accepts values more derived than the ones it was resolved for.

use overbind_core::{
    CandidateHandler, ConfigError, Narrowing, Shape, Thunk, TypeDescriptor, TypeHierarchy,
};
use std::sync::Arc;

/// Builds thunks for resolved handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThunkCompiler;

impl ThunkCompiler {
    /// Compile `handler` for a request on `receiver` with `arguments`.
    ///
    /// Fails eagerly with [`ConfigError::ShapeMismatch`] if the handler's
    /// arity is not `S::ARITY`, and with [`ConfigError::NotAssignable`] if a
    /// requested type cannot be narrowed to what the handler declares.
    pub fn compile<S: Shape>(
        hierarchy: &TypeHierarchy,
        receiver: TypeDescriptor,
        arguments: &[TypeDescriptor],
        handler: Arc<CandidateHandler>,
    ) -> Result<Thunk<S>, ConfigError> {
        if handler.arity() != S::ARITY {
            return Err(ConfigError::ShapeMismatch {
                shape: S::NAME,
                expected: S::ARITY,
                found: handler.arity(),
            });
        }
        if arguments.len() != S::ARITY {
            return Err(ConfigError::ShapeMismatch {
                shape: S::NAME,
                expected: S::ARITY,
                found: arguments.len(),
            });
        }

        let receiver = narrowing(hierarchy, receiver, handler.receiver())?;
        let arguments = arguments
            .iter()
            .zip(handler.parameters())
            .map(|(argument, parameter)| narrowing(hierarchy, *argument, *parameter))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Thunk::from_parts(handler, receiver, arguments))
    }
}

fn narrowing(
    hierarchy: &TypeHierarchy,
    resolved: TypeDescriptor,
    declared: TypeDescriptor,
) -> Result<Narrowing, ConfigError> {
    let path = hierarchy
        .upcast_path(resolved, declared)
        .ok_or(ConfigError::NotAssignable {
            from: resolved,
            to: declared,
        })?;

    let narrowing = hierarchy
        .subtypes(declared)
        .into_iter()
        .filter(|subtype| *subtype != resolved)
        .fold(Narrowing::new(declared, resolved, path), |narrowing, subtype| {
            match hierarchy.upcast_path(subtype, declared) {
                Some(path) => narrowing.with_subtype(subtype, path),
                None => narrowing,
            }
        });
    Ok(narrowing)
}
