//! # Overload Resolution
//!
//! Selects the single most specific handler for a receiver type and an ordered
//! list of argument types.
//!
//! # Algorithm
//!
//! 1. **Lineage**: the receiver type, then its ancestors breadth first
//! 2. **Applicable**: same name, same arity, every parameter accepts its argument
//! 3. **Maximal**: drop every candidate dominated by another
//! 4. **Select**: a single survivor wins; several survivors are ambiguous
//!
//! Candidate `A` dominates `B` when each parameter of `A` is assignable to the
//! matching parameter of `B` and at least one is a strict subtype. With equal
//! parameter lists, the handler declared on the more derived receiver wins.

use overbind_core::{
    CandidateHandler, HandlerProvider, ResolveError, TypeDescriptor, TypeHierarchy, TypeList,
};
use std::sync::Arc;

/// Find the most specific handler named `name` accepting `arguments`.
///
/// Returns `Ok(None)` when nothing applies, and
/// [`ResolveError::Ambiguous`] when no single candidate is most specific.
pub fn resolve_handler(
    provider: &dyn HandlerProvider,
    receiver: TypeDescriptor,
    name: &str,
    arguments: &[TypeDescriptor],
) -> Result<Option<Arc<CandidateHandler>>, ResolveError> {
    let hierarchy = provider.hierarchy();

    let mut lineage = vec![receiver];
    lineage.extend(hierarchy.ancestors(receiver));

    let applicable: Vec<&Arc<CandidateHandler>> = lineage
        .iter()
        .flat_map(|ty| provider.candidates(*ty, name))
        .filter(|handler| accepts(hierarchy, handler, arguments))
        .collect();

    let maximal: Vec<&Arc<CandidateHandler>> = applicable
        .iter()
        .copied()
        .filter(|candidate| {
            !applicable
                .iter()
                .any(|other| dominates(hierarchy, other, candidate))
        })
        .collect();

    match maximal.as_slice() {
        [] => Ok(None),
        [winner] => Ok(Some(Arc::clone(winner))),
        tied => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                handler = name,
                receiver = %receiver,
                candidates = tied.len(),
                "ambiguous overload"
            );
            Err(ResolveError::Ambiguous {
                handler: name.to_owned(),
                receiver,
                arguments: TypeList::from(arguments),
                candidates: tied.iter().map(|handler| handler.to_string()).collect(),
            })
        }
    }
}

fn accepts(hierarchy: &TypeHierarchy, handler: &CandidateHandler, arguments: &[TypeDescriptor]) -> bool {
    handler.arity() == arguments.len()
        && handler
            .parameters()
            .iter()
            .zip(arguments)
            .all(|(parameter, argument)| hierarchy.is_assignable(*argument, *parameter))
}

fn dominates(hierarchy: &TypeHierarchy, a: &CandidateHandler, b: &CandidateHandler) -> bool {
    let pairs = || a.parameters().iter().zip(b.parameters());

    if !pairs().all(|(pa, pb)| hierarchy.is_assignable(*pa, *pb)) {
        return false;
    }
    pairs().any(|(pa, pb)| pa != pb) || hierarchy.is_strict_subtype(a.receiver(), b.receiver())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::HandlerTable;
    use overbind_core::Extends;
    use std::any::Any;

    struct Dispatcher;
    struct LoggingDispatcher {
        inner: Dispatcher,
    }

    struct Base;
    struct Derived {
        base: Base,
    }
    struct Other;

    // Implements both interfaces.
    struct Both {
        readable: Readable,
        writable: Writable,
    }
    struct Readable;
    struct Writable;

    macro_rules! extends {
        ($derived:ty => $base:ty, $field:ident) => {
            impl Extends<$base> for $derived {
                fn as_base(&self) -> &$base {
                    &self.$field
                }
                fn as_base_mut(&mut self) -> &mut $base {
                    &mut self.$field
                }
            }
        };
    }

    extends!(Derived => Base, base);
    extends!(Both => Readable, readable);
    extends!(Both => Writable, writable);
    extends!(LoggingDispatcher => Dispatcher, inner);

    fn ty<T: 'static>() -> TypeDescriptor {
        TypeDescriptor::of::<T>()
    }

    fn resolved(table: &HandlerTable, receiver: TypeDescriptor, args: &[TypeDescriptor]) -> String {
        resolve_handler(table, receiver, "handle", args)
            .unwrap()
            .map(|handler| handler.to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_most_specific_selection() {
        let table = HandlerTable::builder()
            .derive::<Derived, Base>()
            .handler("handle", |_: &mut Dispatcher, _: &Base| "base")
            .handler("handle", |_: &mut Dispatcher, _: &Derived| "derived")
            .build()
            .unwrap();

        assert_eq!(resolved(&table, ty::<Dispatcher>(), &[ty::<Derived>()]), "Dispatcher::handle(Derived)");
        assert_eq!(resolved(&table, ty::<Dispatcher>(), &[ty::<Base>()]), "Dispatcher::handle(Base)");
    }

    #[test]
    fn test_fallback_selection() {
        let table = HandlerTable::builder()
            .derive::<Derived, Base>()
            .handler("handle", |_: &mut Dispatcher, _: &Derived| "derived")
            .fallback("handle", |_: &mut Dispatcher, _: &dyn Any| "object")
            .build()
            .unwrap();

        assert_eq!(resolved(&table, ty::<Dispatcher>(), &[ty::<Other>()]), "Dispatcher::handle(Any)");
        assert_eq!(resolved(&table, ty::<Dispatcher>(), &[ty::<Derived>()]), "Dispatcher::handle(Derived)");
    }

    #[test]
    fn test_not_found_is_none() {
        let table = HandlerTable::builder()
            .handler("handle", |_: &mut Dispatcher, _: &Base| ())
            .build()
            .unwrap();

        let found = resolve_handler(&table, ty::<Dispatcher>(), "handle", &[ty::<Other>()]).unwrap();
        assert!(found.is_none());
        let found = resolve_handler(&table, ty::<Dispatcher>(), "other", &[ty::<Base>()]).unwrap();
        assert!(found.is_none());
        // Arity must match exactly.
        let found = resolve_handler(&table, ty::<Dispatcher>(), "handle", &[ty::<Base>(), ty::<Base>()]).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_unrelated_interfaces_are_ambiguous() {
        let table = HandlerTable::builder()
            .derive::<Both, Readable>()
            .derive::<Both, Writable>()
            .handler("handle", |_: &mut Dispatcher, _: &Readable| ())
            .handler("handle", |_: &mut Dispatcher, _: &Writable| ())
            .build()
            .unwrap();

        let err = resolve_handler(&table, ty::<Dispatcher>(), "handle", &[ty::<Both>()]).unwrap_err();
        match err {
            ResolveError::Ambiguous { candidates, .. } => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates.contains(&"Dispatcher::handle(Readable)".to_string()));
                assert!(candidates.contains(&"Dispatcher::handle(Writable)".to_string()));
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_overload_breaks_interface_tie() {
        let table = HandlerTable::builder()
            .derive::<Both, Readable>()
            .derive::<Both, Writable>()
            .handler("handle", |_: &mut Dispatcher, _: &Readable| ())
            .handler("handle", |_: &mut Dispatcher, _: &Writable| ())
            .handler("handle", |_: &mut Dispatcher, _: &Both| ())
            .build()
            .unwrap();

        assert_eq!(resolved(&table, ty::<Dispatcher>(), &[ty::<Both>()]), "Dispatcher::handle(Both)");
    }

    #[test]
    fn test_multi_argument_specificity() {
        let table = HandlerTable::builder()
            .derive::<Derived, Base>()
            .handler("handle", |_: &mut Dispatcher, _: &Base, _: &Derived| ())
            .handler("handle", |_: &mut Dispatcher, _: &Derived, _: &Base| ())
            .handler("handle", |_: &mut Dispatcher, _: &Base, _: &Base| ())
            .build()
            .unwrap();

        assert_eq!(
            resolved(&table, ty::<Dispatcher>(), &[ty::<Derived>(), ty::<Base>()]),
            "Dispatcher::handle(Derived, Base)"
        );
        assert_eq!(
            resolved(&table, ty::<Dispatcher>(), &[ty::<Base>(), ty::<Base>()]),
            "Dispatcher::handle(Base, Base)"
        );
        // (Derived, Derived) fits both mixed overloads equally well.
        let err = resolve_handler(&table, ty::<Dispatcher>(), "handle", &[ty::<Derived>(), ty::<Derived>()]);
        assert!(matches!(err, Err(ResolveError::Ambiguous { .. })));
    }

    #[test]
    fn test_inherited_and_overridden_handlers() {
        let table = HandlerTable::builder()
            .derive::<LoggingDispatcher, Dispatcher>()
            .handler("handle", |_: &mut Dispatcher, _: &Base| "base")
            .handler("handle", |_: &mut Dispatcher, _: &Other| "other")
            .handler("handle", |_: &mut LoggingDispatcher, _: &Other| "logged other")
            .build()
            .unwrap();

        // Inherited from the base receiver.
        assert_eq!(
            resolved(&table, ty::<LoggingDispatcher>(), &[ty::<Base>()]),
            "Dispatcher::handle(Base)"
        );
        // Same parameters: the more derived receiver wins.
        assert_eq!(
            resolved(&table, ty::<LoggingDispatcher>(), &[ty::<Other>()]),
            "LoggingDispatcher::handle(Other)"
        );
        // Handlers of a subtype are invisible to the base receiver.
        assert_eq!(
            resolved(&table, ty::<Dispatcher>(), &[ty::<Other>()]),
            "Dispatcher::handle(Other)"
        );
    }
}
