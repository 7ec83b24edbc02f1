//! # Thunks
//!
//! A [`Thunk`] is the reusable, type-erased invocation path for one resolved
//! handler. Everything that depends on resolution (which handler, how each
//! value is narrowed to its declared type) is fixed when the thunk is built,
//! so calling it never searches the handler table or the type hierarchy.
//!
//! Thunks are immutable and cheap to clone; any number of threads may invoke
//! the same thunk concurrently.

use crate::{
    descriptor::TypeDescriptor,
    error::InvokeError,
    handler::{CandidateHandler, Value},
    hierarchy::UpcastPath,
};
use rustc_hash::FxHashMap;
use std::{
    any::{Any, TypeId},
    fmt,
    marker::PhantomData,
    sync::Arc,
};

/// Largest arity of any [`Shape`].
pub const MAX_ARITY: usize = 4;

mod sealed {
    pub trait Sealed {}
}

/// The call shape a resolver hands out: how many arguments its thunks take.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a thunk shape",
    note = "Use one of `Nullary`, `Unary`, `Binary`, `Ternary` or `Quaternary`."
)]
pub trait Shape: sealed::Sealed + Send + Sync + 'static {
    /// Number of arguments, receiver excluded.
    const ARITY: usize;
    /// Name used in diagnostics.
    const NAME: &'static str;
}

macro_rules! shapes {
    ($($(#[$doc:meta])* $name:ident = $arity:literal;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
            pub struct $name;

            impl sealed::Sealed for $name {}

            impl Shape for $name {
                const ARITY: usize = $arity;
                const NAME: &'static str = stringify!($name);
            }
        )*
    };
}

shapes! {
    /// Receiver only.
    Nullary = 0;
    /// Receiver and one argument.
    Unary = 1;
    /// Receiver and two arguments.
    Binary = 2;
    /// Receiver and three arguments.
    Ternary = 3;
    /// Receiver and four arguments.
    Quaternary = 4;
}

/// How one value is narrowed to the type its handler declares.
///
/// The path from the resolved type is the fast path. Values of a registered
/// subtype use the paths added with [`Narrowing::with_subtype`].
#[derive(Debug, Clone)]
pub struct Narrowing {
    declared: TypeDescriptor,
    resolved: TypeDescriptor,
    path: UpcastPath,
    subtypes: FxHashMap<TypeId, UpcastPath>,
}

impl Narrowing {
    /// A value resolved as `resolved`, projected along `path` to `declared`.
    pub fn new(declared: TypeDescriptor, resolved: TypeDescriptor, path: UpcastPath) -> Self {
        Self {
            declared,
            resolved,
            path,
            subtypes: FxHashMap::default(),
        }
    }

    /// Also accept values of `subtype`, projected along `path`.
    pub fn with_subtype(mut self, subtype: TypeDescriptor, path: UpcastPath) -> Self {
        self.subtypes.insert(subtype.type_id(), path);
        self
    }

    /// Type the handler declares.
    pub fn declared(&self) -> TypeDescriptor {
        self.declared
    }

    /// Type the value was resolved as.
    pub fn resolved(&self) -> TypeDescriptor {
        self.resolved
    }

    fn path_from(&self, actual: TypeId) -> Option<&UpcastPath> {
        if actual == self.resolved.type_id() {
            Some(&self.path)
        } else {
            self.subtypes.get(&actual)
        }
    }

    fn narrow<'a>(&self, value: &'a dyn Any) -> Option<&'a dyn Any> {
        let actual = value.type_id();
        if self.declared.is_object() || actual == self.declared.type_id() {
            Some(value)
        } else {
            self.path_from(actual)?.apply(value)
        }
    }

    fn narrow_mut<'a>(&self, value: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        let actual = (*value).type_id();
        if self.declared.is_object() || actual == self.declared.type_id() {
            Some(value)
        } else {
            self.path_from(actual)?.apply_mut(value)
        }
    }
}

struct Compiled {
    handler: Arc<CandidateHandler>,
    receiver: Narrowing,
    arguments: Vec<Narrowing>,
}

/// A compiled invocation path for one handler.
pub struct Thunk<S> {
    compiled: Arc<Compiled>,
    _shape: PhantomData<fn() -> S>,
}

impl<S: Shape> Thunk<S> {
    /// Assemble a thunk from precomputed narrowings.
    ///
    /// Callers are expected to have checked that `arguments` matches both the
    /// handler's arity and `S::ARITY`.
    pub fn from_parts(
        handler: Arc<CandidateHandler>,
        receiver: Narrowing,
        arguments: Vec<Narrowing>,
    ) -> Self {
        Self {
            compiled: Arc::new(Compiled {
                handler,
                receiver,
                arguments,
            }),
            _shape: PhantomData,
        }
    }

    /// The handler this thunk calls.
    pub fn handler(&self) -> &CandidateHandler {
        &self.compiled.handler
    }

    /// Whether two thunks share the same compiled body.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.compiled, &other.compiled)
    }

    /// Narrow the receiver and arguments, then call the handler.
    ///
    /// Values must have the types the thunk was resolved for, a registered
    /// subtype of them, or exactly the handler's declared types.
    pub fn invoke(&self, receiver: &mut dyn Any, args: &[&dyn Any]) -> Result<Value, InvokeError> {
        let compiled = &*self.compiled;
        if args.len() != S::ARITY || args.len() != compiled.arguments.len() {
            return Err(InvokeError::ArityMismatch {
                expected: compiled.arguments.len(),
                found: args.len(),
            });
        }

        let receiver = compiled.receiver.narrow_mut(receiver).ok_or(
            InvokeError::ReceiverMismatch {
                expected: compiled.receiver.resolved,
            },
        )?;

        let unit: &dyn Any = &();
        let mut narrowed = [unit; MAX_ARITY];
        for (position, (arg, narrowing)) in args.iter().zip(&compiled.arguments).enumerate() {
            narrowed[position] = narrowing
                .narrow(*arg)
                .ok_or(InvokeError::ArgumentMismatch {
                    position,
                    expected: narrowing.resolved,
                })?;
        }

        compiled.handler.call(receiver, &narrowed[..args.len()])
    }
}

impl Thunk<Nullary> {
    /// Invoke with no arguments.
    pub fn call(&self, receiver: &mut dyn Any) -> Result<Value, InvokeError> {
        self.invoke(receiver, &[])
    }
}

impl Thunk<Unary> {
    /// Invoke with one argument.
    pub fn call(&self, receiver: &mut dyn Any, a0: &dyn Any) -> Result<Value, InvokeError> {
        self.invoke(receiver, &[a0])
    }
}

impl Thunk<Binary> {
    /// Invoke with two arguments.
    pub fn call(&self, receiver: &mut dyn Any, a0: &dyn Any, a1: &dyn Any) -> Result<Value, InvokeError> {
        self.invoke(receiver, &[a0, a1])
    }
}

impl Thunk<Ternary> {
    /// Invoke with three arguments.
    pub fn call(
        &self,
        receiver: &mut dyn Any,
        a0: &dyn Any,
        a1: &dyn Any,
        a2: &dyn Any,
    ) -> Result<Value, InvokeError> {
        self.invoke(receiver, &[a0, a1, a2])
    }
}

impl Thunk<Quaternary> {
    /// Invoke with four arguments.
    pub fn call(
        &self,
        receiver: &mut dyn Any,
        a0: &dyn Any,
        a1: &dyn Any,
        a2: &dyn Any,
        a3: &dyn Any,
    ) -> Result<Value, InvokeError> {
        self.invoke(receiver, &[a0, a1, a2, a3])
    }
}

impl<S> Clone for Thunk<S> {
    fn clone(&self) -> Self {
        Self {
            compiled: Arc::clone(&self.compiled),
            _shape: PhantomData,
        }
    }
}

impl<S> fmt::Debug for Thunk<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk")
            .field("handler", &format_args!("{}", self.compiled.handler))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{Extends, TypeHierarchy};

    #[derive(Default)]
    struct Counter {
        total: u32,
    }

    #[derive(Default)]
    struct LoudCounter {
        counter: Counter,
    }

    impl Extends<Counter> for LoudCounter {
        fn as_base(&self) -> &Counter {
            &self.counter
        }
        fn as_base_mut(&mut self) -> &mut Counter {
            &mut self.counter
        }
    }

    fn ty<T: 'static>() -> TypeDescriptor {
        TypeDescriptor::of::<T>()
    }

    fn add_handler() -> Arc<CandidateHandler> {
        Arc::new(CandidateHandler::new("add", |c: &mut Counter, n: &u32| {
            c.total += n;
            c.total
        }))
    }

    fn add_thunk(hierarchy: &TypeHierarchy, receiver: TypeDescriptor) -> Thunk<Unary> {
        let path = hierarchy.upcast_path(receiver, ty::<Counter>()).unwrap();
        Thunk::from_parts(
            add_handler(),
            Narrowing::new(ty::<Counter>(), receiver, path),
            vec![Narrowing::new(ty::<u32>(), ty::<u32>(), UpcastPath::default())],
        )
    }

    #[test]
    fn test_invoke_exact_types() {
        let thunk = add_thunk(&TypeHierarchy::new(), ty::<Counter>());
        let mut counter = Counter::default();
        let out = thunk.call(&mut counter, &5_u32).unwrap();
        assert_eq!(*out.downcast::<u32>().unwrap(), 5);
        assert_eq!(counter.total, 5);
    }

    #[test]
    fn test_invoke_narrows_derived_receiver() {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.derive::<LoudCounter, Counter>().unwrap();
        let thunk = add_thunk(&hierarchy, ty::<LoudCounter>());

        let mut loud = LoudCounter::default();
        thunk.call(&mut loud, &2_u32).unwrap();
        thunk.call(&mut loud, &3_u32).unwrap();
        assert_eq!(loud.counter.total, 5);
    }

    #[test]
    fn test_invoke_accepts_registered_subtype() {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.derive::<LoudCounter, Counter>().unwrap();
        let upcast = hierarchy.upcast_path(ty::<LoudCounter>(), ty::<Counter>()).unwrap();

        let plain = add_thunk(&hierarchy, ty::<Counter>());
        let err = plain.call(&mut LoudCounter::default(), &1_u32).unwrap_err();
        assert!(matches!(err, InvokeError::ReceiverMismatch { .. }));

        let thunk: Thunk<Unary> = Thunk::from_parts(
            add_handler(),
            Narrowing::new(ty::<Counter>(), ty::<Counter>(), UpcastPath::default())
                .with_subtype(ty::<LoudCounter>(), upcast),
            vec![Narrowing::new(ty::<u32>(), ty::<u32>(), UpcastPath::default())],
        );
        let mut loud = LoudCounter::default();
        thunk.call(&mut loud, &4_u32).unwrap();
        assert_eq!(loud.counter.total, 4);
    }

    #[test]
    fn test_invoke_mismatches() {
        let thunk = add_thunk(&TypeHierarchy::new(), ty::<Counter>());
        let mut counter = Counter::default();

        let err = thunk.call(&mut counter, &"five").unwrap_err();
        assert!(matches!(err, InvokeError::ArgumentMismatch { position: 0, .. }));

        let err = thunk.call(&mut 0_u8, &5_u32).unwrap_err();
        assert!(matches!(err, InvokeError::ReceiverMismatch { .. }));

        let err = thunk.invoke(&mut counter, &[]).unwrap_err();
        assert!(matches!(err, InvokeError::ArityMismatch { expected: 1, found: 0 }));
    }

    #[test]
    fn test_clone_shares_body() {
        let thunk = add_thunk(&TypeHierarchy::new(), ty::<Counter>());
        let copy = thunk.clone();
        assert!(thunk.ptr_eq(&copy));
        assert_eq!(copy.handler().name(), "add");
    }

    #[test]
    fn test_thunk_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Thunk<Unary>>();
        assert_send_sync::<Thunk<Ternary>>();
    }

    #[test]
    fn test_shape_arity() {
        assert_eq!(Nullary::ARITY, 0);
        assert_eq!(Ternary::ARITY, 3);
        assert_eq!(Quaternary::ARITY, MAX_ARITY);
        assert_eq!(Binary::NAME, "Binary");
    }
}
