//! # Candidate Handlers
//!
//! A [`CandidateHandler`] is one member of an overload set: a name, the
//! receiver type it is declared on, its ordered parameter types, and a
//! type-erased callable built once at registration time.
//!
//! Typed closures of arity 0 to 4 are accepted through [`IntoHandler`]:
//!
//! ```rust,ignore
//! CandidateHandler::new("handle", |d: &mut Dispatcher, op: &AddOp| d.add(op));
//! ```
//!
//! The erased callable expects its receiver and arguments to already have the
//! declared types; narrowing from resolved types is the thunk's job.

use crate::{descriptor::TypeDescriptor, error::InvokeError};
use std::{any::Any, fmt};

/// Boxed result of a handler call. Void handlers produce `()`.
pub type Value = Box<dyn Any + Send>;

type ErasedCall = dyn Fn(&mut dyn Any, &[&dyn Any]) -> Result<Value, InvokeError> + Send + Sync;

/// Conversion of a typed closure into an erased handler body.
///
/// `Args` is a marker of the form `fn(&A0, &A1, ..)` and is inferred from
/// the closure's parameter annotations.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid overload handler",
    label = "expected `Fn(&mut Receiver, &A0, ..) -> Out` with at most 4 arguments",
    note = "Annotate the closure parameters, e.g. `|d: &mut Dispatcher, op: &AddOp| ..`."
)]
pub trait IntoHandler<R, Args, Out>: Send + Sync + 'static {
    /// Declared parameter types, in order.
    fn parameters() -> Vec<TypeDescriptor>;

    /// Erase the closure.
    fn into_call(self) -> Box<ErasedCall>;
}

fn narrow_receiver<R: Any>(receiver: &mut dyn Any) -> Result<&mut R, InvokeError> {
    receiver
        .downcast_mut::<R>()
        .ok_or_else(|| InvokeError::ReceiverMismatch {
            expected: TypeDescriptor::of::<R>(),
        })
}

fn narrow_argument<'a, T: Any>(args: &[&'a dyn Any], position: usize) -> Result<&'a T, InvokeError> {
    args.get(position)
        .and_then(|arg| arg.downcast_ref::<T>())
        .ok_or_else(|| InvokeError::ArgumentMismatch {
            position,
            expected: TypeDescriptor::of::<T>(),
        })
}

macro_rules! impl_into_handler {
    ($($param:ident => $position:tt),*) => {
        impl<F, R, Out, $($param,)*> IntoHandler<R, fn($(&$param),*), Out> for F
        where
            F: Fn(&mut R, $(&$param),*) -> Out + Send + Sync + 'static,
            R: Any,
            Out: Any + Send,
            $($param: Any,)*
        {
            fn parameters() -> Vec<TypeDescriptor> {
                vec![$(TypeDescriptor::of::<$param>()),*]
            }

            #[allow(unused_variables)]
            fn into_call(self) -> Box<ErasedCall> {
                Box::new(
                    move |receiver: &mut dyn Any, args: &[&dyn Any]| -> Result<Value, InvokeError> {
                        let receiver = narrow_receiver::<R>(receiver)?;
                        let output = (self)(receiver, $(narrow_argument::<$param>(args, $position)?),*);
                        Ok(Box::new(output))
                    },
                )
            }
        }
    };
}

impl_into_handler!();
impl_into_handler!(A0 => 0);
impl_into_handler!(A0 => 0, A1 => 1);
impl_into_handler!(A0 => 0, A1 => 1, A2 => 2);
impl_into_handler!(A0 => 0, A1 => 1, A2 => 2, A3 => 3);

/// One member of an overload set.
pub struct CandidateHandler {
    name: String,
    receiver: TypeDescriptor,
    parameters: Vec<TypeDescriptor>,
    call: Box<ErasedCall>,
}

impl CandidateHandler {
    /// Build a handler from a typed closure.
    pub fn new<R, Args, Out, F>(name: impl Into<String>, handler: F) -> Self
    where
        R: Any,
        F: IntoHandler<R, Args, Out>,
    {
        Self {
            name: name.into(),
            receiver: TypeDescriptor::of::<R>(),
            parameters: F::parameters(),
            call: handler.into_call(),
        }
    }

    /// Build a one-argument handler accepting any value.
    ///
    /// It is chosen only when no more specific overload matches.
    pub fn fallback<R, Out, F>(name: impl Into<String>, handler: F) -> Self
    where
        R: Any,
        Out: Any + Send,
        F: Fn(&mut R, &dyn Any) -> Out + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            receiver: TypeDescriptor::of::<R>(),
            parameters: vec![TypeDescriptor::object()],
            call: Box::new(
                move |receiver: &mut dyn Any, args: &[&dyn Any]| -> Result<Value, InvokeError> {
                    let receiver = narrow_receiver::<R>(receiver)?;
                    let Some(arg) = args.first() else {
                        return Err(InvokeError::ArityMismatch {
                            expected: 1,
                            found: args.len(),
                        });
                    };
                    Ok(Box::new(handler(receiver, *arg)))
                },
            ),
        }
    }

    /// Build a handler with explicit parameter descriptors.
    ///
    /// The closure receives the arguments already narrowed to `parameters`
    /// and downcasts them itself. Use [`TypeDescriptor::object`] for
    /// positions that accept anything.
    pub fn erased<R, Out, F>(
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = TypeDescriptor>,
        handler: F,
    ) -> Self
    where
        R: Any,
        Out: Any + Send,
        F: Fn(&mut R, &[&dyn Any]) -> Out + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            receiver: TypeDescriptor::of::<R>(),
            parameters: parameters.into_iter().collect(),
            call: Box::new(
                move |receiver: &mut dyn Any, args: &[&dyn Any]| -> Result<Value, InvokeError> {
                    let receiver = narrow_receiver::<R>(receiver)?;
                    Ok(Box::new(handler(receiver, args)))
                },
            ),
        }
    }

    /// Handler name shared by the overload set.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Receiver type the handler is declared on.
    pub fn receiver(&self) -> TypeDescriptor {
        self.receiver
    }

    /// Declared parameter types, in order.
    pub fn parameters(&self) -> &[TypeDescriptor] {
        &self.parameters
    }

    /// Number of parameters, receiver excluded.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Call the handler with values of exactly the declared types.
    pub fn call(&self, receiver: &mut dyn Any, args: &[&dyn Any]) -> Result<Value, InvokeError> {
        if args.len() != self.arity() {
            return Err(InvokeError::ArityMismatch {
                expected: self.arity(),
                found: args.len(),
            });
        }
        (self.call)(receiver, args)
    }
}

impl fmt::Display for CandidateHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}(", self.receiver, self.name)?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{parameter}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for CandidateHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateHandler")
            .field("name", &self.name)
            .field("receiver", &self.receiver)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
