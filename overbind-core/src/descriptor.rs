//! Runtime type identity.

use rustc_hash::FxHasher;
use std::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
};

const UNREGISTERED: &str = "<unregistered>";

/// An opaque, comparable identity for a `'static` Rust type.
///
/// Equality and hashing only look at the [`TypeId`]. The type name is carried
/// along for diagnostics and never takes part in identity.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
}

impl TypeDescriptor {
    /// Descriptor for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The maximally generic type. Every type is assignable to it.
    ///
    /// Handlers declaring this parameter type receive the argument as
    /// `&dyn Any`, untouched.
    pub fn object() -> Self {
        Self::of::<dyn Any>()
    }

    /// Descriptor for a type that was never registered anywhere.
    ///
    /// Only its identity is known; the name is a placeholder and messages
    /// render the [`TypeId`] instead.
    pub fn unregistered(id: TypeId) -> Self {
        Self {
            id,
            name: UNREGISTERED,
        }
    }

    /// Whether this descriptor was made by [`TypeDescriptor::unregistered`].
    pub fn is_unregistered(&self) -> bool {
        self.name == UNREGISTERED
    }

    /// Whether this is [`TypeDescriptor::object`].
    pub fn is_object(&self) -> bool {
        self.id == TypeId::of::<dyn Any>()
    }

    /// The underlying [`TypeId`].
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, as reported by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    ///
    /// Generic types keep their full name since their parameters carry paths
    /// of their own.
    pub fn short_name(&self) -> &'static str {
        if self.name.contains('<') {
            return self.name;
        }
        self.name.rsplit("::").next().unwrap_or(self.name)
    }

    /// Stable 64-bit hash of the type identity.
    ///
    /// Deterministic for the lifetime of the process, not across builds.
    pub fn identity_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.id.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unregistered() {
            return write!(f, "<unregistered {:?}>", self.id);
        }
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unregistered() {
            return write!(f, "<unregistered {:?}>", self.id);
        }
        f.write_str(self.short_name())
    }
}

/// An ordered list of types, rendered as `A, B, C` in messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeList(pub Vec<TypeDescriptor>);

impl TypeList {
    /// The descriptors in order.
    pub fn as_slice(&self) -> &[TypeDescriptor] {
        &self.0
    }
}

impl From<&[TypeDescriptor]> for TypeList {
    fn from(types: &[TypeDescriptor]) -> Self {
        Self(types.to_vec())
    }
}

impl fmt::Display for TypeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty}")?;
        }
        Ok(())
    }
}
