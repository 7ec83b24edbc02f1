//! # Type Hierarchy
//!
//! Rust has no runtime subtyping, so assignability is declared explicitly:
//! a type that embeds or wraps another implements [`Extends`] and is
//! registered with [`TypeHierarchy::derive`]. The hierarchy then answers
//! "is `A` assignable to `B`" and knows how to narrow an `A` value into a `B`
//! view.
//!
//! A type may extend several bases, which is how interface-like overlap (and
//! therefore ambiguous overloads) can arise.

use crate::{descriptor::TypeDescriptor, error::ConfigError};
use rustc_hash::{FxHashMap, FxHashSet};
use std::{
    any::{Any, TypeId},
    collections::VecDeque,
};

/// Declares that `Self` can be viewed as `Base`.
///
/// # Example
///
/// ```rust,ignore
/// struct Shape { id: u32 }
/// struct Circle { shape: Shape, radius: f64 }
///
/// impl Extends<Shape> for Circle {
///     fn as_base(&self) -> &Shape { &self.shape }
///     fn as_base_mut(&mut self) -> &mut Shape { &mut self.shape }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not extend `{Base}`",
    label = "missing `Extends<{Base}>` implementation",
    note = "Implement `Extends<{Base}>` to expose the base view of `{Self}`."
)]
pub trait Extends<Base: Any>: Any {
    /// Borrow the base view.
    fn as_base(&self) -> &Base;

    /// Mutably borrow the base view.
    fn as_base_mut(&mut self) -> &mut Base;
}

type UpcastRef = fn(&dyn Any) -> Option<&dyn Any>;
type UpcastMut = fn(&mut dyn Any) -> Option<&mut dyn Any>;

fn upcast_ref<D: Extends<B>, B: Any>(value: &dyn Any) -> Option<&dyn Any> {
    value
        .downcast_ref::<D>()
        .map(|derived| derived.as_base() as &dyn Any)
}

fn upcast_mut<D: Extends<B>, B: Any>(value: &mut dyn Any) -> Option<&mut dyn Any> {
    value
        .downcast_mut::<D>()
        .map(|derived| derived.as_base_mut() as &mut dyn Any)
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    base: TypeDescriptor,
    up: UpcastRef,
    up_mut: UpcastMut,
}

/// A precomputed chain of base projections from one type to an ancestor.
///
/// An empty path is the identity.
#[derive(Debug, Clone, Default)]
pub struct UpcastPath {
    steps: Vec<(UpcastRef, UpcastMut)>,
}

impl UpcastPath {
    /// Number of projections.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether this path is the identity.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Project `value` along the path.
    ///
    /// Returns `None` if `value` is not of the path's starting type.
    pub fn apply<'a>(&self, value: &'a dyn Any) -> Option<&'a dyn Any> {
        self.steps.iter().try_fold(value, |value, (up, _)| up(value))
    }

    /// Mutable counterpart of [`UpcastPath::apply`].
    pub fn apply_mut<'a>(&self, value: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        self.steps
            .iter()
            .try_fold(value, |value, (_, up_mut)| up_mut(value))
    }
}

/// Registered types and their declared bases.
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    known: FxHashMap<TypeId, TypeDescriptor>,
    bases: FxHashMap<TypeDescriptor, Vec<Edge>>,
}

impl TypeHierarchy {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `T` known by name, without declaring any base.
    pub fn register<T: Any>(&mut self) -> TypeDescriptor {
        let descriptor = TypeDescriptor::of::<T>();
        self.record(descriptor);
        descriptor
    }

    /// Make a descriptor known by name.
    pub fn record(&mut self, descriptor: TypeDescriptor) {
        self.known.entry(descriptor.type_id()).or_insert(descriptor);
    }

    /// Declare `D` as a subtype of `B`.
    ///
    /// Registering the same edge twice is a no-op. An edge that would close a
    /// cycle is rejected.
    pub fn derive<D: Extends<B>, B: Any>(&mut self) -> Result<(), ConfigError> {
        let derived = self.register::<D>();
        let base = self.register::<B>();

        if derived == base || self.reaches(base, derived) {
            return Err(ConfigError::CyclicHierarchy { derived, base });
        }

        let edges = self.bases.entry(derived).or_default();
        if !edges.iter().any(|edge| edge.base == base) {
            edges.push(Edge {
                base,
                up: upcast_ref::<D, B>,
                up_mut: upcast_mut::<D, B>,
            });
        }
        Ok(())
    }

    /// Number of known types.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// Whether no type is known.
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Look up a descriptor by identity, falling back to an unnamed one.
    pub fn descriptor(&self, id: TypeId) -> TypeDescriptor {
        self.known
            .get(&id)
            .copied()
            .unwrap_or_else(|| TypeDescriptor::unregistered(id))
    }

    /// Descriptor of a live value's runtime type.
    pub fn descriptor_of(&self, value: &dyn Any) -> TypeDescriptor {
        self.descriptor(value.type_id())
    }

    /// Direct bases of `ty`, in declaration order.
    pub fn bases(&self, ty: TypeDescriptor) -> impl Iterator<Item = TypeDescriptor> + '_ {
        self.edges(ty).iter().map(|edge| edge.base)
    }

    /// All ancestors of `ty`, breadth first, excluding `ty` itself.
    pub fn ancestors(&self, ty: TypeDescriptor) -> Vec<TypeDescriptor> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([ty]);
        seen.insert(ty);

        while let Some(current) = queue.pop_front() {
            for base in self.bases(current) {
                if seen.insert(base) {
                    order.push(base);
                    queue.push_back(base);
                }
            }
        }
        order
    }

    /// Every known type strictly assignable to `ty`, in no particular order.
    ///
    /// Empty for [`TypeDescriptor::object`].
    pub fn subtypes(&self, ty: TypeDescriptor) -> Vec<TypeDescriptor> {
        if ty.is_object() {
            return Vec::new();
        }
        self.known
            .values()
            .copied()
            .filter(|known| *known != ty && self.reaches(*known, ty))
            .collect()
    }

    /// Whether a `from` value may be passed where `to` is declared.
    pub fn is_assignable(&self, from: TypeDescriptor, to: TypeDescriptor) -> bool {
        to.is_object() || from == to || self.reaches(from, to)
    }

    /// Whether `sub` is assignable to `sup` and distinct from it.
    pub fn is_strict_subtype(&self, sub: TypeDescriptor, sup: TypeDescriptor) -> bool {
        sub != sup && self.is_assignable(sub, sup)
    }

    /// The projections narrowing a `from` value to its `to` view.
    ///
    /// The path to [`TypeDescriptor::object`] is the identity: such parameters
    /// take the value as-is.
    pub fn upcast_path(&self, from: TypeDescriptor, to: TypeDescriptor) -> Option<UpcastPath> {
        if from == to || to.is_object() {
            return Some(UpcastPath::default());
        }

        let mut came_from: FxHashMap<TypeDescriptor, (TypeDescriptor, Edge)> =
            FxHashMap::default();
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            for edge in self.edges(current) {
                if edge.base == from || came_from.contains_key(&edge.base) {
                    continue;
                }
                came_from.insert(edge.base, (current, *edge));
                if edge.base == to {
                    return Some(Self::unwind(&came_from, from, to));
                }
                queue.push_back(edge.base);
            }
        }
        None
    }

    fn unwind(
        came_from: &FxHashMap<TypeDescriptor, (TypeDescriptor, Edge)>,
        from: TypeDescriptor,
        to: TypeDescriptor,
    ) -> UpcastPath {
        let mut steps = Vec::new();
        let mut cursor = to;
        while cursor != from {
            let Some((previous, edge)) = came_from.get(&cursor) else {
                break;
            };
            steps.push((edge.up, edge.up_mut));
            cursor = *previous;
        }
        steps.reverse();
        UpcastPath { steps }
    }

    fn reaches(&self, from: TypeDescriptor, to: TypeDescriptor) -> bool {
        self.ancestors(from).contains(&to)
    }

    fn edges(&self, ty: TypeDescriptor) -> &[Edge] {
        self.bases.get(&ty).map(Vec::as_slice).unwrap_or(&[])
    }
}
