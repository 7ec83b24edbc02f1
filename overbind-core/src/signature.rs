//! # Dispatch Signatures
//!
//! A [`Signature`] is the cache identity of one dispatch request: the
//! receiver type, the ordered argument types and an optional routing key,
//! folded into a single `u64`.
//!
//! Folding is order sensitive because overload resolution is. Distinct
//! requests collide only with negligible probability; collisions are not
//! detected.

use crate::descriptor::TypeDescriptor;
use rustc_hash::FxHasher;
use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// Odd mixing constant used by [`hash_combine`] (64-bit golden ratio).
pub const SIGNATURE_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// Identity of a `(receiver, arguments, routing key)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(u64);

impl Signature {
    /// Wrap a raw value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Fold `hash` into `seed`.
///
/// Not commutative: `combine(combine(s, a), b)` and `combine(combine(s, b), a)`
/// differ for `a != b`.
#[inline]
pub const fn hash_combine(seed: u64, hash: u64) -> u64 {
    seed ^ hash
        .wrapping_add(SIGNATURE_MIX)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

/// Compute the signature of a dispatch request.
///
/// Pure and allocation free.
pub fn compute_signature(
    receiver: TypeDescriptor,
    arguments: &[TypeDescriptor],
    routing_key: Option<&str>,
) -> Signature {
    let mut seed = receiver.identity_hash();
    for argument in arguments {
        seed = hash_combine(seed, argument.identity_hash());
    }
    if let Some(key) = routing_key {
        seed = hash_combine(seed, string_hash(key));
    }
    Signature(seed)
}

fn string_hash(key: &str) -> u64 {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dispatcher;
    struct AddOp;
    struct RemoveOp;

    fn ty<T: 'static>() -> TypeDescriptor {
        TypeDescriptor::of::<T>()
    }

    #[test]
    fn test_deterministic() {
        let args = [ty::<AddOp>(), ty::<RemoveOp>()];
        let first = compute_signature(ty::<Dispatcher>(), &args, Some("On"));
        for _ in 0..16 {
            assert_eq!(compute_signature(ty::<Dispatcher>(), &args, Some("On")), first);
        }
    }

    #[test]
    fn test_order_sensitive() {
        let forward = compute_signature(ty::<Dispatcher>(), &[ty::<AddOp>(), ty::<RemoveOp>()], None);
        let reverse = compute_signature(ty::<Dispatcher>(), &[ty::<RemoveOp>(), ty::<AddOp>()], None);
        assert_ne!(forward, reverse);
    }

    #[test]
    fn test_every_component_contributes() {
        let base = compute_signature(ty::<Dispatcher>(), &[ty::<AddOp>()], None);

        assert_ne!(base, compute_signature(ty::<AddOp>(), &[ty::<AddOp>()], None));
        assert_ne!(base, compute_signature(ty::<Dispatcher>(), &[ty::<RemoveOp>()], None));
        assert_ne!(base, compute_signature(ty::<Dispatcher>(), &[], None));
        assert_ne!(base, compute_signature(ty::<Dispatcher>(), &[ty::<AddOp>()], Some("Pre")));
    }

    #[test]
    fn test_routing_keys_isolated() {
        let args = [ty::<AddOp>()];
        let pre = compute_signature(ty::<Dispatcher>(), &args, Some("Pre"));
        let post = compute_signature(ty::<Dispatcher>(), &args, Some("Post"));
        assert_ne!(pre, post);
    }

    #[test]
    fn test_hash_combine_not_commutative() {
        let a = 0x1234;
        let b = 0xabcd;
        assert_ne!(hash_combine(hash_combine(0, a), b), hash_combine(hash_combine(0, b), a));
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(Signature::from_raw(0xff).to_string(), "00000000000000ff");
    }
}
