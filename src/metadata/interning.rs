//! Value interning for the unresolved model.
//!
//! The pool canonicalizes value-shaped records so that structurally identical subtrees share
//! storage: two equal type references loaded from different signatures end up as the same
//! `Arc`. The pool is mutated only during eager loading; lazy materialization runs with the
//! [`InternPool::dummy`] pass-through because the winning-writer discipline of the lazy slots
//! makes a shared mutable pool unnecessary there.

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use crate::metadata::unresolved::{
    AttributeList, ConstantValue, TypeRefList, UnresolvedAttributeRc, UnresolvedTypeRc,
};

type InternMap<T> = DashMap<T, T, FxBuildHasher>;

#[derive(Debug, Default)]
struct PoolInner {
    strings: InternMap<Arc<str>>,
    types: InternMap<UnresolvedTypeRc>,
    type_lists: InternMap<TypeRefList>,
    attributes: InternMap<UnresolvedAttributeRc>,
    attribute_lists: InternMap<AttributeList>,
    constants: InternMap<Arc<ConstantValue>>,
}

/// The interning pool.
///
/// For any value `V` of an interned kind, `intern(V)` returns a canonical `W` equal to `V`
/// such that identical `W`s are physically shared. Interning is idempotent: interning a
/// canonical value returns it unchanged.
#[derive(Debug, Default)]
pub struct InternPool {
    inner: Option<PoolInner>,
}

fn intern_in<T>(map: &InternMap<T>, value: T) -> T
where
    T: Clone + Eq + std::hash::Hash,
{
    map.entry(value.clone()).or_insert(value).value().clone()
}

impl InternPool {
    /// Creates a deduplicating pool
    #[must_use]
    pub fn new() -> Self {
        InternPool {
            inner: Some(PoolInner::default()),
        }
    }

    /// Creates a pass-through pool that returns every input unchanged.
    ///
    /// Used during lazy materialization, where the real pool's maps would be written from
    /// multiple threads without the loader's single-writer guarantee.
    #[must_use]
    pub fn dummy() -> Self {
        InternPool { inner: None }
    }

    /// Whether this pool deduplicates (false for the dummy pool)
    #[must_use]
    pub fn is_interning(&self) -> bool {
        self.inner.is_some()
    }

    /// Interns a string
    #[must_use]
    pub fn intern_str(&self, value: &str) -> Arc<str> {
        match &self.inner {
            Some(pool) => {
                if let Some(existing) = pool.strings.get(value) {
                    return existing.value().clone();
                }
                intern_in(&pool.strings, Arc::from(value))
            }
            None => Arc::from(value),
        }
    }

    /// Interns a type reference
    #[must_use]
    pub fn intern_type(&self, value: UnresolvedTypeRc) -> UnresolvedTypeRc {
        match &self.inner {
            Some(pool) => intern_in(&pool.types, value),
            None => value,
        }
    }

    /// Interns a list of type references
    #[must_use]
    pub fn intern_type_list(&self, value: Vec<UnresolvedTypeRc>) -> TypeRefList {
        let list: TypeRefList = value.into();
        match &self.inner {
            Some(pool) => intern_in(&pool.type_lists, list),
            None => list,
        }
    }

    /// Interns an attribute record
    #[must_use]
    pub fn intern_attribute(&self, value: UnresolvedAttributeRc) -> UnresolvedAttributeRc {
        match &self.inner {
            Some(pool) => intern_in(&pool.attributes, value),
            None => value,
        }
    }

    /// Interns a list of attribute records
    #[must_use]
    pub fn intern_attribute_list(&self, value: Vec<UnresolvedAttributeRc>) -> AttributeList {
        let list: AttributeList = value.into();
        match &self.inner {
            Some(pool) => intern_in(&pool.attribute_lists, list),
            None => list,
        }
    }

    /// Interns a constant value
    #[must_use]
    pub fn intern_constant(&self, value: Arc<ConstantValue>) -> Arc<ConstantValue> {
        match &self.inner {
            Some(pool) => intern_in(&pool.constants, value),
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::unresolved::{ConstPayload, PrimitiveKind, UnresolvedType};

    #[test]
    fn test_intern_str_dedupes() {
        let pool = InternPool::new();
        let a = pool.intern_str("System");
        let b = pool.intern_str("System");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_intern_type_dedupes_structurally() {
        let pool = InternPool::new();
        let a = pool.intern_type(Arc::new(UnresolvedType::Pointer(
            PrimitiveKind::Int32.reference(),
        )));
        let b = pool.intern_type(Arc::new(UnresolvedType::Pointer(
            PrimitiveKind::Int32.reference(),
        )));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_intern_is_idempotent() {
        let pool = InternPool::new();
        let canonical = pool.intern_type(Arc::new(UnresolvedType::ByRef(
            PrimitiveKind::Boolean.reference(),
        )));
        let again = pool.intern_type(canonical.clone());
        assert!(Arc::ptr_eq(&canonical, &again));
    }

    #[test]
    fn test_dummy_pool_passes_through() {
        let pool = InternPool::dummy();
        assert!(!pool.is_interning());
        let a = pool.intern_type(Arc::new(UnresolvedType::Pointer(
            PrimitiveKind::Int32.reference(),
        )));
        let b = pool.intern_type(Arc::new(UnresolvedType::Pointer(
            PrimitiveKind::Int32.reference(),
        )));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_intern_constant() {
        let pool = InternPool::new();
        let a = pool.intern_constant(Arc::new(ConstantValue::new(
            PrimitiveKind::Double.reference(),
            ConstPayload::R8(1.25),
        )));
        let b = pool.intern_constant(Arc::new(ConstantValue::new(
            PrimitiveKind::Double.reference(),
            ConstPayload::R8(1.25),
        )));
        assert!(Arc::ptr_eq(&a, &b));
    }
}
