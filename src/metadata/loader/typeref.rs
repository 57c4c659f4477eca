//! Translation of source type signatures into unresolved type references.
//!
//! The walk keeps two cursors in step with the recursion:
//!
//! - `dynamic_index` is the position within the flattened pre-order of the type, advanced on
//!   entering a compound constructor (pointer, by-ref, array, each generic argument). When a
//!   `System.Object` leaf is reached, the current position selects the entry of the
//!   `DynamicAttribute` flag array that decides between `object` and `dynamic`.
//! - `tuple_index` is the read position within the `TupleElementNamesAttribute` array. A
//!   flattened tuple consumes one slot per element of its total cardinality, `TRest`
//!   chains included.

use std::sync::Arc;

use crate::metadata::{
    interning::InternPool,
    loader::LoaderCore,
    source,
    unresolved::{PrimitiveKind, TypeParameterOwner, TypeScope, UnresolvedType, UnresolvedTypeRc},
};

/// The `TRest` slot position in the `System.ValueTuple` encoding.
const REST_POSITION: usize = 8;

#[derive(Debug)]
enum DynamicFlags {
    /// `[Dynamic]` without arguments: every slot is dynamic
    All,
    /// `[Dynamic(new[] { ... })]`: per-slot flags; `None` entries and out-of-range reads
    /// count as dynamic, matching the attribute's defaulting behavior
    PerSlot(Vec<Option<bool>>),
}

/// The attribute-provider state threaded through a type translation.
#[derive(Debug, Default)]
pub(crate) struct TypeAnnotations {
    dynamic: Option<DynamicFlags>,
    tuple_names: Option<Vec<Option<Arc<str>>>>,
}

impl TypeAnnotations {
    /// Reads the `Dynamic` and `TupleElementNames` markers from an attribute provider
    pub(crate) fn from_attributes(pool: &InternPool, attrs: &[source::Attribute]) -> Self {
        let mut annotations = TypeAnnotations::default();
        for attr in attrs {
            if attr.is_type("System.Runtime.CompilerServices", "DynamicAttribute") {
                annotations.dynamic = Some(match attr.fixed_args.first() {
                    Some(source::AttrValue::Array(values)) => DynamicFlags::PerSlot(
                        values.iter().map(source::AttrValue::as_bool).collect(),
                    ),
                    _ => DynamicFlags::All,
                });
            } else if attr.is_type("System.Runtime.CompilerServices", "TupleElementNamesAttribute")
            {
                if let Some(source::AttrValue::Array(values)) = attr.fixed_args.first() {
                    annotations.tuple_names = Some(
                        values
                            .iter()
                            .map(|value| value.as_str().map(|s| pool.intern_str(s)))
                            .collect(),
                    );
                }
            }
        }
        annotations
    }

    /// No markers; used for annotation-free contexts such as forwarders
    pub(crate) fn none() -> Self {
        TypeAnnotations::default()
    }

    fn is_dynamic(&self, index: usize) -> bool {
        match &self.dynamic {
            Some(DynamicFlags::All) => true,
            Some(DynamicFlags::PerSlot(flags)) => flags.get(index).copied().flatten().unwrap_or(true),
            None => false,
        }
    }
}

/// The cursor pair of one type translation.
#[derive(Debug, Default)]
pub(crate) struct RefCursor {
    pub(crate) dynamic_index: usize,
    pub(crate) tuple_index: usize,
}

/// Splits the generic arity suffix off a metadata type name: `List`1` becomes `("List", 1)`.
pub(crate) fn split_arity(name: &str) -> (&str, u16) {
    match name.rfind('`') {
        Some(pos) => match name[pos + 1..].parse::<u16>() {
            Ok(arity) => (&name[..pos], arity),
            Err(_) => (name, 0),
        },
        None => (name, 0),
    }
}

fn value_tuple_open_name(open: &source::TypeSig) -> Option<(&str, &str)> {
    match open {
        source::TypeSig::Named(r) if r.parent.is_none() => Some((&r.namespace, &r.name)),
        source::TypeSig::Definition(def) => Some((&def.namespace, &def.name)),
        _ => None,
    }
}

/// Total cardinality of a value-tuple instantiation, following `TRest` chains.
///
/// Returns `None` when the instantiation is not tuple-compatible (wrong name, empty argument
/// list, or a `TRest` slot that is not itself a value tuple).
fn tuple_cardinality(open: &source::TypeSig, args: &[source::TypeSig]) -> Option<u32> {
    let (namespace, name) = value_tuple_open_name(open)?;
    if namespace != "System" || !name.starts_with("ValueTuple`") {
        return None;
    }
    match args.len() {
        n @ 1..=7 => Some(n as u32),
        8 => match &args[REST_POSITION - 1] {
            source::TypeSig::GenericInst {
                open: rest_open,
                args: rest_args,
            } => tuple_cardinality(rest_open, rest_args).map(|nested| nested + 7),
            _ => None,
        },
        _ => None,
    }
}

impl LoaderCore {
    /// Translates a source type into an unresolved reference, threading the cursors.
    ///
    /// `from_sig` is set when the type came from a signature or type specification, where the
    /// element-type encoding makes `is_value_type` on named references trustworthy.
    pub(crate) fn read_type(
        &self,
        ty: &source::TypeSig,
        annotations: &TypeAnnotations,
        cursor: &mut RefCursor,
        from_sig: bool,
    ) -> UnresolvedTypeRc {
        use source::TypeSig as S;
        match ty {
            S::Void => PrimitiveKind::Void.reference(),
            S::Boolean => PrimitiveKind::Boolean.reference(),
            S::Char => PrimitiveKind::Char.reference(),
            S::I1 => PrimitiveKind::SByte.reference(),
            S::U1 => PrimitiveKind::Byte.reference(),
            S::I2 => PrimitiveKind::Int16.reference(),
            S::U2 => PrimitiveKind::UInt16.reference(),
            S::I4 => PrimitiveKind::Int32.reference(),
            S::U4 => PrimitiveKind::UInt32.reference(),
            S::I8 => PrimitiveKind::Int64.reference(),
            S::U8 => PrimitiveKind::UInt64.reference(),
            S::R4 => PrimitiveKind::Single.reference(),
            S::R8 => PrimitiveKind::Double.reference(),
            S::I => PrimitiveKind::IntPtr.reference(),
            S::U => PrimitiveKind::UIntPtr.reference(),
            S::String => PrimitiveKind::String.reference(),
            S::Object => {
                if self.config.use_dynamic_type && annotations.is_dynamic(cursor.dynamic_index) {
                    UnresolvedType::dynamic()
                } else {
                    UnresolvedType::object()
                }
            }
            S::Ptr(element) => {
                cursor.dynamic_index += 1;
                let element = self.read_type(element, annotations, cursor, from_sig);
                self.pool
                    .intern_type(Arc::new(UnresolvedType::Pointer(element)))
            }
            S::ByRef(element) => {
                cursor.dynamic_index += 1;
                let element = self.read_type(element, annotations, cursor, from_sig);
                self.pool
                    .intern_type(Arc::new(UnresolvedType::ByRef(element)))
            }
            S::Array { element, rank } => {
                cursor.dynamic_index += 1;
                let element = self.read_type(element, annotations, cursor, from_sig);
                self.pool.intern_type(Arc::new(UnresolvedType::Array {
                    element,
                    rank: *rank,
                }))
            }
            S::Var(position) => self.pool.intern_type(Arc::new(UnresolvedType::TypeParameter {
                owner: TypeParameterOwner::Type,
                position: *position,
            })),
            S::MVar(position) => self.pool.intern_type(Arc::new(UnresolvedType::TypeParameter {
                owner: TypeParameterOwner::Method,
                position: *position,
            })),
            S::GenericInst { open, args } => {
                self.read_generic_instance(open, args, annotations, cursor, from_sig)
            }
            // Function pointers are unrepresentable in the unresolved model; a native
            // integer stands in for them.
            S::FnPtr => PrimitiveKind::IntPtr.reference(),
            S::ModReq { element, .. } | S::ModOpt { element, .. } | S::Pinned(element) => {
                self.read_type(element, annotations, cursor, from_sig)
            }
            S::Sentinel => UnresolvedType::arglist(),
            S::Definition(def) => self
                .pool
                .intern_type(Arc::new(UnresolvedType::Definition(def.token))),
            S::Named(name) => self.read_named(name, from_sig),
        }
    }

    /// Translates a type in an annotation-free context.
    pub(crate) fn read_plain_type(&self, ty: &source::TypeSig) -> UnresolvedTypeRc {
        self.read_type(
            ty,
            &TypeAnnotations::none(),
            &mut RefCursor::default(),
            ty.is_type_spec(),
        )
    }

    /// Translates a signature-sourced type in an annotation-free context.
    pub(crate) fn read_sig_type(&self, ty: &source::TypeSig) -> UnresolvedTypeRc {
        self.read_type(ty, &TypeAnnotations::none(), &mut RefCursor::default(), true)
    }

    /// Translates a type using the given attribute provider.
    pub(crate) fn read_annotated_type(
        &self,
        ty: &source::TypeSig,
        attrs: &[source::Attribute],
        from_sig: bool,
    ) -> UnresolvedTypeRc {
        let annotations = TypeAnnotations::from_attributes(&self.pool, attrs);
        self.read_type(ty, &annotations, &mut RefCursor::default(), from_sig)
    }

    fn read_generic_instance(
        &self,
        open: &source::TypeSig,
        args: &[source::TypeSig],
        annotations: &TypeAnnotations,
        cursor: &mut RefCursor,
        from_sig: bool,
    ) -> UnresolvedTypeRc {
        if self.config.use_tuple_types {
            if let Some(cardinality) = tuple_cardinality(open, args) {
                if cardinality >= 2 {
                    return self.read_tuple(args, cardinality, annotations, cursor, from_sig);
                }
                // A 1-tuple has no surface syntax; it collapses to its single element but
                // still consumes its name slot.
                cursor.tuple_index += cardinality as usize;
                cursor.dynamic_index += 1;
                return self.read_type(&args[0], annotations, cursor, from_sig);
            }
        }
        let open_ref = self.read_type(open, annotations, cursor, from_sig);
        let mut arg_refs = Vec::with_capacity(args.len());
        for arg in args {
            cursor.dynamic_index += 1;
            arg_refs.push(self.read_type(arg, annotations, cursor, from_sig));
        }
        self.pool
            .intern_type(Arc::new(UnresolvedType::GenericInstance {
                open: open_ref,
                args: self.pool.intern_type_list(arg_refs),
            }))
    }

    fn read_tuple(
        &self,
        args: &[source::TypeSig],
        cardinality: u32,
        annotations: &TypeAnnotations,
        cursor: &mut RefCursor,
        from_sig: bool,
    ) -> UnresolvedTypeRc {
        let cardinality = cardinality as usize;

        let mut names: Vec<Option<Arc<str>>> = vec![None; cardinality];
        if let Some(all_names) = &annotations.tuple_names {
            for (i, slot) in names.iter_mut().enumerate() {
                if let Some(Some(name)) = all_names.get(cursor.tuple_index + i) {
                    *slot = Some(name.clone());
                }
            }
        }
        cursor.tuple_index += cardinality;

        let mut elements = Vec::with_capacity(cardinality);
        let mut level_args = args;
        loop {
            let plain = level_args.len().min(REST_POSITION - 1);
            for arg in &level_args[..plain] {
                cursor.dynamic_index += 1;
                elements.push(self.read_type(arg, annotations, cursor, from_sig));
            }
            if level_args.len() != REST_POSITION {
                break;
            }
            cursor.dynamic_index += 1;
            if let source::TypeSig::GenericInst {
                open: rest_open,
                args: rest_args,
            } = &level_args[REST_POSITION - 1]
            {
                // The nested levels' slots are already part of the total cardinality
                // consumed above.
                if tuple_cardinality(rest_open, rest_args).is_some() {
                    level_args = rest_args;
                    continue;
                }
            }
            debug_assert!(false, "TRest argument is not a value tuple");
            break;
        }
        debug_assert_eq!(elements.len(), cardinality);

        self.pool.intern_type(Arc::new(UnresolvedType::Tuple {
            elements: self.pool.intern_type_list(elements),
            names: names.into(),
        }))
    }

    fn read_named(&self, name: &source::TypeRef, from_sig: bool) -> UnresolvedTypeRc {
        let is_reference_type = if from_sig {
            Some(!name.is_value_type)
        } else {
            None
        };
        self.read_named_with(name, is_reference_type)
    }

    fn read_named_with(
        &self,
        name: &source::TypeRef,
        is_reference_type: Option<bool>,
    ) -> UnresolvedTypeRc {
        let (short, arity) = split_arity(&name.name);
        let node = match &name.parent {
            Some(parent) => UnresolvedType::Nested {
                declaring: self.read_named_with(parent, None),
                name: self.pool.intern_str(short),
                arity,
                is_reference_type,
            },
            None => UnresolvedType::Named {
                scope: self.read_scope(&name.scope),
                namespace: self.pool.intern_str(&name.namespace),
                name: self.pool.intern_str(short),
                arity,
                is_reference_type,
            },
        };
        self.pool.intern_type(Arc::new(node))
    }

    pub(crate) fn read_scope(&self, scope: &source::Scope) -> TypeScope {
        match scope {
            source::Scope::CurrentModule => TypeScope::CurrentAssembly,
            source::Scope::AssemblyRef(name) | source::Scope::ModuleRef(name) => {
                TypeScope::Assembly(self.pool.intern_str(name))
            }
        }
    }

    /// A reference to a well-known BCL type, used for synthesized attributes and constants.
    pub(crate) fn known_type(&self, namespace: &str, name: &str) -> UnresolvedTypeRc {
        self.pool.intern_type(Arc::new(UnresolvedType::Named {
            scope: TypeScope::CurrentAssembly,
            namespace: self.pool.intern_str(namespace),
            name: self.pool.intern_str(name),
            arity: 0,
            is_reference_type: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_arity() {
        assert_eq!(split_arity("List`1"), ("List", 1));
        assert_eq!(split_arity("ValueTuple`8"), ("ValueTuple", 8));
        assert_eq!(split_arity("String"), ("String", 0));
        assert_eq!(split_arity("Weird`x"), ("Weird`x", 0));
    }

    #[test]
    fn test_tuple_cardinality_rejects_non_tuples() {
        let open = source::TypeSig::Named(Arc::new(source::TypeRef::new(
            source::Scope::CurrentModule,
            "System",
            "Lazy`1",
        )));
        assert_eq!(tuple_cardinality(&open, &[source::TypeSig::I4]), None);
    }

    #[test]
    fn test_tuple_cardinality_follows_rest_chain() {
        let open2 = source::TypeSig::Named(Arc::new(source::TypeRef::new(
            source::Scope::CurrentModule,
            "System",
            "ValueTuple`2",
        )));
        let open8 = source::TypeSig::Named(Arc::new(source::TypeRef::new(
            source::Scope::CurrentModule,
            "System",
            "ValueTuple`8",
        )));
        let rest = source::TypeSig::generic(open2, vec![source::TypeSig::I4, source::TypeSig::I8]);
        let args: Vec<source::TypeSig> = (0..7)
            .map(|_| source::TypeSig::I4)
            .chain(std::iter::once(rest))
            .collect();
        assert_eq!(tuple_cardinality(&open8, &args), Some(9));

        // TRest that is not a tuple makes the whole instantiation tuple-incompatible.
        let bad_args: Vec<source::TypeSig> = (0..8).map(|_| source::TypeSig::I4).collect();
        assert_eq!(tuple_cardinality(&open8, &bad_args), None);
    }
}
