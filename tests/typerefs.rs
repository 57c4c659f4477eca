//! Type-reference translation tests: the dynamic-index and tuple-index laws, value-tuple
//! flattening, and the local recovery rules for unrepresentable constructs.

mod common;

use std::sync::Arc;

use cildom::prelude::*;
use common::{corlib, corlib_value, load, load_with, module_of, public_method, public_type};

fn value_tuple(arity: usize, args: Vec<TypeSig>) -> TypeSig {
    assert_eq!(arity, args.len());
    TypeSig::generic(corlib_value("System", &format!("ValueTuple`{arity}")), args)
}

fn dynamic_attribute(flags: &[bool]) -> Attribute {
    Attribute::with_args(
        "System.Runtime.CompilerServices",
        "DynamicAttribute",
        vec![TypeSig::sz_array(TypeSig::Boolean)],
        vec![AttrValue::Array(
            flags.iter().map(|b| AttrValue::Boolean(*b)).collect(),
        )],
    )
}

fn tuple_names_attribute(names: &[Option<&str>]) -> Attribute {
    Attribute::with_args(
        "System.Runtime.CompilerServices",
        "TupleElementNamesAttribute",
        vec![TypeSig::sz_array(TypeSig::String)],
        vec![AttrValue::Array(
            names
                .iter()
                .map(|n| match n {
                    Some(s) => AttrValue::String((*s).to_string()),
                    None => AttrValue::Null,
                })
                .collect(),
        )],
    )
}

/// Loads a module with a single method returning `return_type` (annotated with `attrs`) and
/// hands back the translated return type.
fn translate_return(return_type: TypeSig, attrs: Vec<Attribute>) -> UnresolvedTypeRc {
    translate_return_with(LoaderConfig::default(), return_type, attrs)
}

fn translate_return_with(
    config: LoaderConfig,
    return_type: TypeSig,
    attrs: Vec<Attribute>,
) -> UnresolvedTypeRc {
    let mut method = public_method(1, "M", return_type);
    method.return_attributes = attrs;
    let mut ty = public_type(1, "N", "C");
    ty.methods.push(Arc::new(method));
    let assembly = load_with(config, module_of(vec![ty]));
    let members = assembly.types()[0].members().unwrap();
    let UnresolvedMember::Method(method) = &members[0] else {
        panic!("expected a method");
    };
    method.return_type.clone()
}

#[test]
fn value_tuple_flattening_law() {
    // ValueTuple<A,B,C,D,E,F,G,ValueTuple<H,I>> flattens to nine elements in order A..I.
    let elements = [
        TypeSig::I1,
        TypeSig::U1,
        TypeSig::I2,
        TypeSig::U2,
        TypeSig::I4,
        TypeSig::U4,
        TypeSig::I8,
    ];
    let rest = value_tuple(2, vec![TypeSig::U8, TypeSig::R8]);
    let outer = value_tuple(
        8,
        elements.iter().cloned().chain(std::iter::once(rest)).collect(),
    );

    let translated = translate_return(outer, Vec::new());
    let UnresolvedType::Tuple { elements, names } = translated.as_ref() else {
        panic!("expected a tuple, got {translated}");
    };
    assert_eq!(elements.len(), 9);
    assert_eq!(names.len(), 9);
    let expected = [
        PrimitiveKind::SByte,
        PrimitiveKind::Byte,
        PrimitiveKind::Int16,
        PrimitiveKind::UInt16,
        PrimitiveKind::Int32,
        PrimitiveKind::UInt32,
        PrimitiveKind::Int64,
        PrimitiveKind::UInt64,
        PrimitiveKind::Double,
    ];
    for (element, kind) in elements.iter().zip(expected) {
        assert_eq!(*element, kind.reference());
    }
}

#[test]
fn flattened_tuple_consumes_exactly_its_total_cardinality() {
    // Dictionary<(9-tuple), (int x, int y)>: the flattened 9-tuple consumes nine name
    // slots in total (its TRest chain included), so the second tuple reads slots 9 and 10.
    let rest = value_tuple(2, vec![TypeSig::U8, TypeSig::R8]);
    let nine = value_tuple(
        8,
        (0..7)
            .map(|_| TypeSig::I4)
            .chain(std::iter::once(rest))
            .collect(),
    );
    let pair = value_tuple(2, vec![TypeSig::I4, TypeSig::I4]);
    let dictionary = TypeSig::generic(
        corlib("System.Collections.Generic", "Dictionary`2"),
        vec![nine, pair],
    );
    let names: Vec<Option<&str>> = (0..9)
        .map(|i| if i == 0 { Some("first") } else { None })
        .chain([Some("x"), Some("y")])
        .collect();

    let translated = translate_return(dictionary, vec![tuple_names_attribute(&names)]);
    let UnresolvedType::GenericInstance { args, .. } = translated.as_ref() else {
        panic!("expected a generic instance");
    };
    let UnresolvedType::Tuple { names, .. } = args[0].as_ref() else {
        panic!("expected a tuple");
    };
    assert_eq!(names.len(), 9);
    assert_eq!(names[0].as_deref(), Some("first"));
    assert!(names[1..].iter().all(Option::is_none));

    let UnresolvedType::Tuple { names, .. } = args[1].as_ref() else {
        panic!("expected a tuple");
    };
    assert_eq!(names[0].as_deref(), Some("x"));
    assert_eq!(names[1].as_deref(), Some("y"));
}

#[test]
fn nested_tuple_elements_consume_names_in_preorder() {
    // (int a, (int c, int d) b): the outer tuple reads two slots, the inner the next two.
    let inner = value_tuple(2, vec![TypeSig::I4, TypeSig::I4]);
    let outer = value_tuple(2, vec![TypeSig::I4, inner]);
    let attr = tuple_names_attribute(&[Some("a"), Some("b"), Some("c"), Some("d")]);

    let translated = translate_return(outer, vec![attr]);
    let UnresolvedType::Tuple { elements, names } = translated.as_ref() else {
        panic!("expected a tuple");
    };
    assert_eq!(names[0].as_deref(), Some("a"));
    assert_eq!(names[1].as_deref(), Some("b"));
    let UnresolvedType::Tuple { names: inner_names, .. } = elements[1].as_ref() else {
        panic!("expected a nested tuple");
    };
    assert_eq!(inner_names[0].as_deref(), Some("c"));
    assert_eq!(inner_names[1].as_deref(), Some("d"));
}

#[test]
fn one_tuple_collapses_to_its_element() {
    let translated = translate_return(value_tuple(1, vec![TypeSig::I4]), Vec::new());
    assert_eq!(translated, PrimitiveKind::Int32.reference());
}

#[test]
fn tuple_translation_can_be_disabled() {
    let config = LoaderConfig {
        use_tuple_types: false,
        ..LoaderConfig::default()
    };
    let translated = translate_return_with(
        config,
        value_tuple(2, vec![TypeSig::I4, TypeSig::I8]),
        Vec::new(),
    );
    assert!(matches!(
        translated.as_ref(),
        UnresolvedType::GenericInstance { .. }
    ));
}

#[test]
fn dynamic_index_law() {
    // Dictionary<object, object> + Dynamic({false, true, false}) == Dictionary<dynamic, object>
    let dictionary = TypeSig::generic(
        corlib("System.Collections.Generic", "Dictionary`2"),
        vec![TypeSig::Object, TypeSig::Object],
    );
    let translated = translate_return(dictionary, vec![dynamic_attribute(&[false, true, false])]);

    let UnresolvedType::GenericInstance { open, args } = translated.as_ref() else {
        panic!("expected a generic instance");
    };
    let UnresolvedType::Named { name, arity, .. } = open.as_ref() else {
        panic!("expected a named open type");
    };
    assert_eq!(name.as_ref(), "Dictionary");
    assert_eq!(*arity, 2);
    assert_eq!(args[0], UnresolvedType::dynamic());
    assert_eq!(args[1], UnresolvedType::object());
}

#[test]
fn dynamic_attribute_without_arguments_marks_everything() {
    let translated = translate_return(
        TypeSig::Object,
        vec![Attribute::marker(
            "System.Runtime.CompilerServices",
            "DynamicAttribute",
        )],
    );
    assert_eq!(translated, UnresolvedType::dynamic());
}

#[test]
fn dynamic_index_counts_compound_entries() {
    // object*: the pointer constructor advances the index to 1 before the object is read.
    let translated = translate_return(
        TypeSig::Ptr(Box::new(TypeSig::Object)),
        vec![dynamic_attribute(&[false, true])],
    );
    let UnresolvedType::Pointer(element) = translated.as_ref() else {
        panic!("expected a pointer");
    };
    assert_eq!(*element, UnresolvedType::dynamic());
}

#[test]
fn dynamic_translation_can_be_disabled() {
    let config = LoaderConfig {
        use_dynamic_type: false,
        ..LoaderConfig::default()
    };
    let translated = translate_return_with(
        config,
        TypeSig::Object,
        vec![Attribute::marker(
            "System.Runtime.CompilerServices",
            "DynamicAttribute",
        )],
    );
    assert_eq!(translated, UnresolvedType::object());
}

#[test]
fn function_pointers_become_native_int() {
    let translated = translate_return(TypeSig::FnPtr, Vec::new());
    assert_eq!(translated, PrimitiveKind::IntPtr.reference());
}

#[test]
fn modifiers_and_pinned_unwrap() {
    let loader = MetadataLoader::default();
    let modreq = TypeSig::ModReq {
        modifier: Arc::new(TypeRef::new(
            Scope::AssemblyRef("mscorlib".to_string()),
            "System.Runtime.CompilerServices",
            "IsVolatile",
        )),
        element: Box::new(TypeSig::I4),
    };
    assert_eq!(
        loader.read_type_reference(&modreq),
        PrimitiveKind::Int32.reference()
    );
    let pinned = TypeSig::Pinned(Box::new(TypeSig::String));
    assert_eq!(
        loader.read_type_reference(&pinned),
        PrimitiveKind::String.reference()
    );
}

#[test]
fn volatile_field_keeps_element_type() {
    let mut field = Field::new(
        Token::field(1),
        "F",
        FieldAttributes::PUBLIC,
        TypeSig::ModReq {
            modifier: Arc::new(TypeRef::new(
                Scope::AssemblyRef("mscorlib".to_string()),
                "System.Runtime.CompilerServices",
                "IsVolatile",
            )),
            element: Box::new(TypeSig::I4),
        },
    );
    field.flags |= FieldAttributes::STATIC;
    let mut ty = public_type(1, "N", "C");
    ty.fields.push(field);

    let assembly = load(module_of(vec![ty]));
    let members = assembly.types()[0].members().unwrap();
    let UnresolvedMember::Field(field) = &members[0] else {
        panic!("expected a field");
    };
    assert!(field.is_volatile);
    assert_eq!(field.return_type, PrimitiveKind::Int32.reference());
}

#[test]
fn named_reference_shape() {
    let loader = MetadataLoader::default();
    let list = TypeSig::Named(Arc::new(TypeRef::new(
        Scope::AssemblyRef("System.Collections".to_string()),
        "System.Collections.Generic",
        "List`1",
    )));
    let translated = loader.read_type_reference(&list);
    let UnresolvedType::Named {
        scope,
        namespace,
        name,
        arity,
        is_reference_type,
    } = translated.as_ref()
    else {
        panic!("expected a named reference");
    };
    assert_eq!(*scope, TypeScope::Assembly("System.Collections".into()));
    assert_eq!(namespace.as_ref(), "System.Collections.Generic");
    assert_eq!(name.as_ref(), "List");
    assert_eq!(*arity, 1);
    // Standalone references come from coded indexes: the value-type bit is untrusted.
    assert!(is_reference_type.is_none());
}

#[test]
fn signature_references_record_reference_typeness() {
    // From a signature the valuetype/class encoding is authoritative.
    let translated = translate_return(corlib_value("System", "Guid"), Vec::new());
    let UnresolvedType::Named {
        is_reference_type, ..
    } = translated.as_ref()
    else {
        panic!("expected a named reference");
    };
    assert_eq!(*is_reference_type, Some(false));

    let translated = translate_return(corlib("System", "Uri"), Vec::new());
    let UnresolvedType::Named {
        is_reference_type, ..
    } = translated.as_ref()
    else {
        panic!("expected a named reference");
    };
    assert_eq!(*is_reference_type, Some(true));
}

#[test]
fn nested_references_chain_through_declaring_types() {
    let loader = MetadataLoader::default();
    let outer = Arc::new(TypeRef::new(
        Scope::AssemblyRef("Lib".to_string()),
        "N",
        "Outer`1",
    ));
    let nested = TypeSig::Named(Arc::new(TypeRef::nested(outer, "Inner")));
    let translated = loader.read_type_reference(&nested);
    let UnresolvedType::Nested {
        declaring, name, ..
    } = translated.as_ref()
    else {
        panic!("expected a nested reference");
    };
    assert_eq!(name.as_ref(), "Inner");
    let UnresolvedType::Named { name, arity, .. } = declaring.as_ref() else {
        panic!("expected a named declaring reference");
    };
    assert_eq!(name.as_ref(), "Outer");
    assert_eq!(*arity, 1);
}

#[test]
fn definitions_translate_to_token_references() {
    let other = Arc::new(public_type(2, "N", "Other"));
    let mut ty = public_type(1, "N", "C");
    ty.fields.push(Field::new(
        Token::field(1),
        "F",
        FieldAttributes::PUBLIC,
        TypeSig::Definition(other.clone()),
    ));
    let mut module = module_of(vec![ty]);
    module.types.push(other);

    let assembly = load(module);
    let members = assembly.types()[0].members().unwrap();
    let UnresolvedMember::Field(field) = &members[0] else {
        panic!("expected a field");
    };
    assert_eq!(
        *field.return_type,
        UnresolvedType::Definition(Token::type_def(2))
    );
    // The token resolves within the owning assembly.
    assert!(assembly.type_by_token(Token::type_def(2)).is_some());
}

#[test]
fn arrays_carry_rank() {
    let translated = translate_return(
        TypeSig::Array {
            element: Box::new(TypeSig::R8),
            rank: 3,
        },
        Vec::new(),
    );
    let UnresolvedType::Array { element, rank } = translated.as_ref() else {
        panic!("expected an array");
    };
    assert_eq!(*rank, 3);
    assert_eq!(*element, PrimitiveKind::Double.reference());
}
