//! Shared builders for constructing source metadata graphs in tests.
#![allow(dead_code)]

use std::sync::Arc;

use cildom::prelude::*;

/// A reference to a corlib type, as it would appear in a signature.
pub fn corlib(namespace: &str, name: &str) -> TypeSig {
    TypeSig::Named(Arc::new(TypeRef::new(
        Scope::AssemblyRef("mscorlib".to_string()),
        namespace,
        name,
    )))
}

/// A reference to a corlib value type, as it would appear in a signature.
#[allow(dead_code)]
pub fn corlib_value(namespace: &str, name: &str) -> TypeSig {
    TypeSig::Named(Arc::new(
        TypeRef::new(
            Scope::AssemblyRef("mscorlib".to_string()),
            namespace,
            name,
        )
        .value_type(),
    ))
}

/// A public instance method with a body.
#[allow(dead_code)]
pub fn public_method(row: u32, name: &str, return_type: TypeSig) -> Method {
    Method {
        has_body: true,
        ..Method::new(
            Token::method_def(row),
            name,
            MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG,
            return_type,
        )
    }
}

/// A public type definition.
pub fn public_type(row: u32, namespace: &str, name: &str) -> TypeDef {
    TypeDef::new(
        Token::type_def(row),
        namespace,
        name,
        TypeAttributes::PUBLIC,
    )
}

/// Wraps type definitions into a module named `Test.dll`.
pub fn module_of(types: Vec<TypeDef>) -> Module {
    let mut module = Module::new("Test.dll");
    module.types = types.into_iter().map(Arc::new).collect();
    module
}

/// Loads a module eagerly with the default configuration.
pub fn load(module: Module) -> Arc<UnresolvedAssembly> {
    load_with(LoaderConfig::default(), module)
}

/// Loads a module with the given configuration.
pub fn load_with(config: LoaderConfig, module: Module) -> Arc<UnresolvedAssembly> {
    let mut loader = MetadataLoader::new(config);
    loader
        .load_module(&ModuleHandle::new(module))
        .expect("load failed")
}

/// Whether an attribute list contains an attribute with the given type name.
pub fn has_attribute(attrs: &[Arc<UnresolvedAttribute>], name: &str) -> bool {
    find_attribute(attrs, name).is_some()
}

/// Finds an attribute by type name.
pub fn find_attribute<'a>(
    attrs: &'a [Arc<UnresolvedAttribute>],
    name: &str,
) -> Option<&'a Arc<UnresolvedAttribute>> {
    attrs.iter().find(|a| match a.attr_type.as_ref() {
        UnresolvedType::Named { name: n, .. } => n.as_ref() == name,
        _ => false,
    })
}
