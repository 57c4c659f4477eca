//! Translation of source type definitions into unresolved type definitions.
//!
//! The shell (identity, type parameters, kind, modifiers, attributes) is always built up
//! front; base types, nested types and members are published into the definition's slots
//! either immediately (eager) or on first access (lazy).

use std::sync::Arc;

use crate::{
    metadata::{
        loader::{LoadedEntity, LoaderCore},
        source::{self, FieldAttributes, TypeAttributes},
        unresolved::{
            Accessibility, LazyTypeSource, MemberList, TypeDefList, TypeKind, TypeRefList,
            TypeParameterOwner, UnresolvedMember, UnresolvedTypeDef, UnresolvedTypeDefRc,
        },
    },
    Result,
};

use super::member::has_extension_attribute;
use super::typeref::split_arity;

fn is_type_of(ty: &source::TypeSig, namespace: &str, name: &str) -> bool {
    match ty {
        source::TypeSig::Named(r) => {
            r.parent.is_none() && r.namespace == namespace && r.name == name
        }
        source::TypeSig::Definition(d) => d.namespace == namespace && d.name == name,
        _ => false,
    }
}

/// Kind determination, in priority order: interface, enum, struct, delegate, module, class.
pub(crate) fn type_kind(td: &source::TypeDef) -> TypeKind {
    if td.flags & TypeAttributes::INTERFACE != 0 {
        return TypeKind::Interface;
    }
    if let Some(base) = &td.base {
        if is_type_of(base, "System", "Enum") {
            return TypeKind::Enum;
        }
        if is_type_of(base, "System", "ValueType")
            && !(td.namespace == "System" && td.name == "Enum")
        {
            return TypeKind::Struct;
        }
        if is_type_of(base, "System", "MulticastDelegate") {
            return TypeKind::Delegate;
        }
        if is_type_of(base, "System", "Delegate") && td.name != "MulticastDelegate" {
            return TypeKind::Delegate;
        }
    }
    let is_module_class = td.attributes.iter().any(|a| {
        a.is_type(
            "Microsoft.VisualBasic.CompilerServices",
            "StandardModuleAttribute",
        ) || a.is_type(
            "System.Runtime.CompilerServices",
            "CompilerGlobalScopeAttribute",
        )
    });
    if is_module_class {
        return TypeKind::Module;
    }
    TypeKind::Class
}

fn type_accessibility(flags: u32) -> Accessibility {
    match flags & TypeAttributes::VISIBILITY_MASK {
        TypeAttributes::PUBLIC | TypeAttributes::NESTED_PUBLIC => Accessibility::Public,
        TypeAttributes::NESTED_PRIVATE => Accessibility::Private,
        TypeAttributes::NESTED_FAMILY => Accessibility::Protected,
        TypeAttributes::NESTED_FAM_AND_ASSEM => Accessibility::ProtectedAndInternal,
        TypeAttributes::NESTED_FAM_OR_ASSEM => Accessibility::ProtectedOrInternal,
        _ => Accessibility::Internal,
    }
}

impl LoaderCore {
    /// Builds the shell of a type definition: identity, type parameters, kind, modifiers,
    /// constraints, attributes and the extension/default-constructor flags. Base types,
    /// nested types and members stay unpublished.
    pub(crate) fn create_type_shell(
        &self,
        td: &source::TypeDef,
        lazy: Option<Box<dyn LazyTypeSource>>,
    ) -> Result<UnresolvedTypeDefRc> {
        let (short_name, _) = split_arity(&td.name);
        let type_parameters =
            self.read_type_parameters(&td.generic_params, TypeParameterOwner::Type)?;
        let kind = type_kind(td);
        let attributes = self.read_type_attributes(td, kind);
        let has_extension_methods = has_extension_attribute(&td.attributes);

        Ok(Arc::new(UnresolvedTypeDef::new(
            td.token,
            self.pool.intern_str(&td.namespace),
            self.pool.intern_str(short_name),
            kind,
            type_accessibility(td.flags),
            td.flags & TypeAttributes::SEALED != 0,
            td.flags & TypeAttributes::ABSTRACT != 0,
            type_parameters,
            self.pool.intern_attribute_list(attributes),
            has_extension_methods,
            lazy,
        )))
    }

    /// Eagerly fills the deferred lists of a shell and fires the load notifications.
    pub(crate) fn init_type_def(
        &self,
        shell: &UnresolvedTypeDefRc,
        td: &source::TypeDef,
    ) -> Result<()> {
        shell.publish_nested_types(self.read_nested_types(td)?);
        shell.publish_base_types(self.read_base_types(td));
        let members: MemberList = self.read_members(td)?.into();
        shell.publish_members(members.clone());
        for member in members.iter() {
            self.notify_member(member);
        }
        self.notify(LoadedEntity::TypeDefinition(shell.clone()));
        Ok(())
    }

    /// The base-type list: for enums the underlying type taken from the first instance
    /// field, otherwise the explicit base followed by all implemented interfaces.
    pub(crate) fn read_base_types(&self, td: &source::TypeDef) -> TypeRefList {
        let mut base_types = Vec::new();
        if type_kind(td) == TypeKind::Enum {
            for field in &td.fields {
                if field.flags & FieldAttributes::STATIC == 0 {
                    base_types.push(self.read_sig_type(&field.ty));
                    break;
                }
            }
        } else {
            if let Some(base) = &td.base {
                base_types.push(self.read_plain_type(base));
            }
            for iface in &td.interfaces {
                base_types.push(self.read_annotated_type(
                    &iface.interface,
                    &iface.attributes,
                    iface.interface.is_type_spec(),
                ));
            }
        }
        self.pool.intern_type_list(base_types)
    }

    /// Recursively reads the visible nested type definitions (eagerly, even under a lazy
    /// parent).
    pub(crate) fn read_nested_types(&self, td: &source::TypeDef) -> Result<TypeDefList> {
        let mut nested = Vec::new();
        for raw in &td.nested_types {
            let visibility = raw.flags & TypeAttributes::VISIBILITY_MASK;
            let visible = self.config.include_internal_members
                || matches!(
                    visibility,
                    TypeAttributes::NESTED_PUBLIC
                        | TypeAttributes::NESTED_FAMILY
                        | TypeAttributes::NESTED_FAM_OR_ASSEM
                );
            if visible {
                let shell = self.create_type_shell(raw, None)?;
                self.init_type_def(&shell, raw)?;
                nested.push(shell);
            }
        }
        Ok(nested.into())
    }

    pub(crate) fn notify(&self, entity: LoadedEntity) {
        if let Some(callback) = &self.config.on_entity_loaded {
            callback(&entity);
        }
    }

    pub(crate) fn notify_member(&self, member: &UnresolvedMember) {
        if self.config.on_entity_loaded.is_none() {
            return;
        }
        let entity = match member {
            UnresolvedMember::Method(m) => LoadedEntity::Method(m.clone()),
            UnresolvedMember::Field(m) => LoadedEntity::Field(m.clone()),
            UnresolvedMember::Property(m) => LoadedEntity::Property(m.clone()),
            UnresolvedMember::Event(m) => LoadedEntity::Event(m.clone()),
        };
        self.notify(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::source::{Scope, TypeRef, TypeSig};

    fn base_of(namespace: &str, name: &str) -> TypeSig {
        TypeSig::Named(Arc::new(TypeRef::new(
            Scope::AssemblyRef("mscorlib".to_string()),
            namespace,
            name,
        )))
    }

    #[test]
    fn test_type_kind_priority() {
        let mut td = source::TypeDef::new(
            crate::metadata::token::Token::type_def(1),
            "N",
            "T",
            TypeAttributes::PUBLIC,
        );
        assert_eq!(type_kind(&td), TypeKind::Class);

        td.base = Some(base_of("System", "ValueType"));
        assert_eq!(type_kind(&td), TypeKind::Struct);

        td.base = Some(base_of("System", "Enum"));
        assert_eq!(type_kind(&td), TypeKind::Enum);

        td.base = Some(base_of("System", "MulticastDelegate"));
        assert_eq!(type_kind(&td), TypeKind::Delegate);

        td.flags |= TypeAttributes::INTERFACE;
        assert_eq!(type_kind(&td), TypeKind::Interface);
    }

    #[test]
    fn test_delegate_base_rule() {
        let mut td = source::TypeDef::new(
            crate::metadata::token::Token::type_def(1),
            "System",
            "MulticastDelegate",
            TypeAttributes::PUBLIC,
        );
        td.base = Some(base_of("System", "Delegate"));
        // System.MulticastDelegate itself extends System.Delegate but is not a delegate kind.
        assert_eq!(type_kind(&td), TypeKind::Class);
    }

    #[test]
    fn test_module_kind_from_attribute() {
        let mut td = source::TypeDef::new(
            crate::metadata::token::Token::type_def(1),
            "N",
            "Helpers",
            TypeAttributes::PUBLIC,
        );
        td.attributes.push(source::Attribute::marker(
            "Microsoft.VisualBasic.CompilerServices",
            "StandardModuleAttribute",
        ));
        assert_eq!(type_kind(&td), TypeKind::Module);
    }

    #[test]
    fn test_type_accessibility() {
        assert_eq!(
            type_accessibility(TypeAttributes::PUBLIC),
            Accessibility::Public
        );
        assert_eq!(
            type_accessibility(TypeAttributes::NOT_PUBLIC),
            Accessibility::Internal
        );
        assert_eq!(
            type_accessibility(TypeAttributes::NESTED_FAM_AND_ASSEM),
            Accessibility::ProtectedAndInternal
        );
    }
}
