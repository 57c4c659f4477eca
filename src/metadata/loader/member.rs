//! Translation of methods, fields, properties, events, parameters and type parameters into
//! unresolved member records.

use std::sync::Arc;

use crate::{
    metadata::{
        loader::LoaderCore,
        source::{
            self, FieldAttributes, MethodAttributes, MethodSemantics, ParamAttributes,
            TypeAttributes, GENERIC_PARAM_CONTRAVARIANT, GENERIC_PARAM_COVARIANT,
            GENERIC_PARAM_VARIANCE_MASK,
        },
        unresolved::{
            Accessibility, ConstPayload, ConstantValue, MemberModifiers, MemberReference,
            MemberReferenceKind, MethodKind, ParameterDirection, PrimitiveKind, PropertyKind,
            TypeDefRef, TypeParameter, TypeParameterOwner, UnresolvedEvent, UnresolvedField,
            UnresolvedMember, UnresolvedMethod, UnresolvedParameter, UnresolvedProperty,
            UnresolvedType, UnresolvedTypeRc, Variance,
        },
    },
    Result,
};

/// Whether the semantics flags mark a method as a property or event accessor.
fn is_accessor(semantics: u32) -> bool {
    semantics != 0 && semantics != MethodSemantics::OTHER.bits()
}

/// Whether an attribute provider carries the extension-method marker.
pub(crate) fn has_extension_attribute(attrs: &[source::Attribute]) -> bool {
    attrs
        .iter()
        .any(|a| a.is_type("System.Runtime.CompilerServices", "ExtensionAttribute"))
}

impl LoaderCore {
    /// Member visibility filter: public, family, or fam-or-assem access, unless the loader is
    /// configured to include internals.
    pub(crate) fn is_visible(&self, flags: u32) -> bool {
        if self.config.include_internal_members {
            return true;
        }
        matches!(
            flags & MethodAttributes::ACCESS_MASK,
            MethodAttributes::PUBLIC | MethodAttributes::FAMILY | MethodAttributes::FAM_OR_ASSEM
        )
    }

    /// Translates the 3-bit CLI access group.
    pub(crate) fn accessibility_of(flags: u32) -> Accessibility {
        match flags & MethodAttributes::ACCESS_MASK {
            MethodAttributes::PUBLIC => Accessibility::Public,
            MethodAttributes::FAM_AND_ASSEM => Accessibility::ProtectedAndInternal,
            MethodAttributes::ASSEMBLY => Accessibility::Internal,
            MethodAttributes::FAMILY => Accessibility::Protected,
            MethodAttributes::FAM_OR_ASSEM => Accessibility::ProtectedOrInternal,
            _ => Accessibility::Private,
        }
    }

    /// Derives the modifier set from method flags. Members of interface types are handled as
    /// `public abstract` regardless of their flags.
    fn translate_modifiers(&self, flags: u32, in_interface: bool) -> MemberModifiers {
        if in_interface {
            return MemberModifiers {
                accessibility: Accessibility::Public,
                is_abstract: true,
                ..MemberModifiers::default()
            };
        }
        let mut modifiers = MemberModifiers {
            accessibility: Self::accessibility_of(flags),
            is_static: flags & MethodAttributes::STATIC != 0,
            ..MemberModifiers::default()
        };
        if flags & MethodAttributes::ABSTRACT != 0 {
            modifiers.is_abstract = true;
            modifiers.is_override = flags & MethodAttributes::NEW_SLOT == 0;
        } else if flags & MethodAttributes::FINAL != 0 {
            if flags & MethodAttributes::NEW_SLOT == 0 {
                modifiers.is_sealed = true;
                modifiers.is_override = true;
            }
        } else if flags & MethodAttributes::VIRTUAL != 0 {
            if flags & MethodAttributes::NEW_SLOT != 0 {
                modifiers.is_virtual = true;
            } else {
                modifiers.is_override = true;
            }
        }
        modifiers
    }

    /// Reads a generic parameter list, verifying that each declared position matches the
    /// index in the owner's list.
    pub(crate) fn read_type_parameters(
        &self,
        params: &[source::GenericParam],
        owner: TypeParameterOwner,
    ) -> Result<Arc<[Arc<TypeParameter>]>> {
        for (index, param) in params.iter().enumerate() {
            if usize::from(param.position) != index {
                return Err(invalid_metadata!(
                    "generic parameter '{}' at index {} declares position {}",
                    param.name,
                    index,
                    param.position
                ));
            }
        }
        let mut out = Vec::with_capacity(params.len());
        for param in params {
            let variance = match param.flags & GENERIC_PARAM_VARIANCE_MASK {
                GENERIC_PARAM_COVARIANT => Variance::Covariant,
                GENERIC_PARAM_CONTRAVARIANT => Variance::Contravariant,
                _ => Variance::Invariant,
            };
            let special = source::GenericParamAttributes::from_bits_truncate(param.flags);
            let constraints: Vec<UnresolvedTypeRc> = param
                .constraints
                .iter()
                .map(|c| {
                    self.read_annotated_type(
                        &c.constraint,
                        &c.attributes,
                        c.constraint.is_type_spec(),
                    )
                })
                .collect();
            let mut attributes = Vec::new();
            self.add_custom_attributes(&param.attributes, &mut attributes);
            out.push(Arc::new(TypeParameter {
                owner,
                position: param.position,
                name: self.pool.intern_str(&param.name),
                variance,
                has_reference_type_constraint: special
                    .contains(source::GenericParamAttributes::REFERENCE_TYPE_CONSTRAINT),
                has_value_type_constraint: special
                    .contains(source::GenericParamAttributes::NOT_NULLABLE_VALUE_TYPE_CONSTRAINT),
                has_default_constructor_constraint: special
                    .contains(source::GenericParamAttributes::DEFAULT_CONSTRUCTOR_CONSTRAINT),
                constraints: self.pool.intern_type_list(constraints),
                attributes: self.pool.intern_attribute_list(attributes),
            }));
        }
        Ok(out.into())
    }

    fn convert_constant(
        &self,
        ty: &UnresolvedTypeRc,
        constant: Option<&source::Constant>,
    ) -> ConstantValue {
        let value = match constant {
            None | Some(source::Constant::Null) => ConstPayload::Null,
            Some(source::Constant::Boolean(v)) => ConstPayload::Boolean(*v),
            Some(source::Constant::Char(v)) => ConstPayload::Char(*v),
            Some(source::Constant::I1(v)) => ConstPayload::I1(*v),
            Some(source::Constant::U1(v)) => ConstPayload::U1(*v),
            Some(source::Constant::I2(v)) => ConstPayload::I2(*v),
            Some(source::Constant::U2(v)) => ConstPayload::U2(*v),
            Some(source::Constant::I4(v)) => ConstPayload::I4(*v),
            Some(source::Constant::U4(v)) => ConstPayload::U4(*v),
            Some(source::Constant::I8(v)) => ConstPayload::I8(*v),
            Some(source::Constant::U8(v)) => ConstPayload::U8(*v),
            Some(source::Constant::R4(v)) => ConstPayload::R4(*v),
            Some(source::Constant::R8(v)) => ConstPayload::R8(*v),
            Some(source::Constant::String(v)) => ConstPayload::String(self.pool.intern_str(v)),
        };
        ConstantValue::new(ty.clone(), value)
    }

    /// Reads a parameter row.
    pub(crate) fn read_parameter(&self, param: &source::Param) -> Arc<UnresolvedParameter> {
        let ty = self.read_annotated_type(&param.ty, &param.attributes, true);
        let flags = ParamAttributes::from_bits_truncate(param.flags);
        let direction = if matches!(param.ty, source::TypeSig::ByRef(_)) {
            if flags.contains(ParamAttributes::OUT) && !flags.contains(ParamAttributes::IN) {
                ParameterDirection::Out
            } else {
                ParameterDirection::Ref
            }
        } else {
            ParameterDirection::In
        };
        let is_params = matches!(param.ty, source::TypeSig::Array { .. })
            && param
                .attributes
                .iter()
                .any(|a| a.is_type("System", "ParamArrayAttribute"));
        let default_value = if flags.contains(ParamAttributes::OPTIONAL) {
            Some(
                self.pool
                    .intern_constant(Arc::new(self.convert_constant(&ty, param.constant.as_ref()))),
            )
        } else {
            None
        };
        let mut attributes = Vec::new();
        if let Some(marshal) = &param.marshal {
            attributes.push(self.marshal_attribute(marshal));
        }
        self.add_custom_attributes(&param.attributes, &mut attributes);
        Arc::new(UnresolvedParameter {
            ty,
            name: self.pool.intern_str(&param.name),
            direction,
            is_params,
            default_value,
            attributes: self.pool.intern_attribute_list(attributes),
        })
    }

    fn arglist_parameter(&self) -> Arc<UnresolvedParameter> {
        Arc::new(UnresolvedParameter {
            ty: UnresolvedType::arglist(),
            name: self.pool.intern_str(""),
            direction: ParameterDirection::In,
            is_params: false,
            default_value: None,
            attributes: self.pool.intern_attribute_list(Vec::new()),
        })
    }

    /// Reads a method row.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotSupported`] for P/Invoke records with an unknown calling
    /// convention, and [`crate::Error::InvalidMetadata`] for inconsistent generic parameter
    /// positions.
    pub(crate) fn read_method(
        &self,
        method: &source::Method,
        kind: MethodKind,
        in_interface: bool,
    ) -> Result<Arc<UnresolvedMethod>> {
        let type_parameters =
            self.read_type_parameters(&method.generic_params, TypeParameterOwner::Method)?;
        let return_type =
            self.read_annotated_type(&method.return_type, &method.return_attributes, true);

        let mut attributes = Vec::new();
        self.read_method_attributes(method, &mut attributes)?;
        let mut return_attributes = Vec::new();
        if let Some(marshal) = &method.return_marshal {
            return_attributes.push(self.marshal_attribute(marshal));
        }

        let modifiers = self.translate_modifiers(method.flags, in_interface);

        let mut parameters: Vec<Arc<UnresolvedParameter>> = method
            .params
            .iter()
            .map(|param| self.read_parameter(param))
            .collect();
        if method.is_vararg {
            parameters.push(self.arglist_parameter());
        }

        let is_extension_method = method.flags & MethodAttributes::STATIC != 0
            && has_extension_attribute(&method.attributes);

        let mut name = method.name.as_str();
        let mut is_explicit_interface_implementation = false;
        let mut implementations = Vec::new();
        if let Some(last_dot) = method.name.rfind('.') {
            if !method.overrides.is_empty() {
                if self.config.shorten_interface_impl_names {
                    name = &method.name[last_dot + 1..];
                }
                is_explicit_interface_implementation = true;
                let parameter_types = self
                    .pool
                    .intern_type_list(parameters.iter().map(|p| p.ty.clone()).collect());
                let reference_kind = if kind == MethodKind::Accessor {
                    MemberReferenceKind::Accessor
                } else {
                    MemberReferenceKind::Method
                };
                for or in &method.overrides {
                    implementations.push(MemberReference {
                        kind: reference_kind,
                        declaring_type: self.read_plain_type(&or.declaring_type),
                        name: self.pool.intern_str(&or.name),
                        type_parameter_count: or.generic_arity,
                        parameter_types: parameter_types.clone(),
                    });
                }
            }
        }

        Ok(Arc::new(UnresolvedMethod {
            token: method.token,
            name: self.pool.intern_str(name),
            kind,
            modifiers,
            return_type,
            type_parameters,
            parameters: parameters.into(),
            is_extension_method,
            is_explicit_interface_implementation,
            explicit_interface_implementations: implementations.into(),
            has_body: method.has_body,
            attributes: self.pool.intern_attribute_list(attributes),
            return_attributes: self.pool.intern_attribute_list(return_attributes),
            declaring: TypeDefRef::unset(),
        }))
    }

    /// Reads a field row.
    pub(crate) fn read_field(&self, field: &source::Field) -> Arc<UnresolvedField> {
        let return_type = self.read_annotated_type(&field.ty, &field.attributes, true);
        let modifiers = MemberModifiers {
            accessibility: Self::accessibility_of(field.flags),
            is_static: field.flags & FieldAttributes::STATIC != 0,
            ..MemberModifiers::default()
        };

        let is_volatile = matches!(
            &field.ty,
            source::TypeSig::ModReq { modifier, .. }
                if modifier.namespace == "System.Runtime.CompilerServices"
                    && modifier.name == "IsVolatile"
        );

        let constant = if let Some(value) = &field.constant {
            Some(
                self.pool
                    .intern_constant(Arc::new(self.convert_constant(&return_type, Some(value)))),
            )
        } else {
            field
                .attributes
                .iter()
                .find(|a| a.is_type("System.Runtime.CompilerServices", "DecimalConstantAttribute"))
                .and_then(Self::decode_decimal_constant)
                .map(|decimal| {
                    self.pool.intern_constant(Arc::new(ConstantValue::new(
                        PrimitiveKind::Decimal.reference(),
                        ConstPayload::Decimal(decimal),
                    )))
                })
        };

        Arc::new(UnresolvedField {
            token: field.token,
            name: self.pool.intern_str(&field.name),
            modifiers,
            return_type,
            is_read_only: field.flags & FieldAttributes::INIT_ONLY != 0,
            is_volatile,
            constant,
            attributes: self.pool.intern_attribute_list(self.read_field_attributes(field)),
            declaring: TypeDefRef::unset(),
        })
    }

    /// Reads a property row with its accessors.
    pub(crate) fn read_property(
        &self,
        property: &source::Property,
        kind: PropertyKind,
        in_interface: bool,
    ) -> Result<Arc<UnresolvedProperty>> {
        let main_accessor = property.getter.as_ref().or(property.setter.as_ref());
        let mut modifiers = self.translate_modifiers(
            main_accessor.map(|a| a.flags).unwrap_or_default(),
            in_interface,
        );
        if let (Some(getter), Some(setter)) = (&property.getter, &property.setter) {
            // Only accessors that pass the visibility filter take part in the union; an
            // invisible accessor must not widen the property's accessibility.
            let getter_access = self
                .is_visible(getter.flags)
                .then(|| Self::accessibility_of(getter.flags));
            let setter_access = self
                .is_visible(setter.flags)
                .then(|| Self::accessibility_of(setter.flags));
            match (getter_access, setter_access) {
                (Some(getter), Some(setter)) => modifiers.accessibility = getter.union(setter),
                (Some(access), None) | (None, Some(access)) => modifiers.accessibility = access,
                (None, None) => {}
            }
        }

        let return_type = self.read_annotated_type(&property.ty, &property.attributes, true);
        let getter = property
            .getter
            .as_ref()
            .map(|m| self.read_method(m, MethodKind::Accessor, in_interface))
            .transpose()?;
        let setter = property
            .setter
            .as_ref()
            .map(|m| self.read_method(m, MethodKind::Accessor, in_interface))
            .transpose()?;
        let parameters: Vec<Arc<UnresolvedParameter>> = property
            .params
            .iter()
            .map(|param| self.read_parameter(param))
            .collect();

        let mut attributes = Vec::new();
        self.add_custom_attributes(&property.attributes, &mut attributes);

        let mut name = property.name.as_str();
        let mut is_explicit_interface_implementation = false;
        let mut implementations = Vec::new();
        if let Some(accessor) = main_accessor {
            if !accessor.overrides.is_empty() {
                if self.config.shorten_interface_impl_names {
                    if let Some(last_dot) = property.name.rfind('.') {
                        name = &property.name[last_dot + 1..];
                    }
                }
                is_explicit_interface_implementation = true;
                let parameter_types = self
                    .pool
                    .intern_type_list(parameters.iter().map(|p| p.ty.clone()).collect());
                for or in &accessor.overrides {
                    implementations.push(MemberReference {
                        kind: MemberReferenceKind::Accessor,
                        declaring_type: self.read_plain_type(&or.declaring_type),
                        name: self.pool.intern_str(&or.name),
                        type_parameter_count: or.generic_arity,
                        parameter_types: parameter_types.clone(),
                    });
                }
            }
        }

        Ok(Arc::new(UnresolvedProperty {
            token: property.token,
            name: self.pool.intern_str(name),
            kind,
            modifiers,
            return_type,
            getter,
            setter,
            parameters: parameters.into(),
            is_explicit_interface_implementation,
            explicit_interface_implementations: implementations.into(),
            attributes: self.pool.intern_attribute_list(attributes),
            declaring: TypeDefRef::unset(),
        }))
    }

    /// Reads an event row with its accessors.
    pub(crate) fn read_event(
        &self,
        event: &source::Event,
        in_interface: bool,
    ) -> Result<Arc<UnresolvedEvent>> {
        let modifiers = self.translate_modifiers(
            event.add.as_ref().map(|a| a.flags).unwrap_or_default(),
            in_interface,
        );
        let return_type = self.read_annotated_type(&event.ty, &event.attributes, true);
        let add_accessor = event
            .add
            .as_ref()
            .map(|m| self.read_method(m, MethodKind::Accessor, in_interface))
            .transpose()?;
        let remove_accessor = event
            .remove
            .as_ref()
            .map(|m| self.read_method(m, MethodKind::Accessor, in_interface))
            .transpose()?;
        let invoke_accessor = event
            .invoke
            .as_ref()
            .map(|m| self.read_method(m, MethodKind::Accessor, in_interface))
            .transpose()?;

        let mut attributes = Vec::new();
        self.add_custom_attributes(&event.attributes, &mut attributes);

        let mut name = event.name.as_str();
        let mut is_explicit_interface_implementation = false;
        let mut implementations = Vec::new();
        let accessor = event
            .add
            .as_ref()
            .or(event.remove.as_ref())
            .or(event.invoke.as_ref());
        if let Some(accessor) = accessor {
            if !accessor.overrides.is_empty() {
                if self.config.shorten_interface_impl_names {
                    if let Some(last_dot) = event.name.rfind('.') {
                        name = &event.name[last_dot + 1..];
                    }
                }
                is_explicit_interface_implementation = true;
                let parameter_types = self.pool.intern_type_list(Vec::new());
                for or in &accessor.overrides {
                    implementations.push(MemberReference {
                        kind: MemberReferenceKind::Accessor,
                        declaring_type: self.read_plain_type(&or.declaring_type),
                        name: self.pool.intern_str(&or.name),
                        type_parameter_count: or.generic_arity,
                        parameter_types: parameter_types.clone(),
                    });
                }
            }
        }

        Ok(Arc::new(UnresolvedEvent {
            token: event.token,
            name: self.pool.intern_str(name),
            modifiers,
            return_type,
            add_accessor,
            remove_accessor,
            invoke_accessor,
            is_explicit_interface_implementation,
            explicit_interface_implementations: implementations.into(),
            attributes: self.pool.intern_attribute_list(attributes),
            declaring: TypeDefRef::unset(),
        }))
    }

    /// Reads the visible members of a type: methods, fields, properties, events, in that
    /// order. Accessor methods are excluded from the top level and surfaced through their
    /// owners.
    pub(crate) fn read_members(&self, td: &source::TypeDef) -> Result<Vec<UnresolvedMember>> {
        let in_interface = td.flags & TypeAttributes::INTERFACE != 0;
        let mut members = Vec::new();

        for method in &td.methods {
            if self.is_visible(method.flags) && !is_accessor(method.semantics) {
                let mut kind = MethodKind::Method;
                if method.flags & MethodAttributes::SPECIAL_NAME != 0 {
                    if method.name == ".ctor" || method.name == ".cctor" {
                        kind = MethodKind::Constructor;
                    } else if method.name.starts_with("op_") {
                        kind = MethodKind::Operator;
                    }
                }
                members.push(UnresolvedMember::Method(
                    self.read_method(method, kind, in_interface)?,
                ));
            }
        }

        for field in &td.fields {
            if self.is_visible(field.flags) && field.flags & FieldAttributes::SPECIAL_NAME == 0 {
                members.push(UnresolvedMember::Field(self.read_field(field)));
            }
        }

        let default_member_name = td
            .attributes
            .iter()
            .find(|a| a.is_type("System.Reflection", "DefaultMemberAttribute"))
            .and_then(|a| a.fixed_args.first())
            .and_then(|value| value.as_str().map(str::to_string));
        for property in &td.properties {
            let getter_visible = property
                .getter
                .as_ref()
                .is_some_and(|m| self.is_visible(m.flags));
            let setter_visible = property
                .setter
                .as_ref()
                .is_some_and(|m| self.is_visible(m.flags));
            if getter_visible || setter_visible {
                let mut kind = PropertyKind::Property;
                if !property.params.is_empty() {
                    let accessor = property.getter.as_ref().or(property.setter.as_ref());
                    if Some(property.name.as_str()) == default_member_name.as_deref() {
                        kind = PropertyKind::Indexer;
                    } else if property.name.ends_with(".Item")
                        && accessor.is_some_and(|a| !a.overrides.is_empty())
                    {
                        // Explicit interface implementation of an indexer. Known to
                        // misclassify properties whose last name component happens to be
                        // `Item`.
                        kind = PropertyKind::Indexer;
                    }
                }
                members.push(UnresolvedMember::Property(
                    self.read_property(property, kind, in_interface)?,
                ));
            }
        }

        for event in &td.events {
            if event.add.as_ref().is_some_and(|m| self.is_visible(m.flags)) {
                members.push(UnresolvedMember::Event(self.read_event(event, in_interface)?));
            }
        }

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::loader::LoaderConfig;

    fn core() -> LoaderCore {
        LoaderCore::new(LoaderConfig::default())
    }

    #[test]
    fn test_accessibility_translation() {
        assert_eq!(
            LoaderCore::accessibility_of(MethodAttributes::PUBLIC),
            Accessibility::Public
        );
        assert_eq!(
            LoaderCore::accessibility_of(MethodAttributes::FAM_AND_ASSEM),
            Accessibility::ProtectedAndInternal
        );
        assert_eq!(
            LoaderCore::accessibility_of(MethodAttributes::COMPILER_CONTROLLED),
            Accessibility::Private
        );
    }

    #[test]
    fn test_modifier_table() {
        let core = core();
        use crate::metadata::source::MethodAttributes as MA;

        // abstract + newslot
        let m = core.translate_modifiers(MA::ABSTRACT | MA::VIRTUAL | MA::NEW_SLOT, false);
        assert!(m.is_abstract && !m.is_override);
        // abstract without newslot
        let m = core.translate_modifiers(MA::ABSTRACT | MA::VIRTUAL, false);
        assert!(m.is_abstract && m.is_override);
        // final without newslot
        let m = core.translate_modifiers(MA::FINAL | MA::VIRTUAL, false);
        assert!(m.is_sealed && m.is_override && !m.is_virtual);
        // virtual + newslot
        let m = core.translate_modifiers(MA::VIRTUAL | MA::NEW_SLOT, false);
        assert!(m.is_virtual && !m.is_override);
        // virtual without newslot
        let m = core.translate_modifiers(MA::VIRTUAL, false);
        assert!(m.is_override && !m.is_virtual);
        // plain
        let m = core.translate_modifiers(0, false);
        assert!(!m.is_virtual && !m.is_override && !m.is_abstract && !m.is_sealed);
    }

    #[test]
    fn test_interface_members_forced_public_abstract() {
        let core = core();
        let m = core.translate_modifiers(MethodAttributes::PRIVATE, true);
        assert_eq!(m.accessibility, Accessibility::Public);
        assert!(m.is_abstract);
    }

    #[test]
    fn test_visibility_filter() {
        let core = core();
        assert!(core.is_visible(MethodAttributes::PUBLIC));
        assert!(core.is_visible(MethodAttributes::FAMILY));
        assert!(core.is_visible(MethodAttributes::FAM_OR_ASSEM));
        assert!(!core.is_visible(MethodAttributes::ASSEMBLY));
        assert!(!core.is_visible(MethodAttributes::PRIVATE));

        let internals = LoaderCore::new(LoaderConfig {
            include_internal_members: true,
            ..LoaderConfig::default()
        });
        assert!(internals.is_visible(MethodAttributes::ASSEMBLY));
        assert!(internals.is_visible(MethodAttributes::PRIVATE));
    }

    #[test]
    fn test_type_parameter_position_mismatch() {
        let core = core();
        let params = vec![source::GenericParam::new("T", 1)];
        assert!(core
            .read_type_parameters(&params, TypeParameterOwner::Type)
            .is_err());
    }
}
