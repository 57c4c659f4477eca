//! Attribute decoding: user attributes, security declarations, and the records synthesized
//! from non-attribute metadata (P/Invoke, impl flags, layout, marshalling, flags).
//!
//! Synthesized attributes follow the CLI defaulting rules: a named field is only emitted when
//! the metadata value differs from the default the runtime would assume, so round-tripping
//! the attribute produces the original metadata.

use std::sync::Arc;

use crate::{
    metadata::{
        loader::LoaderCore,
        source::{self, MethodImplAttributes, PInvokeAttributes, TypeAttributes, NATIVE_TYPE},
        unresolved::{
            AttributeArguments, ConstPayload, ConstantValue, DecimalValue, NamedArgument,
            PrimitiveKind, TypeKind, UnresolvedAttribute, UnresolvedAttributeRc, UnresolvedTypeRc,
        },
    },
    Result,
};

// System.Runtime.InteropServices.CharSet
const CHAR_SET_NONE: i32 = 1;
const CHAR_SET_ANSI: i32 = 2;
const CHAR_SET_UNICODE: i32 = 3;
const CHAR_SET_AUTO: i32 = 4;

// System.Runtime.InteropServices.LayoutKind
const LAYOUT_KIND_SEQUENTIAL: i32 = 0;
const LAYOUT_KIND_EXPLICIT: i32 = 2;
const LAYOUT_KIND_AUTO: i32 = 3;

// System.Runtime.InteropServices.CallingConvention
const CALLING_CONVENTION_WINAPI: i32 = 1;

/// Builder for synthesized attribute records.
struct AttributeBuilder {
    attr_type: UnresolvedTypeRc,
    ctor_param_types: Vec<UnresolvedTypeRc>,
    positional: Vec<ConstantValue>,
    named: Vec<NamedArgument>,
}

impl AttributeBuilder {
    fn new(attr_type: UnresolvedTypeRc, ctor_param_types: Vec<UnresolvedTypeRc>) -> Self {
        AttributeBuilder {
            attr_type,
            ctor_param_types,
            positional: Vec::new(),
            named: Vec::new(),
        }
    }

    fn positional(&mut self, value: ConstantValue) -> &mut Self {
        self.positional.push(value);
        self
    }

    fn named_field(&mut self, core: &LoaderCore, name: &str, value: ConstantValue) -> &mut Self {
        self.named
            .push(NamedArgument::field(core.pool.intern_str(name), value));
        self
    }

    fn build(self, core: &LoaderCore) -> UnresolvedAttributeRc {
        core.pool.intern_attribute(Arc::new(UnresolvedAttribute {
            attr_type: self.attr_type,
            ctor_param_types: core.pool.intern_type_list(self.ctor_param_types),
            args: AttributeArguments::Decoded {
                positional: self.positional.into(),
                named: self.named.into(),
            },
        }))
    }
}

impl LoaderCore {
    fn const_i4(&self, ty: UnresolvedTypeRc, value: i32) -> ConstantValue {
        ConstantValue::new(ty, ConstPayload::I4(value))
    }

    fn const_bool(&self, value: bool) -> ConstantValue {
        ConstantValue::new(PrimitiveKind::Boolean.reference(), ConstPayload::Boolean(value))
    }

    fn const_str(&self, value: &str) -> ConstantValue {
        ConstantValue::new(
            PrimitiveKind::String.reference(),
            ConstPayload::String(self.pool.intern_str(value)),
        )
    }

    /// A marker attribute: parameterless constructor, no arguments.
    fn marker_attribute(&self, namespace: &str, name: &str) -> UnresolvedAttributeRc {
        AttributeBuilder::new(self.known_type(namespace, name), Vec::new()).build(self)
    }

    /// Reads a user custom attribute as a blob-backed record.
    fn read_attribute(&self, attr: &source::Attribute) -> UnresolvedAttributeRc {
        let attr_type = self.read_plain_type(&source::TypeSig::Named(attr.attr_type.clone()));
        let ctor_param_types = attr
            .ctor_param_types
            .iter()
            .map(|ty| self.read_sig_type(ty))
            .collect();
        self.pool
            .intern_attribute(Arc::new(UnresolvedAttribute::from_blob(
                attr_type,
                self.pool.intern_type_list(ctor_param_types),
                attr.blob.clone().into(),
            )))
    }

    /// Appends the user attributes of a provider, dropping the kinds that are represented
    /// structurally elsewhere in the unresolved model.
    pub(crate) fn add_custom_attributes(
        &self,
        attrs: &[source::Attribute],
        out: &mut Vec<UnresolvedAttributeRc>,
    ) {
        for attr in attrs {
            let ty = &attr.attr_type;
            if ty.namespace == "System.Runtime.CompilerServices" {
                match ty.name.as_str() {
                    "ExtensionAttribute" | "DecimalConstantAttribute" => continue,
                    "DynamicAttribute" if self.config.use_dynamic_type => continue,
                    "TupleElementNamesAttribute" if self.config.use_tuple_types => continue,
                    _ => {}
                }
            } else if ty.namespace == "System" && ty.name == "ParamArrayAttribute" {
                continue;
            } else if ty.namespace == "System.Reflection" && ty.name == "DefaultMemberAttribute" {
                continue;
            }
            out.push(self.read_attribute(attr));
        }
    }

    /// Appends the security declarations of a provider, keyed by action code. Declarations
    /// whose blob could not be read are skipped.
    pub(crate) fn add_security_attributes(
        &self,
        decls: &[source::SecurityDecl],
        out: &mut Vec<UnresolvedAttributeRc>,
    ) {
        for decl in decls {
            let Some(blob) = &decl.blob else {
                continue;
            };
            let attr_type = self.known_type("System.Security.Permissions", "PermissionSetAttribute");
            let action_type = self.known_type("System.Security.Permissions", "SecurityAction");
            out.push(self.pool.intern_attribute(Arc::new(UnresolvedAttribute {
                attr_type,
                ctor_param_types: self.pool.intern_type_list(vec![action_type]),
                args: AttributeArguments::SecuritySet {
                    action: decl.action,
                    blob: blob.clone().into(),
                },
            })));
        }
    }

    /// Attributes of the assembly manifest, led by the synthesized version attribute.
    pub(crate) fn read_assembly_attributes(
        &self,
        info: &source::AssemblyInfo,
    ) -> Vec<UnresolvedAttributeRc> {
        let mut out = Vec::new();
        let (major, minor, build, revision) = info.version;
        let mut version = AttributeBuilder::new(
            self.known_type("System.Reflection", "AssemblyVersionAttribute"),
            vec![PrimitiveKind::String.reference()],
        );
        version.positional(self.const_str(&format!("{major}.{minor}.{build}.{revision}")));
        out.push(version.build(self));
        self.add_custom_attributes(&info.attributes, &mut out);
        out
    }

    /// Flag-derived and user attributes of a type definition.
    pub(crate) fn read_type_attributes(
        &self,
        td: &source::TypeDef,
        kind: TypeKind,
    ) -> Vec<UnresolvedAttributeRc> {
        let mut out = Vec::new();

        if td.flags & TypeAttributes::SERIALIZABLE != 0 {
            out.push(self.marker_attribute("System", "SerializableAttribute"));
        }
        if td.flags & TypeAttributes::IMPORT != 0 {
            out.push(self.marker_attribute(
                "System.Runtime.InteropServices",
                "ComImportAttribute",
            ));
        }

        self.add_struct_layout_attribute(td, kind, &mut out);
        self.add_custom_attributes(&td.attributes, &mut out);
        self.add_security_attributes(&td.security, &mut out);
        out
    }

    fn add_struct_layout_attribute(
        &self,
        td: &source::TypeDef,
        kind: TypeKind,
        out: &mut Vec<UnresolvedAttributeRc>,
    ) {
        let layout_kind = match td.flags & TypeAttributes::LAYOUT_MASK {
            TypeAttributes::SEQUENTIAL_LAYOUT => LAYOUT_KIND_SEQUENTIAL,
            TypeAttributes::EXPLICIT_LAYOUT => LAYOUT_KIND_EXPLICIT,
            _ => LAYOUT_KIND_AUTO,
        };
        let char_set = match td.flags & TypeAttributes::STRING_FORMAT_MASK {
            TypeAttributes::UNICODE_CLASS => CHAR_SET_UNICODE,
            TypeAttributes::AUTO_CLASS => CHAR_SET_AUTO,
            TypeAttributes::ANSI_CLASS => CHAR_SET_ANSI,
            _ => CHAR_SET_NONE,
        };
        // Value types default to sequential layout, everything else (enums included) to auto.
        let default_layout_kind = if kind == TypeKind::Struct {
            LAYOUT_KIND_SEQUENTIAL
        } else {
            LAYOUT_KIND_AUTO
        };
        let layout = td.layout.unwrap_or_default();
        if layout_kind == default_layout_kind
            && char_set == CHAR_SET_ANSI
            && layout.packing_size == 0
            && layout.class_size == 0
        {
            return;
        }

        let layout_kind_type = self.known_type("System.Runtime.InteropServices", "LayoutKind");
        let mut attr = AttributeBuilder::new(
            self.known_type("System.Runtime.InteropServices", "StructLayoutAttribute"),
            vec![layout_kind_type.clone()],
        );
        attr.positional(self.const_i4(layout_kind_type, layout_kind));
        if char_set != CHAR_SET_ANSI {
            let char_set_type = self.known_type("System.Runtime.InteropServices", "CharSet");
            attr.named_field(self, "CharSet", self.const_i4(char_set_type, char_set));
        }
        if layout.packing_size > 0 {
            attr.named_field(
                self,
                "Pack",
                self.const_i4(
                    PrimitiveKind::Int32.reference(),
                    i32::from(layout.packing_size),
                ),
            );
        }
        if layout.class_size > 0 {
            attr.named_field(
                self,
                "Size",
                self.const_i4(PrimitiveKind::Int32.reference(), layout.class_size as i32),
            );
        }
        out.push(attr.build(self));
    }

    /// Flag-derived and user attributes of a method.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotSupported`] for a P/Invoke record with an unknown calling
    /// convention.
    pub(crate) fn read_method_attributes(
        &self,
        method: &source::Method,
        out: &mut Vec<UnresolvedAttributeRc>,
    ) -> Result<()> {
        let mut impl_flags = method.impl_flags & !MethodImplAttributes::CODE_TYPE_MASK;

        if let Some(pinvoke) = &method.pinvoke {
            out.push(self.dll_import_attribute(method, pinvoke, &mut impl_flags)?);
        }

        if impl_flags == MethodImplAttributes::PRESERVE_SIG {
            out.push(self.marker_attribute(
                "System.Runtime.InteropServices",
                "PreserveSigAttribute",
            ));
            impl_flags = 0;
        }

        if impl_flags != 0 {
            let options_type =
                self.known_type("System.Runtime.CompilerServices", "MethodImplOptions");
            let mut attr = AttributeBuilder::new(
                self.known_type("System.Runtime.CompilerServices", "MethodImplAttribute"),
                vec![options_type.clone()],
            );
            attr.positional(self.const_i4(options_type, impl_flags as i32));
            out.push(attr.build(self));
        }

        self.add_custom_attributes(&method.attributes, out);
        self.add_security_attributes(&method.security, out);
        Ok(())
    }

    fn dll_import_attribute(
        &self,
        method: &source::Method,
        pinvoke: &source::PInvokeInfo,
        impl_flags: &mut u32,
    ) -> Result<UnresolvedAttributeRc> {
        let mut attr = AttributeBuilder::new(
            self.known_type("System.Runtime.InteropServices", "DllImportAttribute"),
            vec![PrimitiveKind::String.reference()],
        );
        attr.positional(self.const_str(&pinvoke.module));

        match pinvoke.flags & PInvokeAttributes::BEST_FIT_MASK {
            PInvokeAttributes::BEST_FIT_DISABLED => {
                attr.named_field(self, "BestFitMapping", self.const_bool(false));
            }
            PInvokeAttributes::BEST_FIT_ENABLED => {
                attr.named_field(self, "BestFitMapping", self.const_bool(true));
            }
            _ => {}
        }

        let calling_convention = match pinvoke.flags & PInvokeAttributes::CALL_CONV_MASK {
            PInvokeAttributes::CALL_CONV_WINAPI => 1,
            PInvokeAttributes::CALL_CONV_CDECL => 2,
            PInvokeAttributes::CALL_CONV_STDCALL => 3,
            PInvokeAttributes::CALL_CONV_THISCALL => 4,
            PInvokeAttributes::CALL_CONV_FASTCALL => 5,
            other => {
                return Err(crate::Error::NotSupported(format!(
                    "unknown P/Invoke calling convention: 0x{other:x}"
                )))
            }
        };
        if calling_convention != CALLING_CONVENTION_WINAPI {
            let convention_type =
                self.known_type("System.Runtime.InteropServices", "CallingConvention");
            attr.named_field(
                self,
                "CallingConvention",
                self.const_i4(convention_type, calling_convention),
            );
        }

        let char_set = match pinvoke.flags & PInvokeAttributes::CHAR_SET_MASK {
            PInvokeAttributes::CHAR_SET_ANSI => CHAR_SET_ANSI,
            PInvokeAttributes::CHAR_SET_UNICODE => CHAR_SET_UNICODE,
            PInvokeAttributes::CHAR_SET_AUTO => CHAR_SET_AUTO,
            _ => CHAR_SET_NONE,
        };
        if char_set != CHAR_SET_NONE {
            let char_set_type = self.known_type("System.Runtime.InteropServices", "CharSet");
            attr.named_field(self, "CharSet", self.const_i4(char_set_type, char_set));
        }

        if let Some(entry_point) = &pinvoke.entry_point {
            if !entry_point.is_empty() && *entry_point != method.name {
                attr.named_field(self, "EntryPoint", self.const_str(entry_point));
            }
        }

        if pinvoke.flags & PInvokeAttributes::NO_MANGLE != 0 {
            attr.named_field(self, "ExactSpelling", self.const_bool(true));
        }

        // DllImport defaults to PreserveSig=true; a set impl-flag bit is absorbed here, a
        // clear bit becomes an explicit false.
        if *impl_flags & MethodImplAttributes::PRESERVE_SIG != 0 {
            *impl_flags &= !MethodImplAttributes::PRESERVE_SIG;
        } else {
            attr.named_field(self, "PreserveSig", self.const_bool(false));
        }

        if pinvoke.flags & PInvokeAttributes::SUPPORTS_LAST_ERROR != 0 {
            attr.named_field(self, "SetLastError", self.const_bool(true));
        }

        match pinvoke.flags & PInvokeAttributes::THROW_ON_UNMAPPABLE_MASK {
            PInvokeAttributes::THROW_ON_UNMAPPABLE_DISABLED => {
                attr.named_field(self, "ThrowOnUnmappableChar", self.const_bool(false));
            }
            PInvokeAttributes::THROW_ON_UNMAPPABLE_ENABLED => {
                attr.named_field(self, "ThrowOnUnmappableChar", self.const_bool(true));
            }
            _ => {}
        }

        Ok(attr.build(self))
    }

    /// Flag-derived and user attributes of a field.
    pub(crate) fn read_field_attributes(
        &self,
        field: &source::Field,
    ) -> Vec<UnresolvedAttributeRc> {
        let mut out = Vec::new();
        if let Some(offset) = field.offset {
            let mut attr = AttributeBuilder::new(
                self.known_type("System.Runtime.InteropServices", "FieldOffsetAttribute"),
                vec![PrimitiveKind::Int32.reference()],
            );
            attr.positional(self.const_i4(PrimitiveKind::Int32.reference(), offset as i32));
            out.push(attr.build(self));
        }
        if field.flags & source::FieldAttributes::NOT_SERIALIZED != 0 {
            out.push(self.marker_attribute("System", "NonSerializedAttribute"));
        }
        if let Some(marshal) = &field.marshal {
            out.push(self.marshal_attribute(marshal));
        }
        self.add_custom_attributes(&field.attributes, &mut out);
        out
    }

    /// Builds a `MarshalAs` attribute from a marshalling descriptor.
    pub(crate) fn marshal_attribute(&self, marshal: &source::Marshal) -> UnresolvedAttributeRc {
        let unmanaged_type = self.known_type("System.Runtime.InteropServices", "UnmanagedType");
        let native = match marshal {
            source::Marshal::Simple(native) => *native,
            source::Marshal::FixedArray { .. } => NATIVE_TYPE::FIXEDARRAY,
            source::Marshal::SafeArray { .. } => NATIVE_TYPE::SAFEARRAY,
            source::Marshal::Array { .. } => NATIVE_TYPE::ARRAY,
            source::Marshal::FixedSysString { .. } => NATIVE_TYPE::BYVALTSTR,
            source::Marshal::Custom { .. } => NATIVE_TYPE::CUSTOMMARSHALER,
        };
        let mut attr = AttributeBuilder::new(
            self.known_type("System.Runtime.InteropServices", "MarshalAsAttribute"),
            vec![unmanaged_type.clone()],
        );
        attr.positional(self.const_i4(unmanaged_type.clone(), native as i32));

        match marshal {
            source::Marshal::FixedArray { size, element } => {
                attr.named_field(
                    self,
                    "SizeConst",
                    self.const_i4(PrimitiveKind::Int32.reference(), *size as i32),
                );
                if *element != NATIVE_TYPE::MAX {
                    attr.named_field(
                        self,
                        "ArraySubType",
                        self.const_i4(unmanaged_type, *element as i32),
                    );
                }
            }
            source::Marshal::SafeArray { element } => {
                if *element != 0 {
                    let var_enum_type =
                        self.known_type("System.Runtime.InteropServices", "VarEnum");
                    attr.named_field(
                        self,
                        "SafeArraySubType",
                        self.const_i4(var_enum_type, *element as i32),
                    );
                }
            }
            source::Marshal::Array {
                element,
                size_param_index,
                size,
            } => {
                if *element != NATIVE_TYPE::MAX {
                    attr.named_field(
                        self,
                        "ArraySubType",
                        self.const_i4(unmanaged_type, *element as i32),
                    );
                }
                if let Some(size) = size {
                    attr.named_field(
                        self,
                        "SizeConst",
                        self.const_i4(PrimitiveKind::Int32.reference(), *size as i32),
                    );
                }
                if let Some(index) = size_param_index {
                    attr.named_field(
                        self,
                        "SizeParamIndex",
                        ConstantValue::new(
                            PrimitiveKind::Int16.reference(),
                            ConstPayload::I2(*index as i16),
                        ),
                    );
                }
            }
            source::Marshal::FixedSysString { size } => {
                attr.named_field(
                    self,
                    "SizeConst",
                    self.const_i4(PrimitiveKind::Int32.reference(), *size as i32),
                );
            }
            source::Marshal::Custom {
                managed_type,
                cookie,
            } => {
                if !managed_type.is_empty() {
                    attr.named_field(self, "MarshalType", self.const_str(managed_type));
                }
                if !cookie.is_empty() {
                    attr.named_field(self, "MarshalCookie", self.const_str(cookie));
                }
            }
            source::Marshal::Simple(_) => {}
        }

        attr.build(self)
    }

    /// Decodes a `DecimalConstantAttribute` blob.
    ///
    /// The blob must carry the standard 0x0001 prolog followed by exactly five arguments of
    /// types byte, byte, (u)int32, (u)int32, (u)int32 (scale, sign, hi, mid, low). Any
    /// deviation yields no constant; third-party tooling is known to emit malformed blobs and
    /// must not abort the load.
    pub(crate) fn decode_decimal_constant(attr: &source::Attribute) -> Option<DecimalValue> {
        use source::TypeSig as S;
        if attr.ctor_param_types.len() != 5 {
            return None;
        }
        if !matches!(attr.ctor_param_types[0], S::U1)
            || !matches!(attr.ctor_param_types[1], S::U1)
        {
            return None;
        }
        if !attr.ctor_param_types[2..]
            .iter()
            .all(|ty| matches!(ty, S::I4 | S::U4))
        {
            return None;
        }
        let blob = &attr.blob;
        if blob.len() < 16 || blob[0] != 0x01 || blob[1] != 0x00 {
            return None;
        }
        let scale = blob[2];
        if scale > 28 {
            return None;
        }
        let negative = blob[3] != 0;
        let word = |at: usize| {
            u32::from_le_bytes([blob[at], blob[at + 1], blob[at + 2], blob[at + 3]])
        };
        let (hi, mid, low) = (word(4), word(8), word(12));
        Some(DecimalValue {
            negative,
            scale,
            mantissa: (u128::from(hi) << 64) | (u128::from(mid) << 32) | u128::from(low),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::loader::LoaderConfig;
    use crate::metadata::source::{AttrValue, Attribute, Scope, TypeRef, TypeSig};

    fn core() -> LoaderCore {
        LoaderCore::new(LoaderConfig::default())
    }

    fn decimal_blob(scale: u8, sign: u8, hi: u32, mid: u32, low: u32) -> Vec<u8> {
        let mut blob = vec![0x01, 0x00, scale, sign];
        blob.extend_from_slice(&hi.to_le_bytes());
        blob.extend_from_slice(&mid.to_le_bytes());
        blob.extend_from_slice(&low.to_le_bytes());
        blob.extend_from_slice(&[0x00, 0x00]);
        blob
    }

    fn decimal_attribute(blob: Vec<u8>) -> Attribute {
        Attribute {
            attr_type: std::sync::Arc::new(TypeRef::new(
                Scope::AssemblyRef("mscorlib".to_string()),
                "System.Runtime.CompilerServices",
                "DecimalConstantAttribute",
            )),
            ctor_param_types: vec![TypeSig::U1, TypeSig::U1, TypeSig::U4, TypeSig::U4, TypeSig::U4],
            fixed_args: Vec::new(),
            named_args: Vec::new(),
            blob,
        }
    }

    #[test]
    fn test_decode_decimal_constant() {
        let attr = decimal_attribute(decimal_blob(1, 0, 0, 0, 15));
        let value = LoaderCore::decode_decimal_constant(&attr).unwrap();
        assert_eq!(value.to_string(), "1.5");
        assert!(!value.negative);
        assert_eq!(value.scale, 1);
        assert_eq!(value.mantissa, 15);
    }

    #[test]
    fn test_decode_decimal_constant_rejects_bad_prolog() {
        let mut blob = decimal_blob(0, 0, 0, 0, 1);
        blob[0] = 0x02;
        assert!(LoaderCore::decode_decimal_constant(&decimal_attribute(blob)).is_none());
    }

    #[test]
    fn test_decode_decimal_constant_rejects_wrong_arity() {
        let mut attr = decimal_attribute(decimal_blob(0, 0, 0, 0, 1));
        attr.ctor_param_types.pop();
        assert!(LoaderCore::decode_decimal_constant(&attr).is_none());
    }

    #[test]
    fn test_decode_decimal_constant_rejects_wrong_types() {
        let mut attr = decimal_attribute(decimal_blob(0, 0, 0, 0, 1));
        attr.ctor_param_types[2] = TypeSig::I8;
        assert!(LoaderCore::decode_decimal_constant(&attr).is_none());
    }

    #[test]
    fn test_filtered_attributes_are_dropped() {
        let core = core();
        let mut out = Vec::new();
        core.add_custom_attributes(
            &[
                Attribute::marker("System.Runtime.CompilerServices", "ExtensionAttribute"),
                Attribute::marker("System", "ParamArrayAttribute"),
                Attribute::with_args(
                    "System.Reflection",
                    "DefaultMemberAttribute",
                    vec![TypeSig::String],
                    vec![AttrValue::String("Item".to_string())],
                ),
                Attribute::marker("System", "ObsoleteAttribute"),
            ],
            &mut out,
        );
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0].args, AttributeArguments::Blob(_)));
    }

    #[test]
    fn test_dynamic_attribute_kept_when_translation_off() {
        let core = LoaderCore::new(LoaderConfig {
            use_dynamic_type: false,
            ..LoaderConfig::default()
        });
        let mut out = Vec::new();
        core.add_custom_attributes(
            &[Attribute::marker(
                "System.Runtime.CompilerServices",
                "DynamicAttribute",
            )],
            &mut out,
        );
        assert_eq!(out.len(), 1);
    }
}
