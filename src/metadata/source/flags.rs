//! Flag constants and bitmasks for the source metadata graph.
//!
//! These mirror the ECMA-335 attribute encodings (§II.23.1) so that a byte-level parser can
//! hand its flag words to the loader unchanged. Mask/value groups are plain constant modules;
//! flags that behave as independent bit sets use `bitflags`.

use bitflags::bitflags;

/// All possible flags for `TypeAttributes` (ECMA-335 §II.23.1.15)
#[allow(non_snake_case)]
pub mod TypeAttributes {
    /// Use this mask to retrieve visibility information. These 3 bits contain one of the following values:
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Class has no public scope
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Class has public scope
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Class is nested with public visibility
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Class is nested with private visibility
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Class is nested with family visibility
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    /// Class is nested with assembly visibility
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    /// Class is nested with family and assembly visibility
    pub const NESTED_FAM_AND_ASSEM: u32 = 0x0000_0006;
    /// Class is nested with family or assembly visibility
    pub const NESTED_FAM_OR_ASSEM: u32 = 0x0000_0007;

    /// Use this mask to retrieve class layout information. These 2 bits contain one of the following values:
    pub const LAYOUT_MASK: u32 = 0x0000_0018;
    /// Class fields are auto-laid out
    pub const AUTO_LAYOUT: u32 = 0x0000_0000;
    /// Class fields are laid out sequentially
    pub const SEQUENTIAL_LAYOUT: u32 = 0x0000_0008;
    /// Layout is supplied explicitly
    pub const EXPLICIT_LAYOUT: u32 = 0x0000_0010;

    /// Type is an interface, otherwise a class
    pub const INTERFACE: u32 = 0x0000_0020;
    /// Class is abstract
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Class cannot be extended
    pub const SEALED: u32 = 0x0000_0100;
    /// Class name is special
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
    /// Class/Interface is imported (COM)
    pub const IMPORT: u32 = 0x0000_1000;
    /// Class is serializable
    pub const SERIALIZABLE: u32 = 0x0000_2000;

    /// Use this mask to retrieve string information for native interop. These 2 bits contain one of the following values:
    pub const STRING_FORMAT_MASK: u32 = 0x0003_0000;
    /// LPSTR is interpreted as ANSI
    pub const ANSI_CLASS: u32 = 0x0000_0000;
    /// LPSTR is interpreted as Unicode
    pub const UNICODE_CLASS: u32 = 0x0001_0000;
    /// LPSTR is interpreted automatically
    pub const AUTO_CLASS: u32 = 0x0002_0000;

    /// Initialize the class before first static field access
    pub const BEFORE_FIELD_INIT: u32 = 0x0010_0000;
    /// CLI provides special behavior, depending upon the name
    pub const RT_SPECIAL_NAME: u32 = 0x0000_0800;
}

/// All possible flags for `MethodAttributes` (ECMA-335 §II.23.1.10)
#[allow(non_snake_case)]
pub mod MethodAttributes {
    /// Use this mask to retrieve accessibility information. These 3 bits contain one of the following values:
    pub const ACCESS_MASK: u32 = 0x0000_0007;
    /// Member not referenceable
    pub const COMPILER_CONTROLLED: u32 = 0x0000_0000;
    /// Accessible only by the parent type
    pub const PRIVATE: u32 = 0x0000_0001;
    /// Accessible by sub-types only in this assembly
    pub const FAM_AND_ASSEM: u32 = 0x0000_0002;
    /// Accessible by anyone in the assembly
    pub const ASSEMBLY: u32 = 0x0000_0003;
    /// Accessible only by type and sub-types
    pub const FAMILY: u32 = 0x0000_0004;
    /// Accessible by sub-types anywhere, plus anyone in the assembly
    pub const FAM_OR_ASSEM: u32 = 0x0000_0005;
    /// Accessible by anyone who has visibility to this scope
    pub const PUBLIC: u32 = 0x0000_0006;

    /// Defined on type, else per instance
    pub const STATIC: u32 = 0x0000_0010;
    /// Method cannot be overridden
    pub const FINAL: u32 = 0x0000_0020;
    /// Method is virtual
    pub const VIRTUAL: u32 = 0x0000_0040;
    /// Method hides by name+sig, else just by name
    pub const HIDE_BY_SIG: u32 = 0x0000_0080;
    /// Method always gets a new slot in the vtable
    pub const NEW_SLOT: u32 = 0x0000_0100;
    /// Method does not provide an implementation
    pub const ABSTRACT: u32 = 0x0000_0400;
    /// Method is special
    pub const SPECIAL_NAME: u32 = 0x0000_0800;
    /// Implementation is forwarded through PInvoke
    pub const PINVOKE_IMPL: u32 = 0x0000_2000;
    /// CLI provides special behavior, depending upon the name
    pub const RT_SPECIAL_NAME: u32 = 0x0000_1000;
}

/// All possible flags for `MethodImplAttributes` (ECMA-335 §II.23.1.11)
#[allow(non_snake_case)]
pub mod MethodImplAttributes {
    /// Use this mask to retrieve the code type. These 2 bits contain one of the following values:
    pub const CODE_TYPE_MASK: u32 = 0x0000_0003;
    /// Method impl is CIL
    pub const IL: u32 = 0x0000_0000;
    /// Method impl is native
    pub const NATIVE: u32 = 0x0000_0001;
    /// Method impl is OPTIL
    pub const OPTIL: u32 = 0x0000_0002;
    /// Method impl is provided by the runtime
    pub const RUNTIME: u32 = 0x0000_0003;

    /// Method impl is unmanaged, otherwise managed
    pub const UNMANAGED: u32 = 0x0000_0004;
    /// Method cannot be inlined
    pub const NO_INLINING: u32 = 0x0000_0008;
    /// Method is defined; used primarily in merge scenarios
    pub const FORWARD_REF: u32 = 0x0000_0010;
    /// Method is single-threaded through the body
    pub const SYNCHRONIZED: u32 = 0x0000_0020;
    /// Method will not be optimized by the JIT
    pub const NO_OPTIMIZATION: u32 = 0x0000_0040;
    /// Method signature is not to be mangled to do HRESULT conversion
    pub const PRESERVE_SIG: u32 = 0x0000_0080;
    /// Method should be inlined if possible
    pub const AGGRESSIVE_INLINING: u32 = 0x0000_0100;
    /// Reserved: the body is provided by the CLI itself
    pub const INTERNAL_CALL: u32 = 0x0000_1000;
}

/// All possible flags for `FieldAttributes` (ECMA-335 §II.23.1.5)
#[allow(non_snake_case)]
pub mod FieldAttributes {
    /// Use this mask to retrieve accessibility information. These 3 bits contain one of the following values:
    pub const ACCESS_MASK: u32 = 0x0000_0007;
    /// Member not referenceable
    pub const COMPILER_CONTROLLED: u32 = 0x0000_0000;
    /// Accessible only by the parent type
    pub const PRIVATE: u32 = 0x0000_0001;
    /// Accessible by sub-types only in this assembly
    pub const FAM_AND_ASSEM: u32 = 0x0000_0002;
    /// Accessible by anyone in the assembly
    pub const ASSEMBLY: u32 = 0x0000_0003;
    /// Accessible only by type and sub-types
    pub const FAMILY: u32 = 0x0000_0004;
    /// Accessible by sub-types anywhere, plus anyone in the assembly
    pub const FAM_OR_ASSEM: u32 = 0x0000_0005;
    /// Accessible by anyone who has visibility to this scope
    pub const PUBLIC: u32 = 0x0000_0006;

    /// Defined on type, else per instance
    pub const STATIC: u32 = 0x0000_0010;
    /// Field can only be initialized, not written to after init
    pub const INIT_ONLY: u32 = 0x0000_0020;
    /// Value is a compile-time constant
    pub const LITERAL: u32 = 0x0000_0040;
    /// Reserved (to indicate this field should not be serialized when type is remoted)
    pub const NOT_SERIALIZED: u32 = 0x0000_0080;
    /// Field is special
    pub const SPECIAL_NAME: u32 = 0x0000_0200;
    /// CLI provides special behavior, depending upon the name
    pub const RT_SPECIAL_NAME: u32 = 0x0000_0400;
}

/// All possible flags for `PInvokeAttributes` (ECMA-335 §II.23.1.8)
#[allow(non_snake_case)]
pub mod PInvokeAttributes {
    /// PInvoke is to use the member name as specified
    pub const NO_MANGLE: u32 = 0x0000_0001;

    /// Use this mask to retrieve the character set. These 2 bits contain one of the following values:
    pub const CHAR_SET_MASK: u32 = 0x0000_0006;
    /// Character set not specified
    pub const CHAR_SET_NOT_SPEC: u32 = 0x0000_0000;
    /// ANSI character set
    pub const CHAR_SET_ANSI: u32 = 0x0000_0002;
    /// Unicode character set
    pub const CHAR_SET_UNICODE: u32 = 0x0000_0004;
    /// Automatic character set selection
    pub const CHAR_SET_AUTO: u32 = 0x0000_0006;

    /// Best-fit mapping behavior mask (CoreCLR extension)
    pub const BEST_FIT_MASK: u32 = 0x0000_0030;
    /// Best-fit mapping enabled
    pub const BEST_FIT_ENABLED: u32 = 0x0000_0010;
    /// Best-fit mapping disabled
    pub const BEST_FIT_DISABLED: u32 = 0x0000_0020;

    /// Throw-on-unmappable-char behavior mask (CoreCLR extension)
    pub const THROW_ON_UNMAPPABLE_MASK: u32 = 0x0000_3000;
    /// Throw on unmappable character enabled
    pub const THROW_ON_UNMAPPABLE_ENABLED: u32 = 0x0000_1000;
    /// Throw on unmappable character disabled
    pub const THROW_ON_UNMAPPABLE_DISABLED: u32 = 0x0000_2000;

    /// Information about the target function. Not relevant for fields
    pub const SUPPORTS_LAST_ERROR: u32 = 0x0000_0040;

    /// Use this mask to retrieve the calling convention. These 3 bits contain one of the following values:
    pub const CALL_CONV_MASK: u32 = 0x0000_0700;
    /// Platform API calling convention
    pub const CALL_CONV_WINAPI: u32 = 0x0000_0100;
    /// C calling convention
    pub const CALL_CONV_CDECL: u32 = 0x0000_0200;
    /// Standard calling convention
    pub const CALL_CONV_STDCALL: u32 = 0x0000_0300;
    /// This-call calling convention
    pub const CALL_CONV_THISCALL: u32 = 0x0000_0400;
    /// Fast calling convention
    pub const CALL_CONV_FASTCALL: u32 = 0x0000_0500;
}

bitflags! {
    /// Flags for `ParamAttributes` (ECMA-335 §II.23.1.13)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ParamAttributes: u32 {
        /// Param is [In]
        const IN = 0x0001;
        /// Param is [Out]
        const OUT = 0x0002;
        /// Param is optional
        const OPTIONAL = 0x0010;
        /// Param has a default value
        const HAS_DEFAULT = 0x1000;
        /// Param has field marshalling information
        const HAS_FIELD_MARSHAL = 0x2000;
    }
}

bitflags! {
    /// Flags for `MethodSemanticsAttributes` (ECMA-335 §II.23.1.12)
    ///
    /// A method whose semantics are anything other than `empty` or `OTHER` is an accessor and
    /// is surfaced through its owning property or event rather than as a top-level member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MethodSemantics: u32 {
        /// Setter for a property
        const SETTER = 0x0001;
        /// Getter for a property
        const GETTER = 0x0002;
        /// Other method for a property or event
        const OTHER = 0x0004;
        /// AddOn method for an event
        const ADD_ON = 0x0008;
        /// RemoveOn method for an event
        const REMOVE_ON = 0x0010;
        /// Fire method for an event
        const FIRE = 0x0020;
    }
}

/// Variance mask within `GenericParamAttributes`
pub const GENERIC_PARAM_VARIANCE_MASK: u32 = 0x0003;
/// Covariant generic parameter
pub const GENERIC_PARAM_COVARIANT: u32 = 0x0001;
/// Contravariant generic parameter
pub const GENERIC_PARAM_CONTRAVARIANT: u32 = 0x0002;

bitflags! {
    /// Special-constraint flags for `GenericParamAttributes` (ECMA-335 §II.23.1.7)
    ///
    /// The low two bits form the variance group; mask them with
    /// [`GENERIC_PARAM_VARIANCE_MASK`] before interpreting.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GenericParamAttributes: u32 {
        /// Covariant bit (part of the variance group)
        const COVARIANT = 0x0001;
        /// Contravariant bit (part of the variance group)
        const CONTRAVARIANT = 0x0002;
        /// The parameter must be a reference type (`class` constraint)
        const REFERENCE_TYPE_CONSTRAINT = 0x0004;
        /// The parameter must be a non-nullable value type (`struct` constraint)
        const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT = 0x0008;
        /// The parameter must have a public parameterless constructor (`new()` constraint)
        const DEFAULT_CONSTRUCTOR_CONSTRAINT = 0x0010;
    }
}

/// Native type constants for marshalling descriptors (ECMA-335 §II.23.4 plus CoreCLR extensions)
#[allow(non_snake_case)]
pub mod NATIVE_TYPE {
    /// 4-byte BOOL (true != 0)
    pub const BOOLEAN: u32 = 0x02;
    /// Signed 8-bit integer
    pub const I1: u32 = 0x03;
    /// Unsigned 8-bit integer
    pub const U1: u32 = 0x04;
    /// Signed 16-bit integer
    pub const I2: u32 = 0x05;
    /// Unsigned 16-bit integer
    pub const U2: u32 = 0x06;
    /// Signed 32-bit integer
    pub const I4: u32 = 0x07;
    /// Unsigned 32-bit integer
    pub const U4: u32 = 0x08;
    /// Signed 64-bit integer
    pub const I8: u32 = 0x09;
    /// Unsigned 64-bit integer
    pub const U8: u32 = 0x0A;
    /// 32-bit floating point
    pub const R4: u32 = 0x0B;
    /// 64-bit floating point
    pub const R8: u32 = 0x0C;
    /// LPSTR (null-terminated ANSI string)
    pub const LPSTR: u32 = 0x14;
    /// LPWSTR (null-terminated Unicode string)
    pub const LPWSTR: u32 = 0x15;
    /// By-value null-terminated character array
    pub const BYVALTSTR: u32 = 0x17;
    /// COM IUnknown pointer
    pub const IUNKNOWN: u32 = 0x19;
    /// COM SAFEARRAY
    pub const SAFEARRAY: u32 = 0x1D;
    /// Fixed-size array
    pub const FIXEDARRAY: u32 = 0x1E;
    /// Native signed integer
    pub const INT: u32 = 0x1F;
    /// Native unsigned integer
    pub const UINT: u32 = 0x20;
    /// Function pointer
    pub const FUNC: u32 = 0x26;
    /// Variable-length array
    pub const ARRAY: u32 = 0x2A;
    /// Custom marshaler
    pub const CUSTOMMARSHALER: u32 = 0x2C;
    /// Sentinel: no element type specified
    pub const MAX: u32 = 0x50;
}

/// Security action code for `DeclSecurity` rows (ECMA-335 §II.22.11)
pub type SecurityAction = u16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_masks_line_up() {
        // Field and method accessibility share the same 3-bit encoding.
        assert_eq!(FieldAttributes::ACCESS_MASK, MethodAttributes::ACCESS_MASK);
        assert_eq!(FieldAttributes::PUBLIC, MethodAttributes::PUBLIC);
        assert_eq!(FieldAttributes::FAMILY, MethodAttributes::FAMILY);
    }

    #[test]
    fn test_semantics_accessor_detection() {
        let getter = MethodSemantics::GETTER;
        assert!(!getter.is_empty());
        let other = MethodSemantics::OTHER;
        assert_eq!(other, MethodSemantics::OTHER);
    }

    #[test]
    fn test_generic_param_variance_group() {
        let flags = GenericParamAttributes::COVARIANT | GenericParamAttributes::REFERENCE_TYPE_CONSTRAINT;
        assert_eq!(flags.bits() & GENERIC_PARAM_VARIANCE_MASK, GENERIC_PARAM_COVARIANT);
    }
}
