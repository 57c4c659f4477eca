//! Unresolved attribute records and constant values.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::metadata::unresolved::typeref::{TypeRefList, UnresolvedTypeRc};

/// Reference to an [`UnresolvedAttribute`]
pub type UnresolvedAttributeRc = Arc<UnresolvedAttribute>;
/// An interned, immutable list of attributes
pub type AttributeList = Arc<[UnresolvedAttributeRc]>;

/// A 128-bit decimal value, reconstructed from the 5-argument `DecimalConstantAttribute`
/// encoding: sign, scale and a 96-bit unsigned mantissa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalValue {
    /// Whether the value is negative
    pub negative: bool,
    /// Number of decimal digits right of the point (0..=28)
    pub scale: u8,
    /// The 96-bit mantissa
    pub mantissa: u128,
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.to_string();
        let sign = if self.negative { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            write!(f, "{sign}{digits}")
        } else if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int}.{frac}")
        } else {
            write!(f, "{sign}0.{digits:0>scale$}")
        }
    }
}

/// The payload of a constant value.
///
/// Floating-point payloads compare and hash by bit pattern so that constants can participate
/// in the interning pool.
#[derive(Debug, Clone)]
pub enum ConstPayload {
    /// null
    Null,
    /// bool
    Boolean(bool),
    /// char (UTF-16 code unit)
    Char(u16),
    /// signed 8bit integer
    I1(i8),
    /// unsigned 8bit integer
    U1(u8),
    /// signed 16bit integer
    I2(i16),
    /// unsigned 16bit integer
    U2(u16),
    /// signed 32bit integer
    I4(i32),
    /// unsigned 32bit integer
    U4(u32),
    /// signed 64bit integer
    I8(i64),
    /// unsigned 64bit integer
    U8(u64),
    /// 32bit floating-point
    R4(f32),
    /// 64bit floating-point
    R8(f64),
    /// string
    String(Arc<str>),
    /// 128-bit decimal
    Decimal(DecimalValue),
}

impl PartialEq for ConstPayload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConstPayload::Null, ConstPayload::Null) => true,
            (ConstPayload::Boolean(a), ConstPayload::Boolean(b)) => a == b,
            (ConstPayload::Char(a), ConstPayload::Char(b)) => a == b,
            (ConstPayload::I1(a), ConstPayload::I1(b)) => a == b,
            (ConstPayload::U1(a), ConstPayload::U1(b)) => a == b,
            (ConstPayload::I2(a), ConstPayload::I2(b)) => a == b,
            (ConstPayload::U2(a), ConstPayload::U2(b)) => a == b,
            (ConstPayload::I4(a), ConstPayload::I4(b)) => a == b,
            (ConstPayload::U4(a), ConstPayload::U4(b)) => a == b,
            (ConstPayload::I8(a), ConstPayload::I8(b)) => a == b,
            (ConstPayload::U8(a), ConstPayload::U8(b)) => a == b,
            (ConstPayload::R4(a), ConstPayload::R4(b)) => a.to_bits() == b.to_bits(),
            (ConstPayload::R8(a), ConstPayload::R8(b)) => a.to_bits() == b.to_bits(),
            (ConstPayload::String(a), ConstPayload::String(b)) => a == b,
            (ConstPayload::Decimal(a), ConstPayload::Decimal(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ConstPayload {}

impl Hash for ConstPayload {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ConstPayload::Null => {}
            ConstPayload::Boolean(v) => v.hash(state),
            ConstPayload::Char(v) => v.hash(state),
            ConstPayload::I1(v) => v.hash(state),
            ConstPayload::U1(v) => v.hash(state),
            ConstPayload::I2(v) => v.hash(state),
            ConstPayload::U2(v) => v.hash(state),
            ConstPayload::I4(v) => v.hash(state),
            ConstPayload::U4(v) => v.hash(state),
            ConstPayload::I8(v) => v.hash(state),
            ConstPayload::U8(v) => v.hash(state),
            ConstPayload::R4(v) => v.to_bits().hash(state),
            ConstPayload::R8(v) => v.to_bits().hash(state),
            ConstPayload::String(v) => v.hash(state),
            ConstPayload::Decimal(v) => v.hash(state),
        }
    }
}

/// A typed constant value: default parameter values, literal field values, attribute
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstantValue {
    /// The declared type of the constant
    pub ty: UnresolvedTypeRc,
    /// The payload
    pub value: ConstPayload,
}

impl ConstantValue {
    /// Creates a constant of the given type
    #[must_use]
    pub fn new(ty: UnresolvedTypeRc, value: ConstPayload) -> Self {
        ConstantValue { ty, value }
    }
}

/// Whether a named attribute argument assigns a field or a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedArgumentKind {
    /// A field assignment
    Field,
    /// A property assignment
    Property,
}

/// A named argument of a decoded attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedArgument {
    /// Field or property assignment
    pub kind: NamedArgumentKind,
    /// Name of the assigned member
    pub name: Arc<str>,
    /// The assigned value
    pub value: ConstantValue,
}

impl NamedArgument {
    /// Creates a field assignment
    #[must_use]
    pub fn field(name: Arc<str>, value: ConstantValue) -> Self {
        NamedArgument {
            kind: NamedArgumentKind::Field,
            name,
            value,
        }
    }
}

/// The argument storage of an unresolved attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeArguments {
    /// The raw serialized blob; decoding is deferred to the resolve phase
    Blob(Arc<[u8]>),
    /// Decoded positional and named arguments (synthesized attributes)
    Decoded {
        /// Positional constructor arguments
        positional: Arc<[ConstantValue]>,
        /// Named field/property arguments
        named: Arc<[NamedArgument]>,
    },
    /// A security permission set, keyed by its action code
    SecuritySet {
        /// The security action code
        action: u16,
        /// The permission-set blob
        blob: Arc<[u8]>,
    },
}

/// An unresolved attribute record.
///
/// User attributes keep their serialized blob; attributes the loader synthesizes from
/// non-attribute metadata (P/Invoke records, layout rows, flags) carry decoded arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnresolvedAttribute {
    /// The attribute type
    pub attr_type: UnresolvedTypeRc,
    /// Parameter types of the invoked constructor
    pub ctor_param_types: TypeRefList,
    /// Argument storage
    pub args: AttributeArguments,
}

impl UnresolvedAttribute {
    /// Creates a blob-backed record for a user attribute
    #[must_use]
    pub fn from_blob(
        attr_type: UnresolvedTypeRc,
        ctor_param_types: TypeRefList,
        blob: Arc<[u8]>,
    ) -> Self {
        UnresolvedAttribute {
            attr_type,
            ctor_param_types,
            args: AttributeArguments::Blob(blob),
        }
    }

    /// The positional arguments of a decoded record; empty for blob-backed records
    #[must_use]
    pub fn positional_arguments(&self) -> &[ConstantValue] {
        match &self.args {
            AttributeArguments::Decoded { positional, .. } => positional,
            _ => &[],
        }
    }

    /// The named arguments of a decoded record; empty for blob-backed records
    #[must_use]
    pub fn named_arguments(&self) -> &[NamedArgument] {
        match &self.args {
            AttributeArguments::Decoded { named, .. } => named,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::unresolved::typeref::PrimitiveKind;

    #[test]
    fn test_decimal_display() {
        let d = DecimalValue {
            negative: false,
            scale: 1,
            mantissa: 15,
        };
        assert_eq!(d.to_string(), "1.5");

        let d = DecimalValue {
            negative: true,
            scale: 3,
            mantissa: 5,
        };
        assert_eq!(d.to_string(), "-0.005");

        let d = DecimalValue {
            negative: false,
            scale: 0,
            mantissa: 42,
        };
        assert_eq!(d.to_string(), "42");
    }

    #[test]
    fn test_float_payload_compares_by_bits() {
        let a = ConstPayload::R8(f64::NAN);
        let b = ConstPayload::R8(f64::NAN);
        assert_eq!(a, b);
        assert_ne!(ConstPayload::R8(0.0), ConstPayload::R8(-0.0));
    }

    #[test]
    fn test_constant_value_equality() {
        let a = ConstantValue::new(PrimitiveKind::Int32.reference(), ConstPayload::I4(42));
        let b = ConstantValue::new(PrimitiveKind::Int32.reference(), ConstPayload::I4(42));
        assert_eq!(a, b);
    }
}
