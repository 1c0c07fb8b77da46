//! The value model: a closed sum over every type the Crate and ASCII
//! containers can author.
//!
//! Each variant carries a stable numeric type id matching the Crate wire
//! table and an ASCII-facing type name. Array forms exist only for the
//! types whose `supports_array` bit is set in the wire table.

mod animatable;
pub mod listop;
mod time_samples;
mod types;

pub use animatable::{Animatable, Lerp, TypedSample, TypedTimeSamples};
pub use listop::ListOp;
pub use time_samples::{Sample, TimeCode, TimeSampleInterpolation, TimeSamples};
pub use types::{
    AssetPath, LayerOffset, ListEditQual, Payload, Permission, Reference, Specifier,
    TokenMap, VariantSelectionMap, Variability,
};

use std::collections::BTreeMap;

use half::f16;

use crate::path::Path;
use crate::token::Token;
use crate::util::{
    DMat2, DMat3, DMat4, DQuat, DVec2, DVec3, DVec4, HQuat, HVec2, HVec3, HVec4, IVec2, IVec3,
    IVec4, Quat, Vec2, Vec3, Vec4,
};

/// Open-ended metadata dictionary.
pub type Dictionary = BTreeMap<String, Value>;

/// Numeric ids of the Crate wire type table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum TypeId {
    Invalid = 0,
    Bool = 1,
    UChar = 2,
    Int = 3,
    UInt = 4,
    Int64 = 5,
    UInt64 = 6,
    Half = 7,
    Float = 8,
    Double = 9,
    String = 10,
    Token = 11,
    AssetPath = 12,
    Matrix2d = 13,
    Matrix3d = 14,
    Matrix4d = 15,
    Quatd = 16,
    Quatf = 17,
    Quath = 18,
    Vec2d = 19,
    Vec2f = 20,
    Vec2h = 21,
    Vec2i = 22,
    Vec3d = 23,
    Vec3f = 24,
    Vec3h = 25,
    Vec3i = 26,
    Vec4d = 27,
    Vec4f = 28,
    Vec4h = 29,
    Vec4i = 30,
    Dictionary = 31,
    TokenListOp = 32,
    StringListOp = 33,
    PathListOp = 34,
    ReferenceListOp = 35,
    IntListOp = 36,
    Int64ListOp = 37,
    UIntListOp = 38,
    UInt64ListOp = 39,
    PathVector = 40,
    TokenVector = 41,
    Specifier = 42,
    Permission = 43,
    Variability = 44,
    VariantSelectionMap = 45,
    TimeSamples = 46,
    Payload = 47,
    DoubleVector = 48,
    LayerOffsetVector = 49,
    StringVector = 50,
    ValueBlock = 51,
    Value = 52,
    UnregisteredValue = 53,
    UnregisteredValueListOp = 54,
    PayloadListOp = 55,
    TimeCode = 56,
}

/// Static description of a wire type: name, id, arrayability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueType {
    pub name: &'static str,
    pub id: TypeId,
    pub supports_array: bool,
}

impl ValueType {
    const fn new(name: &'static str, id: TypeId, supports_array: bool) -> Self {
        Self {
            name,
            id,
            supports_array,
        }
    }

    /// Look up a wire type by numeric id.
    pub fn from_id(id: i32) -> Option<ValueType> {
        use TypeId::*;
        let t = match id {
            1 => Self::new("Bool", Bool, true),
            2 => Self::new("UChar", UChar, true),
            3 => Self::new("Int", Int, true),
            4 => Self::new("UInt", UInt, true),
            5 => Self::new("Int64", Int64, true),
            6 => Self::new("UInt64", UInt64, true),
            7 => Self::new("Half", Half, true),
            8 => Self::new("Float", Float, true),
            9 => Self::new("Double", Double, true),
            10 => Self::new("String", String, true),
            11 => Self::new("Token", Token, true),
            12 => Self::new("AssetPath", AssetPath, true),
            13 => Self::new("Matrix2d", Matrix2d, true),
            14 => Self::new("Matrix3d", Matrix3d, true),
            15 => Self::new("Matrix4d", Matrix4d, true),
            16 => Self::new("Quatd", Quatd, true),
            17 => Self::new("Quatf", Quatf, true),
            18 => Self::new("Quath", Quath, true),
            19 => Self::new("Vec2d", Vec2d, true),
            20 => Self::new("Vec2f", Vec2f, true),
            21 => Self::new("Vec2h", Vec2h, true),
            22 => Self::new("Vec2i", Vec2i, true),
            23 => Self::new("Vec3d", Vec3d, true),
            24 => Self::new("Vec3f", Vec3f, true),
            25 => Self::new("Vec3h", Vec3h, true),
            26 => Self::new("Vec3i", Vec3i, true),
            27 => Self::new("Vec4d", Vec4d, true),
            28 => Self::new("Vec4f", Vec4f, true),
            29 => Self::new("Vec4h", Vec4h, true),
            30 => Self::new("Vec4i", Vec4i, true),
            31 => Self::new("Dictionary", Dictionary, false),
            32 => Self::new("TokenListOp", TokenListOp, false),
            33 => Self::new("StringListOp", StringListOp, false),
            34 => Self::new("PathListOp", PathListOp, false),
            35 => Self::new("ReferenceListOp", ReferenceListOp, false),
            36 => Self::new("IntListOp", IntListOp, false),
            37 => Self::new("Int64ListOp", Int64ListOp, false),
            38 => Self::new("UIntListOp", UIntListOp, false),
            39 => Self::new("UInt64ListOp", UInt64ListOp, false),
            40 => Self::new("PathVector", PathVector, false),
            41 => Self::new("TokenVector", TokenVector, false),
            42 => Self::new("Specifier", Specifier, false),
            43 => Self::new("Permission", Permission, false),
            44 => Self::new("Variability", Variability, false),
            45 => Self::new("VariantSelectionMap", VariantSelectionMap, false),
            46 => Self::new("TimeSamples", TimeSamples, false),
            47 => Self::new("Payload", Payload, false),
            48 => Self::new("DoubleVector", DoubleVector, false),
            49 => Self::new("LayerOffsetVector", LayerOffsetVector, false),
            50 => Self::new("StringVector", StringVector, false),
            51 => Self::new("ValueBlock", ValueBlock, false),
            52 => Self::new("Value", Value, false),
            53 => Self::new("UnregisteredValue", UnregisteredValue, false),
            54 => Self::new("UnregisteredValueListOp", UnregisteredValueListOp, false),
            55 => Self::new("PayloadListOp", PayloadListOp, false),
            56 => Self::new("TimeCode", TimeCode, true),
            _ => return None,
        };
        Some(t)
    }
}

/// A decoded value: scalar, array, or composite.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    BoolArray(Vec<bool>),
    UChar(u8),
    UCharArray(Vec<u8>),
    Int(i32),
    IntArray(Vec<i32>),
    UInt(u32),
    UIntArray(Vec<u32>),
    Int64(i64),
    Int64Array(Vec<i64>),
    UInt64(u64),
    UInt64Array(Vec<u64>),
    Half(f16),
    HalfArray(Vec<f16>),
    Float(f32),
    FloatArray(Vec<f32>),
    Double(f64),
    DoubleArray(Vec<f64>),
    String(String),
    StringArray(Vec<String>),
    Token(Token),
    TokenArray(Vec<Token>),
    AssetPath(AssetPath),
    AssetPathArray(Vec<AssetPath>),
    Matrix2d(DMat2),
    Matrix2dArray(Vec<DMat2>),
    Matrix3d(DMat3),
    Matrix3dArray(Vec<DMat3>),
    Matrix4d(DMat4),
    Matrix4dArray(Vec<DMat4>),
    Quatd(DQuat),
    QuatdArray(Vec<DQuat>),
    Quatf(Quat),
    QuatfArray(Vec<Quat>),
    Quath(HQuat),
    QuathArray(Vec<HQuat>),
    Vec2d(DVec2),
    Vec2dArray(Vec<DVec2>),
    Vec2f(Vec2),
    Vec2fArray(Vec<Vec2>),
    Vec2h(HVec2),
    Vec2hArray(Vec<HVec2>),
    Vec2i(IVec2),
    Vec2iArray(Vec<IVec2>),
    Vec3d(DVec3),
    Vec3dArray(Vec<DVec3>),
    Vec3f(Vec3),
    Vec3fArray(Vec<Vec3>),
    Vec3h(HVec3),
    Vec3hArray(Vec<HVec3>),
    Vec3i(IVec3),
    Vec3iArray(Vec<IVec3>),
    Vec4d(DVec4),
    Vec4dArray(Vec<DVec4>),
    Vec4f(Vec4),
    Vec4fArray(Vec<Vec4>),
    Vec4h(HVec4),
    Vec4hArray(Vec<HVec4>),
    Vec4i(IVec4),
    Vec4iArray(Vec<IVec4>),
    Dictionary(Dictionary),
    TokenListOp(ListOp<Token>),
    StringListOp(ListOp<String>),
    PathListOp(ListOp<Path>),
    ReferenceListOp(ListOp<Reference>),
    IntListOp(ListOp<i32>),
    Int64ListOp(ListOp<i64>),
    UIntListOp(ListOp<u32>),
    UInt64ListOp(ListOp<u64>),
    PayloadListOp(ListOp<Payload>),
    UnregisteredValueListOp(ListOp<String>),
    PathVector(Vec<Path>),
    TokenVector(Vec<Token>),
    Specifier(Specifier),
    Permission(Permission),
    Variability(Variability),
    VariantSelectionMap(VariantSelectionMap),
    TimeSamples(TimeSamples),
    Payload(Payload),
    DoubleVector(Vec<f64>),
    LayerOffsetVector(Vec<LayerOffset>),
    StringVector(Vec<String>),
    ValueBlock,
    UnregisteredValue(String),
    TimeCode(f64),
    TimeCodeArray(Vec<f64>),
}

impl Value {
    /// The wire type id of this value's underlying type.
    pub fn type_id(&self) -> TypeId {
        use Value::*;
        match self {
            Bool(_) | BoolArray(_) => TypeId::Bool,
            UChar(_) | UCharArray(_) => TypeId::UChar,
            Int(_) | IntArray(_) => TypeId::Int,
            UInt(_) | UIntArray(_) => TypeId::UInt,
            Int64(_) | Int64Array(_) => TypeId::Int64,
            UInt64(_) | UInt64Array(_) => TypeId::UInt64,
            Half(_) | HalfArray(_) => TypeId::Half,
            Float(_) | FloatArray(_) => TypeId::Float,
            Double(_) | DoubleArray(_) => TypeId::Double,
            String(_) | StringArray(_) => TypeId::String,
            Token(_) | TokenArray(_) => TypeId::Token,
            AssetPath(_) | AssetPathArray(_) => TypeId::AssetPath,
            Matrix2d(_) | Matrix2dArray(_) => TypeId::Matrix2d,
            Matrix3d(_) | Matrix3dArray(_) => TypeId::Matrix3d,
            Matrix4d(_) | Matrix4dArray(_) => TypeId::Matrix4d,
            Quatd(_) | QuatdArray(_) => TypeId::Quatd,
            Quatf(_) | QuatfArray(_) => TypeId::Quatf,
            Quath(_) | QuathArray(_) => TypeId::Quath,
            Vec2d(_) | Vec2dArray(_) => TypeId::Vec2d,
            Vec2f(_) | Vec2fArray(_) => TypeId::Vec2f,
            Vec2h(_) | Vec2hArray(_) => TypeId::Vec2h,
            Vec2i(_) | Vec2iArray(_) => TypeId::Vec2i,
            Vec3d(_) | Vec3dArray(_) => TypeId::Vec3d,
            Vec3f(_) | Vec3fArray(_) => TypeId::Vec3f,
            Vec3h(_) | Vec3hArray(_) => TypeId::Vec3h,
            Vec3i(_) | Vec3iArray(_) => TypeId::Vec3i,
            Vec4d(_) | Vec4dArray(_) => TypeId::Vec4d,
            Vec4f(_) | Vec4fArray(_) => TypeId::Vec4f,
            Vec4h(_) | Vec4hArray(_) => TypeId::Vec4h,
            Vec4i(_) | Vec4iArray(_) => TypeId::Vec4i,
            Dictionary(_) => TypeId::Dictionary,
            TokenListOp(_) => TypeId::TokenListOp,
            StringListOp(_) => TypeId::StringListOp,
            PathListOp(_) => TypeId::PathListOp,
            ReferenceListOp(_) => TypeId::ReferenceListOp,
            IntListOp(_) => TypeId::IntListOp,
            Int64ListOp(_) => TypeId::Int64ListOp,
            UIntListOp(_) => TypeId::UIntListOp,
            UInt64ListOp(_) => TypeId::UInt64ListOp,
            PayloadListOp(_) => TypeId::PayloadListOp,
            UnregisteredValueListOp(_) => TypeId::UnregisteredValueListOp,
            PathVector(_) => TypeId::PathVector,
            TokenVector(_) => TypeId::TokenVector,
            Specifier(_) => TypeId::Specifier,
            Permission(_) => TypeId::Permission,
            Variability(_) => TypeId::Variability,
            VariantSelectionMap(_) => TypeId::VariantSelectionMap,
            TimeSamples(_) => TypeId::TimeSamples,
            Payload(_) => TypeId::Payload,
            DoubleVector(_) => TypeId::DoubleVector,
            LayerOffsetVector(_) => TypeId::LayerOffsetVector,
            StringVector(_) => TypeId::StringVector,
            ValueBlock => TypeId::ValueBlock,
            UnregisteredValue(_) => TypeId::UnregisteredValue,
            TimeCode(_) | TimeCodeArray(_) => TypeId::TimeCode,
        }
    }

    /// True for the array form of an arrayable type.
    pub fn is_array(&self) -> bool {
        use Value::*;
        matches!(
            self,
            BoolArray(_)
                | UCharArray(_)
                | IntArray(_)
                | UIntArray(_)
                | Int64Array(_)
                | UInt64Array(_)
                | HalfArray(_)
                | FloatArray(_)
                | DoubleArray(_)
                | StringArray(_)
                | TokenArray(_)
                | AssetPathArray(_)
                | Matrix2dArray(_)
                | Matrix3dArray(_)
                | Matrix4dArray(_)
                | QuatdArray(_)
                | QuatfArray(_)
                | QuathArray(_)
                | Vec2dArray(_)
                | Vec2fArray(_)
                | Vec2hArray(_)
                | Vec2iArray(_)
                | Vec3dArray(_)
                | Vec3fArray(_)
                | Vec3hArray(_)
                | Vec3iArray(_)
                | Vec4dArray(_)
                | Vec4fArray(_)
                | Vec4hArray(_)
                | Vec4iArray(_)
                | TimeCodeArray(_)
        )
    }

    /// The ASCII-facing type name, e.g. `float3` or `float3[]`.
    pub fn type_name(&self) -> &'static str {
        use Value::*;
        match self {
            Bool(_) => "bool",
            BoolArray(_) => "bool[]",
            UChar(_) => "uchar",
            UCharArray(_) => "uchar[]",
            Int(_) => "int",
            IntArray(_) => "int[]",
            UInt(_) => "uint",
            UIntArray(_) => "uint[]",
            Int64(_) => "int64",
            Int64Array(_) => "int64[]",
            UInt64(_) => "uint64",
            UInt64Array(_) => "uint64[]",
            Half(_) => "half",
            HalfArray(_) => "half[]",
            Float(_) => "float",
            FloatArray(_) => "float[]",
            Double(_) => "double",
            DoubleArray(_) => "double[]",
            String(_) => "string",
            StringArray(_) => "string[]",
            Token(_) => "token",
            TokenArray(_) => "token[]",
            AssetPath(_) => "asset",
            AssetPathArray(_) => "asset[]",
            Matrix2d(_) => "matrix2d",
            Matrix2dArray(_) => "matrix2d[]",
            Matrix3d(_) => "matrix3d",
            Matrix3dArray(_) => "matrix3d[]",
            Matrix4d(_) => "matrix4d",
            Matrix4dArray(_) => "matrix4d[]",
            Quatd(_) => "quatd",
            QuatdArray(_) => "quatd[]",
            Quatf(_) => "quatf",
            QuatfArray(_) => "quatf[]",
            Quath(_) => "quath",
            QuathArray(_) => "quath[]",
            Vec2d(_) => "double2",
            Vec2dArray(_) => "double2[]",
            Vec2f(_) => "float2",
            Vec2fArray(_) => "float2[]",
            Vec2h(_) => "half2",
            Vec2hArray(_) => "half2[]",
            Vec2i(_) => "int2",
            Vec2iArray(_) => "int2[]",
            Vec3d(_) => "double3",
            Vec3dArray(_) => "double3[]",
            Vec3f(_) => "float3",
            Vec3fArray(_) => "float3[]",
            Vec3h(_) => "half3",
            Vec3hArray(_) => "half3[]",
            Vec3i(_) => "int3",
            Vec3iArray(_) => "int3[]",
            Vec4d(_) => "double4",
            Vec4dArray(_) => "double4[]",
            Vec4f(_) => "float4",
            Vec4fArray(_) => "float4[]",
            Vec4h(_) => "half4",
            Vec4hArray(_) => "half4[]",
            Vec4i(_) => "int4",
            Vec4iArray(_) => "int4[]",
            Dictionary(_) => "dictionary",
            TokenListOp(_) => "tokenListOp",
            StringListOp(_) => "stringListOp",
            PathListOp(_) => "pathListOp",
            ReferenceListOp(_) => "referenceListOp",
            IntListOp(_) => "intListOp",
            Int64ListOp(_) => "int64ListOp",
            UIntListOp(_) => "uintListOp",
            UInt64ListOp(_) => "uint64ListOp",
            PayloadListOp(_) => "payloadListOp",
            UnregisteredValueListOp(_) => "unregisteredValueListOp",
            PathVector(_) => "pathVector",
            TokenVector(_) => "tokenVector",
            Specifier(_) => "specifier",
            Permission(_) => "permission",
            Variability(_) => "variability",
            VariantSelectionMap(_) => "variantSelectionMap",
            TimeSamples(_) => "timeSamples",
            Payload(_) => "payload",
            DoubleVector(_) => "doubleVector",
            LayerOffsetVector(_) => "layerOffsetVector",
            StringVector(_) => "stringVector",
            ValueBlock => "None",
            UnregisteredValue(_) => "unregisteredValue",
            TimeCode(_) => "timecode",
            TimeCodeArray(_) => "timecode[]",
        }
    }
}

/// Map a role type name to its underlying storage type name, e.g.
/// `color3f` -> `float3`. Names without a role alias map to themselves.
pub fn underlying_type_name(name: &str) -> &str {
    match name {
        "color3f" | "normal3f" | "point3f" | "vector3f" | "texCoord3f" => "float3",
        "color3d" | "normal3d" | "point3d" | "vector3d" => "double3",
        "color3h" | "normal3h" | "point3h" | "vector3h" => "half3",
        "color4f" => "float4",
        "color4d" => "double4",
        "color4h" => "half4",
        "texCoord2f" => "float2",
        "texCoord2d" => "double2",
        "texCoord2h" => "half2",
        "frame4d" => "matrix4d",
        "timecode" => "double",
        _ => name,
    }
}

/// Typed extraction out of a [`Value`]. Used by the schema matchers: each
/// slot type knows its ASCII type name and how to pull itself out of the
/// generic sum.
pub trait ValueCast: Sized + Clone {
    /// The ASCII type name a slot of this type expects.
    const TYPE_NAME: &'static str;

    fn from_value(v: &Value) -> Option<Self>;
}

macro_rules! impl_value_cast {
    ($ty:ty, $name:literal, $scalar:ident, $array:ident) => {
        impl ValueCast for $ty {
            const TYPE_NAME: &'static str = $name;

            fn from_value(v: &Value) -> Option<Self> {
                match v {
                    Value::$scalar(x) => Some(x.clone()),
                    _ => None,
                }
            }
        }

        impl ValueCast for Vec<$ty> {
            const TYPE_NAME: &'static str = concat!($name, "[]");

            fn from_value(v: &Value) -> Option<Self> {
                match v {
                    Value::$array(xs) => Some(xs.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_value_cast!(bool, "bool", Bool, BoolArray);
impl_value_cast!(u8, "uchar", UChar, UCharArray);
impl_value_cast!(i32, "int", Int, IntArray);
impl_value_cast!(u32, "uint", UInt, UIntArray);
impl_value_cast!(i64, "int64", Int64, Int64Array);
impl_value_cast!(u64, "uint64", UInt64, UInt64Array);
impl_value_cast!(f16, "half", Half, HalfArray);
impl_value_cast!(f32, "float", Float, FloatArray);
impl_value_cast!(f64, "double", Double, DoubleArray);
impl_value_cast!(String, "string", String, StringArray);
impl_value_cast!(Token, "token", Token, TokenArray);
impl_value_cast!(AssetPath, "asset", AssetPath, AssetPathArray);
impl_value_cast!(DMat2, "matrix2d", Matrix2d, Matrix2dArray);
impl_value_cast!(DMat3, "matrix3d", Matrix3d, Matrix3dArray);
impl_value_cast!(DMat4, "matrix4d", Matrix4d, Matrix4dArray);
impl_value_cast!(DQuat, "quatd", Quatd, QuatdArray);
impl_value_cast!(Quat, "quatf", Quatf, QuatfArray);
impl_value_cast!(HQuat, "quath", Quath, QuathArray);
impl_value_cast!(DVec2, "double2", Vec2d, Vec2dArray);
impl_value_cast!(Vec2, "float2", Vec2f, Vec2fArray);
impl_value_cast!(HVec2, "half2", Vec2h, Vec2hArray);
impl_value_cast!(IVec2, "int2", Vec2i, Vec2iArray);
impl_value_cast!(DVec3, "double3", Vec3d, Vec3dArray);
impl_value_cast!(Vec3, "float3", Vec3f, Vec3fArray);
impl_value_cast!(HVec3, "half3", Vec3h, Vec3hArray);
impl_value_cast!(IVec3, "int3", Vec3i, Vec3iArray);
impl_value_cast!(DVec4, "double4", Vec4d, Vec4dArray);
impl_value_cast!(Vec4, "float4", Vec4f, Vec4fArray);
impl_value_cast!(HVec4, "half4", Vec4h, Vec4hArray);
impl_value_cast!(IVec4, "int4", Vec4i, Vec4iArray);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_table_ids() {
        assert_eq!(ValueType::from_id(1).unwrap().name, "Bool");
        assert_eq!(ValueType::from_id(24).unwrap().name, "Vec3f");
        assert!(ValueType::from_id(24).unwrap().supports_array);
        assert_eq!(ValueType::from_id(31).unwrap().name, "Dictionary");
        assert!(!ValueType::from_id(31).unwrap().supports_array);
        assert_eq!(ValueType::from_id(56).unwrap().name, "TimeCode");
        assert!(ValueType::from_id(0).is_none());
        assert!(ValueType::from_id(57).is_none());
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(Value::Float(1.0).type_name(), "float");
        assert_eq!(Value::Vec3fArray(vec![]).type_name(), "float3[]");
        assert_eq!(Value::Token(Token::new("up")).type_name(), "token");
        assert!(Value::Vec3fArray(vec![]).is_array());
        assert!(!Value::Vec3f(Vec3::ZERO).is_array());
    }

    #[test]
    fn test_value_cast() {
        let v = Value::Double(1.5);
        assert_eq!(f64::from_value(&v), Some(1.5));
        assert_eq!(f32::from_value(&v), None);

        let arr = Value::IntArray(vec![1, 2, 3]);
        assert_eq!(Vec::<i32>::from_value(&arr), Some(vec![1, 2, 3]));
        assert_eq!(<Vec<i32> as ValueCast>::TYPE_NAME, "int[]");
    }

    #[test]
    fn test_underlying_type_name() {
        assert_eq!(underlying_type_name("color3f"), "float3");
        assert_eq!(underlying_type_name("texCoord2f"), "float2");
        assert_eq!(underlying_type_name("float3"), "float3");
        assert_eq!(underlying_type_name("token"), "token");
    }
}
