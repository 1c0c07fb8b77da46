//! Value representation unpacking.
//!
//! A field's 8-byte rep either inlines its payload, points at an external
//! encoding, or points at an array body (raw or compressed). Composite
//! types (dictionaries, list ops, time samples) recurse with a bounded
//! depth.

use bytemuck::Pod;
use half::f16;

use super::format::{Index, ValueRep};
use super::reader::CrateReader;
use crate::path::Path;
use crate::token::Token;
use crate::util::{
    DMat2, DMat3, DMat4, DQuat, DVec2, DVec3, DVec4, Error, HQuat, HVec2, HVec3, HVec4, IVec2,
    IVec3, IVec4, Quat, Result, Vec2, Vec3, Vec4,
};
use crate::value::{
    listop, AssetPath, Dictionary, LayerOffset, ListOp, Payload, Permission, Reference,
    Specifier, TimeSamples, TypeId, Value, ValueType, Variability,
};

/// Hard bound on nested value recursion (dictionaries inside
/// dictionaries, time samples of dictionaries, ...).
const MAX_RECURSION_DEPTH: u32 = 64;

/// Sign-extend the low `bits` of an inline payload.
fn sign_extend(payload: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((payload << shift) as i64) >> shift
}

impl<'a> CrateReader<'a> {
    /// Decode one value rep into a tagged value.
    pub fn unpack_value(&mut self, rep: ValueRep) -> Result<Value> {
        self.unpack_value_at_depth(rep, 0)
    }

    fn unpack_value_at_depth(&mut self, rep: ValueRep, depth: u32) -> Result<Value> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(Error::invalid("value recursion too deep"));
        }
        let vt = ValueType::from_id(rep.type_id()).ok_or(Error::UnknownTypeId(rep.type_id()))?;

        if rep.is_array() {
            if !vt.supports_array {
                return Err(Error::invalid(format!(
                    "type {} does not support arrays",
                    vt.name
                )));
            }
            self.sr.seek(rep.payload())?;
            return self.unpack_array(vt.id, rep.is_compressed());
        }
        if rep.is_inlined() {
            return self.unpack_inlined(vt.id, rep.payload());
        }
        self.sr.seek(rep.payload())?;
        self.unpack_external_scalar(vt.id, depth)
    }

    // ------------------------------------------------------------------
    // Inlined scalars
    // ------------------------------------------------------------------

    fn unpack_inlined(&mut self, id: TypeId, payload: u64) -> Result<Value> {
        // Inline vector/matrix forms pack one int8 per component
        // (diagonal for matrices).
        let b = payload.to_le_bytes();
        let i8c = |i: usize| b[i] as i8;
        let f = |i: usize| i8c(i) as f32;
        let d = |i: usize| i8c(i) as f64;
        let h = |i: usize| f16::from_f32(i8c(i) as f32);

        let v = match id {
            TypeId::Bool => Value::Bool(payload & 1 != 0),
            TypeId::UChar => Value::UChar(b[0]),
            TypeId::Int => Value::Int(sign_extend(payload, 32) as i32),
            TypeId::UInt => Value::UInt(payload as u32),
            TypeId::Int64 => Value::Int64(sign_extend(payload, 32)),
            TypeId::UInt64 => Value::UInt64(payload as u32 as u64),
            TypeId::Half => Value::Half(f16::from_bits(payload as u16)),
            TypeId::Float => Value::Float(f32::from_bits(payload as u32)),
            // Doubles inline as their float image, widened on read.
            TypeId::Double => Value::Double(f32::from_bits(payload as u32) as f64),
            TypeId::TimeCode => Value::TimeCode(f32::from_bits(payload as u32) as f64),
            TypeId::String => {
                Value::String(self.string_token(Index(payload as u32))?.as_str().to_string())
            }
            TypeId::Token => Value::Token(self.token(Index(payload as u32))?.clone()),
            TypeId::AssetPath => Value::AssetPath(AssetPath::new(
                self.token(Index(payload as u32))?.as_str(),
            )),
            TypeId::Specifier => Value::Specifier(
                Specifier::from_ordinal(payload)
                    .ok_or_else(|| Error::invalid("bad specifier ordinal"))?,
            ),
            TypeId::Permission => Value::Permission(
                Permission::from_ordinal(payload)
                    .ok_or_else(|| Error::invalid("bad permission ordinal"))?,
            ),
            TypeId::Variability => Value::Variability(
                Variability::from_ordinal(payload)
                    .ok_or_else(|| Error::invalid("bad variability ordinal"))?,
            ),
            TypeId::Vec2i => Value::Vec2i(IVec2::new(i8c(0) as i32, i8c(1) as i32)),
            TypeId::Vec3i => Value::Vec3i(IVec3::new(i8c(0) as i32, i8c(1) as i32, i8c(2) as i32)),
            TypeId::Vec4i => Value::Vec4i(IVec4::new(
                i8c(0) as i32,
                i8c(1) as i32,
                i8c(2) as i32,
                i8c(3) as i32,
            )),
            TypeId::Vec2f => Value::Vec2f(Vec2::new(f(0), f(1))),
            TypeId::Vec3f => Value::Vec3f(Vec3::new(f(0), f(1), f(2))),
            TypeId::Vec4f => Value::Vec4f(Vec4::new(f(0), f(1), f(2), f(3))),
            TypeId::Vec2d => Value::Vec2d(DVec2::new(d(0), d(1))),
            TypeId::Vec3d => Value::Vec3d(DVec3::new(d(0), d(1), d(2))),
            TypeId::Vec4d => Value::Vec4d(DVec4::new(d(0), d(1), d(2), d(3))),
            TypeId::Vec2h => Value::Vec2h(HVec2::new(h(0), h(1))),
            TypeId::Vec3h => Value::Vec3h(HVec3::new(h(0), h(1), h(2))),
            TypeId::Vec4h => Value::Vec4h(HVec4::new(h(0), h(1), h(2), h(3))),
            TypeId::Matrix2d => {
                Value::Matrix2d(DMat2::from_diagonal(DVec2::new(d(0), d(1))))
            }
            TypeId::Matrix3d => {
                Value::Matrix3d(DMat3::from_diagonal(DVec3::new(d(0), d(1), d(2))))
            }
            TypeId::Matrix4d => Value::Matrix4d(DMat4::from_diagonal(DVec4::new(
                d(0),
                d(1),
                d(2),
                d(3),
            ))),
            TypeId::ValueBlock => Value::ValueBlock,
            // Empty composite forms may be inlined with a zero payload.
            TypeId::Dictionary => Value::Dictionary(Dictionary::new()),
            TypeId::TokenVector => Value::TokenVector(Vec::new()),
            TypeId::PathVector => Value::PathVector(Vec::new()),
            TypeId::StringVector => Value::StringVector(Vec::new()),
            TypeId::DoubleVector => Value::DoubleVector(Vec::new()),
            other => {
                return Err(Error::invalid(format!(
                    "type id {:?} cannot be inlined",
                    other
                )))
            }
        };
        Ok(v)
    }

    // ------------------------------------------------------------------
    // External scalars
    // ------------------------------------------------------------------

    fn unpack_external_scalar(&mut self, id: TypeId, depth: u32) -> Result<Value> {
        let v = match id {
            TypeId::Bool => Value::Bool(self.sr.read_u8()? != 0),
            TypeId::UChar => Value::UChar(self.sr.read_u8()?),
            TypeId::Int => Value::Int(self.sr.read_i32()?),
            TypeId::UInt => Value::UInt(self.sr.read_u32()?),
            TypeId::Int64 => Value::Int64(self.sr.read_i64()?),
            TypeId::UInt64 => Value::UInt64(self.sr.read_u64()?),
            TypeId::Half => Value::Half(self.sr.read_f16()?),
            TypeId::Float => Value::Float(self.sr.read_f32()?),
            TypeId::Double => Value::Double(self.sr.read_f64()?),
            TypeId::TimeCode => Value::TimeCode(self.sr.read_f64()?),
            TypeId::String => {
                let idx = Index(self.sr.read_u32()?);
                Value::String(self.string_token(idx)?.as_str().to_string())
            }
            TypeId::Token => {
                let idx = Index(self.sr.read_u32()?);
                Value::Token(self.token(idx)?.clone())
            }
            TypeId::AssetPath => {
                let idx = Index(self.sr.read_u32()?);
                Value::AssetPath(AssetPath::new(self.token(idx)?.as_str()))
            }
            TypeId::Specifier => Value::Specifier(
                Specifier::from_ordinal(self.sr.read_u32()? as u64)
                    .ok_or_else(|| Error::invalid("bad specifier ordinal"))?,
            ),
            TypeId::Permission => Value::Permission(
                Permission::from_ordinal(self.sr.read_u32()? as u64)
                    .ok_or_else(|| Error::invalid("bad permission ordinal"))?,
            ),
            TypeId::Variability => Value::Variability(
                Variability::from_ordinal(self.sr.read_u32()? as u64)
                    .ok_or_else(|| Error::invalid("bad variability ordinal"))?,
            ),
            TypeId::Quath => {
                let v: Vec<f16> = self.read_pod_elements(4)?;
                Value::Quath(HQuat::from_xyzw(v[0], v[1], v[2], v[3]))
            }
            TypeId::Quatf => {
                let v: Vec<f32> = self.read_pod_elements(4)?;
                Value::Quatf(Quat::from_xyzw(v[0], v[1], v[2], v[3]))
            }
            TypeId::Quatd => {
                let v: Vec<f64> = self.read_pod_elements(4)?;
                Value::Quatd(DQuat::from_xyzw(v[0], v[1], v[2], v[3]))
            }
            TypeId::Vec2i => {
                let v: Vec<i32> = self.read_pod_elements(2)?;
                Value::Vec2i(IVec2::from_slice(&v))
            }
            TypeId::Vec3i => {
                let v: Vec<i32> = self.read_pod_elements(3)?;
                Value::Vec3i(IVec3::from_slice(&v))
            }
            TypeId::Vec4i => {
                let v: Vec<i32> = self.read_pod_elements(4)?;
                Value::Vec4i(IVec4::from_slice(&v))
            }
            TypeId::Vec2h => {
                let v: Vec<f16> = self.read_pod_elements(2)?;
                Value::Vec2h(HVec2::new(v[0], v[1]))
            }
            TypeId::Vec3h => {
                let v: Vec<f16> = self.read_pod_elements(3)?;
                Value::Vec3h(HVec3::new(v[0], v[1], v[2]))
            }
            TypeId::Vec4h => {
                let v: Vec<f16> = self.read_pod_elements(4)?;
                Value::Vec4h(HVec4::new(v[0], v[1], v[2], v[3]))
            }
            TypeId::Vec2f => {
                let v: Vec<f32> = self.read_pod_elements(2)?;
                Value::Vec2f(Vec2::from_slice(&v))
            }
            TypeId::Vec3f => {
                let v: Vec<f32> = self.read_pod_elements(3)?;
                Value::Vec3f(Vec3::from_slice(&v))
            }
            TypeId::Vec4f => {
                let v: Vec<f32> = self.read_pod_elements(4)?;
                Value::Vec4f(Vec4::from_slice(&v))
            }
            TypeId::Vec2d => {
                let v: Vec<f64> = self.read_pod_elements(2)?;
                Value::Vec2d(DVec2::from_slice(&v))
            }
            TypeId::Vec3d => {
                let v: Vec<f64> = self.read_pod_elements(3)?;
                Value::Vec3d(DVec3::from_slice(&v))
            }
            TypeId::Vec4d => {
                let v: Vec<f64> = self.read_pod_elements(4)?;
                Value::Vec4d(DVec4::from_slice(&v))
            }
            TypeId::Matrix2d => {
                let v: Vec<f64> = self.read_pod_elements(4)?;
                Value::Matrix2d(DMat2::from_cols_slice(&v))
            }
            TypeId::Matrix3d => {
                let v: Vec<f64> = self.read_pod_elements(9)?;
                Value::Matrix3d(DMat3::from_cols_slice(&v))
            }
            TypeId::Matrix4d => {
                let v: Vec<f64> = self.read_pod_elements(16)?;
                Value::Matrix4d(DMat4::from_cols_slice(&v))
            }
            TypeId::Dictionary => Value::Dictionary(self.read_dictionary(depth)?),
            TypeId::TokenListOp => Value::TokenListOp(self.read_listop(Self::read_token_item)?),
            TypeId::StringListOp => {
                Value::StringListOp(self.read_listop(Self::read_string_item)?)
            }
            TypeId::PathListOp => Value::PathListOp(self.read_listop(Self::read_path_item)?),
            TypeId::ReferenceListOp => {
                Value::ReferenceListOp(self.read_listop(Self::read_reference_item)?)
            }
            TypeId::PayloadListOp => {
                Value::PayloadListOp(self.read_listop(Self::read_payload_item)?)
            }
            TypeId::IntListOp => Value::IntListOp(self.read_listop(|r| r.sr.read_i32())?),
            TypeId::Int64ListOp => Value::Int64ListOp(self.read_listop(|r| r.sr.read_i64())?),
            TypeId::UIntListOp => Value::UIntListOp(self.read_listop(|r| r.sr.read_u32())?),
            TypeId::UInt64ListOp => {
                Value::UInt64ListOp(self.read_listop(|r| r.sr.read_u64())?)
            }
            TypeId::UnregisteredValueListOp => {
                Value::UnregisteredValueListOp(self.read_listop(Self::read_string_item)?)
            }
            TypeId::PathVector => {
                let n = self.read_vector_count()?;
                let mut out = Vec::with_capacity(n);
                for _ in 0..n {
                    out.push(self.read_path_item()?);
                }
                Value::PathVector(out)
            }
            TypeId::TokenVector => {
                let n = self.read_vector_count()?;
                let mut out = Vec::with_capacity(n);
                for _ in 0..n {
                    out.push(self.read_token_item()?);
                }
                Value::TokenVector(out)
            }
            TypeId::StringVector => {
                let n = self.read_vector_count()?;
                let mut out = Vec::with_capacity(n);
                for _ in 0..n {
                    out.push(self.read_string_item()?);
                }
                Value::StringVector(out)
            }
            TypeId::DoubleVector => {
                let n = self.read_vector_count()?;
                self.account_memory((n * 8) as u64)?;
                let mut out = Vec::with_capacity(n);
                for _ in 0..n {
                    out.push(self.sr.read_f64()?);
                }
                Value::DoubleVector(out)
            }
            TypeId::LayerOffsetVector => {
                let n = self.read_vector_count()?;
                let mut out = Vec::with_capacity(n);
                for _ in 0..n {
                    out.push(LayerOffset {
                        offset: self.sr.read_f64()?,
                        scale: self.sr.read_f64()?,
                    });
                }
                Value::LayerOffsetVector(out)
            }
            TypeId::VariantSelectionMap => {
                let n = self.read_vector_count()?;
                let mut map = std::collections::BTreeMap::new();
                for _ in 0..n {
                    let k = self.read_string_item()?;
                    let v = self.read_string_item()?;
                    map.insert(k, v);
                }
                Value::VariantSelectionMap(map)
            }
            TypeId::Payload => Value::Payload(self.read_payload_item()?),
            TypeId::TimeSamples => Value::TimeSamples(self.read_time_samples(depth)?),
            TypeId::UnregisteredValue => Value::UnregisteredValue(self.read_string_item()?),
            TypeId::ValueBlock => Value::ValueBlock,
            TypeId::Value | TypeId::Invalid => {
                return Err(Error::UnknownTypeId(id as i32));
            }
        };
        Ok(v)
    }

    // ------------------------------------------------------------------
    // Composite helpers
    // ------------------------------------------------------------------

    fn read_vector_count(&mut self) -> Result<usize> {
        let n = self.sr.read_u64()?;
        if n > self.config.max_array_elements as u64 {
            return Err(Error::LimitExceeded {
                what: "vector elements",
                value: n,
                max: self.config.max_array_elements as u64,
            });
        }
        Ok(n as usize)
    }

    fn read_token_item(&mut self) -> Result<Token> {
        let idx = Index(self.sr.read_u32()?);
        Ok(self.token(idx)?.clone())
    }

    fn read_string_item(&mut self) -> Result<String> {
        let idx = Index(self.sr.read_u32()?);
        Ok(self.string_token(idx)?.as_str().to_string())
    }

    fn read_path_item(&mut self) -> Result<Path> {
        let idx = Index(self.sr.read_u32()?);
        Ok(self.path(idx)?.clone())
    }

    fn read_layer_offset(&mut self) -> Result<LayerOffset> {
        Ok(LayerOffset {
            offset: self.sr.read_f64()?,
            scale: self.sr.read_f64()?,
        })
    }

    fn read_reference_item(&mut self) -> Result<Reference> {
        let asset = self.read_string_item()?;
        let prim_path = self.read_path_item()?;
        let layer_offset = self.read_layer_offset()?;
        Ok(Reference {
            asset_path: asset,
            prim_path,
            layer_offset,
        })
    }

    fn read_payload_item(&mut self) -> Result<Payload> {
        let asset = self.read_string_item()?;
        let prim_path = self.read_path_item()?;
        let layer_offset = self.read_layer_offset()?;
        Ok(Payload {
            asset_path: asset,
            prim_path,
            layer_offset,
        })
    }

    fn read_listop<T>(
        &mut self,
        mut read_item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<ListOp<T>> {
        let flags = self.sr.read_u8()?;
        let mut op = ListOp::<T>::default();
        op.is_explicit = flags & listop::bits::IS_EXPLICIT != 0;

        let mut read_items = |r: &mut Self| -> Result<Vec<T>> {
            let n = r.read_vector_count()?;
            let mut items = Vec::with_capacity(n);
            for _ in 0..n {
                items.push(read_item(r)?);
            }
            Ok(items)
        };

        if flags & listop::bits::HAS_EXPLICIT_ITEMS != 0 {
            op.explicit_items = read_items(self)?;
        }
        if flags & listop::bits::HAS_ADDED_ITEMS != 0 {
            op.added_items = read_items(self)?;
        }
        if flags & listop::bits::HAS_PREPENDED_ITEMS != 0 {
            op.prepended_items = read_items(self)?;
        }
        if flags & listop::bits::HAS_APPENDED_ITEMS != 0 {
            op.appended_items = read_items(self)?;
        }
        if flags & listop::bits::HAS_DELETED_ITEMS != 0 {
            op.deleted_items = read_items(self)?;
        }
        if flags & listop::bits::HAS_ORDERED_ITEMS != 0 {
            op.ordered_items = read_items(self)?;
        }
        Ok(op)
    }

    fn read_dictionary(&mut self, depth: u32) -> Result<Dictionary> {
        let n = self.sr.read_u64()?;
        if n > self.config.max_dict_elements as u64 {
            return Err(Error::LimitExceeded {
                what: "dictionary elements",
                value: n,
                max: self.config.max_dict_elements as u64,
            });
        }
        let mut dict = Dictionary::new();
        for _ in 0..n {
            let key = self.read_token_item()?.as_str().to_string();
            let rep = ValueRep(self.sr.read_u64()?);
            let saved = self.sr.snapshot();
            let value = self.unpack_value_at_depth(rep, depth + 1)?;
            self.sr.restore(saved);
            if dict.insert(key.clone(), value).is_some() {
                self.warnings
                    .push(format!("duplicate dictionary key `{}`; latest wins", key));
            }
        }
        Ok(dict)
    }

    fn read_time_samples(&mut self, depth: u32) -> Result<TimeSamples> {
        // Times are a recursive value rep (a doubles array), then a
        // packed vector of per-sample reps.
        let times_rep = ValueRep(self.sr.read_u64()?);
        let saved = self.sr.snapshot();
        let times_value = self.unpack_value_at_depth(times_rep, depth + 1)?;
        self.sr.restore(saved);
        let times: Vec<f64> = match times_value {
            Value::DoubleArray(v) => v,
            Value::DoubleVector(v) => v,
            other => {
                return Err(Error::invalid(format!(
                    "time samples times must be double[], got {}",
                    other.type_name()
                )))
            }
        };

        let n = self.read_vector_count()?;
        if n != times.len() {
            return Err(Error::invalid(format!(
                "time samples declare {} times but {} values",
                times.len(),
                n
            )));
        }
        let mut reps = Vec::with_capacity(n);
        for _ in 0..n {
            reps.push(ValueRep(self.sr.read_u64()?));
        }

        let mut ts = TimeSamples::new();
        for (t, rep) in times.into_iter().zip(reps) {
            let value = self.unpack_value_at_depth(rep, depth + 1)?;
            if matches!(value, Value::ValueBlock) {
                ts.add_blocked(t);
            } else {
                ts.add_sample(t, value);
            }
        }
        Ok(ts)
    }

    // ------------------------------------------------------------------
    // Arrays
    // ------------------------------------------------------------------

    /// Read `n` POD elements at the cursor, tolerating unaligned input.
    fn read_pod_elements<T: Pod>(&mut self, n: usize) -> Result<Vec<T>> {
        let bytes = self.sr.read_bytes(n * std::mem::size_of::<T>())?;
        Ok(bytemuck::pod_collect_to_vec(bytes))
    }

    fn read_array_count(&mut self) -> Result<usize> {
        let n = self.sr.read_u64()?;
        if n > self.config.max_array_elements as u64 {
            return Err(Error::LimitExceeded {
                what: "array elements",
                value: n,
                max: self.config.max_array_elements as u64,
            });
        }
        Ok(n as usize)
    }

    fn unpack_array(&mut self, id: TypeId, compressed: bool) -> Result<Value> {
        let count = self.read_array_count()?;

        if compressed {
            return self.unpack_compressed_array(id, count);
        }

        let v = match id {
            TypeId::Bool => {
                let raw: Vec<u8> = self.read_raw_array(count, 1)?;
                Value::BoolArray(raw.into_iter().map(|b| b != 0).collect())
            }
            TypeId::UChar => Value::UCharArray(self.read_raw_array(count, 1)?),
            TypeId::Int => Value::IntArray(self.read_raw_array(count, 4)?),
            TypeId::UInt => Value::UIntArray(self.read_raw_array(count, 4)?),
            TypeId::Int64 => Value::Int64Array(self.read_raw_array(count, 8)?),
            TypeId::UInt64 => Value::UInt64Array(self.read_raw_array(count, 8)?),
            TypeId::Half => Value::HalfArray(self.read_raw_array(count, 2)?),
            TypeId::Float => Value::FloatArray(self.read_raw_array(count, 4)?),
            TypeId::Double => Value::DoubleArray(self.read_raw_array(count, 8)?),
            TypeId::TimeCode => Value::TimeCodeArray(self.read_raw_array(count, 8)?),
            TypeId::Vec2h => Value::Vec2hArray(self.read_raw_array(count, 4)?),
            TypeId::Vec3h => Value::Vec3hArray(self.read_raw_array(count, 6)?),
            TypeId::Vec4h => Value::Vec4hArray(self.read_raw_array(count, 8)?),
            TypeId::Quath => Value::QuathArray(self.read_raw_array(count, 8)?),
            TypeId::Vec2f => {
                let f: Vec<f32> = self.read_raw_array(count * 2, 4)?;
                Value::Vec2fArray(f.chunks_exact(2).map(Vec2::from_slice).collect())
            }
            TypeId::Vec3f => {
                let f: Vec<f32> = self.read_raw_array(count * 3, 4)?;
                Value::Vec3fArray(f.chunks_exact(3).map(Vec3::from_slice).collect())
            }
            TypeId::Vec4f => {
                let f: Vec<f32> = self.read_raw_array(count * 4, 4)?;
                Value::Vec4fArray(f.chunks_exact(4).map(Vec4::from_slice).collect())
            }
            TypeId::Quatf => {
                let f: Vec<f32> = self.read_raw_array(count * 4, 4)?;
                Value::QuatfArray(
                    f.chunks_exact(4)
                        .map(|c| Quat::from_xyzw(c[0], c[1], c[2], c[3]))
                        .collect(),
                )
            }
            TypeId::Vec2d => {
                let f: Vec<f64> = self.read_raw_array(count * 2, 8)?;
                Value::Vec2dArray(f.chunks_exact(2).map(DVec2::from_slice).collect())
            }
            TypeId::Vec3d => {
                let f: Vec<f64> = self.read_raw_array(count * 3, 8)?;
                Value::Vec3dArray(f.chunks_exact(3).map(DVec3::from_slice).collect())
            }
            TypeId::Vec4d => {
                let f: Vec<f64> = self.read_raw_array(count * 4, 8)?;
                Value::Vec4dArray(f.chunks_exact(4).map(DVec4::from_slice).collect())
            }
            TypeId::Quatd => {
                let f: Vec<f64> = self.read_raw_array(count * 4, 8)?;
                Value::QuatdArray(
                    f.chunks_exact(4)
                        .map(|c| DQuat::from_xyzw(c[0], c[1], c[2], c[3]))
                        .collect(),
                )
            }
            TypeId::Vec2i => {
                let f: Vec<i32> = self.read_raw_array(count * 2, 4)?;
                Value::Vec2iArray(f.chunks_exact(2).map(IVec2::from_slice).collect())
            }
            TypeId::Vec3i => {
                let f: Vec<i32> = self.read_raw_array(count * 3, 4)?;
                Value::Vec3iArray(f.chunks_exact(3).map(IVec3::from_slice).collect())
            }
            TypeId::Vec4i => {
                let f: Vec<i32> = self.read_raw_array(count * 4, 4)?;
                Value::Vec4iArray(f.chunks_exact(4).map(IVec4::from_slice).collect())
            }
            TypeId::Matrix2d => {
                let f: Vec<f64> = self.read_raw_array(count * 4, 8)?;
                Value::Matrix2dArray(f.chunks_exact(4).map(DMat2::from_cols_slice).collect())
            }
            TypeId::Matrix3d => {
                let f: Vec<f64> = self.read_raw_array(count * 9, 8)?;
                Value::Matrix3dArray(f.chunks_exact(9).map(DMat3::from_cols_slice).collect())
            }
            TypeId::Matrix4d => {
                let f: Vec<f64> = self.read_raw_array(count * 16, 8)?;
                Value::Matrix4dArray(f.chunks_exact(16).map(DMat4::from_cols_slice).collect())
            }
            TypeId::Token => {
                let mut out = Vec::with_capacity(count);
                for _ in 0..count {
                    out.push(self.read_token_item()?);
                }
                Value::TokenArray(out)
            }
            TypeId::String => {
                let mut out = Vec::with_capacity(count);
                for _ in 0..count {
                    out.push(self.read_string_item()?);
                }
                Value::StringArray(out)
            }
            TypeId::AssetPath => {
                if count > self.config.max_asset_path_elements {
                    return Err(Error::LimitExceeded {
                        what: "asset path elements",
                        value: count as u64,
                        max: self.config.max_asset_path_elements as u64,
                    });
                }
                let mut out = Vec::with_capacity(count);
                for _ in 0..count {
                    let idx = Index(self.sr.read_u32()?);
                    out.push(AssetPath::new(self.token(idx)?.as_str()));
                }
                Value::AssetPathArray(out)
            }
            other => {
                return Err(Error::invalid(format!(
                    "unsupported array element type {:?}",
                    other
                )))
            }
        };
        Ok(v)
    }

    fn read_raw_array<T: Pod>(&mut self, n_elements: usize, elem_size: usize) -> Result<Vec<T>> {
        let total = n_elements
            .checked_mul(elem_size)
            .ok_or_else(|| Error::invalid("array byte size overflow"))?;
        self.account_memory(total as u64)?;
        let bytes = self.sr.read_bytes(total)?;
        Ok(bytemuck::pod_collect_to_vec(bytes))
    }

    fn unpack_compressed_array(&mut self, id: TypeId, count: usize) -> Result<Value> {
        let v = match id {
            TypeId::Int => Value::IntArray(self.read_compressed_ints_32(count)?),
            TypeId::UInt => Value::UIntArray(
                self.read_compressed_ints_32(count)?
                    .into_iter()
                    .map(|v| v as u32)
                    .collect(),
            ),
            TypeId::Int64 => Value::Int64Array(self.read_compressed_ints_64(count)?),
            TypeId::UInt64 => Value::UInt64Array(
                self.read_compressed_ints_64(count)?
                    .into_iter()
                    .map(|v| v as u64)
                    .collect(),
            ),
            TypeId::Half => {
                Value::HalfArray(self.read_compressed_floats(count, f16::from_f32)?)
            }
            TypeId::Float => Value::FloatArray(self.read_compressed_floats(count, |f| f)?),
            TypeId::Double => {
                Value::DoubleArray(self.read_compressed_doubles(count)?)
            }
            other => {
                return Err(Error::invalid(format!(
                    "type {:?} has no compressed array form",
                    other
                )))
            }
        };
        Ok(v)
    }

    /// Compressed float path: flag `b'i'` stores integral values through
    /// the int codec; flag `b't'` stores a table of distinct values plus
    /// integer-coded indices.
    fn read_compressed_floats<T>(&mut self, count: usize, convert: impl Fn(f32) -> T) -> Result<Vec<T>> {
        let code = self.sr.read_u8()?;
        match code {
            b'i' => {
                let ints = self.read_compressed_ints_32(count)?;
                Ok(ints.into_iter().map(|v| convert(v as f32)).collect())
            }
            b't' => {
                let table_len = self.sr.read_u32()? as usize;
                let table: Vec<f32> = self.read_pod_elements(table_len)?;
                let indices = self.read_compressed_ints_32(count)?;
                let mut out = Vec::with_capacity(count);
                for idx in indices {
                    let f = *table.get(idx as usize).ok_or_else(|| {
                        Error::UnresolvedReference(format!(
                            "float table index {} out of range",
                            idx
                        ))
                    })?;
                    out.push(convert(f));
                }
                Ok(out)
            }
            other => Err(Error::invalid(format!(
                "unknown compressed-float code {:#x}",
                other
            ))),
        }
    }

    fn read_compressed_doubles(&mut self, count: usize) -> Result<Vec<f64>> {
        let code = self.sr.read_u8()?;
        match code {
            b'i' => {
                let ints = self.read_compressed_ints_32(count)?;
                Ok(ints.into_iter().map(|v| v as f64).collect())
            }
            b't' => {
                let table_len = self.sr.read_u32()? as usize;
                let table: Vec<f64> = self.read_pod_elements(table_len)?;
                let indices = self.read_compressed_ints_32(count)?;
                let mut out = Vec::with_capacity(count);
                for idx in indices {
                    let f = *table.get(idx as usize).ok_or_else(|| {
                        Error::UnresolvedReference(format!(
                            "double table index {} out of range",
                            idx
                        ))
                    })?;
                    out.push(f);
                }
                Ok(out)
            }
            other => Err(Error::invalid(format!(
                "unknown compressed-double code {:#x}",
                other
            ))),
        }
    }
}

// f16 from the half crate, with the bytemuck feature, satisfies Pod;
// integer decoding of half tables goes through f32.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0xffff_ffff, 32), -1);
        assert_eq!(sign_extend(0x7fff_ffff, 32), i32::MAX as i64);
        assert_eq!(sign_extend(0x80, 8), -128);
        assert_eq!(sign_extend(0x7f, 8), 127);
    }
}
