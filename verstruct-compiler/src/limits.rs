// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Numeric representation introspection.
//!
//! Bounds are derived from the bit width and signedness of each kind, and
//! for floating kinds from the largest finite IEEE-754 bit patterns, so
//! they are exact regardless of how the host formats numbers.

use crate::ast::Value;
use serde::Serialize;

/// Largest finite `binary32` value.
const FLOAT_MAX_BITS: u32 = 0x7f7f_ffff;
/// Smallest finite `binary32` value.
const FLOAT_MIN_BITS: u32 = 0xff7f_ffff;
/// Largest finite `binary64` value.
const DOUBLE_MAX_BITS: u64 = 0x7fef_ffff_ffff_ffff;
/// Smallest finite `binary64` value.
const DOUBLE_MIN_BITS: u64 = 0xffef_ffff_ffff_ffff;

/// Primitive numeric kinds of the target language.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl PrimitiveKind {
    /// Size of the representation in bytes.
    pub fn size(self) -> usize {
        match self {
            PrimitiveKind::U8 | PrimitiveKind::I8 => 1,
            PrimitiveKind::U16 | PrimitiveKind::I16 => 2,
            PrimitiveKind::U32 | PrimitiveKind::I32 | PrimitiveKind::F32 => 4,
            PrimitiveKind::U64 | PrimitiveKind::I64 | PrimitiveKind::F64 => 8,
        }
    }

    pub fn width(self) -> usize {
        self.size() * 8
    }

    pub fn is_integral(self) -> bool {
        !matches!(self, PrimitiveKind::F32 | PrimitiveKind::F64)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            PrimitiveKind::I8
                | PrimitiveKind::I16
                | PrimitiveKind::I32
                | PrimitiveKind::I64
                | PrimitiveKind::F32
                | PrimitiveKind::F64
        )
    }

    /// Name of the type in C++, without namespace.
    pub fn cxx_name(self) -> &'static str {
        match self {
            PrimitiveKind::U8 => "uint8_t",
            PrimitiveKind::U16 => "uint16_t",
            PrimitiveKind::U32 => "uint32_t",
            PrimitiveKind::U64 => "uint64_t",
            PrimitiveKind::I8 => "int8_t",
            PrimitiveKind::I16 => "int16_t",
            PrimitiveKind::I32 => "int32_t",
            PrimitiveKind::I64 => "int64_t",
            PrimitiveKind::F32 => "float",
            PrimitiveKind::F64 => "double",
        }
    }
}

/// Return the exact `(min, max)` pair representable by `kind`.
pub fn limits(kind: PrimitiveKind) -> (Value, Value) {
    match kind {
        PrimitiveKind::F32 => (
            Value::Float(f32::from_bits(FLOAT_MIN_BITS) as f64),
            Value::Float(f32::from_bits(FLOAT_MAX_BITS) as f64),
        ),
        PrimitiveKind::F64 => {
            (
                Value::Float(f64::from_bits(DOUBLE_MIN_BITS)),
                Value::Float(f64::from_bits(DOUBLE_MAX_BITS)),
            )
        }
        _ if kind.is_signed() => {
            let half = 1i128 << (kind.width() - 1);
            (Value::Int(-half), Value::Int(half - 1))
        }
        _ => (Value::Int(0), Value::Int((1i128 << kind.width()) - 1)),
    }
}
