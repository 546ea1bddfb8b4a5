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

//! Built-in numeric type descriptors.

use crate::limits::PrimitiveKind;
use crate::types::{CxxType, NumericType};

fn fixed_width(kind: PrimitiveKind) -> NumericType {
    NumericType::primitive(kind, CxxType::std(kind.cxx_name(), "cstdint"))
}

fn floating(kind: PrimitiveKind) -> NumericType {
    NumericType::primitive(kind, CxxType::new(kind.cxx_name()))
}

pub fn u8() -> NumericType {
    fixed_width(PrimitiveKind::U8)
}

pub fn u16() -> NumericType {
    fixed_width(PrimitiveKind::U16)
}

pub fn u32() -> NumericType {
    fixed_width(PrimitiveKind::U32)
}

pub fn u64() -> NumericType {
    fixed_width(PrimitiveKind::U64)
}

pub fn i8() -> NumericType {
    fixed_width(PrimitiveKind::I8)
}

pub fn i16() -> NumericType {
    fixed_width(PrimitiveKind::I16)
}

pub fn i32() -> NumericType {
    fixed_width(PrimitiveKind::I32)
}

pub fn i64() -> NumericType {
    fixed_width(PrimitiveKind::I64)
}

pub fn f32() -> NumericType {
    floating(PrimitiveKind::F32)
}

pub fn f64() -> NumericType {
    floating(PrimitiveKind::F64)
}
