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

//! In-memory schema model: client versions, fields, versioned blocks and
//! struct definitions, plus the flattening of versioned blocks into the
//! field layout of one version.

use crate::types::{CxxType, FieldType};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Game client versions, in declared order.
///
/// Ordinals are not chronological: the `*_NEW` branches sort between the
/// original releases. Iterate [`ClientVersion::ALL`] rather than sorting
/// by ordinal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ClientVersion {
    Classic = 0,
    Tbc = 10,
    Wotlk = 20,
    Cata = 30,
    Mop = 40,
    Wod = 50,
    Legion = 60,
    Bfa = 70,
    Sl = 80,
    Df = 90,
    ClassicNew = 71,
    TbcNew = 81,
    WotlkNew = 91,
    /// Sentinel matching any version. Never specialized.
    Any = 100000,
}

impl ClientVersion {
    /// Concrete versions in declared order. [`ClientVersion::Any`] is
    /// excluded.
    pub const ALL: [ClientVersion; 13] = [
        ClientVersion::Classic,
        ClientVersion::Tbc,
        ClientVersion::Wotlk,
        ClientVersion::Cata,
        ClientVersion::Mop,
        ClientVersion::Wod,
        ClientVersion::Legion,
        ClientVersion::Bfa,
        ClientVersion::Sl,
        ClientVersion::Df,
        ClientVersion::ClassicNew,
        ClientVersion::TbcNew,
        ClientVersion::WotlkNew,
    ];

    pub fn ordinal(self) -> u32 {
        self as u32
    }

    /// Enumerator name, as used in the C++ enumeration.
    pub fn name(self) -> &'static str {
        match self {
            ClientVersion::Classic => "CLASSIC",
            ClientVersion::Tbc => "TBC",
            ClientVersion::Wotlk => "WOTLK",
            ClientVersion::Cata => "CATA",
            ClientVersion::Mop => "MOP",
            ClientVersion::Wod => "WOD",
            ClientVersion::Legion => "LEGION",
            ClientVersion::Bfa => "BFA",
            ClientVersion::Sl => "SL",
            ClientVersion::Df => "DF",
            ClientVersion::ClassicNew => "CLASSIC_NEW",
            ClientVersion::TbcNew => "TBC_NEW",
            ClientVersion::WotlkNew => "WOTLK_NEW",
            ClientVersion::Any => "ANY",
        }
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive range of client versions, compared by ordinal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    pub low: ClientVersion,
    pub high: ClientVersion,
}

impl VersionRange {
    pub fn new(low: ClientVersion, high: ClientVersion) -> Self {
        VersionRange { low, high }
    }

    pub fn contains(&self, version: ClientVersion) -> bool {
        self.low.ordinal() <= version.ordinal() && version.ordinal() <= self.high.ordinal()
    }

    pub fn is_inverted(&self) -> bool {
        self.low.ordinal() > self.high.ordinal()
    }

    /// Iterate the concrete versions inside the range, in declared order.
    pub fn versions(self) -> impl Iterator<Item = ClientVersion> {
        ClientVersion::ALL.into_iter().filter(move |v| self.contains(*v))
    }
}

impl From<RangeInclusive<ClientVersion>> for VersionRange {
    fn from(range: RangeInclusive<ClientVersion>) -> Self {
        let (low, high) = range.into_inner();
        VersionRange { low, high }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// Scalar value: numeric bound, or default value of a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i128),
    Float(f64),
    /// Verbatim C++ expression, e.g. an enumerator.
    Expr(String),
}

impl Value {
    pub fn is_integral(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    /// Infinities and NaN have no C++ literal.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Float(v) => v.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            // Debug formatting always keeps a fractional part or exponent.
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Expr(e) => f.write_str(e),
        }
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i128)
            }
        })*
    };
}

value_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(e: &str) -> Self {
        Value::Expr(e.to_owned())
    }
}

impl From<String> for Value {
    fn from(e: String) -> Self {
        Value::Expr(e)
    }
}

/// Default value of a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Scalar(Value),
    /// Tuple of scalars, emitted as a brace aggregate initializer.
    Aggregate(Vec<Value>),
}

impl DefaultValue {
    pub fn is_finite(&self) -> bool {
        match self {
            DefaultValue::Scalar(v) => v.is_finite(),
            DefaultValue::Aggregate(values) => values.iter().all(Value::is_finite),
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DefaultValue::Scalar(v) => write!(f, "{}", v),
            DefaultValue::Aggregate(values) => {
                let values: Vec<_> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{{ {} }}", values.join(", "))
            }
        }
    }
}

/// One structure member.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub ty: FieldType,
    pub name: String,
    /// Width of a bitfield member.
    pub bits: Option<u32>,
    pub default: Option<DefaultValue>,
    pub comment: Option<String>,
}

impl Field {
    pub fn new(ty: impl Into<FieldType>, name: impl Into<String>) -> Self {
        Field { ty: ty.into(), name: name.into(), bits: None, default: None, comment: None }
    }

    pub fn bits(mut self, bits: u32) -> Self {
        self.bits = Some(bits);
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Scalar(value.into()));
        self
    }

    pub fn default_tuple<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.default = Some(DefaultValue::Aggregate(values.into_iter().map(Into::into).collect()));
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Default value of the field. Fails if the default cannot be
    /// written as a C++ literal.
    pub fn checked_default(&self) -> Result<Option<&DefaultValue>, Error> {
        match &self.default {
            Some(default) if !default.is_finite() => Err(Error::NonFiniteDefault {
                field: self.name.clone(),
                value: default.clone(),
            }),
            default => Ok(default.as_ref()),
        }
    }
}

/// Entry of a struct or of a versioned block.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Field(Field),
    Block(VersionedBlock),
}

impl Entry {
    fn resolve_into<'a>(&'a self, version: ClientVersion, fields: &mut Vec<&'a Field>) {
        match self {
            Entry::Field(field) => fields.push(field),
            Entry::Block(block) => block.resolve_into(version, fields),
        }
    }
}

impl From<Field> for Entry {
    fn from(field: Field) -> Self {
        Entry::Field(field)
    }
}

impl From<VersionedBlock> for Entry {
    fn from(block: VersionedBlock) -> Self {
        Entry::Block(block)
    }
}

/// Group of entries present only for the versions inside `range`.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedBlock {
    pub range: VersionRange,
    pub entries: Vec<Entry>,
}

impl VersionedBlock {
    pub fn new(range: impl Into<VersionRange>) -> Self {
        VersionedBlock { range: range.into(), entries: vec![] }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.entries.push(Entry::Field(field));
        self
    }

    pub fn block(mut self, block: VersionedBlock) -> Self {
        self.entries.push(Entry::Block(block));
        self
    }

    /// Return the fields of the block active at `version`, depth-first,
    /// in declaration order. Empty if `version` is outside the range.
    pub fn resolve(&self, version: ClientVersion) -> Vec<&Field> {
        let mut fields = vec![];
        self.resolve_into(version, &mut fields);
        fields
    }

    fn resolve_into<'a>(&'a self, version: ClientVersion, fields: &mut Vec<&'a Field>) {
        if !self.range.contains(version) {
            return;
        }
        for entry in &self.entries {
            entry.resolve_into(version, fields);
        }
    }
}

/// Flatten a sequence of entries for `version`.
pub fn resolve_entries(entries: &[Entry], version: ClientVersion) -> Vec<&Field> {
    let mut fields = vec![];
    for entry in entries {
        entry.resolve_into(version, &mut fields);
    }
    fields
}

/// Field layout of a struct for one version, or the single layout of an
/// unversioned struct.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout<'a> {
    pub version: Option<ClientVersion>,
    pub fields: Vec<&'a Field>,
}

/// Named, namespaced aggregate of fields and versioned blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub namespace: String,
    pub versions: Option<VersionRange>,
    pub entries: Vec<Entry>,
    /// Documentation emitted verbatim before the declaration.
    pub doc: Option<String>,
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        StructDef {
            name: name.into(),
            namespace: String::new(),
            versions: None,
            entries: vec![],
            doc: None,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn versions(mut self, range: impl Into<VersionRange>) -> Self {
        self.versions = Some(range.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.entries.push(Entry::Field(field));
        self
    }

    pub fn block(mut self, block: VersionedBlock) -> Self {
        self.entries.push(Entry::Block(block));
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// A struct is versioned when it declares a version range or contains
    /// at least one versioned block.
    pub fn is_versioned(&self) -> bool {
        self.versions.is_some() || self.entries.iter().any(|e| matches!(e, Entry::Block(_)))
    }

    /// A struct without a version range is enabled for every version.
    pub fn is_version_enabled(&self, version: ClientVersion) -> bool {
        self.versions.map_or(true, |range| range.contains(version))
    }

    /// Concrete versions this struct is specialized for, in declared order.
    pub fn enabled_versions(&self) -> impl Iterator<Item = ClientVersion> + '_ {
        ClientVersion::ALL.into_iter().filter(move |v| self.is_version_enabled(*v))
    }

    /// Name qualified with the struct namespace.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.namespace, self.name)
        }
    }

    /// Type descriptor of the struct. Versioned structs are templates
    /// taking the client version as single argument.
    pub fn as_type(&self) -> CxxType {
        let ty = CxxType::new(&self.name).with_namespace(&self.namespace);
        if self.is_versioned() {
            ty.with_arity(1)
        } else {
            ty
        }
    }

    /// Type descriptor of the struct bound to one version of
    /// `version_enum`. Unversioned structs are returned as is.
    pub fn specialized_type(
        &self,
        version_enum: &str,
        version: ClientVersion,
    ) -> Result<CxxType, Error> {
        let ty = self.as_type();
        if self.is_versioned() {
            ty.specialize([format!("{}::{}", version_enum, version)])
        } else {
            Ok(ty)
        }
    }

    /// Field layouts: one per enabled version for versioned structs,
    /// a single unversioned layout otherwise.
    pub fn layouts(&self) -> Vec<Layout<'_>> {
        if !self.is_versioned() {
            let fields = self
                .entries
                .iter()
                .filter_map(|entry| match entry {
                    Entry::Field(field) => Some(field),
                    Entry::Block(_) => None,
                })
                .collect();
            return vec![Layout { version: None, fields }];
        }

        self.enabled_versions()
            .map(|version| Layout {
                version: Some(version),
                fields: resolve_entries(&self.entries, version),
            })
            .collect()
    }
}
