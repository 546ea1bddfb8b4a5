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

//! C++ type descriptors.

use crate::ast::Value;
use crate::limits::{self, PrimitiveKind};
use crate::Error;
use serde::Serialize;
use std::collections::BTreeSet;

/// Immutable description of a C++ type.
///
/// A descriptor is a template when it declares a non-zero arity or
/// carries template arguments. Specialization returns a new descriptor
/// and leaves `self` untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CxxType {
    name: String,
    namespace: String,
    headers: BTreeSet<String>,
    arity: usize,
    template_args: Vec<String>,
    /// Set on the base type of primitive numeric descriptors.
    #[serde(skip)]
    primitive: Option<PrimitiveKind>,
    /// Bounds of the innermost elements of numeric arrays.
    #[serde(skip)]
    element: Option<Box<NumericType>>,
}

/// Template argument: a literal, or another type whose qualified name is
/// substituted and whose headers are carried over.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateArg {
    Literal(String),
    Type(CxxType),
}

impl CxxType {
    pub fn new(name: impl Into<String>) -> Self {
        CxxType {
            name: name.into(),
            namespace: String::new(),
            headers: BTreeSet::new(),
            arity: 0,
            template_args: vec![],
            primitive: None,
            element: None,
        }
    }

    /// Type from namespace `std`, defined in `header`.
    pub fn std(name: impl Into<String>, header: impl Into<String>) -> Self {
        CxxType::new(name).with_namespace("std").with_header(header)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.headers.insert(header.into());
        self
    }

    /// Declare the template parameters. The arity becomes the number of
    /// parameters, which stay bound as placeholders until specialized.
    pub fn with_template_params<S: Into<String>>(
        mut self,
        params: impl IntoIterator<Item = S>,
    ) -> Self {
        self.template_args = params.into_iter().map(Into::into).collect();
        self.arity = self.template_args.len();
        self
    }

    /// Declare a template of `arity` parameters without binding any
    /// argument. The name cannot be qualified until specialized.
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self.template_args.clear();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn headers(&self) -> &BTreeSet<String> {
        &self.headers
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn template_args(&self) -> &[String] {
        &self.template_args
    }

    /// Numeric type of the elements, for arrays of numeric values.
    /// Nested arrays report the innermost element type.
    pub fn element(&self) -> Option<&NumericType> {
        self.element.as_deref()
    }

    pub fn is_template(&self) -> bool {
        self.arity != 0 || !self.template_args.is_empty()
    }

    /// Name qualified with the namespace, without template arguments.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.namespace, self.name)
        }
    }

    /// Fully qualified name, including template arguments.
    ///
    /// Fails if the number of bound arguments differs from the arity.
    pub fn full_name(&self) -> Result<String, Error> {
        let mut name = self.qualified_name();
        if self.is_template() {
            if self.template_args.len() != self.arity {
                return Err(Error::Arity {
                    type_name: name,
                    expected: self.arity,
                    actual: self.template_args.len(),
                });
            }
            name.push('<');
            name.push_str(&self.template_args.join(", "));
            name.push('>');
        }
        Ok(name)
    }

    /// Bind the template arguments.
    ///
    /// Fails if the number of arguments differs from the arity.
    pub fn specialize<A: Into<TemplateArg>>(
        &self,
        args: impl IntoIterator<Item = A>,
    ) -> Result<CxxType, Error> {
        let args: Vec<TemplateArg> = args.into_iter().map(Into::into).collect();
        if args.len() != self.arity {
            return Err(Error::Arity {
                type_name: self.qualified_name(),
                expected: self.arity,
                actual: args.len(),
            });
        }

        let mut headers = self.headers.clone();
        let mut template_args = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                TemplateArg::Literal(literal) => template_args.push(literal),
                TemplateArg::Type(ty) => {
                    template_args.push(ty.full_name()?);
                    headers.extend(ty.headers);
                }
            }
        }

        Ok(CxxType { headers, template_args, ..self.clone() })
    }

    /// `std::array` of `dim` elements of this type.
    pub fn array_of(&self, dim: usize) -> Result<CxxType, Error> {
        let mut array = CxxType::std("array", "array")
            .with_arity(2)
            .specialize([TemplateArg::Type(self.clone()), TemplateArg::from(dim)])?;
        array.element = match (&self.element, self.primitive) {
            (Some(element), _) => Some(element.clone()),
            (None, Some(kind)) => Some(Box::new(NumericType::primitive(kind, self.clone()))),
            (None, None) => None,
        };
        Ok(array)
    }
}

impl From<&str> for TemplateArg {
    fn from(literal: &str) -> Self {
        TemplateArg::Literal(literal.to_owned())
    }
}

impl From<String> for TemplateArg {
    fn from(literal: String) -> Self {
        TemplateArg::Literal(literal)
    }
}

impl From<usize> for TemplateArg {
    fn from(value: usize) -> Self {
        TemplateArg::Literal(value.to_string())
    }
}

impl From<CxxType> for TemplateArg {
    fn from(ty: CxxType) -> Self {
        TemplateArg::Type(ty)
    }
}

impl From<&CxxType> for TemplateArg {
    fn from(ty: &CxxType) -> Self {
        TemplateArg::Type(ty.clone())
    }
}

impl From<&NumericType> for TemplateArg {
    fn from(ty: &NumericType) -> Self {
        TemplateArg::Type(ty.base.clone())
    }
}

impl From<NumericType> for TemplateArg {
    fn from(ty: NumericType) -> Self {
        TemplateArg::Type(ty.base)
    }
}

/// Numeric type descriptor with an inclusive value range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericType {
    base: CxxType,
    min: Value,
    max: Value,
    kind: Option<PrimitiveKind>,
}

impl NumericType {
    /// Create a numeric descriptor. `min` and `max` must both be integers
    /// or both be floating point values.
    pub fn new(
        base: CxxType,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Result<Self, Error> {
        let (min, max) = (min.into(), max.into());
        match (&min, &max) {
            (Value::Int(_), Value::Int(_)) | (Value::Float(_), Value::Float(_)) => {
                Ok(NumericType { base, min, max, kind: None })
            }
            _ => Err(Error::RangeInconsistency { type_name: base.qualified_name(), min, max }),
        }
    }

    /// Descriptor of a primitive kind, with bounds from [`limits::limits`].
    pub fn primitive(kind: PrimitiveKind, base: CxxType) -> Self {
        let (min, max) = limits::limits(kind);
        let base = CxxType { primitive: Some(kind), ..base };
        NumericType { base, min, max, kind: Some(kind) }
    }

    /// `std::array` of `dim` elements of this type. The elements keep
    /// the bounds of this descriptor.
    pub fn array_of(&self, dim: usize) -> Result<CxxType, Error> {
        let mut array = self.base.array_of(dim)?;
        array.element = Some(Box::new(self.clone()));
        Ok(array)
    }

    pub fn as_type(&self) -> &CxxType {
        &self.base
    }

    pub fn kind(&self) -> Option<PrimitiveKind> {
        self.kind
    }

    pub fn min(&self) -> &Value {
        &self.min
    }

    pub fn max(&self) -> &Value {
        &self.max
    }

    pub fn is_integral(&self) -> bool {
        self.min.is_integral()
    }

    /// Check that `value` fits the type.
    ///
    /// The value kind must match the descriptor kind. Integral ranges are
    /// closed; floating ranges exclude the minimum.
    pub fn check_bounds(&self, value: impl Into<Value>) -> bool {
        match (&self.min, &self.max, value.into()) {
            (Value::Int(min), Value::Int(max), Value::Int(v)) => *min <= v && v <= *max,
            (Value::Float(min), Value::Float(max), Value::Float(v)) => *min < v && v <= *max,
            _ => false,
        }
    }
}

/// Type of a field: any type, or a numeric type with known bounds.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Plain(CxxType),
    Numeric(NumericType),
}

impl FieldType {
    pub fn cxx_type(&self) -> &CxxType {
        match self {
            FieldType::Plain(ty) => ty,
            FieldType::Numeric(ty) => ty.as_type(),
        }
    }

    pub fn numeric(&self) -> Option<&NumericType> {
        match self {
            FieldType::Plain(_) => None,
            FieldType::Numeric(ty) => Some(ty),
        }
    }

    pub fn full_name(&self) -> Result<String, Error> {
        self.cxx_type().full_name()
    }
}

impl From<CxxType> for FieldType {
    fn from(ty: CxxType) -> Self {
        FieldType::Plain(ty)
    }
}

impl From<NumericType> for FieldType {
    fn from(ty: NumericType) -> Self {
        FieldType::Numeric(ty)
    }
}
