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

//! JSON dump of the resolved field layouts, for tools that consume the
//! schema without parsing the generated C++.

use crate::ast::{ClientVersion, DefaultValue, StructDef};
use crate::{Config, Error};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct FieldLayout<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    ty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bits: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<&'a DefaultValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct StructLayout<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<ClientVersion>,
    #[serde(rename = "type")]
    ty: String,
    fields: Vec<FieldLayout<'a>>,
}

#[derive(Debug, Serialize)]
struct StructDecl<'a> {
    name: &'a str,
    namespace: &'a str,
    versioned: bool,
    layouts: Vec<StructLayout<'a>>,
}

fn struct_decl<'a>(def: &'a StructDef, config: &Config) -> Result<StructDecl<'a>, Error> {
    let mut layouts = vec![];
    for layout in def.layouts() {
        let ty = match layout.version {
            Some(version) => def.specialized_type(&config.version_enum, version)?,
            None => def.as_type(),
        };
        let mut fields = vec![];
        for field in layout.fields {
            fields.push(FieldLayout {
                name: &field.name,
                ty: field.ty.full_name()?,
                bits: field.bits,
                default: field.checked_default()?,
                comment: field.comment.as_deref(),
            });
        }
        layouts.push(StructLayout { version: layout.version, ty: ty.full_name()?, fields });
    }
    Ok(StructDecl {
        name: &def.name,
        namespace: &def.namespace,
        versioned: def.is_versioned(),
        layouts,
    })
}

/// Generate a JSON array describing every layout of every struct, in
/// declaration order.
pub fn generate(structs: &[StructDef], config: &Config) -> Result<String, Error> {
    let decls =
        structs.iter().map(|def| struct_decl(def, config)).collect::<Result<Vec<_>, _>>()?;
    Ok(serde_json::to_string_pretty(&decls)?)
}
