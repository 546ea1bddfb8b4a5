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

//! C++ compiler backend.
//!
//! Emits one header containing the struct definitions grouped by
//! namespace, followed by the reflection descriptors of every struct.
//! Versioned structs are emitted as a template primary declaration and
//! one full specialization per enabled client version.

use crate::ast::{ClientVersion, Field, Layout, StructDef};
use crate::{Config, Error};
use log::{debug, trace};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Template argument selecting `version` in the C++ version enumeration.
fn version_arg(config: &Config, version: ClientVersion) -> String {
    format!("{}::{}", config.version_enum, version)
}

/// Generate the member declaration of a field.
pub fn generate_field(field: &Field) -> Result<String, Error> {
    let mut line = format!("{} {}", field.ty.full_name()?, field.name);
    if let Some(bits) = field.bits {
        line.push_str(&format!(" : {}", bits));
    }
    if let Some(default) = field.checked_default()? {
        line.push_str(&format!(" = {}", default));
    }
    line.push(';');
    if let Some(comment) = &field.comment {
        line.push_str(&format!(" ///< {}", comment));
    }
    Ok(line)
}

/// Generate the static factory returning a value-initialized struct with
/// every defaulted field assigned, in layout order.
fn generate_default_init(name: &str, fields: &[&Field], config: &Config) -> String {
    let (i1, i2) = (config.indent(1), config.indent(2));
    let mut code = String::new();
    code.push_str(&format!("{i1}static {name} {}()\n", config.default_init));
    code.push_str(&format!("{i1}{{\n"));
    code.push_str(&format!("{i2}auto ret = {name}{{}};\n"));
    for field in fields {
        if let Some(default) = &field.default {
            code.push_str(&format!("{i2}ret.{} = {};\n", field.name, default));
        }
    }
    code.push_str(&format!("{i2}return ret;\n"));
    code.push_str(&format!("{i1}}}\n"));
    code
}

fn generate_struct_body(
    def: &StructDef,
    declarator: &str,
    fields: &[&Field],
    config: &Config,
) -> Result<String, Error> {
    let mut code = format!("{declarator}\n{{\n");
    for field in fields {
        code.push_str(&config.indent(1));
        code.push_str(&generate_field(field)?);
        code.push('\n');
    }
    code.push('\n');
    code.push_str(&generate_default_init(&def.name, fields, config));
    code.push_str("};\n\n");
    Ok(code)
}

/// Generate the definition of a struct: a single definition when the
/// struct is unversioned, otherwise a primary template declaration and
/// one specialization per enabled version.
pub fn generate_struct(def: &StructDef, config: &Config) -> Result<String, Error> {
    let mut code = String::new();
    if let Some(doc) = &def.doc {
        code.push_str(doc);
        if !doc.ends_with('\n') {
            code.push('\n');
        }
    }

    if !def.is_versioned() {
        debug!("generating unversioned struct {}", def.qualified_name());
        let layout = def.layouts();
        let fields = layout.first().map(|l| l.fields.as_slice()).unwrap_or_default();
        let declarator = format!("struct {}", def.name);
        code.push_str(&generate_struct_body(def, &declarator, fields, config)?);
        return Ok(code);
    }

    code.push_str(&format!(
        "template<{} {}>\nstruct {};\n\n",
        config.version_enum, config.version_param, def.name
    ));

    let layouts = def.layouts();
    debug!(
        "generating versioned struct {} with {} specializations",
        def.qualified_name(),
        layouts.len()
    );
    for Layout { version, fields } in &layouts {
        let Some(version) = version else { continue };
        trace!("{} for {}: {} fields", def.name, version, fields.len());
        let declarator =
            format!("template<>\nstruct {}<{}>", def.name, version_arg(config, *version));
        code.push_str(&generate_struct_body(def, &declarator, fields, config)?);
    }
    Ok(code)
}

/// Generate the reflection descriptors of a struct, one per layout, listing
/// the fields in the same order as the generated definition.
pub fn generate_reflection(def: &StructDef, config: &Config) -> Result<String, Error> {
    let mut code = String::new();
    for layout in def.layouts() {
        let ty = match layout.version {
            Some(version) => def.specialized_type(&config.version_enum, version)?,
            None => def.as_type(),
        };
        code.push_str(&format!("{}(\n", config.reflection_macro));
        code.push_str(&format!("{}{}\n", config.indent(1), ty.full_name()?));
        for field in &layout.fields {
            code.push_str(&format!("{}, {}\n", config.indent(1), field.name));
        }
        code.push_str(");\n\n");
    }
    Ok(code)
}

/// Headers required by the types of the fields of all enabled layouts.
fn collect_headers(structs: &[StructDef]) -> BTreeSet<String> {
    let mut headers = BTreeSet::new();
    for def in structs {
        for layout in def.layouts() {
            for field in layout.fields {
                headers.extend(field.ty.cxx_type().headers().iter().cloned());
            }
        }
    }
    headers
}

fn open_namespace(code: &mut String, namespace: &str) {
    if !namespace.is_empty() {
        debug!("opening namespace {}", namespace);
        code.push_str(&format!("namespace {}\n{{\n\n", namespace));
    }
}

fn close_namespace(code: &mut String, namespace: &str) {
    if !namespace.is_empty() {
        code.push_str(&format!("}} // namespace {}\n\n", namespace));
    }
}

/// Generate a complete header for `structs`.
///
/// Definitions are grouped by namespace, in namespace order; structs
/// sharing a namespace keep their relative order. Reflection descriptors
/// follow in the original order.
pub fn generate(structs: &[StructDef], config: &Config) -> Result<String, Error> {
    debug!("generating {} structs", structs.len());
    let mut code = String::new();

    for line in &config.banner {
        code.push_str(&format!("// {}\n", line));
    }
    if !config.banner.is_empty() {
        code.push('\n');
    }
    code.push_str("#pragma once\n\n");

    for header in &config.include_headers {
        code.push_str(&format!("#include <{}>\n", header));
    }
    if !config.include_headers.is_empty() {
        code.push('\n');
    }

    let type_headers: Vec<_> = collect_headers(structs)
        .into_iter()
        .filter(|header| !config.include_headers.contains(header))
        .collect();
    for header in &type_headers {
        code.push_str(&format!("#include <{}>\n", header));
    }
    if !type_headers.is_empty() {
        code.push('\n');
    }

    // Vec::sort_by is stable.
    let mut sorted: Vec<&StructDef> = structs.iter().collect();
    sorted.sort_by(|a, b| a.namespace.cmp(&b.namespace));

    let mut namespace: Option<&str> = None;
    for def in sorted {
        if namespace != Some(def.namespace.as_str()) {
            if let Some(previous) = namespace {
                close_namespace(&mut code, previous);
            }
            open_namespace(&mut code, &def.namespace);
            namespace = Some(def.namespace.as_str());
        }
        code.push_str(&generate_struct(def, config)?);
    }
    if let Some(namespace) = namespace {
        close_namespace(&mut code, namespace);
    }

    for def in structs {
        code.push_str(&generate_reflection(def, config)?);
    }

    Ok(code.trim_end().to_owned() + "\n")
}

/// Write the generated header to a writer.
pub fn write_to<W: Write>(
    structs: &[StructDef],
    config: &Config,
    mut writer: W,
) -> Result<(), Error> {
    let code = generate(structs, config)?;
    writer.write_all(code.as_bytes())?;
    Ok(())
}

/// Write the generated header to a file.
pub fn write_to_file(
    structs: &[StructDef],
    config: &Config,
    path: impl AsRef<Path>,
) -> Result<(), Error> {
    let code = generate(structs, config)?;
    fs::write(path, code)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ClientVersion::*, VersionedBlock};
    use crate::builtins;
    use crate::test_utils::{assert_contains, assert_not_contains, assert_snapshot_eq};
    use crate::types::CxxType;
    use googletest::prelude::{assert_that, eq};

    fn test_struct() -> StructDef {
        StructDef::new("TestStruct")
            .namespace("ADT::DataStructures")
            .versions(Cata..=Mop)
            .doc("/**\n * Test structure\n * Continuation line.\n */")
            .field(Field::new(builtins::u8(), "test_field").default(0).comment("Test comment"))
            .field(Field::new(builtins::u16(), "test_field1").default(0).comment("Test comment 1"))
            .block(
                VersionedBlock::new(Cata..=Cata).field(
                    Field::new(builtins::f64(), "test_optional")
                        .default(0.0)
                        .comment("Double field"),
                ),
            )
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_versioned_struct_snapshot() {
        let code = generate(&[test_struct()], &Config::default()).unwrap();
        assert_snapshot_eq("tests/generated/versioned_struct.hpp", &code);
    }

    #[test]
    fn test_namespaces_snapshot() {
        let flags = StructDef::new("Flags")
            .namespace("WDT")
            .field(Field::new(builtins::u8(), "has_mccv").bits(1).default(0))
            .field(Field::new(builtins::u8(), "reserved").bits(7));
        let vertex = StructDef::new("Vertex")
            .namespace("ADT")
            .field(
                Field::new(builtins::f32().as_type().array_of(3).unwrap(), "position")
                    .default_tuple([0.0, 0.0, 0.0])
                    .comment("World position"),
            )
            .field(Field::new(CxxType::std("string", "string"), "name"));
        let chunk = StructDef::new("Chunk")
            .namespace("WDT")
            .versions(Sl..=Df)
            .field(Field::new(builtins::u32(), "id").default(0))
            .block(
                VersionedBlock::new(TbcNew..=TbcNew)
                    .field(Field::new(builtins::i16(), "offset").default(-1)),
            );

        let code = generate(&[flags, vertex, chunk], &Config::default()).unwrap();
        assert_snapshot_eq("tests/generated/namespaces.hpp", &code);
    }

    #[test]
    fn test_specialization_per_enabled_version() {
        let code = generate_struct(&test_struct(), &Config::default()).unwrap();
        assert_that!(count(&code, "template<IO::Common::ClientVersions client_version>"), eq(1));
        assert_that!(count(&code, "template<>\n"), eq(2));
        assert_contains(&code, "struct TestStruct<IO::Common::ClientVersions::CATA>");
        assert_contains(&code, "struct TestStruct<IO::Common::ClientVersions::MOP>");
        // Disabled versions get no specialization, not an empty one.
        assert_not_contains(&code, "ClientVersions::WOTLK>");
        assert_not_contains(&code, "ClientVersions::WOD>");
        assert_not_contains(&code, "ClientVersions::ANY>");
    }

    #[test]
    fn test_versioned_block_fields_per_version() {
        let code = generate_struct(&test_struct(), &Config::default()).unwrap();
        let (cata, mop) =
            code.split_once("struct TestStruct<IO::Common::ClientVersions::MOP>").unwrap();
        assert_that!(count(cata, "double test_optional = 0.0;"), eq(1));
        assert_that!(count(cata, "ret.test_optional = 0.0;"), eq(1));
        assert_not_contains(mop, "test_optional");
        assert_that!(count(mop, "ret.test_field"), eq(2));
    }

    #[test]
    fn test_unranged_struct_with_blocks() {
        let def = StructDef::new("Loose").block(
            VersionedBlock::new(Wod..=Wod).field(Field::new(builtins::u8(), "only_wod")),
        );
        let code = generate_struct(&def, &Config::default()).unwrap();
        assert_that!(count(&code, "template<>\n"), eq(ClientVersion::ALL.len()));
        assert_that!(count(&code, "only_wod;"), eq(1));
        assert_not_contains(&code, "ClientVersions::ANY>");
    }

    #[test]
    fn test_default_initializers() {
        let pair = builtins::u8().as_type().array_of(2).unwrap();
        let kind = CxxType::new("Kind").with_namespace("IO");
        let def = StructDef::new("Defaults")
            .field(Field::new(pair, "pair").default_tuple([1, 2]))
            .field(Field::new(builtins::f32(), "scale").default(0.0))
            .field(Field::new(builtins::u32(), "plain"))
            .field(Field::new(kind, "kind").default("IO::Kind::None"));
        let code = generate_struct(&def, &Config::default()).unwrap();
        assert_contains(&code, "    ret.pair = { 1, 2 };\n");
        assert_contains(&code, "    ret.scale = 0.0;\n");
        assert_contains(&code, "    ret.kind = IO::Kind::None;\n");
        assert_not_contains(&code, "ret.plain");
        assert_contains(&code, "  std::uint32_t plain;\n");
        assert_contains(&code, "  IO::Kind kind = IO::Kind::None;\n");
    }

    #[test]
    fn test_field_declarations() {
        assert_eq!(generate_field(&Field::new(builtins::u16(), "x")).unwrap(), "std::uint16_t x;");
        assert_eq!(
            generate_field(&Field::new(builtins::u8(), "flag").bits(1).default(1).comment("a flag"))
                .unwrap(),
            "std::uint8_t flag : 1 = 1; ///< a flag"
        );
        let unbound = CxxType::new("Foo").with_arity(1);
        assert!(matches!(generate_field(&Field::new(unbound, "x")), Err(Error::Arity { .. })));
    }

    #[test]
    fn test_reflection_mirrors_layout() {
        let def = test_struct();
        let config = Config::default();
        let reflection = generate_reflection(&def, &config).unwrap();
        assert_that!(count(&reflection, "REFLECTION_DESCRIPTOR(\n"), eq(2));
        assert_contains(
            &reflection,
            "REFLECTION_DESCRIPTOR(\n  ADT::DataStructures::TestStruct<IO::Common::ClientVersions::CATA>\n  , test_field\n  , test_field1\n  , test_optional\n);\n",
        );

        let plain = StructDef::new("Plain").field(Field::new(builtins::u8(), "a"));
        assert_eq!(
            generate_reflection(&plain, &config).unwrap(),
            "REFLECTION_DESCRIPTOR(\n  Plain\n  , a\n);\n\n"
        );
    }

    #[test]
    fn test_namespace_grouping_is_stable() {
        let structs = [
            StructDef::new("First").namespace("B"),
            StructDef::new("Second").namespace("A"),
            StructDef::new("Third").namespace("B"),
        ];
        let code = generate(&structs, &Config::default()).unwrap();
        let a = code.find("struct Second").unwrap();
        let b1 = code.find("struct First").unwrap();
        let b2 = code.find("struct Third").unwrap();
        assert!(a < b1 && b1 < b2);
        assert_that!(count(&code, "namespace B\n{"), eq(1));
        assert_that!(count(&code, "} // namespace B"), eq(1));

        // Reflection descriptors keep the declaration order.
        let r1 = code.find("  B::First\n").unwrap();
        let r2 = code.find("  A::Second\n").unwrap();
        let r3 = code.find("  B::Third\n").unwrap();
        assert!(r1 < r2 && r2 < r3);
    }

    #[test]
    fn test_global_namespace() {
        let code = generate(&[StructDef::new("Global")], &Config::default()).unwrap();
        assert_not_contains(&code, "namespace");
        assert_contains(&code, "struct Global\n{\n");
    }

    #[test]
    fn test_empty_input() {
        let code = generate(&[], &Config::default()).unwrap();
        assert_eq!(
            code,
            "// File generated by verstruct.\n// /!\\ Do not edit by hand\n\n#pragma once\n\n#include <IO/Common.hpp>\n#include <Utils/Meta/Reflection.hpp>\n"
        );
    }

    #[test]
    fn test_custom_config() {
        let config = Config {
            version_enum: "Versions".to_owned(),
            reflection_macro: "REFLECT".to_owned(),
            default_init: "Make".to_owned(),
            indent: "\t".to_owned(),
            ..Config::default()
        };
        let code = generate(&[test_struct()], &config).unwrap();
        assert_contains(&code, "template<Versions client_version>\nstruct TestStruct;");
        assert_contains(&code, "\tstatic TestStruct Make()\n");
        assert_contains(&code, "REFLECT(\n\tADT::DataStructures::TestStruct<Versions::CATA>\n");
    }

    #[test]
    fn test_doc_is_verbatim() {
        let def = StructDef::new("Documented").doc("/// Doc line.  \n");
        let code = generate_struct(&def, &Config::default()).unwrap();
        assert!(code.starts_with("/// Doc line.  \nstruct Documented\n"));

        let def = StructDef::new("Documented").doc("/// Doc line.\n///\n\n");
        let code = generate_struct(&def, &Config::default()).unwrap();
        assert!(code.starts_with("/// Doc line.\n///\n\nstruct Documented\n"));
    }

    #[test]
    fn test_non_finite_default_aborts_generation() {
        let bounds = builtins::f32().array_of(3).unwrap();
        let def = StructDef::new("Box")
            .field(Field::new(bounds, "min").default_tuple([f32::INFINITY, f32::NAN, 0.0]));
        assert!(matches!(
            generate(&[def], &Config::default()),
            Err(Error::NonFiniteDefault { ref field, .. }) if field == "min"
        ));
    }

    #[test]
    fn test_arity_error_aborts_generation() {
        let def =
            StructDef::new("Broken").field(Field::new(CxxType::new("Foo").with_arity(2), "x"));
        assert!(matches!(generate(&[def], &Config::default()), Err(Error::Arity { .. })));
    }

    #[test]
    fn test_write_to() {
        let mut buffer = vec![];
        write_to(&[test_struct()], &Config::default(), &mut buffer).unwrap();
        let expected = generate(&[test_struct()], &Config::default()).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), expected);

        let file = tempfile::NamedTempFile::new().unwrap();
        write_to_file(&[test_struct()], &Config::default(), file.path()).unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), expected);
    }
}
