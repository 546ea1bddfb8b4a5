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

//! Schema analyzer.
//!
//! The generator emits whatever schema it is given. The analyzer checks
//! the preconditions a well-formed schema must satisfy and reports the
//! violations as diagnostics.

use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files;
use codespan_reporting::term;
use codespan_reporting::term::termcolor;
use std::collections::HashMap;
use std::fmt;

use crate::ast::*;

/// Diagnostics reference no source file: schemas are built in memory.
pub type FileId = usize;

/// List of unique errors reported as analyzer diagnostics.
#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    DuplicateStructIdentifier = 1,
    DuplicateFieldIdentifier = 2,
    InvertedVersionRange = 3,
    EmptyVersionRange = 4,
    UnreachableVersionedBlock = 5,
    MissingStructVersionRange = 6,
    DefaultOutOfBounds = 7,
    InvalidBitWidth = 8,
    TemplateArityMismatch = 9,
    EmptyAggregateDefault = 10,
    NonFiniteDefault = 11,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "E{}", *self as u16)
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        format!("{}", code)
    }
}

/// Aggregate analyzer diagnostics.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub diagnostics: Vec<Diagnostic<FileId>>,
}

impl Diagnostics {
    fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn push(&mut self, diagnostic: Diagnostic<FileId>) {
        self.diagnostics.push(diagnostic)
    }

    fn err_or<T>(self, value: T) -> Result<T, Diagnostics> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    pub fn emit(&self, writer: &mut dyn termcolor::WriteColor) -> Result<(), files::Error> {
        let files = files::SimpleFiles::<String, String>::new();
        let config = term::Config::default();
        for d in self.diagnostics.iter() {
            term::emit(writer, &config, &files, d)?;
        }
        Ok(())
    }
}

/// Visit every field of `entries`, whatever the version.
fn visit_fields<'a>(entries: &'a [Entry], visit: &mut impl FnMut(&'a Field)) {
    for entry in entries {
        match entry {
            Entry::Field(field) => visit(field),
            Entry::Block(block) => visit_fields(&block.entries, visit),
        }
    }
}

/// Visit every versioned block of `entries`, outermost first.
fn visit_blocks<'a>(entries: &'a [Entry], visit: &mut impl FnMut(&'a VersionedBlock)) {
    for entry in entries {
        if let Entry::Block(block) = entry {
            visit(block);
            visit_blocks(&block.entries, visit);
        }
    }
}

/// Check struct identifiers.
/// Raises error diagnostics for the following cases:
///      - duplicate qualified struct name
fn check_struct_identifiers(structs: &[StructDef]) -> Result<(), Diagnostics> {
    let mut diagnostics: Diagnostics = Default::default();
    let mut scope = HashMap::new();
    for (index, def) in structs.iter().enumerate() {
        let id = def.qualified_name();
        if let Some(prev) = scope.insert(id.clone(), index) {
            diagnostics.push(
                Diagnostic::error()
                    .with_code(ErrorCode::DuplicateStructIdentifier)
                    .with_message(format!("redeclaration of struct `{}`", id))
                    .with_notes(vec![format!(
                        "`{}` is first declared by struct #{}, redeclared by struct #{}",
                        id, prev, index
                    )]),
            )
        }
    }

    diagnostics.err_or(())
}

/// Check version ranges.
/// Raises error diagnostics for the following cases:
///      - struct or block range with a low bound above the high bound
///      - struct range without any concrete version
///      - versioned blocks in a struct without version range
fn check_version_ranges(structs: &[StructDef]) -> Result<(), Diagnostics> {
    let mut diagnostics: Diagnostics = Default::default();
    for def in structs {
        let id = def.qualified_name();
        match def.versions {
            Some(range) if range.is_inverted() => diagnostics.push(
                Diagnostic::error()
                    .with_code(ErrorCode::InvertedVersionRange)
                    .with_message(format!("inverted version range {} for struct `{}`", range, id))
                    .with_notes(vec![format!(
                        "note: {} has ordinal {}, above {} with ordinal {}",
                        range.low,
                        range.low.ordinal(),
                        range.high,
                        range.high.ordinal()
                    )]),
            ),
            Some(range) if range.versions().next().is_none() => diagnostics.push(
                Diagnostic::error()
                    .with_code(ErrorCode::EmptyVersionRange)
                    .with_message(format!(
                        "version range {} of struct `{}` contains no client version",
                        range, id
                    )),
            ),
            Some(_) => (),
            None if def.is_versioned() => diagnostics.push(
                Diagnostic::error()
                    .with_code(ErrorCode::MissingStructVersionRange)
                    .with_message(format!(
                        "struct `{}` contains versioned blocks but declares no version range",
                        id
                    ))
                    .with_notes(vec![
                        "hint: declare the struct range explicitly, e.g. [CLASSIC, ANY]".to_owned()
                    ]),
            ),
            None => (),
        }

        visit_blocks(&def.entries, &mut |block| {
            if block.range.is_inverted() {
                diagnostics.push(
                    Diagnostic::error()
                        .with_code(ErrorCode::InvertedVersionRange)
                        .with_message(format!(
                            "inverted version range {} for versioned block of struct `{}`",
                            block.range, id
                        )),
                )
            }
        });
    }

    diagnostics.err_or(())
}

/// Check field types and default values.
/// Raises error diagnostics for the following cases:
///      - field type with unbound or extra template arguments
///      - bit-width of zero, on a floating type, or wider than the type
///      - empty tuple default
///      - infinite or NaN default
///      - numeric default outside the bounds of the field type, or of the
///        element type for tuple defaults of numeric arrays
fn check_field_types(structs: &[StructDef]) -> Result<(), Diagnostics> {
    let mut diagnostics: Diagnostics = Default::default();
    for def in structs {
        let id = def.qualified_name();
        visit_fields(&def.entries, &mut |field| {
            if let Err(err) = field.ty.full_name() {
                diagnostics.push(
                    Diagnostic::error()
                        .with_code(ErrorCode::TemplateArityMismatch)
                        .with_message(format!("invalid type for field `{}::{}`", id, field.name))
                        .with_notes(vec![err.to_string()]),
                );
                return;
            }

            if let Some(bits) = field.bits {
                let kind = field.ty.numeric().and_then(|ty| ty.kind());
                let invalid = match kind {
                    _ if bits == 0 => Some("bit-width cannot be zero".to_owned()),
                    Some(kind) if !kind.is_integral() => {
                        Some("bitfields require an integral type".to_owned())
                    }
                    Some(kind) if bits as usize > kind.width() => Some(format!(
                        "bit-width {} exceeds the {}-bit width of the type",
                        bits,
                        kind.width()
                    )),
                    _ => None,
                };
                if let Some(note) = invalid {
                    diagnostics.push(
                        Diagnostic::error()
                            .with_code(ErrorCode::InvalidBitWidth)
                            .with_message(format!(
                                "invalid bit-width for field `{}::{}`",
                                id, field.name
                            ))
                            .with_notes(vec![note]),
                    );
                }
            }

            let values: Vec<&Value> = match &field.default {
                None => vec![],
                Some(DefaultValue::Scalar(value)) => vec![value],
                Some(DefaultValue::Aggregate(values)) if values.is_empty() => {
                    diagnostics.push(
                        Diagnostic::error()
                            .with_code(ErrorCode::EmptyAggregateDefault)
                            .with_message(format!(
                                "empty tuple default for field `{}::{}`",
                                id, field.name
                            )),
                    );
                    vec![]
                }
                Some(DefaultValue::Aggregate(values)) => values.iter().collect(),
            };

            for value in values.iter().filter(|value| !value.is_finite()) {
                diagnostics.push(
                    Diagnostic::error()
                        .with_code(ErrorCode::NonFiniteDefault)
                        .with_message(format!(
                            "default value {} of field `{}::{}` has no C++ literal",
                            value, id, field.name
                        )),
                );
            }

            let element = match &field.default {
                Some(DefaultValue::Aggregate(_)) => field.ty.cxx_type().element(),
                _ => None,
            };
            let Some(ty) = field.ty.numeric().or(element) else { return };
            for value in values {
                if matches!(value, Value::Expr(_))
                    || !value.is_finite()
                    || ty.check_bounds(value.clone())
                {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::error()
                        .with_code(ErrorCode::DefaultOutOfBounds)
                        .with_message(format!(
                            "default value {} of field `{}::{}` does not fit the field type",
                            value, id, field.name
                        ))
                        .with_notes(vec![format!(
                            "note: `{}` accepts {} values in {}{}, {}]",
                            ty.as_type().qualified_name(),
                            if ty.is_integral() { "integral" } else { "floating point" },
                            if ty.is_integral() { "[" } else { "(" },
                            ty.min(),
                            ty.max()
                        )]),
                );
            }
        });
    }

    diagnostics.err_or(())
}

/// Check field identifiers.
/// Raises error diagnostics for the following cases:
///      - field name appearing twice in the layout of one version
fn check_field_identifiers(structs: &[StructDef]) -> Result<(), Diagnostics> {
    let mut diagnostics: Diagnostics = Default::default();
    for def in structs {
        let id = def.qualified_name();
        // Duplicated names, in order of discovery, with the affected versions.
        let mut duplicates: Vec<(&str, Vec<String>)> = vec![];
        for layout in def.layouts() {
            let mut local_scope = HashMap::new();
            for field in layout.fields.iter().copied() {
                if local_scope.insert(field.name.as_str(), ()).is_none() {
                    continue;
                }
                let version = layout.version.map_or("all versions".to_owned(), |v| v.to_string());
                match duplicates.iter_mut().find(|(name, _)| *name == field.name) {
                    Some((_, versions)) if versions.contains(&version) => (),
                    Some((_, versions)) => versions.push(version),
                    None => duplicates.push((field.name.as_str(), vec![version])),
                }
            }
        }

        for (name, versions) in duplicates {
            diagnostics.push(
                Diagnostic::error()
                    .with_code(ErrorCode::DuplicateFieldIdentifier)
                    .with_message(format!("redeclaration of field `{}` in struct `{}`", name, id))
                    .with_notes(vec![format!("note: duplicated in {}", versions.join(", "))]),
            )
        }
    }

    diagnostics.err_or(())
}

/// Check versioned blocks.
/// Raises error diagnostics for the following cases:
///      - block that is empty for every version the struct is enabled for
fn check_reachable_blocks(structs: &[StructDef]) -> Result<(), Diagnostics> {
    fn check_entries(
        id: &str,
        entries: &[Entry],
        reachable: &[ClientVersion],
        diagnostics: &mut Diagnostics,
    ) {
        for entry in entries {
            let Entry::Block(block) = entry else { continue };
            let inner: Vec<_> =
                reachable.iter().copied().filter(|v| block.range.contains(*v)).collect();
            if inner.is_empty() {
                let enabled: Vec<_> = reachable.iter().map(|v| v.to_string()).collect();
                diagnostics.push(
                    Diagnostic::error()
                        .with_code(ErrorCode::UnreachableVersionedBlock)
                        .with_message(format!(
                            "versioned block {} of struct `{}` is never active",
                            block.range, id
                        ))
                        .with_notes(vec![format!(
                            "note: the enclosing scope is enabled for {}",
                            enabled.join(", ")
                        )]),
                );
                continue;
            }
            check_entries(id, &block.entries, &inner, diagnostics);
        }
    }

    let mut diagnostics: Diagnostics = Default::default();
    for def in structs {
        let enabled: Vec<_> = def.enabled_versions().collect();
        check_entries(&def.qualified_name(), &def.entries, &enabled, &mut diagnostics);
    }

    diagnostics.err_or(())
}

/// Analyzer entry point. Checks are ordered so that each one may assume
/// the previous ones passed.
pub fn analyze(structs: &[StructDef]) -> Result<(), Diagnostics> {
    check_struct_identifiers(structs)?;
    check_version_ranges(structs)?;
    check_field_types(structs)?;
    check_field_identifiers(structs)?;
    check_reachable_blocks(structs)?;
    Ok(())
}
