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

//! Generator of per-client-version C++ structure definitions.
//!
//! Structures are described once as the union of their fields across all
//! client versions, with versioned blocks gating the fields present only in
//! some versions. The generator flattens the blocks for each version and
//! emits one template specialization per version, with a default
//! initializer and a reflection descriptor for each.

pub mod analyzer;
pub mod ast;
pub mod backends;
pub mod builtins;
pub mod config;
pub mod limits;
#[cfg(test)]
pub mod test_utils;
pub mod types;

pub use config::Config;

use ast::Value;

/// Errors raised while building descriptors or generating code.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("wrong number of template arguments for type `{type_name}`, expected {expected}, got {actual}")]
    Arity { type_name: String, expected: usize, actual: usize },
    #[error("inconsistent bounds for numeric type `{type_name}`: min {min} and max {max} are not of the same numeric kind")]
    RangeInconsistency { type_name: String, min: Value, max: Value },
    #[error("default value {value} of field `{field}` has no C++ literal")]
    NonFiniteDefault { field: String, value: ast::DefaultValue },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not write generated code: {0}")]
    Io(#[from] std::io::Error),
}
