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

//! Generator configuration.

use crate::Error;
use serde::{Deserialize, Serialize};

/// Fixed parts of the generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Comment lines at the top of the generated file, without the `//`
    /// prefix.
    pub banner: Vec<String>,
    /// Headers included by every generated file, before the headers
    /// required by field types.
    pub include_headers: Vec<String>,
    /// Qualified name of the C++ client version enumeration.
    pub version_enum: String,
    /// Name of the template parameter of versioned structs.
    pub version_param: String,
    /// Macro used for reflection descriptors.
    pub reflection_macro: String,
    /// Name of the static default initializer.
    pub default_init: String,
    pub indent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            banner: vec![
                "File generated by verstruct.".to_owned(),
                "/!\\ Do not edit by hand".to_owned(),
            ],
            include_headers: vec![
                "IO/Common.hpp".to_owned(),
                "Utils/Meta/Reflection.hpp".to_owned(),
            ],
            version_enum: "IO::Common::ClientVersions".to_owned(),
            version_param: "client_version".to_owned(),
            reflection_macro: "REFLECTION_DESCRIPTOR".to_owned(),
            default_init: "DefaultInit".to_owned(),
            indent: "  ".to_owned(),
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing keys keep their default
    /// value.
    pub fn from_json(text: &str) -> Result<Config, Error> {
        Ok(serde_json::from_str(text)?)
    }

    pub(crate) fn indent(&self, level: usize) -> String {
        self.indent.repeat(level)
    }
}
