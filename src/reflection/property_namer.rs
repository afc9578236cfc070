// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Naming conventions for accessor methods

use super::error::{ReflectionError, ReflectionResult};

/// Turn an accessor method name into its property name
///
/// `getUserName` → `userName`, `isActive` → `active`, `getURL` → `URL`.
pub fn method_to_property(name: &str) -> ReflectionResult<String> {
    let stem = if let Some(rest) = name.strip_prefix("is") {
        rest
    } else if let Some(rest) = name.strip_prefix("get").or_else(|| name.strip_prefix("set")) {
        rest
    } else {
        return Err(ReflectionError::InvalidPropertyName {
            name: name.to_string(),
        });
    };

    let mut chars = stem.chars();
    let Some(first) = chars.next() else {
        return Ok(String::new());
    };
    let second_is_upper = chars.next().is_some_and(char::is_uppercase);
    if second_is_upper {
        return Ok(stem.to_string());
    }

    let mut property = String::with_capacity(stem.len());
    property.extend(first.to_lowercase());
    property.push_str(&stem[first.len_utf8()..]);
    Ok(property)
}

/// `getX` or `isX`
pub fn is_getter(name: &str) -> bool {
    (name.starts_with("get") && name.len() > 3) || (name.starts_with("is") && name.len() > 2)
}

/// `setX`
pub fn is_setter(name: &str) -> bool {
    name.starts_with("set") && name.len() > 3
}

/// Names that never become properties
pub fn is_valid_property_name(name: &str) -> bool {
    !name.starts_with('$') && name != "serialVersionUID" && name != "class"
}
