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

//! Decomposition of property paths such as `orders[0].lines.amount`

/// One step of a property path plus the unparsed remainder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTokenizer {
    name: String,
    indexed_name: String,
    index: Option<String>,
    children: Option<String>,
}

impl PropertyTokenizer {
    /// Split `fullname` at its first `.`
    pub fn new(fullname: &str) -> Self {
        let (head, children) = match fullname.split_once('.') {
            Some((head, rest)) => (head, Some(rest.to_string())),
            None => (fullname, None),
        };

        let (name, index) = match head.find('[') {
            Some(open) => {
                let close = if head.ends_with(']') { head.len() - 1 } else { head.len() };
                let index = head.get(open + 1..close).unwrap_or_default();
                (&head[..open], Some(index.to_string()))
            }
            None => (head, None),
        };

        Self {
            name: name.to_string(),
            indexed_name: head.to_string(),
            index,
            children,
        }
    }

    /// Bare property name of this step
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text between the brackets, if any
    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    /// Name including the bracketed index
    pub fn indexed_name(&self) -> &str {
        &self.indexed_name
    }

    /// Remainder of the path after this step
    pub fn children(&self) -> Option<&str> {
        self.children.as_deref()
    }

    /// Whether another step follows
    pub fn has_next(&self) -> bool {
        self.children.is_some()
    }

    /// Iterate over every step of the path, starting with this one
    pub fn steps(self) -> impl Iterator<Item = PropertyTokenizer> {
        std::iter::successors(Some(self), |step| step.children().map(PropertyTokenizer::new))
    }
}

impl Iterator for PropertyTokenizer {
    type Item = PropertyTokenizer;

    /// Advance to the next step; the remainder is consumed so iteration is forward-only
    fn next(&mut self) -> Option<Self::Item> {
        self.children.take().map(|rest| PropertyTokenizer::new(&rest))
    }
}
