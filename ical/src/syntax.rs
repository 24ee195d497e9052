// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Structured component model and content-line parser for iCalendar (RFC 5545).

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::keyword::{KW_BEGIN, KW_END, KW_VALUE};
use crate::parameter::ValueType;

/// Errors raised while parsing iCalendar text.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A content line that is not `name *(;param) : value`.
    #[error("line {line}: malformed content line '{content}'")]
    MalformedLine {
        /// 1-based line number of the logical line.
        line: usize,
        /// The offending (unfolded) line.
        content: String,
    },

    /// `END` does not close the innermost open component.
    #[error("line {line}: END:{found} does not match BEGIN:{expected}")]
    MismatchedEnd {
        /// 1-based line number.
        line: usize,
        /// Name of the innermost open component.
        expected: String,
        /// Name given on the `END` line.
        found: String,
    },

    /// `END` without any open component.
    #[error("line {line}: END:{found} without BEGIN")]
    UnexpectedEnd {
        /// 1-based line number.
        line: usize,
        /// Name given on the `END` line.
        found: String,
    },

    /// A property that appears outside of any component.
    #[error("line {line}: property outside of a component")]
    OrphanProperty {
        /// 1-based line number.
        line: usize,
    },

    /// Input ended while a component was still open.
    #[error("component {name} is not closed")]
    Unclosed {
        /// Name of the open component.
        name: String,
    },

    /// Input contained no component at all.
    #[error("no component found")]
    Empty,
}

/// A property: name, parameters, value type and raw value.
///
/// The value is kept in its wire form (escaped text, comma separated lists),
/// so that unknown properties survive a read-modify-write cycle untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Upper-cased property name.
    pub name: String,
    /// Parameters keyed by upper-cased name, with quotes removed.
    pub parameters: BTreeMap<String, String>,
    /// Value type, from the `VALUE` parameter or the property default.
    pub value_type: ValueType,
    /// Raw value.
    pub value: String,
}

impl Property {
    /// Creates a property without parameters.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into().to_ascii_uppercase();
        let value_type = ValueType::default_for(&name);
        Self {
            name,
            parameters: BTreeMap::new(),
            value_type,
            value: value.into(),
        }
    }

    /// Adds a parameter, returning the property.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_parameter(name, value);
        self
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// Sets a parameter, replacing any previous value.
    ///
    /// Setting `VALUE` also updates [`Property::value_type`].
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_uppercase();
        let value = value.into();
        if name == KW_VALUE {
            self.value_type = ValueType::from_str(&value).unwrap_or_default();
        }
        self.parameters.insert(name, value);
    }

    /// Removes a parameter, returning its previous value.
    pub fn remove_parameter(&mut self, name: &str) -> Option<String> {
        let removed = self.parameters.remove(name);
        if name == KW_VALUE && removed.is_some() {
            self.value_type = ValueType::default_for(&self.name);
        }
        removed
    }
}

/// A component (`VCALENDAR`, `VEVENT`, `VTIMEZONE`, `VALARM`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Upper-cased component name.
    pub name: String,
    /// Properties in their original order.
    pub properties: Vec<Property>,
    /// Nested components.
    pub children: Vec<Component>,
}

impl Component {
    /// Creates an empty component.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns whether this component has the given name.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Appends a property, returning the component.
    #[must_use]
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Appends a child component, returning the component.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the first property with the given name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Returns the first property with the given name, mutably.
    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    /// Iterates over all properties with the given name.
    pub fn properties_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> {
        self.properties.iter().filter(move |p| p.name == name)
    }

    /// Returns the raw value of the first property with the given name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.property(name).map(|p| p.value.as_str())
    }

    /// Replaces every property with the same name by `property`.
    ///
    /// The new property takes the position of the first replaced one, or is
    /// appended when there was none.
    pub fn set_property(&mut self, property: Property) {
        match self.properties.iter().position(|p| p.name == property.name) {
            Some(idx) => {
                let name = property.name.clone();
                if let Some(slot) = self.properties.get_mut(idx) {
                    *slot = property;
                }
                let mut seen = 0usize;
                self.properties.retain(|p| {
                    if p.name != name {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.properties.push(property),
        }
    }

    /// Appends a property.
    pub fn push_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Removes every property with the given name, returning how many were removed.
    pub fn remove_properties(&mut self, name: &str) -> usize {
        let before = self.properties.len();
        self.properties.retain(|p| p.name != name);
        before - self.properties.len()
    }

    /// Iterates over child components with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> {
        self.children.iter().filter(move |c| c.is(name))
    }
}

/// Parses iCalendar text into its top-level components.
///
/// Folded lines are unfolded first; both CRLF and bare LF line endings are
/// accepted.
///
/// # Errors
///
/// Returns an error on malformed content lines, unbalanced `BEGIN`/`END`, or
/// when no component is present.
pub fn parse(input: &str) -> Result<Vec<Component>, ParseError> {
    let mut roots = Vec::new();
    let mut stack: Vec<Component> = Vec::new();

    for (line, content) in unfold(input) {
        let property = parse_content_line(&content)
            .ok_or_else(|| ParseError::MalformedLine { line, content: content.clone() })?;

        if property.name == KW_BEGIN {
            stack.push(Component::new(property.value.trim()));
        } else if property.name == KW_END {
            let found = property.value.trim().to_ascii_uppercase();
            let Some(component) = stack.pop() else {
                return Err(ParseError::UnexpectedEnd { line, found });
            };
            if component.name != found {
                return Err(ParseError::MismatchedEnd {
                    line,
                    expected: component.name,
                    found,
                });
            }
            match stack.last_mut() {
                Some(parent) => parent.children.push(component),
                None => roots.push(component),
            }
        } else {
            stack
                .last_mut()
                .ok_or(ParseError::OrphanProperty { line })?
                .properties
                .push(property);
        }
    }

    if let Some(open) = stack.pop() {
        return Err(ParseError::Unclosed { name: open.name });
    }
    if roots.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(roots)
}

/// Joins folded lines, yielding `(line number, logical line)` pairs.
fn unfold(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    for (idx, raw) in input.split('\n').enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(rest) = raw.strip_prefix([' ', '\t']) {
            if let Some((_, last)) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        if !raw.trim().is_empty() {
            lines.push((idx + 1, raw.to_string()));
        }
    }
    lines
}

/// Splits `NAME;P1=a;P2="b:c":value` into a [`Property`].
fn parse_content_line(line: &str) -> Option<Property> {
    let name_end = line.find([';', ':'])?;
    let name = line.get(..name_end)?;
    if name.is_empty() {
        return None;
    }

    let mut property = Property::new(name, String::new());
    let mut rest = line.get(name_end..)?;

    while let Some(after) = rest.strip_prefix(';') {
        let eq = after.find('=')?;
        let param_name = after.get(..eq)?;
        let (raw_value, remaining) = split_parameter_value(after.get(eq + 1..)?)?;
        property.set_parameter(param_name, unquote(raw_value));
        rest = remaining;
    }

    property.value = rest.strip_prefix(':')?.to_string();
    Some(property)
}

/// Splits a parameter value from the remainder of the line, honouring quotes.
fn split_parameter_value(s: &str) -> Option<(&str, &str)> {
    let mut in_quote = false;
    for (idx, ch) in s.char_indices() {
        match ch {
            '"' => in_quote = !in_quote,
            ';' | ':' if !in_quote => return Some((s.get(..idx)?, s.get(idx..)?)),
            _ => {}
        }
    }
    None
}

fn unquote(s: &str) -> String {
    s.strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .filter(|v| !v.contains('"'))
        .unwrap_or(s)
        .to_string()
}
