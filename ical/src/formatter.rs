// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! iCalendar (RFC 5545) formatter.
//!
//! Writes a [`Component`] tree as CRLF-terminated content lines, folding
//! lines longer than 75 octets.
//!
//! # Example
//!
//! ```
//! use calsync_ical::{Component, Property, formatter};
//!
//! let event = Component::new("VEVENT").with_property(Property::new("UID", "abc"));
//! let text = formatter::format(&event);
//! assert_eq!(text, "BEGIN:VEVENT\r\nUID:abc\r\nEND:VEVENT\r\n");
//! ```

use std::fmt::Write;

use crate::keyword::{KW_BEGIN, KW_END};
use crate::syntax::{Component, Property};

/// Formats a component with the default options.
#[must_use]
pub fn format(component: &Component) -> String {
    FormatOptions::default().write_to_string(component)
}

/// Formatting options for the iCalendar formatter.
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    /// Maximum line length in octets before folding.
    /// - `None`: no line folding
    /// - `Some(n)`: fold lines longer than n octets
    ///
    /// Default: `Some(75)` for RFC 5545 compliance.
    pub folding: Option<usize>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { folding: Some(75) }
    }
}

impl FormatOptions {
    /// Set the line folding option.
    #[must_use]
    pub const fn folding(mut self, folding: Option<usize>) -> Self {
        self.folding = folding;
        self
    }

    /// Writes a component tree to a `String`.
    #[must_use]
    pub fn write_to_string(&self, component: &Component) -> String {
        let mut out = String::new();
        self.write_component(&mut out, component);
        out
    }

    fn write_component(&self, out: &mut String, component: &Component) {
        self.write_line(out, &format!("{KW_BEGIN}:{}", component.name));
        for property in &component.properties {
            self.write_line(out, &content_line(property));
        }
        for child in &component.children {
            self.write_component(out, child);
        }
        self.write_line(out, &format!("{KW_END}:{}", component.name));
    }

    /// Writes one logical line, folding it with CRLF + SPACE.
    fn write_line(&self, out: &mut String, line: &str) {
        let Some(max_len) = self.folding.filter(|n| *n > 1) else {
            out.push_str(line);
            out.push_str("\r\n");
            return;
        };

        let mut width = 0;
        for ch in line.chars() {
            let len = ch.len_utf8();
            if width + len > max_len {
                out.push_str("\r\n ");
                width = 1;
            }
            out.push(ch);
            width += len;
        }
        out.push_str("\r\n");
    }
}

/// Renders `NAME;PARAM=value:VALUE` without folding.
fn content_line(property: &Property) -> String {
    let mut line = property.name.clone();
    for (name, value) in &property.parameters {
        if value.contains([':', ';', ',']) && !value.starts_with('"') {
            let _ = write!(line, ";{name}=\"{value}\"");
        } else {
            let _ = write!(line, ";{name}={value}");
        }
    }
    line.push(':');
    line.push_str(&property.value);
    line
}
