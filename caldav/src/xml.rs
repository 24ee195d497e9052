// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! XML utilities for WebDAV/CalDAV processing.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::CalDavError;

/// XML namespaces used in `CalDAV`.
pub mod ns {
    /// `WebDAV` namespace.
    pub const DAV: &str = "DAV:";

    /// `CalDAV` namespace.
    pub const CALDAV: &str = "urn:ietf:params:xml:ns:caldav";

    /// Apple iCal namespace, home of `calendar-color`.
    pub const APPLE_ICAL: &str = "http://apple.com/ns/ical/";
}

/// Reads the text content of the element whose start tag was just consumed.
///
/// Text and CDATA are concatenated until the matching end tag; nested
/// elements are skipped.
///
/// # Errors
///
/// Returns an error if XML parsing fails or the document ends early.
pub fn read_text(
    reader: &mut quick_xml::Reader<&[u8]>,
    buf: &mut Vec<u8>,
) -> Result<String, CalDavError> {
    let mut text = String::new();
    let mut depth = 1usize;
    loop {
        match reader.read_event_into(buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Text(e) if depth == 1 => text.push_str(e.unescape()?.as_ref()),
            Event::CData(e) if depth == 1 => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::Eof => return Err(CalDavError::Xml("Unexpected EOF".to_string())),
            _ => {}
        }
        buf.clear();
    }
    buf.clear();
    Ok(text)
}

/// Small builder over `quick_xml::Writer` for request bodies.
pub struct XmlBody {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl std::fmt::Debug for XmlBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlBody").finish_non_exhaustive()
    }
}

impl XmlBody {
    /// Creates an indented writer.
    pub fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    /// Writes a start tag.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn start(&mut self, elem: BytesStart<'_>) -> Result<(), CalDavError> {
        self.writer.write_event(Event::Start(elem))?;
        Ok(())
    }

    /// Writes an end tag.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn end(&mut self, name: &str) -> Result<(), CalDavError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Writes an empty element.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn empty(&mut self, elem: BytesStart<'_>) -> Result<(), CalDavError> {
        self.writer.write_event(Event::Empty(elem))?;
        Ok(())
    }

    /// Writes `<name>text</name>`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<(), CalDavError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Finishes the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the output is not valid UTF-8.
    pub fn finish(self) -> Result<String, CalDavError> {
        let bytes = self.writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|e| CalDavError::Xml(format!("UTF-8 error: {e}")))
    }
}
