// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! XML utilities for WebDAV/CalDAV processing.

use std::io::Cursor;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::CalDavError;

/// XML namespaces used in `CalDAV`.
pub mod ns {
    /// `WebDAV` namespace.
    pub const DAV: &str = "DAV:";

    /// `CalDAV` namespace.
    pub const CALDAV: &str = "urn:ietf:params:xml:ns:caldav";
}

/// Reads the text content of the element whose start tag was just consumed.
///
/// Text, CDATA and entity references are concatenated; nested elements are
/// skipped. The reader is left after the matching end tag.
///
/// # Errors
///
/// Returns an error if XML parsing fails or the document ends early.
pub fn read_element_text(reader: &mut Reader<&[u8]>) -> Result<String, CalDavError> {
    let mut text = String::new();
    let mut depth = 1usize;

    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Text(e) => {
                let decoded = e.decode().map_err(|e| CalDavError::Xml(e.to_string()))?;
                text.push_str(&decoded);
            }
            Event::CData(e) => {
                let raw = std::str::from_utf8(&e)
                    .map_err(|e| CalDavError::Xml(format!("UTF-8 error: {e}")))?;
                text.push_str(raw);
            }
            Event::GeneralRef(e) => {
                if let Some(ch) = e
                    .resolve_char_ref()
                    .map_err(|e| CalDavError::Xml(e.to_string()))?
                {
                    text.push(ch);
                } else {
                    let name = e.decode().map_err(|e| CalDavError::Xml(e.to_string()))?;
                    let resolved = quick_xml::escape::resolve_predefined_entity(&name)
                        .ok_or_else(|| CalDavError::Xml(format!("Unknown entity: &{name};")))?;
                    text.push_str(resolved);
                }
            }
            Event::Eof => return Err(CalDavError::Xml("Unexpected EOF".to_string())),
            _ => {}
        }
    }

    Ok(text)
}

/// Skips the remainder of the element whose start tag was just consumed.
///
/// # Errors
///
/// Returns an error if XML parsing fails or the document ends early.
pub fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), CalDavError> {
    read_element_text(reader).map(|_| ())
}

/// Thin wrapper over [`quick_xml::Writer`] for request bodies.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl std::fmt::Debug for XmlWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlWriter").finish_non_exhaustive()
    }
}

impl XmlWriter {
    /// Creates an indenting writer.
    pub fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    /// Writes a start tag with attributes.
    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), CalDavError> {
        let mut elem = BytesStart::new(name);
        for attr in attrs {
            elem.push_attribute(*attr);
        }
        self.writer.write_event(Event::Start(elem))?;
        Ok(())
    }

    /// Writes an end tag.
    pub fn end(&mut self, name: &str) -> Result<(), CalDavError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Writes a self-closing element.
    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), CalDavError> {
        let mut elem = BytesStart::new(name);
        for attr in attrs {
            elem.push_attribute(*attr);
        }
        self.writer.write_event(Event::Empty(elem))?;
        Ok(())
    }

    /// Writes escaped character data.
    pub fn text(&mut self, text: &str) -> Result<(), CalDavError> {
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    /// Writes `<name>text</name>`.
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<(), CalDavError> {
        self.writer.write_event(Event::Start(BytesStart::new(name)))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Finishes the document.
    pub fn finish(self) -> Result<String, CalDavError> {
        let bytes = self.writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|e| CalDavError::Xml(format!("UTF-8 error: {e}")))
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(xml: &str) -> String {
        let mut reader = Reader::from_str(xml);
        loop {
            if let Event::Start(_) = reader.read_event().unwrap() {
                return read_element_text(&mut reader).unwrap();
            }
        }
    }

    #[test]
    fn xml_reads_plain_text() {
        assert_eq!(text_of("<a>hello</a>"), "hello");
    }

    #[test]
    fn xml_reads_entities_and_char_refs() {
        assert_eq!(text_of("<a>x &amp; y&#13;&#10;z</a>"), "x & y\r\nz");
    }

    #[test]
    fn xml_reads_cdata() {
        assert_eq!(text_of("<a><![CDATA[<b>raw</b>]]></a>"), "<b>raw</b>");
    }

    #[test]
    fn xml_writer_escapes_text() {
        let mut w = XmlWriter::new();
        w.text_element("D:href", "/a&b").unwrap();
        assert_eq!(w.finish().unwrap(), "<D:href>/a&amp;b</D:href>");
    }
}
