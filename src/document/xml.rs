//! Loading documents with quick-xml.
//!
//! quick-xml checks well-formedness and drives the element structure; the
//! offsets of names and raw attribute values are recovered from the source
//! text so every range points into the original document.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::{Attribute, Document, DocumentError, Element, ElementValue};
use crate::base::text_size;

/// An element whose end tag has not been seen yet.
struct OpenElement {
    element: Element,
    content_start: usize,
}

impl Document {
    /// Parse project XML, keeping raw source offsets.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_reader(text.as_bytes());
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let before = reader.buffer_position() as usize;
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                DocumentError::xml(format!(
                    "XML parse error at position {}: {e}",
                    reader.error_position()
                ))
            })?;
            let after = reader.buffer_position() as usize;

            match event {
                Event::Start(ref e) => {
                    let element = open_element(text, before, after, e)?;
                    stack.push(OpenElement {
                        element,
                        content_start: after,
                    });
                }
                Event::Empty(ref e) => {
                    let element = open_element(text, before, after, e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let end_tag = text
                        .get(before..after)
                        .and_then(|s| s.find("</"))
                        .map_or(before, |i| before + i);
                    let Some(OpenElement {
                        mut element,
                        content_start,
                    }) = stack.pop()
                    else {
                        return Err(DocumentError::Unbalanced {
                            name: String::new(),
                            offset: text_size(end_tag),
                        });
                    };
                    element.range = TextRange::new(element.range.start(), text_size(after));
                    if element.children.is_empty() && end_tag > content_start {
                        element.value = Some(ElementValue {
                            text: text[content_start..end_tag].to_string(),
                            range: TextRange::new(text_size(content_start), text_size(end_tag)),
                        });
                    }
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.pop() {
            return Err(DocumentError::Unbalanced {
                name: open.element.name.to_string(),
                offset: open.element.range.start(),
            });
        }
        let root = root.ok_or_else(|| DocumentError::xml("document has no root element"))?;
        Ok(Document::new(text, root))
    }
}

fn attach(
    stack: &mut [OpenElement],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DocumentError> {
    if let Some(parent) = stack.last_mut() {
        parent.element.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(DocumentError::xml(format!(
            "unexpected second root element '{}'",
            element.name
        )));
    }
    *root = Some(element);
    Ok(())
}

/// Build an element from a start tag spanning `before..after` in `text`.
fn open_element(
    text: &str,
    before: usize,
    after: usize,
    e: &BytesStart<'_>,
) -> Result<Element, DocumentError> {
    let start = text
        .get(before..after)
        .and_then(|s| s.find('<'))
        .map_or(before, |i| before + i);
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|e| DocumentError::xml(format!("Invalid tag name: {e}")))?
        .to_string();

    let mut element = Element::new(name.as_str(), text_size(start));
    element.range = TextRange::new(text_size(start), text_size(after));

    // Attributes are located in order, each search starting after the
    // previous value so a name inside a value is never matched.
    let tag = text.get(start..after).unwrap_or_default();
    let mut cursor = 1 + name.len();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| DocumentError::xml(format!("Attribute error: {e}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| DocumentError::xml(format!("Attribute key error: {e}")))?;
        let raw = std::str::from_utf8(&attr.value)
            .map_err(|e| DocumentError::xml(format!("Attribute value error: {e}")))?;

        let Some(name_start) = tag.get(cursor..).and_then(|s| s.find(key)).map(|i| cursor + i)
        else {
            return Err(DocumentError::xml(format!("cannot locate attribute '{key}'")));
        };
        let Some(value_start) = tag
            .get(name_start + key.len()..)
            .and_then(|s| s.find(['"', '\'']))
            .map(|i| name_start + key.len() + i + 1)
        else {
            return Err(DocumentError::xml(format!("cannot locate value of '{key}'")));
        };
        let value_end = value_start + raw.len();
        cursor = value_end + 1;

        let abs = |offset: usize| text_size(start + offset);
        element.attributes.push(Attribute {
            name: SmolStr::new(key),
            range: TextRange::new(abs(name_start), abs(cursor)),
            name_range: TextRange::at(abs(name_start), TextSize::of(key)),
            value: raw.to_string(),
            value_range: TextRange::new(abs(value_start), abs(value_end)),
            resolved: None,
        });
    }
    Ok(element)
}
