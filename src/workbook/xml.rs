//! Owned XML event streams.
//!
//! Package parts that get edited are read into a flat `Vec<Event<'static>>`
//! and written back event by event. Elements are addressed by the index of
//! their start event; untouched events serialize to the same bytes.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesStart, Event};

use crate::errors::WorkbookError;

/// Parse a part into owned events, excluding `Eof`
pub fn read_events(part: &str, bytes: &[u8]) -> Result<Vec<Event<'static>>, WorkbookError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut events = Vec::new();
    let mut buf = Vec::new();
    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| WorkbookError::Xml {
            part: part.to_string(),
            reason: e.to_string(),
        })?;
        match event {
            Event::Eof => break,
            other => events.push(other.into_owned()),
        }
        buf.clear();
    }

    Ok(events)
}

/// Serialize events back into part bytes
pub fn write_events(events: &[Event<'static>]) -> Result<Vec<u8>, WorkbookError> {
    let mut writer = Writer::new(Vec::new());
    for event in events {
        writer.write_event(event.clone())?;
    }
    Ok(writer.into_inner())
}

/// Name without its namespace prefix
pub fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|b| *b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Namespace prefix including the colon, e.g. `"a:"`, or empty
pub fn prefix_of(name: &[u8]) -> String {
    match name.iter().rposition(|b| *b == b':') {
        Some(idx) => String::from_utf8_lossy(&name[..=idx]).into_owned(),
        None => String::new(),
    }
}

/// Start tag of the element beginning at `index`, if any
pub fn start_tag<'e>(events: &'e [Event<'static>], index: usize) -> Option<&'e BytesStart<'static>> {
    match events.get(index)? {
        Event::Start(start) | Event::Empty(start) => Some(start),
        _ => None,
    }
}

/// Local name of the element beginning at `index`
pub fn element_name(events: &[Event<'static>], index: usize) -> Option<Vec<u8>> {
    start_tag(events, index).map(|start| local_name(start.name().as_ref()).to_vec())
}

/// Index of the event closing the element that begins at `index`
///
/// For an empty element this is `index` itself.
pub fn element_end(events: &[Event<'static>], index: usize) -> Option<usize> {
    match events.get(index)? {
        Event::Empty(_) => Some(index),
        Event::Start(_) => {
            let mut depth = 0usize;
            for (offset, event) in events[index..].iter().enumerate() {
                match event {
                    Event::Start(_) => depth += 1,
                    Event::End(_) => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(index + offset);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        _ => None,
    }
}

/// Start indices of the direct child elements of the element at `index`
pub fn child_elements(events: &[Event<'static>], index: usize) -> Vec<usize> {
    let mut children = Vec::new();
    let Some(end) = element_end(events, index) else {
        return children;
    };

    let mut cursor = index + 1;
    while cursor < end {
        match &events[cursor] {
            Event::Start(_) | Event::Empty(_) => {
                children.push(cursor);
                cursor = element_end(events, cursor).unwrap_or(end) + 1;
            }
            _ => cursor += 1,
        }
    }
    children
}

/// First direct child with the given local name
pub fn find_child(events: &[Event<'static>], index: usize, name: &[u8]) -> Option<usize> {
    child_elements(events, index)
        .into_iter()
        .find(|&child| element_name(events, child).as_deref() == Some(name))
}

/// Start indices of all descendant elements with the given local name, in document order
pub fn find_descendants(events: &[Event<'static>], index: usize, name: &[u8]) -> Vec<usize> {
    let Some(end) = element_end(events, index) else {
        return Vec::new();
    };
    (index + 1..end)
        .filter(|&i| element_name(events, i).as_deref() == Some(name))
        .collect()
}

/// Unescaped value of an attribute matched by local name
pub fn attribute(start: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == name)
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
}

/// Copy of a start tag with one attribute set, all others kept in order
pub fn with_attribute(start: &BytesStart<'_>, name: &str, value: &str) -> BytesStart<'static> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut updated = BytesStart::new(tag);
    let mut replaced = false;
    for attr in start.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            updated.push_attribute((name, value));
            replaced = true;
        } else {
            updated.push_attribute(attr);
        }
    }
    if !replaced {
        updated.push_attribute((name, value));
    }
    updated.into_owned()
}

/// Concatenated text content of the element at `index`
pub fn text_content(events: &[Event<'static>], index: usize) -> String {
    let Some(end) = element_end(events, index) else {
        return String::new();
    };
    let mut text = String::new();
    for event in &events[index..=end] {
        match event {
            Event::Text(t) => match t.unescape() {
                Ok(value) => text.push_str(&value),
                Err(_) => text.push_str(&String::from_utf8_lossy(t.as_ref())),
            },
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(c.as_ref())),
            _ => {}
        }
    }
    text
}
