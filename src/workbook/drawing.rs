/*!
 * DrawingML shape text.
 *
 * A drawing part lists its shapes as top-level anchors. Each anchor wraps
 * one object (`sp`, `grpSp`, `pic`, `graphicFrame`, `cxnSp`) and the text
 * surfaces are located inside that object:
 *
 * - text frame: `sp/txBody` without a preset text warp
 * - text effect: `sp/txBody` with `bodyPr/prstTxWarp` (WordArt)
 * - alternative text: `descr` of the object's `cNvPr`
 * - rich text range: first text-bearing `sp` inside a `grpSp`
 */

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::errors::WorkbookError;
use crate::workbook::TextSurface;
use crate::workbook::xml;

const ANCHORS: [&[u8]; 3] = [b"twoCellAnchor", b"oneCellAnchor", b"absoluteAnchor"];
const OBJECTS: [&[u8]; 5] = [b"sp", b"grpSp", b"pic", b"graphicFrame", b"cxnSp"];

/// A parsed drawing part
#[derive(Debug, Clone)]
pub struct Drawing {
    events: Vec<Event<'static>>,
    /// Start index of the object inside each anchor, in document order
    objects: Vec<Option<usize>>,
}

/// Where a surface lives inside the event stream
enum Located {
    TextBody(usize),
    NonVisual(usize),
}

impl Drawing {
    pub fn parse(part: &str, bytes: &[u8]) -> Result<Self, WorkbookError> {
        let events = xml::read_events(part, bytes)?;
        let root = events
            .iter()
            .position(|e| matches!(e, Event::Start(_) | Event::Empty(_)))
            .ok_or_else(|| WorkbookError::Xml {
                part: part.to_string(),
                reason: "drawing has no root element".to_string(),
            })?;

        let objects = xml::child_elements(&events, root)
            .into_iter()
            .filter(|&anchor| {
                xml::element_name(&events, anchor)
                    .is_some_and(|name| ANCHORS.contains(&name.as_slice()))
            })
            .map(|anchor| {
                xml::child_elements(&events, anchor).into_iter().find(|&child| {
                    xml::element_name(&events, child)
                        .is_some_and(|name| OBJECTS.contains(&name.as_slice()))
                })
            })
            .collect();

        Ok(Self { events, objects })
    }

    pub fn shape_count(&self) -> usize {
        self.objects.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WorkbookError> {
        xml::write_events(&self.events)
    }

    /// Read the text of one surface; `Ok(None)` when it exists but is empty
    pub fn read(&self, sheet: &str, index: usize, surface: TextSurface) -> Result<Option<String>, WorkbookError> {
        match self.locate(sheet, index, surface)? {
            Located::TextBody(body) => {
                let text = self.body_text(body);
                Ok(if text.is_empty() { None } else { Some(text) })
            }
            Located::NonVisual(c_nv_pr) => Ok(xml::start_tag(&self.events, c_nv_pr)
                .and_then(|start| xml::attribute(start, b"descr"))
                .filter(|descr| !descr.is_empty())),
        }
    }

    /// Replace the text of one surface
    ///
    /// Only surfaces that currently hold non-blank text accept a write.
    pub fn write(&mut self, sheet: &str, index: usize, surface: TextSurface, text: &str) -> Result<(), WorkbookError> {
        let current = self.read(sheet, index, surface)?;
        if current.filter(|t| !t.trim().is_empty()).is_none() {
            return Err(self.unsupported(sheet, index, surface));
        }
        match self.locate(sheet, index, surface)? {
            Located::TextBody(body) => self.replace_body_text(body, text),
            Located::NonVisual(c_nv_pr) => {
                let updated = match &self.events[c_nv_pr] {
                    Event::Start(start) => Event::Start(xml::with_attribute(start, "descr", text)),
                    Event::Empty(start) => Event::Empty(xml::with_attribute(start, "descr", text)),
                    _ => return Err(self.unsupported(sheet, index, surface)),
                };
                self.events[c_nv_pr] = updated;
                Ok(())
            }
        }
    }

    fn locate(&self, sheet: &str, index: usize, surface: TextSurface) -> Result<Located, WorkbookError> {
        let slot = self.objects.get(index).ok_or_else(|| WorkbookError::ShapeNotFound {
            sheet: sheet.to_string(),
            index,
        })?;
        let object = slot.ok_or_else(|| self.unsupported(sheet, index, surface))?;
        let is_sp = xml::element_name(&self.events, object).as_deref() == Some(b"sp".as_slice());
        let is_group = xml::element_name(&self.events, object).as_deref() == Some(b"grpSp".as_slice());

        let located = match surface {
            TextSurface::TextFrame if is_sp => self
                .text_body(object)
                .filter(|&body| !self.has_text_warp(body))
                .map(Located::TextBody),
            TextSurface::TextEffect if is_sp => self
                .text_body(object)
                .filter(|&body| self.has_text_warp(body))
                .map(Located::TextBody),
            TextSurface::RichTextRange if is_group => xml::find_descendants(&self.events, object, b"sp")
                .into_iter()
                .filter_map(|sp| self.text_body(sp))
                .find(|&body| !self.body_text(body).trim().is_empty())
                .map(Located::TextBody),
            TextSurface::AlternativeText => xml::find_descendants(&self.events, object, b"cNvPr")
                .first()
                .copied()
                .map(Located::NonVisual),
            _ => None,
        };

        located.ok_or_else(|| self.unsupported(sheet, index, surface))
    }

    fn unsupported(&self, sheet: &str, index: usize, surface: TextSurface) -> WorkbookError {
        WorkbookError::UnsupportedSurface {
            sheet: sheet.to_string(),
            index,
            surface: surface.name(),
        }
    }

    fn text_body(&self, sp: usize) -> Option<usize> {
        xml::find_child(&self.events, sp, b"txBody")
    }

    fn has_text_warp(&self, body: usize) -> bool {
        !xml::find_descendants(&self.events, body, b"prstTxWarp").is_empty()
    }

    /// Paragraph texts joined by newlines
    fn body_text(&self, body: usize) -> String {
        xml::child_elements(&self.events, body)
            .into_iter()
            .filter(|&child| xml::element_name(&self.events, child).as_deref() == Some(b"p".as_slice()))
            .map(|paragraph| {
                xml::find_descendants(&self.events, paragraph, b"t")
                    .into_iter()
                    .map(|t| xml::text_content(&self.events, t))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace every paragraph of a text body with one paragraph per line
    ///
    /// Body properties and list styles stay; the first paragraph's
    /// properties and first run's properties are reused for the new runs.
    fn replace_body_text(&mut self, body: usize, text: &str) -> Result<(), WorkbookError> {
        let body_end = xml::element_end(&self.events, body).ok_or_else(|| WorkbookError::Xml {
            part: "drawing".to_string(),
            reason: "unterminated text body".to_string(),
        })?;
        if matches!(self.events[body], Event::Empty(_)) {
            return Err(WorkbookError::Xml {
                part: "drawing".to_string(),
                reason: "text body without paragraphs".to_string(),
            });
        }

        let children = xml::child_elements(&self.events, body);
        let paragraphs: Vec<usize> = children
            .iter()
            .copied()
            .filter(|&c| xml::element_name(&self.events, c).as_deref() == Some(b"p".as_slice()))
            .collect();

        let prefix = children
            .first()
            .and_then(|&c| xml::start_tag(&self.events, c))
            .map(|start| xml::prefix_of(start.name().as_ref()))
            .unwrap_or_else(|| "a:".to_string());

        let paragraph_props = paragraphs
            .first()
            .and_then(|&p| xml::find_child(&self.events, p, b"pPr"))
            .map(|ppr| self.clone_element(ppr))
            .unwrap_or_default();
        let run_props = paragraphs
            .iter()
            .flat_map(|&p| xml::find_descendants(&self.events, p, b"rPr"))
            .next()
            .map(|rpr| self.clone_element(rpr))
            .unwrap_or_default();

        let mut replacement: Vec<Event<'static>> = Vec::new();
        for &child in &children {
            if !paragraphs.contains(&child) {
                replacement.extend(self.clone_element(child));
            }
        }
        for line in text.split('\n') {
            replacement.push(Event::Start(BytesStart::new(format!("{prefix}p"))));
            replacement.extend(paragraph_props.iter().cloned());
            replacement.push(Event::Start(BytesStart::new(format!("{prefix}r"))));
            replacement.extend(run_props.iter().cloned());
            replacement.push(Event::Start(BytesStart::new(format!("{prefix}t"))));
            replacement.push(Event::Text(BytesText::new(line).into_owned()));
            replacement.push(Event::End(BytesEnd::new(format!("{prefix}t"))));
            replacement.push(Event::End(BytesEnd::new(format!("{prefix}r"))));
            replacement.push(Event::End(BytesEnd::new(format!("{prefix}p"))));
        }

        let removed = body_end - (body + 1);
        let added = replacement.len();
        self.events.splice(body + 1..body_end, replacement);
        self.shift_objects(body, added as isize - removed as isize);
        Ok(())
    }

    fn clone_element(&self, index: usize) -> Vec<Event<'static>> {
        match xml::element_end(&self.events, index) {
            Some(end) => self.events[index..=end].to_vec(),
            None => Vec::new(),
        }
    }

    /// Keep object indices valid after the stream changed length after `after`
    fn shift_objects(&mut self, after: usize, delta: isize) {
        for object in self.objects.iter_mut().flatten() {
            if *object > after {
                *object = (*object as isize + delta) as usize;
            }
        }
    }
}
