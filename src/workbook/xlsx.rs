/*!
 * `.xlsx` package implementation of [`Workbook`].
 *
 * The whole zip package is held in memory as an ordered list of parts.
 * Reads go through `roxmltree`; edits are applied with `quick-xml` event
 * streams so everything the pipeline does not touch keeps its bytes.
 * Cell writes are collected and patched into the sheet parts on save;
 * shape writes go to the drawing part right away.
 */

use log::{debug, warn};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use roxmltree::Document;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::WorkbookError;
use crate::workbook::drawing::Drawing;
use crate::workbook::xml;
use crate::workbook::{CellText, TextSurface, Workbook, parse_cell_address};

const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
const DRAWING_REL: &str = "/drawing";
const SHARED_STRINGS_REL: &str = "/sharedStrings";
const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// One worksheet of the package
#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    part: String,
    drawing: Option<String>,
    cells: Vec<CellText>,
}

/// An `.xlsx` workbook loaded into memory
#[derive(Debug)]
pub struct XlsxWorkbook {
    path: PathBuf,
    /// Package parts in their original order
    parts: Vec<(String, Vec<u8>)>,
    sheets: Vec<SheetEntry>,
    /// Parsed drawings, keyed by part name
    drawings: HashMap<String, Drawing>,
    /// Pending cell texts per sheet part, keyed by address
    cell_patches: HashMap<String, BTreeMap<String, String>>,
}

#[derive(Debug)]
struct Relationship {
    id: String,
    type_: String,
    target: String,
}

impl XlsxWorkbook {
    /// Open an `.xlsx` package
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WorkbookError> {
        let path = path.as_ref();
        let open_failed = |reason: String| WorkbookError::WorkbookOpenFailed {
            path: path.to_path_buf(),
            reason,
        };

        let is_legacy = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xls"));
        if is_legacy {
            return Err(open_failed("legacy .xls workbooks are not supported, save the file as .xlsx".to_string()));
        }

        let bytes = std::fs::read(path).map_err(|e| open_failed(e.to_string()))?;
        Self::from_bytes(path, &bytes).map_err(|e| match e {
            WorkbookError::WorkbookOpenFailed { .. } => e,
            other => open_failed(other.to_string()),
        })
    }

    /// Load a package from memory; `path` is only used in messages
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self, WorkbookError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            parts.push((name, data));
        }

        let mut workbook = Self {
            path: path.to_path_buf(),
            parts,
            sheets: Vec::new(),
            drawings: HashMap::new(),
            cell_patches: HashMap::new(),
        };
        workbook.load_structure()?;
        Ok(workbook)
    }

    fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(part, _)| part == name)
            .map(|(_, data)| data.as_slice())
    }

    fn part_str(&self, name: &str) -> Result<Option<&str>, WorkbookError> {
        match self.part(name) {
            Some(data) => std::str::from_utf8(data).map(Some).map_err(|e| WorkbookError::Xml {
                part: name.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(None),
        }
    }

    fn relationships(&self, part: &str) -> Result<Vec<Relationship>, WorkbookError> {
        let rels_part = rels_for_part(part);
        let Some(text) = self.part_str(&rels_part)? else {
            return Ok(Vec::new());
        };
        let doc = parse_document(&rels_part, text)?;
        Ok(doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "Relationship")
            .filter_map(|n| {
                Some(Relationship {
                    id: n.attribute("Id")?.to_string(),
                    type_: n.attribute("Type").unwrap_or_default().to_string(),
                    target: n.attribute("Target").unwrap_or_default().to_string(),
                })
            })
            .collect())
    }

    fn load_structure(&mut self) -> Result<(), WorkbookError> {
        let workbook_part = self
            .relationships("")?
            .into_iter()
            .find(|rel| rel.type_.ends_with(OFFICE_DOCUMENT_REL))
            .map(|rel| resolve_target("", &rel.target))
            .unwrap_or_else(|| "xl/workbook.xml".to_string());

        let workbook_text = self
            .part_str(&workbook_part)?
            .ok_or_else(|| WorkbookError::WorkbookOpenFailed {
                path: self.path.clone(),
                reason: format!("missing workbook part '{}'", workbook_part),
            })?;
        let workbook_rels = self.relationships(&workbook_part)?;

        let shared_strings = match workbook_rels.iter().find(|rel| rel.type_.ends_with(SHARED_STRINGS_REL)) {
            Some(rel) => {
                let part = resolve_target(&workbook_part, &rel.target);
                match self.part_str(&part)? {
                    Some(text) => parse_shared_strings(&part, text)?,
                    None => Vec::new(),
                }
            }
            None => Vec::new(),
        };

        let doc = parse_document(&workbook_part, workbook_text)?;
        let mut declared = Vec::new();
        for node in doc.descendants().filter(|n| n.is_element() && n.tag_name().name() == "sheet") {
            let Some(name) = node.attribute("name") else { continue };
            let Some(rel_id) = node.attribute((RELATIONSHIPS_NS, "id")) else { continue };
            match workbook_rels.iter().find(|rel| rel.id == rel_id) {
                Some(rel) => declared.push((name.to_string(), resolve_target(&workbook_part, &rel.target))),
                None => warn!("Sheet '{}' has no relationship '{}'", name, rel_id),
            }
        }

        for (name, part) in declared {
            let Some(text) = self.part_str(&part)? else {
                warn!("Sheet '{}' points to missing part '{}'", name, part);
                continue;
            };
            let cells = parse_sheet_cells(&part, text, &shared_strings)?;

            let drawing = self
                .relationships(&part)?
                .into_iter()
                .find(|rel| rel.type_.ends_with(DRAWING_REL))
                .map(|rel| resolve_target(&part, &rel.target));
            if let Some(drawing_part) = &drawing {
                if !self.drawings.contains_key(drawing_part) {
                    if let Some(bytes) = self.part(drawing_part) {
                        let parsed = Drawing::parse(drawing_part, bytes)?;
                        self.drawings.insert(drawing_part.clone(), parsed);
                    }
                }
            }

            debug!("Sheet '{}' ({}): {} cells, drawing {:?}", name, part, cells.len(), drawing);
            self.sheets.push(SheetEntry {
                name,
                part,
                drawing,
                cells,
            });
        }

        Ok(())
    }

    fn sheet(&self, name: &str) -> Result<&SheetEntry, WorkbookError> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == name)
            .ok_or_else(|| WorkbookError::SheetNotFound(name.to_string()))
    }

    fn drawing(&self, sheet: &str) -> Result<Option<&Drawing>, WorkbookError> {
        let entry = self.sheet(sheet)?;
        Ok(entry.drawing.as_ref().and_then(|part| self.drawings.get(part)))
    }

    fn save_to(&self, path: &Path) -> Result<(), WorkbookError> {
        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.parts {
            let content = if let Some(drawing) = self.drawings.get(name) {
                drawing.to_bytes()?
            } else if let Some(patches) = self.cell_patches.get(name) {
                patch_sheet_cells(name, data, patches)?
            } else {
                data.clone()
            };

            zip.start_file(name.as_str(), options)?;
            zip.write_all(&content)?;
        }

        zip.finish()?;
        Ok(())
    }
}

impl Workbook for XlsxWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.name.clone()).collect()
    }

    fn used_cells(&self, sheet: &str) -> Result<Vec<CellText>, WorkbookError> {
        let entry = self.sheet(sheet)?;
        let patches = self.cell_patches.get(&entry.part);
        Ok(entry
            .cells
            .iter()
            .map(|cell| match patches.and_then(|p| p.get(&cell.address)) {
                Some(text) => CellText {
                    address: cell.address.clone(),
                    text: Some(text.clone()),
                },
                None => cell.clone(),
            })
            .collect())
    }

    fn shape_count(&self, sheet: &str) -> Result<usize, WorkbookError> {
        Ok(self.drawing(sheet)?.map(Drawing::shape_count).unwrap_or(0))
    }

    fn read_shape_surface(
        &self,
        sheet: &str,
        index: usize,
        surface: TextSurface,
    ) -> Result<Option<String>, WorkbookError> {
        match self.drawing(sheet)? {
            Some(drawing) => drawing.read(sheet, index, surface),
            None => Err(WorkbookError::ShapeNotFound {
                sheet: sheet.to_string(),
                index,
            }),
        }
    }

    fn write_shape_surface(
        &mut self,
        sheet: &str,
        index: usize,
        surface: TextSurface,
        text: &str,
    ) -> Result<(), WorkbookError> {
        let part = self.sheet(sheet)?.drawing.clone();
        match part.and_then(|part| self.drawings.get_mut(&part)) {
            Some(drawing) => drawing.write(sheet, index, surface, text),
            None => Err(WorkbookError::ShapeNotFound {
                sheet: sheet.to_string(),
                index,
            }),
        }
    }

    fn write_cell(&mut self, sheet: &str, address: &str, text: &str) -> Result<(), WorkbookError> {
        parse_cell_address(address)?;
        let entry = self.sheet(sheet)?;
        let address = address.replace('$', "").to_ascii_uppercase();
        if !entry.cells.iter().any(|cell| cell.address == address) {
            return Err(WorkbookError::InvalidCellAddress(format!("{}!{} holds no value", sheet, address)));
        }

        let part = entry.part.clone();
        self.cell_patches
            .entry(part)
            .or_default()
            .insert(address, text.to_string());
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<(), WorkbookError> {
        self.save_to(path).map_err(|e| WorkbookError::WorkbookSaveFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

fn parse_document<'a>(part: &str, text: &'a str) -> Result<Document<'a>, WorkbookError> {
    Document::parse(text).map_err(|e| WorkbookError::Xml {
        part: part.to_string(),
        reason: e.to_string(),
    })
}

/// Relationships part belonging to `part`; `""` is the package root
fn rels_for_part(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file_name)) => format!("{dir}/_rels/{file_name}.rels"),
        None if part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the part that declares it
fn resolve_target(source_part: &str, target: &str) -> String {
    let target = target.split('#').next().unwrap_or(target);
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => {
            let base_dir = source_part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
            format!("{base_dir}/{target}")
        }
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Text of an `si` or `is` node: plain `t`, or rich runs without phonetic hints
fn string_item_text(node: roxmltree::Node<'_, '_>) -> String {
    let mut text = String::new();
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "t" => text.push_str(child.text().unwrap_or_default()),
            "r" => {
                for t in child.children().filter(|n| n.is_element() && n.tag_name().name() == "t") {
                    text.push_str(t.text().unwrap_or_default());
                }
            }
            _ => {}
        }
    }
    text
}

fn parse_shared_strings(part: &str, text: &str) -> Result<Vec<String>, WorkbookError> {
    let doc = parse_document(part, text)?;
    Ok(doc
        .root_element()
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "si")
        .map(string_item_text)
        .collect())
}

fn parse_sheet_cells(part: &str, text: &str, shared_strings: &[String]) -> Result<Vec<CellText>, WorkbookError> {
    let doc = parse_document(part, text)?;
    let Some(sheet_data) = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "sheetData")
    else {
        return Ok(Vec::new());
    };

    let mut cells = Vec::new();
    for row in sheet_data.children().filter(|n| n.is_element() && n.tag_name().name() == "row") {
        for cell in row.children().filter(|n| n.is_element() && n.tag_name().name() == "c") {
            let Some(address) = cell.attribute("r") else { continue };
            let child = |name: &str| cell.children().find(|n| n.is_element() && n.tag_name().name() == name);
            let value = child("v").map(|v| v.text().unwrap_or_default().to_string());

            let text = if let Some(formula) = child("f") {
                Some(format!("={}", formula.text().unwrap_or_default()))
            } else {
                match cell.attribute("t") {
                    Some("s") => value
                        .as_deref()
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .and_then(|idx| shared_strings.get(idx).cloned()),
                    Some("inlineStr") => child("is").map(string_item_text),
                    Some("str") => value.clone(),
                    _ => None,
                }
            };

            if value.is_none() && child("is").is_none() && child("f").is_none() {
                continue;
            }
            cells.push(CellText {
                address: address.to_ascii_uppercase(),
                text,
            });
        }
    }

    Ok(cells)
}

/// Rewrite patched cells of a sheet part as inline strings
fn patch_sheet_cells(part: &str, data: &[u8], patches: &BTreeMap<String, String>) -> Result<Vec<u8>, WorkbookError> {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(data.len()));
    let mut buf = Vec::new();
    let mut in_sheet_data = false;
    // Depth inside a replaced cell whose original children are dropped
    let mut skip_depth = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| WorkbookError::Xml {
            part: part.to_string(),
            reason: e.to_string(),
        })?;

        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
            continue;
        }

        match event {
            Event::Eof => break,
            Event::Start(ref e) if xml::local_name(e.name().as_ref()) == b"sheetData" => {
                in_sheet_data = true;
                writer.write_event(event.clone())?;
            }
            Event::End(ref e) if xml::local_name(e.name().as_ref()) == b"sheetData" => {
                in_sheet_data = false;
                writer.write_event(event.clone())?;
            }
            Event::Start(ref e) | Event::Empty(ref e)
                if in_sheet_data && xml::local_name(e.name().as_ref()) == b"c" =>
            {
                let address = xml::attribute(e, b"r").map(|r| r.to_ascii_uppercase());
                match address.as_ref().and_then(|r| patches.get(r)) {
                    Some(text) => {
                        write_inline_string_cell(&mut writer, e, text)?;
                        if matches!(event, Event::Start(_)) {
                            skip_depth = 1;
                        }
                    }
                    None => writer.write_event(event.clone())?,
                }
            }
            _ => writer.write_event(event.clone())?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn write_inline_string_cell(
    writer: &mut Writer<Vec<u8>>,
    original: &BytesStart<'_>,
    text: &str,
) -> Result<(), WorkbookError> {
    let tag = String::from_utf8_lossy(original.name().as_ref()).into_owned();
    let prefix = xml::prefix_of(original.name().as_ref());

    let mut cell = BytesStart::new(tag.clone());
    for attr in original.attributes().flatten() {
        if xml::local_name(attr.key.as_ref()) != b"t" {
            cell.push_attribute(attr);
        }
    }
    cell.push_attribute(("t", "inlineStr"));

    let mut t = BytesStart::new(format!("{prefix}t"));
    t.push_attribute(("xml:space", "preserve"));

    writer.write_event(Event::Start(cell))?;
    writer.write_event(Event::Start(BytesStart::new(format!("{prefix}is"))))?;
    writer.write_event(Event::Start(t))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(format!("{prefix}t"))))?;
    writer.write_event(Event::End(BytesEnd::new(format!("{prefix}is"))))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
