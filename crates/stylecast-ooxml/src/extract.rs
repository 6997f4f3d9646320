//! Structural extraction (docx → block stream)
//!
//! Reads `word/document.xml` in body order and classifies each paragraph
//! as a title, subtitle, heading, list item or body paragraph using the
//! source document's own style and numbering definitions. Extraction never
//! fails: every problem becomes a warning in [`ParseStats`], and a severe
//! warning means the block stream is unusable.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::Path;

use stylecast_ast::{Block, ExtractedDocument, ListItem, ParseStats, ParseWarning};
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::archive::{DOCUMENT_PART, NUMBERING_PART, STYLES_PART};
use crate::numbering::Numbering;
use crate::styles::{StyleRole, StyleSheet};
use crate::xml::XmlElement;

/// Extracts a block stream from a DOCX source
#[derive(Debug, Clone, Default)]
pub struct DocxExtractor {
    /// Emit `break` blocks instead of counting dropped breaks
    pub preserve_breaks: bool,
    /// Log every paragraph classification at `debug`
    pub verbose: bool,
}

impl DocxExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preserve_breaks(mut self, preserve: bool) -> Self {
        self.preserve_breaks = preserve;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Extract a document from a file path
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> ExtractedDocument {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => self.extract_reader(file),
            Err(e) => {
                let warning = if e.kind() == io::ErrorKind::NotFound {
                    ParseWarning::FileNotFound
                } else {
                    debug!("Cannot open {}: {}", path.display(), e);
                    ParseWarning::InvalidArchive
                };
                failed(warning)
            }
        }
    }

    /// Extract from in-memory DOCX bytes
    pub fn extract_bytes(&self, bytes: &[u8]) -> ExtractedDocument {
        self.extract_reader(Cursor::new(bytes))
    }

    /// Extract from any seekable reader over a DOCX archive
    pub fn extract_reader<R: Read + Seek>(&self, reader: R) -> ExtractedDocument {
        let mut zip = match ZipArchive::new(reader) {
            Ok(zip) => zip,
            Err(e) => {
                debug!("Not a ZIP archive: {}", e);
                return failed(ParseWarning::InvalidArchive);
            }
        };

        let mut stats = ParseStats::default();
        let document = match read_part(&mut zip, DOCUMENT_PART) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return failed(ParseWarning::MissingDocumentPart),
            Err(detail) => {
                return failed(ParseWarning::UnreadablePart {
                    part: "document.xml".to_string(),
                    detail,
                })
            }
        };
        let styles = optional_part(&mut zip, STYLES_PART, "styles.xml", &mut stats);
        let numbering = optional_part(&mut zip, NUMBERING_PART, "numbering.xml", &mut stats);

        self.extract_with_stats(&document, styles.as_deref(), numbering.as_deref(), stats)
    }

    /// Extract from already-read part contents
    pub fn extract_parts(
        &self,
        document: &[u8],
        styles: Option<&[u8]>,
        numbering: Option<&[u8]>,
    ) -> ExtractedDocument {
        self.extract_with_stats(document, styles, numbering, ParseStats::default())
    }

    fn extract_with_stats(
        &self,
        document: &[u8],
        styles: Option<&[u8]>,
        numbering: Option<&[u8]>,
        mut stats: ParseStats,
    ) -> ExtractedDocument {
        let styles = match styles.map(StyleSheet::parse) {
            Some(Ok(sheet)) => sheet,
            Some(Err(e)) => {
                stats.warn(malformed("styles.xml", &e));
                StyleSheet::default()
            }
            None => StyleSheet::default(),
        };
        let numbering = match numbering.map(Numbering::parse) {
            Some(Ok(numbering)) => numbering,
            Some(Err(e)) => {
                stats.warn(malformed("numbering.xml", &e));
                Numbering::default()
            }
            None => Numbering::default(),
        };

        let root = match XmlElement::parse(document) {
            Ok(root) => root,
            Err(e) => {
                stats.warn(malformed("document.xml", &e));
                return ExtractedDocument {
                    blocks: Vec::new(),
                    stats,
                };
            }
        };
        let body = if root.name == "body" {
            Some(&root)
        } else {
            root.find("body")
        };
        let Some(body) = body else {
            stats.warn(ParseWarning::MissingBody);
            return ExtractedDocument {
                blocks: Vec::new(),
                stats,
            };
        };

        let mut walker = BodyWalker {
            preserve_breaks: self.preserve_breaks,
            verbose: self.verbose,
            styles: &styles,
            numbering: &numbering,
            blocks: Vec::new(),
            stats,
            list: None,
        };
        walker.walk(body);
        let BodyWalker {
            blocks, mut stats, ..
        } = walker;

        if stats.dropped_breaks > 0 && !self.preserve_breaks {
            stats.warn(ParseWarning::DroppedBreaks(stats.dropped_breaks));
        }
        debug!(
            "Extracted {} blocks ({} headings, {} paragraphs, {} tables)",
            blocks.len(),
            stats.heading_total(),
            stats.paragraphs,
            stats.tables.count
        );
        ExtractedDocument { blocks, stats }
    }
}

fn failed(warning: ParseWarning) -> ExtractedDocument {
    warn!("{}", warning);
    let mut stats = ParseStats::default();
    stats.warn(warning);
    ExtractedDocument {
        blocks: Vec::new(),
        stats,
    }
}

fn malformed(part: &str, error: &dyn std::fmt::Display) -> ParseWarning {
    ParseWarning::MalformedPart {
        part: part.to_string(),
        detail: error.to_string(),
    }
}

/// Read a part; `Ok(None)` if the archive has no such entry
fn read_part<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    path: &str,
) -> std::result::Result<Option<Vec<u8>>, String> {
    let mut file = match zip.by_name(path) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)
        .map_err(|e| e.to_string())?;
    Ok(Some(contents))
}

fn optional_part<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    path: &str,
    part: &str,
    stats: &mut ParseStats,
) -> Option<Vec<u8>> {
    match read_part(zip, path) {
        Ok(contents) => contents,
        Err(detail) => {
            stats.warn(ParseWarning::UnreadablePart {
                part: part.to_string(),
                detail,
            });
            None
        }
    }
}

/// List currently being grouped
struct OpenList {
    num_id: String,
    ordered: bool,
    items: Vec<ListItem>,
}

struct BodyWalker<'a> {
    preserve_breaks: bool,
    verbose: bool,
    styles: &'a StyleSheet,
    numbering: &'a Numbering,
    blocks: Vec<Block>,
    stats: ParseStats,
    list: Option<OpenList>,
}

impl BodyWalker<'_> {
    fn walk(&mut self, body: &XmlElement) {
        for child in body.elements() {
            match child.name.as_str() {
                "p" => self.paragraph(child),
                "tbl" => {
                    self.flush_list();
                    self.table(child);
                }
                "sectPr" => self.breaks(1),
                _ => {}
            }
        }
        self.flush_list();
    }

    fn paragraph(&mut self, p: &XmlElement) {
        let breaks = count_breaks(p);
        if breaks > 0 {
            self.breaks(breaks);
        }

        let text = paragraph_text(p);
        let properties = p.child("pPr");

        if let Some((num_id, level)) = properties.and_then(list_membership) {
            let ordered = self.numbering.is_ordered(&num_id, &level.to_string());
            let continues = self
                .list
                .as_ref()
                .is_some_and(|l| l.num_id == num_id && l.ordered == ordered);
            if !continues {
                self.flush_list();
                self.list = Some(OpenList {
                    num_id,
                    ordered,
                    items: Vec::new(),
                });
            }
            if let Some(list) = self.list.as_mut() {
                if self.verbose {
                    debug!(
                        "List item (numId {}, level {}, ordered {}): {:?}",
                        list.num_id, level, ordered, text
                    );
                }
                list.items.push(ListItem::new(text, level));
            }
            return;
        }
        self.flush_list();

        let style_id = properties.and_then(|ppr| ppr.child_val("pStyle"));
        let role = style_id.and_then(|id| self.styles.role(id));
        let block = match role {
            Some(StyleRole::Title) => {
                self.stats.count_heading("title");
                Block::Title { text }
            }
            Some(StyleRole::Subtitle) => {
                self.stats.count_heading("subtitle");
                Block::Subtitle { text }
            }
            Some(StyleRole::Heading(level)) => {
                self.stats.count_heading(format!("level_{}", level));
                Block::heading(level, text)
            }
            None => {
                self.stats.paragraphs += 1;
                if text.trim().is_empty() {
                    if self.verbose {
                        debug!("Skipped blank paragraph (style {:?})", style_id);
                    }
                    return;
                }
                Block::Paragraph { text }
            }
        };
        if self.verbose {
            debug!("{} (style {:?}): {:?}", block.kind(), style_id, block.text());
        }
        self.blocks.push(block);
    }

    fn table(&mut self, tbl: &XmlElement) {
        let rows: Vec<Vec<String>> = tbl
            .children_named("tr")
            .map(|tr| {
                tr.children_named("tc")
                    .map(|tc| {
                        tc.children_named("p")
                            .map(paragraph_text)
                            .filter(|t| !t.is_empty())
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                    .collect()
            })
            .collect();

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if self.verbose {
            debug!("Table {}x{}", rows.len(), columns);
        }
        if rows.is_empty() {
            self.stats.tables.count += 1;
        } else {
            self.stats.record_table(rows.len(), columns);
        }
        self.blocks.push(Block::Table { rows });
    }

    fn breaks(&mut self, count: usize) {
        if self.preserve_breaks {
            self.flush_list();
            self.blocks
                .extend(std::iter::repeat_n(Block::Break, count));
        } else {
            self.stats.dropped_breaks += count;
        }
    }

    fn flush_list(&mut self) {
        if let Some(list) = self.list.take() {
            if list.ordered {
                self.stats.lists.numbered += 1;
            } else {
                self.stats.lists.bulleted += 1;
            }
            self.blocks.push(Block::List {
                ordered: list.ordered,
                items: list.items,
            });
        }
    }
}

/// `(numId, ilvl)` of a numbered paragraph; numId 0 switches numbering off
fn list_membership(properties: &XmlElement) -> Option<(String, u32)> {
    let num_pr = properties.child("numPr")?;
    let num_id = num_pr.child_val("numId")?;
    if num_id == "0" {
        return None;
    }
    let level = num_pr
        .child_val("ilvl")
        .and_then(|l| l.parse().ok())
        .unwrap_or(0);
    Some((num_id.to_string(), level))
}

/// Page breaks anywhere in the paragraph plus a paragraph-level section break
fn count_breaks(p: &XmlElement) -> usize {
    let page_breaks = p
        .find_all("br")
        .into_iter()
        .filter(|br| br.attr("type") == Some("page"))
        .count();
    let section_break = p
        .child("pPr")
        .is_some_and(|ppr| ppr.child("sectPr").is_some());
    page_breaks + usize::from(section_break)
}

/// Visible text of a paragraph
///
/// `w:t` text, `w:tab` as `\t`, untyped `w:br` and `w:cr` as `\n`.
/// Paragraph properties are skipped so tab stop definitions do not
/// count as tabs.
pub fn paragraph_text(p: &XmlElement) -> String {
    let mut text = String::new();
    collect_text(p, &mut text);
    text
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for child in element.elements() {
        match child.name.as_str() {
            "pPr" => {}
            "t" => out.push_str(&child.text()),
            "tab" => out.push('\t'),
            "br" if child.attr("type").is_none() => out.push('\n'),
            "cr" => out.push('\n'),
            _ => collect_text(child, out),
        }
    }
}
