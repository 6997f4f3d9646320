//! Editable view of `word/document.xml`
//!
//! The part is split into the markup before the body's children, the
//! top-level body nodes, the final section properties and the closing
//! markup. Template nodes keep their original bytes until they are edited,
//! so boilerplate, tables and section layout survive a save unchanged.

use quick_xml::events::Event;
use quick_xml::Reader;
use stylecast_core::writer::SOFT_BREAK;

use crate::error::{OoxmlError, Result};
use crate::extract::paragraph_text;
use crate::xml::{escape_xml, XmlElement};

/// A top-level paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyParagraph {
    /// Original markup; `None` once the paragraph must be re-rendered
    pub raw: Option<String>,
    /// Text with soft line breaks as U+2028
    pub text: String,
    pub style_id: Option<String>,
}

impl BodyParagraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            raw: None,
            text: text.into(),
            style_id: None,
        }
    }

    fn from_raw(raw: &str) -> Result<Self> {
        let element = XmlElement::parse(raw.as_bytes())?;
        let style_id = element
            .child("pPr")
            .and_then(|ppr| ppr.child_val("pStyle"))
            .map(str::to_string);
        Ok(Self {
            raw: Some(raw.to_string()),
            text: paragraph_text(&element).replace('\n', &SOFT_BREAK.to_string()),
            style_id,
        })
    }

    fn render(&self, out: &mut String) {
        match &self.raw {
            Some(raw) => out.push_str(raw),
            None => render_paragraph(out, &self.text, self.style_id.as_deref()),
        }
    }
}

/// A table created through the editing surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTable {
    pub style_id: Option<String>,
    /// `cells[row][column]`
    pub cells: Vec<Vec<String>>,
}

impl NativeTable {
    pub fn new(rows: usize, columns: usize, style_id: Option<String>) -> Self {
        Self {
            style_id,
            cells: vec![vec![String::new(); columns]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn columns(&self) -> usize {
        self.cells.first().map(Vec::len).unwrap_or(0)
    }

    fn render(&self, out: &mut String) {
        out.push_str("<w:tbl>\n");
        out.push_str("<w:tblPr>\n");
        if let Some(style) = &self.style_id {
            out.push_str(&format!("<w:tblStyle w:val=\"{}\"/>\n", escape_xml(style)));
        }
        out.push_str("<w:tblW w:w=\"5000\" w:type=\"pct\"/>\n");
        out.push_str("</w:tblPr>\n");

        out.push_str("<w:tblGrid>\n");
        for _ in 0..self.columns() {
            out.push_str("<w:gridCol w:w=\"2000\"/>\n");
        }
        out.push_str("</w:tblGrid>\n");

        for row in &self.cells {
            out.push_str("<w:tr>\n");
            for cell in row {
                out.push_str("<w:tc>\n");
                if cell.is_empty() {
                    // A cell must hold at least one paragraph
                    out.push_str("<w:p/>\n");
                } else {
                    for line in cell.split('\n') {
                        render_paragraph(out, line, None);
                    }
                }
                out.push_str("</w:tc>\n");
            }
            out.push_str("</w:tr>\n");
        }
        out.push_str("</w:tbl>\n");
    }
}

/// A top-level child of `<w:body>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyNode {
    Paragraph(BodyParagraph),
    /// Index into [`BodyPart::tables`]
    Table(usize),
    /// Any other element, kept verbatim
    Raw { name: String, xml: String },
}

/// `word/document.xml`, split around the body's children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    head: String,
    nodes: Vec<BodyNode>,
    tables: Vec<NativeTable>,
    section: Option<String>,
    tail: String,
}

impl BodyPart {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);

        let (head, empty_tail) = loop {
            let start = reader.buffer_position() as usize;
            match reader.read_event()? {
                Event::Start(e) if e.local_name().as_ref() == b"body" => {
                    check_prefix(e.name().prefix().map(|p| p.into_inner()))?;
                    break (xml[..reader.buffer_position() as usize].to_string(), None);
                }
                Event::Empty(e) if e.local_name().as_ref() == b"body" => {
                    check_prefix(e.name().prefix().map(|p| p.into_inner()))?;
                    let end = reader.buffer_position() as usize;
                    break (
                        format!("{}<w:body>", &xml[..start]),
                        Some(format!("</w:body>{}", &xml[end..])),
                    );
                }
                Event::Eof => {
                    return Err(OoxmlError::InvalidStructure(
                        "no body element".to_string(),
                    ))
                }
                _ => {}
            }
        };

        let mut part = BodyPart {
            head,
            nodes: Vec::new(),
            tables: Vec::new(),
            section: None,
            tail: String::new(),
        };
        if let Some(tail) = empty_tail {
            part.tail = tail;
            return Ok(part);
        }

        loop {
            let start = reader.buffer_position() as usize;
            let name = match reader.read_event()? {
                Event::Start(e) => {
                    reader.read_to_end(e.name())?;
                    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
                }
                Event::Empty(e) => String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                Event::End(_) => {
                    part.tail = xml[start..].to_string();
                    break;
                }
                Event::Eof => {
                    return Err(OoxmlError::InvalidStructure(
                        "unclosed body element".to_string(),
                    ))
                }
                Event::Text(_) => continue,
                _ => String::new(),
            };
            let raw = &xml[start..reader.buffer_position() as usize];
            part.nodes.push(if name == "p" {
                BodyNode::Paragraph(BodyParagraph::from_raw(raw)?)
            } else {
                BodyNode::Raw {
                    name,
                    xml: raw.to_string(),
                }
            });
        }

        if matches!(part.nodes.last(), Some(BodyNode::Raw { name, .. }) if name == "sectPr") {
            if let Some(BodyNode::Raw { xml, .. }) = part.nodes.pop() {
                part.section = Some(xml);
            }
        }
        Ok(part)
    }

    pub fn nodes(&self) -> &[BodyNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut Vec<BodyNode> {
        &mut self.nodes
    }

    pub fn table(&self, index: usize) -> Option<&NativeTable> {
        self.tables.get(index)
    }

    pub fn table_mut(&mut self, index: usize) -> Option<&mut NativeTable> {
        self.tables.get_mut(index)
    }

    /// Append a paragraph before the final section properties
    pub fn push_paragraph(&mut self, paragraph: BodyParagraph) {
        self.nodes.push(BodyNode::Paragraph(paragraph));
    }

    /// Append a table; returns its index for [`Self::table_mut`]
    pub fn push_table(&mut self, table: NativeTable) -> usize {
        self.tables.push(table);
        let index = self.tables.len() - 1;
        self.nodes.push(BodyNode::Table(index));
        index
    }

    /// Drop a pushed table from the body; `false` if it is not there
    pub fn remove_table(&mut self, index: usize) -> bool {
        let before = self.nodes.len();
        self.nodes
            .retain(|node| !matches!(node, BodyNode::Table(i) if *i == index));
        self.nodes.len() != before
    }

    pub fn has_section(&self) -> bool {
        self.section.is_some()
    }

    /// Serialize back to a complete `document.xml`
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.head.len() + self.tail.len() + 64 * self.nodes.len());
        out.push_str(&self.head);
        for node in &self.nodes {
            match node {
                BodyNode::Paragraph(p) => p.render(&mut out),
                BodyNode::Table(index) => {
                    if let Some(table) = self.tables.get(*index) {
                        table.render(&mut out);
                    }
                }
                BodyNode::Raw { xml, .. } => out.push_str(xml),
            }
        }
        if let Some(section) = &self.section {
            out.push_str(section);
        }
        out.push_str(&self.tail);
        out
    }
}

fn check_prefix(prefix: Option<&[u8]>) -> Result<()> {
    if prefix == Some(b"w".as_slice()) {
        Ok(())
    } else {
        Err(OoxmlError::InvalidStructure(
            "body element must use the w: namespace prefix".to_string(),
        ))
    }
}

/// Render one paragraph with an optional style
///
/// `\t` becomes `<w:tab/>` and U+2028 a `<w:br/>`. An empty text renders
/// a paragraph with no run.
pub fn render_paragraph(out: &mut String, text: &str, style_id: Option<&str>) {
    out.push_str("<w:p>\n");
    if let Some(style) = style_id {
        out.push_str("<w:pPr>\n");
        out.push_str(&format!("<w:pStyle w:val=\"{}\"/>\n", escape_xml(style)));
        out.push_str("</w:pPr>\n");
    }
    if !text.is_empty() {
        out.push_str("<w:r>\n");
        let mut segment = String::new();
        for c in text.chars() {
            match c {
                '\t' | SOFT_BREAK => {
                    push_text(out, &segment);
                    segment.clear();
                    out.push_str(if c == '\t' { "<w:tab/>\n" } else { "<w:br/>\n" });
                }
                _ => segment.push(c),
            }
        }
        push_text(out, &segment);
        out.push_str("</w:r>\n");
    }
    out.push_str("</w:p>\n");
}

fn push_text(out: &mut String, text: &str) {
    if !text.is_empty() {
        out.push_str(&format!(
            "<w:t xml:space=\"preserve\">{}</w:t>\n",
            escape_xml(text)
        ));
    }
}
