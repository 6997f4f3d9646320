//! Shared test utilities for stylecast-ooxml
//!
//! [`TestDocx`] synthesises small DOCX/DOTX packages in memory so tests
//! across the workspace can build sources and templates without binary
//! fixtures. The free functions produce body markup fragments.
//!
//! # Example
//! ```
//! use stylecast_ooxml::test_utils::{paragraph, TestDocx};
//!
//! let bytes = TestDocx::new()
//!     .paragraph_style("Heading1", "heading 1")
//!     .body(&paragraph(Some("Heading1"), "Intro"))
//!     .build()?;
//! assert!(!bytes.is_empty());
//! # Ok::<(), zip::result::ZipError>(())
//! ```

use std::io::{Cursor, Write};
use std::path::Path;

use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::archive::OoxmlArchive;
use crate::error::Result;
use crate::xml::escape_xml;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Builder for an in-memory DOCX package
#[derive(Debug, Clone, Default)]
pub struct TestDocx {
    styles: Vec<String>,
    with_styles: bool,
    numbering: Option<String>,
    body: String,
    section: bool,
    template: bool,
    extra_parts: Vec<(String, Vec<u8>)>,
    without_document: bool,
}

impl TestDocx {
    pub fn new() -> Self {
        Self {
            with_styles: true,
            ..Self::default()
        }
    }

    /// Declare a paragraph style
    pub fn paragraph_style(self, id: &str, name: &str) -> Self {
        self.style_xml(format!(
            r#"<w:style w:type="paragraph" w:styleId="{}"><w:name w:val="{}"/></w:style>"#,
            escape_xml(id),
            escape_xml(name)
        ))
    }

    /// Declare a paragraph style inheriting from `base`
    pub fn paragraph_style_based_on(self, id: &str, name: &str, base: &str) -> Self {
        self.style_xml(format!(
            r#"<w:style w:type="paragraph" w:styleId="{}"><w:name w:val="{}"/><w:basedOn w:val="{}"/></w:style>"#,
            escape_xml(id),
            escape_xml(name),
            escape_xml(base)
        ))
    }

    /// Declare a table style
    pub fn table_style(self, id: &str, name: &str) -> Self {
        self.style_xml(format!(
            r#"<w:style w:type="table" w:styleId="{}"><w:name w:val="{}"/></w:style>"#,
            escape_xml(id),
            escape_xml(name)
        ))
    }

    /// Add a raw `<w:style>` element
    pub fn style_xml(mut self, xml: impl Into<String>) -> Self {
        self.styles.push(xml.into());
        self
    }

    /// Omit `word/styles.xml` entirely
    pub fn without_styles(mut self) -> Self {
        self.with_styles = false;
        self
    }

    /// Add `word/numbering.xml` with the given inner markup
    pub fn numbering(mut self, inner: impl Into<String>) -> Self {
        self.numbering = Some(inner.into());
        self
    }

    /// Append body markup
    pub fn body(mut self, xml: &str) -> Self {
        self.body.push_str(xml);
        self
    }

    /// End the body with section properties
    pub fn with_section(mut self) -> Self {
        self.section = true;
        self
    }

    /// Declare the main part with the template (.dotx) content type
    pub fn as_template(mut self) -> Self {
        self.template = true;
        self
    }

    /// Add or replace an arbitrary part
    pub fn part(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.extra_parts.push((path.to_string(), contents.into()));
        self
    }

    /// Leave out `word/document.xml`
    pub fn without_document(mut self) -> Self {
        self.without_document = true;
        self
    }

    pub fn styles_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{}">{}</w:styles>"#,
            W_NS,
            self.styles.concat()
        )
    }

    pub fn document_xml(&self) -> String {
        let section = if self.section {
            r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#
        } else {
            ""
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{}"><w:body>{}{}</w:body></w:document>"#,
            W_NS, self.body, section
        )
    }

    fn content_types(&self) -> String {
        let main = if self.template {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml"
        } else {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="{}"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#,
            main
        )
    }

    /// Build the package bytes
    pub fn build(&self) -> ZipResult<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(&mut buffer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let mut parts: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".to_string(), self.content_types().into_bytes()),
            (
                "_rels/.rels".to_string(),
                br#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#
                    .to_vec(),
            ),
        ];
        if !self.without_document {
            parts.push(("word/document.xml".to_string(), self.document_xml().into_bytes()));
        }
        if self.with_styles {
            parts.push(("word/styles.xml".to_string(), self.styles_xml().into_bytes()));
        }
        if let Some(inner) = &self.numbering {
            parts.push((
                "word/numbering.xml".to_string(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><w:numbering xmlns:w="{}">{}</w:numbering>"#,
                    W_NS, inner
                )
                .into_bytes(),
            ));
        }
        for (path, contents) in &self.extra_parts {
            parts.retain(|(p, _)| p != path);
            parts.push((path.clone(), contents.clone()));
        }

        for (path, contents) in parts {
            zip.start_file(path, options)?;
            zip.write_all(&contents)?;
        }
        zip.finish()?;
        Ok(buffer.into_inner())
    }

    /// Build and unpack into an archive
    pub fn archive(&self) -> Result<OoxmlArchive> {
        OoxmlArchive::from_reader(Cursor::new(self.build()?))
    }

    /// Build and write to `path`
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.build()?)?;
        Ok(())
    }
}

/// A paragraph with an optional style ID and a single run
pub fn paragraph(style_id: Option<&str>, text: &str) -> String {
    let properties = style_id
        .map(|s| format!(r#"<w:pPr><w:pStyle w:val="{}"/></w:pPr>"#, escape_xml(s)))
        .unwrap_or_default();
    format!(
        r#"<w:p>{}<w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        properties,
        escape_xml(text)
    )
}

/// A numbered paragraph referencing `num_id` at level `ilvl`
pub fn list_item(num_id: u32, ilvl: u32, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="{}"/><w:numId w:val="{}"/></w:numPr></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        ilvl,
        num_id,
        escape_xml(text)
    )
}

/// A table with one single-paragraph cell per value
pub fn table(rows: &[&[&str]]) -> String {
    let mut xml = String::from("<w:tbl>");
    for row in rows {
        xml.push_str("<w:tr>");
        for cell in *row {
            xml.push_str("<w:tc>");
            xml.push_str(&paragraph(None, cell));
            xml.push_str("</w:tc>");
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

/// A paragraph holding only a page break
pub fn page_break() -> String {
    r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#.to_string()
}

/// Abstract numbering definition with one format per level
pub fn abstract_num(id: u32, formats: &[&str]) -> String {
    let levels: String = formats
        .iter()
        .enumerate()
        .map(|(i, f)| format!(r#"<w:lvl w:ilvl="{}"><w:numFmt w:val="{}"/></w:lvl>"#, i, f))
        .collect();
    format!(r#"<w:abstractNum w:abstractNumId="{}">{}</w:abstractNum>"#, id, levels)
}

/// Numbering instance linking `num_id` to an abstract definition
pub fn num(num_id: u32, abstract_id: u32) -> String {
    format!(
        r#"<w:num w:numId="{}"><w:abstractNumId w:val="{}"/></w:num>"#,
        num_id, abstract_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_contains_parts() {
        let archive = TestDocx::new()
            .paragraph_style("Normal", "Normal")
            .numbering(abstract_num(0, &["bullet"]))
            .body(&paragraph(None, "x"))
            .archive()
            .unwrap();
        assert!(archive.contains("word/document.xml"));
        assert!(archive.contains("word/styles.xml"));
        assert!(archive.contains("word/numbering.xml"));
    }

    #[test]
    fn test_without_parts() {
        let archive = TestDocx::new()
            .without_styles()
            .without_document()
            .archive()
            .unwrap();
        assert!(!archive.contains("word/document.xml"));
        assert!(archive.styles_xml().is_none());
    }

    #[test]
    fn test_part_override() {
        let archive = TestDocx::new()
            .part("word/styles.xml", "<broken")
            .archive()
            .unwrap();
        assert_eq!(archive.get_string("word/styles.xml").unwrap(), "<broken");
    }
}
