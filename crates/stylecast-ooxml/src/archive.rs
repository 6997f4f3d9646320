//! Archive handling for DOCX/DOTX files
//!
//! DOCX and DOTX files are ZIP archives containing XML files and resources.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use zip::read::ZipArchive;
use zip::write::ZipWriter;
use zip::CompressionMethod;

use crate::error::{OoxmlError, Result};

/// Path of the main document part
pub const DOCUMENT_PART: &str = "word/document.xml";
/// Path of the style definitions part
pub const STYLES_PART: &str = "word/styles.xml";
/// Path of the numbering definitions part
pub const NUMBERING_PART: &str = "word/numbering.xml";
/// Path of the content types part
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const TEMPLATE_MAIN_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml";
const DOCUMENT_MAIN_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

/// Represents an unpacked OOXML document
#[derive(Debug, Default)]
pub struct OoxmlArchive {
    /// All files in the archive, keyed by path
    files: HashMap<String, Vec<u8>>,
}

impl OoxmlArchive {
    /// Open and unpack a DOCX/DOTX file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut files = HashMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            // Skip directories
            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            files.insert(name, contents);
        }

        Ok(Self { files })
    }

    /// Get a file's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|v| v.as_slice())
    }

    /// Get a file's contents as a string
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Get the main document content (word/document.xml)
    pub fn document_xml(&self) -> Result<&[u8]> {
        self.get(DOCUMENT_PART)
            .ok_or_else(|| OoxmlError::MissingFile(DOCUMENT_PART.to_string()))
    }

    /// Get the styles definition (word/styles.xml)
    pub fn styles_xml(&self) -> Option<&[u8]> {
        self.get(STYLES_PART)
    }

    /// Get the numbering definitions (word/numbering.xml)
    pub fn numbering_xml(&self) -> Option<&[u8]> {
        self.get(NUMBERING_PART)
    }

    /// Check if a file exists in the archive
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Set or update a file's contents
    pub fn set(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        self.files.insert(path.into(), contents);
    }

    /// Set a file's contents from a string
    pub fn set_string(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into().into_bytes());
    }

    /// Declare the main part as a document rather than a template
    ///
    /// A `.dotx` copied to `.docx` keeps the template content type, which
    /// Word refuses to open. Returns true if the content type was changed.
    pub fn mark_as_document(&mut self) -> bool {
        match self.get_string(CONTENT_TYPES_PART) {
            Some(types) if types.contains(TEMPLATE_MAIN_TYPE) => {
                let patched = types.replace(TEMPLATE_MAIN_TYPE, DOCUMENT_MAIN_TYPE);
                self.set_string(CONTENT_TYPES_PART, patched);
                true
            }
            _ => false,
        }
    }

    /// Write the archive to a file
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Write the archive to any writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated);

        // Content types first, the rest sorted for deterministic output
        let mut paths: Vec<_> = self.files.keys().collect();
        paths.sort_by(|a, b| {
            (a.as_str() != CONTENT_TYPES_PART, a).cmp(&(b.as_str() != CONTENT_TYPES_PART, b))
        });

        for path in paths {
            let contents = &self.files[path];
            zip.start_file(path.as_str(), options)?;
            zip.write_all(contents)?;
        }

        zip.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_file_operations() {
        let mut archive = OoxmlArchive::default();

        archive.set_string("test.xml", "<root/>");
        assert!(archive.contains("test.xml"));
        assert_eq!(archive.get_string("test.xml"), Some("<root/>".to_string()));
        assert!(archive.styles_xml().is_none());
        assert!(matches!(
            archive.document_xml(),
            Err(OoxmlError::MissingFile(_))
        ));
    }

    #[test]
    fn test_roundtrip_through_writer() {
        let mut archive = OoxmlArchive::default();
        archive.set_string("word/document.xml", "<w:document/>");
        archive.set_string(CONTENT_TYPES_PART, "<Types/>");

        let mut buffer = Cursor::new(Vec::new());
        archive.write_to(&mut buffer).unwrap();
        buffer.set_position(0);

        {
            let mut zip = ZipArchive::new(&mut buffer).unwrap();
            assert_eq!(zip.by_index(0).unwrap().name(), CONTENT_TYPES_PART);
        }

        buffer.set_position(0);
        let restored = OoxmlArchive::from_reader(buffer).unwrap();
        assert_eq!(restored.document_xml().unwrap(), b"<w:document/>");
    }

    #[test]
    fn test_mark_as_document() {
        let mut archive = OoxmlArchive::default();
        archive.set_string(
            CONTENT_TYPES_PART,
            format!(r#"<Types><Override PartName="/word/document.xml" ContentType="{}"/></Types>"#, TEMPLATE_MAIN_TYPE),
        );

        assert!(archive.mark_as_document());
        let types = archive.get_string(CONTENT_TYPES_PART).unwrap();
        assert!(types.contains(DOCUMENT_MAIN_TYPE));
        assert!(!archive.mark_as_document());
    }
}
