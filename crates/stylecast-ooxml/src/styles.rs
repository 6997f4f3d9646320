//! Style definitions parsing (word/styles.xml)
//!
//! This module parses Word style definitions in declaration order and
//! provides utilities for understanding the style hierarchy.

use std::collections::{HashMap, HashSet};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};

/// Collection of styles from a document
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    /// All styles, in declaration order
    styles: Vec<Style>,
    /// Position of each style ID in `styles` (first declaration wins)
    index: HashMap<String, usize>,
    /// Default paragraph style ID
    pub default_paragraph: Option<String>,
}

/// A Word style definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    /// Style ID (used in document references)
    pub id: String,
    /// Display name
    pub name: String,
    /// Style type
    pub style_type: StyleType,
    /// Base style ID (for inheritance)
    pub based_on: Option<String>,
}

/// Type of style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
}

/// Structural role a paragraph style carries in a source document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleRole {
    Title,
    Subtitle,
    Heading(u32),
}

impl StyleRole {
    /// Role implied by a style name alone
    ///
    /// Names are compared lower-cased with spaces removed, so `Heading 3`,
    /// `heading3` and `HEADING 3` all mean level 3.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| *c != ' ')
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "title" => Some(StyleRole::Title),
            "subtitle" => Some(StyleRole::Subtitle),
            _ => {
                let digits = key.strip_prefix("heading")?;
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                // "Heading 0" is treated as the top level
                digits.parse::<u32>().ok().map(|level| StyleRole::Heading(level.max(1)))
            }
        }
    }
}

impl StyleSheet {
    /// Parse styles from XML bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut stylesheet = StyleSheet::default();
        let mut buf = Vec::new();
        let mut current_style: Option<StyleBuilder> = None;
        let mut depth = 0usize;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    depth += 1;
                    Self::on_element(e, &mut current_style, depth)?;
                }
                Ok(Event::Empty(ref e)) => {
                    Self::on_element(e, &mut current_style, depth + 1)?;
                    if e.local_name().as_ref() == b"style" {
                        stylesheet.finish_style(current_style.take());
                    }
                }
                Ok(Event::End(ref e)) => {
                    if e.local_name().as_ref() == b"style" {
                        stylesheet.finish_style(current_style.take());
                    }
                    depth = depth.saturating_sub(1);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(stylesheet)
    }

    fn on_element(
        e: &BytesStart,
        current: &mut Option<StyleBuilder>,
        depth: usize,
    ) -> Result<()> {
        let name = e.local_name();
        if name.as_ref() == b"style" {
            *current = Some(StyleBuilder {
                id: get_attr(e, b"styleId")?,
                style_type: get_attr(e, b"type")?.map(|t| match t.as_str() {
                    "character" => StyleType::Character,
                    "table" => StyleType::Table,
                    "numbering" => StyleType::Numbering,
                    _ => StyleType::Paragraph,
                }),
                is_default: get_attr(e, b"default")?.as_deref() == Some("1"),
                depth,
                ..StyleBuilder::default()
            });
            return Ok(());
        }

        // Direct children of <w:style> only
        match (name.as_ref(), current.as_mut()) {
            (b"name", Some(builder)) if depth == builder.depth + 1 => {
                builder.name = get_attr(e, b"val")?;
            }
            (b"basedOn", Some(builder)) if depth == builder.depth + 1 => {
                builder.based_on = get_attr(e, b"val")?;
            }
            _ => {}
        }
        Ok(())
    }

    fn finish_style(&mut self, builder: Option<StyleBuilder>) {
        let Some(builder) = builder else { return };
        let is_default = builder.is_default;
        let Some(style) = builder.build() else { return };

        if is_default && style.style_type == StyleType::Paragraph {
            self.default_paragraph = Some(style.id.clone());
        }
        if !self.index.contains_key(&style.id) {
            self.index.insert(style.id.clone(), self.styles.len());
            self.styles.push(style);
        }
    }

    /// Get a style by ID
    pub fn get(&self, id: &str) -> Option<&Style> {
        self.index.get(id).map(|&i| &self.styles[i])
    }

    /// All styles in declaration order
    pub fn all(&self) -> impl Iterator<Item = &Style> {
        self.styles.iter()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Paragraph styles in declaration order
    pub fn paragraph_styles(&self) -> impl Iterator<Item = &Style> {
        self.styles
            .iter()
            .filter(|s| s.style_type == StyleType::Paragraph)
    }

    /// Display names of the paragraph styles, in declaration order
    pub fn paragraph_style_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.paragraph_styles()
            .filter(|s| seen.insert(s.name.as_str()))
            .map(|s| s.name.clone())
            .collect()
    }

    /// Find a paragraph style by display name
    ///
    /// Exact matches win over case-insensitive ones.
    pub fn find_paragraph_style(&self, name: &str) -> Option<&Style> {
        self.paragraph_styles()
            .find(|s| s.name == name)
            .or_else(|| {
                self.paragraph_styles()
                    .find(|s| s.name.eq_ignore_ascii_case(name))
            })
    }

    /// ID of the plain grid table style, if the template defines one
    pub fn table_grid_style(&self) -> Option<&str> {
        self.styles
            .iter()
            .filter(|s| s.style_type == StyleType::Table)
            .find(|s| s.id == "TableGrid" || s.name.eq_ignore_ascii_case("table grid"))
            .map(|s| s.id.as_str())
    }

    /// Resolve the full inheritance chain for a style
    pub fn resolve_chain(&self, style_id: &str) -> Vec<&Style> {
        let mut chain = Vec::new();
        let mut current = style_id;
        let mut seen = HashSet::new();

        while let Some(style) = self.get(current) {
            if !seen.insert(&style.id) {
                break; // Avoid infinite loops
            }
            chain.push(style);
            if let Some(ref base) = style.based_on {
                current = base;
            } else {
                break;
            }
        }

        chain
    }

    /// Structural role of a paragraph style, inherited through `basedOn`
    pub fn role(&self, style_id: &str) -> Option<StyleRole> {
        self.resolve_chain(style_id)
            .into_iter()
            .take_while(|s| s.style_type == StyleType::Paragraph)
            .find_map(|s| StyleRole::from_name(&s.name))
    }
}

#[derive(Default)]
struct StyleBuilder {
    id: Option<String>,
    name: Option<String>,
    style_type: Option<StyleType>,
    based_on: Option<String>,
    is_default: bool,
    depth: usize,
}

impl StyleBuilder {
    fn build(self) -> Option<Style> {
        let id = self.id?;
        Some(Style {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            style_type: self.style_type.unwrap_or(StyleType::Paragraph),
            based_on: self.based_on,
        })
    }
}

fn get_attr(e: &BytesStart, local: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == local {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
