//! Batched paragraph writer
//!
//! Blocks are turned into `(text, style)` entries and buffered. A flush
//! inserts the whole buffer with one bulk append, then styles only the
//! paragraphs it just inserted, addressed from the paragraph count taken
//! before the insertion. The cost of a flush depends on the batch size,
//! never on how much has been written already.

use std::collections::{BTreeSet, HashMap};

use stylecast_ast::{Block, ListItem};
use tracing::{debug, warn};

use crate::error::{Result, SurfaceResult};
use crate::options::ComposeOptions;
use crate::resolver::ResolvedStyles;
use crate::surface::DocumentSurface;
use crate::table::{TableOutcome, TableWriter};

/// Separator used inside one paragraph for embedded line breaks
pub const SOFT_BREAK: char = '\u{2028}';

const FALLBACK_INDENT: &str = "    ";
const BULLET_PREFIX: &str = "• ";
/// Deepest list nesting written; deeper items are placed at this level
pub const MAX_LIST_LEVEL: usize = 9;

/// Replace hard line breaks so one entry stays one paragraph
pub fn soft_breaks(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace(['\n', '\r'], &SOFT_BREAK.to_string())
}

/// A paragraph waiting to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedParagraph {
    pub text: String,
    pub style: Option<String>,
}

/// Paragraphs not yet committed to the document
#[derive(Debug, Clone, Default)]
pub struct WriteBuffer {
    entries: Vec<BufferedParagraph>,
}

impl WriteBuffer {
    pub fn push(&mut self, text: String, style: Option<String>) {
        self.entries.push(BufferedParagraph { text, style });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take every entry, leaving the buffer empty
    pub fn take(&mut self) -> Vec<BufferedParagraph> {
        std::mem::take(&mut self.entries)
    }
}

/// Per-run cache of style handles keyed by style name
#[derive(Debug)]
pub struct StyleCache<H> {
    handles: HashMap<String, H>,
}

impl<H: Clone> StyleCache<H> {
    /// Look up every baseline style once
    pub fn prime<S>(surface: &mut S, names: &[String]) -> Self
    where
        S: DocumentSurface<Style = H>,
    {
        let mut handles = HashMap::with_capacity(names.len());
        for name in names {
            match surface.style(name) {
                Ok(handle) => {
                    handles.insert(name.clone(), handle);
                }
                Err(e) => debug!("Style '{}' not cached: {}", name, e),
            }
        }
        Self { handles }
    }

    /// Cached handle, or a fresh lookup that is then cached
    pub fn get_or_lookup<S>(&mut self, surface: &mut S, name: &str) -> SurfaceResult<H>
    where
        S: DocumentSurface<Style = H>,
    {
        if let Some(handle) = self.handles.get(name) {
            return Ok(handle.clone());
        }
        let handle = surface.style(name)?;
        self.handles.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Counters and findings accumulated while writing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteTally {
    /// Titles, subtitles and headings
    pub headings_written: usize,
    /// Body paragraphs, breaks included
    pub paragraphs_written: usize,
    /// List blocks
    pub lists_written: usize,
    /// Table blocks placed in the document, natively or as text
    pub tables_written: usize,
    /// Tables rendered as text
    pub table_fallback_count: usize,
    /// Paragraphs that could not be inserted or styled
    pub paragraph_errors: usize,
    /// Lists rendered with prefixes because no native style exists
    pub text_lists: usize,
    /// Headings collapsed onto a shallower style
    pub saturated_headings: usize,
    /// List items nested deeper than [`MAX_LIST_LEVEL`]
    pub clamped_list_items: usize,
    /// Paragraphs left unstyled because the template has no body style
    pub unstyled_paragraphs: usize,
    /// Flushes that had to rewrite the whole body
    pub body_rewrites: usize,
    /// Completed flushes
    pub flushes: usize,
    /// Style names applied at least once
    pub styles_used: BTreeSet<String>,
    /// Human-readable warnings
    pub warnings: Vec<String>,
}

/// Writes a block stream into a [`DocumentSurface`] in batches
pub struct BatchedWriter<'a, S: DocumentSurface> {
    surface: &'a mut S,
    styles: &'a ResolvedStyles,
    cache: StyleCache<S::Style>,
    batch_size: usize,
    prefix_deep_headings: bool,
    tables: TableWriter,
    buffer: WriteBuffer,
    tally: WriteTally,
}

impl<'a, S: DocumentSurface> BatchedWriter<'a, S> {
    /// Create a writer over an opened surface
    pub fn new(
        surface: &'a mut S,
        styles: &'a ResolvedStyles,
        cache: StyleCache<S::Style>,
        options: &ComposeOptions,
    ) -> Self {
        Self {
            surface,
            styles,
            cache,
            batch_size: options.effective_batch_size(),
            prefix_deep_headings: options.prefix_deep_headings,
            tables: TableWriter::new(options),
            buffer: WriteBuffer::default(),
            tally: WriteTally::default(),
        }
    }

    /// Buffered entries not yet flushed
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Counters so far
    pub fn tally(&self) -> &WriteTally {
        &self.tally
    }

    /// Buffer one block; tables are written immediately after a flush
    pub fn process_block(&mut self, block: Block) -> Result<()> {
        match block {
            Block::Title { text } => {
                let style = self.styles.map.title.clone();
                self.tally.headings_written += 1;
                self.push(&text, style)
            }
            Block::Subtitle { text } => {
                let style = self.styles.map.subtitle.clone();
                self.tally.headings_written += 1;
                self.push(&text, style)
            }
            Block::Heading { level, text } => {
                let resolved = self.styles.map.heading(level);
                let style = resolved.style.map(str::to_string);
                let text = if resolved.saturated {
                    self.tally.saturated_headings += 1;
                    if self.prefix_deep_headings {
                        format!("H{}: {}", level, text)
                    } else {
                        text
                    }
                } else {
                    text
                };
                self.tally.headings_written += 1;
                self.push(&text, style)
            }
            Block::Paragraph { text } => {
                let style = self.body_style();
                self.tally.paragraphs_written += 1;
                self.push(&text, style)
            }
            Block::Break => {
                let style = self.body_style();
                self.tally.paragraphs_written += 1;
                self.push("", style)
            }
            Block::List { ordered, items } => self.write_list(ordered, &items),
            Block::Table { rows } => self.write_table(&rows),
        }
    }

    /// Flush what is left and hand back the counters
    pub fn finish(mut self) -> Result<WriteTally> {
        self.flush()?;

        let tally = &mut self.tally;
        if tally.text_lists > 0 {
            tally.warnings.push(format!(
                "{} list(s) rendered as prefixed text (no native list style in template)",
                tally.text_lists
            ));
        }
        if tally.saturated_headings > 0 {
            tally.warnings.push(format!(
                "{} heading(s) deeper than the template supports (max level {}) were collapsed",
                tally.saturated_headings, self.styles.map.max_heading_level
            ));
        }
        if tally.clamped_list_items > 0 {
            tally.warnings.push(format!(
                "{} list item(s) nested deeper than level {} were placed at level {}",
                tally.clamped_list_items, MAX_LIST_LEVEL, MAX_LIST_LEVEL
            ));
        }
        if tally.unstyled_paragraphs > 0 {
            tally.warnings.push(format!(
                "{} paragraph(s) left unstyled (template has no body style)",
                tally.unstyled_paragraphs
            ));
        }
        if tally.body_rewrites > 0 {
            tally.warnings.push(format!(
                "Bulk append unavailable; document body rewritten {} time(s)",
                tally.body_rewrites
            ));
        }
        Ok(self.tally)
    }

    /// Insert buffered entries and style them
    pub fn flush(&mut self) -> Result<()> {
        let entries = self.buffer.take();
        if entries.is_empty() {
            return Ok(());
        }
        let count = entries.len();

        let before = self.surface.paragraph_count()?;
        let payload = entries
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if let Err(e) = self.insert(&payload, before) {
            warn!("Could not insert {} paragraph(s): {}", count, e);
            self.tally.paragraph_errors += count;
            self.tally
                .warnings
                .push(format!("{} paragraph(s) could not be inserted: {}", count, e));
            return Ok(());
        }

        let after = self.surface.paragraph_count()?;
        let start = if after == before + count {
            before
        } else {
            // The surface merged or split paragraphs; new content is still at the end
            debug!(
                "Paragraph count moved {} -> {} for {} entries",
                before, after, count
            );
            after.saturating_sub(count)
        };
        debug!("Flushed {} paragraph(s) at offset {}", count, start);

        for (i, entry) in entries.into_iter().enumerate() {
            let Some(name) = entry.style else {
                continue;
            };
            if start + i < before {
                // Merged into a paragraph that was already in the body
                debug!("Entry {} has no paragraph of its own; '{}' not applied", i, name);
                self.tally.paragraph_errors += 1;
                continue;
            }
            let applied = self
                .cache
                .get_or_lookup(self.surface, &name)
                .and_then(|handle| self.surface.set_paragraph_style(start + i, &handle));
            match applied {
                Ok(()) => {
                    self.tally.styles_used.insert(name);
                }
                Err(e) => {
                    debug!("Styling paragraph {} as '{}' failed: {}", start + i, name, e);
                    self.tally.paragraph_errors += 1;
                }
            }
        }
        self.tally.flushes += 1;
        Ok(())
    }

    fn insert(&mut self, payload: &str, before: usize) -> SurfaceResult<()> {
        let append_err = match self.surface.append_text(payload) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        debug!("Bulk append failed ({}), rewriting body", append_err);

        if before == 0 && self.surface.set_body_text(payload).is_ok() {
            self.tally.body_rewrites += 1;
            return Ok(());
        }

        let existing = self.surface.body_text()?;
        let combined = if before == 0 {
            payload.to_string()
        } else {
            format!("{}\n{}", existing, payload)
        };
        self.surface.set_body_text(&combined)?;
        self.tally.body_rewrites += 1;
        Ok(())
    }

    fn push(&mut self, text: &str, style: Option<String>) -> Result<()> {
        if style.is_none() {
            self.tally.unstyled_paragraphs += 1;
        }
        self.buffer.push(soft_breaks(text), style);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn body_style(&self) -> Option<String> {
        self.styles.map.body.clone()
    }

    fn write_list(&mut self, ordered: bool, items: &[ListItem]) -> Result<()> {
        self.tally.lists_written += 1;

        if let Some(native) = self.styles.lists.for_list(ordered).map(str::to_string) {
            for item in items {
                let level = self.list_level(item);
                let text = format!("{}{}", "\t".repeat(level), item.text);
                self.push(&text, Some(native.clone()))?;
            }
            return Ok(());
        }

        self.tally.text_lists += 1;
        let body = self.body_style();
        let mut counters: Vec<usize> = Vec::new();
        for item in items {
            let level = self.list_level(item);
            let indent = FALLBACK_INDENT.repeat(level);
            let text = if ordered {
                counters.truncate(level + 1);
                counters.resize(level + 1, 0);
                counters[level] += 1;
                format!("{}{}. {}", indent, counters[level], item.text)
            } else {
                format!("{}{}{}", indent, BULLET_PREFIX, item.text)
            };
            self.push(&text, body.clone())?;
        }
        Ok(())
    }

    fn list_level(&mut self, item: &ListItem) -> usize {
        let level = usize::try_from(item.level).unwrap_or(usize::MAX);
        if level > MAX_LIST_LEVEL {
            self.tally.clamped_list_items += 1;
            return MAX_LIST_LEVEL;
        }
        level
    }

    fn write_table(&mut self, rows: &[Vec<String>]) -> Result<()> {
        self.flush()?;
        let number = self.tally.tables_written + 1;

        match self.tables.write(self.surface, rows) {
            TableOutcome::Native => {
                self.tally.tables_written += 1;
            }
            TableOutcome::Fallback { reason } => {
                self.tally.tables_written += 1;
                self.tally.table_fallback_count += 1;
                self.tally
                    .warnings
                    .push(format!("Table {} rendered as text: {}", number, reason));
            }
            TableOutcome::Lost { reason } => {
                self.tally.table_fallback_count += 1;
                self.tally.paragraph_errors += rows.len();
                self.tally
                    .warnings
                    .push(format!("Table {} could not be written: {}", number, reason));
            }
            TableOutcome::Empty => {
                self.tally
                    .warnings
                    .push(format!("Table {} has no cells and was skipped", number));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StyleInventory;
    use crate::testing::MockSurface;

    fn resolve(names: &[&str]) -> ResolvedStyles {
        ResolvedStyles::resolve(&StyleInventory::new(names.iter().copied()))
    }

    fn write_all(
        surface: &mut MockSurface,
        styles: &ResolvedStyles,
        options: &ComposeOptions,
        blocks: Vec<Block>,
    ) -> WriteTally {
        let names = surface.paragraph_style_names().unwrap();
        let cache = StyleCache::prime(surface, &names);
        let mut writer = BatchedWriter::new(surface, styles, cache, options);
        for block in blocks {
            writer.process_block(block).unwrap();
            assert!(writer.pending() < options.effective_batch_size());
        }
        writer.finish().unwrap()
    }

    #[test]
    fn test_soft_breaks() {
        assert_eq!(soft_breaks("a\nb\r\nc\rd"), "a\u{2028}b\u{2028}c\u{2028}d");
        assert_eq!(soft_breaks(""), "");
    }

    #[test]
    fn test_styles_only_new_paragraphs() {
        let mut surface = MockSurface::new(["Body", "Heading 1"]).with_paragraphs(["Boilerplate"]);
        let styles = resolve(&["Body", "Heading 1"]);
        let tally = write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![Block::heading(1, "Intro"), Block::paragraph("Text")],
        );

        let paragraphs = surface.paragraphs();
        assert_eq!(paragraphs[0].text, "Boilerplate");
        assert_eq!(paragraphs[0].style, None);
        assert_eq!(paragraphs[1].style.as_deref(), Some("Heading 1"));
        assert_eq!(paragraphs[2].style.as_deref(), Some("Body"));
        assert_eq!(tally.headings_written, 1);
        assert_eq!(tally.paragraphs_written, 1);
        assert_eq!(tally.paragraph_errors, 0);
    }

    #[test]
    fn test_split_append_styles_trailing_paragraphs() {
        let mut surface =
            MockSurface::new(["Body", "Heading 1"]).with_paragraphs(["Header", "Confidential"]);
        surface.split_on_append();
        let styles = resolve(&["Body", "Heading 1"]);
        let tally = write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![Block::heading(1, "Intro"), Block::paragraph("Text")],
        );

        let paragraphs = surface.paragraphs();
        assert_eq!(paragraphs.len(), 5);
        assert!(paragraphs[..3].iter().all(|p| p.style.is_none()));
        assert_eq!(paragraphs[3].text, "Intro");
        assert_eq!(paragraphs[3].style.as_deref(), Some("Heading 1"));
        assert_eq!(paragraphs[4].text, "Text");
        assert_eq!(paragraphs[4].style.as_deref(), Some("Body"));
        assert_eq!(tally.paragraph_errors, 0);
    }

    #[test]
    fn test_merged_append_leaves_boilerplate_unstyled() {
        let mut surface =
            MockSurface::new(["Body", "Heading 1"]).with_paragraphs(["Header", "Confidential"]);
        surface.merge_on_append();
        let styles = resolve(&["Body", "Heading 1"]);
        let tally = write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![
                Block::heading(1, "Intro"),
                Block::paragraph("One"),
                Block::paragraph("Two"),
            ],
        );

        let paragraphs = surface.paragraphs();
        assert_eq!(paragraphs.len(), 4);
        assert_eq!(paragraphs[1].text, "ConfidentialIntro");
        assert_eq!(paragraphs[0].style, None);
        assert_eq!(paragraphs[1].style, None);
        assert_eq!(paragraphs[2].style.as_deref(), Some("Body"));
        assert_eq!(paragraphs[3].style.as_deref(), Some("Body"));
        assert_eq!(tally.paragraph_errors, 1);
    }

    #[test]
    fn test_absurd_list_level_is_clamped() {
        let mut surface = MockSurface::new(["Body"]);
        let styles = resolve(&["Body"]);
        let tally = write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![Block::List {
                ordered: true,
                items: vec![
                    ListItem::new("top", 0),
                    ListItem::new("deep", u32::MAX),
                    ListItem::new("deeper", u32::MAX),
                ],
            }],
        );

        let texts = surface.paragraph_texts();
        assert_eq!(texts[0], "1. top");
        let indent = FALLBACK_INDENT.repeat(MAX_LIST_LEVEL);
        assert_eq!(texts[1], format!("{}1. deep", indent));
        assert_eq!(texts[2], format!("{}2. deeper", indent));
        assert_eq!(tally.clamped_list_items, 2);
        assert!(tally
            .warnings
            .iter()
            .any(|w| w.contains("2 list item(s) nested deeper than level 9")));
    }

    #[test]
    fn test_flushes_at_batch_size() {
        let mut surface = MockSurface::new(["Body"]);
        let styles = resolve(&["Body"]);
        let blocks = (0..7).map(|i| Block::paragraph(i.to_string())).collect();
        let tally = write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default().with_batch_size(3),
            blocks,
        );

        assert_eq!(tally.flushes, 3);
        assert_eq!(surface.append_calls(), 3);
        assert_eq!(surface.paragraph_texts(), vec!["0", "1", "2", "3", "4", "5", "6"]);
    }

    #[test]
    fn test_empty_text_and_breaks_are_kept() {
        let mut surface = MockSurface::new(["Body"]);
        let styles = resolve(&["Body"]);
        write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![Block::paragraph("a"), Block::paragraph(""), Block::Break, Block::paragraph("b")],
        );
        assert_eq!(surface.paragraph_texts(), vec!["a", "", "", "b"]);
        assert!(surface
            .paragraphs()
            .iter()
            .all(|p| p.style.as_deref() == Some("Body")));
    }

    #[test]
    fn test_embedded_newline_stays_one_paragraph() {
        let mut surface = MockSurface::new(["Body"]);
        let styles = resolve(&["Body"]);
        write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![Block::paragraph("line one\nline two"), Block::paragraph("next")],
        );
        assert_eq!(
            surface.paragraph_texts(),
            vec!["line one\u{2028}line two", "next"]
        );
    }

    #[test]
    fn test_saturated_heading_prefix() {
        let styles = resolve(&["Body", "Heading", "Heading 2"]);
        let mut surface = MockSurface::new(["Body", "Heading", "Heading 2"]);
        let tally = write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default().with_prefix_deep_headings(true),
            vec![Block::heading(2, "Fits"), Block::heading(5, "Deep")],
        );

        assert_eq!(surface.paragraph_texts(), vec!["Fits", "H5: Deep"]);
        assert_eq!(surface.paragraphs()[1].style.as_deref(), Some("Heading 2"));
        assert_eq!(tally.saturated_headings, 1);
    }

    #[test]
    fn test_native_lists_use_tabs() {
        let names = ["Body", "Bullet", "Numbered"];
        let styles = resolve(&names);
        let mut surface = MockSurface::new(names);
        write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![Block::List {
                ordered: false,
                items: vec![ListItem::new("top", 0), ListItem::new("nested", 2)],
            }],
        );

        assert_eq!(surface.paragraph_texts(), vec!["top", "\t\tnested"]);
        assert!(surface
            .paragraphs()
            .iter()
            .all(|p| p.style.as_deref() == Some("Bullet")));
    }

    #[test]
    fn test_fallback_bullets() {
        let styles = resolve(&["Body"]);
        let mut surface = MockSurface::new(["Body"]);
        let tally = write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![Block::List {
                ordered: false,
                items: vec![ListItem::new("one", 0), ListItem::new("two", 1)],
            }],
        );

        assert_eq!(surface.paragraph_texts(), vec!["• one", "    • two"]);
        assert_eq!(tally.text_lists, 1);
        assert!(tally.warnings.iter().any(|w| w.contains("prefixed text")));
    }

    #[test]
    fn test_fallback_numbering_restarts_nested_levels() {
        let styles = resolve(&["Body"]);
        let mut surface = MockSurface::new(["Body"]);
        write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![Block::List {
                ordered: true,
                items: vec![
                    ListItem::new("a", 0),
                    ListItem::new("a.1", 1),
                    ListItem::new("a.2", 1),
                    ListItem::new("b", 0),
                    ListItem::new("b.1", 1),
                ],
            }],
        );

        assert_eq!(
            surface.paragraph_texts(),
            vec!["1. a", "    1. a.1", "    2. a.2", "2. b", "    1. b.1"]
        );
    }

    #[test]
    fn test_style_failure_is_isolated() {
        let styles = resolve(&["Body"]);
        let mut surface = MockSurface::new(["Body"]);
        surface.fail_style_at(1);
        let tally = write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![Block::paragraph("a"), Block::paragraph("b"), Block::paragraph("c")],
        );

        assert_eq!(tally.paragraph_errors, 1);
        let got: Vec<_> = surface.paragraphs().iter().map(|p| p.style.clone()).collect();
        assert_eq!(got, vec![Some("Body".to_string()), None, Some("Body".to_string())]);
        assert!(tally.styles_used.contains("Body"));
    }

    #[test]
    fn test_set_body_fallback_when_empty() {
        let styles = resolve(&["Body"]);
        let mut surface = MockSurface::new(["Body"]);
        surface.disable_append();
        let tally = write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default().with_batch_size(2),
            vec![Block::paragraph("a"), Block::paragraph("b"), Block::paragraph("c")],
        );

        assert_eq!(surface.paragraph_texts(), vec!["a", "b", "c"]);
        assert_eq!(tally.body_rewrites, 2);
        assert_eq!(tally.paragraph_errors, 0);
        assert!(tally.warnings.iter().any(|w| w.contains("rewritten 2 time(s)")));
    }

    #[test]
    fn test_read_append_write_keeps_boilerplate() {
        let styles = resolve(&["Body"]);
        let mut surface = MockSurface::new(["Body"]).with_paragraphs(["Header"]);
        surface.disable_append();
        write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![Block::paragraph("a")],
        );

        assert_eq!(surface.paragraph_texts(), vec!["Header", "a"]);
        assert_eq!(surface.paragraphs()[0].style, None);
        assert_eq!(surface.paragraphs()[1].style.as_deref(), Some("Body"));
    }

    #[test]
    fn test_lost_batch_counts_every_entry() {
        let styles = resolve(&["Body"]);
        let mut surface = MockSurface::new(["Body"]);
        surface.disable_append();
        surface.disable_body_rewrite();
        let tally = write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![Block::paragraph("a"), Block::paragraph("b")],
        );

        assert_eq!(tally.paragraph_errors, 2);
        assert!(surface.paragraphs().is_empty());
    }

    #[test]
    fn test_table_flushes_pending_text_first() {
        let styles = resolve(&["Body"]);
        let mut surface = MockSurface::new(["Body"]);
        let tally = write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![
                Block::paragraph("before"),
                Block::Table {
                    rows: vec![vec!["x".into()]],
                },
                Block::paragraph("after"),
            ],
        );

        assert_eq!(surface.paragraph_texts(), vec!["before", "", "after"]);
        assert_eq!(surface.paragraphs()[2].style.as_deref(), Some("Body"));
        assert_eq!(tally.tables_written, 1);
        assert_eq!(tally.table_fallback_count, 0);
    }

    #[test]
    fn test_table_fallback_is_counted() {
        let styles = resolve(&["Body"]);
        let mut surface = MockSurface::new(["Body"]);
        surface.fail_table_creation();
        let tally = write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![Block::Table {
                rows: vec![vec!["a".into(), "b".into()]],
            }],
        );

        assert_eq!(tally.table_fallback_count, 1);
        assert!(tally.warnings[0].starts_with("Table 1 rendered as text"));
        assert_eq!(surface.paragraph_texts(), vec!["| a | b |", ""]);
    }

    #[test]
    fn test_no_body_style_leaves_paragraphs_unstyled() {
        let styles = resolve(&["Caption"]);
        let mut surface = MockSurface::new(["Caption"]);
        let tally = write_all(
            &mut surface,
            &styles,
            &ComposeOptions::default(),
            vec![Block::paragraph("plain")],
        );
        assert_eq!(tally.unstyled_paragraphs, 1);
        assert_eq!(tally.paragraph_errors, 0);
        assert!(tally.styles_used.is_empty());
    }

    #[test]
    fn test_cache_primes_baseline() {
        let mut surface = MockSurface::new(["Body", "Title"]);
        let names = surface.paragraph_style_names().unwrap();
        let mut cache = StyleCache::prime(&mut surface, &names);
        assert_eq!(cache.len(), 2);
        assert!(cache.get_or_lookup(&mut surface, "Missing").is_err());
        assert_eq!(cache.len(), 2);
    }
}
