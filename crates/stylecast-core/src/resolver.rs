//! Style resolution
//!
//! Maps block semantics onto style names that already exist in the
//! template. Resolution is a pure function of the baseline inventory and
//! never fails: a missing style degrades to a fallback and is reported
//! later by the validation step.

use std::collections::{BTreeMap, HashMap};

/// Highest heading level looked up in the template
pub const MAX_TEMPLATE_HEADING_LEVEL: u32 = 9;

const BODY_CANDIDATES: &[&str] = &["body", "body text", "normal"];
const LEVEL1_CANDIDATES: &[&str] = &["heading", "heading 1"];

/// Name variants recognised as a native bullet list style, in preference order
pub const BULLET_LIST_CANDIDATES: &[&str] = &[
    "bullet",
    "bulleted list",
    "list bullet",
    "bullet list",
    "bullets",
];

/// Name variants recognised as a native numbered list style, in preference order
pub const NUMBERED_LIST_CANDIDATES: &[&str] = &[
    "numbered",
    "numbered list",
    "list number",
    "number list",
    "numbers",
];

/// Case-insensitive view of a template's paragraph style names
#[derive(Debug, Clone, Default)]
pub struct StyleInventory {
    names: Vec<String>,
    by_lower: HashMap<String, String>,
}

impl StyleInventory {
    /// Build from style names; the first spelling of a name wins
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inventory = Self::default();
        for name in names {
            let name = name.into();
            inventory
                .by_lower
                .entry(name.to_lowercase())
                .or_insert_with(|| name.clone());
            inventory.names.push(name);
        }
        inventory
    }

    /// Canonical spelling of `name`, if present
    pub fn find(&self, name: &str) -> Option<&str> {
        self.by_lower.get(&name.to_lowercase()).map(String::as_str)
    }

    /// First candidate present in the inventory
    pub fn first_of(&self, candidates: &[&str]) -> Option<String> {
        candidates
            .iter()
            .find_map(|c| self.find(c))
            .map(str::to_string)
    }

    /// Style names in their original order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Check if the inventory is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Resolved paragraph styles for one run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleMap {
    /// Body style
    pub body: Option<String>,
    /// Title style after fallback
    pub title: Option<String>,
    /// Subtitle style after fallback
    pub subtitle: Option<String>,
    /// Heading styles by level (sparse)
    pub headings: BTreeMap<u32, String>,
    /// Highest level with a resolved style, 0 if none
    pub max_heading_level: u32,
}

/// Style chosen for a heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingStyle<'a> {
    /// Style to apply (None when even body is missing)
    pub style: Option<&'a str>,
    /// The level was deeper than the template supports
    pub saturated: bool,
}

impl StyleMap {
    /// Resolve a map from the baseline inventory
    pub fn resolve(inventory: &StyleInventory) -> Self {
        let body = inventory.first_of(BODY_CANDIDATES);

        let mut headings = BTreeMap::new();
        if let Some(style) = inventory.first_of(LEVEL1_CANDIDATES) {
            headings.insert(1, style);
        }
        for level in 2..=MAX_TEMPLATE_HEADING_LEVEL {
            if let Some(style) = inventory.find(&format!("heading {}", level)) {
                headings.insert(level, style.to_string());
            }
        }
        let max_heading_level = headings.keys().next_back().copied().unwrap_or(0);

        let title = inventory
            .find("title")
            .map(str::to_string)
            .or_else(|| headings.get(&1).cloned())
            .or_else(|| body.clone());
        let subtitle = inventory
            .find("subtitle")
            .map(str::to_string)
            .or_else(|| body.clone());

        Self {
            body,
            title,
            subtitle,
            headings,
            max_heading_level,
        }
    }

    /// Style for a heading of the given level
    ///
    /// Levels past `max_heading_level` collapse onto the deepest available
    /// style. Gaps inside the supported range use the nearest shallower
    /// resolved level, then body.
    pub fn heading(&self, level: u32) -> HeadingStyle<'_> {
        let level = level.max(1);
        if level > self.max_heading_level {
            let style = self
                .headings
                .get(&self.max_heading_level)
                .or_else(|| self.headings.get(&1))
                .or(self.body.as_ref())
                .map(String::as_str);
            return HeadingStyle {
                style,
                saturated: true,
            };
        }

        let style = self
            .headings
            .range(..=level)
            .next_back()
            .map(|(_, s)| s)
            .or(self.body.as_ref())
            .map(String::as_str);
        HeadingStyle {
            style,
            saturated: false,
        }
    }
}

/// Native list styles found in the template
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListStyleAvailability {
    /// Bullet list style
    pub bullet: Option<String>,
    /// Numbered list style
    pub numbered: Option<String>,
}

impl ListStyleAvailability {
    /// Detect list styles from the baseline inventory
    pub fn detect(inventory: &StyleInventory) -> Self {
        Self {
            bullet: inventory.first_of(BULLET_LIST_CANDIDATES),
            numbered: inventory.first_of(NUMBERED_LIST_CANDIDATES),
        }
    }

    /// Native style for a list kind
    pub fn for_list(&self, ordered: bool) -> Option<&str> {
        if ordered {
            self.numbered.as_deref()
        } else {
            self.bullet.as_deref()
        }
    }
}

/// Everything the writers need to know about the template
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedStyles {
    pub map: StyleMap,
    pub lists: ListStyleAvailability,
}

impl ResolvedStyles {
    /// Resolve both the style map and list availability
    pub fn resolve(inventory: &StyleInventory) -> Self {
        Self {
            map: StyleMap::resolve(inventory),
            lists: ListStyleAvailability::detect(inventory),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory(names: &[&str]) -> StyleInventory {
        StyleInventory::new(names.iter().copied())
    }

    #[test]
    fn test_body_preference_order() {
        let map = StyleMap::resolve(&inventory(&["Normal", "Body Text"]));
        assert_eq!(map.body.as_deref(), Some("Body Text"));

        let map = StyleMap::resolve(&inventory(&["Normal"]));
        assert_eq!(map.body.as_deref(), Some("Normal"));

        let map = StyleMap::resolve(&inventory(&["Caption"]));
        assert_eq!(map.body, None);
    }

    #[test]
    fn test_case_insensitive_canonical_names() {
        let map = StyleMap::resolve(&inventory(&["BODY", "heading 2", "HEADING"]));
        assert_eq!(map.body.as_deref(), Some("BODY"));
        assert_eq!(map.headings.get(&1).map(String::as_str), Some("HEADING"));
        assert_eq!(map.headings.get(&2).map(String::as_str), Some("heading 2"));
    }

    #[test]
    fn test_level_one_accepts_plain_heading_first() {
        let map = StyleMap::resolve(&inventory(&["Heading 1", "Heading"]));
        assert_eq!(map.headings[&1], "Heading");
    }

    #[test]
    fn test_title_and_subtitle_fallbacks() {
        let map = StyleMap::resolve(&inventory(&["Body", "Heading 1"]));
        assert_eq!(map.title.as_deref(), Some("Heading 1"));
        assert_eq!(map.subtitle.as_deref(), Some("Body"));

        let map = StyleMap::resolve(&inventory(&["Body"]));
        assert_eq!(map.title.as_deref(), Some("Body"));

        let map = StyleMap::resolve(&inventory(&["Body", "Title", "Subtitle"]));
        assert_eq!(map.title.as_deref(), Some("Title"));
        assert_eq!(map.subtitle.as_deref(), Some("Subtitle"));
    }

    #[test]
    fn test_max_heading_level() {
        let map = StyleMap::resolve(&inventory(&["Heading", "Heading 2", "Heading 4"]));
        assert_eq!(map.max_heading_level, 4);
        assert_eq!(StyleMap::resolve(&inventory(&["Body"])).max_heading_level, 0);
    }

    #[test]
    fn test_saturation_for_all_depths() {
        let all: Vec<String> = (1..=9).map(|l| format!("Heading {}", l)).collect();
        for max in 0..=9u32 {
            let mut names = vec!["Body".to_string()];
            names.extend(all.iter().take(max as usize).cloned());
            let map = StyleMap::resolve(&StyleInventory::new(names));
            assert_eq!(map.max_heading_level, max);

            for level in (max + 1)..=(max + 5) {
                let resolved = map.heading(level);
                assert!(resolved.saturated);
                let expected = if max == 0 {
                    "Body".to_string()
                } else {
                    format!("Heading {}", max)
                };
                assert_eq!(resolved.style, Some(expected.as_str()), "L={} M={}", level, max);
            }
        }
    }

    #[test]
    fn test_sparse_levels_use_nearest_lower() {
        let map = StyleMap::resolve(&inventory(&["Body", "Heading 1", "Heading 3"]));
        let h2 = map.heading(2);
        assert!(!h2.saturated);
        assert_eq!(h2.style, Some("Heading 1"));
        assert_eq!(map.heading(3).style, Some("Heading 3"));
    }

    #[test]
    fn test_sparse_without_level_one_uses_body() {
        let map = StyleMap::resolve(&inventory(&["Body", "Heading 3"]));
        assert_eq!(map.heading(1).style, Some("Body"));
        assert_eq!(map.heading(2).style, Some("Body"));
        assert_eq!(map.heading(7).style, Some("Heading 3"));
    }

    #[test]
    fn test_no_styles_at_all() {
        let map = StyleMap::resolve(&StyleInventory::default());
        let h = map.heading(3);
        assert!(h.saturated);
        assert_eq!(h.style, None);
        assert_eq!(map.title, None);
    }

    #[test]
    fn test_list_detection() {
        let lists = ListStyleAvailability::detect(&inventory(&["Body", "List Bullet", "Numbered"]));
        assert_eq!(lists.for_list(false), Some("List Bullet"));
        assert_eq!(lists.for_list(true), Some("Numbered"));

        let lists = ListStyleAvailability::detect(&inventory(&["Body"]));
        assert_eq!(lists, ListStyleAvailability::default());
    }

    #[test]
    fn test_list_preference_order() {
        let lists = ListStyleAvailability::detect(&inventory(&["Bullets", "Bullet"]));
        assert_eq!(lists.bullet.as_deref(), Some("Bullet"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let inv = inventory(&["Body", "Title", "Heading", "Heading 2", "Bullet", "list number"]);
        assert_eq!(ResolvedStyles::resolve(&inv), ResolvedStyles::resolve(&inv));
    }

    #[test]
    fn test_inventory_keeps_order_and_first_spelling() {
        let inv = inventory(&["Body", "BODY", "Title"]);
        assert_eq!(inv.names(), &["Body", "BODY", "Title"]);
        assert_eq!(inv.find("body"), Some("Body"));
        assert!(!inv.is_empty());
    }
}
