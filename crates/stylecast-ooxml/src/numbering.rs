//! Numbering definitions (word/numbering.xml)
//!
//! Only what list grouping needs: whether a given `(numId, ilvl)` renders
//! as an ordered or a bulleted list.

use std::collections::HashMap;

use crate::error::Result;
use crate::xml::XmlElement;

/// Parsed numbering definitions
#[derive(Debug, Clone, Default)]
pub struct Numbering {
    /// abstractNumId -> (ilvl -> ordered)
    abstract_nums: HashMap<String, HashMap<String, bool>>,
    /// numId -> abstractNumId
    nums: HashMap<String, String>,
}

impl Numbering {
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let root = XmlElement::parse(xml)?;
        let mut numbering = Numbering::default();

        for abstract_num in root.find_all("abstractNum") {
            let Some(abstract_id) = abstract_num.attr("abstractNumId") else {
                continue;
            };
            let levels = abstract_num
                .children_named("lvl")
                .filter_map(|lvl| {
                    let ilvl = lvl.attr("ilvl")?;
                    let format = lvl.child_val("numFmt").unwrap_or("bullet");
                    Some((ilvl.to_string(), is_ordered_format(format)))
                })
                .collect();
            numbering.abstract_nums.insert(abstract_id.to_string(), levels);
        }

        for num in root.find_all("num") {
            let (Some(num_id), Some(abstract_id)) =
                (num.attr("numId"), num.child_val("abstractNumId"))
            else {
                continue;
            };
            numbering.nums.insert(num_id.to_string(), abstract_id.to_string());
        }

        Ok(numbering)
    }

    /// Whether list level `ilvl` of `num_id` is ordered
    ///
    /// Unknown numbering instances and levels count as bulleted.
    pub fn is_ordered(&self, num_id: &str, ilvl: &str) -> bool {
        self.nums
            .get(num_id)
            .and_then(|abstract_id| self.abstract_nums.get(abstract_id))
            .and_then(|levels| levels.get(ilvl))
            .copied()
            .unwrap_or(false)
    }
}

/// `bullet` and `none` are unordered; every counting format is ordered
pub fn is_ordered_format(format: &str) -> bool {
    !matches!(format, "bullet" | "none")
}
