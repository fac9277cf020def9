//! Inventory records: the publications a hub can sell advertising on.

use serde::{Deserialize, Serialize};

/// One sellable advertising product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    /// Channel this product runs on (print, website, newsletter, ...)
    pub channel: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<String>,
}

/// A publication in a hub's inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub publisher_id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Channels the publication sells (lowercase)
    #[serde(default)]
    pub channels: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience_size: Option<u64>,

    #[serde(default)]
    pub offerings: Vec<Offering>,
}

impl Publication {
    /// Whether the publication sells on `channel` (case-insensitive).
    pub fn has_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c.eq_ignore_ascii_case(channel))
            || self
                .offerings
                .iter()
                .any(|o| o.channel.eq_ignore_ascii_case(channel))
    }

    /// Case-insensitive match against name, description and geography.
    pub fn matches_text(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        let hit = |s: &Option<String>| {
            s.as_deref()
                .is_some_and(|v| v.to_lowercase().contains(&term))
        };
        self.name.to_lowercase().contains(&term)
            || hit(&self.description)
            || hit(&self.geography)
            || self
                .offerings
                .iter()
                .any(|o| o.name.to_lowercase().contains(&term))
    }
}
