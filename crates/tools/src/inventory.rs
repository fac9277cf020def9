//! Inventory query tool: what the hub can actually sell.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use hubpilot_core::error::ToolError;
use hubpilot_core::inventory::Publication;
use hubpilot_core::store::InventoryStore;
use hubpilot_core::tool::{ToolContext, ToolHandler, ToolName, ToolOutput};
use serde::Deserialize;
use serde_json::{Value, json};

const TOOL: &str = "get_inventory";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    #[default]
    All,
    Details,
    ByChannel,
    Search,
    Summary,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInput {
    #[serde(default)]
    pub query_type: QueryKind,
    #[serde(default)]
    pub publisher_id: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub search_term: Option<String>,
}

pub struct InventoryHandler {
    store: Arc<dyn InventoryStore>,
}

impl InventoryHandler {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }
}

fn required<'a>(value: &'a Option<String>, field: &str, kind: &str) -> Result<&'a str, ToolError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments {
            tool: TOOL.into(),
            reason: format!("'{field}' is required when queryType is {kind}"),
        })
}

/// Compact listing entry.
fn summary_of(p: &Publication) -> Value {
    json!({
        "publisherId": p.publisher_id,
        "name": p.name,
        "channels": p.channels,
        "geography": p.geography,
        "audienceSize": p.audience_size,
        "offerings": p.offerings.len(),
    })
}

fn listing(kind: &str, publications: &[&Publication]) -> Value {
    let mut out = json!({
        "queryType": kind,
        "count": publications.len(),
        "publications": publications.iter().map(|p| summary_of(p)).collect::<Vec<_>>(),
    });
    if publications.is_empty() {
        out["message"] = json!("No matching publications in this hub's inventory");
    }
    out
}

fn summarize(publications: &[Publication]) -> Value {
    let mut channels: BTreeMap<String, usize> = BTreeMap::new();
    for p in publications {
        let mut seen: Vec<String> = p.channels.iter().map(|c| c.to_lowercase()).collect();
        seen.extend(p.offerings.iter().map(|o| o.channel.to_lowercase()));
        seen.sort();
        seen.dedup();
        for c in seen {
            *channels.entry(c).or_default() += 1;
        }
    }
    json!({
        "queryType": "summary",
        "totalPublications": publications.len(),
        "totalOfferings": publications.iter().map(|p| p.offerings.len()).sum::<usize>(),
        "totalAudience": publications.iter().filter_map(|p| p.audience_size).sum::<u64>(),
        "publicationsByChannel": channels,
    })
}

#[async_trait]
impl ToolHandler for InventoryHandler {
    type Input = InventoryInput;

    fn name(&self) -> ToolName {
        ToolName::GetInventory
    }

    fn validate(&self, input: &InventoryInput) -> Result<(), ToolError> {
        match input.query_type {
            QueryKind::Details => required(&input.publisher_id, "publisherId", "details").map(drop),
            QueryKind::ByChannel => required(&input.channel, "channel", "by_channel").map(drop),
            QueryKind::Search => required(&input.search_term, "searchTerm", "search").map(drop),
            QueryKind::All | QueryKind::Summary => Ok(()),
        }
    }

    async fn handle(&self, ctx: &ToolContext, input: InventoryInput) -> Result<ToolOutput, ToolError> {
        let publications = self.store.list_publications(&ctx.tenant_id).await?;

        let payload = match input.query_type {
            QueryKind::All => listing("all", &publications.iter().collect::<Vec<_>>()),
            QueryKind::Details => {
                let id = required(&input.publisher_id, "publisherId", "details")?;
                let publication = publications
                    .iter()
                    .find(|p| p.publisher_id == id)
                    .ok_or_else(|| ToolError::NotFound(format!("Publisher not found: {id}")))?;
                json!({
                    "queryType": "details",
                    "publication": publication,
                })
            }
            QueryKind::ByChannel => {
                let channel = required(&input.channel, "channel", "by_channel")?;
                let matches: Vec<&Publication> =
                    publications.iter().filter(|p| p.has_channel(channel)).collect();
                let mut out = listing("by_channel", &matches);
                out["channel"] = json!(channel.to_lowercase());
                out["offerings"] = matches
                    .iter()
                    .flat_map(|p| {
                        p.offerings
                            .iter()
                            .filter(|o| o.channel.eq_ignore_ascii_case(channel))
                            .map(|o| {
                                json!({
                                    "publisherId": p.publisher_id,
                                    "name": o.name,
                                    "pricing": o.pricing,
                                })
                            })
                    })
                    .collect();
                out
            }
            QueryKind::Search => {
                let term = required(&input.search_term, "searchTerm", "search")?;
                let matches: Vec<&Publication> =
                    publications.iter().filter(|p| p.matches_text(term)).collect();
                let mut out = listing("search", &matches);
                out["searchTerm"] = json!(term);
                out
            }
            QueryKind::Summary => summarize(&publications),
        };

        Ok(ToolOutput::json(payload))
    }
}
