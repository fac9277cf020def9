//! The static tool catalog sent with every model call.

use hubpilot_core::tool::{ToolDefinition, ToolName};
use serde_json::json;

/// Definitions of every tool, in catalog order.
pub fn tool_catalog() -> Vec<ToolDefinition> {
    ToolName::ALL.into_iter().map(definition).collect()
}

/// The definition of a single tool.
pub fn definition(name: ToolName) -> ToolDefinition {
    let (description, input_schema) = match name {
        ToolName::WebSearch => (
            "Search the web for current information about a prospect's brand, \
             company news or competitors. Use it before recommending a media plan \
             for a brand you know little about. Returns an answer with sources.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for, usually a brand or company name"
                    },
                    "searchType": {
                        "type": "string",
                        "enum": ["general", "brand_research", "company_news", "competitors"],
                        "description": "Kind of search (default general)"
                    },
                    "targetUrl": {
                        "type": "string",
                        "description": "The brand's website, when known"
                    },
                    "industry": {
                        "type": "string",
                        "description": "The brand's industry, to focus competitor searches"
                    }
                },
                "required": ["query"]
            }),
        ),
        ToolName::GetInventory => (
            "Query the hub's advertising inventory: the publications it represents, \
             the channels they sell and their ad products. Never invent inventory; \
             only recommend what this tool returns.",
            json!({
                "type": "object",
                "properties": {
                    "queryType": {
                        "type": "string",
                        "enum": ["all", "details", "by_channel", "search", "summary"],
                        "description": "all: every publication; details: one publication by publisherId; by_channel: publications selling a channel; search: text match; summary: aggregate counts"
                    },
                    "publisherId": {
                        "type": "string",
                        "description": "Required for details"
                    },
                    "channel": {
                        "type": "string",
                        "description": "Required for by_channel (e.g. print, website, newsletter, podcast, radio, social, events)"
                    },
                    "searchTerm": {
                        "type": "string",
                        "description": "Required for search"
                    }
                },
                "required": ["queryType"]
            }),
        ),
        ToolName::UpdateContext => (
            "Save facts learned about the prospect (brand, budget, timeline, audience, \
             goals) so they are remembered for the rest of the conversation. Only send \
             the fields you learned; other fields are kept.",
            json!({
                "type": "object",
                "properties": {
                    "brandName": { "type": "string" },
                    "brandUrl": { "type": "string" },
                    "industry": { "type": "string" },
                    "budgetMonthly": { "type": "number", "description": "Monthly budget in dollars" },
                    "budgetTotal": { "type": "number", "description": "Total campaign budget in dollars" },
                    "timeline": { "type": "string" },
                    "targetAudience": { "type": "string" },
                    "geography": { "type": "string" },
                    "objectives": {
                        "type": "array",
                        "items": { "type": "string" }
                    },
                    "notes": { "type": "string" }
                }
            }),
        ),
        ToolName::GenerateFile => (
            "Create a downloadable file for the user: a markdown document (proposal, \
             media plan, research summary) or a CSV export (line items, inventory lists).",
            json!({
                "type": "object",
                "properties": {
                    "fileType": {
                        "type": "string",
                        "enum": ["document", "tabular-export"],
                        "description": "document produces markdown (.md); tabular-export produces CSV (.csv)"
                    },
                    "content": {
                        "type": "string",
                        "description": "Full file content (markdown or CSV)"
                    },
                    "filename": {
                        "type": "string",
                        "description": "Optional file name; the extension is added automatically"
                    }
                },
                "required": ["fileType", "content"]
            }),
        ),
    };

    ToolDefinition {
        name: name.as_str().to_string(),
        description: description.to_string(),
        input_schema,
    }
}
