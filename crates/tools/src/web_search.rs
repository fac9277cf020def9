//! Web search tool backed by a pluggable search API.
//!
//! The handler frames the model's query for the requested kind of search
//! and hands it to a [`SearchBackend`]. Without a backend the tool still
//! answers, with a structured error telling the model how to proceed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hubpilot_core::error::ToolError;
use hubpilot_core::tool::{ToolContext, ToolHandler, ToolName, ToolOutput};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const TOOL: &str = "web_search";

/// What the model is looking for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    #[default]
    General,
    BrandResearch,
    CompanyNews,
    Competitors,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchInput {
    pub query: String,
    #[serde(default)]
    pub search_type: SearchKind,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

/// A cited source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

/// A synthesized answer with its sources.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchAnswer {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// A search API the tool can query.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, prompt: &str) -> Result<SearchAnswer, ToolError>;
}

/// Phrase the query so the backend answers what a sales conversation needs.
pub fn frame_query(input: &WebSearchInput) -> String {
    let query = input.query.trim();
    let site = input
        .target_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .map(|u| format!(" (website: {})", u.trim()))
        .unwrap_or_default();
    let industry = input
        .industry
        .as_deref()
        .filter(|i| !i.trim().is_empty())
        .map(|i| format!(" in the {} industry", i.trim()))
        .unwrap_or_default();

    match input.search_type {
        SearchKind::General => query.to_string(),
        SearchKind::BrandResearch => format!(
            "Research the brand {query}{site}: what it sells, who its customers are, \
             how it positions itself and its recent marketing and advertising activity."
        ),
        SearchKind::CompanyNews => format!(
            "Recent news about {query}{site} from the last six months: announcements, \
             funding, expansions, new locations and campaigns."
        ),
        SearchKind::Competitors => format!(
            "Who are the main competitors of {query}{industry}, and where do they advertise?"
        ),
    }
}

pub struct WebSearchHandler {
    backend: Option<Arc<dyn SearchBackend>>,
}

impl WebSearchHandler {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A handler with no search API behind it.
    pub fn unconfigured() -> Self {
        Self { backend: None }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }
}

#[async_trait]
impl ToolHandler for WebSearchHandler {
    type Input = WebSearchInput;

    fn name(&self) -> ToolName {
        ToolName::WebSearch
    }

    fn validate(&self, input: &WebSearchInput) -> Result<(), ToolError> {
        if input.query.trim().is_empty() {
            return Err(ToolError::InvalidArguments {
                tool: TOOL.into(),
                reason: "'query' must not be empty".into(),
            });
        }
        Ok(())
    }

    async fn handle(&self, _ctx: &ToolContext, input: WebSearchInput) -> Result<ToolOutput, ToolError> {
        let backend = self.backend.as_ref().ok_or_else(|| ToolError::NotConfigured {
            tool: TOOL.into(),
            reason: "no search API key is set".into(),
            suggestion: "Web search is unavailable. Answer from what you already know \
                         and ask the user about their brand directly."
                .into(),
        })?;

        let prompt = frame_query(&input);
        debug!(backend = backend.name(), kind = ?input.search_type, "Running web search");
        let result = backend.search(&prompt).await?;

        Ok(ToolOutput::json(serde_json::json!({
            "searchType": input.search_type,
            "query": input.query,
            "answer": result.answer,
            "sources": result.sources,
        })))
    }
}

/// Perplexity's chat-completions search API.
pub struct PerplexitySearch {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for PerplexitySearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerplexitySearch")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl PerplexitySearch {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ToolError::NotConfigured {
                tool: TOOL.into(),
                reason: format!("failed to create HTTP client: {e}"),
                suggestion: "Answer without web search.".into(),
            })?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }
}

#[derive(Serialize)]
struct PplxRequest<'a> {
    model: &'a str,
    messages: Vec<PplxMessage<'a>>,
}

#[derive(Serialize)]
struct PplxMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct PplxResponse {
    choices: Vec<PplxChoice>,
    #[serde(default)]
    citations: Vec<String>,
    #[serde(default)]
    search_results: Vec<PplxSearchResult>,
}

#[derive(Deserialize)]
struct PplxChoice {
    message: PplxContent,
}

#[derive(Deserialize)]
struct PplxContent {
    content: String,
}

#[derive(Deserialize)]
struct PplxSearchResult {
    #[serde(default)]
    title: String,
    url: String,
}

impl PplxResponse {
    fn into_answer(self) -> SearchAnswer {
        let answer = self
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        // Prefer titled results; bare citations carry only URLs.
        let sources = if self.search_results.is_empty() {
            self.citations
                .into_iter()
                .map(|url| Source {
                    title: url.clone(),
                    url,
                })
                .collect()
        } else {
            self.search_results
                .into_iter()
                .map(|r| Source {
                    title: if r.title.is_empty() { r.url.clone() } else { r.title },
                    url: r.url,
                })
                .collect()
        };

        SearchAnswer { answer, sources }
    }
}

#[async_trait]
impl SearchBackend for PerplexitySearch {
    fn name(&self) -> &str {
        "perplexity"
    }

    async fn search(&self, prompt: &str) -> Result<SearchAnswer, ToolError> {
        let body = PplxRequest {
            model: &self.model,
            messages: vec![
                PplxMessage {
                    role: "system",
                    content: "Be precise and concise. Focus on facts useful to an advertising sales conversation.",
                },
                PplxMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolError::Upstream {
                tool: TOOL.into(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        match status {
            200 => {}
            401 | 403 => {
                return Err(ToolError::NotConfigured {
                    tool: TOOL.into(),
                    reason: "the search API rejected the credentials".into(),
                    suggestion: "Check PERPLEXITY_API_KEY. Continue without web search for now."
                        .into(),
                });
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                warn!(status, body = %body, "Search API error");
                return Err(ToolError::Upstream {
                    tool: TOOL.into(),
                    reason: format!("search API returned HTTP {status}"),
                });
            }
        }

        let parsed: PplxResponse = response.json().await.map_err(|e| ToolError::Upstream {
            tool: TOOL.into(),
            reason: format!("unreadable search response: {e}"),
        })?;
        Ok(parsed.into_answer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedSearch;

    #[async_trait]
    impl SearchBackend for CannedSearch {
        fn name(&self) -> &str {
            "canned"
        }

        async fn search(&self, prompt: &str) -> Result<SearchAnswer, ToolError> {
            Ok(SearchAnswer {
                answer: format!("answer to: {prompt}"),
                sources: vec![Source {
                    title: "Acme".into(),
                    url: "https://acme.example".into(),
                }],
            })
        }
    }

    fn ctx() -> ToolContext {
        ToolContext {
            tenant_id: "hub-1".into(),
            conversation_id: "c1".into(),
            user_id: "u1".into(),
        }
    }

    fn input(query: &str, kind: SearchKind) -> WebSearchInput {
        WebSearchInput {
            query: query.into(),
            search_type: kind,
            target_url: None,
            industry: None,
        }
    }

    #[tokio::test]
    async fn search_returns_answer_and_sources() {
        let handler = WebSearchHandler::new(Arc::new(CannedSearch));
        let out = handler
            .handle(&ctx(), input("Acme Coffee", SearchKind::General))
            .await
            .unwrap();
        assert_eq!(out.payload["searchType"], "general");
        assert_eq!(out.payload["query"], "Acme Coffee");
        assert_eq!(out.payload["answer"], "answer to: Acme Coffee");
        assert_eq!(out.payload["sources"][0]["url"], "https://acme.example");
        assert!(out.artifact.is_none());
    }

    #[tokio::test]
    async fn unconfigured_search_suggests_a_fallback() {
        let handler = WebSearchHandler::unconfigured();
        assert!(!handler.is_configured());
        let err = handler
            .handle(&ctx(), input("Acme", SearchKind::BrandResearch))
            .await
            .unwrap_err();
        let payload = err.to_payload();
        assert!(payload["error"].as_str().unwrap().contains("web_search"));
        assert!(payload["suggestion"].is_string());
    }

    #[test]
    fn blank_query_fails_validation() {
        let handler = WebSearchHandler::unconfigured();
        let err = handler.validate(&input("   ", SearchKind::General)).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn queries_are_framed_per_kind() {
        let mut brand = input("Acme Coffee", SearchKind::BrandResearch);
        brand.target_url = Some("acme.example".into());
        assert!(frame_query(&brand).contains("(website: acme.example)"));

        let mut rivals = input("Acme Coffee", SearchKind::Competitors);
        rivals.industry = Some("coffee".into());
        assert!(frame_query(&rivals).contains("in the coffee industry"));

        assert!(frame_query(&input("Acme", SearchKind::CompanyNews)).starts_with("Recent news"));
        assert_eq!(frame_query(&input(" Acme ", SearchKind::General)), "Acme");
    }

    #[test]
    fn search_type_uses_snake_case() {
        let parsed: WebSearchInput =
            serde_json::from_value(serde_json::json!({"query": "x", "searchType": "company_news"}))
                .unwrap();
        assert_eq!(parsed.search_type, SearchKind::CompanyNews);
    }

    #[test]
    fn perplexity_citations_become_sources() {
        let resp: PplxResponse = serde_json::from_str(
            r#"{
                "choices": [{"message": {"role": "assistant", "content": "Acme sells coffee."}}],
                "citations": ["https://acme.example/about"]
            }"#,
        )
        .unwrap();
        let answer = resp.into_answer();
        assert_eq!(answer.answer, "Acme sells coffee.");
        assert_eq!(answer.sources[0].url, "https://acme.example/about");
        assert_eq!(answer.sources[0].title, "https://acme.example/about");
    }

    #[test]
    fn perplexity_search_results_keep_titles() {
        let resp: PplxResponse = serde_json::from_str(
            r#"{
                "choices": [{"message": {"content": "ok"}}],
                "citations": ["https://a.example"],
                "search_results": [{"title": "About Acme", "url": "https://a.example"}]
            }"#,
        )
        .unwrap();
        assert_eq!(resp.into_answer().sources[0].title, "About Acme");
    }

    #[test]
    fn perplexity_debug_hides_key() {
        let search = PerplexitySearch::new(
            "pplx-secret",
            "https://api.perplexity.ai/",
            "sonar",
            Duration::from_secs(5),
        )
        .unwrap();
        let debug = format!("{search:?}");
        assert!(!debug.contains("pplx-secret"));
        assert!(debug.contains("https://api.perplexity.ai\""));
    }
}
