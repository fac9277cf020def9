//! End-to-end integration tests for the hubpilot sales assistant.
//!
//! These exercise a whole turn: context assembly, the model loop, tool
//! dispatch against real in-memory stores, and usage/artifact reporting.

use std::sync::{Arc, Mutex};

use hubpilot_agent::{CAP_NOTICE, SalesAgent, TurnRequest};
use hubpilot_core::error::ProviderError;
use hubpilot_core::provider::{Provider, ProviderRequest, ProviderResponse, StopReason, Usage};
use hubpilot_core::store::{BlobStorage, ConversationStore};
use hubpilot_core::{ArtifactKind, ContentBlock, EventBus, Offering, Publication, Role};
use hubpilot_store::{InMemoryBlobStorage, InMemoryConversationStore, InMemoryInventory};
use hubpilot_tools::ToolDispatcher;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence and keeps
/// every request it saw.
struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The tool results sent back to the model in request `call`.
    fn tool_results(&self, call: usize) -> Vec<(String, serde_json::Value, bool)> {
        let requests = self.requests.lock().unwrap();
        let last = requests[call].messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        last.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => Some((
                    tool_use_id.clone(),
                    serde_json::from_str(content).unwrap(),
                    *is_error,
                )),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let call = requests.len();
        if call >= responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{call}, have {}",
                responses.len()
            );
        }
        requests.push(request);
        Ok(responses[call].clone())
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: vec![ContentBlock::text(text)],
        stop_reason: StopReason::EndTurn,
        usage: Usage {
            input_tokens: 100,
            output_tokens: 20,
        },
        model: "mock".into(),
    }
}

fn tool_response(thought: &str, calls: &[(&str, &str, serde_json::Value)]) -> ProviderResponse {
    let mut content = Vec::new();
    if !thought.is_empty() {
        content.push(ContentBlock::text(thought));
    }
    for (id, name, input) in calls {
        content.push(ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input: input.clone(),
        });
    }
    ProviderResponse {
        content,
        stop_reason: StopReason::ToolUse,
        usage: Usage {
            input_tokens: 150,
            output_tokens: 30,
        },
        model: "mock".into(),
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

struct Harness {
    agent: SalesAgent,
    provider: Arc<ScriptedProvider>,
    conversations: Arc<InMemoryConversationStore>,
    blobs: Arc<InMemoryBlobStorage>,
}

fn inventory() -> InMemoryInventory {
    InMemoryInventory::new().with_hub(
        "hub-1",
        vec![
            Publication {
                publisher_id: "pub-1".into(),
                name: "Riverside Gazette".into(),
                channels: vec!["print".into()],
                offerings: vec![Offering {
                    channel: "print".into(),
                    name: "Full page".into(),
                    pricing: Some("$900".into()),
                }],
                ..Default::default()
            },
            Publication {
                publisher_id: "pub-2".into(),
                name: "Valley Radio".into(),
                channels: vec!["radio".into()],
                ..Default::default()
            },
        ],
    )
}

fn harness(responses: Vec<ProviderResponse>, max_iterations: u32) -> Harness {
    let provider = Arc::new(ScriptedProvider::new(responses));
    let conversations = Arc::new(InMemoryConversationStore::new());
    let blobs = Arc::new(InMemoryBlobStorage::new());
    let bus = Arc::new(EventBus::default());

    let dispatcher = ToolDispatcher::new(Arc::new(inventory()), conversations.clone())
        .with_blob_storage(blobs.clone(), conversations.clone())
        .with_event_bus(bus.clone());
    let agent = SalesAgent::new(
        provider.clone(),
        Arc::new(dispatcher),
        conversations.clone(),
        "mock",
    )
    .with_max_iterations(max_iterations)
    .with_event_bus(bus);

    Harness {
        agent,
        provider,
        conversations,
        blobs,
    }
}

fn request(message: &str) -> TurnRequest {
    TurnRequest {
        tenant_id: "hub-1".into(),
        conversation_id: "conv-1".into(),
        user_id: "user-1".into(),
        message: message.into(),
        history: vec![],
        attachments: vec![],
    }
}

// ── E2E: Plain answers ───────────────────────────────────────────────────

#[tokio::test]
async fn e2e_answer_without_tools_is_one_call() {
    let h = harness(vec![text_response("Happy to help with your campaign!")], 5);

    let result = h.agent.run_turn(request("Hello")).await.unwrap();

    assert_eq!(result.text, "Happy to help with your campaign!");
    assert_eq!(h.provider.calls(), 1);
    assert_eq!(result.usage.model_calls, 1);
    assert_eq!(result.usage.input_tokens, 100);
    assert!(!result.cap_reached);
    assert!(result.artifacts.is_empty());
}

// ── E2E: Tool failures are handed back to the model ─────────────────────

#[tokio::test]
async fn e2e_unconfigured_search_suggests_fallback() {
    let h = harness(
        vec![
            tool_response(
                "",
                &[(
                    "call_search",
                    "web_search",
                    serde_json::json!({"query": "Acme Coffee", "searchType": "brand_research"}),
                )],
            ),
            text_response("I couldn't look that up, tell me about Acme Coffee?"),
        ],
        5,
    );

    let result = h.agent.run_turn(request("Research Acme Coffee")).await.unwrap();

    assert_eq!(h.provider.calls(), 2);
    let results = h.provider.tool_results(1);
    assert_eq!(results.len(), 1);
    let (id, payload, is_error) = &results[0];
    assert_eq!(id, "call_search");
    assert!(is_error);
    assert!(payload["error"].as_str().unwrap().contains("web_search"));
    assert!(payload["suggestion"].is_string());
    assert!(result.text.contains("Acme Coffee"));
}

#[tokio::test]
async fn e2e_missing_publisher_does_not_stop_the_loop() {
    let h = harness(
        vec![
            tool_response(
                "Let me check.",
                &[(
                    "call_inv",
                    "get_inventory",
                    serde_json::json!({"queryType": "details", "publisherId": "pub-404"}),
                )],
            ),
            text_response("That publisher isn't in this hub."),
        ],
        5,
    );

    let result = h.agent.run_turn(request("Tell me about pub-404")).await.unwrap();

    let results = h.provider.tool_results(1);
    assert_eq!(
        results[0].1,
        serde_json::json!({"error": "Publisher not found: pub-404"})
    );
    assert_eq!(result.text, "That publisher isn't in this hub.");
    assert!(!result.cap_reached);
}

#[tokio::test]
async fn e2e_unknown_tool_is_reported_not_fatal() {
    let h = harness(
        vec![
            tool_response("", &[("call_x", "book_flight", serde_json::json!({}))]),
            text_response("I can't do that."),
        ],
        5,
    );

    let result = h.agent.run_turn(request("Book me a flight")).await.unwrap();

    let results = h.provider.tool_results(1);
    assert!(results[0].2);
    assert!(results[0].1["error"].as_str().unwrap().contains("book_flight"));
    assert_eq!(result.text, "I can't do that.");
}

// ── E2E: Multiple tools in one response ─────────────────────────────────

#[tokio::test]
async fn e2e_parallel_calls_return_in_one_message_in_order() {
    let h = harness(
        vec![
            tool_response(
                "",
                &[
                    (
                        "call_ctx",
                        "update_context",
                        serde_json::json!({"brandName": "Acme Coffee", "budgetMonthly": 2500}),
                    ),
                    (
                        "call_print",
                        "get_inventory",
                        serde_json::json!({"queryType": "by_channel", "channel": "print"}),
                    ),
                ],
            ),
            text_response("Riverside Gazette fits a $2,500 monthly budget."),
        ],
        5,
    );

    h.agent
        .run_turn(request("We're Acme Coffee with $2500 a month"))
        .await
        .unwrap();

    let results = h.provider.tool_results(1);
    let ids: Vec<&str> = results.iter().map(|(id, _, _)| id.as_str()).collect();
    assert_eq!(ids, ["call_ctx", "call_print"]);
    assert_eq!(results[0].1["success"], true);
    assert_eq!(results[1].1["count"], 1);
    assert_eq!(results[1].1["publications"][0]["publisherId"], "pub-1");

    let context = h
        .conversations
        .read_context("conv-1", "user-1")
        .await
        .unwrap();
    assert_eq!(context.brand_name.as_deref(), Some("Acme Coffee"));
    assert_eq!(context.budget_monthly, Some(2500.0));
}

#[tokio::test]
async fn e2e_captured_context_reaches_the_next_turn() {
    let h = harness(
        vec![
            tool_response(
                "",
                &[(
                    "call_ctx",
                    "update_context",
                    serde_json::json!({"industry": "Coffee roasting"}),
                )],
            ),
            text_response("Noted."),
            text_response("Welcome back!"),
        ],
        5,
    );

    h.agent.run_turn(request("We roast coffee")).await.unwrap();
    h.agent.run_turn(request("Hi again")).await.unwrap();

    let requests = h.provider.requests.lock().unwrap();
    assert!(!requests[0].system.contains("Coffee roasting"));
    assert!(requests[2].system.contains("Coffee roasting"));
}

// ── E2E: File generation ────────────────────────────────────────────────

#[tokio::test]
async fn e2e_tabular_export_creates_artifact() {
    let h = harness(
        vec![
            tool_response(
                "",
                &[(
                    "call_file",
                    "generate_file",
                    serde_json::json!({
                        "fileType": "tabular-export",
                        "content": "publisher,channel,price\nRiverside Gazette,print,$900\n",
                        "filename": "media plan"
                    }),
                )],
            ),
            text_response("Your media plan is ready to download."),
        ],
        5,
    );

    let result = h.agent.run_turn(request("Export the plan")).await.unwrap();

    assert_eq!(result.artifacts.len(), 1);
    let artifact = &result.artifacts[0];
    assert_eq!(artifact.kind, ArtifactKind::Export);
    assert_eq!(artifact.filename, "media-plan.csv");
    assert_eq!(artifact.content_type, "text/csv");

    let results = h.provider.tool_results(1);
    assert_eq!(results[0].1["fileId"], artifact.id.as_str());

    let stored = h.blobs.get(&artifact.storage_key).await.unwrap();
    assert!(String::from_utf8(stored).unwrap().starts_with("publisher,channel"));

    let recorded = h.conversations.list_artifacts("conv-1").await.unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].id, artifact.id);
}

// ── E2E: Iteration cap and usage ─────────────────────────────────────────

#[tokio::test]
async fn e2e_cap_reached_sums_usage_over_every_call() {
    let lookup = || {
        tool_response(
            "",
            &[(
                "call_sum",
                "get_inventory",
                serde_json::json!({"queryType": "summary"}),
            )],
        )
    };
    let h = harness(vec![lookup(), lookup(), lookup()], 3);

    let result = h.agent.run_turn(request("Keep looking")).await.unwrap();

    assert!(result.cap_reached);
    assert_eq!(result.text, CAP_NOTICE);
    assert_eq!(h.provider.calls(), 3);
    assert_eq!(result.usage.model_calls, 3);
    assert_eq!(result.usage.input_tokens, 450);
    assert_eq!(result.usage.output_tokens, 90);
    assert_eq!(result.usage.total_tokens(), 540);
}

#[tokio::test]
async fn e2e_cap_keeps_last_interim_text() {
    let h = harness(
        vec![tool_response(
            "Still checking radio options.",
            &[(
                "call_radio",
                "get_inventory",
                serde_json::json!({"queryType": "by_channel", "channel": "radio"}),
            )],
        )],
        1,
    );

    let result = h.agent.run_turn(request("Radio?")).await.unwrap();

    assert!(result.cap_reached);
    assert_eq!(result.text, "Still checking radio options.");
}
