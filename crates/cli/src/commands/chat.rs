//! `hubpilot chat`: single-message or interactive chat.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use hubpilot_agent::{SalesAgent, TurnRequest, TurnResult};
use hubpilot_config::AppConfig;
use hubpilot_core::store::BlobStorage;
use hubpilot_core::{Attachment, DomainEvent, Message};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Send a single message instead of entering interactive mode
    #[arg(short, long)]
    pub message: Option<String>,

    /// Attach a file to the first message (repeatable)
    #[arg(short, long = "attach", value_name = "FILE")]
    pub attachments: Vec<PathBuf>,

    /// Hub whose inventory the assistant sells
    #[arg(short, long, env = "HUBPILOT_TENANT", default_value = "demo-hub")]
    pub tenant: String,

    /// Continue an existing conversation
    #[arg(short, long)]
    pub conversation: Option<String>,

    #[arg(short, long, default_value = "cli-user")]
    pub user: String,
}

pub async fn run(args: ChatArgs, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No model API key configured!");
        eprintln!();
        eprintln!("  Set ANTHROPIC_API_KEY (or HUBPILOT_API_KEY), or add model.api_key to:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = hubpilot_providers::build_from_config(&config)?;
    let stores = hubpilot_agent::open_storage(&config)?;
    let blobs = stores.blobs.clone();
    let agent = hubpilot_agent::build_with_collaborators(&config, provider, stores)?;

    if verbose {
        spawn_event_printer(&agent);
    }

    let conversation_id = args
        .conversation
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut attachments = Vec::with_capacity(args.attachments.len());
    for path in &args.attachments {
        attachments.push(load_attachment(path, &conversation_id, blobs.as_ref()).await?);
    }

    let mut session = ChatSession {
        agent,
        tenant_id: args.tenant,
        conversation_id,
        user_id: args.user,
        history: Vec::new(),
    };

    if let Some(msg) = args.message {
        eprint!("  Thinking...");
        let result = session.send(msg, attachments).await;
        eprint!("\r              \r");
        print_result(&result?);
        return Ok(());
    }

    println!();
    println!("  hubpilot: interactive mode");
    println!("  Hub:          {}", session.tenant_id);
    println!("  Conversation: {}", session.conversation_id);
    println!("  Model:        {}", session.agent.model());
    println!("  Type 'exit' or Ctrl+C to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = attachments;
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        eprint!("  ...");
        let result = session.send(line, std::mem::take(&mut pending)).await;
        eprint!("\r     \r");
        match result {
            Ok(result) => print_result(&result),
            Err(e) => eprintln!("  ❌ {e}\n"),
        }
    }

    Ok(())
}

/// Client-side conversation state for one CLI session.
struct ChatSession {
    agent: SalesAgent,
    tenant_id: String,
    conversation_id: String,
    user_id: String,
    history: Vec<Message>,
}

impl ChatSession {
    async fn send(
        &mut self,
        message: String,
        attachments: Vec<Attachment>,
    ) -> Result<TurnResult, hubpilot_agent::TurnError> {
        let request = TurnRequest {
            tenant_id: self.tenant_id.clone(),
            conversation_id: self.conversation_id.clone(),
            user_id: self.user_id.clone(),
            message: message.clone(),
            history: self.history.clone(),
            attachments,
        };
        let result = self.agent.run_turn(request).await?;
        if !message.trim().is_empty() {
            self.history.push(Message::user(message));
        }
        if !result.text.trim().is_empty() {
            self.history.push(Message::assistant(result.text.clone()));
        }
        Ok(result)
    }
}

fn print_result(result: &TurnResult) {
    println!("\n  {}\n", result.text.replace('\n', "\n  "));
    for artifact in &result.artifacts {
        println!(
            "  📎 {} ({} bytes, id {})",
            artifact.filename, artifact.size_bytes, artifact.id
        );
    }
    if result.cap_reached {
        println!("  ⚠️  Stopped at the tool-call limit for this turn.");
    }
    tracing::debug!(
        input_tokens = result.usage.input_tokens,
        output_tokens = result.usage.output_tokens,
        model_calls = result.usage.model_calls,
        "Turn usage"
    );
}

fn spawn_event_printer(agent: &SalesAgent) {
    let mut rx = agent.event_bus().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event.as_ref() {
                DomainEvent::ToolExecuted {
                    tool_name,
                    success,
                    duration_ms,
                    ..
                } => {
                    let mark = if *success { "✓" } else { "✗" };
                    eprintln!("  {mark} {tool_name} ({duration_ms} ms)");
                }
                DomainEvent::IterationCapReached { iterations, .. } => {
                    eprintln!("  ⚠️  iteration cap reached after {iterations} model calls");
                }
                _ => {}
            }
        }
    });
}

/// MIME type for a local file, by extension.
fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        _ => "text/plain",
    }
}

/// Turn a local file into an attachment.
///
/// Images and PDFs are uploaded to blob storage under
/// `uploads/{conversation}/{id}/{filename}`; anything else is read as
/// UTF-8 text.
async fn load_attachment(
    path: &Path,
    conversation_id: &str,
    blobs: &dyn BlobStorage,
) -> Result<Attachment, Box<dyn std::error::Error>> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("Not a file: {}", path.display()))?
        .to_string();
    let mime = mime_for(path);
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;

    let is_image = mime.starts_with("image/");
    if is_image || mime == "application/pdf" {
        let key = format!(
            "uploads/{conversation_id}/{}/{filename}",
            uuid::Uuid::new_v4()
        );
        blobs.put(&key, bytes, mime).await?;
        return Ok(Attachment {
            filename,
            mime_type: mime.into(),
            is_image,
            storage_key: Some(key),
            extracted_text: None,
        });
    }

    let text = String::from_utf8(bytes)
        .map_err(|_| format!("{} is not UTF-8 text", path.display()))?;
    Ok(Attachment::text(filename, mime, text))
}
