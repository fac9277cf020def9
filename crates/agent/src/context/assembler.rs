//! Builds the model input for one turn.
//!
//! The new user message is ordered: binary media first (images, then
//! PDFs the model reads directly), then the extracted text of other
//! attachments, then the user's own text.
//!
//! # Determinism
//!
//! Given the same context, history, attachments and blob contents, the
//! output is identical. Nothing time-dependent is used.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hubpilot_core::{Attachment, BlobStorage, ContentBlock, Message, Role, SessionContext};
use tracing::{debug, warn};

use crate::context::history;
use crate::prompt;

/// Sent in place of a user turn that has no readable content.
pub const UNREADABLE_TURN_NOTE: &str = "(The user sent attachments that could not be read.)";

/// Everything the loop needs for its first model call.
#[derive(Debug, Clone)]
pub struct AssembledTurn {
    pub system: String,
    pub messages: Vec<Message>,
    /// Filenames of attachments that could not be loaded
    pub skipped_attachments: Vec<String>,
}

pub struct MessageAssembler {
    base_prompt: String,
    history_window: usize,
    blobs: Option<Arc<dyn BlobStorage>>,
}

/// Wrap extracted attachment text in start/end markers.
pub fn wrap_attachment_text(filename: &str, text: &str) -> String {
    format!(
        "--- Start of attached file: {filename} ---\n{text}\n--- End of attached file: {filename} ---"
    )
}

impl MessageAssembler {
    pub fn new(history_window: usize) -> Self {
        Self {
            base_prompt: prompt::SALES_ASSISTANT_PROMPT.to_string(),
            history_window: history_window.max(1),
            blobs: None,
        }
    }

    /// Replace the built-in instructions.
    pub fn with_base_prompt(mut self, base_prompt: impl Into<String>) -> Self {
        self.base_prompt = base_prompt.into();
        self
    }

    /// Blob storage used to load image and PDF attachments.
    pub fn with_blob_storage(mut self, blobs: Arc<dyn BlobStorage>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    pub fn system_prompt(&self, context: &SessionContext) -> String {
        prompt::compose(&self.base_prompt, context)
    }

    pub async fn assemble(
        &self,
        context: &SessionContext,
        history: &[Message],
        text: &str,
        attachments: &[Attachment],
    ) -> AssembledTurn {
        let mut messages = history::window(history, self.history_window);
        let (user_turn, skipped_attachments) = self.user_turn(text, attachments).await;
        messages.push(user_turn);

        debug!(
            history = messages.len() - 1,
            attachments = attachments.len(),
            skipped = skipped_attachments.len(),
            "Turn assembled"
        );

        AssembledTurn {
            system: self.system_prompt(context),
            messages,
            skipped_attachments,
        }
    }

    /// The new user message, plus the names of skipped attachments.
    ///
    /// Never emits an empty text block: media-only turns carry no text,
    /// and a turn with nothing readable carries [`UNREADABLE_TURN_NOTE`].
    pub async fn user_turn(&self, text: &str, attachments: &[Attachment]) -> (Message, Vec<String>) {
        let mut media = Vec::new();
        let mut documents = Vec::new();
        let mut wrapped = Vec::new();
        let mut skipped = Vec::new();

        for attachment in attachments.iter().filter(|a| a.is_image) {
            match self.load_base64(attachment).await {
                Some(data) => media.push(ContentBlock::Image {
                    media_type: attachment.mime_type.clone(),
                    data,
                }),
                None => skipped.push(attachment.filename.clone()),
            }
        }

        for attachment in attachments.iter().filter(|a| !a.is_image) {
            let extracted = attachment
                .extracted_text
                .as_deref()
                .filter(|t| !t.trim().is_empty());
            match extracted {
                Some(extracted) => wrapped.push(wrap_attachment_text(&attachment.filename, extracted)),
                None if attachment.is_pdf() => match self.load_base64(attachment).await {
                    Some(data) => documents.push(ContentBlock::Document {
                        media_type: attachment.mime_type.clone(),
                        data,
                    }),
                    None => skipped.push(attachment.filename.clone()),
                },
                None => {
                    warn!(filename = %attachment.filename, "Attachment has no readable content, skipping");
                    skipped.push(attachment.filename.clone());
                }
            }
        }

        if !text.trim().is_empty() {
            wrapped.push(text.to_string());
        }
        let mut blocks = media;
        blocks.append(&mut documents);
        if !wrapped.is_empty() {
            blocks.push(ContentBlock::text(wrapped.join("\n\n")));
        }
        if blocks.is_empty() {
            blocks.push(ContentBlock::text(UNREADABLE_TURN_NOTE));
        }

        (Message::new(Role::User, blocks), skipped)
    }

    async fn load_base64(&self, attachment: &Attachment) -> Option<String> {
        let Some(key) = attachment.storage_key.as_deref() else {
            warn!(filename = %attachment.filename, "Attachment has no storage key, skipping");
            return None;
        };
        let Some(blobs) = &self.blobs else {
            warn!(filename = %attachment.filename, "No blob storage configured, skipping attachment");
            return None;
        };
        match blobs.get(key).await {
            Ok(bytes) => Some(STANDARD.encode(bytes)),
            Err(e) => {
                warn!(filename = %attachment.filename, key, error = %e, "Failed to load attachment, skipping");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubpilot_store::InMemoryBlobStorage;

    async fn blobs_with(key: &str, bytes: &[u8], content_type: &str) -> Arc<InMemoryBlobStorage> {
        let blobs = Arc::new(InMemoryBlobStorage::new());
        blobs.put(key, bytes.to_vec(), content_type).await.unwrap();
        blobs
    }

    #[tokio::test]
    async fn plain_message_is_one_text_block() {
        let assembler = MessageAssembler::new(20);
        let turn = assembler
            .assemble(&SessionContext::default(), &[], "Hello", &[])
            .await;
        assert_eq!(turn.messages.len(), 1);
        assert_eq!(turn.messages[0].content, vec![ContentBlock::text("Hello")]);
        assert!(turn.system.contains("Nothing yet."));
    }

    #[tokio::test]
    async fn attachments_are_ordered_images_then_text_then_message() {
        let blobs = blobs_with("uploads/ad.png", b"\x89PNG", "image/png").await;
        let assembler = MessageAssembler::new(20).with_blob_storage(blobs);
        let attachments = vec![
            Attachment::text("brief.txt", "text/plain", "Launch in May"),
            Attachment::image("ad.png", "image/png", "uploads/ad.png"),
        ];

        let (msg, skipped) = assembler.user_turn("Plan this", &attachments).await;
        assert!(skipped.is_empty());
        assert_eq!(msg.content.len(), 2);
        match &msg.content[0] {
            ContentBlock::Image { media_type, data } => {
                assert_eq!(media_type, "image/png");
                assert_eq!(data, &STANDARD.encode(b"\x89PNG"));
            }
            other => panic!("Expected image, got {other:?}"),
        }
        assert_eq!(
            msg.text(),
            "--- Start of attached file: brief.txt ---\nLaunch in May\n--- End of attached file: brief.txt ---\n\nPlan this"
        );
    }

    #[tokio::test]
    async fn pdf_without_text_becomes_document_block() {
        let blobs = blobs_with("uploads/rates.pdf", b"%PDF-1.7", "application/pdf").await;
        let assembler = MessageAssembler::new(20).with_blob_storage(blobs);
        let pdf = Attachment {
            filename: "rates.pdf".into(),
            mime_type: "application/pdf".into(),
            is_image: false,
            storage_key: Some("uploads/rates.pdf".into()),
            extracted_text: None,
        };
        let (msg, _) = assembler.user_turn("Summarize", &[pdf]).await;
        assert!(matches!(msg.content[0], ContentBlock::Document { .. }));
        assert_eq!(msg.text(), "Summarize");
    }

    #[tokio::test]
    async fn unloadable_attachments_are_skipped() {
        let assembler = MessageAssembler::new(20).with_blob_storage(Arc::new(InMemoryBlobStorage::new()));
        let attachments = vec![
            Attachment::image("missing.png", "image/png", "uploads/missing.png"),
            Attachment {
                filename: "empty.docx".into(),
                mime_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
                is_image: false,
                storage_key: None,
                extracted_text: Some("   ".into()),
            },
        ];
        let (msg, skipped) = assembler.user_turn("Hi", &attachments).await;
        assert_eq!(skipped, vec!["missing.png".to_string(), "empty.docx".to_string()]);
        assert_eq!(msg.content, vec![ContentBlock::text("Hi")]);
    }

    #[tokio::test]
    async fn image_only_turn_has_no_text_block() {
        let blobs = blobs_with("uploads/a.png", &[1, 2], "image/png").await;
        let assembler = MessageAssembler::new(20).with_blob_storage(blobs);
        let (msg, skipped) = assembler
            .user_turn("", &[Attachment::image("a.png", "image/png", "uploads/a.png")])
            .await;
        assert!(skipped.is_empty());
        assert_eq!(
            msg.content,
            vec![ContentBlock::Image {
                media_type: "image/png".into(),
                data: STANDARD.encode([1u8, 2]),
            }]
        );
    }

    #[tokio::test]
    async fn nothing_readable_sends_a_note() {
        let assembler = MessageAssembler::new(20);
        let (msg, skipped) = assembler
            .user_turn("  ", &[Attachment::image("a.png", "image/png", "uploads/a.png")])
            .await;
        assert_eq!(skipped, vec!["a.png".to_string()]);
        assert_eq!(msg.content, vec![ContentBlock::text(UNREADABLE_TURN_NOTE)]);
    }

    #[tokio::test]
    async fn images_need_blob_storage() {
        let assembler = MessageAssembler::new(20);
        let (_, skipped) = assembler
            .user_turn("Hi", &[Attachment::image("a.png", "image/png", "k/a.png")])
            .await;
        assert_eq!(skipped, vec!["a.png".to_string()]);
    }

    #[tokio::test]
    async fn history_is_windowed() {
        let assembler = MessageAssembler::new(2);
        let history = vec![
            Message::user("one"),
            Message::assistant("two"),
            Message::user("three"),
            Message::assistant("four"),
        ];
        let turn = assembler
            .assemble(&SessionContext::default(), &history, "five", &[])
            .await;
        // "three" is the first kept message; "two" and "one" fall outside
        let texts: Vec<String> = turn.messages.iter().map(Message::text).collect();
        assert_eq!(texts, vec!["three", "four", "five"]);
    }

    #[tokio::test]
    async fn custom_base_prompt_and_context() {
        let assembler = MessageAssembler::new(20).with_base_prompt("Custom.");
        let ctx = SessionContext {
            industry: Some("Coffee".into()),
            ..Default::default()
        };
        let turn = assembler.assemble(&ctx, &[], "Hi", &[]).await;
        assert!(turn.system.starts_with("Custom."));
        assert!(turn.system.contains("- Industry: Coffee"));
    }
}
