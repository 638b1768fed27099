// File: ./src/service/parse.rs
//! Extraction of office hours from free text through a chat model.
use super::ServiceResponse;
use crate::llm::{ChatModel, prompt};
use crate::model::ScheduleEntryDraft;
use crate::parser::emit::Emitter;
use crate::parser::finalize::format_entry;
use crate::parser::sanitize::{FenceLang, strip_fences};
use crate::parser::StreamParser;
use anyhow::{Result, bail};
use http::StatusCode;
use serde_json::Value;

pub const NOTHING_TO_PARSE: &str = "Invalid input data. Nothing to parse.";
pub const PARSE_FAILED: &str = "Failed to parse office hours";

pub struct ParseService<M> {
    model: M,
}

impl<M: ChatModel> ParseService<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Streams previews of each record to `emitter` while the model writes.
    /// The payload of a success is the number of previews emitted.
    pub async fn parse_stream<E: Emitter>(
        &self,
        course_id: i64,
        raw: &str,
        emitter: &mut E,
    ) -> ServiceResponse<usize> {
        let fragments = match self.model.stream(&prompt::stream_prompt(raw)).await {
            Ok(fragments) => fragments,
            Err(e) => {
                log::error!("Model stream failed to start: {:#}", e);
                return ServiceResponse::failure(e.to_string(), StatusCode::BAD_REQUEST);
            }
        };

        let mut parser = StreamParser::new(course_id);
        let emitted = match parser.consume(fragments, emitter).await {
            Ok(n) => n,
            Err(e) => {
                log::error!("Model stream aborted: {:#}", e);
                return ServiceResponse::failure(e.to_string(), StatusCode::BAD_REQUEST);
            }
        };

        if !parser.saw_data() {
            return ServiceResponse::failure(NOTHING_TO_PARSE, StatusCode::BAD_REQUEST);
        }
        log::info!("Streamed {} preview(s) for course {}", emitted, course_id);
        ServiceResponse::success("Data parsed successfully.", emitted)
    }

    /// One-shot extraction of every entry as complete drafts.
    pub async fn parse_batch(&self, course_id: i64, raw: &str) -> ServiceResponse<Vec<ScheduleEntryDraft>> {
        match self.batch(course_id, raw).await {
            Ok(drafts) => ServiceResponse::success("Successfully parsed office hours", drafts),
            Err(e) => ServiceResponse::internal_error(PARSE_FAILED, &e),
        }
    }

    async fn batch(&self, course_id: i64, raw: &str) -> Result<Vec<ScheduleEntryDraft>> {
        let text = self.model.invoke(&prompt::batch_prompt(raw)).await?;
        let Value::Array(items) = serde_json::from_str::<Value>(&strip_fences(&text, FenceLang::Json))? else {
            bail!("Model did not return a JSON array");
        };
        Ok(items
            .into_iter()
            .filter_map(|item| batch_entry(item, course_id))
            .collect())
    }

    /// Readable markdown rendering of the pasted text.
    pub async fn preview_markdown(&self, raw: &str) -> ServiceResponse<String> {
        match self.model.invoke(&prompt::markdown_prompt(raw)).await {
            Ok(text) => ServiceResponse::success(
                "Successfully parsed office hours",
                strip_fences(&text, FenceLang::Markdown),
            ),
            Err(e) => ServiceResponse::internal_error(PARSE_FAILED, &e),
        }
    }
}

fn batch_entry(item: Value, course_id: i64) -> Option<ScheduleEntryDraft> {
    if !item.is_object() {
        log::warn!("Skipping non-object batch entry: {}", item);
        return None;
    }
    let mut draft: ScheduleEntryDraft = serde_json::from_value(item).unwrap_or_default();
    draft.course_id = course_id;
    draft.complete = true;
    draft.new = false;
    format_entry(&mut draft);
    Some(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FragmentStream, Prompt};
    use crate::model::INVALID;
    use crate::parser::emit::CollectingEmitter;
    use anyhow::anyhow;
    use futures::{StreamExt, stream};

    struct Scripted {
        fragments: Vec<Result<String, String>>,
        reply: Result<String, String>,
    }

    impl Scripted {
        fn stream_of(fragments: &[&str]) -> Self {
            Self {
                fragments: fragments.iter().map(|f| Ok(f.to_string())).collect(),
                reply: Err("no reply".to_string()),
            }
        }

        fn reply(text: &str) -> Self {
            Self {
                fragments: Vec::new(),
                reply: Ok(text.to_string()),
            }
        }
    }

    impl ChatModel for Scripted {
        async fn stream(&self, _prompt: &Prompt) -> Result<FragmentStream> {
            let items: Vec<Result<String>> = self
                .fragments
                .iter()
                .cloned()
                .map(|r| r.map_err(|e| anyhow!(e)))
                .collect();
            Ok(stream::iter(items).boxed())
        }

        async fn invoke(&self, _prompt: &Prompt) -> Result<String> {
            self.reply.clone().map_err(|e| anyhow!(e))
        }
    }

    #[tokio::test]
    async fn test_stream_with_nothing_to_parse() {
        let service = ParseService::new(Scripted::stream_of(&["", "{}"]));
        let mut out = CollectingEmitter::default();
        let resp = service.parse_stream(1, "hello", &mut out).await;
        assert!(!resp.success);
        assert_eq!(resp.message, NOTHING_TO_PARSE);
        assert_eq!(resp.status_code, StatusCode::BAD_REQUEST);
        assert!(out.documents.is_empty());
    }

    #[tokio::test]
    async fn test_stream_upstream_error_is_bad_request() {
        let mut model = Scripted::stream_of(&[r#"{"host": "Prof Lee", "#]);
        model.fragments.push(Err("connection reset".to_string()));
        let service = ParseService::new(model);
        let mut out = CollectingEmitter::default();
        let resp = service.parse_stream(1, "x", &mut out).await;
        assert_eq!(resp.status_code, StatusCode::BAD_REQUEST);
        assert!(resp.message.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_stream_success_counts_previews() {
        let service = ParseService::new(Scripted::stream_of(&[
            r#"{"host": "prof lee", "day": "monday", "#,
            r#""start_time": "3:00 pm", "end_time": "4:00 pm", "location": "MALA5200", "link": ""}"#,
        ]));
        let mut out = CollectingEmitter::default();
        let resp = service.parse_stream(9, "x", &mut out).await;
        assert!(resp.success);
        assert_eq!(resp.response_object, Some(out.documents.len()));
        let last: ScheduleEntryDraft = serde_json::from_str(out.documents.last().unwrap()).unwrap();
        assert!(last.complete);
        assert_eq!(last.course_id, 9);
        assert_eq!(last.host, "Prof Lee");
        assert_eq!(last.mode, "In-person");
    }

    #[tokio::test]
    async fn test_batch_marks_entries_complete() {
        let reply = "```json\n[{\"host\": \"ada\", \"day\": \"TUESDAY\", \"start_time\": \"1:00 pm\", \"end_time\": \"2:00 pm\", \"location\": \"\", \"link\": \"https://zoom.us/j/1\"}, {\"host\": \"\", \"day\": \"Funday\"}]\n```";
        let service = ParseService::new(Scripted::reply(reply));
        let resp = service.parse_batch(3, "x").await;
        let drafts = resp.into_data().unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].day, "Tuesday");
        assert_eq!(drafts[0].mode, "Remote");
        assert_eq!(drafts[0].course_id, 3);
        assert!(drafts[0].complete);
        assert_eq!(drafts[1].host, INVALID);
        assert_eq!(drafts[1].day, INVALID);
        assert_eq!(drafts[1].mode, INVALID);
    }

    #[tokio::test]
    async fn test_batch_failure_is_generic() {
        let service = ParseService::new(Scripted::reply("not json at all"));
        let resp = service.parse_batch(3, "x").await;
        assert_eq!(resp.status_code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.message, PARSE_FAILED);
    }

    #[tokio::test]
    async fn test_markdown_strips_fences() {
        let service = ParseService::new(Scripted::reply("```markdown\n| Host |\n```"));
        let resp = service.preview_markdown("x").await;
        assert_eq!(resp.into_data().unwrap(), "| Host |");
    }
}
