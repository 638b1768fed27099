// File: src/parser/stream.rs
//! Incremental reconstruction of schedule entries from a token stream.
use crate::model::ScheduleEntryDraft;
use crate::parser::closer::{Closer, SuffixCloser};
use crate::parser::emit::Emitter;
use crate::parser::finalize::finalize;
use crate::parser::sanitize::clean_fragment;
use anyhow::Result;
use futures::{Stream, StreamExt};
use serde_json::Value;

/// Text accumulated for the record currently being streamed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRecordBuffer {
    pub text: String,
    /// Set once a preview of this record has been emitted.
    pub is_continuation: bool,
}

impl PartialRecordBuffer {
    fn reset(&mut self) {
        self.text.clear();
        self.is_continuation = false;
    }
}

/// Byte offset just past the first top-level object when the buffer starts
/// with one, ignoring braces inside strings.
fn closed_object_end(text: &str) -> Option<usize> {
    let start = text.find(|c: char| !c.is_whitespace())?;
    if !text[start..].starts_with('{') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Per-request parser state. Feed it fragments in arrival order.
#[derive(Debug)]
pub struct StreamParser<C = SuffixCloser> {
    course_id: i64,
    closer: C,
    buffer: PartialRecordBuffer,
    saw_data: bool,
}

impl StreamParser<SuffixCloser> {
    pub fn new(course_id: i64) -> Self {
        Self::with_closer(course_id, SuffixCloser)
    }
}

impl<C: Closer> StreamParser<C> {
    pub fn with_closer(course_id: i64, closer: C) -> Self {
        Self {
            course_id,
            closer,
            buffer: PartialRecordBuffer::default(),
            saw_data: false,
        }
    }

    pub fn buffer(&self) -> &PartialRecordBuffer {
        &self.buffer
    }

    /// Whether any fragment other than an empty object has been seen.
    pub fn saw_data(&self) -> bool {
        self.saw_data
    }

    /// Appends one fragment and returns the drafts it made visible, in order.
    pub fn push(&mut self, fragment: &str) -> Vec<ScheduleEntryDraft> {
        if !fragment.is_empty() && fragment != "{}" {
            self.saw_data = true;
        }
        self.buffer.text.push_str(&clean_fragment(fragment));

        let mut drafts = Vec::new();

        // A fragment may finish one record and start the next.
        while let Some(end) = closed_object_end(&self.buffer.text) {
            if self.buffer.text[end..].trim().is_empty() {
                break;
            }
            let rest = self.buffer.text.split_off(end);
            let head = std::mem::replace(&mut self.buffer.text, rest);
            match serde_json::from_str::<Value>(&head) {
                Ok(value) => drafts.extend(self.accept(value)),
                Err(e) => log::debug!("Dropping malformed record: {}", e),
            }
            self.buffer.is_continuation = false;
        }

        let is_new = !self.buffer.is_continuation;
        let candidate = self.closer.close(&self.buffer.text, is_new);
        let document = candidate.as_deref().unwrap_or(&self.buffer.text);
        if let Ok(value) = serde_json::from_str::<Value>(document) {
            match self.accept(value) {
                Some(draft) => {
                    if draft.complete {
                        self.buffer.reset();
                    }
                    drafts.push(draft);
                }
                None => self.buffer.reset(),
            }
        }
        drafts
    }

    /// Finalizes a parsed value. Leaves the buffer text to the caller, which
    /// may already hold the start of the next record.
    fn accept(&mut self, value: Value) -> Option<ScheduleEntryDraft> {
        let object = match value {
            Value::Object(map) if map.is_empty() => return None,
            Value::Object(map) => map,
            other => {
                log::debug!("Discarding non-object model output: {}", other);
                return None;
            }
        };

        let draft = finalize(object, self.course_id);
        if !draft.complete {
            self.buffer.is_continuation = true;
        }
        Some(draft)
    }

    /// Drives the parser over `fragments`, emitting every draft as soon as it
    /// is produced. Emitter failures are logged and the loop keeps going;
    /// an upstream error ends the loop and is returned.
    pub async fn consume<S, E>(&mut self, mut fragments: S, emitter: &mut E) -> Result<usize>
    where
        S: Stream<Item = Result<String>> + Unpin,
        E: Emitter,
    {
        let mut emitted = 0;
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            for draft in self.push(&fragment) {
                let document = serde_json::to_string(&draft)?;
                if let Err(e) = emitter.emit(&document).await {
                    log::warn!("Failed to write preview to client: {}", e);
                }
                emitted += 1;
            }
        }
        if !self.buffer.text.trim().is_empty() {
            log::debug!(
                "Stream ended with {} unfinished bytes",
                self.buffer.text.len()
            );
        }
        Ok(emitted)
    }
}
