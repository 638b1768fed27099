// File: ./src/llm/openai.rs
// Chat-completions client for OpenAI compatible endpoints.
use super::{ChatModel, FragmentStream, Prompt};
use crate::client::{self, HttpsClient};
use crate::config::{Config, OPENAI_KEY_ENV};
use anyhow::{Context, Result, anyhow, bail};
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt, stream};
use http_body_util::BodyExt;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Clone, Debug)]
pub struct OpenAiClient {
    client: HttpsClient,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
}

impl OpenAiClient {
    pub fn new(api_base: &str, api_key: &str, model: &str, temperature: Option<f32>) -> Result<Self> {
        Ok(Self {
            client: client::build_client(api_key)?,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            model: model.to_string(),
            temperature,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        if config.llm_api_key.is_empty() {
            bail!(
                "No model API key configured. Set llm_api_key in config.toml or {}.",
                OPENAI_KEY_ENV
            );
        }
        Self::new(
            &config.llm_api_base,
            &config.llm_api_key,
            &config.llm_model,
            config.llm_temperature,
        )
    }

    fn request_body(&self, prompt: &Prompt, stream: bool) -> Result<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &prompt.system,
                },
                Message {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            stream,
            temperature: self.temperature,
        };
        Ok(serde_json::to_string(&body)?)
    }
}

fn api_error(value: &Value) -> Option<anyhow::Error> {
    let error = value.get("error")?;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    Some(anyhow!("Model API error: {}", message))
}

/// Pulls `choices[0].delta.content` out of one streamed chunk.
fn delta_content(payload: &str) -> Result<Option<String>> {
    let value: Value =
        serde_json::from_str(payload).with_context(|| format!("Malformed stream chunk: {payload}"))?;
    if let Some(err) = api_error(&value) {
        return Err(err);
    }
    Ok(value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string))
}

fn message_content(body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body).context("Malformed completion response")?;
    if let Some(err) = api_error(&value) {
        return Err(err);
    }
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Completion response has no message content"))
}

/// Turns a chat-completions SSE body into content fragments. Ends on
/// `[DONE]`, on body end, or after yielding the first error.
fn completion_fragments<S, B, E>(body: S) -> FragmentStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: fmt::Display + Send + 'static,
{
    let events = body.eventsource().boxed();
    stream::unfold((events, false), |(mut events, done)| async move {
        if done {
            return None;
        }
        loop {
            match events.next().await? {
                Ok(event) if event.data.trim() == "[DONE]" => return None,
                Ok(event) => match delta_content(&event.data) {
                    Ok(Some(text)) => return Some((Ok(text), (events, false))),
                    Ok(None) => continue,
                    Err(e) => return Some((Err(e), (events, true))),
                },
                Err(e) => {
                    return Some((Err(anyhow!("Model stream interrupted: {}", e)), (events, true)));
                }
            }
        }
    })
    .boxed()
}

impl ChatModel for OpenAiClient {
    async fn stream(&self, prompt: &Prompt) -> Result<FragmentStream> {
        let body = self.request_body(prompt, true)?;
        log::debug!("Streaming completion from {} ({})", self.endpoint, self.model);
        let response = client::post_json(&self.client, &self.endpoint, body).await?;
        let response = client::ensure_success(response).await?;

        Ok(completion_fragments(response.into_body().into_data_stream()))
    }

    async fn invoke(&self, prompt: &Prompt) -> Result<String> {
        let body = self.request_body(prompt, false)?;
        log::debug!("Requesting completion from {} ({})", self.endpoint, self.model);
        let response = client::post_json(&self.client, &self.endpoint, body).await?;
        let response = client::ensure_success(response).await?;
        let text = client::read_text(response).await?;
        message_content(&text)
    }
}
