// File: ./src/mail.rs
//! Outgoing email: notification text and the senders that deliver it.
use crate::client::{self, HttpsClient};
use crate::config::Config;
use crate::model::OfficeHour;
use anyhow::{Result, bail};
use serde_json::json;
use std::future::Future;

pub const UPDATE_SUBJECT: &str = "Updated Office Hours Notification";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
}

pub trait MailSender: Send + Sync {
    fn send(&self, messages: &[MailMessage]) -> impl Future<Output = Result<()>> + Send;
}

fn or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

pub fn update_notice_text(office_hour: &OfficeHour) -> String {
    format!(
        "Hello,

We wanted to let you know that the office hours for the course have been updated.

Updated Office Hours:
- Host: {}
- Day: {}
- Time: {} - {}
- Mode: {}
- Location: {}
- Link: {}

Thank you!",
        office_hour.host,
        office_hour.day,
        office_hour.start_time,
        office_hour.end_time,
        office_hour.mode,
        or_na(&office_hour.location),
        or_na(&office_hour.link),
    )
}

/// One message per recipient announcing the new state of `office_hour`.
pub fn update_messages<'a, I>(recipients: I, from: &str, office_hour: &OfficeHour) -> Vec<MailMessage>
where
    I: IntoIterator<Item = &'a str>,
{
    let text = update_notice_text(office_hour);
    recipients
        .into_iter()
        .filter(|to| !to.trim().is_empty())
        .map(|to| MailMessage {
            to: to.to_string(),
            from: from.to_string(),
            subject: UPDATE_SUBJECT.to_string(),
            text: text.clone(),
        })
        .collect()
}

/// SendGrid v3 `mail/send`, one request per message.
#[derive(Clone, Debug)]
pub struct SendGridMailer {
    client: HttpsClient,
    endpoint: String,
}

impl SendGridMailer {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: client::build_client(api_key)?,
            endpoint: endpoint.to_string(),
        })
    }

    fn payload(message: &MailMessage) -> String {
        json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": message.from },
            "subject": message.subject,
            "content": [{ "type": "text/plain", "value": message.text }],
        })
        .to_string()
    }
}

impl MailSender for SendGridMailer {
    async fn send(&self, messages: &[MailMessage]) -> Result<()> {
        let mut failures = Vec::new();
        for message in messages {
            let outcome = async {
                let response =
                    client::post_json(&self.client, &self.endpoint, Self::payload(message)).await?;
                client::ensure_success(response).await?;
                Ok::<_, anyhow::Error>(())
            }
            .await;
            match outcome {
                Ok(()) => log::debug!("Mail sent to {}", message.to),
                Err(e) => {
                    log::warn!("Mail to {} failed: {:#}", message.to, e);
                    failures.push(message.to.clone());
                }
            }
        }
        if !failures.is_empty() {
            bail!("Failed to deliver mail to: {}", failures.join(", "));
        }
        log::info!("Sent {} notification(s)", messages.len());
        Ok(())
    }
}

/// Writes messages to the log instead of delivering them.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

impl MailSender for LogMailer {
    async fn send(&self, messages: &[MailMessage]) -> Result<()> {
        for message in messages {
            log::info!(
                "Mail (not sent) to {}: {}\n{}",
                message.to,
                message.subject,
                message.text
            );
        }
        Ok(())
    }
}

/// Either a real provider or the log fallback, picked from configuration.
#[derive(Clone, Debug)]
pub enum ConfiguredMailer {
    SendGrid(SendGridMailer),
    Log(LogMailer),
}

impl ConfiguredMailer {
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.mail_api_key.is_empty() {
            log::info!("No mail API key configured; notifications will only be logged");
            return Ok(Self::Log(LogMailer));
        }
        Ok(Self::SendGrid(SendGridMailer::new(
            &config.mail_provider_url,
            &config.mail_api_key,
        )?))
    }
}

impl MailSender for ConfiguredMailer {
    async fn send(&self, messages: &[MailMessage]) -> Result<()> {
        match self {
            Self::SendGrid(m) => m.send(messages).await,
            Self::Log(m) => m.send(messages).await,
        }
    }
}
