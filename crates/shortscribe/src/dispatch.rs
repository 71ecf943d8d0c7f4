//! Routes one Telegram update to the shortener or the transcriber and relays
//! the result back to the chat.

use anyhow::{Context, Result};
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::config::{Config, Credentials};
use crate::shortener::{BitlyClient, Shortened, is_valid_url};
use crate::telegram::{Message, TelegramClient, Update};
use crate::transcribe::{StagedAudio, WhisperClient};

/// Why an update produced no reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    MalformedBody,
    NoMessage,
    UnsupportedMessage,
    NotAUrl,
    RateLimited,
    ShortenerFailed,
    EmptyTranscript,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A reply was produced and handed to Telegram.
    Replied(String),
    Ignored(Ignored),
    /// The voice pipeline failed; carries the client-facing message.
    Failed(String),
}

impl Outcome {
    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Outcome::Replied(_) | Outcome::Ignored(_) => StatusCode::OK,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Outcome::Failed(message) => json!({ "message": message }),
            Outcome::Replied(_) | Outcome::Ignored(_) => json!({ "ok": true }),
        }
    }
}

/// Where a reply goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTarget {
    pub chat_id: i64,
    pub message_id: i64,
}

/// What to do with an update, decided from its shape alone.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Transcribe {
        target: ReplyTarget,
        file_id: String,
        mime_type: Option<String>,
    },
    Shorten {
        target: ReplyTarget,
        url: String,
    },
    Ignore(Ignored),
}

pub fn classify(update: Update) -> Action {
    let Some(message) = update.message else {
        return Action::Ignore(Ignored::NoMessage);
    };
    let Message {
        message_id,
        chat,
        text,
        voice,
    } = message;
    let target = ReplyTarget {
        chat_id: chat.id,
        message_id,
    };

    if let Some(voice) = voice {
        return Action::Transcribe {
            target,
            file_id: voice.file_id,
            mime_type: voice.mime_type,
        };
    }

    match text {
        Some(text) if is_valid_url(&text) => Action::Shorten {
            target,
            url: text.trim().to_string(),
        },
        Some(_) => Action::Ignore(Ignored::NotAUrl),
        None => Action::Ignore(Ignored::UnsupportedMessage),
    }
}

pub struct Dispatcher {
    telegram: TelegramClient,
    bitly: BitlyClient,
    whisper: WhisperClient,
}

impl Dispatcher {
    pub fn new(config: &Config, credentials: Credentials) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            telegram: TelegramClient::new(
                http.clone(),
                &config.telegram.base_url,
                credentials.telegram_token,
            ),
            bitly: BitlyClient::new(
                http.clone(),
                &config.bitly.base_url,
                credentials.bitly_token,
                config.bitly.domain.clone(),
            ),
            whisper: WhisperClient::new(
                http,
                &config.transcription.base_url,
                credentials.openai_key,
                config.transcription.model.clone(),
                config.transcription.language.clone(),
            ),
        })
    }

    /// Handles one raw webhook body.
    pub async fn handle(&self, body: &[u8]) -> Outcome {
        let update: Update = match serde_json::from_slice(body) {
            Ok(update) => update,
            Err(err) => {
                warn!(%err, "Ignoring malformed update body");
                return Outcome::Ignored(Ignored::MalformedBody);
            }
        };
        debug!(update_id = ?update.update_id, "Received update");

        let (target, reply) = match classify(update) {
            Action::Transcribe {
                target,
                file_id,
                mime_type,
            } => match self.transcribe_voice(&file_id, mime_type).await {
                Ok(Some(transcript)) => (target, transcript),
                Ok(None) => return Outcome::Ignored(Ignored::EmptyTranscript),
                Err(failure) => return failure,
            },
            Action::Shorten { target, url } => match self.shorten(&url).await {
                Ok(link) => (target, link),
                Err(reason) => return Outcome::Ignored(reason),
            },
            Action::Ignore(reason) => {
                info!(?reason, "Ignoring update");
                return Outcome::Ignored(reason);
            }
        };

        self.reply(target, &reply).await;
        Outcome::Replied(reply)
    }

    async fn transcribe_voice(
        &self,
        file_id: &str,
        mime_type: Option<String>,
    ) -> Result<Option<String>, Outcome> {
        info!(file_id, "Transcribing voice note");

        let audio = match self.fetch_voice(file_id, mime_type).await {
            Ok(audio) => audio,
            Err(err) => {
                error!("Failed to fetch voice note: {err:#}");
                return Err(Outcome::Failed("Failed to download voice note".to_string()));
            }
        };

        let transcript = match self.whisper.transcribe(&audio).await {
            Ok(transcript) => transcript,
            Err(err) => {
                error!("Failed to transcribe voice note: {err:#}");
                return Err(Outcome::Failed("Failed to transcribe voice note".to_string()));
            }
        };
        drop(audio);

        if transcript.is_empty() {
            warn!(file_id, "Transcription came back empty");
            return Ok(None);
        }
        Ok(Some(transcript))
    }

    async fn fetch_voice(&self, file_id: &str, mime_type: Option<String>) -> Result<StagedAudio> {
        let file = self.telegram.get_file(file_id).await?;
        let file_path = file
            .file_path
            .filter(|path| !path.trim().is_empty())
            .context("Telegram returned no file path")?;
        let bytes = self.telegram.download_file(&file_path).await?;
        debug!(%file_path, size = bytes.len(), "Downloaded voice note");
        StagedAudio::stage(bytes, &file_path, mime_type).await
    }

    /// Shortener failures never surface to the caller; the link is dropped.
    async fn shorten(&self, url: &str) -> Result<String, Ignored> {
        match self.bitly.shorten(url).await {
            Ok(Shortened::Link(link)) => {
                info!(%link, "Shortened URL");
                Ok(link)
            }
            Ok(Shortened::RateLimited) => {
                warn!("Bitly rate limit exceeded, dropping request");
                Err(Ignored::RateLimited)
            }
            Err(err) => {
                warn!("Bitly shorten failed, dropping request: {err:#}");
                Err(Ignored::ShortenerFailed)
            }
        }
    }

    async fn reply(&self, target: ReplyTarget, text: &str) {
        match self
            .telegram
            .send_message(target.chat_id, text, Some(target.message_id))
            .await
        {
            Ok(()) => info!(chat_id = target.chat_id, "Reply sent"),
            Err(err) => error!(chat_id = target.chat_id, "Failed to send reply: {err:#}"),
        }
    }
}
