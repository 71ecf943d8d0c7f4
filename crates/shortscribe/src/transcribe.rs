use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tempfile::NamedTempFile;

const FALLBACK_FILE_NAME: &str = "voice.oga";

/// A downloaded voice note staged on disk for the length of one request.
///
/// The backing file is removed when this value is dropped.
#[derive(Debug)]
pub struct StagedAudio {
    file: NamedTempFile,
    file_name: String,
    mime_type: Option<String>,
}

impl StagedAudio {
    /// Writes `bytes` to a fresh temp file.
    ///
    /// `remote_path` is Telegram's `file_path`; its last segment is kept as
    /// the upload name so the extension survives.
    pub async fn stage(
        bytes: Vec<u8>,
        remote_path: &str,
        mime_type: Option<String>,
    ) -> Result<Self> {
        let file_name = file_name_from_path(remote_path);
        let suffix = Path::new(&file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        let file = tokio::task::spawn_blocking(move || -> Result<NamedTempFile> {
            let mut file = tempfile::Builder::new()
                .prefix("shortscribe-")
                .suffix(&suffix)
                .tempfile()
                .context("Failed to create temp file for audio")?;
            file.write_all(&bytes)
                .context("Failed to write audio to temp file")?;
            file.flush().context("Failed to flush audio temp file")?;
            Ok(file)
        })
        .await
        .map_err(|_| anyhow!("Audio staging task panicked"))??;

        Ok(Self {
            file,
            file_name,
            mime_type,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(self.path())
            .await
            .context("Failed to read staged audio")
    }
}

fn file_name_from_path(remote_path: &str) -> String {
    remote_path
        .rsplit('/')
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_FILE_NAME)
        .to_string()
}

#[derive(Clone)]
pub struct WhisperClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    language: Option<String>,
}

impl WhisperClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: String,
        model: String,
        language: Option<String>,
    ) -> Self {
        let language = language
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            language,
        }
    }

    /// Uploads the staged audio and returns the plain-text transcript, trimmed.
    pub async fn transcribe(&self, audio: &StagedAudio) -> Result<String> {
        let bytes = audio.read().await?;
        let mut part = reqwest::multipart::Part::bytes(bytes).file_name(audio.file_name.clone());
        if let Some(mime) = audio.mime_type.as_deref()
            && !mime.trim().is_empty()
        {
            part = part.mime_str(mime)?;
        }

        let mut form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "text")
            .part("file", part);

        if let Some(lang) = self.language.as_deref() {
            form = form.text("language", lang.to_string());
        }

        let url = format!("{}/audio/transcriptions", self.base_url);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|_| anyhow!("OpenAI transcription request failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI transcription failed: {} {}", status, body));
        }

        let transcript = response
            .text()
            .await
            .map_err(|_| anyhow!("Failed to read transcription response"))?;
        Ok(transcript.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_path() {
        assert_eq!(file_name_from_path("voice/file_12.oga"), "file_12.oga");
        assert_eq!(file_name_from_path("file_3.ogg"), "file_3.ogg");
        assert_eq!(file_name_from_path("voice/"), "voice.oga");
        assert_eq!(file_name_from_path(""), "voice.oga");
    }

    #[tokio::test]
    async fn test_staged_audio_is_removed_on_drop() {
        let audio = StagedAudio::stage(b"OggS fake".to_vec(), "voice/file_7.oga", None)
            .await
            .unwrap();
        let path = audio.path().to_path_buf();

        assert!(path.exists());
        assert_eq!(audio.file_name(), "file_7.oga");
        assert!(path.to_string_lossy().ends_with(".oga"));
        assert_eq!(audio.read().await.unwrap(), b"OggS fake");

        drop(audio);
        assert!(!path.exists());
    }

    #[test]
    fn test_blank_language_is_dropped() {
        let client = WhisperClient::new(
            reqwest::Client::new(),
            "http://localhost/v1/",
            "key".to_string(),
            "whisper-1".to_string(),
            Some("  ".to_string()),
        );
        assert!(client.language.is_none());
        assert_eq!(client.base_url, "http://localhost/v1");
    }
}
