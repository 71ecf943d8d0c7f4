use anyhow::{Result, anyhow, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(http: reqwest::Client, base_url: &str, token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Resolves a `file_id` to a downloadable file path.
    pub async fn get_file(&self, file_id: &str) -> Result<TelegramFile> {
        self.get("getFile", &[("file_id", file_id)]).await
    }

    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/file/bot{}/{}", self.base_url, self.token, file_path);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|_| anyhow!("Telegram file download failed"))?;

        if !response.status().is_success() {
            bail!(
                "Telegram file download failed with status {}",
                response.status()
            );
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|_| anyhow!("Failed to read Telegram file bytes"))?;
        Ok(bytes.to_vec())
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_to_message_id,
            allow_sending_without_reply: reply_to_message_id.map(|_| true),
        };
        let _: Message = self.post("sendMessage", &request).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, method: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|_| anyhow!("Telegram {method} request failed"))?;
        Self::unwrap_envelope(method, response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, method: &str, body: &B) -> Result<T> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|_| anyhow!("Telegram {method} request failed"))?;
        Self::unwrap_envelope(method, response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let payload: TelegramResponse<T> = response
            .json()
            .await
            .map_err(|_| anyhow!("Failed to decode Telegram {method} response ({status})"))?;

        if !payload.ok {
            let description = payload
                .description
                .unwrap_or_else(|| "Telegram API error".to_string());
            bail!("Telegram {method} failed: {description}");
        }

        payload
            .result
            .ok_or_else(|| anyhow!("Telegram {method} response has no result"))
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_sending_without_reply: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub voice: Option<Voice>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Voice {
    pub file_id: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramFile {
    #[serde(default)]
    pub file_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOICE_UPDATE: &str = r#"{"update_id":147759372,
        "message":{"message_id":50,
            "from":{"id":5337682436,"is_bot":false,"first_name":"Duck"},
            "chat":{"id":5337682436,"first_name":"Duck","type":"private"},
            "date":1701813510,
            "voice":{"duration":24,"mime_type":"audio/ogg","file_id":"AwACAgQ","file_unique_id":"AgAD","file_size":94966}}}"#;

    #[test]
    fn test_voice_update_parses_and_ignores_unknown_fields() {
        let update: Update = serde_json::from_str(VOICE_UPDATE).unwrap();
        let message = update.message.unwrap();

        assert_eq!(update.update_id, Some(147_759_372));
        assert_eq!(message.message_id, 50);
        assert_eq!(message.chat.id, 5_337_682_436);
        assert!(message.text.is_none());
        let voice = message.voice.unwrap();
        assert_eq!(voice.file_id, "AwACAgQ");
        assert_eq!(voice.mime_type.as_deref(), Some("audio/ogg"));
    }

    #[test]
    fn test_update_without_message() {
        let update: Update = serde_json::from_str(r#"{"update_id":1,"edited_message":{}}"#).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn test_send_message_request_skips_missing_reply() {
        let request = SendMessageRequest {
            chat_id: 7,
            text: "hi",
            reply_to_message_id: None,
            allow_sending_without_reply: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"chat_id": 7, "text": "hi"})
        );
    }

    #[test]
    fn test_error_envelope_without_result() {
        let payload: TelegramResponse<TelegramFile> =
            serde_json::from_str(r#"{"ok":false,"error_code":400,"description":"Bad Request: invalid file_id"}"#)
                .unwrap();
        assert!(!payload.ok);
        assert!(payload.result.is_none());
        assert_eq!(
            payload.description.as_deref(),
            Some("Bad Request: invalid file_id")
        );
    }
}
