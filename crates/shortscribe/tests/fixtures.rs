//! Shared helpers for the webhook integration tests.

#![allow(dead_code)]

use serde_json::{Value, json};
use shortscribe::config::{Config, Credentials};
use shortscribe::dispatch::Dispatcher;
use wiremock::MockServer;

pub const TELEGRAM_TOKEN: &str = "test-telegram";
pub const BITLY_TOKEN: &str = "test-bitly";
pub const OPENAI_KEY: &str = "test-openai";

pub const CHAT_ID: i64 = 5_337_682_436;
pub const FILE_ID: &str = "AwACAgQAAxkBAAMyZW";
pub const FILE_PATH: &str = "voice/file_1.oga";
pub const AUDIO_BYTES: &[u8] = b"OggS-fake-voice-note";

pub fn bot_path(method: &str) -> String {
    format!("/bot{TELEGRAM_TOKEN}/{method}")
}

pub fn file_download_path() -> String {
    format!("/file/bot{TELEGRAM_TOKEN}/{FILE_PATH}")
}

/// Points every upstream client at the mock server.
pub fn dispatcher(server: &MockServer) -> Dispatcher {
    let mut config = Config::default();
    config.telegram.base_url = server.uri();
    config.bitly.base_url = server.uri();
    config.transcription.base_url = format!("{}/v1", server.uri());

    let credentials = Credentials {
        telegram_token: TELEGRAM_TOKEN.to_string(),
        bitly_token: BITLY_TOKEN.to_string(),
        openai_key: OPENAI_KEY.to_string(),
    };
    Dispatcher::new(&config, credentials).expect("dispatcher")
}

pub fn text_update(message_id: i64, text: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "update_id": 147_759_353,
        "message": {
            "message_id": message_id,
            "from": {"id": CHAT_ID, "is_bot": false, "first_name": "Duck"},
            "chat": {"id": CHAT_ID, "first_name": "Duck", "type": "private"},
            "date": 1_701_473_670,
            "text": text,
            "entities": [{"offset": 0, "length": text.len(), "type": "url"}]
        }
    }))
    .expect("serialize update")
}

pub fn voice_update(message_id: i64) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "update_id": 147_759_372,
        "message": {
            "message_id": message_id,
            "from": {"id": CHAT_ID, "is_bot": false, "first_name": "Duck"},
            "chat": {"id": CHAT_ID, "first_name": "Duck", "type": "private"},
            "date": 1_701_813_510,
            "voice": {
                "duration": 24,
                "mime_type": "audio/ogg",
                "file_id": FILE_ID,
                "file_unique_id": "AgADcBEAApf2gVM",
                "file_size": 94_966
            }
        }
    }))
    .expect("serialize update")
}

pub fn get_file_ok() -> Value {
    json!({
        "ok": true,
        "result": {
            "file_id": FILE_ID,
            "file_unique_id": "AgADcBEAApf2gVM",
            "file_size": 94_966,
            "file_path": FILE_PATH
        }
    })
}

pub fn send_message_ok(message_id: i64) -> Value {
    json!({
        "ok": true,
        "result": {
            "message_id": message_id + 1,
            "chat": {"id": CHAT_ID, "type": "private"},
            "date": 1_701_813_520,
            "text": "reply"
        }
    })
}

pub fn expected_reply(message_id: i64, text: &str) -> Value {
    json!({
        "chat_id": CHAT_ID,
        "text": text,
        "reply_to_message_id": message_id,
        "allow_sending_without_reply": true
    })
}
