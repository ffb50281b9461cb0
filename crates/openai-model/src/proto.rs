use prompt_refiner_model::{ModelMessage, ModelRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::OpenAIConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatCompletionChunk {
    // Azure sends a leading chunk with an empty id that only carries
    // prompt filter results.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    // Set when the server reports a failure after the stream has started.
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ErrorDetail {
    pub code: Option<Value>,
    pub message: Option<String>,
}

impl ErrorDetail {
    /// Returns the error code as text, whether it was sent as a string or
    /// as a number.
    pub fn code(&self) -> Option<String> {
        match self.code.as_ref()? {
            Value::String(code) => Some(code.clone()),
            Value::Number(code) => Some(code.to_string()),
            _ => None,
        }
    }
}

#[inline]
pub fn parse_error_body(body: &str) -> Option<ErrorDetail> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|body| body.error)
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        temperature: req.temperature,
        stream: true,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(content) => Message::Assistant {
            content: content.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::OpenAIConfigBuilder;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::System("You are a prompt critic.".to_owned()),
                ModelMessage::User("Review this prompt.".to_owned()),
                ModelMessage::Assistant("### Critique:".to_owned()),
            ],
            temperature: Some(0.5),
        };
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_model("custom")
            .build();
        let expected = ChatCompletionRequest {
            model: "custom".to_owned(),
            messages: vec![
                Message::System {
                    content: "You are a prompt critic.".to_owned(),
                },
                Message::User {
                    content: "Review this prompt.".to_owned(),
                },
                Message::Assistant {
                    content: "### Critique:".to_owned(),
                },
            ],
            temperature: Some(0.5),
            stream: true,
        };
        let actual = create_request(&request, &config);
        assert_eq!(actual, expected);

        assert_eq!(
            serde_json::to_value(&actual).unwrap(),
            json!({
                "model": "custom",
                "messages": [
                    { "role": "system", "content": "You are a prompt critic." },
                    { "role": "user", "content": "Review this prompt." },
                    { "role": "assistant", "content": "### Critique:" }
                ],
                "temperature": 0.5,
                "stream": true
            })
        );
    }

    #[test]
    fn test_create_azure_request() {
        // Older Azure API versions reject unknown arguments such as
        // `stream_options`, so the body carries only the basic fields.
        let request = ModelRequest {
            messages: vec![ModelMessage::User("Hi".to_owned())],
            temperature: None,
        };
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_base_url("https://res.openai.azure.com")
            .with_model("gpt-4o-prod")
            .with_api_version("2024-02-01")
            .build();

        let body =
            serde_json::to_value(create_request(&request, &config)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o-prod",
                "messages": [{ "role": "user", "content": "Hi" }],
                "stream": true
            })
        );
        assert!(body.get("stream_options").is_none());
    }

    #[test]
    fn test_parse_error_body() {
        let detail = parse_error_body(
            r#"{"error":{"code":"429","message":"Requests have exceeded call rate limit."}}"#,
        )
        .unwrap();
        assert_eq!(detail.code().as_deref(), Some("429"));

        let detail =
            parse_error_body(r#"{"error":{"code":429,"message":null}}"#)
                .unwrap();
        assert_eq!(detail.code().as_deref(), Some("429"));

        assert!(parse_error_body("Bad Gateway").is_none());
    }
}
