use anyhow::{anyhow, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Token usage statistics from the API response
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Text of the first choice, if the model returned any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Message,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }
}

/// Trait for LLM clients to allow mocking and abstraction
pub trait LlmClient {
    fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

impl<L: LlmClient + ?Sized> LlmClient for &L {
    fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        (**self).chat(request)
    }
}

/// OpenAI-compatible chat completions client. One attempt per call.
pub struct Client {
    base_url: String,
    api_key: SecretString,
    http: reqwest::blocking::Client,
}

impl Client {
    pub fn new(base_url: &str, api_key: SecretString) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl LlmClient for Client {
    fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let resp = self
            .http
            .post(self.completions_url())
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .map_err(|e| anyhow!("Connection error: {}", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(anyhow!("API error {}: {}", status.as_u16(), body));
        }

        let body: ChatResponse = resp.json()?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::closed_port_url;
    use mockito::Matcher;
    use serde_json::json;

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![Message::system("be brief"), Message::user("hello")],
            max_tokens: Some(80),
            temperature: Some(0.8),
        }
    }

    #[test]
    fn test_request_serialization() {
        let value = serde_json::to_value(request()).unwrap();
        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hello");
        assert_eq!(value["max_tokens"], 80);

        let bare = ChatRequest {
            max_tokens: None,
            temperature: None,
            ..request()
        };
        let value = serde_json::to_value(bare).unwrap();
        assert!(value.get("max_tokens").is_none());
        assert!(value.get("temperature").is_none());
    }

    #[test]
    fn test_first_content() {
        let resp: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Oi!"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(resp.first_content(), Some("Oi!"));

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(empty.first_content(), None);
    }

    #[test]
    fn test_chat_sends_bearer_and_parses_reply() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":" Invista já! "},"finish_reason":"stop"}],"usage":{"prompt_tokens":12,"completion_tokens":5}}"#;
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 80
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(1)
            .create();

        let client = Client::new(
            &format!("{}/v1/", server.url()),
            SecretString::from("sk-test".to_string()),
        );
        let resp = client.chat(&request()).unwrap();

        mock.assert();
        assert_eq!(resp.first_content(), Some(" Invista já! "));
        assert_eq!(resp.usage.unwrap().completion_tokens, 5);
    }

    #[test]
    fn test_chat_surfaces_api_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"bad key"}}"#)
            .create();

        let client = Client::new(&server.url(), SecretString::from("sk-bad".to_string()));
        let err = client.chat(&request()).unwrap_err();
        assert!(err.to_string().starts_with("API error 401"));
        assert!(err.to_string().contains("bad key"));
    }

    #[test]
    fn test_chat_connection_refused() {
        let client = Client::new(&closed_port_url(), SecretString::from("sk-test".to_string()));
        let err = client.chat(&request()).unwrap_err();
        assert!(err.to_string().starts_with("Connection error"));
    }
}
