use anyhow::{Result, anyhow};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use screen_operator::Config;
use screen_operator::prompts::{self, HostOs};

use crate::eyes::Screenshot;

/// Chat-completions client that keeps the whole session's history.
pub struct Brain {
    client: Client,
    url: String,
    config: Config,
    conversation: Vec<Value>,
}

impl Brain {
    pub fn new(config: &Config, objective: &str) -> Self {
        let system = prompts::system_prompt(&config.model, objective, HostOs::current());
        debug!("system prompt is {} chars", system.len());
        Self {
            client: Client::new(),
            url: config.chat_completions_url(),
            config: config.clone(),
            conversation: vec![json!({"role": "system", "content": system})],
        }
    }

    /// Tell the model what went wrong with its last reply.
    pub fn observe(&mut self, note: &str) {
        self.conversation
            .push(json!({"role": "user", "content": note}));
    }

    /// Send the current screen and return the raw reply text.
    pub async fn ask(&mut self, screen: &Screenshot) -> Result<String> {
        let first = self.conversation.len() == 1;
        let text = if first {
            prompts::first_user_prompt()
        } else {
            prompts::user_prompt()
        };

        let mut messages = self.conversation.clone();
        messages.push(json!({
            "role": "user",
            "content": [
                {"type": "text", "text": text},
                {"type": "image_url", "image_url": {"url": screen.data_url()}},
            ],
        }));

        if messages.len() > 40 {
            warn!("conversation history is long ({} messages)", messages.len());
        }

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.config.api_key.as_str())
            .json(&json!({
                "model": self.config.model,
                "messages": messages,
                "max_tokens": 3000,
                "temperature": 0.7,
            }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("Unknown API error");
            error!("API error ({status}): {message}");
            return Err(anyhow!("model API error ({status}): {message}"));
        }

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("No content in model response: {body}"))?
            .to_string();
        debug!("model says: {content}");

        // Screenshots are not kept in history; only the text turn is.
        self.conversation
            .push(json!({"role": "user", "content": text}));
        self.conversation
            .push(json!({"role": "assistant", "content": content}));

        Ok(content)
    }
}
