//! Chat-completions convenience.
//!
//! Thin wrapper that sends a chat-style body through [`GatewayClient`] and
//! re-packages the gateway's `ok` variant into a chat-completions-style
//! object with a single choice.

use serde_json::{json, Value};

use zkgw_protocol::TokenClass;

use crate::client::GatewayClient;
use crate::error::Result;

impl GatewayClient {
    /// Send a chat-completions-style body and return a
    /// chat-completions-style reply.
    ///
    /// The decrypted `{request_id, model, output, billed_token_class}`
    /// response is re-shaped into one choice with `finish_reason: "stop"`
    /// and an assistant message.
    pub async fn chat_completions(&self, class: TokenClass, body: Value) -> Result<Value> {
        let response = self.infer(class, body).await?;
        Ok(into_chat_completion(response))
    }
}

fn into_chat_completion(response: Value) -> Value {
    let id = response
        .get("request_id")
        .cloned()
        .unwrap_or(Value::Null);
    let model = response.get("model").cloned().unwrap_or(Value::Null);
    let content = response.get("output").cloned().unwrap_or(Value::Null);
    let billed = response
        .get("billed_token_class")
        .cloned()
        .unwrap_or(Value::Null);

    json!({
        "id": id,
        "object": "chat.completion",
        "model": model,
        "billed_token_class": billed,
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content,
            },
            "finish_reason": "stop",
        }],
    })
}
