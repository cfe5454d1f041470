use serde_json::{Map, Value};
use thiserror::Error;

/// Error reported by the agent endpoint inside a successful response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SignaledError(pub String);

/// A response body from the agent endpoint, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResponse {
    Error(String),
    PlainText(String),
    NamedField(String),
    MessageHistory(Vec<Value>),
    Unknown(Value),
}

impl AgentResponse {
    /// Classifies a raw body. The first matching shape wins: an `error` key,
    /// a bare string, a string `response` key, a non-empty `messages` list
    /// whose entries all carry `content`, and finally anything else.
    pub fn classify(raw: Value) -> Self {
        match raw {
            Value::Object(map) if map.contains_key("error") => {
                AgentResponse::Error(text_of(&map["error"]))
            }
            Value::String(text) => AgentResponse::PlainText(text),
            Value::Object(map) => classify_object(map),
            other => AgentResponse::Unknown(other),
        }
    }

    pub fn into_display_text(self) -> Result<String, SignaledError> {
        match self {
            AgentResponse::Error(message) => Err(SignaledError(message)),
            AgentResponse::PlainText(text) | AgentResponse::NamedField(text) => Ok(text),
            AgentResponse::MessageHistory(messages) => Ok(messages
                .last()
                .and_then(|message| message.get("content"))
                .map(text_of)
                .unwrap_or_default()),
            AgentResponse::Unknown(value) => Ok(value.to_string()),
        }
    }
}

fn classify_object(map: Map<String, Value>) -> AgentResponse {
    if let Some(Value::String(text)) = map.get("response") {
        return AgentResponse::NamedField(text.clone());
    }

    if let Some(Value::Array(messages)) = map.get("messages") {
        let well_formed = !messages.is_empty()
            && messages
                .iter()
                .all(|message| message.as_object().is_some_and(|m| m.contains_key("content")));
        if well_formed {
            return AgentResponse::MessageHistory(messages.clone());
        }
    }

    AgentResponse::Unknown(Value::Object(map))
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn extract_display_text(raw: Value) -> Result<String, SignaledError> {
    AgentResponse::classify(raw).into_display_text()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_key_signals_failure() {
        let result = extract_display_text(json!({"error": "X"}));
        assert_eq!(result, Err(SignaledError("X".to_string())));
    }

    #[test]
    fn error_key_wins_over_response() {
        let result = extract_display_text(json!({"error": "quota", "response": "ignored"}));
        assert_eq!(result, Err(SignaledError("quota".to_string())));
    }

    #[test]
    fn non_string_error_is_rendered_as_json() {
        let result = extract_display_text(json!({"error": {"code": 7}}));
        assert_eq!(result, Err(SignaledError(r#"{"code":7}"#.to_string())));
    }

    #[test]
    fn bare_string_is_returned_unchanged() {
        assert_eq!(extract_display_text(json!("hello")).unwrap(), "hello");
    }

    #[test]
    fn response_field_is_extracted() {
        let text = extract_display_text(json!({"response": "hi there"})).unwrap();
        assert_eq!(text, "hi there");
    }

    #[test]
    fn last_history_message_is_extracted() {
        let raw = json!({
            "messages": [{"content": "a"}, {"content": "b"}, {"content": "final"}]
        });
        assert_eq!(extract_display_text(raw).unwrap(), "final");
    }

    #[test]
    fn history_entries_may_carry_extra_fields() {
        let raw = json!({
            "messages": [
                {"role": "user", "content": "q"},
                {"role": "assistant", "content": "answer", "id": 3}
            ]
        });
        assert_eq!(extract_display_text(raw).unwrap(), "answer");
    }

    #[test]
    fn non_string_response_falls_through_to_history() {
        let raw = json!({"response": 5, "messages": [{"content": "from history"}]});
        assert_eq!(extract_display_text(raw).unwrap(), "from history");
    }

    #[test]
    fn empty_history_falls_back_to_json_text() {
        let raw = json!({"messages": []});
        assert_eq!(
            AgentResponse::classify(raw.clone()),
            AgentResponse::Unknown(raw)
        );
        assert_eq!(
            extract_display_text(json!({"messages": []})).unwrap(),
            r#"{"messages":[]}"#
        );
    }

    #[test]
    fn history_without_content_falls_back_to_json_text() {
        let raw = json!({"messages": [{"content": "a"}, {"role": "tool"}]});
        assert!(matches!(
            AgentResponse::classify(raw),
            AgentResponse::Unknown(_)
        ));
    }

    #[test]
    fn unknown_shape_is_stringified() {
        assert_eq!(extract_display_text(json!({"foo": 123})).unwrap(), r#"{"foo":123}"#);
        assert_eq!(extract_display_text(json!(42)).unwrap(), "42");
        assert_eq!(extract_display_text(json!(null)).unwrap(), "null");
        assert_eq!(extract_display_text(json!(["a", 1])).unwrap(), r#"["a",1]"#);
    }
}
