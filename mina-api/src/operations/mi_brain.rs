//! Voice brain operations

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::define_ubus_operation;
use crate::error::ApiError;
use crate::operation::{UbusOperation, UbusResponse};
use crate::service::Service;

define_ubus_operation! {
    operation: TextToSpeechOperation,
    method: "text_to_speech",
    service: MiBrain,
    request: {
        text: String,
    },
}

define_ubus_operation! {
    operation: RawNlpResultOperation,
    method: "nlp_result_get",
    service: MiBrain,
    request: {},
}

/// One answer the speaker gave to a spoken request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationAnswer {
    pub domain: String,
    pub action: String,
    /// What the speaker said
    pub content: String,
    /// What the user asked
    pub question: String,
}

/// A recent voice interaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationMessage {
    pub request_id: String,
    pub timestamp_ms: i64,
    pub answers: Vec<ConversationAnswer>,
}

#[derive(Deserialize)]
struct NlpHistory {
    #[serde(default)]
    result: Vec<NlpRecord>,
}

#[derive(Deserialize)]
struct NlpRecord {
    nlp: Option<String>,
}

/// Fetch recent voice interactions
pub struct NlpResultGetOperation;

impl UbusOperation for NlpResultGetOperation {
    type Request = RawNlpResultOperationRequest;
    type Response = Vec<ConversationMessage>;

    const SERVICE: Service = Service::MiBrain;
    const METHOD: &'static str = RawNlpResultOperation::METHOD;

    fn parse_response(response: UbusResponse) -> Result<Self::Response, ApiError> {
        let history: NlpHistory = response.info()?;
        history
            .result
            .iter()
            .filter_map(|record| record.nlp.as_deref())
            .map(parse_nlp)
            .collect()
    }
}

fn parse_nlp(nlp: &str) -> Result<ConversationMessage, ApiError> {
    let nlp: Value = serde_json::from_str(nlp)?;
    let text = |value: &Value| value.as_str().unwrap_or_default().to_string();

    let meta = &nlp["meta"];
    // The timestamp shows up both as a number and as a numeric string
    let timestamp_ms = match &meta["timestamp"] {
        Value::Number(n) => n.as_i64().unwrap_or_default(),
        Value::String(s) => s.parse().map_err(|_| {
            ApiError::ParseError(format!("invalid conversation timestamp '{}'", s))
        })?,
        _ => 0,
    };

    let answers = nlp["response"]["answer"]
        .as_array()
        .map(|answers| {
            answers
                .iter()
                .map(|answer| ConversationAnswer {
                    domain: text(&answer["domain"]),
                    action: text(&answer["action"]),
                    content: text(&answer["content"]["to_speak"]),
                    question: text(&answer["intention"]["query"]),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ConversationMessage {
        request_id: text(&meta["request_id"]),
        timestamp_ms,
        answers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tts_message() {
        let request = TextToSpeechOperationRequest::new("hello".to_string());
        let message = TextToSpeechOperation::build_message(&request).unwrap();
        assert_eq!(message, json!({"text": "hello"}));
        assert_eq!(TextToSpeechOperation::SERVICE.path(), "mibrain");
    }

    #[test]
    fn test_conversation_parsing() {
        let nlp = json!({
            "meta": {"request_id": "req-1", "timestamp": "1700000000000"},
            "response": {"answer": [{
                "domain": "weather",
                "action": "query",
                "content": {"to_speak": "Sunny today"},
                "intention": {"query": "what is the weather"}
            }]}
        });
        let info = json!({"result": [{"nlp": nlp.to_string()}, {"other": 1}]});
        let envelope = json!({"code": 0, "data": {"code": 0, "info": info.to_string()}});

        let response = UbusResponse::from_envelope("nlp_result_get", envelope).unwrap();
        let messages = NlpResultGetOperation::parse_response(response).unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].request_id, "req-1");
        assert_eq!(messages[0].timestamp_ms, 1_700_000_000_000);
        assert_eq!(messages[0].answers[0].content, "Sunny today");
        assert_eq!(messages[0].answers[0].question, "what is the weather");
    }
}
