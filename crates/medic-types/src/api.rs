use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// JWT claims shared across medic-api (REST middleware) and medic-gateway
/// (WebSocket authentication). Tokens are minted by the host identity
/// system; this service only validates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Init --

#[derive(Debug, Serialize, Deserialize)]
pub struct InitResponse {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "postId")]
    pub post_id: String,
    pub username: String,
}

// -- Code retrieval --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeStatus {
    Available,
    Unavailable,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RetrieveCodeResponse {
    pub status: CodeStatus,
    pub code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteCodeResponse {
    pub status: String,
    pub message: String,
}

// -- Errors --

/// Body shape for every synchronous error response:
/// `{"status":"error","message":"..."}` with a matching HTTP status code.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieve_response_serializes_like_the_wire_format() {
        let available = RetrieveCodeResponse {
            status: CodeStatus::Available,
            code: Some("QPLKXMVD".into()),
        };
        assert_eq!(
            serde_json::to_string(&available).unwrap(),
            r#"{"status":"Available","code":"QPLKXMVD"}"#
        );

        let unavailable = RetrieveCodeResponse {
            status: CodeStatus::Unavailable,
            code: None,
        };
        assert_eq!(
            serde_json::to_string(&unavailable).unwrap(),
            r#"{"status":"Unavailable","code":null}"#
        );
    }

    #[test]
    fn init_response_uses_camel_case_keys() {
        let init = InitResponse {
            kind: "init".into(),
            post_id: "abc".into(),
            username: "medic_fan".into(),
        };
        let json = serde_json::to_value(&init).unwrap();
        assert_eq!(json["type"], "init");
        assert_eq!(json["postId"], "abc");
        assert_eq!(json["username"], "medic_fan");
    }
}
