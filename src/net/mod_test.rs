use super::*;
use serde_json::json;

// =============================================================================
// NetworkError::from_status
// =============================================================================

#[test]
fn from_status_lifts_message_field() {
    let err = NetworkError::from_status(401, r#"{"code":401,"message":"require password reset"}"#.into());
    assert_eq!(err.message(), Some("require password reset"));
    assert!(err.requires_password_reset());
}

#[test]
fn from_status_falls_back_to_error_field() {
    let err = NetworkError::from_status(400, r#"{"error":"username taken"}"#.into());
    assert_eq!(err.message(), Some("username taken"));
    assert!(!err.requires_password_reset());
}

#[test]
fn password_reset_ignores_error_key() {
    let err = NetworkError::from_status(401, r#"{"error":"require password reset"}"#.into());
    assert_eq!(err.message(), Some("require password reset"));
    assert!(!err.requires_password_reset());
}

#[test]
fn from_status_keeps_non_json_body() {
    let err = NetworkError::from_status(502, "<html>bad gateway</html>".into());
    assert!(err.message().is_none());
    match err {
        NetworkError::Status { status, body, .. } => {
            assert_eq!(status, 502);
            assert!(body.contains("bad gateway"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn password_reset_match_is_exact() {
    let err = NetworkError::from_status(401, r#"{"message":"Require password reset"}"#.into());
    assert!(!err.requires_password_reset());
    assert!(!NetworkError::Transport("require password reset".into()).requires_password_reset());
}

#[test]
fn retryable_statuses() {
    assert!(NetworkError::from_status(429, String::new()).retryable());
    assert!(NetworkError::from_status(500, String::new()).retryable());
    assert!(!NetworkError::from_status(401, String::new()).retryable());
    assert!(!NetworkError::Parse("x".into()).retryable());
    assert!(NetworkError::Transport("x".into()).retryable());
}

#[test]
fn error_codes() {
    assert_eq!(NetworkError::Transport("x".into()).error_code(), "E_NETWORK_TRANSPORT");
    assert_eq!(NetworkError::from_status(404, String::new()).error_code(), "E_NETWORK_STATUS");
    assert_eq!(NetworkError::Parse("x".into()).error_code(), "E_NETWORK_PARSE");
    assert_eq!(NetworkError::ClientBuild("x".into()).error_code(), "E_HTTP_CLIENT_BUILD");
}

// =============================================================================
// HttpResponse
// =============================================================================

#[test]
fn from_text_empty_body_is_null() {
    let response = HttpResponse::from_text(204, "  ").unwrap();
    assert_eq!(response.body, Value::Null);
}

#[test]
fn from_text_rejects_non_json() {
    assert!(matches!(HttpResponse::from_text(200, "ok"), Err(NetworkError::Parse(_))));
}

#[test]
fn json_deserializes_token_response() {
    let response = HttpResponse::from_text(200, r#"{"code":200,"token":"a.b.c","expire":"2024-01-01T00:00:00Z"}"#)
        .unwrap();
    let body: api::TokenResponse = response.json().unwrap();
    assert_eq!(body.token, "a.b.c");
    assert_eq!(body.code, Some(200));
}

#[test]
fn json_reports_shape_mismatch() {
    let response = HttpResponse { status: 200, body: json!({ "user": "alice" }) };
    let err = response.json::<api::TokenResponse>().unwrap_err();
    assert_eq!(err.error_code(), "E_NETWORK_PARSE");
}

// =============================================================================
// HttpRequest / Method
// =============================================================================

#[test]
fn bearer_attaches_authorization_only_when_present() {
    let with = HttpRequest::get("/api/jobs").bearer(Some("Bearer t".into()));
    assert_eq!(with.header_value("authorization"), Some("Bearer t"));

    let without = HttpRequest::get("/api/jobs").bearer(None);
    assert!(without.headers.is_empty());
    assert!(without.header_value(AUTHORIZATION).is_none());
}

#[test]
fn post_carries_json_body() {
    let request = HttpRequest::post(api::LOGIN_PATH).json(json!({ "username": "alice" }));
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, "/api/login");
    assert_eq!(request.body, Some(json!({ "username": "alice" })));
}

#[test]
fn method_parses_case_insensitively() {
    assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
    assert_eq!("Delete".parse::<Method>().unwrap(), Method::Delete);
    assert!("TRACE".parse::<Method>().is_err());
    assert_eq!(Method::Patch.to_string(), "PATCH");
}

#[test]
fn credentials_debug_redacts_password() {
    let creds = api::Credentials::new("alice", "hunter2");
    let shown = format!("{creds:?}");
    assert!(shown.contains("alice"));
    assert!(!shown.contains("hunter2"));
}

#[test]
fn credentials_serialize_as_login_body() {
    let creds = api::Credentials::new("alice", "hunter2");
    assert_eq!(serde_json::to_value(&creds).unwrap(), json!({ "username": "alice", "password": "hunter2" }));
}
