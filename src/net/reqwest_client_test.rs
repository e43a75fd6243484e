use super::*;

#[test]
fn join_url_normalizes_slashes() {
    assert_eq!(join_url("http://h:8080", "/api/login"), "http://h:8080/api/login");
    assert_eq!(join_url("http://h:8080/", "/api/login"), "http://h:8080/api/login");
    assert_eq!(join_url("http://h:8080", "api/login"), "http://h:8080/api/login");
}

#[test]
fn method_maps_to_reqwest() {
    assert_eq!(reqwest::Method::from(Method::Get), reqwest::Method::GET);
    assert_eq!(reqwest::Method::from(Method::Post), reqwest::Method::POST);
    assert_eq!(reqwest::Method::from(Method::Delete), reqwest::Method::DELETE);
}

#[test]
fn builds_from_default_config() {
    let client = ReqwestClient::from_config(&ClientConfig::default()).unwrap();
    assert_eq!(client.base_url(), "http://127.0.0.1:8080");
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    let client = ReqwestClient::new("http://127.0.0.1:1", Timeouts { request_secs: 2, connect_secs: 1 }).unwrap();
    let err = client.request(HttpRequest::get("/api/ping")).await.unwrap_err();
    assert!(matches!(err, NetworkError::Transport(_)));
}
