use dyn_mm_reports::{Error, Method, Session};
use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use serde_json::json;

fn session(server: &MockServer) -> Session {
    Session::builder("test-key")
        .base_url(server.base_url())
        .build()
        .unwrap()
}

#[tokio::test]
async fn get_sends_api_key_and_params_in_query() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/reports/sent")
                .query_param("apikey", "test-key")
                .query_param("sender", "a@x.com");
            then.status(200).json_body(json!({"sent": []}));
        })
        .await;

    let body = session(&server)
        .execute("/reports/sent", Method::GET, &[("sender", "a@x.com".to_string())])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(body, json!({"sent": []}));
}

#[tokio::test]
async fn post_sends_params_as_form() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/senders")
                .body_contains("apikey=test-key")
                .body_contains("emailaddress=a%40x.com");
            then.status(200)
                .json_body(json!({"response": {"status": 200, "message": "OK", "data": {}}}));
        })
        .await;

    session(&server)
        .execute("/senders", Method::POST, &[("emailaddress", "a@x.com".to_string())])
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn envelope_error_status_becomes_api_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/reports/sent");
            then.status(200).json_body(json!({
                "response": {"status": 451, "message": "Missing or Invalid API Key", "data": {}}
            }));
        })
        .await;

    let err = session(&server)
        .execute("/reports/sent", Method::GET, &[])
        .await
        .unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 451);
            assert_eq!(message, "Missing or Invalid API Key");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn http_error_status_becomes_request_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/reports/sent");
            then.status(500);
        })
        .await;

    let err = session(&server)
        .execute("/reports/sent", Method::GET, &[])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Request(_)));
}

#[tokio::test]
async fn non_json_body_becomes_json_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/reports/sent");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let err = session(&server)
        .execute("/reports/sent", Method::GET, &[])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Json(_)));
}
