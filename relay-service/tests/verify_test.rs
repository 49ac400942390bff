mod common;

use common::{TestApp, TestSetup};
use serde_json::json;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn app_with_model(reply: ResponseTemplate) -> (TestApp, MockServer) {
    let model = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(reply)
        .mount(&model)
        .await;

    let app = TestApp::spawn_with(TestSetup {
        inference_url: Some(model.uri()),
        ..TestSetup::default()
    })
    .await;

    (app, model)
}

#[tokio::test]
async fn verify_requires_title_or_content() {
    let app = TestApp::spawn().await;

    for body in [json!({}), json!({ "title": "", "content": "" }), json!({ "title": null })] {
        let response = app.post_json("/verify", &body).await;
        assert_eq!(response.status().as_u16(), 400);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Title or content is required");
    }
}

#[tokio::test]
async fn verify_rejects_malformed_json() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/verify", app.address))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn verify_uses_keywords_without_model() {
    let app = TestApp::spawn().await;

    let body: serde_json::Value = app
        .post_json(
            "/verify",
            &json!({ "title": "Peppol goes live in Belgium", "content": "" }),
        )
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["verified"], true);
    assert_eq!(body["method"], "keyword_fallback");
    assert_eq!(body["response"], "Strong e-invoicing indicators found");
}

#[tokio::test]
async fn verify_keyword_exclusions_apply() {
    let app = TestApp::spawn().await;

    let body: serde_json::Value = app
        .post_json(
            "/api/verify-llm",
            &json!({
                "title": "Free e-invoice template",
                "content": "Download our invoice template today"
            }),
        )
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["verified"], false);
    assert_eq!(body["response"], "Generic invoicing tool, not e-invoicing");
}

#[tokio::test]
async fn verify_uses_model_reply() {
    let (app, _model) =
        app_with_model(ResponseTemplate::new(200).set_body_json(json!([{ "generated_text": "Yes" }])))
            .await;

    let body: serde_json::Value = app
        .post_json("/verify", &json!({ "title": "Quarterly results", "content": "Revenue grew" }))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["verified"], true);
    assert_eq!(body["method"], "external_model");
    assert_eq!(body["response"], "Yes");
}

#[tokio::test]
async fn verify_model_reply_with_both_tokens_is_negative() {
    let (app, _model) = app_with_model(
        ResponseTemplate::new(200).set_body_json(json!({ "generated_text": "YES or NO" })),
    )
    .await;

    let body: serde_json::Value = app
        .post_json("/verify", &json!({ "title": "Peppol", "content": "" }))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["verified"], false);
    assert_eq!(body["method"], "external_model");
}

#[tokio::test]
async fn verify_falls_back_when_model_errors() {
    let (app, _model) = app_with_model(
        ResponseTemplate::new(503).set_body_json(json!({ "error": "Model is currently loading" })),
    )
    .await;

    let body: serde_json::Value = app
        .post_json(
            "/verify",
            &json!({ "title": "", "content": "New XML invoice rules for suppliers" }),
        )
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["verified"], true);
    assert_eq!(body["method"], "keyword_fallback");
}

#[tokio::test]
async fn verify_sends_bounded_prompt_to_model() {
    let model = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "generated_text": "NO" }])))
        .expect(1)
        .mount(&model)
        .await;

    let app = TestApp::spawn_with(TestSetup {
        inference_url: Some(model.uri()),
        ..TestSetup::default()
    })
    .await;

    app.post_json(
        "/verify",
        &json!({ "title": "Long read", "content": "z".repeat(5000) }),
    )
    .await;

    let requests = model.received_requests().await.expect("recording disabled");
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = sent["inputs"].as_str().unwrap();

    assert!(prompt.contains(&"z".repeat(800)));
    assert!(!prompt.contains(&"z".repeat(801)));
    assert_eq!(sent["parameters"]["max_new_tokens"], 5);
}
