use std::time::Duration;

use httpmock::Method::GET;
use httpmock::MockServer;
use medtour_i18n::translate::{HttpTranslator, TranslateError, Translator};
use serde_json::json;

fn translator(server: &MockServer) -> HttpTranslator {
    HttpTranslator::new(server.base_url(), Duration::from_secs(5)).expect("client")
}

#[tokio::test]
async fn decodes_entities_in_provider_output() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/get")
                .query_param("q", "Heart & lungs")
                .query_param("langpair", "en|fr");
            then.status(200).json_body(json!({
                "responseData": { "translatedText": "C&#39;est le c&oelig;ur &amp; les poumons" },
                "responseStatus": 200
            }));
        })
        .await;

    let out = translator(&server)
        .translate_raw("Heart & lungs", "en", "fr")
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(out, "C'est le c&oelig;ur & les poumons");
}

#[tokio::test]
async fn chinese_requests_use_region_qualified_code() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/get").query_param("langpair", "en|zh-CN");
            then.status(200).json_body(json!({
                "responseData": { "translatedText": "医院" },
                "responseStatus": 200
            }));
        })
        .await;

    let out = translator(&server)
        .translate_raw("Hospital", "en", "zh")
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(out, "医院");
}

#[tokio::test]
async fn http_error_carries_original_text() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/get");
            then.status(503);
        })
        .await;

    let err = translator(&server)
        .translate_raw("Hello", "en", "de")
        .await
        .unwrap_err();
    mock.assert_async().await;
    match err {
        TranslateError::ProviderUnavailable { original, reason } => {
            assert_eq!(original, "Hello");
            assert!(reason.contains("503"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn provider_level_status_is_checked() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/get");
            then.status(200).json_body(json!({
                "responseData": { "translatedText": "QUOTA EXCEEDED" },
                "responseStatus": "429"
            }));
        })
        .await;

    let err = translator(&server)
        .translate_raw("Hello", "en", "de")
        .await
        .unwrap_err();
    assert!(matches!(err, TranslateError::ProviderUnavailable { .. }));
}

#[tokio::test]
async fn unknown_language_fails_before_any_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/get");
            then.status(200);
        })
        .await;

    let err = translator(&server)
        .translate_raw("Hello", "en", "klingon")
        .await
        .unwrap_err();
    assert_eq!(err, TranslateError::InvalidLanguage("klingon".into()));
    let err = translator(&server)
        .translate_raw("  ", "en", "fr")
        .await
        .unwrap_err();
    assert!(err.is_invalid_input());
    mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn unreachable_provider_is_unavailable() {
    // nothing listens on port 9 locally
    let translator = HttpTranslator::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let err = translator.translate_raw("Hello", "en", "it").await.unwrap_err();
    assert_eq!(
        match err {
            TranslateError::ProviderUnavailable { original, .. } => original,
            other => panic!("unexpected error: {other:?}"),
        },
        "Hello"
    );
}
