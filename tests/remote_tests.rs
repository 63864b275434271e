// Tests for the HTTP-backed verification collaborators and fetcher
//
// Each test serves a tiny axum app on an ephemeral local port.

use anyhow::Result;
use axum::{extract::Query, http::StatusCode, routing::{get, post}, Json, Router};
use credscan::credential::{
    DisabledHcertCodec, HcertCodec, JwsVerifier, RemoteHcertCodec, RemoteJwsVerifier,
    SignatureValidity,
};
use credscan::error::{FetchError, HcertError};
use credscan::fetch::{Fetcher, HttpFetcher};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn serve(app: Router) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}", addr))
}

/// Accepts tokens whose payload is "good", rejects the rest, fails on "boom"
async fn validate(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    match body["payload"].as_str() {
        Some("good") => (StatusCode::OK, Json(json!({ "payload": {}, "diddoc": {} }))),
        Some("boom") => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "detail": "invalid" }))),
    }
}

async fn decode_hc1(
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if body["payload"] != "HC1:OK" {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({})));
    }
    let signature = if query.get("verify").map(String::as_str) == Some("true") {
        "provisional"
    } else {
        "valid"
    };
    (
        StatusCode::OK,
        Json(json!({
            "claims": { "iss": "IE", "exp": 2000000000 },
            "subject": { "fullName": "Jane Doe", "dateOfBirth": "1990-01-01" },
            "signature": signature
        })),
    )
}

#[tokio::test]
async fn test_remote_jws_verifier() -> Result<()> {
    let base = serve(Router::new().route("/validate", post(validate))).await?;
    let verifier = RemoteJwsVerifier::new(format!("{}/validate", base), TIMEOUT)?;

    assert_eq!(verifier.verify("good").await?, SignatureValidity::Valid);
    assert_eq!(verifier.verify("bad").await?, SignatureValidity::Invalid);
    assert!(verifier.verify("boom").await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_remote_hcert_codec() -> Result<()> {
    let base = serve(Router::new().route("/hc1", post(decode_hc1))).await?;
    let codec = RemoteHcertCodec::new(format!("{}/hc1", base), TIMEOUT)?;

    let decoded = codec.decode_hc1("HC1:OK", true).await?;
    assert_eq!(decoded.signature, SignatureValidity::Provisional);
    assert_eq!(decoded.subject.full_name, "Jane Doe");
    assert_eq!(decoded.claims["iss"], "IE");

    let decoded = codec.decode_hc1("HC1:OK", false).await?;
    assert_eq!(decoded.signature, SignatureValidity::Valid);

    let err = codec.decode_hc1("HC1:NOPE", true).await.unwrap_err();
    assert!(matches!(err, HcertError::Malformed(_)));

    Ok(())
}

#[tokio::test]
async fn test_disabled_hcert_codec() {
    let err = DisabledHcertCodec.decode_hc1("HC1:anything", true).await.unwrap_err();
    assert!(matches!(err, HcertError::Malformed(_)));
}

#[tokio::test]
async fn test_http_fetcher() -> Result<()> {
    let base = serve(
        Router::new()
            .route("/credential/1", get(|| async { "  HC1:fetched\n" }))
            .route("/gone", get(|| async { StatusCode::GONE })),
    )
    .await?;
    let fetcher = HttpFetcher::new(TIMEOUT)?;

    let body = fetcher.fetch(&format!("{}/credential/1", base)).await?;
    assert_eq!(body.trim(), "HC1:fetched");

    let err = fetcher.fetch(&format!("{}/gone", base)).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 410, .. }));

    let err = fetcher.fetch("ftp://example.com/file").await.unwrap_err();
    assert!(matches!(err, FetchError::Rejected { .. }));

    let err = fetcher.fetch("not a url").await.unwrap_err();
    assert!(matches!(err, FetchError::Rejected { .. }));

    Ok(())
}
