// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::http::HeaderMap;
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;

use super::*;

fn bag(pairs: &[(&str, &str)]) -> CredentialBag {
    pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
}

fn form_map(request: &TokenRequest) -> HashMap<&str, &str> {
    request.form.iter().map(|(k, v)| (*k, v.as_str())).collect()
}

/// A captured token request: path, headers and decoded form fields.
#[derive(Debug, Clone, Default)]
struct Captured {
    path: String,
    headers: HashMap<String, String>,
    form: HashMap<String, String>,
}

/// Start a mock authorization server answering every POST with `(status, body)`.
async fn mock_token_server(
    status: u16,
    body: &'static str,
) -> anyhow::Result<(SocketAddr, Arc<Mutex<Vec<Captured>>>)> {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);

    let handler = move |uri: axum::http::Uri, headers: HeaderMap, form: String| {
        let sink = Arc::clone(&sink);
        async move {
            let entry = Captured {
                path: uri.path().to_owned(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.as_str().to_owned(), v.to_str().unwrap_or("").to_owned()))
                    .collect(),
                form: form
                    .split('&')
                    .filter_map(|pair| pair.split_once('='))
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect(),
            };
            if let Ok(mut guard) = sink.lock() {
                guard.push(entry);
            }
            (
                axum::http::StatusCode::from_u16(status)
                    .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR),
                [("content-type", "application/json")],
                body,
            )
        }
    };

    let app = Router::new()
        .route("/oauth/v1/tokens", post(handler.clone()))
        .route("/hdpba/oauth2/v1/token", post(handler.clone()))
        .route("/oauth2/v1/token", post(handler));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok((addr, captured))
}

#[test]
fn flow_selection_is_closed() -> anyhow::Result<()> {
    for env in ["opera_cloud", "property", "workflows", "nor1"] {
        let flow = TokenFlow::for_environment(env);
        assert_eq!(flow, Some(TokenFlow::EnterpriseClientCredentials), "{env}");
    }
    let flow = TokenFlow::for_environment("distribution");
    assert_eq!(flow, Some(TokenFlow::ResourceOwnerPassword));
    assert_eq!(TokenFlow::for_environment("ra_storage"), Some(TokenFlow::IdentityDomain));
    assert_eq!(TokenFlow::for_environment("ra_data"), Some(TokenFlow::IdentityDomain));
    assert_eq!(TokenFlow::for_environment("staging"), None);
    assert_eq!(TokenFlow::for_environment(""), None);
    Ok(())
}

#[test]
fn enterprise_request_includes_enterprise_id_when_present() -> anyhow::Result<()> {
    let creds = bag(&[
        ("HostName", "https://api.example"),
        ("AppKey", "app-key-123"),
        ("ClientId", "client"),
        ("ClientSecret", "secret"),
        ("EnterpriseId", "ENT1"),
    ]);
    let request = TokenFlow::EnterpriseClientCredentials.build_request(&creds);
    assert_eq!(request.url, "https://api.example/oauth/v1/tokens");
    assert_eq!(request.header("enterpriseId"), Some("ENT1"));
    assert_eq!(request.header("x-app-key"), Some("app-key-123"));
    assert_eq!(request.header("Authorization"), Some(basic_auth("client", "secret").as_str()));

    let form = form_map(&request);
    assert_eq!(form.get("grant_type"), Some(&"client_credentials"));
    assert_eq!(form.get("scope"), Some(&"urn:opc:hgbu:ws:__myscopes__"));
    Ok(())
}

#[test]
fn enterprise_request_omits_enterprise_id_when_absent() -> anyhow::Result<()> {
    let creds = bag(&[("HOSTNAME", "https://api.example"), ("CLIENT_ID", "c")]);
    let request = TokenFlow::EnterpriseClientCredentials.build_request(&creds);
    assert_eq!(request.header("enterpriseId"), None);
    assert_eq!(request.header("x-app-key"), Some(""));
    Ok(())
}

#[test]
fn password_request_uses_distribution_endpoint() -> anyhow::Result<()> {
    let creds = bag(&[
        ("hostname", "https://dist.example/"),
        ("appKey", "k"),
        ("clientId", "c"),
        ("clientSecret", "s"),
        ("Username", "user@example.com"),
        ("Password", "p&ss word"),
    ]);
    let request = TokenFlow::ResourceOwnerPassword.build_request(&creds);
    assert_eq!(request.url, "https://dist.example/hdpba/oauth2/v1/token");
    assert_eq!(request.header("x-app-key"), Some("k"));
    assert_eq!(request.header("enterpriseId"), None);

    let form = form_map(&request);
    assert_eq!(form.get("username"), Some(&"user@example.com"));
    assert_eq!(form.get("password"), Some(&"p&ss word"));
    assert_eq!(form.get("grant_type"), Some(&"password"));
    Ok(())
}

#[test]
fn identity_request_accepts_both_naming_conventions() -> anyhow::Result<()> {
    let legacy =
        bag(&[("IDCSHostName", "https://idcs.example"), ("APPId", "a"), ("APPSecret", "b")]);
    let modern = bag(&[
        ("IDCS_HOSTNAME", "https://idcs.example"),
        ("ClientId", "a"),
        ("ClientSecret", "b"),
    ]);

    for creds in [legacy, modern] {
        let request = TokenFlow::IdentityDomain.build_request(&creds);
        assert_eq!(request.url, "https://idcs.example/oauth2/v1/token");
        assert_eq!(request.header("Authorization"), Some(basic_auth("a", "b").as_str()));
        assert_eq!(request.header("x-app-key"), None);
        assert_eq!(form_map(&request).get("scope"), Some(&"urn:opc:idm:__myscopes__"));
    }
    Ok(())
}

#[tokio::test]
async fn enterprise_acquire_sends_headers_and_form() -> anyhow::Result<()> {
    let (addr, captured) = mock_token_server(
        200,
        r#"{"access_token":"tok-1","token_type":"Bearer","expires_in":3600}"#,
    )
    .await?;
    let host = format!("http://{addr}");
    let creds = bag(&[
        ("HostName", host.as_str()),
        ("AppKey", "k"),
        ("ClientId", "c"),
        ("ClientSecret", "s"),
        ("EnterpriseId", "ENT"),
    ]);

    let token = TokenFlow::EnterpriseClientCredentials
        .acquire(&test_client()?, &creds)
        .await?;
    assert_eq!(token.access_token, "tok-1");
    assert_eq!(token.expires_in, Some(3600));

    let calls = captured.lock().map_err(|_| anyhow::anyhow!("poisoned"))?.clone();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.path, "/oauth/v1/tokens");
    assert_eq!(call.headers.get("enterpriseid").map(String::as_str), Some("ENT"));
    assert_eq!(call.headers.get("x-app-key").map(String::as_str), Some("k"));
    assert_eq!(
        call.headers.get("content-type").map(String::as_str),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(call.form.get("grant_type").map(String::as_str), Some("client_credentials"));
    Ok(())
}

#[tokio::test]
async fn password_acquire_percent_encodes_credentials() -> anyhow::Result<()> {
    let (addr, captured) = mock_token_server(200, r#"{"access_token":"tok-2"}"#).await?;
    let host = format!("http://{addr}");
    let creds = bag(&[
        ("HostName", host.as_str()),
        ("Username", "a@b"),
        ("Password", "x&y=z"),
    ]);

    let token =
        TokenFlow::ResourceOwnerPassword.acquire(&test_client()?, &creds).await?;
    assert_eq!(token.access_token, "tok-2");

    let calls = captured.lock().map_err(|_| anyhow::anyhow!("poisoned"))?.clone();
    assert_eq!(calls[0].path, "/hdpba/oauth2/v1/token");
    assert_eq!(calls[0].form.get("username").map(String::as_str), Some("a%40b"));
    assert_eq!(calls[0].form.get("password").map(String::as_str), Some("x%26y%3Dz"));
    assert_eq!(calls[0].form.get("grant_type").map(String::as_str), Some("password"));
    Ok(())
}

#[tokio::test]
async fn rejected_token_request_carries_status_and_body() -> anyhow::Result<()> {
    let (addr, _) = mock_token_server(401, r#"{"error":"invalid_client"}"#).await?;
    let host = format!("http://{addr}");
    let creds = bag(&[("IDCSHostName", host.as_str())]);

    let err = TokenFlow::IdentityDomain
        .acquire(&test_client()?, &creds)
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected failure"))?;
    let message = err.to_string();
    assert!(message.contains("401"), "{message}");
    assert!(message.contains("invalid_client"), "{message}");
    Ok(())
}

#[tokio::test]
async fn non_json_token_body_propagates_error() -> anyhow::Result<()> {
    let (addr, _) = mock_token_server(200, "<html>maintenance</html>").await?;
    let host = format!("http://{addr}");
    let creds = bag(&[("IDCSHostName", host.as_str())]);

    let result = TokenFlow::IdentityDomain.acquire(&test_client()?, &creds).await;
    assert!(result.is_err());
    Ok(())
}

fn test_client() -> anyhow::Result<reqwest::Client> {
    crate::state::build_http_client(std::time::Duration::from_secs(5))
}
