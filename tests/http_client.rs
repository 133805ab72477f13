//! HTTP client tests against an in-process fake compliance service.

mod common;

use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::json;

use compliance_results::client::{ClientError, ComplianceClient, HttpComplianceClient};
use compliance_results::commands;
use compliance_results::config::ServerConfig;

use common::*;

/// Start a fake service that reports `status` for every namespace and serves
/// `archive` as the results tarball. Returns the base URL.
async fn spawn_service(status: &'static str, archive: Option<Vec<u8>>) -> String {
    let archive = archive.map(Bytes::from);

    let app = Router::new()
        .route(
            "/namespaces/{namespace}/status",
            get(move |Path(namespace): Path<String>| async move {
                Json(json!({
                    "status": status,
                    "plugins": [
                        { "plugin": "e2e", "node": "global", "status": status },
                        { "plugin": "systemd-logs", "node": format!("{namespace}-worker"), "status": "complete" }
                    ]
                }))
            }),
        )
        .route(
            "/namespaces/{namespace}/results",
            get(move || {
                let archive = archive.clone();
                async move {
                    match archive {
                        Some(body) => Ok(([(header::CONTENT_TYPE, "application/x-tar")], body)),
                        None => Err(StatusCode::INTERNAL_SERVER_ERROR),
                    }
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn client_for(endpoint: &str) -> HttpComplianceClient {
    HttpComplianceClient::new(&ServerConfig {
        endpoint: endpoint.to_string(),
        ..ServerConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_status_is_decoded() {
    let endpoint = spawn_service("running", None).await;
    let client = client_for(&endpoint);

    let status = client.status("conformance").await.unwrap();
    assert_eq!(status.status, "running");
    assert!(!status.is_complete());
    assert_eq!(status.plugins.len(), 2);
    assert_eq!(status.plugins[1].node, "conformance-worker");
}

#[tokio::test]
async fn test_results_end_to_end_over_http() {
    let endpoint = spawn_service("complete", Some(results_archive(THREE_CASE_REPORT))).await;
    let client = client_for(&endpoint);

    let mut out = Vec::new();
    commands::results::run(&client, "compliance", &mut out)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), EXPECTED_TABLE);
}

#[tokio::test]
async fn test_results_server_error_is_reported() {
    let endpoint = spawn_service("complete", None).await;
    let client = client_for(&endpoint);

    let mut out = Vec::new();
    let err = commands::results::run(&client, "compliance", &mut out)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "failed to retrieve the results");
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_unknown_route_is_unexpected_status() {
    let endpoint = spawn_service("complete", None).await;
    let client = client_for(&format!("{endpoint}/missing/prefix"));

    let err = client.status("compliance").await.unwrap_err();
    match err.downcast_ref::<ClientError>() {
        Some(ClientError::UnexpectedStatus { status, .. }) => {
            assert_eq!(*status, reqwest::StatusCode::NOT_FOUND)
        }
        other => panic!("unexpected error: {other:?} ({err:#})"),
    }
}

#[tokio::test]
async fn test_status_command_over_http() {
    let endpoint = spawn_service("complete", None).await;
    let client = client_for(&endpoint);

    let mut out = Vec::new();
    commands::status::run(&client, "ci", &mut out).await.unwrap();
    let output = String::from_utf8(out).unwrap();
    assert!(output.starts_with("Status: complete\n"), "{output}");
    assert!(output.contains("systemd-logs  ci-worker  complete"), "{output}");
}
