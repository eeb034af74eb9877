//! Tests for argument parsing and command dispatch.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rstest::rstest;
use serde_json::json;

use super::*;
use crate::domain::ports::{
    FixtureHttpTransport, FormPart, MemoryTokenStore, MockHttpTransport, RequestBody, TokenStore,
    TransportResponse,
};

fn parse(args: &[&str]) -> Command {
    Cli::try_parse_from(std::iter::once("erp-client").chain(args.iter().copied()))
        .expect("arguments parse")
        .command
}

fn fixture_client(status: u16, body: &Value, store: Arc<MemoryTokenStore>) -> ApiClient {
    ApiClient::new(Arc::new(FixtureHttpTransport::json(status, body)), store)
}

#[rstest]
fn get_accepts_repeated_query_pairs() {
    let command = parse(&["get", "/students", "--query", "page=2", "--query", "q=a=b"]);
    let Command::Get { path, query, meta } = command else {
        panic!("expected get command");
    };
    assert_eq!(path, "/students");
    assert_eq!(
        query,
        vec![
            ("page".to_owned(), "2".to_owned()),
            ("q".to_owned(), "a=b".to_owned())
        ]
    );
    assert!(!meta);
}

#[rstest]
#[case::missing_separator(&["get", "/students", "--query", "page"])]
#[case::empty_key(&["get", "/students", "--query", "=2"])]
#[case::bad_json(&["post", "/classes", "--json", "{name"])]
fn rejects_malformed_arguments(#[case] args: &[&str]) {
    let result = Cli::try_parse_from(std::iter::once("erp-client").chain(args.iter().copied()));
    assert!(result.is_err());
}

#[rstest]
fn post_parses_json_body() {
    let command = parse(&["post", "/classes", "--json", r#"{"name":"Grade 5"}"#]);
    let Command::Post(BodyArgs { path, json }) = command else {
        panic!("expected post command");
    };
    assert_eq!(path, "/classes");
    assert_eq!(json, Some(json!({ "name": "Grade 5" })));
}

#[rstest]
#[case(&[], "/fees")]
#[case(&[("status", "due")], "/fees?status=due")]
#[case(&[("q", "a b&c")], "/fees?q=a+b%26c")]
fn query_pairs_fold_into_path(#[case] pairs: &[(&str, &str)], #[case] expected: &str) {
    assert_eq!(with_query("/fees", pairs), expected);
}

#[rstest]
fn query_pairs_extend_existing_query() {
    assert_eq!(with_query("/fees?page=2", &[("limit", "20")]), "/fees?page=2&limit=20");
}

#[rstest]
#[tokio::test]
async fn get_prints_unwrapped_data() {
    let client = fixture_client(
        200,
        &json!({ "success": true, "data": [{ "id": 1 }] }),
        Arc::new(MemoryTokenStore::default()),
    );
    let output = run(&client, parse(&["get", "/students"]))
        .await
        .expect("command succeeds");
    assert_eq!(output, json!([{ "id": 1 }]));
}

#[rstest]
#[tokio::test]
async fn get_meta_prints_envelope() {
    let body = json!({
        "success": true,
        "data": [],
        "pagination": { "total": 0, "page": 1, "limit": 20, "totalPages": 0 }
    });
    let client = fixture_client(200, &body, Arc::new(MemoryTokenStore::default()));
    let output = run(&client, parse(&["get", "/students", "--meta"]))
        .await
        .expect("command succeeds");
    assert_eq!(output["pagination"]["limit"], json!(20));
    assert_eq!(output["success"], json!(true));
}

#[rstest]
#[tokio::test]
async fn api_failures_render_as_error_json() {
    let client = fixture_client(
        404,
        &json!({ "success": false, "error": "Student not found" }),
        Arc::new(MemoryTokenStore::default()),
    );
    let error = run(&client, parse(&["delete", "/students/99"]))
        .await
        .expect_err("404 fails");
    assert_eq!(
        error.to_json(),
        json!({
            "message": "The requested resource was not found.",
            "status": 404,
            "code": "NOT_FOUND"
        })
    );
}

#[rstest]
#[tokio::test]
async fn session_commands_round_trip() {
    let store = Arc::new(MemoryTokenStore::default());
    let client = fixture_client(200, &json!({}), Arc::clone(&store));
    let payload = URL_SAFE_NO_PAD.encode(r#"{"role":"teacher","schoolId":"8"}"#);
    let token = format!("e30.{payload}.sig");

    run(
        &client,
        parse(&["session", "set", "--token", &token, "--role", "teacher"]),
    )
    .await
    .expect("set succeeds");
    let status = run(&client, parse(&["session", "status"]))
        .await
        .expect("status succeeds");
    assert_eq!(
        status,
        json!({ "authenticated": true, "role": "teacher", "schoolId": 8 })
    );

    run(&client, parse(&["session", "clear"]))
        .await
        .expect("clear succeeds");
    assert!(store.keys().is_empty());
}

#[rstest]
#[tokio::test]
async fn session_migrate_reports_moved_keys() {
    let store = Arc::new(MemoryTokenStore::with_entries([("userRole", "driver")]));
    let client = fixture_client(200, &json!({}), Arc::clone(&store));

    let output = run(&client, parse(&["session", "migrate"]))
        .await
        .expect("migrate succeeds");
    assert_eq!(output, json!({ "tokenMigrated": false, "roleMigrated": true }));
    assert_eq!(store.get("role").expect("get").as_deref(), Some("driver"));
}

#[rstest]
#[tokio::test]
async fn upload_reads_files_into_multipart_parts() {
    let temp = tempfile::tempdir().expect("temp dir");
    let file = temp.path().join("tc.pdf");
    std::fs::write(&file, b"%PDF-1.7").expect("write upload");
    let file_arg = format!("certificate={}", file.display());

    let mut transport = MockHttpTransport::new();
    transport
        .expect_send()
        .withf(|request| match &request.body {
            RequestBody::Multipart(form) => matches!(
                form.parts(),
                [
                    FormPart::Text { name, value },
                    FormPart::File { file_name, content_type: Some(mime), bytes, .. },
                ] if name == "studentId"
                    && value == "4"
                    && file_name == "tc.pdf"
                    && mime == "application/pdf"
                    && bytes.as_slice() == b"%PDF-1.7"
            ),
            _ => false,
        })
        .times(1)
        .returning(|_| {
            Ok(TransportResponse {
                status: 201,
                body: br#"{"success":true,"data":{"id":3}}"#.to_vec(),
            })
        });
    let client = ApiClient::new(Arc::new(transport), Arc::new(MemoryTokenStore::default()));

    let output = run(
        &client,
        parse(&[
            "upload",
            "/certificates",
            "--field",
            "studentId=4",
            "--file",
            &file_arg,
        ]),
    )
    .await
    .expect("upload succeeds");
    assert_eq!(output, json!({ "id": 3 }));
}

#[rstest]
#[tokio::test]
async fn unreadable_upload_is_reported_before_sending() {
    let mut transport = MockHttpTransport::new();
    transport.expect_send().never();
    let client = ApiClient::new(Arc::new(transport), Arc::new(MemoryTokenStore::default()));
    let error = run(
        &client,
        parse(&["upload", "/certificates", "--file", "doc=/nonexistent/erp/tc.pdf"]),
    )
    .await
    .expect_err("missing file fails");

    let CliError::Upload { path, source } = &error else {
        panic!("expected upload error, got {error:?}");
    };
    assert_eq!(path.as_str(), "/nonexistent/erp/tc.pdf");
    assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
    let rendered = error.to_json();
    assert_eq!(rendered["code"], json!("UPLOAD_ERROR"));
    assert!(
        rendered["message"]
            .as_str()
            .is_some_and(|message| message.contains("/nonexistent/erp/tc.pdf"))
    );
}
