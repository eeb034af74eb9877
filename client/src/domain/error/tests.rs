//! Tests for the error payload shape and message fallbacks.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(ErrorCode::AuthFailed, "\"AUTH_FAILED\"")]
#[case(ErrorCode::Forbidden, "\"FORBIDDEN\"")]
#[case(ErrorCode::NotFound, "\"NOT_FOUND\"")]
#[case(ErrorCode::ServerError, "\"SERVER_ERROR\"")]
#[case(ErrorCode::ApiError, "\"API_ERROR\"")]
#[case(ErrorCode::NetworkError, "\"NETWORK_ERROR\"")]
#[case(ErrorCode::UnknownError, "\"UNKNOWN_ERROR\"")]
fn codes_serialise_in_screaming_snake_case(#[case] code: ErrorCode, #[case] expected: &str) {
    let encoded = serde_json::to_string(&code).expect("code serialises");
    assert_eq!(encoded, expected);
    assert_eq!(format!("\"{code}\""), expected);
}

#[rstest]
fn blank_messages_fall_back_to_code_default() {
    let err = ApiError::api(422, "   ");
    assert_eq!(err.code(), ErrorCode::ApiError);
    assert_eq!(err.message(), "The request could not be completed.");
}

#[rstest]
fn network_errors_carry_no_status() {
    let err = ApiError::network();
    assert_eq!(err.status(), None);
    let encoded = serde_json::to_value(&err).expect("error serialises");
    assert_eq!(
        encoded,
        json!({
            "message": "Unable to reach the server. Please check your connection.",
            "code": "NETWORK_ERROR"
        })
    );
}

#[rstest]
fn auth_failures_serialise_with_status() {
    let err = ApiError::auth_failed();
    assert!(err.is_auth_failure());
    let encoded = serde_json::to_value(&err).expect("error serialises");
    assert_eq!(encoded["status"], json!(401));
    assert_eq!(encoded["code"], json!("AUTH_FAILED"));
}

#[rstest]
#[case(ApiError::forbidden(), ErrorCode::Forbidden, Some(403))]
#[case(ApiError::not_found(), ErrorCode::NotFound, Some(404))]
#[case(ApiError::server_error(503), ErrorCode::ServerError, Some(503))]
#[case(ApiError::unknown("bad url"), ErrorCode::UnknownError, None)]
#[case(ApiError::undecodable(200, "not a list"), ErrorCode::UnknownError, Some(200))]
fn constructors_set_code_and_status(
    #[case] err: ApiError,
    #[case] code: ErrorCode,
    #[case] status: Option<u16>,
) {
    assert_eq!(err.code(), code);
    assert_eq!(err.status(), status);
    assert!(!err.message().trim().is_empty());
}

#[rstest]
fn display_uses_message() {
    let err = ApiError::api(409, "Admission number already exists");
    assert_eq!(err.to_string(), "Admission number already exists");
}
