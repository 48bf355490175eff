use axum_test::{TestResponse, TestServer};
use rusqlite::Connection;
use serde_json::Value;
use time::Date;

use crate::{AppState, build_router, currency::CurrencyCode, timezone::LedgerClock};

/// An app backed by an in-memory database whose clock is stuck on `today`.
pub(crate) fn get_test_state(today: Date) -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(
        connection,
        LedgerClock::Fixed(today),
        CurrencyCode::default(),
    )
    .expect("Could not create app state.")
}

pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::new(build_router(state))
}

#[track_caller]
pub(crate) fn assert_error_contains(response: &TestResponse, text: &str) {
    let body: Value = response.json();
    let message = body["error"]
        .as_str()
        .expect("response body should have an error message");

    assert!(
        message.contains(text),
        "expected error message {message:?} to contain {text:?}"
    );
}
