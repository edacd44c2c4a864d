//! VrchatClient against a mock VRChat API over real TCP.

mod common;

use serde_json::json;

use common::{client_for, start_mock_vrchat, MockResponse};
use vrc_age_relay::upstream::{LoginOutcome, UpstreamError, VrchatApi};

#[tokio::test]
async fn test_login_sends_basic_auth_and_captures_cookie() {
    let (base, log) = start_mock_vrchat(|_| {
        MockResponse::json(200, json!({ "id": "usr_bot", "displayName": "RelayBot" }))
            .with_cookie("auth=authcookie_abc; Path=/; HttpOnly")
    })
    .await;
    let client = client_for(&base);

    let outcome = client.login("bot user", "secret").await.unwrap();

    match outcome {
        LoginOutcome::Authenticated(user) => assert_eq!(user.display_name, "RelayBot"),
        other => panic!("expected authenticated, got {:?}", other),
    }
    assert_eq!(client.auth_cookies().auth.as_deref(), Some("authcookie_abc"));

    let requests = log.lock().unwrap();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path(), "/auth/user");
    assert!(requests[0].header("authorization").unwrap().starts_with("Basic "));
}

#[tokio::test]
async fn test_two_factor_flow_carries_both_cookies() {
    let (base, log) = start_mock_vrchat(|req| match req.path() {
        "/auth/user" if req.header("cookie").is_none() => {
            MockResponse::json(200, json!({ "requiresTwoFactorAuth": ["totp", "otp"] }))
                .with_cookie("auth=authcookie_abc; Path=/")
        }
        "/auth/twofactorauth/totp/verify" => MockResponse::json(200, json!({ "verified": true }))
            .with_cookie("twoFactorAuth=tfa_xyz; Path=/"),
        _ => MockResponse::json(200, json!({ "id": "usr_bot", "displayName": "RelayBot" })),
    })
    .await;
    let client = client_for(&base);

    let outcome = client.login("bot", "secret").await.unwrap();
    assert_eq!(
        outcome,
        LoginOutcome::TwoFactorRequired(vec!["totp".to_string(), "otp".to_string()])
    );

    assert!(client.verify_totp("123456").await.unwrap());
    let outcome = client.current_user().await.unwrap();
    assert!(matches!(outcome, LoginOutcome::Authenticated(_)));

    let requests = log.lock().unwrap();
    let verify = &requests[1];
    assert_eq!(verify.method, "POST");
    assert_eq!(verify.header("cookie"), Some("auth=authcookie_abc"));
    let body: serde_json::Value = serde_json::from_str(&verify.body).unwrap();
    assert_eq!(body, json!({ "code": "123456" }));

    assert_eq!(
        requests[2].header("cookie"),
        Some("auth=authcookie_abc; twoFactorAuth=tfa_xyz")
    );
}

#[tokio::test]
async fn test_search_is_exact_and_sized() {
    let (base, log) = start_mock_vrchat(|_| {
        MockResponse::json(
            200,
            json!([
                { "id": "usr_1", "displayName": "Alice Smith", "bio": "ignored" },
                { "id": "usr_2", "displayName": "alice smith" }
            ]),
        )
    })
    .await;
    let client = client_for(&base);

    let hits = client.search_users("Alice Smith", 100).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "usr_1");
    let requests = log.lock().unwrap();
    assert_eq!(requests[0].path(), "/users");
    assert_eq!(requests[0].query("search").as_deref(), Some("Alice Smith"));
    assert_eq!(requests[0].query("n").as_deref(), Some("100"));
    assert_eq!(requests[0].query("fuzzy").as_deref(), Some("false"));
}

#[tokio::test]
async fn test_get_user_reads_age_status() {
    let (base, log) = start_mock_vrchat(|_| {
        MockResponse::json(
            200,
            json!({ "id": "usr_1", "displayName": "ExampleUser", "ageVerificationStatus": "18+" }),
        )
    })
    .await;
    let client = client_for(&base);

    let profile = client.get_user("usr_1").await.unwrap();

    assert_eq!(profile.age_verification_status.as_deref(), Some("18+"));
    assert_eq!(log.lock().unwrap()[0].path(), "/users/usr_1");
}

#[tokio::test]
async fn test_missing_age_status_is_none() {
    let (base, _log) = start_mock_vrchat(|_| {
        MockResponse::json(200, json!({ "id": "usr_1", "displayName": "Quiet" }))
    })
    .await;
    let client = client_for(&base);

    let profile = client.get_user("usr_1").await.unwrap();
    assert!(profile.age_verification_status.is_none());
}

#[tokio::test]
async fn test_status_errors_are_classified() {
    let (base, _log) = start_mock_vrchat(|req| match req.query("search").as_deref() {
        Some("busy") => MockResponse::json(
            429,
            json!({ "error": { "message": "Too many requests", "status_code": 429 } }),
        ),
        Some("broken") => MockResponse::json(
            500,
            json!({ "error": { "message": "boom", "status_code": 500 } }),
        ),
        _ => MockResponse::raw(502, "<html>bad gateway</html>"),
    })
    .await;
    let client = client_for(&base);

    assert_eq!(
        client.search_users("busy", 10).await.unwrap_err(),
        UpstreamError::RateLimited {
            message: "Too many requests".to_string()
        }
    );
    assert_eq!(
        client.search_users("broken", 10).await.unwrap_err(),
        UpstreamError::Status {
            status: 500,
            message: "boom".to_string()
        }
    );
    assert_eq!(
        client.search_users("other", 10).await.unwrap_err(),
        UpstreamError::Status {
            status: 502,
            message: "Bad Gateway".to_string()
        }
    );
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let (base, _log) = start_mock_vrchat(|_| MockResponse::raw(200, "not json")).await;
    let client = client_for(&base);

    let err = client.search_users("Alice", 10).await.unwrap_err();
    assert!(matches!(err, UpstreamError::Decode(_)), "{:?}", err);
}
