//! Account endpoints against a real database
//!
//! Requires `DATABASE_URL`; run with `cargo test -- --ignored`.

mod common;

use axum::http::{Method, StatusCode};
use common::{request, TestContext};
use serde_json::json;

#[tokio::test]
#[ignore]
async fn test_register_rejects_taken_email_and_username() {
    let ctx = TestContext::new().await.unwrap();

    let cases = [
        (
            json!({
                "username": format!("fresh-{}", ctx.tag),
                "email": ctx.customer.email.to_uppercase(),
                "password": "Sup3r-secret-pass"
            }),
            "Email is already registered",
        ),
        (
            json!({
                "username": ctx.customer.username.clone(),
                "email": format!("fresh-{}@example.com", ctx.tag),
                "password": "Sup3r-secret-pass"
            }),
            "Username is already taken",
        ),
    ];

    for (payload, message) in cases {
        let (status, body) = ctx
            .send(request(Method::POST, "/api/auth/register", None, Some(payload)))
            .await;

        assert_eq!(status, StatusCode::CONFLICT, "{}", body);
        assert_eq!(body["error"], "conflict");
        assert_eq!(body["message"], message);
    }

    ctx.cleanup().await.unwrap();
}
