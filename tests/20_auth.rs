mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn register_login_whoami_round_trip() -> Result<()> {
    if !common::db_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (username, token) = common::register_and_login(&server.base_url).await?;

    let resp = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["data"]["username"], username.as_str());
    assert_eq!(body["data"]["role_name"], "user");
    assert_eq!(body["data"]["status"], "active");

    Ok(())
}

#[tokio::test]
async fn login_rejects_wrong_password() -> Result<()> {
    if !common::db_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (username, _token) = common::register_and_login(&server.base_url).await?;

    let resp = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&serde_json::json!({
            "username": username,
            "password": "wrong-password",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn register_validates_fields_independently() -> Result<()> {
    if !common::db_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&serde_json::json!({
            "username": "x",
            "email": "not-an-email",
            "name": "",
            "password": "short",
            "password_confirm": "different",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let field_errors = body["field_errors"].as_object().expect("field_errors map");
    assert!(field_errors.contains_key("username"));
    assert!(field_errors.contains_key("email"));
    assert!(field_errors.contains_key("name"));
    assert!(field_errors.contains_key("password"));
    assert!(field_errors.contains_key("password_confirm"));

    Ok(())
}
