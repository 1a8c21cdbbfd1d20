mod common;

use std::process::Command;

use anyhow::{Context, Result};
use reqwest::StatusCode;

/// Bootstrap an admin through the CLI, then log in through the API
async fn admin_token(base_url: &str) -> Result<(i64, String)> {
    let username = common::unique("admin");
    let output = Command::new("target/debug/farmctl")
        .args([
            "create-admin",
            "--username",
            &username,
            "--email",
            &format!("{}@example.com", username),
            "--password",
            "adminpass123",
        ])
        .output()
        .context("failed to run farmctl")?;
    anyhow::ensure!(
        output.status.success(),
        "farmctl create-admin failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/auth/login", base_url))
        .json(&serde_json::json!({
            "username": username,
            "password": "adminpass123",
        }))
        .send()
        .await?;
    anyhow::ensure!(resp.status() == StatusCode::OK, "admin login failed");
    let body: serde_json::Value = resp.json().await?;
    let id = body["data"]["user"]["id"].as_i64().context("admin id")?;
    let token = body["data"]["token"].as_str().context("token")?.to_string();
    Ok((id, token))
}

#[tokio::test]
async fn admin_routes_reject_regular_users() -> Result<()> {
    if !common::db_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_user, token) = common::register_and_login(&server.base_url).await?;
    let resp = client
        .get(format!("{}/api/admin/users", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn admin_cannot_change_own_role_or_status() -> Result<()> {
    if !common::db_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (admin_id, token) = admin_token(&server.base_url).await?;

    let resp = client
        .post(format!(
            "{}/api/admin/users/{}/role",
            server.base_url, admin_id
        ))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "role_id": 2 }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .post(format!(
            "{}/api/admin/users/{}/status",
            server.base_url, admin_id
        ))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "status": "blocked" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn contact_message_transition_is_one_way() -> Result<()> {
    if !common::db_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Public contact form
    let resp = client
        .post(format!("{}/contact", server.base_url))
        .json(&serde_json::json!({
            "name": "Visitor",
            "email": "visitor@example.com",
            "subject": common::unique("Question"),
            "message": "How do I register a second farm on one account?",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK, "{}", resp.text().await?);
    let body: serde_json::Value = resp.json().await?;
    let message_id = body["data"]["id"].as_i64().expect("message id");

    let (admin_id, token) = admin_token(&server.base_url).await?;

    // First response succeeds and records the responder
    let resp = client
        .post(format!(
            "{}/api/admin/contact-messages/{}/respond",
            server.base_url, message_id
        ))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "response": "Thanks, resolved" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK, "{}", resp.text().await?);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["data"]["status"], "answered");
    assert_eq!(body["data"]["admin_response"], "Thanks, resolved");
    assert_eq!(body["data"]["responded_by"], admin_id);

    // Second attempt conflicts; the stored response is untouched
    let resp = client
        .post(format!(
            "{}/api/admin/contact-messages/{}/respond",
            server.base_url, message_id
        ))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "response": "Second answer" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    Ok(())
}

#[tokio::test]
async fn protected_settings_survive_bulk_update() -> Result<()> {
    if !common::db_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_admin_id, token) = admin_token(&server.base_url).await?;

    // maintenance_mode is seeded as protected
    let resp = client
        .post(format!("{}/api/admin/settings", server.base_url))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "site_name": "Greenacres",
            "maintenance_mode": "on",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["data"]["skipped_protected"][0], "maintenance_mode");

    let resp = client
        .get(format!("{}/api/admin/settings", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    let body: serde_json::Value = resp.json().await?;
    let settings = body["data"].as_array().expect("settings array");
    let maintenance = settings
        .iter()
        .find(|s| s["setting_key"] == "maintenance_mode")
        .expect("maintenance_mode row");
    assert_eq!(maintenance["setting_value"], "off");
    let site_name = settings
        .iter()
        .find(|s| s["setting_key"] == "site_name")
        .expect("site_name row");
    assert_eq!(site_name["setting_value"], "Greenacres");

    Ok(())
}
