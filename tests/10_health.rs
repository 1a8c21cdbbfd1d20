mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn root_and_health_respond() -> Result<()> {
    if !common::db_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/", server.base_url)).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Farmstead API");

    let resp = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["data"]["database"], "ok");

    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_token() -> Result<()> {
    if !common::db_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/farms", server.base_url))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
