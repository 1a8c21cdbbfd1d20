mod common;

use anyhow::Result;
use reqwest::StatusCode;

/// The full lifecycle: create a farm, see it in the owner's listing and not
/// in another user's, block deletion while an animal batch exists, then
/// delete bottom-up.
#[tokio::test]
async fn farm_lifecycle_with_dependent_guard() -> Result<()> {
    if !common::db_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_owner, token) = common::register_and_login(&server.base_url).await?;
    let (_other, other_token) = common::register_and_login(&server.base_url).await?;

    let farm_name = common::unique("North Field");
    let resp = client
        .post(format!("{}/api/farms", server.base_url))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "name": farm_name,
            "location": "Back forty",
            "size": "50",
            "farm_type": "Crop",
            "description": "",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK, "{}", resp.text().await?);
    let body: serde_json::Value = resp.json().await?;
    let farm_id = body["data"]["id"].as_i64().expect("farm id");
    assert_eq!(body["data"]["size"], 50.0);

    // Owner sees the farm
    let resp = client
        .get(format!("{}/api/farms", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    let body: serde_json::Value = resp.json().await?;
    let names: Vec<&str> = body["data"]["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert!(names.contains(&farm_name.as_str()));

    // Another user cannot see or fetch it
    let resp = client
        .get(format!("{}/api/farms/{}", server.base_url, farm_id))
        .bearer_auth(&other_token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Register an animal batch on the farm
    let resp = client
        .post(format!("{}/api/animals", server.base_url))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "farm_id": farm_id.to_string(),
            "animal_type": "Cattle",
            "breed": "",
            "purpose": "Dairy",
            "quantity": "12",
            "registration_date": chrono_today(),
            "notes": "",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK, "{}", resp.text().await?);
    let body: serde_json::Value = resp.json().await?;
    let animal_id = body["data"]["id"].as_i64().expect("animal id");

    // Farm deletion is blocked while the batch exists
    let resp = client
        .delete(format!("{}/api/farms/{}", server.base_url, farm_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["code"], "HAS_DEPENDENTS");
    assert_eq!(body["dependents"]["animals"], 1);

    // Delete the batch, then the farm succeeds
    let resp = client
        .delete(format!("{}/api/animals/{}", server.base_url, animal_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .delete(format!("{}/api/farms/{}", server.base_url, farm_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn animal_quantity_bounds_enforced() -> Result<()> {
    if !common::db_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_owner, token) = common::register_and_login(&server.base_url).await?;

    let resp = client
        .post(format!("{}/api/farms", server.base_url))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "name": common::unique("Paddock"),
            "location": "Hillside",
            "size": "12.5",
            "farm_type": "Livestock",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    let farm_id = body["data"]["id"].as_i64().expect("farm id");

    for (quantity, expect_ok) in [("0", false), ("1", true), ("1000", true), ("1001", false)] {
        let resp = client
            .post(format!("{}/api/animals", server.base_url))
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "farm_id": farm_id.to_string(),
                "animal_type": "Sheep",
                "quantity": quantity,
                "registration_date": chrono_today(),
            }))
            .send()
            .await?;
        if expect_ok {
            assert_eq!(resp.status(), StatusCode::OK, "quantity {}", quantity);
        } else {
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "quantity {}", quantity);
            let body: serde_json::Value = resp.json().await?;
            assert!(body["field_errors"]["quantity"].is_string());
        }
    }

    Ok(())
}

#[tokio::test]
async fn animal_rejects_foreign_farm() -> Result<()> {
    if !common::db_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_owner, owner_token) = common::register_and_login(&server.base_url).await?;
    let (_other, other_token) = common::register_and_login(&server.base_url).await?;

    let resp = client
        .post(format!("{}/api/farms", server.base_url))
        .bearer_auth(&owner_token)
        .json(&serde_json::json!({
            "name": common::unique("Orchard"),
            "location": "Valley",
            "size": "3",
            "farm_type": "Mixed",
        }))
        .send()
        .await?;
    let body: serde_json::Value = resp.json().await?;
    let farm_id = body["data"]["id"].as_i64().expect("farm id");

    // A different user selecting that farm id fails the ownership check
    let resp = client
        .post(format!("{}/api/animals", server.base_url))
        .bearer_auth(&other_token)
        .json(&serde_json::json!({
            "farm_id": farm_id.to_string(),
            "animal_type": "Goats",
            "quantity": "4",
            "registration_date": chrono_today(),
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["field_errors"]["farm_id"], "Selected farm was not found");

    Ok(())
}

fn chrono_today() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}
