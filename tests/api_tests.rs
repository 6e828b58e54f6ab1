// tests/api_tests.rs

mod common;

use common::{admin_token, spawn_app};

#[tokio::test]
async fn unknown_route_returns_404() {
    // Arrange
    let Some((address, _pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn login_rejects_unknown_user() {
    let Some((address, _pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": format!("ghost_{}", &uuid::Uuid::new_v4().to_string()[..8]),
            "password": "whatever"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn login_validates_payload() {
    let Some((address, _pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    // Empty username fails validation before any database access
    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": "",
            "password": "whatever"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let Some((address, _pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/token", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn login_returns_bearer_token() {
    let Some((address, pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let username = format!("op_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let hashed = exam_admin::utils::hash::hash_password("password123").unwrap();
    sqlx::query("INSERT INTO users (username, password, role) VALUES ($1, $2, 'operator')")
        .bind(&username)
        .bind(&hashed)
        .execute(&pool)
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": username,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    assert_eq!(response["type"], "Bearer");
    assert_eq!(response["role"], "operator");
    assert!(response["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn token_rotation_flow() {
    // Arrange
    let Some((address, pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let token = admin_token(&pool).await;
    let code_pattern = regex::Regex::new("^[A-Z0-9]{6}$").unwrap();

    // The seeded row must be readable before any rotation
    let before = client
        .get(format!("{}/api/token", address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to read token")
        .json::<serde_json::Value>()
        .await
        .unwrap();
    let old_code = before["code"].as_str().unwrap().to_string();

    // Reading twice without rotating must not change anything
    let again = client
        .get(format!("{}/api/token", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(before, again);

    // Act
    let rotated = client
        .post(format!("{}/api/token/rotate", address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to rotate token")
        .json::<serde_json::Value>()
        .await
        .unwrap();

    // Assert
    let new_code = rotated["code"].as_str().unwrap();
    assert!(code_pattern.is_match(new_code), "unexpected code: {}", new_code);
    assert_eq!(rotated["previous_code"].as_str().unwrap(), old_code);

    let after = client
        .get(format!("{}/api/token", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(after["code"].as_str().unwrap(), new_code);

    let before_ts: chrono::DateTime<chrono::Utc> =
        before["updated_at"].as_str().unwrap().parse().unwrap();
    let after_ts: chrono::DateTime<chrono::Utc> =
        after["updated_at"].as_str().unwrap().parse().unwrap();
    assert!(after_ts >= before_ts);
}

#[tokio::test]
async fn question_crud_flow() {
    let Some((address, pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let token = admin_token(&pool).await;

    // Create, with markup that must be sanitized away
    let created = client
        .post(format!("{}/api/questions", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "question_type": "single",
            "content": "<p>Which planet is closest to the sun?</p><script>alert(1)</script>",
            "options": ["Mercury", "Venus", "Earth", "Mars"],
            "answer": "Mercury",
            "explanation": "Mercury orbits closest."
        }))
        .send()
        .await
        .expect("Failed to create question");
    assert_eq!(created.status().as_u16(), 201);
    let id = created.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    // Read back
    let fetched = client
        .get(format!("{}/api/questions/{}", address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    let content = fetched["content"].as_str().unwrap();
    assert!(content.contains("closest to the sun"));
    assert!(!content.contains("<script>"));

    // Update
    let updated = client
        .put(format!("{}/api/questions/{}", address, id))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "answer": "Mercury!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status().as_u16(), 200);

    // Delete
    let deleted = client
        .delete(format!("{}/api/questions/{}", address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    let gone = client
        .get(format!("{}/api/questions/{}", address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);
}

#[tokio::test]
async fn schedule_carries_derived_status() {
    let Some((address, pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let token = admin_token(&pool).await;

    // A schedule without a window has not been planned yet
    let created = client
        .post(format!("{}/api/schedules", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "quota": 30 }))
        .send()
        .await
        .expect("Failed to create schedule");
    assert_eq!(created.status().as_u16(), 201);
    let id = created.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    let fetched = client
        .get(format!("{}/api/schedules/{}", address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(fetched["status"], "not_scheduled");

    // Filling in a window in the far future flips it to scheduled
    let updated = client
        .put(format!("{}/api/schedules/{}", address, id))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "exam_date": "2099-01-01",
            "start_time": "08:00:00",
            "end_time": "10:00:00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status().as_u16(), 200);

    let fetched = client
        .get(format!("{}/api/schedules/{}", address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(fetched["status"], "scheduled");
}
