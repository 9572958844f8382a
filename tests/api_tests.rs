mod common;

use chrono::Duration;
use reqwest::StatusCode;
use serde_json::json;

use zeni::store::RecordStore;

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn api_root_says_hello() {
    let app = common::spawn_app().await;

    let (body, status) = app.get("/api/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Hello World");
}

// ── Status checks ───────────────────────────────────────────────

#[tokio::test]
async fn status_checks_round_trip() {
    let app = common::spawn_app().await;

    let (created, status) = app.post("/api/status", &json!({ "client_name": "monitor" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["client_name"], "monitor");
    assert!(created["id"].is_string());

    let (list, status) = app.get("/api/status").await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], created["id"]);
}

// ── Registration & Login ────────────────────────────────────────

#[tokio::test]
async fn register_and_login() {
    let app = common::spawn_app().await;

    let (body, status) = app.register("Ana", "ana@test.com", "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user_id"].is_string());
    assert_eq!(body["name"], "Ana");

    let (login, status) = app.login("ana@test.com", "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user_id"], body["user_id"]);
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = common::spawn_app().await;
    app.register("Ana", "ana@test.com", "password123").await;

    let (body, status) = app.register("Other", "ana@test.com", "password456").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already"));
}

#[tokio::test]
async fn register_rejects_missing_fields() {
    let app = common::spawn_app().await;

    let (_, status) = app.register("", "ana@test.com", "password123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_never_stores_plaintext() {
    let app = common::spawn_app().await;
    let (body, _) = app.register("Ana", "ana@test.com", "password123").await;

    let user = zeni::db::users::find_by_id(app.store.as_ref(), body["user_id"].as_str().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_ne!(user.password, "password123");
    assert!(user.password.starts_with("$argon2id$"));
}

#[tokio::test]
async fn login_wrong_password_or_unknown_email() {
    let app = common::spawn_app().await;
    app.register("Ana", "ana@test.com", "password123").await;

    let (_, status) = app.login("ana@test.com", "wrongpassword").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, status) = app.login("nobody@test.com", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── User maintenance ────────────────────────────────────────────

#[tokio::test]
async fn update_user_name_and_password() {
    let app = common::spawn_app().await;
    app.register("Ana", "ana@test.com", "password123").await;

    let (_, status) = app
        .put(
            "/api/users/update",
            &json!({ "email": "ana@test.com", "name": "Ana Maria", "password": "newpassword" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (login, status) = app.login("ana@test.com", "newpassword").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["name"], "Ana Maria");
}

#[tokio::test]
async fn update_user_with_nothing_to_change() {
    let app = common::spawn_app().await;
    app.register("Ana", "ana@test.com", "password123").await;

    let (_, status) = app.put("/api/users/update", &json!({ "email": "ana@test.com" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_unknown_user_is_not_found() {
    let app = common::spawn_app().await;

    let (_, status) = app
        .put("/api/users/update", &json!({ "email": "nobody@test.com", "name": "X" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_user_then_delete_again() {
    let app = common::spawn_app().await;
    let (body, _) = app.register("Ana", "ana@test.com", "password123").await;
    let user_id = body["user_id"].as_str().unwrap();

    let (_, status) = app.delete(&format!("/api/users/{user_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.delete(&format!("/api/users/{user_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, status) = app.login("ana@test.com", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Password reset ──────────────────────────────────────────────

#[tokio::test]
async fn forgot_password_does_not_reveal_unknown_email() {
    let app = common::spawn_app().await;
    app.register("Ana", "ana@test.com", "password123").await;

    let (known, status) = app
        .post("/api/forgot-password", &json!({ "email": "ana@test.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (unknown, status) = app
        .post("/api/forgot-password", &json!({ "email": "nobody@test.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(known["message"], unknown["message"]);
    assert!(unknown.get("reset_link").is_none());
}

#[tokio::test]
async fn forgot_password_store_outage_is_a_server_error() {
    let app = common::spawn_app().await;
    app.store.close().await;

    let (body, status) = app
        .post("/api/forgot-password", &json!({ "email": "ana@test.com" }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn reset_link_is_hidden_unless_exposed() {
    let mut config = common::test_config();
    config.expose_reset_link = false;
    let app = common::spawn_app_with(config).await;
    app.register("Ana", "ana@test.com", "password123").await;

    let (body, status) = app
        .post("/api/forgot-password", &json!({ "email": "ana@test.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("reset_link").is_none());
}

#[tokio::test]
async fn reset_link_points_at_frontend() {
    let app = common::spawn_app().await;
    app.register("Ana", "ana@test.com", "password123").await;

    let (body, _) = app
        .post("/api/forgot-password", &json!({ "email": "ana@test.com" }))
        .await;
    assert!(
        body["reset_link"]
            .as_str()
            .unwrap()
            .starts_with("http://localhost:3000/reset-password?token=")
    );
}

#[tokio::test]
async fn full_password_reset_flow() {
    let app = common::spawn_app().await;
    app.register("Ana", "ana@test.com", "oldpassword").await;
    let token = app.reset_token_for("ana@test.com").await;

    app.clock.advance(Duration::minutes(30));
    let (_, status) = app.get(&format!("/api/validate-reset-token/{token}")).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(Duration::minutes(1));
    let (body, status) = app
        .post(
            "/api/reset-password",
            &json!({ "token": token, "new_password": "newpassword", "confirm_password": "newpassword" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "reset failed: {body}");

    let (_, status) = app.login("ana@test.com", "newpassword").await;
    assert_eq!(status, StatusCode::OK);
    let (_, status) = app.login("ana@test.com", "oldpassword").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.clock.advance(Duration::minutes(1));
    let (_, status) = app.get(&format!("/api/validate-reset-token/{token}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_token_cannot_be_replayed() {
    let app = common::spawn_app().await;
    app.register("Ana", "ana@test.com", "oldpassword").await;
    let token = app.reset_token_for("ana@test.com").await;

    let reset = |password: &str| {
        json!({ "token": token, "new_password": password, "confirm_password": password })
    };

    let (_, status) = app.post("/api/reset-password", &reset("firstpassword")).await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app.post("/api/reset-password", &reset("secondpassword")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid or expired"));

    let (_, status) = app.login("ana@test.com", "firstpassword").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn expired_reset_token_is_rejected() {
    let app = common::spawn_app().await;
    app.register("Ana", "ana@test.com", "oldpassword").await;
    let token = app.reset_token_for("ana@test.com").await;

    app.clock.advance(Duration::hours(1));

    let (_, status) = app.get(&format!("/api/validate-reset-token/{token}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app
        .post(
            "/api/reset-password",
            &json!({ "token": token, "new_password": "newpassword", "confirm_password": "newpassword" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app.login("ana@test.com", "oldpassword").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn reset_password_requires_matching_confirmation() {
    let app = common::spawn_app().await;
    app.register("Ana", "ana@test.com", "oldpassword").await;
    let token = app.reset_token_for("ana@test.com").await;

    let (body, status) = app
        .post(
            "/api/reset-password",
            &json!({ "token": token, "new_password": "newpassword", "confirm_password": "different" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("do not match"));

    // The mismatch did not burn the token
    let (_, status) = app.get(&format!("/api/validate-reset-token/{token}")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_token_is_invalid() {
    let app = common::spawn_app().await;

    let (body, status) = app.get("/api/validate-reset-token/not-a-token").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

// ── Chat ────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_echoes_and_keeps_history() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .post(
            "/api/chat",
            &json!({ "session_id": "s1", "user_id": "u1", "message": "hello" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "AI response to: hello");
    assert_eq!(body["session_id"], "s1");

    app.clock.advance(Duration::seconds(5));
    app.post(
        "/api/chat",
        &json!({ "session_id": "s1", "user_id": "u1", "message": "again" }),
    )
    .await;
    app.post(
        "/api/chat",
        &json!({ "session_id": "s2", "user_id": "u1", "message": "elsewhere" }),
    )
    .await;

    let (history, status) = app.get("/api/chat/s1").await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["message"], "hello");
    assert_eq!(history[1]["message"], "again");
}

// ── Workouts ────────────────────────────────────────────────────

#[tokio::test]
async fn workouts_are_saved_per_user() {
    let app = common::spawn_app().await;

    let workout = json!({
        "user_id": "u1",
        "title": "Leg day",
        "category": "strength",
        "exercises": [
            { "name": "Squat", "sets": 5, "reps": 5 },
            { "name": "Lunge", "sets": 3, "reps": 12 }
        ],
        "duration": "45min",
        "difficulty": "intermediate",
        "created_by_ai": true
    });
    let (body, status) = app.post("/api/workouts", &workout).await;
    assert_eq!(status, StatusCode::OK);
    let workout_id = body["workout_id"].as_str().unwrap().to_string();

    let (mine, status) = app.get("/api/workouts/u1").await;
    assert_eq!(status, StatusCode::OK);
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"], workout_id.as_str());
    assert_eq!(mine[0]["exercises"][0]["name"], "Squat");
    assert_eq!(mine[0]["exercises"][1]["reps"], 12);
    assert_eq!(mine[0]["created_by_ai"], true);

    let (theirs, _) = app.get("/api/workouts/u2").await;
    assert!(theirs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn workout_with_duplicate_id_is_rejected() {
    let app = common::spawn_app().await;

    let workout = json!({
        "id": "fixed-id",
        "user_id": "u1",
        "title": "Cardio",
        "category": "endurance",
        "exercises": [],
        "duration": "30min",
        "difficulty": "easy"
    });
    let (_, status) = app.post("/api/workouts", &workout).await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app.post("/api/workouts", &workout).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}
