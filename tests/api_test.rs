// HTTP surface over the in-memory store

mod common;

use axum::http::StatusCode;
use common::{sample_payload, setup_test_app, with_field, TestApp};
use convertly_core::models::User;
use convertly_core::EntityStore;
use serde_json::{json, Value};

async fn create(app: &TestApp, uri: &str, body: Value) -> Value {
    let response = app.post(uri).json(&body).send().await;
    assert_eq!(response.status(), StatusCode::CREATED, "POST {}", uri);
    response.json().await
}

async fn seed_user_and_funnel(app: &TestApp) {
    create(app, "/v1/users", sample_payload("users")).await;
    create(app, "/v1/funnels", sample_payload("funnels")).await;
}

#[tokio::test]
async fn test_create_user_hashes_password() {
    let app = setup_test_app();

    let body = create(&app, "/v1/users", sample_payload("users")).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["account_type"], "Free");
    assert!(body.get("password").is_none());

    let stored: User = app.store.get::<User>(1).await.unwrap();
    assert!(stored.password.starts_with("$argon2id$"));
    assert_ne!(stored.password, "s3cret-engine");
}

#[tokio::test]
async fn test_validation_error_shape() {
    let app = setup_test_app();

    let response = app
        .post("/v1/users")
        .json(&json!({"username": "", "email": "not-an-email", "id": 4}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json().await;
    assert_eq!(body["error"], "validation");
    let fields = body["fields"].as_object().unwrap();
    for field in ["password", "email", "id"] {
        assert!(fields.contains_key(field), "missing report for {}", field);
    }
    assert_eq!(app.store.count("users").await, 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = setup_test_app();

    let response = app
        .post("/v1/funnels")
        .header("content-type", "application/json")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_missing_parent_and_duplicates_conflict() {
    let app = setup_test_app();

    let response = app.post("/v1/pages").json(&sample_payload("pages")).send().await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "referential");

    seed_user_and_funnel(&app).await;
    create(&app, "/v1/pages", sample_payload("pages")).await;

    let response = app.post("/v1/pages").json(&sample_payload("pages")).send().await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "constraint");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("pages_funnel_id_order_key"));
}

#[tokio::test]
async fn test_fetch_and_delete() {
    let app = setup_test_app();
    seed_user_and_funnel(&app).await;

    let response = app.get("/v1/funnels/1").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    let funnel: Value = response.json().await;
    assert_eq!(funnel["status"], "draft");

    let response = app.get("/v1/funnels/9").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "not_found");

    let response = app.delete("/v1/users/1").send().await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let funnel: Value = app.get("/v1/funnels/1").send().await.json().await;
    assert!(funnel["user_id"].is_null());

    let response = app.delete("/v1/users/1").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_traversal() {
    let app = setup_test_app();
    seed_user_and_funnel(&app).await;
    for order in [1, 0] {
        let page = with_field(sample_payload("pages"), "order", json!(order));
        create(&app, "/v1/pages", page).await;
    }
    create(&app, "/v1/user-profiles", sample_payload("user_profiles")).await;

    let pages: Vec<Value> = app.get("/v1/funnels/1/pages").send().await.json().await;
    let orders: Vec<i64> = pages.iter().map(|p| p["order"].as_i64().unwrap()).collect();
    assert_eq!(orders, vec![0, 1]);

    let funnels: Vec<Value> = app.get("/v1/users/1/funnels").send().await.json().await;
    assert_eq!(funnels.len(), 1);

    let profile: Value = app.get("/v1/users/1/profile").send().await.json().await;
    assert_eq!(profile["plan_tier"], "pro");
    assert_eq!(profile["open_rate"], "42.50");

    let response = app.get("/v1/users/7/funnels").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lead_queries() {
    let app = setup_test_app();
    seed_user_and_funnel(&app).await;

    let leads = [
        ("Linus", "linus@example.com", "new", 30),
        ("Grace", "grace@navy.mil", "qualified", 90),
        ("Alan", "alan@example.com", "qualified", 60),
    ];
    for (name, email, status, score) in leads {
        create(
            &app,
            "/v1/leads",
            json!({"name": name, "email": email, "status": status, "score": score}),
        )
        .await;
    }

    let qualified: Vec<Value> = app
        .get("/v1/leads?status=qualified&sort=score")
        .send()
        .await
        .json()
        .await;
    let names: Vec<&str> = qualified.iter().map(|l| l["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Grace", "Alan"]);

    let found: Vec<Value> = app.get("/v1/leads?search=EXAMPLE&sort=name").send().await.json().await;
    let names: Vec<&str> = found.iter().map(|l| l["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Alan", "Linus"]);

    let summary: Value = app.get("/v1/leads/summary").send().await.json().await;
    assert_eq!(summary["total"], 3);
    assert_eq!(summary["by_status"]["qualified"], 2);
    assert_eq!(summary["by_status"]["converted"], 0);
    assert_eq!(summary["average_score"], 60.0);

    let response = app.get("/v1/leads?status=bogus").send().await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_tag_filter() {
    let app = setup_test_app();
    create(&app, "/v1/users", sample_payload("users")).await;
    create(&app, "/v1/email-contacts", sample_payload("email_contacts")).await;
    create(
        &app,
        "/v1/email-contacts",
        json!({"email": "katherine@example.com", "tags": ["newsletter"]}),
    )
    .await;

    let vip: Vec<Value> = app.get("/v1/email-contacts?tag=VIP").send().await.json().await;
    assert_eq!(vip.len(), 1);
    assert_eq!(vip[0]["email"], "margaret@example.com");

    let all: Vec<Value> = app.get("/v1/email-contacts").send().await.json().await;
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_lead_magnet_downloads() {
    let app = setup_test_app();
    seed_user_and_funnel(&app).await;
    create(&app, "/v1/pages", sample_payload("pages")).await;
    create(&app, "/v1/lead-magnets", sample_payload("lead_magnets")).await;

    for expected in 1..=3 {
        let response = app.post("/v1/lead-magnets/1/downloads").send().await;
        assert_eq!(response.status(), StatusCode::OK);
        let magnet: Value = response.json().await;
        assert_eq!(magnet["downloads"], expected);
    }

    let response = app.post("/v1/lead-magnets/2/downloads").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_draft_lifecycle_and_promotion() {
    let app = setup_test_app();
    create(&app, "/v1/users", sample_payload("users")).await;

    let draft = create(
        &app,
        "/v1/email-drafts",
        json!({"name": "October news", "subject": "What shipped"}),
    )
    .await;
    let id = draft["id"].as_u64().unwrap();

    let response = app
        .put(&format!("/v1/email-drafts/{}", id))
        .json(&json!({"name": "October news", "subject": "What shipped", "content": {"blocks": [1]}}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post(&format!("/v1/email-drafts/{}/promote", id))
        .json(&json!({"user_id": 1}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let template: Value = response.json().await;
    assert_eq!(template["category"], "draft");
    assert_eq!(template["subject"], "What shipped");
    assert_eq!(template["content"], json!({"blocks": [1]}));
    assert_eq!(template["is_public"], false);
    assert_eq!(app.store.count("email_templates").await, 1);

    let response = app.delete(&format!("/v1/email-drafts/{}", id)).send().await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.get(&format!("/v1/email-drafts/{}", id)).send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_draft_bodies_use_error_shape() {
    let app = setup_test_app();

    let response = app
        .post("/v1/email-drafts")
        .header("content-type", "application/json")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "bad_request");

    let response = app
        .post("/v1/email-drafts")
        .json(&json!({"subject": "No name"}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].as_str().unwrap().contains("name"));

    create(&app, "/v1/email-drafts", json!({"name": "Kept"})).await;
    let response = app
        .put("/v1/email-drafts/1")
        .json(&json!({"name": 42}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "bad_request");

    let response = app
        .post("/v1/email-drafts/1/promote")
        .json(&json!({"user_id": "one"}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_test_app();

    let response = app.get("/health").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["store"]["backend"], "memory");
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = setup_test_app();

    let response = app
        .options("/v1/funnels")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.header("access-control-allow-origin").as_deref(),
        Some("http://localhost:5173")
    );
    assert!(response
        .header("access-control-allow-methods")
        .unwrap()
        .contains("DELETE"));

    let response = app
        .get("/health")
        .header("origin", "https://evil.example")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.header("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_cors_headers_on_simple_requests() {
    let app = setup_test_app();

    let response = app
        .post("/v1/users")
        .header("origin", "http://localhost:5173")
        .json(&sample_payload("users"))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.header("access-control-allow-origin").as_deref(),
        Some("http://localhost:5173")
    );
    assert_eq!(response.header("vary").as_deref(), Some("origin"));
}
