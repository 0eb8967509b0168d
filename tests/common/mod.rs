// Common test utilities shared across the integration tests
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use convertly_core::{
    build_router,
    repository::InMemoryListRepository,
    AppState, CorsPolicy, DraftLibrary, EmailDraft, MemoryStore,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower::util::ServiceExt;

/// A valid insert payload for every table, referencing row id 1 of each parent
pub fn sample_payload(table: &str) -> Value {
    match table {
        "users" => json!({
            "username": "ada",
            "password": "s3cret-engine",
            "email": "ada@example.com",
            "name": "Ada Lovelace",
            "phone": "+44 20 7946 0958"
        }),
        "user_profiles" => json!({
            "user_id": 1,
            "company_name": "Analytical Engines",
            "open_rate": "42.50",
            "feature_access": ["ai_writer"],
            "plan_tier": "pro",
            "webhook_url": "https://hooks.example.com/convertly"
        }),
        "billing_history" => json!({
            "user_id": 1,
            "subscription_type": "pro_monthly",
            "amount": "49.00",
            "currency": "USD",
            "status": "paid"
        }),
        "team_members" => json!({
            "user_id": 1,
            "email": "grace@example.com",
            "role": "editor",
            "permissions": ["funnels:write"]
        }),
        "funnels" => json!({
            "user_id": 1,
            "name": "Spring webinar",
            "funnel_type": "webinar",
            "settings": {"theme": "light"}
        }),
        "pages" => json!({
            "funnel_id": 1,
            "name": "Register",
            "page_type": "optin",
            "order": 0,
            "url": "https://example.com/register",
            "content": {"headline": "Join us"}
        }),
        "lead_magnets" => json!({
            "user_id": 1,
            "page_id": 1,
            "name": "Launch checklist",
            "magnet_type": "checklist",
            "status": "active"
        }),
        "leads" => json!({
            "user_id": 1,
            "funnel_id": 1,
            "name": "Linus",
            "email": "linus@example.com",
            "source": "webinar",
            "score": 30
        }),
        "templates" => json!({
            "user_id": 1,
            "name": "Webinar funnel",
            "category": "funnel",
            "template_type": "webinar",
            "content": {"pages": []},
            "is_public": false
        }),
        "email_campaigns" => json!({
            "user_id": 1,
            "name": "Launch",
            "subject": "We are live",
            "content": {"blocks": []},
            "status": "scheduled",
            "scheduled_at": "2026-11-01T09:00:00Z"
        }),
        "email_templates" => json!({
            "user_id": 1,
            "name": "Newsletter",
            "content": {"blocks": []}
        }),
        "email_contacts" => json!({
            "user_id": 1,
            "email": "margaret@example.com",
            "first_name": "Margaret",
            "last_name": "Hamilton",
            "tags": ["vip"]
        }),
        "email_automations" => json!({
            "user_id": 1,
            "name": "Welcome series",
            "trigger_type": "signup",
            "steps": [{"delay_days": 0, "template_id": 1}]
        }),
        "email_sends" => json!({
            "campaign_id": 1,
            "contact_id": 1,
            "metadata": {"provider": "smtp"}
        }),
        other => panic!("no sample payload for {}", other),
    }
}

/// A payload with `key` set to `value`
pub fn with_field(mut payload: Value, key: &str, value: Value) -> Value {
    payload
        .as_object_mut()
        .expect("sample payloads are objects")
        .insert(key.to_string(), value);
    payload
}

/// Test application over a fresh in-memory store
pub struct TestApp {
    pub app: Router,
    pub store: MemoryStore,
}

impl TestApp {
    pub fn post(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "POST", uri)
    }

    pub fn get(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "GET", uri)
    }

    pub fn put(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "PUT", uri)
    }

    pub fn delete(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "DELETE", uri)
    }

    pub fn options(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "OPTIONS", uri)
    }
}

pub struct TestRequest<'a> {
    app: &'a TestApp,
    request: Request<Body>,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: &str, uri: &str) -> Self {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        Self { app, request }
    }

    /// Add JSON body to request
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        let body_bytes = serde_json::to_vec(body).unwrap();
        *self.request.body_mut() = Body::from(body_bytes);
        self.request
            .headers_mut()
            .insert("content-type", "application/json".parse().unwrap());
        self
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.request
            .headers_mut()
            .insert(name, value.parse().unwrap());
        self
    }

    pub async fn send(self) -> TestResponse {
        let response = self.app.app.clone().oneshot(self.request).await.unwrap();
        TestResponse { response }
    }
}

pub struct TestResponse {
    response: Response<Body>,
}

impl TestResponse {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    pub async fn json<T: serde::de::DeserializeOwned>(self) -> T {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }
}

/// Router over a fresh memory store and an in-memory draft library
pub fn setup_test_app() -> TestApp {
    let store = MemoryStore::new();
    let drafts = DraftLibrary::new(Arc::new(InMemoryListRepository::<EmailDraft>::new(
        Vec::new(),
    )));
    let state = AppState {
        store: Arc::new(store.clone()),
        drafts,
    };
    let cors = CorsPolicy::new(vec!["http://localhost:5173".to_string()], false);

    TestApp {
        app: build_router(state, cors),
        store,
    }
}
