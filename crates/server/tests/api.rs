use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use engine::{Actor, Engine, NewProfileCmd, Role};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use server::{ServerState, router};
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    engine: Arc<Engine>,
}

async fn app() -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Arc::new(Engine::builder().database(db).build().await.unwrap());
    let router = router(ServerState {
        engine: engine.clone(),
    });
    TestApp { router, engine }
}

impl TestApp {
    async fn user(&self, username: &str, role: Role) -> Uuid {
        let system = Actor::system();
        let profile = self
            .engine
            .create_profile(&system, NewProfileCmd::new(username, role))
            .await
            .unwrap();
        self.engine
            .create_user(&system, username, "secret", profile.id)
            .await
            .unwrap();
        profile.id
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        username: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(username) = username {
            let token = STANDARD.encode(format!("{username}:secret"));
            request = request.header(header::AUTHORIZATION, format!("Basic {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn json(
        &self,
        method: &str,
        uri: &str,
        username: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, Some(username), body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn requests_without_valid_credentials_are_rejected() {
    let app = app().await;
    app.user("admin", Role::Admin).await;

    let (status, _) = app.send("GET", "/me/views", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = STANDARD.encode("admin:wrong");
    let request = Request::builder()
        .uri("/me/views")
        .header(header::AUTHORIZATION, format!("Basic {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn views_follow_the_role_table() {
    let app = app().await;
    let id = app.user("mum", Role::Parent).await;

    let (status, body) = app.json("GET", "/me/views", "mum", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "mum");
    assert_eq!(body["profile_id"], id.to_string());
    assert_eq!(body["role"], "parent");
    assert_eq!(
        body["views"],
        json!(["dashboard", "wallet", "meals", "fees", "schedule"])
    );
}

#[tokio::test]
async fn wallet_debits_report_the_available_balance() {
    let app = app().await;
    app.user("canteen", Role::Canteen).await;
    let student = app.user("ali", Role::Student).await;

    let (status, entry) = app
        .json(
            "POST",
            &format!("/wallets/{student}/top-up"),
            "canteen",
            Some(json!({ "amount_minor": 100_000, "description": "cash" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["balance_after_minor"], 100_000);

    let (status, entry) = app
        .json(
            "POST",
            &format!("/wallets/{student}/debit"),
            "canteen",
            Some(json!({ "amount_minor": 40_000, "description": "lunch" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["amount_minor"], -40_000);

    let (status, error) = app
        .json(
            "POST",
            &format!("/wallets/{student}/debit"),
            "canteen",
            Some(json!({ "amount_minor": 150_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["available_minor"], 60_000);

    let (status, wallet) = app
        .json("GET", &format!("/wallets/{student}"), "ali", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wallet["balance_minor"], 60_000);
    assert_eq!(wallet["currency"], "OMR");

    let (status, _) = app
        .json(
            "POST",
            &format!("/wallets/{student}/debit"),
            "ali",
            Some(json!({ "amount_minor": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn transactions_round_trip_through_the_api() {
    let app = app().await;
    app.user("finance", Role::Finance).await;

    let (status, created) = app
        .json(
            "POST",
            "/transactions",
            "finance",
            Some(json!({
                "kind": "income",
                "category": " Tuition ",
                "amount_minor": 100_000,
                "occurred_at": "2026-03-10T09:00:00+04:00"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["category"], "tuition");
    assert_eq!(created["status"], "completed");
    assert_eq!(created["occurred_at"], "2026-03-10T05:00:00Z");

    let (status, page) = app
        .json("GET", "/transactions?kind=income&limit=10", "finance", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["transactions"].as_array().unwrap().len(), 1);
    assert_eq!(page["next_cursor"], Value::Null);

    let (status, _) = app
        .json("GET", "/transactions?cursor=not-a-cursor", "finance", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(
            "GET",
            &format!("/transactions/{}", Uuid::new_v4()),
            "finance",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, summary) = app
        .json("GET", "/reports/summary", "finance", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["totals"]["revenue_minor"], 100_000);
    assert_eq!(summary["by_month"]["2026-03"]["net_minor"], 100_000);
}

#[tokio::test]
async fn csv_export_is_served_as_an_attachment() {
    let app = app().await;
    app.user("finance", Role::Finance).await;
    app.user("teacher", Role::Teacher).await;

    let request = Request::builder()
        .uri("/reports/transactions.csv")
        .header(
            header::AUTHORIZATION,
            format!("Basic {}", STANDARD.encode("finance:secret")),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.starts_with("id,occurred_at,kind,category,amount"));

    let (status, _) = app
        .send("GET", "/reports/transactions.csv", Some("teacher"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
