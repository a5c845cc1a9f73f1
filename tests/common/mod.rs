#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode, header},
};
use chrono::NaiveDate;
use crm_backend::db::{
    entities::{reminder, task, user},
    schema,
    services::{reminder_service, task_service, user_service},
};
use crm_backend::permissions::Role;
use crm_backend::server::config::ServerConfig;
use crm_backend::web::{self, models::Claims, views::Views};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{Database, DatabaseConnection};
use tempfile::TempDir;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    _dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("crm.db").display());
    let db = Database::connect(db_url.as_str()).await.unwrap();
    schema::ensure_schema(&db).await.unwrap();

    let mut config = ServerConfig::new(db_url, JWT_SECRET);
    config.per_page = 2;
    let router = web::create_axum_router(db.clone(), Arc::new(config), Arc::new(Views::new().unwrap()));

    TestApp { router, db, _dir: dir }
}

impl TestApp {
    pub async fn user(&self, username: &str, role: Role) -> user::Model {
        let role = serde_json::to_value(role).unwrap();
        user_service::create_user(&self.db, username, role.as_str().unwrap(), "auto")
            .await
            .unwrap()
    }

    pub async fn reminder(&self, owner: &user::Model, title: &str, tags: &[&str]) -> reminder::Model {
        reminder_service::create_reminder(
            &self.db,
            owner.id,
            reminder_service::ReminderInput {
                title: title.to_string(),
                description: format!("{title} details"),
                reminder_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                resource_type: None,
                resource_id: None,
            },
            tags.iter().map(|t| t.to_string()).collect(),
        )
        .await
        .unwrap()
    }

    pub async fn task(&self, owner: &user::Model, title: &str) -> task::Model {
        task_service::create_task(&self.db, owner.id, title, "", None).await.unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.send(request).await;
        let value = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }
}

pub fn token_for(user: &user::Model) -> String {
    let claims = Claims {
        sub: user.username.clone(),
        user_id: user.id,
        role: Role::parse(&user.role),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
}

/// A request as the CRM front end sends it: bearer token, ajax header and
/// an optional url-encoded form body.
pub fn ajax(method: &str, uri: &str, user: &user::Model, form: &[(&str, &str)]) -> Request<Body> {
    let body = serde_urlencoded::to_string(form).unwrap();
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(user)))
        .header("X-Requested-With", "XMLHttpRequest")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

/// A plain browser page request.
pub fn page(uri: &str, user: &user::Model) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(user)))
        .body(Body::empty())
        .unwrap()
}

pub fn titles(tags: &serde_json::Value) -> Vec<String> {
    tags.as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect()
}
