//! End-to-end flows against a real Postgres. Each test returns early when
//! `TEST_DATABASE_URL` is not set.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use solvia::{
    app::build_app,
    auth::{
        jwt::JwtKeys,
        password::hash_password,
        repo_types::{NewUser, Role, User},
    },
    config::AppConfig,
    mail::{LogMailer, Mailer},
    state::AppState,
    storage::DiskStorage,
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

const ADMIN_PASSWORD: &str = "admin-password";

struct Harness {
    app: Router,
    keys: JwtKeys,
    admin_email: String,
    admin_token: String,
}

async fn harness() -> Option<Harness> {
    harness_with(Arc::new(LogMailer)).await
}

async fn harness_with(mailer: Arc<dyn Mailer>) -> Option<Harness> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return None;
        }
    };
    let db = PgPoolOptions::new().max_connections(5).connect(&url).await.unwrap();
    sqlx::migrate!("./migrations").run(&db).await.unwrap();

    let mut config = AppConfig::for_tests();
    config.database_url = url;
    let storage = DiskStorage::new(config.upload_dir.clone()).await.unwrap();
    let keys = JwtKeys::from_config(&config.jwt);

    let admin_email = unique_email("admin");
    let hash = hash_password(ADMIN_PASSWORD).await.unwrap();
    let admin = User::create(
        &db,
        NewUser {
            name: "Admin",
            email: &admin_email,
            password_hash: &hash,
            role: Role::Admin,
            description: None,
            birth_date: None,
        },
    )
    .await
    .unwrap();
    let admin_token = keys.sign(admin.id, Role::Admin).unwrap();

    let state = AppState::from_parts(db, Arc::new(config), Arc::new(storage), mailer);
    Some(Harness {
        app: build_app(state),
        keys,
        admin_email,
        admin_token,
    })
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@solvia.test", Uuid::new_v4().simple())
}

async fn send(app: &Router, method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn id_of(v: &Value) -> String {
    v["id"].as_str().unwrap().to_string()
}

/// Registers a self-service user and returns (user id, token).
async fn register(h: &Harness, role: &str) -> (String, String) {
    let body = json!({
        "name": format!("Usuario {role}"),
        "email": unique_email(role),
        "password": "password-123",
        "role": role,
    });
    let (status, v) = send(&h.app, Method::POST, "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{v}");
    (id_of(&v["user"]), v["token"].as_str().unwrap().to_string())
}

async fn coordinator_and_program(h: &Harness) -> (String, String) {
    let body = json!({
        "name": "Coordinadora",
        "email": unique_email("coord"),
        "password": "password-123",
        "role": "coordinator",
    });
    let (status, coord) = send(&h.app, Method::POST, "/api/admin/users", Some(&h.admin_token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{coord}");

    let body = json!({
        "name": format!("Programa {}", Uuid::new_v4().simple()),
        "start_date": "2024-01-01",
        "coordinator_charge": coord["id"],
    });
    let (status, program) = send(&h.app, Method::POST, "/api/admin/programs", Some(&h.admin_token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{program}");
    (id_of(&coord), id_of(&program))
}

#[tokio::test]
async fn login_reports_unknown_email_and_wrong_password() {
    let Some(h) = harness().await else { return };

    let (status, v) = send(
        &h.app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": unique_email("nadie"), "password": "whatever-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["message"], "Usuario no encontrado");

    let (status, v) = send(
        &h.app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": h.admin_email, "password": "not-the-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["message"], "Contraseña incorrecta");

    let (status, v) = send(
        &h.app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": h.admin_email, "password": ADMIN_PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let claims = h.keys.verify(v["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.role, Role::Admin);
}

#[tokio::test]
async fn registering_an_existing_email_is_409() {
    let Some(h) = harness().await else { return };
    let body = json!({"name": "Otra", "email": h.admin_email, "password": "password-123"});
    let (status, _) = send(&h.app, Method::POST, "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn program_delete_is_guarded_by_assignments() {
    let Some(h) = harness().await else { return };
    let (_, program_id) = coordinator_and_program(&h).await;
    let (volunteer_id, _) = register(&h, "volunteer").await;
    let (beneficiary_id, _) = register(&h, "beneficiary").await;

    let (status, vol) = send(
        &h.app,
        Method::POST,
        "/api/admin/volunteers",
        Some(&h.admin_token),
        Some(json!({"user_id": volunteer_id, "program_id": program_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{vol}");
    let (status, ben) = send(
        &h.app,
        Method::POST,
        "/api/admin/beneficiaries",
        Some(&h.admin_token),
        Some(json!({"user_id": beneficiary_id, "program_id": program_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{ben}");

    let program_uri = format!("/api/admin/programs/{program_id}");
    let (status, v) = send(&h.app, Method::DELETE, &program_uri, Some(&h.admin_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let blockers = v["blockers"].as_array().unwrap();
    assert_eq!(blockers.len(), 2);
    assert!(blockers.iter().all(|b| b["count"] == 1));

    let (status, v) = send(&h.app, Method::GET, &program_uri, Some(&h.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["volunteers"], 1);
    assert_eq!(v["beneficiaries"], 1);

    for uri in [
        format!("/api/admin/volunteers/{}", id_of(&vol)),
        format!("/api/admin/beneficiaries/{}", id_of(&ben)),
    ] {
        let (status, _) = send(&h.app, Method::DELETE, &uri, Some(&h.admin_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (status, _) = send(&h.app, Method::DELETE, &program_uri, Some(&h.admin_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&h.app, Method::GET, &program_uri, Some(&h.admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn coordinator_of_a_program_cannot_be_deleted() {
    let Some(h) = harness().await else { return };
    let (coord_id, _) = coordinator_and_program(&h).await;

    let uri = format!("/api/admin/users/{coord_id}");
    let (status, v) = send(&h.app, Method::DELETE, &uri, Some(&h.admin_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["blockers"][0]["relation"], "coordinator");

    let (status, _) = send(&h.app, Method::GET, &uri, Some(&h.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn duplicate_assignment_is_409_and_status_edit_succeeds() {
    let Some(h) = harness().await else { return };
    let (_, program_id) = coordinator_and_program(&h).await;
    let (volunteer_id, volunteer_token) = register(&h, "volunteer").await;
    let body = json!({"user_id": volunteer_id, "program_id": program_id});

    let (status, first) = send(&h.app, Method::POST, "/api/admin/volunteers", Some(&h.admin_token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, v) = send(&h.app, Method::POST, "/api/admin/volunteers", Some(&h.admin_token), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(v["message"], "El usuario ya está asignado a este programa");

    let (_, list) = send(
        &h.app,
        Method::GET,
        &format!("/api/admin/volunteers?program_id={program_id}"),
        Some(&h.admin_token),
        None,
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let uri = format!("/api/admin/volunteers/{}", id_of(&first));
    let (status, v) = send(&h.app, Method::PUT, &uri, Some(&h.admin_token), Some(json!({"task_status": "in_progress"}))).await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["task_status"], "in_progress");

    let uri = format!("/api/volunteer/assignments/{}/status", id_of(&first));
    let (status, v) = send(&h.app, Method::PUT, &uri, Some(&volunteer_token), Some(json!({"task_status": "completed"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["task_status"], "completed");
}

#[tokio::test]
async fn assignment_requires_matching_role() {
    let Some(h) = harness().await else { return };
    let (_, program_id) = coordinator_and_program(&h).await;
    let (donor_id, _) = register(&h, "donor").await;
    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/admin/volunteers",
        Some(&h.admin_token),
        Some(json!({"user_id": donor_id, "program_id": program_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn beneficiary_feedback_is_persisted() {
    let Some(h) = harness().await else { return };
    let (_, program_id) = coordinator_and_program(&h).await;
    let (beneficiary_id, token) = register(&h, "beneficiary").await;
    let (_, assignment) = send(
        &h.app,
        Method::POST,
        "/api/admin/beneficiaries",
        Some(&h.admin_token),
        Some(json!({"user_id": beneficiary_id, "program_id": program_id})),
    )
    .await;
    let uri = format!("/api/beneficiary/assignments/{}", id_of(&assignment));

    let (status, _) = send(&h.app, Method::POST, &format!("{uri}/feedback"), Some(&token), Some(json!({"score": 6}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &h.app,
        Method::POST,
        &format!("{uri}/feedback"),
        Some(&token),
        Some(json!({"feedback": "Muy útil", "score": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, v) = send(&h.app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["score"], 3);
    assert_eq!(v["feedback"], "Muy útil");

    let (status, v) = send(
        &h.app,
        Method::GET,
        &format!("/api/coordinator/programs/{program_id}/feedback"),
        Some(&h.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["average_score"], 3.0);
}

#[tokio::test]
async fn second_budget_for_a_program_is_409() {
    let Some(h) = harness().await else { return };
    let (_, program_id) = coordinator_and_program(&h).await;
    let body = json!({"program_id": program_id, "amount": 1500.0, "description": "Material"});

    let (status, _) = send(&h.app, Method::POST, "/api/admin/budgets", Some(&h.admin_token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, v) = send(&h.app, Method::POST, "/api/admin/budgets", Some(&h.admin_token), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(v["message"], "El programa ya tiene un presupuesto");
}

#[tokio::test]
async fn donor_gets_a_receipt_for_own_donation() {
    let Some(h) = harness().await else { return };
    let (_, token) = register(&h, "donor").await;

    let (status, donation) = send(&h.app, Method::POST, "/api/donor/donations", Some(&token), Some(json!({"amount": 50.0}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(donation["date"].is_string());

    let uri = format!("/api/donor/donations/{}/receipt", id_of(&donation));
    let (status, receipt) = send(&h.app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["amount"], 50.0);
    assert!(receipt["receipt_number"].as_str().unwrap().starts_with("SOLVIA-"));

    let (_, other) = register(&h, "donor").await;
    let (status, _) = send(&h.app, Method::GET, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn feed_messages_can_be_deleted_by_sender_only() {
    let Some(h) = harness().await else { return };
    let (_, author) = register(&h, "volunteer").await;
    let (_, stranger) = register(&h, "volunteer").await;

    let (status, msg) = send(&h.app, Method::POST, "/api/feed", Some(&author), Some(json!({"message": "Hola a todos"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(msg["sender_name"], "Usuario volunteer");

    let uri = format!("/api/feed/{}", id_of(&msg));
    let (status, _) = send(&h.app, Method::DELETE, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&h.app, Method::DELETE, &uri, Some(&author), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn assigned_volunteer_keeps_its_role() {
    let Some(h) = harness().await else { return };
    let (_, program_id) = coordinator_and_program(&h).await;
    let (volunteer_id, _) = register(&h, "volunteer").await;
    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/admin/volunteers",
        Some(&h.admin_token),
        Some(json!({"user_id": volunteer_id, "program_id": program_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/admin/users/{volunteer_id}");
    let (status, v) = send(&h.app, Method::PUT, &uri, Some(&h.admin_token), Some(json!({"role": "donor"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["message"].as_str().unwrap().contains("Programa"), "{v}");

    let (_, user) = send(&h.app, Method::GET, &uri, Some(&h.admin_token), None).await;
    assert_eq!(user["role"], "volunteer");
    let (_, list) = send(
        &h.app,
        Method::GET,
        &format!("/api/admin/volunteers?program_id={program_id}"),
        Some(&h.admin_token),
        None,
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Same role plus other fields still goes through.
    let (status, v) = send(
        &h.app,
        Method::PUT,
        &uri,
        Some(&h.admin_token),
        Some(json!({"role": "volunteer", "description": "Turno de mañana"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["description"], "Turno de mañana");
}

#[tokio::test]
async fn free_user_may_change_role() {
    let Some(h) = harness().await else { return };
    let (beneficiary_id, _) = register(&h, "beneficiary").await;
    let uri = format!("/api/admin/users/{beneficiary_id}");
    let (status, v) = send(&h.app, Method::PUT, &uri, Some(&h.admin_token), Some(json!({"role": "donor"}))).await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["role"], "donor");

    let missing = format!("/api/admin/users/{}", Uuid::new_v4());
    let (status, _) = send(&h.app, Method::PUT, &missing, Some(&h.admin_token), Some(json!({"role": "donor"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn assigned_participants_cannot_be_deleted() {
    let Some(h) = harness().await else { return };
    let (_, program_id) = coordinator_and_program(&h).await;
    let (volunteer_id, _) = register(&h, "volunteer").await;
    let (beneficiary_id, _) = register(&h, "beneficiary").await;

    for (path, user_id) in [("volunteers", &volunteer_id), ("beneficiaries", &beneficiary_id)] {
        let (status, _) = send(
            &h.app,
            Method::POST,
            &format!("/api/admin/{path}"),
            Some(&h.admin_token),
            Some(json!({"user_id": user_id, "program_id": program_id})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    for (relation, user_id) in [("volunteer", &volunteer_id), ("beneficiary", &beneficiary_id)] {
        let uri = format!("/api/admin/users/{user_id}");
        let (status, v) = send(&h.app, Method::DELETE, &uri, Some(&h.admin_token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{v}");
        let blockers = v["blockers"].as_array().unwrap();
        assert_eq!(blockers.len(), 1);
        assert_eq!(blockers[0]["relation"], relation);
        assert_eq!(blockers[0]["count"], 1);

        let (status, _) = send(&h.app, Method::GET, &uri, Some(&h.admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn editing_onto_a_taken_pair_is_409() {
    let Some(h) = harness().await else { return };
    let (_, program_a) = coordinator_and_program(&h).await;
    let (_, program_b) = coordinator_and_program(&h).await;
    let (volunteer_id, _) = register(&h, "volunteer").await;

    let mut ids = Vec::new();
    for program_id in [&program_a, &program_b] {
        let (status, v) = send(
            &h.app,
            Method::POST,
            "/api/admin/volunteers",
            Some(&h.admin_token),
            Some(json!({"user_id": volunteer_id, "program_id": program_id})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(id_of(&v));
    }

    let uri = format!("/api/admin/volunteers/{}", ids[1]);
    let (status, v) = send(&h.app, Method::PUT, &uri, Some(&h.admin_token), Some(json!({"program_id": program_a}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(v["message"], "El usuario ya está asignado a este programa");

    let (_, list) = send(
        &h.app,
        Method::GET,
        &format!("/api/admin/volunteers?program_id={program_b}"),
        Some(&h.admin_token),
        None,
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let missing = format!("/api/admin/volunteers/{}", Uuid::new_v4());
    let (status, _) = send(&h.app, Method::PUT, &missing, Some(&h.admin_token), Some(json!({"task_status": "completed"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_beneficiary_is_409() {
    let Some(h) = harness().await else { return };
    let (_, program_id) = coordinator_and_program(&h).await;
    let (beneficiary_id, _) = register(&h, "beneficiary").await;
    let body = json!({"user_id": beneficiary_id, "program_id": program_id});

    let (status, _) = send(&h.app, Method::POST, "/api/admin/beneficiaries", Some(&h.admin_token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, v) = send(&h.app, Method::POST, "/api/admin/beneficiaries", Some(&h.admin_token), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(v["message"], "El usuario ya está asignado a este programa");
}

#[tokio::test]
async fn beneficiary_task_must_belong_to_the_program() {
    let Some(h) = harness().await else { return };
    let (_, program_a) = coordinator_and_program(&h).await;
    let (_, program_b) = coordinator_and_program(&h).await;
    let (beneficiary_id, _) = register(&h, "beneficiary").await;

    let (status, task) = send(
        &h.app,
        Method::POST,
        &format!("/api/coordinator/programs/{program_b}/tasks"),
        Some(&h.admin_token),
        Some(json!({"title": "Reparto de alimentos"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{task}");

    let (status, v) = send(
        &h.app,
        Method::POST,
        "/api/admin/beneficiaries",
        Some(&h.admin_token),
        Some(json!({"user_id": beneficiary_id, "program_id": program_a, "task_id": task["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["message"], "La tarea no pertenece al programa indicado");

    let (status, v) = send(
        &h.app,
        Method::POST,
        "/api/admin/beneficiaries",
        Some(&h.admin_token),
        Some(json!({"user_id": beneficiary_id, "program_id": program_b, "task_id": task["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{v}");
    assert_eq!(v["task_id"], task["id"]);
}

struct FailingMailer;

#[async_trait::async_trait]
impl Mailer for FailingMailer {
    async fn send_html(&self, _to: &str, _subject: &str, _html: String) -> anyhow::Result<()> {
        anyhow::bail!("smtp relay unreachable")
    }
}

#[tokio::test]
async fn forgot_password_answers_200_when_mail_fails() {
    let Some(h) = harness_with(Arc::new(FailingMailer)).await else { return };
    let (status, v) = send(
        &h.app,
        Method::POST,
        "/api/auth/forgot-password",
        None,
        Some(json!({"email": h.admin_email})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{v}");

    let (status, unknown) = send(
        &h.app,
        Method::POST,
        "/api/auth/forgot-password",
        None,
        Some(json!({"email": unique_email("nadie")})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unknown["message"], v["message"]);
}
