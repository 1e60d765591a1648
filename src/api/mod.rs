// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface: route table, OpenAPI document, middleware stack.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        AccountListResponse, AccountResponse, AccountSummary, AdjustCreditsRequest,
        AuditEntryResponse, AuditListResponse, BalanceResponse, BanRequest,
        ExternalLoginRequest, LedgerEntryResponse, LoginRequest, SignupRequest,
        SignupResponse, TokenResponse,
    },
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/external", post(auth::login_external))
        .route("/auth/logout", post(auth::logout))
        .route("/me", get(users::me))
        .route("/me/history", get(users::my_history))
        .route("/admin/accounts", get(admin::list_accounts))
        .route("/admin/credits", post(admin::adjust_credits))
        .route("/admin/ban", post(admin::set_banned))
        .route("/admin/audit", get(admin::audit_log));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup,
        auth::login,
        auth::login_external,
        auth::logout,
        users::me,
        users::my_history,
        admin::list_accounts,
        admin::adjust_credits,
        admin::set_banned,
        admin::audit_log,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            SignupRequest,
            SignupResponse,
            LoginRequest,
            ExternalLoginRequest,
            TokenResponse,
            AccountResponse,
            AccountSummary,
            AccountListResponse,
            LedgerEntryResponse,
            AuditEntryResponse,
            AuditListResponse,
            AdjustCreditsRequest,
            BalanceResponse,
            BanRequest
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Signup, login, and session management"),
        (name = "Me", description = "Self-service account and history"),
        (name = "Admin", description = "Account and credit administration"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionIssuer;
    use crate::store::temp_store;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_app() -> (Router, AppState, tempfile::TempDir) {
        let (store, dir) = temp_store();
        let sessions = SessionIssuer::new(b"api-test-secret", 24);
        let state = AppState::new(store, sessions)
            .with_external_auth_secret(Some("gateway-secret".to_string()));
        (router(state.clone()), state, dir)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (app, _state, _dir) = test_app();
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app, _state, _dir) = test_app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn signup_then_login_then_me() {
        let (app, _state, _dir) = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/auth/signup",
                serde_json::json!({"identifier": "alice", "password": "correct-horse"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/auth/login",
                serde_json::json!({"identifier": "alice", "password": "correct-horse"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let token = body["token"].as_str().unwrap().to_string();
        assert_eq!(body["account"]["identifier"], "alice");

        let response = app
            .oneshot(
                Request::get("/v1/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["identifier"], "alice");
        assert_eq!(body["balance_cents"], 0);
    }

    #[tokio::test]
    async fn login_failures_are_uniform() {
        let (app, _state, _dir) = test_app();
        app.clone()
            .oneshot(json_request(
                "POST",
                "/v1/auth/signup",
                serde_json::json!({"identifier": "bob", "password": "hunter2hunter2"}),
            ))
            .await
            .unwrap();

        // Unknown identifier and wrong password produce the same body
        let unknown = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/auth/login",
                serde_json::json!({"identifier": "ghost", "password": "whatever1"}),
            ))
            .await
            .unwrap();
        let wrong = app
            .oneshot(json_request(
                "POST",
                "/v1/auth/login",
                serde_json::json!({"identifier": "bob", "password": "wrong-pass"}),
            ))
            .await
            .unwrap();

        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(unknown).await, body_json(wrong).await);
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts() {
        let (app, _state, _dir) = test_app();
        let body = serde_json::json!({"identifier": "carol", "password": "longenough"});

        let first = app
            .clone()
            .oneshot(json_request("POST", "/v1/auth/signup", body.clone()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .oneshot(json_request("POST", "/v1/auth/signup", body))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(second).await["error_code"], "identifier_taken");
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let (app, state, _dir) = test_app();
        let account = state
            .store
            .create_account("dan", None, crate::auth::Role::User)
            .unwrap();
        let token = state.sessions.issue(&account).unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::post("/v1/auth/logout")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::get("/v1/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error_code"], "token_revoked");
    }

    #[tokio::test]
    async fn external_login_requires_gateway_secret() {
        let (app, _state, _dir) = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/auth/external",
                serde_json::json!({"identifier": "tg:555"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(
                Request::post("/v1/auth/external")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-gateway-secret", "gateway-secret")
                    .body(Body::from(
                        serde_json::json!({"identifier": "tg:555"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["account"]["identifier"], "tg:555");
    }

    #[tokio::test]
    async fn external_login_disabled_without_secret() {
        let (store, _dir) = temp_store();
        let state = AppState::new(store, SessionIssuer::new(b"s", 24));
        let app = router(state);

        let response = app
            .oneshot(json_request(
                "POST",
                "/v1/auth/external",
                serde_json::json!({"identifier": "tg:555"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_adjusts_credits_and_audits() {
        let (app, state, _dir) = test_app();
        let admin = state
            .store
            .create_account("root", None, crate::auth::Role::Admin)
            .unwrap();
        state
            .store
            .create_account("eve", None, crate::auth::Role::User)
            .unwrap();
        let token = state.sessions.issue(&admin).unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::post("/v1/admin/credits")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::from(
                        serde_json::json!({
                            "identifier": "eve",
                            "delta_cents": 2500,
                            "reason": "topup"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["balance_cents"], 2500);

        let response = app
            .oneshot(
                Request::get("/v1/admin/audit")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["entries"][0]["actor_identifier"], "root");
        assert_eq!(body["entries"][0]["account_identifier"], "eve");
    }

    #[tokio::test]
    async fn overdraw_returns_insufficient_funds() {
        let (app, state, _dir) = test_app();
        let admin = state
            .store
            .create_account("root", None, crate::auth::Role::Admin)
            .unwrap();
        state
            .store
            .create_account("poor", None, crate::auth::Role::User)
            .unwrap();
        let token = state.sessions.issue(&admin).unwrap();

        let response = app
            .oneshot(
                Request::post("/v1/admin/credits")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::from(
                        serde_json::json!({
                            "identifier": "poor",
                            "delta_cents": -100,
                            "reason": "fee"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error_code"], "insufficient_funds");
    }

    #[tokio::test]
    async fn admin_routes_reject_regular_users() {
        let (app, state, _dir) = test_app();
        let user = state
            .store
            .create_account("pleb", None, crate::auth::Role::User)
            .unwrap();
        let token = state.sessions.issue(&user).unwrap();

        let response = app
            .oneshot(
                Request::get("/v1/admin/accounts")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await["error_code"],
            "insufficient_permissions"
        );
    }

    #[tokio::test]
    async fn ban_endpoint_locks_account_out() {
        let (app, state, _dir) = test_app();
        let admin = state
            .store
            .create_account("root", None, crate::auth::Role::Admin)
            .unwrap();
        let victim = state
            .store
            .create_account("mallory", None, crate::auth::Role::User)
            .unwrap();
        let admin_token = state.sessions.issue(&admin).unwrap();
        let victim_token = state.sessions.issue(&victim).unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::post("/v1/admin/ban")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, format!("Bearer {admin_token}"))
                    .body(Body::from(
                        serde_json::json!({"identifier": "mallory", "banned": true}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // The victim's existing token no longer works
        let response = app
            .oneshot(
                Request::get("/v1/me")
                    .header(header::AUTHORIZATION, format!("Bearer {victim_token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error_code"], "account_banned");
    }
}
