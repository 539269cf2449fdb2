//! Route definitions.
//!
//! Every protected route declares its own [`RouteRequirement`]; the guard
//! layer wraps that route alone.

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{MethodRouter, get, post, put};

use kydohub_auth::RouteRequirement;

use crate::handlers;
use crate::middleware::guard::{RouteGuard, enforce};
use crate::middleware::rate_limit::rate_limit;
use crate::state::AppState;

/// Resource name of student rows for data scoping.
pub const STUDENTS: &str = "students";

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/.well-known/jwks.json", get(handlers::jwks::jwks))
        .nest("/api", api_routes(&state))
        .with_state(state)
}

fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/auth", auth_routes(state))
        .merge(me_routes(state))
        .merge(student_routes(state))
        .merge(admin_routes(state))
}

/// Session lifecycle, rate limited per client address.
fn auth_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/exchange", post(handlers::auth::exchange))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/logout", post(handlers::auth::logout))
        .route("/switch", post(handlers::auth::switch))
        .route_layer(from_fn_with_state(state.clone(), rate_limit))
}

fn me_routes(state: &AppState) -> Router<AppState> {
    guarded(
        state,
        "/me/context",
        get(handlers::me::context),
        RouteRequirement::authenticated(),
    )
}

fn student_routes(state: &AppState) -> Router<AppState> {
    guarded(
        state,
        "/students",
        get(handlers::students::list),
        RouteRequirement::any([
            "students.list_all",
            "students.list_room",
            "students.list_guardian",
        ])
        .scoped(STUDENTS),
    )
    .merge(guarded(
        state,
        "/students/all",
        get(handlers::students::list_all),
        RouteRequirement::all(["students.list_all"]).scoped(STUDENTS),
    ))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    guarded(
        state,
        "/admin/users/{user_id}/logout-all",
        post(handlers::admin::logout_all),
        RouteRequirement::all(["users.manage"]).write(),
    )
    .merge(guarded(
        state,
        "/admin/users/{user_id}/roles",
        put(handlers::admin::assign_roles),
        RouteRequirement::all(["roles.manage"]).write(),
    ))
}

/// A single route behind the guard with `requirement`.
fn guarded(
    state: &AppState,
    path: &str,
    handler: MethodRouter<AppState>,
    requirement: RouteRequirement,
) -> Router<AppState> {
    Router::new()
        .route(path, handler)
        .route_layer(from_fn_with_state(
            RouteGuard::new(state.clone(), requirement),
            enforce,
        ))
}
