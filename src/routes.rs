// src/routes.rs

use std::sync::Arc;

use axum::{
    Router, http::Method, middleware,
    routing::{delete, get, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{
        auth, categories, events, exams, monitor, participants, questions, recap, schedules,
        submissions, token, users,
    },
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, master data, schedules, monitoring, token).
/// * Applies global middleware (Trace, CORS) and rate limits on the
///   login and token endpoints.
/// * Injects global state (database pools + config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(5)
        .finish()
        .unwrap();
    let governor_conf = Arc::new(governor_conf);

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .layer(GovernorLayer::new(governor_conf.clone()));

    let user_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            put(users::update_user).delete(users::delete_user),
        )
        // Account management stays admin-only on top of the auth check.
        .layer(middleware::from_fn(admin_middleware));

    let event_routes = Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route(
            "/{id}",
            put(events::update_event).delete(events::delete_event),
        );

    let category_routes = Router::new()
        .route(
            "/",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/{id}",
            put(categories::update_category).delete(categories::delete_category),
        );

    let participant_routes = Router::new()
        .route(
            "/",
            get(participants::list_participants).post(participants::create_participant),
        )
        .route(
            "/{id}",
            put(participants::update_participant).delete(participants::delete_participant),
        );

    let question_routes = Router::new()
        .route(
            "/",
            get(questions::list_questions).post(questions::create_question),
        )
        .route(
            "/{id}",
            get(questions::get_question)
                .put(questions::update_question)
                .delete(questions::delete_question),
        );

    let schedule_routes = Router::new()
        .route(
            "/",
            get(schedules::list_schedules).post(schedules::create_schedule),
        )
        .route(
            "/{id}",
            get(schedules::get_schedule)
                .put(schedules::update_schedule)
                .delete(schedules::delete_schedule),
        )
        .route("/{id}/monitor", get(monitor::monitor_schedule))
        .route("/{id}/recap", get(recap::recap_schedule))
        .route("/{id}/recap/export", get(recap::export_recap));

    let exam_routes = Router::new()
        .route("/", get(exams::list_exams).post(exams::create_exam))
        .route(
            "/{id}",
            get(exams::get_exam)
                .put(exams::update_exam)
                .delete(exams::delete_exam),
        )
        .route(
            "/{id}/participants",
            get(exams::list_roster)
                .post(exams::add_roster)
                .delete(exams::clear_roster),
        )
        .route(
            "/{id}/participants/bulk-remove",
            post(exams::bulk_remove_roster),
        )
        .route(
            "/{id}/participants/{participant_id}",
            delete(exams::remove_roster_member),
        )
        .route(
            "/{id}/package",
            get(exams::get_package).put(exams::set_package),
        );

    let submission_routes = Router::new()
        .route("/{id}/reset", post(submissions::reset_submission))
        .route("/{id}", delete(submissions::delete_submission));

    let token_routes = Router::new()
        .route("/", get(token::get_token))
        .route("/rotate", post(token::rotate_token))
        .layer(GovernorLayer::new(governor_conf));

    let protected = Router::new()
        .nest("/admin", user_routes)
        .nest("/events", event_routes)
        .nest("/categories", category_routes)
        .nest("/participants", participant_routes)
        .nest("/questions", question_routes)
        .nest("/schedules", schedule_routes)
        .nest("/exams", exam_routes)
        .nest("/submissions", submission_routes)
        .nest("/token", token_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", protected)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
