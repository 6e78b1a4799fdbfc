//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use platform::kv::SharedKv;
use platform::mail::SharedMailer;

use crate::domain::repository::SharedUserRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_auth;

/// Account routes, to be nested under `/api`
pub fn auth_router<R, K, M>(state: AuthAppState<R, K, M>) -> Router
where
    R: SharedUserRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let auth = middleware::from_fn_with_state(state.gate(), require_auth::<K>);

    Router::new()
        .route(
            "/users",
            post(handlers::register::<R, K, M>).merge(
                get(handlers::list_users::<R, K, M>)
                    .put(handlers::update_profile::<R, K, M>)
                    .delete(handlers::delete_account::<R, K, M>)
                    .route_layer(auth.clone()),
            ),
        )
        .route(
            "/users/{username}",
            get(handlers::get_user::<R, K, M>).route_layer(auth.clone()),
        )
        .route("/login", post(handlers::login::<R, K, M>))
        .route(
            "/logout",
            get(handlers::logout::<R, K, M>).route_layer(auth),
        )
        .route("/confirm-email", get(handlers::confirm_email::<R, K, M>))
        .route("/forgot-password", post(handlers::forgot_password::<R, K, M>))
        .with_state(state)
}
