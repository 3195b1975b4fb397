use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{identify, require_auth_api, require_auth_page};
use crate::state::AppState;
use crate::{ai, auth, nodes, pages, player, stories};

/// Assembles the full application router. `identify` runs outermost so
/// every inner layer and handler sees the resolved `CurrentUser`.
pub fn router(state: AppState) -> Router {
    let public_pages = Router::new()
        .route("/", get(pages::home))
        .route("/discover", get(pages::discover))
        .route("/auth", get(pages::auth_page).post(auth::submit))
        .route("/logout", get(auth::logout))
        .route("/play/{node_id}", get(player::play));

    let owner_pages = Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route("/editor/{story_id}", get(pages::editor))
        .route("/story/create", post(stories::create_story))
        .route("/story/delete/{story_id}", post(stories::delete_story))
        .layer(middleware::from_fn(require_auth_page));

    let api = Router::new()
        .route("/api/story/{story_id}/update-details", post(stories::update_details))
        .route("/api/story/{story_id}/set-poster", post(stories::set_poster))
        .route("/api/story/{story_id}/nodes", post(nodes::create_node))
        .route("/api/node/{node_id}", get(nodes::get_node).post(nodes::save_node))
        .route("/api/ai/enrich", post(ai::enrich))
        .route("/api/ai/suggest-choices", post(ai::suggest_choices))
        .layer(middleware::from_fn(require_auth_api));

    // Ending generation is reader-facing and deliberately unauthenticated.
    let open_api = Router::new().route("/api/ai/generate-ending", post(ai::generate_ending));

    Router::new()
        .merge(public_pages)
        .merge(owner_pages)
        .merge(api)
        .merge(open_api)
        .layer(middleware::from_fn_with_state(state.clone(), identify))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
