use axum::{
    Router, error_handling::HandleErrorLayer, http::StatusCode, response::IntoResponse,
    routing::get,
};
use pace_limit::Cooldown;
use std::sync::Arc;
use std::time::Duration;
use tower::BoxError;
use tower::ServiceBuilder;
use tower_pace::{PaceError, ServiceBuilderExt};

#[tokio::main]
async fn main() {
    // 1. One request per second across every connection
    let cooldown = Arc::new(Cooldown::new(Duration::from_secs(1)).unwrap());

    // 2. Build the Router
    let app = Router::new()
        .route("/", get(|| async { "Hello, Pace!" }))
        .layer(
            ServiceBuilder::new()
                // The outermost layer: catches BoxError and returns Response
                .layer(HandleErrorLayer::new(handle_pace_error))
                .throttle(cooldown),
        );

    // 3. Serve
    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .unwrap();
    println!("Listening on http://127.0.0.1:3000");

    axum::serve(listener, app).await.unwrap();
}

async fn handle_pace_error(err: BoxError) -> impl IntoResponse {
    match PaceError::from_boxed(err) {
        throttled @ PaceError::Throttled { .. } => throttled.into_response(),
        PaceError::Inner(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Service Error")
            .into_response(),
    }
}
