//! Static landing page.

use axum::response::Html;

/// GET /
pub async fn landing_page() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}
