use axum::response::Html;

use super::pages;

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Sitemap", content_type = "text/html")),
    tag = "pages"
)]
pub async fn index() -> Html<String> {
    pages::index()
}
