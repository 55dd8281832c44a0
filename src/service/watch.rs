//! Browser page that tails `/stream` (`GET /watch`).

use axum::response::Html;

const WATCH_PAGE: &str = include_str!("../../static/watch.html");

pub async fn handle_watch() -> Html<&'static str> {
    Html(WATCH_PAGE)
}
