//! Log-file tailing is, like the dashboard, out of core scope; this
//! satisfies the `GET /logs` interface contract against whatever the
//! operator configured as the log file path (if any).

use axum::response::Html;
use std::path::PathBuf;

const TAIL_LINES: usize = 200;

pub async fn logs() -> Html<String> {
    let Some(path) = std::env::var_os("VPN_SENTINEL_LOG_FILE").map(PathBuf::from) else {
        return Html("<html><body><p>No log file configured.</p></body></html>".to_string());
    };

    let body = match tokio::fs::read_to_string(&path).await {
        Ok(content) => {
            let tail: Vec<&str> = content.lines().rev().take(TAIL_LINES).collect();
            let mut tail = tail;
            tail.reverse();
            tail.join("\n")
        }
        Err(err) => format!("Could not read log file: {err}"),
    };

    Html(format!("<html><body><pre>{}</pre></body></html>", html_escape(&body)))
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
