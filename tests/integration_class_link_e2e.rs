use chrono::{SecondsFormat, TimeDelta, Utc};
use once_cell::sync::Lazy;

use class_link::{
    build_router,
    config::Config,
    crypto::token::TokenCodec,
    models::session::ClassSession,
    state::AppState,
};

// Shared test context
struct TestContext {
    client: reqwest::Client,
    base_url: String,
}

static CODEC: Lazy<TokenCodec> = Lazy::new(|| TokenCodec::new(&Config::default().token));

impl TestContext {
    async fn spawn(config: Config) -> Self {
        let app = build_router(AppState::new(config));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{}", addr),
        }
    }

    async fn open(&self, token: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/op", self.base_url))
            .query(&[("data", token)])
            .send()
            .await
            .unwrap()
    }
}

fn made_hours_ago(hours: i64) -> String {
    (Utc::now() - TimeDelta::hours(hours)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn session(made_at: Option<String>) -> ClassSession {
    ClassSession {
        class_name: "Electrostatics".into(),
        teacher_name: "Prof. Kapoor".into(),
        thumbnail_url: "https://x/thumb.png".into(),
        class_media_url: "https://x/video".into(),
        slides_url: "https://x/slides".into(),
        is_offline: false,
        live_at_time: "2025-08-23T15:30:00Z".into(),
        user_first_name: None,
        user_id: None,
        made_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[tokio::test]
    async fn test_active_link_renders_session_page() {
        let context = TestContext::spawn(Config::default()).await;
        let token = CODEC.encode(&session(Some(made_hours_ago(1)))).unwrap();

        let response = context.open(&token).await;
        assert_eq!(response.status().as_u16(), 200);

        let html = response.text().await.unwrap();
        assert!(html.contains("Electrostatics"));
        assert!(html.contains("23-August-2025"));
        assert!(html.contains("playurl=https%3A%2F%2Fx%2Fvideo&amp;pdf=https%3A%2F%2Fx%2Fslides"));

        // Within a few seconds of 23h, depending on how long the request took.
        let marker = r#"data-seconds=""#;
        let start = html.find(marker).expect("countdown present") + marker.len();
        let end = start + html[start..].find('"').unwrap();
        let seconds: u64 = html[start..end].parse().unwrap();
        assert!((23 * 3600 - 10..=23 * 3600).contains(&seconds));
    }

    #[tokio::test]
    async fn test_expired_link_renders_notice() {
        let context = TestContext::spawn(Config::default()).await;
        let mut stale = session(Some(made_hours_ago(25)));
        stale.live_at_time = "not-a-date".into();
        let token = CODEC.encode(&stale).unwrap();

        let response = context.open(&token).await;
        assert_eq!(response.status().as_u16(), 200);

        let html = response.text().await.unwrap();
        assert!(html.contains("This link has expired"));
        assert!(!html.contains("Electrostatics"));
    }

    #[tokio::test]
    async fn test_corrupted_link_is_bad_request() {
        let context = TestContext::spawn(Config::default()).await;
        let token = CODEC.encode(&session(Some(made_hours_ago(1)))).unwrap();

        let response = context.open(&token[..token.len() - 3]).await;
        assert_eq!(response.status().as_u16(), 400);
        assert!(response.text().await.unwrap().contains("Invalid or corrupted class link"));

        let response = context.open("definitely not a token!").await;
        assert_eq!(response.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn test_token_with_missing_fields_is_bad_request() {
        let context = TestContext::spawn(Config::default()).await;
        let mut partial = session(Some(made_hours_ago(1)));
        partial.slides_url.clear();
        let token = CODEC.encode(&partial).unwrap();

        let response = context.open(&token).await;
        assert_eq!(response.status().as_u16(), 400);
        assert!(response
            .text()
            .await
            .unwrap()
            .contains("Missing required query parameters"));
    }

    #[tokio::test]
    async fn test_sentinel_media_passes_through() {
        let context = TestContext::spawn(Config::default()).await;
        let mut cancelled = session(Some(made_hours_ago(2)));
        cancelled.class_media_url = "Class Cancelled".into();
        let token = CODEC.encode(&cancelled).unwrap();

        let response = context.open(&token).await;
        assert_eq!(response.status().as_u16(), 200);

        let html = response.text().await.unwrap();
        assert!(html.contains(r#"data-target="Class Cancelled""#));
        assert!(!html.contains("CLICK TO WATCH CLASS"));
    }

    #[tokio::test]
    async fn test_plain_parameters() {
        let context = TestContext::spawn(Config::default()).await;

        let response = context
            .client
            .get(format!("{}/op", context.base_url))
            .query(&[
                ("class_name", "Genetics"),
                ("teacher_name", "Dr. Bose"),
                ("thumbnail", "https://x/t.png"),
                ("class_url", "Live Soon"),
                ("slides_url", "https://x/s.pdf"),
                ("is_offline", "true"),
                ("live_at_time", "2025-08-23T15:30:00+00:00"),
            ])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);

        let html = response.text().await.unwrap();
        assert!(html.contains("Genetics"));
        assert!(html.contains("23-August-2025 (Offline)"));
        assert!(html.contains(r#"data-target="Live Soon""#));

        let response = context
            .client
            .get(format!("{}/op?class_name=Genetics", context.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn test_demo_encrypt_roundtrip() {
        let config = Config {
            demo_routes: true,
            ..Config::default()
        };
        let context = TestContext::spawn(config).await;

        let response = context
            .client
            .get(format!("{}/encrypt?class_name=Optics", context.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);

        let body: Value = response.json().await.unwrap();
        let token = body["token"].as_str().unwrap();
        assert!(body["url"].as_str().unwrap().contains("/op?data="));

        let response = context.open(token).await;
        assert_eq!(response.status().as_u16(), 200);
        assert!(response.text().await.unwrap().contains("Optics"));
    }

    #[tokio::test]
    async fn test_demo_route_is_off_by_default() {
        let context = TestContext::spawn(Config::default()).await;

        let response = context
            .client
            .get(format!("{}/encrypt", context.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);
    }

    #[tokio::test]
    async fn test_welcome_and_health() {
        let context = TestContext::spawn(Config::default()).await;

        let welcome = context.client.get(&context.base_url).send().await.unwrap();
        assert_eq!(welcome.text().await.unwrap(), "Welcome! Use /op with query params.");

        let health: Value = context
            .client
            .get(format!("{}/health", context.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
    }
}
