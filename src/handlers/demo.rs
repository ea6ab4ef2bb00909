use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use http::header;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::session::{parse_flag, ClassSession},
    state::AppState,
};

/// Optional overrides for the sample session.
#[derive(Deserialize, Debug, Default)]
pub struct DemoQuery {
    pub class_name: Option<String>,
    pub teacher_name: Option<String>,
    pub is_offline: Option<String>,
    /// Produce an AES-GCM link instead of a CBC one.
    pub hardened: Option<String>,
}

/// Builds the sample session served by `/encrypt`.
pub fn sample_session(now: DateTime<Utc>, query: DemoQuery) -> ClassSession {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

    ClassSession {
        class_name: query.class_name.unwrap_or_else(|| "Sample Class".to_string()),
        teacher_name: query.teacher_name.unwrap_or_else(|| "Sample Teacher".to_string()),
        thumbnail_url: "https://placehold.co/200x200".to_string(),
        class_media_url: "https://media.example.com/sample/video.m3u8".to_string(),
        slides_url: "https://media.example.com/sample/slides.pdf".to_string(),
        is_offline: query.is_offline.as_deref().and_then(parse_flag).unwrap_or(false),
        live_at_time: timestamp.clone(),
        user_first_name: Some("Student".to_string()),
        user_id: None,
        made_at: Some(timestamp),
    }
}

/// Encodes a sample session and returns a shareable link.
pub async fn encrypt_sample(
    State(state): State<AppState>,
    Query(query): Query<DemoQuery>,
) -> Result<impl IntoResponse> {
    let hardened = query.hardened.as_deref().and_then(parse_flag).unwrap_or(false);
    let session = sample_session(Utc::now(), query);

    let token = if hardened {
        state.codec.seal(&session)?
    } else {
        state.codec.encode(&session)?
    };

    let query = serde_urlencoded::to_string(&[("data", token.as_str())])
        .map_err(|e| AppError::Internal(format!("Failed to build link: {}", e)))?;
    let url = format!(
        "{}/op?{}",
        state.config.public_base_url.trim_end_matches('/'),
        query
    );

    tracing::info!("🔗 Demo link generated for class: {}", session.class_name);

    let body = sonic_rs::to_string(&sonic_rs::json!({
        "token": token,
        "url": url,
    }))
    .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::gate::{self, PageState, SessionSource};

    #[test]
    fn sample_session_is_active_when_fresh() {
        let now = Utc::now();
        let session = sample_session(now, DemoQuery::default());

        let state = gate::evaluate(session, SessionSource::Token, now, &Config::default()).unwrap();
        assert!(matches!(state, PageState::Active(_)));
    }

    #[test]
    fn overrides_apply() {
        let session = sample_session(
            Utc::now(),
            DemoQuery {
                class_name: Some("Calculus".into()),
                is_offline: Some("true".into()),
                ..Default::default()
            },
        );

        assert_eq!(session.class_name, "Calculus");
        assert_eq!(session.teacher_name, "Sample Teacher");
        assert!(session.is_offline);
    }
}
