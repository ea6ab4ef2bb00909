use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Html,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::session::{ClassSession, PlainParams},
    services::gate::{self, PageState, SessionSource},
    state::AppState,
    views::pages,
};

/// The `/op` query string: either a `data` token or the plain fields.
#[derive(Deserialize, Debug, Default)]
pub struct OpQuery {
    pub data: Option<String>,
    pub class_name: Option<String>,
    pub teacher_name: Option<String>,
    pub thumbnail: Option<String>,
    pub class_url: Option<String>,
    pub slides_url: Option<String>,
    pub is_offline: Option<String>,
    pub live_at_time: Option<String>,
    pub user_first_name: Option<String>,
    pub user_id: Option<String>,
    pub made_at: Option<String>,
}

impl OpQuery {
    /// Splits the query into its token and its plain-parameter form.
    fn into_parts(self) -> (Option<String>, PlainParams) {
        let plain = PlainParams {
            class_name: self.class_name,
            teacher_name: self.teacher_name,
            thumbnail: self.thumbnail,
            class_url: self.class_url,
            slides_url: self.slides_url,
            is_offline: self.is_offline,
            live_at_time: self.live_at_time,
            user_first_name: self.user_first_name,
            user_id: self.user_id,
            made_at: self.made_at,
        };
        (self.data, plain)
    }
}

/// Opens a class link.
///
/// A `data` token takes precedence over plain parameters.
pub async fn open_class(
    State(state): State<AppState>,
    query: std::result::Result<Query<OpQuery>, QueryRejection>,
) -> Result<Html<String>> {
    let Query(query) = query.map_err(|e| AppError::InvalidQuery(e.body_text()))?;
    let (token, plain) = query.into_parts();

    let (session, source) = match token {
        Some(token) => {
            let session = state.codec.decode(&token)?;
            tracing::debug!("🔓 Token decoded for class: {}", session.class_name);
            (session, SessionSource::Token)
        }
        None => (ClassSession::from(plain), SessionSource::Plain),
    };

    match gate::evaluate(session, source, Utc::now(), &state.config)? {
        PageState::Active(view) => Ok(Html(pages::render_session(&view))),
        PageState::Expired => Ok(Html(pages::render_expired(&state.config.marketing_url))),
    }
}
