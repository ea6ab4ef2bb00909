use std::sync::Arc;
use crate::config::Config;
use crate::crypto::token::TokenCodec;

/// The application's state.
///
/// Immutable after startup; requests share it without locking.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<Config>,
    /// The link token codec.
    pub codec: Arc<TokenCodec>,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    pub fn new(config: Config) -> Self {
        let codec = TokenCodec::new(&config.token);
        tracing::info!("✅ Token codec initialized ({:?} IV mode)", config.token.iv_mode);

        AppState {
            config: Arc::new(config),
            codec: Arc::new(codec),
        }
    }
}
