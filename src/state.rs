use crate::config::AppConfig;
use crate::services::extraction::Extractor;

pub struct AppState {
    pub config: AppConfig,
    pub extractor: Extractor,
}
