//! Shared application state.

use std::sync::Arc;
use tracing::info;

use crate::config::ServerConfig;
use crate::core::chat::{ChatService, ChatServiceConfig};
use crate::core::festival::FestivalFacts;
use crate::core::llm::{ChatModel, OpenAIChatConfig, OpenAIChatModel};
use crate::core::realtime::{MintConfig, RealtimeModel, RealtimeVoice, SessionMinter};
use crate::errors::AppError;

/// State shared by every handler.
pub struct AppState {
    pub config: ServerConfig,
    pub facts: Arc<FestivalFacts>,
    pub chat: ChatService,
    pub minter: SessionMinter,
}

impl AppState {
    /// Build state from configuration, loading facts and constructing the
    /// OpenAI clients.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, AppError> {
        let facts = match &config.festival_data_path {
            Some(path) => {
                info!(path = %path.display(), "Loading festival facts");
                FestivalFacts::from_file(path)
            }
            None => {
                info!("Using bundled festival facts");
                FestivalFacts::bundled()
            }
        }
        .map_err(|e| AppError::Internal(e.to_string()))?;

        let model = OpenAIChatModel::new(OpenAIChatConfig {
            api_key: config.openai_api_key_or_empty(),
            base_url: config.openai_base_url.clone(),
            default_model: config.chat_model.clone(),
            timeout: config.llm_timeout(),
        })
        .map_err(|e| AppError::Internal(e.to_string()))?;

        Self::with_model(config, facts, Arc::new(model))
    }

    /// Build state around an existing chat model.
    pub fn with_model(
        config: ServerConfig,
        facts: FestivalFacts,
        model: Arc<dyn ChatModel>,
    ) -> Result<Arc<Self>, AppError> {
        let facts = Arc::new(facts);

        let chat = ChatService::new(
            model,
            facts.clone(),
            ChatServiceConfig {
                answer_model: Some(config.chat_model.clone()),
                follow_up_model: Some(config.follow_up_model.clone()),
                default_language: config.default_language,
                ..Default::default()
            },
        );

        let minter = SessionMinter::new(MintConfig {
            api_key: config.openai_api_key_or_empty(),
            base_url: config.openai_base_url.clone(),
            model: RealtimeModel::from_str_or_default(&config.realtime_model),
            voice: RealtimeVoice::from_str_or_default(&config.realtime_voice),
            timeout: config.llm_timeout(),
        })
        .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Arc::new(Self {
            config,
            facts,
            chat,
            minter,
        }))
    }
}
