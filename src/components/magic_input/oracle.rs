use super::models::OracleRequest;
use crate::error::{oracle_error, CalendarResult};
use async_trait::async_trait;

/// External natural-language interpretation service
#[async_trait]
pub trait EventOracle: Send + Sync {
    /// Ask the oracle to interpret `request`, returning its raw reply text
    async fn interpret(&self, request: &OracleRequest) -> CalendarResult<String>;
}

/// Stand-in used when no oracle is configured; every request fails
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledOracle;

#[async_trait]
impl EventOracle for DisabledOracle {
    async fn interpret(&self, _request: &OracleRequest) -> CalendarResult<String> {
        Err(oracle_error("No oracle configured, set GEMINI_API_KEY to enable magic input"))
    }
}

#[cfg(feature = "gemini")]
pub use gemini::GeminiOracle;

#[cfg(feature = "gemini")]
mod gemini {
    use super::EventOracle;
    use crate::components::magic_input::models::{OracleRequest, SYSTEM_PROMPT};
    use crate::error::{oracle_error, CalendarResult};
    use async_trait::async_trait;
    use rig::completion::{Chat, Message};
    use rig::providers::gemini::Client as GeminiClient;
    use tracing::{debug, info};

    /// Oracle backed by Google Gemini through Rig
    pub struct GeminiOracle {
        client: GeminiClient,
        model: String,
    }

    impl GeminiOracle {
        pub fn new(api_key: &str, model: &str) -> Self {
            info!("Using Gemini model: {}", model);
            Self {
                client: GeminiClient::new(api_key),
                model: model.to_string(),
            }
        }
    }

    #[async_trait]
    impl EventOracle for GeminiOracle {
        async fn interpret(&self, request: &OracleRequest) -> CalendarResult<String> {
            let agent = self
                .client
                .agent(&self.model)
                .preamble(SYSTEM_PROMPT)
                .temperature(0.2)
                .build();

            let response = agent
                .chat(request.prompt(), Vec::<Message>::new())
                .await
                .map_err(|e| oracle_error(&format!("Gemini request failed: {}", e)))?;

            debug!("Received response from Gemini: {}", response);
            Ok(response)
        }
    }
}
