use std::sync::Arc;

use crate::config::Config;
use ai_grading_client::{AiGrader, DisabledAiGrader, HttpAiGrader};
use grading_policy::GradingPolicy;

pub struct AppState {
    pub config: Config,
    pub grading_policy: GradingPolicy,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let ai_grader: Arc<dyn AiGrader> = if config.ai_grading.enabled {
            tracing::info!(
                "AI grading enabled: url={}, timeout={:?}, max_attempts={}",
                config.ai_grading.url,
                config.ai_grading.timeout(),
                config.ai_grading.max_attempts
            );
            Arc::new(HttpAiGrader::new(&config.ai_grading)?)
        } else {
            tracing::warn!("AI grading disabled; non-exact answers get local estimates only");
            Arc::new(DisabledAiGrader)
        };

        Ok(Self::with_grader(config, ai_grader))
    }

    /// Build state around an explicit grader (tests, embedding).
    pub fn with_grader(config: Config, ai_grader: Arc<dyn AiGrader>) -> Self {
        Self {
            config,
            grading_policy: GradingPolicy::new(ai_grader),
        }
    }
}

pub mod ai_grading_client;
pub mod answer_matcher;
pub mod answer_normalizer;
pub mod grading_policy;
