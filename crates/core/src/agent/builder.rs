use prompt_refiner_model::ModelProvider;

use super::Agent;
use crate::model_client::ModelClient;

/// [`Agent`] builder.
pub struct AgentBuilder {
    name: String,
    model_client: ModelClient,
    system_prompt: Option<String>,
    temperature: Option<f32>,
}

impl AgentBuilder {
    /// Creates a new builder with the agent name and its model provider.
    #[inline]
    pub fn with_model_provider<S, P>(name: S, provider: P) -> Self
    where
        S: Into<String>,
        P: ModelProvider + 'static,
    {
        Self {
            name: name.into(),
            model_client: ModelClient::new(provider),
            system_prompt: None,
            temperature: None,
        }
    }

    /// Sets the system prompt for the agent.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the sampling temperature for the agent.
    #[inline]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent {
            name: self.name,
            system_prompt: self.system_prompt,
            temperature: self.temperature,
            model_client: self.model_client,
        }
    }
}
