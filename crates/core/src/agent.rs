mod builder;

use async_trait::async_trait;
use prompt_refiner_model::{ModelMessage, ModelRequest};
use tracing::Instrument;

use crate::error::Error;
use crate::model_client::ModelClient;
use crate::round::{Collaborator, Responder};
use crate::transcript::{Role, Transcript};
pub use builder::AgentBuilder;

/// A model-backed participant with its own persona.
///
/// An agent keeps no history. Every request is rebuilt from its system
/// prompt and the transcript of the current round, so the same agent can
/// take part in any number of rounds without state leaking between them.
///
/// Agents can be consulted as a [`Collaborator`], or answer on the opening
/// side of a round as a [`Responder`], in which case the roles of the
/// transcript are mirrored for the model.
#[derive(Clone)]
pub struct Agent {
    name: String,
    system_prompt: Option<String>,
    temperature: Option<f32>,
    model_client: ModelClient,
}

impl Agent {
    /// Returns the name of the agent.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn build_request(
        &self,
        transcript: &Transcript,
        mirrored: bool,
    ) -> ModelRequest {
        let system = self
            .system_prompt
            .as_ref()
            .map(|prompt| ModelMessage::System(prompt.clone()));
        let history = transcript.messages().iter().map(|msg| {
            let content = msg.content().to_owned();
            match (msg.role(), mirrored) {
                (Role::System, _) => ModelMessage::System(content),
                (Role::User, false) | (Role::Assistant, true) => {
                    ModelMessage::User(content)
                }
                (Role::Assistant, false) | (Role::User, true) => {
                    ModelMessage::Assistant(content)
                }
            }
        });
        ModelRequest {
            messages: system.into_iter().chain(history).collect(),
            temperature: self.temperature,
        }
    }

    async fn complete(&self, req: ModelRequest) -> Result<String, Error> {
        let resp = self
            .model_client
            .send_request(req)
            .instrument(debug_span!("agent", name = %self.name))
            .await?;
        Ok(resp.text)
    }
}

#[async_trait]
impl Collaborator for Agent {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    async fn reply(&self, transcript: &Transcript) -> Result<String, Error> {
        self.complete(self.build_request(transcript, false)).await
    }
}

#[async_trait]
impl Responder for Agent {
    async fn respond(
        &self,
        transcript: &Transcript,
    ) -> Result<Option<String>, Error> {
        let reply = self.complete(self.build_request(transcript, true)).await?;
        Ok(Some(reply))
    }
}
