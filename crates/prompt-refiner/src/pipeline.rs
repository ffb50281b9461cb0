use prompt_refiner_core::{
    AgentBuilder, DEFAULT_MAX_ITERATIONS, Error, RefinementEvent,
    RefinementReport, Refiner, RefinerBuilder, RetryPolicy,
};
use prompt_refiner_model::ModelProvider;

const GENERATOR_PROMPT: &str = include_str!("./prompts/generator.md");
const CRITIC_PROMPT: &str = include_str!("./prompts/critic.md");
const PROXY_PROMPT: &str = include_str!("./prompts/proxy.md");

const PROXY_MAX_TURNS: usize = 2;

/// A pipeline builder.
///
/// See [`Pipeline`].
pub struct PipelineBuilder {
    refiner_builder: RefinerBuilder,
    max_iterations: usize,
}

impl PipelineBuilder {
    /// Creates a pipeline builder whose agents all talk to `provider`.
    pub fn with_model_provider<M>(provider: M) -> Self
    where
        M: ModelProvider + Clone + 'static,
    {
        let generator = AgentBuilder::with_model_provider(
            "PromptGenerator",
            provider.clone(),
        )
        .with_system_prompt(GENERATOR_PROMPT)
        .with_temperature(0.7)
        .build();
        let critic =
            AgentBuilder::with_model_provider("PromptCritic", provider.clone())
                .with_system_prompt(CRITIC_PROMPT)
                .with_temperature(0.3)
                .build();
        let proxy = AgentBuilder::with_model_provider("UserProxy", provider)
            .with_system_prompt(PROXY_PROMPT)
            .with_temperature(0.1)
            .build();

        let refiner_builder = RefinerBuilder::new(generator, critic)
            .with_responder(proxy)
            .with_max_turns(PROXY_MAX_TURNS);
        Self {
            refiner_builder,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Sets how many times the critic may review the prompt.
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets how throttled rounds are retried.
    #[inline]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.refiner_builder =
            self.refiner_builder.with_retry_policy(retry_policy);
        self
    }

    /// Attaches a callback to be invoked on refinement progress.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(&RefinementEvent) + Send + Sync + 'static,
    ) -> Self {
        self.refiner_builder = self.refiner_builder.on_event(on_event);
        self
    }

    /// Builds a new pipeline.
    pub fn build(self) -> Pipeline {
        Pipeline {
            refiner: self.refiner_builder.build(),
            max_iterations: self.max_iterations,
        }
    }
}

/// The prompt generator, the prompt critic and the user proxy, wired
/// together.
///
/// The pipeline is basically a wrapper around [`Refiner`] that carries the
/// bundled personas and the iteration budget.
pub struct Pipeline {
    refiner: Refiner,
    max_iterations: usize,
}

impl Pipeline {
    /// Generates and refines a prompt for `user_query`.
    #[inline]
    pub async fn run(
        &self,
        user_query: &str,
    ) -> Result<RefinementReport, Error> {
        self.refiner.refine(user_query, self.max_iterations).await
    }

    /// Returns the underlying refiner.
    #[inline]
    pub fn refiner(&self) -> &Refiner {
        &self.refiner
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use prompt_refiner_model::ModelMessage;
    use prompt_refiner_test_model::{
        PresetFailure, PresetResponse, TestModelProvider,
    };

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_personas() {
        // One backend serves all three agents, in the order they speak.
        let provider = TestModelProvider::with_texts([
            "### Generated Prompt:\nSummarize the ticket.",
            "TERMINATE",
            "### Critique:\nToo vague.\n\n\
             ### Final Approved Prompt:\n\
             Summarize the ticket in three bullets.",
            "TERMINATE",
        ]);
        let pipeline = PipelineBuilder::with_model_provider(provider.clone())
            .build();

        let report = pipeline.run("ticket summaries").await.unwrap();
        assert_eq!(
            report.initial_prompt(),
            "### Generated Prompt:\nSummarize the ticket."
        );
        assert_eq!(
            report.final_prompt(),
            "Summarize the ticket in three bullets."
        );
        assert_eq!(provider.remaining(), 0);

        let requests = provider.requests();
        assert_eq!(requests.len(), 4);
        let temperatures: Vec<_> =
            requests.iter().map(|req| req.temperature).collect();
        assert_eq!(temperatures, [Some(0.7), Some(0.1), Some(0.3), Some(0.1)]);

        assert_eq!(
            requests[0].messages,
            vec![
                ModelMessage::System(GENERATOR_PROMPT.to_owned()),
                ModelMessage::User(
                    "Generate a prompt for the following query: \
                     ticket summaries"
                        .to_owned()
                ),
            ]
        );
        assert_eq!(
            requests[1].messages[0],
            ModelMessage::System(PROXY_PROMPT.to_owned())
        );
        assert_eq!(
            requests[2].messages,
            vec![
                ModelMessage::System(CRITIC_PROMPT.to_owned()),
                ModelMessage::User(
                    "Review and improve this prompt:\n\n\
                     ### Generated Prompt:\nSummarize the ticket."
                        .to_owned()
                ),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_proxy_turns_are_bounded() {
        let provider = TestModelProvider::with_texts([
            "draft 1",
            "Please use the required format.",
            "draft 2",
            "Please use the required format.",
            "### Generated Prompt:\nFinal.",
            "### Final Approved Prompt:\nFinal, approved.",
            "TERMINATE",
        ]);
        let pipeline = PipelineBuilder::with_model_provider(provider.clone())
            .build();

        let report = pipeline.run("anything").await.unwrap();
        assert_eq!(report.initial_prompt(), "### Generated Prompt:\nFinal.");
        assert_eq!(report.final_prompt(), "Final, approved.");
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_iterations() {
        let provider = TestModelProvider::with_texts([
            "### Generated Prompt:\nDraft.",
            "TERMINATE",
        ]);
        let pipeline = PipelineBuilder::with_model_provider(provider.clone())
            .with_max_iterations(0)
            .build();

        let report = pipeline.run("anything").await.unwrap();
        assert_eq!(report.final_prompt(), "### Generated Prompt:\nDraft.");
        assert!(report.critiques().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_policy_and_events() {
        let provider = TestModelProvider::default();
        provider.add_response(
            PresetResponse::with_text("### Generated Prompt:\nDraft.")
                .with_failures(1)
                .with_failure(PresetFailure::RateLimited),
        );
        provider.add_response(PresetResponse::with_text("TERMINATE"));

        let (event_tx, event_rx) = std::sync::mpsc::channel();
        let pipeline = PipelineBuilder::with_model_provider(provider.clone())
            .with_max_iterations(0)
            .with_retry_policy(RetryPolicy::new(2, Duration::from_secs(3)))
            .on_event(move |event| {
                event_tx.send(event.clone()).ok();
            })
            .build();

        pipeline.run("anything").await.unwrap();
        let events: Vec<_> = event_rx.try_iter().collect();
        assert_eq!(
            events,
            [
                RefinementEvent::Generating,
                RefinementEvent::RateLimited {
                    delay: Duration::from_secs(3)
                },
                RefinementEvent::Generated,
            ]
        );
    }
}
