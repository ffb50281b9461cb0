mod report;

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

pub use self::report::RefinementReport;
use crate::error::Error;
use crate::retry::{self, RetryPolicy};
use crate::round::{self, Collaborator, Responder, Silent};

/// The heading the critic puts in front of the prompt it approves.
pub const APPROVAL_MARKER: &str = "### Final Approved Prompt:";

/// The number of critique iterations used when the caller has no opinion.
pub const DEFAULT_MAX_ITERATIONS: usize = 4;

const DEFAULT_MAX_TURNS: usize = 2;

/// Progress of a refinement, reported through [`RefinerBuilder::on_event`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefinementEvent {
    /// The generator has been asked for the initial prompt.
    Generating,
    /// The initial prompt is available.
    Generated,
    /// The critic has been asked to review the prompt.
    Critiquing {
        /// The current iteration, starting at 1.
        iteration: usize,
        /// The iteration budget.
        max_iterations: usize,
    },
    /// The critic approved a prompt.
    Approved {
        /// The iteration in which it happened.
        iteration: usize,
    },
    /// The critic answered without approving a prompt.
    NeedsImprovement {
        /// The iteration in which it happened.
        iteration: usize,
    },
    /// The critic could not be reached, refinement stops here.
    CritiqueMissing {
        /// The iteration in which it happened.
        iteration: usize,
        /// Why no critique was obtained.
        reason: String,
    },
    /// A round was throttled and will be retried after `delay`.
    RateLimited {
        /// How long the refinement waits before trying again.
        delay: Duration,
    },
}

type EventHandler = Box<dyn Fn(&RefinementEvent) + Send + Sync>;

/// [`Refiner`] builder.
pub struct RefinerBuilder {
    generator: Arc<dyn Collaborator>,
    critic: Arc<dyn Collaborator>,
    responder: Arc<dyn Responder>,
    retry_policy: RetryPolicy,
    max_turns: usize,
    on_event: Option<EventHandler>,
}

impl RefinerBuilder {
    /// Creates a builder with the agent that writes prompts and the agent
    /// that reviews them.
    ///
    /// Rounds end after the first reply unless a responder is set.
    pub fn new<G, C>(generator: G, critic: C) -> Self
    where
        G: Collaborator + 'static,
        C: Collaborator + 'static,
    {
        Self {
            generator: Arc::new(generator),
            critic: Arc::new(critic),
            responder: Arc::new(Silent),
            retry_policy: RetryPolicy::default(),
            max_turns: DEFAULT_MAX_TURNS,
            on_event: None,
        }
    }

    /// Sets the responder that answers the agents within a round.
    #[inline]
    pub fn with_responder<R: Responder + 'static>(
        mut self,
        responder: R,
    ) -> Self {
        self.responder = Arc::new(responder);
        self
    }

    /// Sets how throttled rounds are retried.
    #[inline]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Sets how many times the responder may answer within one round.
    #[inline]
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Attaches a callback to be invoked on refinement progress.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(&RefinementEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_event = Some(Box::new(on_event));
        self
    }

    /// Builds the refiner.
    #[inline]
    pub fn build(self) -> Refiner {
        Refiner {
            generator: self.generator,
            critic: self.critic,
            responder: self.responder,
            retry_policy: self.retry_policy,
            max_turns: self.max_turns,
            on_event: self.on_event,
        }
    }
}

/// Drives the generator and the critic to refine a prompt.
///
/// A refiner holds no state between calls to [`Refiner::refine`], every
/// round starts from a fresh transcript.
pub struct Refiner {
    generator: Arc<dyn Collaborator>,
    critic: Arc<dyn Collaborator>,
    responder: Arc<dyn Responder>,
    retry_policy: RetryPolicy,
    max_turns: usize,
    on_event: Option<EventHandler>,
}

impl Refiner {
    /// Generates a prompt for `user_query` and has it reviewed up to
    /// `max_iterations` times.
    ///
    /// Failing to generate the initial prompt is fatal. A critique that
    /// stays throttled after all retries, or that comes back empty, ends
    /// the review early and the report is built from what was gathered.
    /// Any other critic failure is fatal.
    ///
    /// The final prompt is the approved section of the approving critique.
    /// Without an approval it is the last critique, or the initial prompt
    /// when no critique was obtained.
    pub async fn refine(
        &self,
        user_query: &str,
        max_iterations: usize,
    ) -> Result<RefinementReport, Error> {
        if user_query.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }

        self.emit(RefinementEvent::Generating);
        let opening =
            format!("Generate a prompt for the following query: {user_query}");
        let initial_prompt = self.round(&*self.generator, &opening).await?;
        self.emit(RefinementEvent::Generated);
        info!("initial prompt generated");

        // Unapproved suggestions are never adopted, so the critic always
        // reviews the initial prompt until it approves one.
        let request =
            format!("Review and improve this prompt:\n\n{initial_prompt}");
        let mut critiques = Vec::new();
        let mut approved = None;

        for iteration in 1..=max_iterations {
            self.emit(RefinementEvent::Critiquing {
                iteration,
                max_iterations,
            });
            let critique = match self.round(&*self.critic, &request).await {
                Ok(critique) => critique,
                Err(err) if err.is_rate_limited() || err.is_no_response() => {
                    warn!("no critique in iteration {iteration}: {err}");
                    self.emit(RefinementEvent::CritiqueMissing {
                        iteration,
                        reason: err.to_string(),
                    });
                    break;
                }
                Err(err) => return Err(err),
            };

            let approved_prompt =
                extract_approved_prompt(&critique).map(ToOwned::to_owned);
            critiques.push(critique);
            if let Some(prompt) = approved_prompt {
                info!("prompt approved in iteration {iteration}");
                self.emit(RefinementEvent::Approved { iteration });
                approved = Some(prompt);
                break;
            }
            debug!("prompt needs improvement in iteration {iteration}");
            self.emit(RefinementEvent::NeedsImprovement { iteration });
        }

        let final_prompt = approved
            .or_else(|| critiques.last().cloned())
            .unwrap_or_else(|| initial_prompt.clone());
        Ok(RefinementReport {
            initial_prompt,
            critiques,
            final_prompt,
        })
    }

    async fn round(
        &self,
        collaborator: &dyn Collaborator,
        opening: &str,
    ) -> Result<String, Error> {
        let responder = &*self.responder;
        retry::execute(
            &self.retry_policy,
            || {
                let max_turns = self.max_turns;
                round::run_round(collaborator, responder, opening, max_turns)
            },
            |_, delay| self.emit(RefinementEvent::RateLimited { delay }),
        )
        .instrument(info_span!("round", collaborator = collaborator.name()))
        .await
    }

    #[inline]
    fn emit(&self, event: RefinementEvent) {
        if let Some(on_event) = &self.on_event {
            on_event(&event);
        }
    }
}

/// Returns the prompt following [`APPROVAL_MARKER`] in a critic response.
///
/// The text is taken from the first marker up to the next marker, if the
/// critic repeated it, and trimmed.
pub fn extract_approved_prompt(response: &str) -> Option<&str> {
    response.split(APPROVAL_MARKER).nth(1).map(str::trim)
}
