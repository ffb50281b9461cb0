//! A single bounded exchange with one collaborator.

use async_trait::async_trait;

use crate::error::Error;
use crate::transcript::{Message, Transcript};

/// The word either side can end its message with to close the round.
pub const TERMINATION_WORD: &str = "TERMINATE";

/// The agent consulted in a round.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Returns the name used in logs and errors.
    fn name(&self) -> &str;

    /// Replies to the transcript so far.
    ///
    /// Backend failures must be returned as [`Error::Backend`] with the
    /// backend's own classification, so that throttled rounds can be told
    /// apart and retried.
    async fn reply(&self, transcript: &Transcript) -> Result<String, Error>;
}

/// The opening side of a round, which may answer the collaborator.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Answers the collaborator's latest reply. `None` ends the round.
    async fn respond(
        &self,
        transcript: &Transcript,
    ) -> Result<Option<String>, Error>;
}

/// A responder that never answers, so rounds end after the first reply.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

#[async_trait]
impl Responder for Silent {
    #[inline]
    async fn respond(
        &self,
        _transcript: &Transcript,
    ) -> Result<Option<String>, Error> {
        Ok(None)
    }
}

/// Runs a round and returns its transcript.
///
/// The round starts from a fresh transcript holding only `opening`. The
/// collaborator and the responder then take turns until the responder
/// declines, either side ends a message with [`TERMINATION_WORD`], or the
/// responder has answered `max_turns` times. Errors from either side are
/// returned as they are.
pub async fn exchange<C, R>(
    collaborator: &C,
    responder: &R,
    opening: &str,
    max_turns: usize,
) -> Result<Transcript, Error>
where
    C: Collaborator + ?Sized,
    R: Responder + ?Sized,
{
    let mut transcript = Transcript::new();
    transcript.push(Message::user(opening));

    let mut auto_replies = 0;
    loop {
        let reply = collaborator.reply(&transcript).await?;
        let terminated = is_termination(&reply);
        transcript.push(Message::assistant(reply));
        if terminated {
            debug!("{} ended the round", collaborator.name());
            break;
        }
        if auto_replies >= max_turns {
            debug!("reached {max_turns} auto replies");
            break;
        }

        let Some(answer) = responder.respond(&transcript).await? else {
            break;
        };
        auto_replies += 1;
        let terminated = is_termination(&answer);
        transcript.push(Message::user(answer));
        if terminated {
            break;
        }
    }
    Ok(transcript)
}

/// Runs a round and returns the collaborator's most recent reply.
///
/// Fails with [`Error::NoResponse`] if the round ends without any reply
/// that has content.
pub async fn run_round<C, R>(
    collaborator: &C,
    responder: &R,
    opening: &str,
    max_turns: usize,
) -> Result<String, Error>
where
    C: Collaborator + ?Sized,
    R: Responder + ?Sized,
{
    let transcript =
        exchange(collaborator, responder, opening, max_turns).await?;
    transcript
        .last_assistant_content()
        .filter(|content| !content.trim().is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| Error::NoResponse {
            collaborator: collaborator.name().to_owned(),
        })
}

#[inline]
fn is_termination(content: &str) -> bool {
    content.trim_end().ends_with(TERMINATION_WORD)
}

#[cfg(test)]
mod tests {
    use prompt_refiner_model::{ErrorKind, ModelMessage};
    use prompt_refiner_test_model::{
        PresetFailure, PresetResponse, TestModelProvider,
    };

    use super::*;
    use crate::agent::{Agent, AgentBuilder};
    use crate::transcript::Role;

    fn agent(name: &str, provider: &TestModelProvider) -> Agent {
        AgentBuilder::with_model_provider(name, provider.clone())
            .with_system_prompt(format!("You are {name}."))
            .build()
    }

    fn roles(transcript: &Transcript) -> Vec<Role> {
        transcript.messages().iter().map(|msg| msg.role()).collect()
    }

    #[tokio::test]
    async fn test_silent_responder() {
        let provider = TestModelProvider::with_texts(["Here you go."]);
        let critic = agent("Critic", &provider);

        let transcript = exchange(&critic, &Silent, "Review this.", 2)
            .await
            .unwrap();
        assert_eq!(roles(&transcript), [Role::User, Role::Assistant]);
        assert_eq!(transcript.messages()[0].content(), "Review this.");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].messages,
            vec![
                ModelMessage::System("You are Critic.".to_owned()),
                ModelMessage::User("Review this.".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn test_auto_replies_are_bounded() {
        let collaborator = TestModelProvider::with_texts(["a1", "a2", "a3"]);
        let proxy = TestModelProvider::with_texts(["u1", "u2", "u3"]);

        let reply = run_round(
            &agent("Generator", &collaborator),
            &agent("Proxy", &proxy),
            "Go.",
            2,
        )
        .await
        .unwrap();
        assert_eq!(reply, "a3");
        assert_eq!(collaborator.remaining(), 0);
        assert_eq!(proxy.remaining(), 1);

        // The responder sees its own messages as the assistant side.
        let last_proxy_request = proxy.requests().pop().unwrap();
        assert_eq!(
            last_proxy_request.messages,
            vec![
                ModelMessage::System("You are Proxy.".to_owned()),
                ModelMessage::Assistant("Go.".to_owned()),
                ModelMessage::User("a1".to_owned()),
                ModelMessage::Assistant("u1".to_owned()),
                ModelMessage::User("a2".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn test_termination_word() {
        let collaborator =
            TestModelProvider::with_texts(["Final answer.\nTERMINATE\n"]);
        let proxy = TestModelProvider::with_texts(["more please"]);
        let transcript = exchange(
            &agent("Generator", &collaborator),
            &agent("Proxy", &proxy),
            "Go.",
            2,
        )
        .await
        .unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(proxy.requests().len(), 0);

        let collaborator = TestModelProvider::with_texts(["first", "second"]);
        let proxy = TestModelProvider::with_texts(["thanks TERMINATE"]);
        let reply = run_round(
            &agent("Generator", &collaborator),
            &agent("Proxy", &proxy),
            "Go.",
            2,
        )
        .await
        .unwrap();
        assert_eq!(reply, "first");
        assert_eq!(collaborator.remaining(), 1);
    }

    #[tokio::test]
    async fn test_zero_max_turns() {
        let collaborator = TestModelProvider::with_texts(["only"]);
        let proxy = TestModelProvider::with_texts(["ignored"]);
        let reply = run_round(
            &agent("Generator", &collaborator),
            &agent("Proxy", &proxy),
            "Go.",
            0,
        )
        .await
        .unwrap();
        assert_eq!(reply, "only");
        assert_eq!(proxy.requests().len(), 0);
    }

    #[tokio::test]
    async fn test_empty_reply_is_no_response() {
        let provider = TestModelProvider::with_texts(["  \n"]);
        let err = run_round(&agent("Critic", &provider), &Silent, "Go.", 2)
            .await
            .unwrap_err();
        match err {
            Error::NoResponse { collaborator } => {
                assert_eq!(collaborator, "Critic")
            }
            err => panic!("unexpected error: {err:?}"),
        }
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let provider = TestModelProvider::default();
        provider.add_response(PresetResponse::always_failing(
            PresetFailure::RateLimited,
        ));
        let err = run_round(&agent("Critic", &provider), &Silent, "Go.", 2)
            .await
            .unwrap_err();
        assert_eq!(err.backend_kind(), Some(ErrorKind::RateLimitExceeded));
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_each_round_starts_fresh() {
        let provider = TestModelProvider::with_texts(["one", "two"]);
        let critic = agent("Critic", &provider);
        run_round(&critic, &Silent, "First.", 2).await.unwrap();
        run_round(&critic, &Silent, "Second.", 2).await.unwrap();

        let requests = provider.requests();
        assert_eq!(
            requests[1].messages,
            vec![
                ModelMessage::System("You are Critic.".to_owned()),
                ModelMessage::User("Second.".to_owned()),
            ]
        );
    }
}
