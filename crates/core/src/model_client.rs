use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use prompt_refiner_model::{
    ModelFinishReason, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent,
};
use tracing::Instrument;

type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type SendFn = Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// Type-erased handle to a model provider, collecting streamed responses
/// into whole replies.
#[derive(Clone)]
pub struct ModelClient {
    send_fn: SendFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        let send_fn: SendFn = Arc::new(move |req| {
            let message_count = req.messages.len();
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    let resp = fut.await.map_err(boxed)?;
                    collect::<P>(resp).await
                }
                .instrument(trace_span!("model request", message_count)),
            )
        });
        Self { send_fn }
    }

    /// Sends a request and waits for the complete reply.
    #[inline]
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        (self.send_fn)(req).await
    }
}

/// A completely received reply.
#[derive(Clone, Debug)]
pub struct ModelClientResponse {
    pub text: String,
    /// Why the model stopped, if the stream said so.
    pub finish_reason: Option<ModelFinishReason>,
}

fn boxed<E: ModelProviderError>(err: E) -> Box<dyn ModelProviderError> {
    debug!("model request failed: {err}");
    Box::new(err)
}

async fn collect<P: ModelProvider + 'static>(
    resp: P::Response,
) -> SendRequestResult {
    let mut resp = pin!(resp);
    let mut reply = ModelClientResponse {
        text: String::new(),
        finish_reason: None,
    };

    while let Some(event) =
        poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await.map_err(boxed)?
    {
        trace!("received {event:?}");
        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                reply.text.push_str(&delta)
            }
            ModelResponseEvent::Completed(reason) => {
                reply.finish_reason = Some(reason)
            }
        }
    }

    match reply.finish_reason {
        Some(ModelFinishReason::Length) => {
            warn!("reply truncated by the token limit");
        }
        Some(ModelFinishReason::ContentFilter) => {
            warn!("reply cut by the content filter");
        }
        Some(ModelFinishReason::Stop) | None => {}
    }
    trace!("received {} bytes of reply", reply.text.len());
    Ok(reply)
}
