//! Latest-wins submission of the form state to the solver.
//!
//! Every call to [`SubmissionController::submit`] starts a new generation and
//! cancels the previous request. A reply is only handed back while its
//! generation is still current, so a late answer to an older request can never
//! overwrite the output of a newer one, whether or not the transport honored
//! the abort.

use crate::{defaults, CooldownEntry, SolvePayload, SolveResponse};
use futures::future::{FutureExt, LocalBoxFuture};
use gloo_net::http::Request;
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    #[error("request body is {size} bytes, the solver accepts at most {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("could not encode request: {0}")]
    Encode(String),

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("solver replied with HTTP {status}")]
    Status { status: u16 },

    #[error("could not read solver reply: {0}")]
    Decode(String),

    #[error("request was cancelled")]
    Cancelled,
}

/// Cancellation flag shared between the controller and one request.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
    on_cancel: Rc<RefCell<Option<Box<dyn FnOnce()>>>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Run `hook` when the token is cancelled (immediately if it already is).
    pub fn on_cancel(&self, hook: impl FnOnce() + 'static) {
        if self.is_cancelled() {
            hook();
        } else {
            *self.on_cancel.borrow_mut() = Some(Box::new(hook));
        }
    }

    pub fn cancel(&self) {
        if self.cancelled.replace(true) {
            return;
        }
        if let Some(hook) = self.on_cancel.borrow_mut().take() {
            hook();
        }
    }
}

/// Encode `payload` as the JSON request body, refusing bodies the solver
/// would reject for size.
pub fn encode_payload(payload: &SolvePayload) -> Result<String, SolveError> {
    let body = serde_json::to_string(payload).map_err(|e| SolveError::Encode(e.to_string()))?;
    if body.len() > defaults::MAX_PAYLOAD_BYTES {
        return Err(SolveError::PayloadTooLarge {
            size: body.len(),
            limit: defaults::MAX_PAYLOAD_BYTES,
        });
    }
    Ok(body)
}

/// Something that can deliver an encoded payload to the solver.
pub trait SolveTransport {
    fn solve(
        &self,
        body: String,
        cancel: CancelToken,
    ) -> LocalBoxFuture<'static, Result<SolveResponse, SolveError>>;
}

/// `POST` with `gloo-net`, aborted through an `AbortController`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        HttpTransport { url: url.into() }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(defaults::SOLVE_URL)
    }
}

impl SolveTransport for HttpTransport {
    fn solve(
        &self,
        body: String,
        cancel: CancelToken,
    ) -> LocalBoxFuture<'static, Result<SolveResponse, SolveError>> {
        let url = self.url.clone();
        async move {
            let transport_err = |e: gloo_net::Error| SolveError::Transport {
                url: url.clone(),
                reason: e.to_string(),
            };

            let controller = web_sys::AbortController::new().ok();
            let signal = controller.as_ref().map(|c| c.signal());
            if let Some(controller) = controller {
                cancel.on_cancel(move || controller.abort());
            }

            let response = Request::post(&url)
                .header("Content-Type", "application/json")
                .abort_signal(signal.as_ref())
                .body(body)
                .map_err(transport_err)?
                .send()
                .await
                .map_err(|e| {
                    if cancel.is_cancelled() {
                        SolveError::Cancelled
                    } else {
                        transport_err(e)
                    }
                })?;

            let status = response.status();
            match response.json::<SolveResponse>().await {
                Ok(reply) => Ok(reply),
                Err(_) if !response.ok() => Err(SolveError::Status { status }),
                Err(e) => Err(SolveError::Decode(e.to_string())),
            }
        }
        .boxed_local()
    }
}

/// What the page should do with a finished submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Replace the output pane.
    Output(String),
    /// Show a blocking alert; leave the output pane alone.
    Alert(String),
}

pub struct SubmissionController<T: SolveTransport> {
    transport: T,
    generation: Cell<u64>,
    pending: Cell<bool>,
    in_flight: RefCell<Option<CancelToken>>,
}

impl<T: SolveTransport> SubmissionController<T> {
    pub fn new(transport: T) -> Self {
        SubmissionController {
            transport,
            generation: Cell::new(0),
            pending: Cell::new(false),
            in_flight: RefCell::new(None),
        }
    }

    /// True when no request of the current generation is outstanding.
    pub fn is_idle(&self) -> bool {
        !self.pending.get()
    }

    /// Abort the in-flight request and invalidate its generation.
    pub fn cancel(&self) {
        self.generation.set(self.generation.get() + 1);
        self.pending.set(false);
        if let Some(token) = self.in_flight.borrow_mut().take() {
            debug!("Cancelling in-flight solve request");
            token.cancel();
        }
    }

    /// Send the committed state and wait for the reply.
    ///
    /// Returns `None` when a newer submission (or `cancel`) superseded this
    /// one while it was in flight.
    pub async fn submit(&self, template: &str, cooldowns: &[CooldownEntry]) -> Option<Outcome> {
        self.cancel();
        let generation = self.generation.get();
        let token = CancelToken::new();
        *self.in_flight.borrow_mut() = Some(token.clone());
        self.pending.set(true);

        let payload = SolvePayload::new(template, cooldowns);
        info!(
            "Solving generation {} ({} cooldowns, {} template bytes)",
            generation,
            payload.cooldowns.len(),
            payload.template.len()
        );
        let result = match encode_payload(&payload) {
            Ok(body) => self.transport.solve(body, token).await,
            Err(e) => Err(e),
        };

        if self.generation.get() != generation {
            debug!("Discarding reply for stale generation {}", generation);
            return None;
        }
        self.pending.set(false);
        self.in_flight.borrow_mut().take();

        Some(match result {
            Ok(SolveResponse::Output(text)) => Outcome::Output(text),
            Ok(SolveResponse::Error(message)) => {
                info!("Solver rejected the note: {}", message);
                Outcome::Alert(message)
            }
            Err(e) => {
                warn!("Solve request failed: {}", e);
                Outcome::Alert(e.to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CooldownSeconds;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use futures::future::join;

    /// Transport whose replies are released by the test.
    #[derive(Clone, Default)]
    struct FakeTransport {
        sent: Rc<RefCell<Vec<serde_json::Value>>>,
        tokens: Rc<RefCell<Vec<CancelToken>>>,
        replies: Rc<RefCell<Vec<oneshot::Sender<Result<SolveResponse, SolveError>>>>>,
    }

    impl FakeTransport {
        fn reply(&self, index: usize, reply: Result<SolveResponse, SolveError>) {
            let (tx, _) = oneshot::channel();
            let sender = std::mem::replace(&mut self.replies.borrow_mut()[index], tx);
            let _ = sender.send(reply);
        }
    }

    impl SolveTransport for FakeTransport {
        fn solve(
            &self,
            body: String,
            cancel: CancelToken,
        ) -> LocalBoxFuture<'static, Result<SolveResponse, SolveError>> {
            let (tx, rx) = oneshot::channel();
            self.sent.borrow_mut().push(serde_json::from_str(&body).unwrap());
            self.tokens.borrow_mut().push(cancel);
            self.replies.borrow_mut().push(tx);
            async move { rx.await.unwrap_or(Err(SolveError::Cancelled)) }.boxed_local()
        }
    }

    fn tranquility() -> Vec<CooldownEntry> {
        vec![CooldownEntry {
            display_name: "Tranquility".to_string(),
            cooldown: CooldownSeconds::Number(180.0),
            group_name: "Healer, Druid".to_string(),
        }]
    }

    #[test]
    fn output_reply_is_returned() {
        let transport = FakeTransport::default();
        let controller = SubmissionController::new(transport.clone());

        let cooldowns = tranquility();
        let run = controller.submit("{cooldowns}", &cooldowns);
        let answer = async {
            transport.reply(0, Ok(SolveResponse::Output("note".to_string())));
        };
        let (outcome, _) = block_on(join(run, answer));

        assert_eq!(outcome, Some(Outcome::Output("note".to_string())));
        assert!(controller.is_idle());
        let sent = transport.sent.borrow();
        assert_eq!(
            sent[0],
            serde_json::json!({
                "template": "{cooldowns}",
                "cooldowns": [{
                    "displayName": "Tranquility",
                    "cooldown": 180.0,
                    "groupNames": ["Healer", "Druid"]
                }]
            })
        );
    }

    #[test]
    fn server_error_becomes_alert() {
        let transport = FakeTransport::default();
        let controller = SubmissionController::new(transport.clone());

        let cooldowns = tranquility();
        let run = controller.submit("", &cooldowns);
        let answer = async {
            transport.reply(0, Ok(SolveResponse::Error("bad template".to_string())));
        };
        let (outcome, _) = block_on(join(run, answer));

        assert_eq!(outcome, Some(Outcome::Alert("bad template".to_string())));
    }

    #[test]
    fn transport_failure_clears_pending_and_alerts() {
        let transport = FakeTransport::default();
        let controller = SubmissionController::new(transport.clone());

        let cooldowns = tranquility();
        let run = controller.submit("", &cooldowns);
        let answer = async {
            transport.reply(
                0,
                Err(SolveError::Transport {
                    url: "/solve".to_string(),
                    reason: "offline".to_string(),
                }),
            );
        };
        let (outcome, _) = block_on(join(run, answer));

        assert_eq!(
            outcome,
            Some(Outcome::Alert("request to /solve failed: offline".to_string()))
        );
        assert!(controller.is_idle());
    }

    #[test]
    fn newer_submission_supersedes_older_reply() {
        let transport = FakeTransport::default();
        let controller = SubmissionController::new(transport.clone());

        let cooldowns = tranquility();
        let first = controller.submit("old", &cooldowns);
        let second = controller.submit("new", &cooldowns);
        let answers = async {
            // The stale reply arrives last, as if the abort was ignored.
            transport.reply(1, Ok(SolveResponse::Output("new note".to_string())));
            transport.reply(0, Ok(SolveResponse::Output("old note".to_string())));
        };

        let run_both = join(first, second);
        let ((first, second), _) = block_on(join(run_both, answers));

        assert_eq!(first, None);
        assert_eq!(second, Some(Outcome::Output("new note".to_string())));
        assert!(transport.tokens.borrow()[0].is_cancelled());
        assert!(!transport.tokens.borrow()[1].is_cancelled());
    }

    #[test]
    fn cancel_discards_the_pending_reply() {
        let transport = FakeTransport::default();
        let controller = SubmissionController::new(transport.clone());

        let cooldowns = tranquility();
        let run = controller.submit("", &cooldowns);
        let answer = async {
            controller.cancel();
            transport.reply(0, Ok(SolveResponse::Output("late".to_string())));
        };
        let (outcome, _) = block_on(join(run, answer));

        assert_eq!(outcome, None);
        assert!(controller.is_idle());
        assert!(transport.tokens.borrow()[0].is_cancelled());
    }

    #[test]
    fn oversized_payload_is_not_sent() {
        let transport = FakeTransport::default();
        let controller = SubmissionController::new(transport.clone());
        let template = "x".repeat(defaults::MAX_PAYLOAD_BYTES + 1);
        let cooldowns = tranquility();

        let outcome = block_on(controller.submit(&template, &cooldowns));

        match outcome {
            Some(Outcome::Alert(message)) => {
                assert!(message.contains("the solver accepts at most 16384"), "{}", message)
            }
            other => panic!("expected an alert, got {:?}", other),
        }
        assert!(transport.sent.borrow().is_empty());
        assert!(controller.is_idle());
    }

    #[test]
    fn encode_accepts_a_body_at_the_limit() {
        let empty = SolvePayload::new("", &[]);
        let overhead = encode_payload(&empty).unwrap().len();
        let template = "x".repeat(defaults::MAX_PAYLOAD_BYTES - overhead);

        let body = encode_payload(&SolvePayload::new(&template, &[])).unwrap();
        assert_eq!(body.len(), defaults::MAX_PAYLOAD_BYTES);

        let over = SolvePayload::new(&format!("{}x", template), &[]);
        assert_eq!(
            encode_payload(&over),
            Err(SolveError::PayloadTooLarge {
                size: defaults::MAX_PAYLOAD_BYTES + 1,
                limit: defaults::MAX_PAYLOAD_BYTES,
            })
        );
    }

    #[test]
    fn cancel_hook_runs_once() {
        let token = CancelToken::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        token.on_cancel(move || counter.set(counter.get() + 1));

        token.cancel();
        token.cancel();

        assert_eq!(hits.get(), 1);
    }
}
