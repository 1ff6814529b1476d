//! Payment processing pipeline.
//!
//! Runs on its own screen after the review step: a pre-flight check, four
//! simulated phases in strict sequence, then one order submission. Success
//! navigates to the confirmation screen and only then clears the session.
//! Any failure shows its messages, counts down and returns to checkout with
//! the session intact.

use std::sync::Arc;

use domain::{CheckoutSession, CheckoutStep, OrderDraft, StepGate, Summary};
use serde::Serialize;
use session_store::{SessionBackend, SessionStore};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::cancel::{CancelOnDrop, CancelToken};
use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, MissingField, Result, ServiceError, ServiceKind};
use crate::navigation::{Navigator, Route};
use crate::phases::Phase;
use crate::services::{OrderService, PlacedOrder};

/// What the processing screen is showing.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStatus {
    Idle,
    /// A phase is running.
    Running(Phase),
    /// The order draft has been sent and no answer has arrived yet.
    Submitting,
    /// Showing messages and counting down to the redirect.
    Redirecting {
        messages: Vec<String>,
        seconds_left: u32,
    },
    /// The order was placed.
    Completed(PlacedOrder),
    Cancelled,
}

/// One entry of a run's journal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    PreflightFailed { missing: Vec<MissingField> },
    /// Entered from a step other than review, or with a gate rule unmet.
    EntryRefused { messages: Vec<String> },
    PhaseStarted { phase: Phase },
    PhaseCompleted { phase: Phase },
    OrderSubmitted,
    OrderPlaced { order_id: String },
    /// The order exists but the session could not be cleared.
    SessionResetFailed { message: String },
    OrderFailed { messages: Vec<String> },
    CountdownTick { seconds_left: u32 },
    Navigated { route: String },
    SessionReset,
    Cancelled,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// The order was placed and the session cleared.
    OrderPlaced(PlacedOrder),
    /// The run failed; these messages were shown before returning to
    /// checkout.
    Redirected { messages: Vec<String> },
    /// The screen went away first.
    Cancelled,
}

/// The result of one run plus everything that happened during it.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub outcome: PipelineOutcome,
    pub events: Vec<PipelineEvent>,
}

impl PipelineReport {
    /// Phases that completed, in order.
    pub fn completed_phases(&self) -> Vec<Phase> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::PhaseCompleted { phase } => Some(*phase),
                _ => None,
            })
            .collect()
    }
}

/// Drives a payment processing run.
pub struct PaymentPipeline<B, O, N>
where
    B: SessionBackend,
    O: OrderService,
    N: Navigator,
{
    store: SessionStore<B>,
    orders: O,
    navigator: N,
    config: CheckoutConfig,
    status: watch::Sender<PipelineStatus>,
}

impl<B, O, N> PaymentPipeline<B, O, N>
where
    B: SessionBackend,
    O: OrderService,
    N: Navigator,
{
    pub fn new(store: SessionStore<B>, orders: O, navigator: N, config: CheckoutConfig) -> Self {
        let (status, _) = watch::channel(PipelineStatus::Idle);
        Self {
            store,
            orders,
            navigator,
            config,
            status,
        }
    }

    /// Subscribes to status updates.
    pub fn subscribe(&self) -> watch::Receiver<PipelineStatus> {
        self.status.subscribe()
    }

    /// Checks that the session holds everything the pipeline needs, sits on
    /// the review step and passes the processing gate. Returns the summary
    /// to submit.
    ///
    /// Missing data is reported first as [`CheckoutError::DataIntegrity`],
    /// then a step other than review as [`CheckoutError::WrongStep`], then
    /// unmet gate rules as [`CheckoutError::Precondition`].
    pub fn preflight(session: &CheckoutSession) -> Result<&Summary> {
        let mut missing = Vec::new();
        if session.selected_payment().is_none() {
            missing.push(MissingField::PaymentMethod);
        }
        if session.summary().is_none() {
            missing.push(MissingField::OrderSummary);
        }
        if session.verified_address().is_none() {
            missing.push(MissingField::ShippingAddress);
        }
        let Some(summary) = session.summary().filter(|_| missing.is_empty()) else {
            return Err(CheckoutError::DataIntegrity(missing));
        };

        if session.step() != CheckoutStep::Review {
            return Err(CheckoutError::WrongStep {
                expected: CheckoutStep::Review,
                actual: session.step(),
            });
        }

        let decision = StepGate::can_enter_processing(session);
        if !decision.ok {
            return Err(CheckoutError::Precondition(decision.blocking_reasons));
        }
        Ok(summary)
    }

    /// Runs the pipeline once.
    ///
    /// Every sleep races `token`. A cancelled run navigates nowhere, submits
    /// nothing after the cancel point and leaves the session alone.
    #[tracing::instrument(skip_all)]
    pub async fn run(&self, token: &CancelToken) -> Result<PipelineReport> {
        metrics::counter!("checkout_pipeline_runs_total").increment(1);
        let started = Instant::now();
        let mut events = Vec::new();

        let session = self.store.get().await;
        let summary = match Self::preflight(&session) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, "payment processing refused before any phase");
                let messages = e.user_messages();
                events.push(match e {
                    CheckoutError::DataIntegrity(missing) => {
                        PipelineEvent::PreflightFailed { missing }
                    }
                    _ => PipelineEvent::EntryRefused {
                        messages: messages.clone(),
                    },
                });
                return Ok(self.fail(token, messages, events, started).await);
            }
        };

        for phase in Phase::ALL {
            tracing::info!(phase = %phase, "payment phase started");
            self.status.send_replace(PipelineStatus::Running(phase));
            events.push(PipelineEvent::PhaseStarted { phase });
            if token
                .sleep(self.config.phase_timings.duration(phase))
                .await
                .is_err()
            {
                return Ok(self.cancelled(events));
            }
            events.push(PipelineEvent::PhaseCompleted { phase });
        }

        let draft = OrderDraft::build(summary, session.cart_snapshot());
        self.status.send_replace(PipelineStatus::Submitting);
        events.push(PipelineEvent::OrderSubmitted);
        tracing::info!(total = %draft.total_amount, items = draft.items.len(), "submitting order");

        let submitted = tokio::select! {
            biased;
            () = token.cancelled() => None,
            result = tokio::time::timeout(self.config.order_timeout, self.orders.create(&draft)) => {
                Some(result)
            }
        };
        let result = match submitted {
            None => return Ok(self.cancelled(events)),
            Some(Ok(result)) => result,
            Some(Err(_elapsed)) => {
                tracing::warn!(timeout = ?self.config.order_timeout, "order request timed out");
                Err(ServiceError::unreachable(ServiceKind::Orders).into())
            }
        };

        match result {
            Ok(order) => {
                tracing::info!(order_id = %order.id, "order placed");
                events.push(PipelineEvent::OrderPlaced {
                    order_id: order.id.to_string(),
                });

                let route = Route::OrderConfirmation(order.clone());
                events.push(PipelineEvent::Navigated {
                    route: route.path().to_string(),
                });
                self.navigator.navigate(route);

                match self.store.reset().await {
                    Ok(()) => events.push(PipelineEvent::SessionReset),
                    Err(e) => {
                        tracing::error!(
                            order_id = %order.id,
                            error = %e,
                            "order placed but checkout session was not cleared"
                        );
                        metrics::counter!("checkout_session_reset_failures_total").increment(1);
                        events.push(PipelineEvent::SessionResetFailed {
                            message: e.to_string(),
                        });
                    }
                }

                self.status
                    .send_replace(PipelineStatus::Completed(order.clone()));
                metrics::histogram!("checkout_pipeline_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                Ok(PipelineReport {
                    outcome: PipelineOutcome::OrderPlaced(order),
                    events,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "order submission failed");
                let messages = e.user_messages();
                events.push(PipelineEvent::OrderFailed {
                    messages: messages.clone(),
                });
                Ok(self.fail(token, messages, events, started).await)
            }
        }
    }

    /// Shows `messages`, counts down and returns to checkout.
    async fn fail(
        &self,
        token: &CancelToken,
        messages: Vec<String>,
        mut events: Vec<PipelineEvent>,
        started: Instant,
    ) -> PipelineReport {
        metrics::counter!("checkout_pipeline_failed").increment(1);

        for seconds_left in (1..=self.config.redirect_countdown_secs).rev() {
            self.status.send_replace(PipelineStatus::Redirecting {
                messages: messages.clone(),
                seconds_left,
            });
            events.push(PipelineEvent::CountdownTick { seconds_left });
            if token.sleep(self.config.countdown_tick).await.is_err() {
                return self.cancelled(events);
            }
        }
        self.status.send_replace(PipelineStatus::Redirecting {
            messages: messages.clone(),
            seconds_left: 0,
        });

        events.push(PipelineEvent::Navigated {
            route: Route::Checkout.path().to_string(),
        });
        self.navigator.navigate(Route::Checkout);
        metrics::histogram!("checkout_pipeline_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        PipelineReport {
            outcome: PipelineOutcome::Redirected { messages },
            events,
        }
    }

    fn cancelled(&self, mut events: Vec<PipelineEvent>) -> PipelineReport {
        tracing::info!("payment processing cancelled");
        metrics::counter!("checkout_pipeline_cancelled_total").increment(1);
        self.status.send_replace(PipelineStatus::Cancelled);
        events.push(PipelineEvent::Cancelled);
        PipelineReport {
            outcome: PipelineOutcome::Cancelled,
            events,
        }
    }
}

impl<B, O, N> PaymentPipeline<B, O, N>
where
    B: SessionBackend + 'static,
    O: OrderService + 'static,
    N: Navigator + 'static,
{
    /// Starts a run owned by a new processing screen. Dropping the screen
    /// cancels the run.
    pub fn mount(self: Arc<Self>) -> ProcessingScreen {
        let token = CancelToken::new();
        let guard = token.drop_guard();
        let status = self.subscribe();
        let handle = tokio::spawn(async move { self.run(&token).await });
        ProcessingScreen {
            guard,
            status,
            handle,
        }
    }
}

/// A mounted processing screen.
pub struct ProcessingScreen {
    guard: CancelOnDrop,
    status: watch::Receiver<PipelineStatus>,
    handle: JoinHandle<Result<PipelineReport>>,
}

impl ProcessingScreen {
    /// Current and future status updates.
    pub fn status(&self) -> watch::Receiver<PipelineStatus> {
        self.status.clone()
    }

    /// A token that cancels this screen's run.
    pub fn cancel_token(&self) -> CancelToken {
        self.guard.token().clone()
    }

    /// Unmounts the screen, cancelling any pending timer.
    pub fn unmount(&self) {
        self.guard.token().cancel();
    }

    /// Waits for the run to end.
    pub async fn finish(self) -> Result<PipelineReport> {
        let ProcessingScreen { guard, handle, .. } = self;
        let report = handle.await.map_err(|e| {
            tracing::error!(error = %e, "payment processing task failed");
            CheckoutError::Cancelled
        })?;
        drop(guard);
        report
    }
}
