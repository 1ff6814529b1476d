//! Command definitions and handlers.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use checkout::{
    AddressService, AddressVerification, CheckoutConfig, CheckoutFlow, FlowTransition,
    PaymentPipeline, PaymentSelectionScreen, PipelineEvent, PipelineOutcome, PipelineStatus,
    RecordingNavigator, Route, StorefrontClient,
};
use clap::{Args, Parser, Subcommand};
use common::{AddressId, PaymentMethodId};
use domain::{
    Address, AddressDraft, BlockingReason, CardDetails, CartLine, CheckoutSession,
    PaymentSelection, StepGate, Summary,
};
use serde::Serialize;
use serde_json::json;
use session_store::{SessionBackend, SessionStore};

/// Storefront checkout from the command line.
#[derive(Parser, Debug)]
#[command(name = "checkout", about = "Storefront checkout client", version)]
pub struct Cli {
    /// Render command output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Print collected metrics in Prometheus text format on exit
    #[arg(long, global = true)]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the current checkout session
    Status,
    /// Refresh the cart snapshot from the cart service
    Enter,
    /// Move to the next checkout step
    Advance,
    /// Move to the previous checkout step
    Back,
    /// Set the order notes
    Notes { text: String },
    /// List saved addresses
    Addresses,
    /// Verify a shipping address
    #[command(subcommand)]
    Verify(VerifyCommand),
    /// List payment methods
    Methods,
    /// Choose a payment method
    PayWith(PayWithArgs),
    /// Run payment processing and place the order
    Pay,
    /// Abandon the checkout
    Cancel,
}

#[derive(Subcommand, Debug)]
pub enum VerifyCommand {
    /// Verify one of the saved addresses
    Select { id: String },
    /// Create a new address and verify it
    Manual(ManualAddressArgs),
}

#[derive(Args, Debug)]
pub struct ManualAddressArgs {
    #[arg(long)]
    pub street: String,
    #[arg(long)]
    pub line2: Option<String>,
    #[arg(long, default_value = "")]
    pub area: String,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub state: String,
    #[arg(long)]
    pub zip: String,
    /// Save as the default address
    #[arg(long)]
    pub default: bool,
}

impl From<ManualAddressArgs> for AddressDraft {
    fn from(args: ManualAddressArgs) -> Self {
        AddressDraft {
            line2: args.line2,
            area: args.area,
            is_default: args.default,
            ..AddressDraft::new(args.street, args.city, args.state, args.zip)
        }
    }
}

#[derive(Args, Debug)]
pub struct PayWithArgs {
    /// Payment method id
    pub id: String,
    #[arg(long, requires_all = ["expiry", "cvv", "holder"])]
    pub card_number: Option<String>,
    /// Expiry as MM/YY
    #[arg(long)]
    pub expiry: Option<String>,
    #[arg(long)]
    pub cvv: Option<String>,
    #[arg(long)]
    pub holder: Option<String>,
}

impl PayWithArgs {
    fn card(&self) -> Option<CardDetails> {
        Some(CardDetails::new(
            self.card_number.as_deref()?,
            self.expiry.as_deref()?,
            self.cvv.as_deref()?,
            self.holder.as_deref()?,
        ))
    }
}

/// The result of a command, printable as text or JSON.
#[derive(Debug, Clone, Serialize)]
pub struct Output {
    pub message: String,
    pub data: serde_json::Value,
}

impl Output {
    fn new(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }

    /// Renders the output for the terminal.
    pub fn render(&self, json: bool) -> Result<String> {
        if json {
            Ok(serde_json::to_string_pretty(&self.data)?)
        } else {
            Ok(self.message.clone())
        }
    }
}

#[derive(Serialize)]
struct SessionView<'a> {
    step: u8,
    verified_address: Option<&'a Address>,
    selected_payment: Option<&'a PaymentSelection>,
    order_notes: &'a str,
    items: &'a [CartLine],
    summary: Option<&'a Summary>,
    blocking_reasons: Vec<BlockingReason>,
}

impl<'a> SessionView<'a> {
    fn new(session: &'a CheckoutSession) -> Self {
        Self {
            step: session.step().number(),
            verified_address: session.verified_address(),
            selected_payment: session.selected_payment(),
            order_notes: session.order_notes().as_str(),
            items: session.cart_snapshot().lines(),
            summary: session.summary(),
            blocking_reasons: StepGate::validate(session),
        }
    }
}

fn describe(session: &CheckoutSession) -> String {
    let mut lines = vec![format!("Step {}", session.step())];
    lines.push(match session.verified_address() {
        Some(address) => format!("Ship to:  {}", address.one_line()),
        None => "Ship to:  (not verified)".to_string(),
    });
    lines.push(match session.selected_payment() {
        Some(payment) => format!("Payment:  {}", payment.name),
        None => "Payment:  (not selected)".to_string(),
    });
    if !session.order_notes().is_empty() {
        lines.push(format!("Notes:    {}", session.order_notes().as_str()));
    }
    for line in session.cart_snapshot().lines() {
        lines.push(format!(
            "  {} x{} @ {}",
            line.name.as_deref().unwrap_or(line.variant_id.as_str()),
            line.quantity,
            line.unit_price
        ));
    }
    if let Some(summary) = session.summary() {
        lines.push(format!("Subtotal: {}", summary.subtotal()));
        lines.push(format!("Shipping: {}", summary.shipping()));
        lines.push(format!("Tax:      {}", summary.tax()));
        lines.push(format!("Total:    {}", summary.total()));
    }
    for reason in StepGate::validate(session) {
        lines.push(format!("! {reason}"));
    }
    lines.join("\n")
}

fn describe_status(status: &PipelineStatus) -> Option<String> {
    match status {
        PipelineStatus::Idle => None,
        PipelineStatus::Running(phase) => Some(format!("[{phase}]")),
        PipelineStatus::Submitting => Some("Submitting order...".to_string()),
        PipelineStatus::Redirecting {
            messages,
            seconds_left,
        } => Some(format!(
            "{} (returning to checkout in {seconds_left}s)",
            messages.join("; ")
        )),
        PipelineStatus::Completed(order) => Some(format!("Order {} placed", order.display_number())),
        PipelineStatus::Cancelled => Some("Payment processing cancelled".to_string()),
    }
}

/// Runs commands against one session and one storefront.
pub struct App<B: SessionBackend> {
    store: SessionStore<B>,
    client: StorefrontClient,
    config: CheckoutConfig,
}

impl<B: SessionBackend + 'static> App<B> {
    pub fn new(store: SessionStore<B>, client: StorefrontClient, config: CheckoutConfig) -> Self {
        Self {
            store,
            client,
            config,
        }
    }

    fn flow(&self) -> CheckoutFlow<B> {
        CheckoutFlow::new(self.store.clone())
    }

    /// Runs a command. `interrupt` resolving cancels payment processing.
    #[tracing::instrument(skip(self, interrupt))]
    pub async fn run(
        &self,
        command: Command,
        interrupt: impl Future<Output = ()>,
    ) -> Result<Output> {
        match command {
            Command::Status => self.status().await,
            Command::Enter => {
                self.flow()
                    .enter(&self.client)
                    .await
                    .context("failed to load the cart")?;
                self.status().await
            }
            Command::Advance => {
                let transition = self.flow().advance().await?;
                self.transition(transition).await
            }
            Command::Back => {
                let transition = self.flow().back().await?;
                self.transition(transition).await
            }
            Command::Notes { text } => {
                self.flow().set_notes(text).await?;
                self.status().await
            }
            Command::Addresses => self.addresses().await,
            Command::Verify(verify) => self.verify(verify).await,
            Command::Methods => self.methods().await,
            Command::PayWith(args) => self.pay_with(args).await,
            Command::Pay => self.pay(interrupt).await,
            Command::Cancel => {
                let route = self.flow().cancel().await?;
                Ok(Output::new(
                    format!("Checkout abandoned, back to {route}"),
                    json!({ "route": route.path() }),
                ))
            }
        }
    }

    async fn status(&self) -> Result<Output> {
        let session = self.store.get().await;
        let data = serde_json::to_value(SessionView::new(&session))?;
        Ok(Output::new(describe(&session), data))
    }

    async fn transition(&self, transition: FlowTransition) -> Result<Output> {
        match transition {
            FlowTransition::Step(step) => Ok(Output::new(
                format!("Now on step {step}"),
                json!({ "step": step.number() }),
            )),
            FlowTransition::Navigate(route) => Ok(Output::new(
                format!("Continue at {route}"),
                json!({ "route": route.path() }),
            )),
            FlowTransition::Blocked(reasons) => {
                let message = reasons
                    .iter()
                    .map(|r| format!("! {r}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(Output::new(message, json!({ "blocking_reasons": reasons })))
            }
        }
    }

    async fn addresses(&self) -> Result<Output> {
        let addresses = AddressService::list(&self.client)
            .await
            .context("failed to load addresses")?;
        if addresses.is_empty() {
            return Ok(Output::new("No saved addresses", json!([])));
        }
        let message = addresses
            .iter()
            .map(|a| {
                let marker = if a.is_default { " (default)" } else { "" };
                format!("{}{marker}: {}", a.id, a.one_line())
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Output::new(message, serde_json::to_value(&addresses)?))
    }

    async fn verify(&self, command: VerifyCommand) -> Result<Output> {
        let mut screen = AddressVerification::open(self.store.clone(), self.client.clone()).await;
        match command {
            VerifyCommand::Select { id } => {
                if let Some(e) = screen.error() {
                    anyhow::bail!("{}", e.display_message());
                }
                screen.select(&AddressId::new(id))?;
            }
            VerifyCommand::Manual(args) => {
                screen.enter_manually();
                screen.update_draft(args.into());
            }
        }
        let route = screen.confirm().await.map_err(user_error)?;
        let session = self.store.get().await;
        let address = session
            .verified_address()
            .map(Address::one_line)
            .unwrap_or_default();
        Ok(Output::new(
            format!("Verified {address}; continue at {route}"),
            json!({ "route": route.path(), "verified_address": session.verified_address() }),
        ))
    }

    async fn methods(&self) -> Result<Output> {
        let screen =
            PaymentSelectionScreen::open(self.store.clone(), &self.client, &self.config).await?;
        let mut lines: Vec<String> = screen
            .methods()
            .iter()
            .map(|m| {
                let marker = if m.available { "" } else { " (unavailable)" };
                format!("{}: {}{marker} - {}", m.id, m.name, m.description)
            })
            .collect();
        if screen.using_fallback() {
            lines.push("(payment service unavailable; showing default methods)".to_string());
        }
        Ok(Output::new(
            lines.join("\n"),
            json!({ "methods": screen.methods(), "using_fallback": screen.using_fallback() }),
        ))
    }

    async fn pay_with(&self, args: PayWithArgs) -> Result<Output> {
        let mut screen =
            PaymentSelectionScreen::open(self.store.clone(), &self.client, &self.config).await?;
        screen.choose(&PaymentMethodId::new(args.id.clone()))?;
        if let Some(card) = args.card() {
            screen.enter_card(card);
        }
        let session = screen.confirm().await.map_err(user_error)?;
        let selection = session.selected_payment();
        Ok(Output::new(
            format!(
                "Paying with {}",
                selection.map(|s| s.name.as_str()).unwrap_or_default()
            ),
            json!({ "selected_payment": selection }),
        ))
    }

    async fn pay(&self, interrupt: impl Future<Output = ()>) -> Result<Output> {
        match self.flow().enter_processing().await.map_err(user_error)? {
            FlowTransition::Navigate(Route::PaymentProcessing) => {}
            other => return self.transition(other).await,
        }

        let navigator = RecordingNavigator::new();
        let pipeline = Arc::new(PaymentPipeline::new(
            self.store.clone(),
            self.client.clone(),
            navigator.clone(),
            self.config.clone(),
        ));
        let screen = pipeline.mount();
        let cancel = screen.cancel_token();

        let mut status = screen.status();
        let progress = tokio::spawn(async move {
            while status.changed().await.is_ok() {
                if let Some(line) = describe_status(&status.borrow_and_update()) {
                    eprintln!("{line}");
                }
            }
        });

        let finish = screen.finish();
        tokio::pin!(finish);
        tokio::pin!(interrupt);
        let report = tokio::select! {
            report = &mut finish => report?,
            () = &mut interrupt => {
                tracing::info!("interrupted, cancelling payment processing");
                cancel.cancel();
                finish.await?
            }
        };
        progress.abort();

        let routes: Vec<&'static str> = navigator.routes().iter().map(Route::path).collect();
        let (outcome, order) = match &report.outcome {
            PipelineOutcome::OrderPlaced(order) => ("order_placed", Some(order)),
            PipelineOutcome::Redirected { .. } => ("redirected", None),
            PipelineOutcome::Cancelled => ("cancelled", None),
        };
        let data = json!({
            "outcome": outcome,
            "order": order,
            "routes": routes,
            "events": report.events,
        });
        let message = match &report.outcome {
            PipelineOutcome::OrderPlaced(order) => {
                let mut message = format!("Order {} confirmed", order.display_number());
                let reset_failed = report
                    .events
                    .iter()
                    .any(|e| matches!(e, PipelineEvent::SessionResetFailed { .. }));
                if reset_failed {
                    message.push_str(
                        "\nThe checkout session could not be cleared; run `checkout cancel`",
                    );
                }
                message
            }
            PipelineOutcome::Redirected { messages } => {
                format!("{}\nBack at /checkout", messages.join("\n"))
            }
            PipelineOutcome::Cancelled => "Payment processing cancelled".to_string(),
        };
        Ok(Output::new(message, data))
    }
}

/// Flattens a checkout error into the messages the customer should see.
fn user_error(err: checkout::CheckoutError) -> anyhow::Error {
    anyhow::anyhow!(err.user_messages().join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manual_address() {
        let cli = Cli::try_parse_from([
            "checkout", "verify", "manual", "--street", "9 Oak Ave", "--city", "Springfield",
            "--state", "IL", "--zip", "62701", "--default",
        ])
        .unwrap();
        let Command::Verify(VerifyCommand::Manual(args)) = cli.command else {
            panic!("wrong command");
        };
        let draft: AddressDraft = args.into();
        assert!(draft.is_complete());
        assert!(draft.is_default);
        assert_eq!(draft.street, "9 Oak Ave");
    }

    #[test]
    fn test_card_flags_require_each_other() {
        assert!(
            Cli::try_parse_from(["checkout", "pay-with", "credit_card", "--card-number", "4111"])
                .is_err()
        );
        let cli = Cli::try_parse_from([
            "checkout",
            "--json",
            "pay-with",
            "credit_card",
            "--card-number",
            "4111111111111111",
            "--expiry",
            "12/29",
            "--cvv",
            "123",
            "--holder",
            "Ada",
        ])
        .unwrap();
        assert!(cli.json);
        let Command::PayWith(args) = cli.command else {
            panic!("wrong command");
        };
        assert!(args.card().is_some());
    }

    #[test]
    fn test_describe_status() {
        assert_eq!(
            describe_status(&PipelineStatus::Redirecting {
                messages: vec!["Invalid address".to_string()],
                seconds_left: 3,
            })
            .as_deref(),
            Some("Invalid address (returning to checkout in 3s)")
        );
        assert_eq!(describe_status(&PipelineStatus::Idle), None);
    }
}
