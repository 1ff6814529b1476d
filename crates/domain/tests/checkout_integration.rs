//! Integration tests for the checkout model.
//!
//! These walk a session through the steps the way the orchestration layer
//! does and check the invariants that must hold after every patch.

use common::AddressId;
use domain::{
    Address, BlockingReason, Cart, CartLine, CheckoutSession, CheckoutStep, Money, OrderDraft,
    OrderNotes, PaymentMethod, PaymentMethodKind, SessionPatch, StepGate, SummaryComposer,
};
use proptest::prelude::*;

fn address(id: &str) -> Address {
    Address {
        id: AddressId::new(id),
        line1: "221B Baker Street".to_string(),
        line2: None,
        area: "Marylebone".to_string(),
        city: "London".to_string(),
        state: "LDN".to_string(),
        pincode: "NW16XE".to_string(),
        is_default: false,
    }
}

fn cod() -> PaymentMethod {
    PaymentMethod::new(
        "cod",
        PaymentMethodKind::Cod,
        "Cash on Delivery",
        "cash",
        "Pay when the order arrives",
    )
}

mod session_walkthrough {
    use super::*;

    #[test]
    fn full_forward_walk() {
        let composer = SummaryComposer::default();
        let cart = Cart::new(vec![
            CartLine::new("v-1", 2, Money::from_cents(1_000)),
            CartLine::new("v-2", 1, Money::from_cents(2_500)),
        ]);

        let session = CheckoutSession::default()
            .apply(SessionPatch::new().cart(cart.clone()), &composer)
            .unwrap();
        assert!(!StepGate::can_advance(&session).ok);

        let session = session
            .apply(
                SessionPatch::new()
                    .verified_address(address("a-1"))
                    .step(CheckoutStep::Payment),
                &composer,
            )
            .unwrap();
        assert_eq!(session.step(), CheckoutStep::Payment);
        assert_eq!(
            StepGate::can_advance(&session).blocking_reasons,
            vec![BlockingReason::MissingPayment]
        );

        let session = session
            .apply(
                SessionPatch::new()
                    .selected_payment(cod().to_selection())
                    .step(CheckoutStep::Review)
                    .order_notes(OrderNotes::new("Leave at the door").unwrap()),
                &composer,
            )
            .unwrap();
        assert!(StepGate::can_advance(&session).ok);

        let summary = session.summary().unwrap();
        assert_eq!(summary.subtotal(), Money::from_cents(4_500));
        assert_eq!(summary.tax(), Money::from_cents(360));
        assert_eq!(summary.total(), Money::from_cents(4_500 + 999 + 360));

        let draft = OrderDraft::build(summary, session.cart_snapshot());
        assert_eq!(draft.address_id.as_str(), "a-1");
        assert_eq!(draft.items.len(), 2);
    }

    #[test]
    fn backward_navigation_is_never_blocked() {
        let composer = SummaryComposer::default();
        let session = CheckoutSession::default()
            .apply(
                SessionPatch::new()
                    .verified_address(address("a-1"))
                    .selected_payment(cod().to_selection())
                    .step(CheckoutStep::Review),
                &composer,
            )
            .unwrap();

        let back = session
            .apply(SessionPatch::new().step(CheckoutStep::Payment), &composer)
            .unwrap();
        let back = back
            .apply(SessionPatch::new().step(CheckoutStep::Address), &composer)
            .unwrap();
        assert_eq!(back.step(), CheckoutStep::Address);
        assert!(back.verified_address().is_some());
    }
}

fn arb_cart() -> impl Strategy<Value = Cart> {
    prop::collection::vec((1u32..20, 1i64..100_000), 0..8).prop_map(|lines| {
        Cart::new(
            lines
                .into_iter()
                .enumerate()
                .map(|(i, (qty, cents))| {
                    CartLine::new(format!("v-{i}"), qty, Money::from_cents(cents))
                })
                .collect(),
        )
    })
}

#[derive(Debug, Clone)]
enum Op {
    Step(u8),
    Address,
    ClearAddress,
    Payment,
    ClearPayment,
    Cart(Cart),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6).prop_map(Op::Step),
        Just(Op::Address),
        Just(Op::ClearAddress),
        Just(Op::Payment),
        Just(Op::ClearPayment),
        arb_cart().prop_map(Op::Cart),
    ]
}

proptest! {
    #[test]
    fn summary_total_is_always_sum_of_parts(cart in arb_cart()) {
        let summary = SummaryComposer::default().compose(&cart, Some(&address("a")));
        match summary {
            Some(s) => prop_assert_eq!(s.total(), s.subtotal() + s.shipping() + s.tax()),
            None => prop_assert!(cart.is_empty()),
        }
    }

    #[test]
    fn step_never_exceeds_satisfied_preconditions(ops in prop::collection::vec(arb_op(), 0..30)) {
        let composer = SummaryComposer::default();
        let mut session = CheckoutSession::default();

        for op in ops {
            let patch = match op {
                Op::Step(n) => match CheckoutStep::try_from(n) {
                    Ok(step) => SessionPatch::new().step(step),
                    Err(_) => {
                        prop_assert!(n == 0 || n > 3);
                        continue;
                    }
                },
                Op::Address => SessionPatch::new().verified_address(address("a")),
                Op::ClearAddress => SessionPatch::new().clear_verified_address(),
                Op::Payment => SessionPatch::new().selected_payment(cod().to_selection()),
                Op::ClearPayment => SessionPatch::new().clear_selected_payment(),
                Op::Cart(cart) => SessionPatch::new().cart(cart),
            };
            if let Ok(next) = session.apply(patch, &composer) {
                session = next;
            }

            prop_assert!(session.step() <= StepGate::max_reachable_step(&session));
            prop_assert!((1..=3).contains(&session.step().number()));
            prop_assert_eq!(
                session.summary().is_some(),
                session.verified_address().is_some() && !session.cart_snapshot().is_empty()
            );
        }
    }
}
