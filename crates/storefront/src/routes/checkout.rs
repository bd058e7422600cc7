//! Checkout route handlers.
//!
//! Lock order is checkout, auth, cart. Processor calls and the cash-order
//! delay happen with no lock held; the step is re-checked afterwards.

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use kiosk_core::PaymentMethod;

use super::payments::IntentCreated;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{Order, ShippingAddress};
use crate::payments::CreateIntent;
use crate::services::{CartSnapshot, CheckoutError, CheckoutStep, CheckoutView};
use crate::state::AppState;

/// Payment selection request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSelection {
    pub method: PaymentMethod,
    #[serde(default)]
    pub accept_terms: bool,
}

/// Card confirmation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCard {
    pub payment_intent_id: String,
}

/// Order placed response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlaced {
    pub order: Order,
    pub step: CheckoutStep,
}

fn view(state: &AppState) -> CheckoutView {
    let checkout = state.checkout();
    let auth = state.auth();
    let cart = state.cart();
    checkout.view(&cart, auth.user())
}

/// Current step, collected details, and totals.
pub async fn show(State(state): State<AppState>) -> Json<CheckoutView> {
    Json(view(&state))
}

/// Submit the shipping address.
#[instrument(skip_all)]
pub async fn shipping(
    State(state): State<AppState>,
    Json(address): Json<ShippingAddress>,
) -> Result<Json<CheckoutView>> {
    {
        let mut checkout = state.checkout();
        let auth = state.auth();
        let cart = state.cart();
        checkout.submit_shipping(address, &cart, auth.user())?;
    }
    Ok(Json(view(&state)))
}

/// Choose the payment method.
#[instrument(skip(state))]
pub async fn payment(
    State(state): State<AppState>,
    Json(selection): Json<PaymentSelection>,
) -> Result<Json<CheckoutView>> {
    state
        .checkout()
        .select_payment(selection.method, selection.accept_terms)?;
    Ok(Json(view(&state)))
}

/// Go back one step.
pub async fn back(State(state): State<AppState>) -> Json<CheckoutView> {
    state.checkout().back();
    Json(view(&state))
}

/// Start the checkout over.
pub async fn reset(State(state): State<AppState>) -> Json<CheckoutView> {
    state.checkout().reset();
    Json(view(&state))
}

/// Create a payment intent for the checkout total.
///
/// The cart is snapshotted here; the card order is later built from this
/// snapshot even if the cart changes before confirmation.
#[instrument(skip(state))]
pub async fn card_intent(State(state): State<AppState>) -> Result<Json<IntentCreated>> {
    let (snapshot, item_count) = {
        let checkout = state.checkout();
        checkout.require(CheckoutStep::CardPayment, "create a payment intent")?;
        let cart = state.cart();
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }
        (CartSnapshot::of(&cart), cart.total_items())
    };

    let mut metadata = BTreeMap::new();
    metadata.insert("itemCount".to_string(), item_count.to_string());
    metadata.insert(
        "shippingCost".to_string(),
        snapshot.totals.shipping_cost.to_string(),
    );

    let request = CreateIntent::new(
        snapshot.totals.total,
        state.config().payments.default_currency,
        metadata,
    )?;
    let intent = state.payments().create_intent(&request).await?;

    state
        .checkout()
        .attach_intent(intent.id.clone(), request.amount, snapshot)?;

    Ok(Json(IntentCreated {
        client_secret: intent.client_secret,
        payment_intent_id: intent.id,
    }))
}

/// Record the order once the processor reports the intent as succeeded for
/// the amount that was requested.
#[instrument(skip(state))]
pub async fn card_confirm(
    State(state): State<AppState>,
    Json(request): Json<ConfirmCard>,
) -> Result<Json<OrderPlaced>> {
    state.checkout().pending_intent(&request.payment_intent_id)?;

    let intent = state
        .payments()
        .retrieve_intent(&request.payment_intent_id)
        .await?;

    let order = {
        let mut checkout = state.checkout();
        let mut cart = state.cart();
        checkout.complete_card_payment(&intent, &mut cart)?
    };

    add_breadcrumb("checkout", "Card order placed", Some(&[("order_id", order.id.as_str())]));
    Ok(Json(OrderPlaced {
        order,
        step: CheckoutStep::Confirmed,
    }))
}

/// Place a cash-on-delivery order after the simulated processing delay.
#[instrument(skip(state))]
pub async fn cash(State(state): State<AppState>) -> Result<Json<OrderPlaced>> {
    state
        .checkout()
        .require(CheckoutStep::CashOnDelivery, "place a cash order")?;

    let delay = state.config().simulation.cash_order_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let order = {
        let mut checkout = state.checkout();
        let mut cart = state.cart();
        checkout.complete_cash_order(&mut cart)?
    };

    add_breadcrumb("checkout", "Cash order placed", Some(&[("order_id", order.id.as_str())]));
    Ok(Json(OrderPlaced {
        order,
        step: CheckoutStep::Confirmed,
    }))
}

/// The most recently placed order.
pub async fn last_order(State(state): State<AppState>) -> Result<Json<Order>> {
    state
        .checkout()
        .last_order()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no order has been placed".to_string()))
}
