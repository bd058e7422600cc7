//! Checkout step machine.
//!
//! ```text
//! Shipping -> PaymentSelection -> CardPayment ----> Confirmed
//!                              \-> CashOnDelivery -/
//! ```
//!
//! The machine only tracks the step and the collected details. Talking to
//! the payment processor and waiting out the cash-order delay happen in the
//! route handlers so no lock is held across an `.await`.
//!
//! A card order is built from the cart as it was when the payment intent was
//! created, not from the cart at confirmation time.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use kiosk_core::{Email, OrderStatus, PaymentMethod};

use super::CartService;
use crate::models::{AuthUser, CartItem, Order, OrderTotals, ShippingAddress};
use crate::payments::PaymentIntent;
use crate::storage::{self, KeyValueStore, StorageError, keys};

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10,11}$").expect("Invalid regex"));

/// Per-field validation messages, keyed by the camelCase field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Checkout steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckoutStep {
    Shipping,
    PaymentSelection,
    CardPayment,
    CashOnDelivery,
    Confirmed,
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Shipping => "shipping",
            Self::PaymentSelection => "payment-selection",
            Self::CardPayment => "card-payment",
            Self::CashOnDelivery => "cash-on-delivery",
            Self::Confirmed => "confirmed",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while moving through checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout needs at least one cart line.
    #[error("cart is empty")]
    EmptyCart,

    /// One or more fields failed validation.
    #[error("validation failed")]
    Validation(FieldErrors),

    /// The requested action is not allowed in the current step.
    #[error("cannot {action} during the {current} step")]
    InvalidStep {
        action: &'static str,
        current: CheckoutStep,
    },

    /// Card confirmation without a created payment intent.
    #[error("no payment intent has been created for this checkout")]
    NoPendingIntent,

    /// Confirmation for an intent other than the one created here.
    #[error("payment intent {0} does not belong to this checkout")]
    IntentMismatch(String),

    /// The processor has not captured the payment.
    #[error("payment not completed (status: {status})")]
    PaymentNotCompleted { status: String },

    /// The processor captured a different amount than the order total.
    #[error("payment intent amount {charged} does not match the order amount {expected}")]
    AmountMismatch { charged: i64, expected: i64 },

    /// The order record could not be saved.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Snapshot of the checkout for responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub totals: OrderTotals,
    pub payment_intent_id: Option<String>,
}

/// Cart lines and totals frozen when a payment intent is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub totals: OrderTotals,
}

impl CartSnapshot {
    #[must_use]
    pub fn of(cart: &CartService) -> Self {
        Self {
            items: cart.items().to_vec(),
            totals: OrderTotals::for_subtotal(cart.total_price()),
        }
    }
}

/// A created payment intent awaiting confirmation.
#[derive(Debug, Clone)]
struct PendingIntent {
    id: String,
    /// Amount requested from the processor, in minor units.
    amount: i64,
    snapshot: CartSnapshot,
}

/// The single in-progress checkout.
pub struct CheckoutService {
    step: CheckoutStep,
    shipping: ShippingAddress,
    method: PaymentMethod,
    pending_intent: Option<PendingIntent>,
    store: Arc<dyn KeyValueStore>,
}

impl CheckoutService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            step: CheckoutStep::Shipping,
            shipping: ShippingAddress::default(),
            method: PaymentMethod::default(),
            pending_intent: None,
            store,
        }
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Current step, details, and totals for `cart`.
    ///
    /// The shipping email falls back to the signed-in user's address. While
    /// a payment intent is pending the totals are the ones being charged.
    #[must_use]
    pub fn view(&self, cart: &CartService, user: Option<&AuthUser>) -> CheckoutView {
        let mut shipping_address = self.shipping.clone();
        prefill_email(&mut shipping_address, user);

        CheckoutView {
            step: self.step,
            shipping_address,
            payment_method: self.method,
            totals: self.pending_intent.as_ref().map_or_else(
                || OrderTotals::for_subtotal(cart.total_price()),
                |pending| pending.snapshot.totals,
            ),
            payment_intent_id: self.pending_intent.as_ref().map(|p| p.id.clone()),
        }
    }

    /// Validate the shipping details and move to payment selection.
    ///
    /// Allowed from `Shipping`, from `PaymentSelection` (editing), and from
    /// `Confirmed`, where it starts a new checkout.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart`, `CheckoutError::Validation` with the
    /// failing fields, or `CheckoutError::InvalidStep` while a payment is in
    /// progress.
    pub fn submit_shipping(
        &mut self,
        mut address: ShippingAddress,
        cart: &CartService,
        user: Option<&AuthUser>,
    ) -> Result<(), CheckoutError> {
        match self.step {
            CheckoutStep::Shipping | CheckoutStep::PaymentSelection => {}
            CheckoutStep::Confirmed => self.reset(),
            current => {
                return Err(CheckoutError::InvalidStep {
                    action: "edit shipping",
                    current,
                });
            }
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        prefill_email(&mut address, user);
        let result = validate_shipping(&address);
        // Keep what was typed so the form can be shown again with errors
        self.shipping = address;
        result.map_err(CheckoutError::Validation)?;

        self.step = CheckoutStep::PaymentSelection;
        Ok(())
    }

    /// Choose how to pay. Terms must be accepted.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` (field `terms`) if the terms were
    /// not accepted, `CheckoutError::InvalidStep` outside `PaymentSelection`.
    pub fn select_payment(
        &mut self,
        method: PaymentMethod,
        accept_terms: bool,
    ) -> Result<CheckoutStep, CheckoutError> {
        self.require(CheckoutStep::PaymentSelection, "select a payment method")?;

        if !accept_terms {
            let mut fields = FieldErrors::new();
            fields.insert("terms", "You must accept the terms of use".to_string());
            return Err(CheckoutError::Validation(fields));
        }

        self.method = method;
        self.step = match method {
            PaymentMethod::CreditCard => CheckoutStep::CardPayment,
            PaymentMethod::CashOnDelivery => CheckoutStep::CashOnDelivery,
        };
        Ok(self.step)
    }

    /// Step back once. No-op in `Shipping` and `Confirmed`.
    pub fn back(&mut self) -> CheckoutStep {
        self.step = match self.step {
            CheckoutStep::PaymentSelection => CheckoutStep::Shipping,
            CheckoutStep::CardPayment | CheckoutStep::CashOnDelivery => {
                self.pending_intent = None;
                CheckoutStep::PaymentSelection
            }
            step @ (CheckoutStep::Shipping | CheckoutStep::Confirmed) => step,
        };
        self.step
    }

    /// Start over with empty details.
    pub fn reset(&mut self) {
        self.step = CheckoutStep::Shipping;
        self.shipping = ShippingAddress::default();
        self.method = PaymentMethod::default();
        self.pending_intent = None;
    }

    /// Check that the machine is in `expected` before an external call.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidStep` otherwise.
    pub fn require(&self, expected: CheckoutStep, action: &'static str) -> Result<(), CheckoutError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::InvalidStep {
                action,
                current: self.step,
            })
        }
    }

    /// Remember the payment intent created for this checkout, together with
    /// the requested `amount` (minor units) and the cart it pays for.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidStep` outside `CardPayment`.
    pub fn attach_intent(
        &mut self,
        intent_id: String,
        amount: i64,
        snapshot: CartSnapshot,
    ) -> Result<(), CheckoutError> {
        self.require(CheckoutStep::CardPayment, "attach a payment intent")?;
        self.pending_intent = Some(PendingIntent {
            id: intent_id,
            amount,
            snapshot,
        });
        Ok(())
    }

    /// The intent awaiting confirmation, checked against `intent_id`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoPendingIntent` or
    /// `CheckoutError::IntentMismatch`.
    pub fn pending_intent(&self, intent_id: &str) -> Result<&str, CheckoutError> {
        self.pending(intent_id).map(|pending| pending.id.as_str())
    }

    fn pending(&self, intent_id: &str) -> Result<&PendingIntent, CheckoutError> {
        self.require(CheckoutStep::CardPayment, "confirm a card payment")?;
        match &self.pending_intent {
            None => Err(CheckoutError::NoPendingIntent),
            Some(pending) if pending.id == intent_id => Ok(pending),
            Some(_) => Err(CheckoutError::IntentMismatch(intent_id.to_string())),
        }
    }

    /// Record a card order from the cart snapshot taken when `intent` was
    /// created. The cart is emptied afterwards.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::PaymentNotCompleted` unless the intent
    /// succeeded, `CheckoutError::AmountMismatch` if the processor's amount
    /// differs from the requested one, plus the errors of
    /// [`place_order`](Self::place_order).
    pub fn complete_card_payment(
        &mut self,
        intent: &PaymentIntent,
        cart: &mut CartService,
    ) -> Result<Order, CheckoutError> {
        let pending = self.pending(&intent.id)?;
        if !intent.is_succeeded() {
            return Err(CheckoutError::PaymentNotCompleted {
                status: intent.status.clone(),
            });
        }
        if intent.amount != pending.amount {
            tracing::warn!(
                intent_id = %intent.id,
                charged = intent.amount,
                expected = pending.amount,
                "Payment intent amount differs from the order amount"
            );
            return Err(CheckoutError::AmountMismatch {
                charged: intent.amount,
                expected: pending.amount,
            });
        }

        let snapshot = pending.snapshot.clone();
        self.place_order(intent.id.clone(), snapshot, cart)
    }

    /// Record a cash-on-delivery order.
    ///
    /// # Errors
    ///
    /// See [`place_order`](Self::place_order).
    pub fn complete_cash_order(&mut self, cart: &mut CartService) -> Result<Order, CheckoutError> {
        self.require(CheckoutStep::CashOnDelivery, "place a cash order")?;
        let id = format!("COD_{}", Utc::now().timestamp_millis());
        self.place_order(id, CartSnapshot::of(cart), cart)
    }

    /// Save the last order, empty the cart, and move to `Confirmed`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for a snapshot without lines,
    /// `CheckoutError::Storage` if the order cannot be saved.
    fn place_order(
        &mut self,
        id: String,
        snapshot: CartSnapshot,
        cart: &mut CartService,
    ) -> Result<Order, CheckoutError> {
        if snapshot.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order = Order {
            id,
            items: snapshot.items,
            shipping_address: self.shipping.clone(),
            totals: snapshot.totals,
            payment_method: self.method,
            status: OrderStatus::for_method(self.method),
            created_at: Utc::now(),
        };

        storage::save_json(self.store.as_ref(), keys::LAST_ORDER, &order)?;
        cart.clear();

        self.step = CheckoutStep::Confirmed;
        self.pending_intent = None;

        tracing::info!(
            order_id = %order.id,
            method = %order.payment_method,
            total = %order.totals.total,
            "Order placed"
        );
        Ok(order)
    }

    /// The most recently placed order, if one is stored.
    #[must_use]
    pub fn last_order(&self) -> Option<Order> {
        storage::load_json(self.store.as_ref(), keys::LAST_ORDER)
    }
}

fn prefill_email(address: &mut ShippingAddress, user: Option<&AuthUser>) {
    if let Some(user) = user
        && address.email.trim().is_empty()
    {
        address.email = user.email.as_str().to_string();
    }
}

/// Check every shipping field, collecting one message per failing field.
///
/// # Errors
///
/// Returns the failing fields.
pub fn validate_shipping(address: &ShippingAddress) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    let required = [
        ("firstName", &address.first_name, "First name is required"),
        ("lastName", &address.last_name, "Last name is required"),
        ("email", &address.email, "Email is required"),
        ("phone", &address.phone, "Phone is required"),
        ("address", &address.address, "Address is required"),
        ("city", &address.city, "City is required"),
        ("district", &address.district, "District is required"),
        ("postalCode", &address.postal_code, "Postal code is required"),
    ];
    for (field, value, message) in required {
        if value.trim().is_empty() {
            errors.insert(field, message.to_string());
        }
    }

    if !address.email.is_empty() && Email::parse_deliverable(&address.email).is_err() {
        errors.insert("email", "Enter a valid email address".to_string());
    }

    let phone: String = address.phone.chars().filter(|c| !c.is_whitespace()).collect();
    if !address.phone.is_empty() && !PHONE_RE.is_match(&phone) {
        errors.insert("phone", "Enter a valid phone number".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
