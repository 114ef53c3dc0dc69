//! Gateway payments, from opening the remote order to reconciling the gateway's callbacks.
//!
//! A gateway payment goes through two steps.
//! 1. [`PaymentFlowApi::open_gateway_order`] opens a remote order with the gateway and stores a local order in
//!    `created`, holding the gateway's order reference.
//! 2. Once the customer has paid, the gateway reports back, possibly more than once and over more than one channel.
//!    Every report goes through [`PaymentFlowApi::reconcile`], which checks the signature and applies the outcome.
//!    Only the first report moves the order out of `created`, so re-deliveries are harmless.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use purity_common::Secret;

use crate::{
    api::{
        errors::PaymentFlowError,
        order_objects::{GatewayCheckout, GatewayOrderRequest, PaymentCallback, Reconciliation},
    },
    db_types::{OrderStatusType, PaymentApplication, PaymentMode, PaymentResult},
    helpers::{new_order_number, verify_payment_signature},
    traits::{OrderManagement, PaymentGateway, RemoteOrderRequest},
};

/// The gateway's documented minimum order amount, in paise.
pub const DEFAULT_MIN_GATEWAY_AMOUNT: i64 = 100;

pub struct PaymentFlowApi<B, G> {
    db: B,
    gateway: Option<G>,
    min_amount: i64,
}

impl<B, G> Debug for PaymentFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi (gateway enabled: {})", self.gateway.is_some())
    }
}

impl<B, G> PaymentFlowApi<B, G> {
    /// Passing `None` for the gateway disables gateway payments. Every gateway operation then fails fast with
    /// [`PaymentFlowError::GatewayUnavailable`].
    pub fn new(db: B, gateway: Option<G>) -> Self {
        Self { db, gateway, min_amount: DEFAULT_MIN_GATEWAY_AMOUNT }
    }

    pub fn with_min_amount(mut self, min_amount: i64) -> Self {
        self.min_amount = min_amount;
        self
    }

    pub fn gateway_enabled(&self) -> bool {
        self.gateway.is_some()
    }
}

impl<B, G> PaymentFlowApi<B, G>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    fn gateway(&self) -> Result<&G, PaymentFlowError> {
        self.gateway.as_ref().ok_or(PaymentFlowError::GatewayUnavailable)
    }

    /// Opens a remote order for the request and stores the matching local order in `created`.
    ///
    /// The amount, the currency and the order details are all validated before the gateway is contacted.
    pub async fn open_gateway_order(
        &self,
        user_id: i64,
        request: GatewayOrderRequest,
    ) -> Result<GatewayCheckout, PaymentFlowError> {
        let gateway = self.gateway()?;
        let now = Utc::now();
        let remote_request = RemoteOrderRequest::new(
            request.amount,
            &request.currency,
            request.receipt(now.timestamp_millis()),
            request.notes.clone(),
            self.min_amount,
        )?;
        let order = request
            .order_details()
            .into_new_order(new_order_number(now), user_id)
            .with_payment_mode(PaymentMode::Razorpay);
        order.validate_details()?;
        trace!("🔄️💳️ Opening a gateway order for {} (receipt {})", remote_request.amount(), remote_request.receipt());
        let remote = gateway.create_remote_order(remote_request).await.map_err(|e| {
            warn!("🔄️💳️ The gateway refused to open an order for user #{user_id}. {e}");
            e
        })?;
        let order = order.with_gateway_order_id(remote.id.clone());
        let order = self.db.insert_order(order).await.map_err(|e| {
            error!(
                "🔄️💳️ Gateway order {} was opened, but the local order could not be stored. It will have to be \
                 reconciled by hand. {e}",
                remote.id
            );
            e
        })?;
        info!("🔄️💳️ Order #{} ({}) is awaiting payment for gateway order {}", order.id, order.order_no, remote.id);
        Ok(GatewayCheckout {
            gateway_order_id: remote.id,
            key_id: gateway.credentials().key_id.clone(),
            currency: remote.currency,
            amount: remote.amount,
            id: order.id,
        })
    }

    /// Verifies the callback signature and records the outcome against the order holding the gateway reference.
    ///
    /// A bad signature is not an error. It yields `verified == false`, and an order still in `created` is marked
    /// `failed`. A callback for an unknown gateway reference is not an error either: the gateway is authoritative
    /// about its own side of the payment, so the verification result is reported regardless.
    pub async fn reconcile(&self, callback: PaymentCallback) -> Result<Reconciliation, PaymentFlowError> {
        let gateway = self.gateway()?;
        let secret: &Secret<String> = &gateway.credentials().key_secret;
        let verified = verify_payment_signature(
            secret.reveal(),
            &callback.gateway_order_id,
            &callback.gateway_payment_id,
            &callback.signature,
        );
        if !verified {
            warn!(
                "🔄️🔐️ Signature check failed for gateway order {} / payment {}",
                callback.gateway_order_id, callback.gateway_payment_id
            );
        }
        let status = if verified { OrderStatusType::Paid } else { OrderStatusType::Failed };
        let result = PaymentResult {
            gateway_order_id: callback.gateway_order_id,
            gateway_payment_id: callback.gateway_payment_id,
            signature: callback.signature,
            status,
        };
        let application = self.db.apply_payment_result(result).await?;
        let reconciliation = Reconciliation { verified, application };
        match &reconciliation.application {
            PaymentApplication::Updated(order) => {
                info!("🔄️💳️ Order #{} is now {}", order.id, order.status)
            },
            PaymentApplication::AlreadyReconciled(order) if reconciliation.needs_manual_review() => {
                error!(
                    "🔄️💳️ The gateway confirmed a payment for order #{} ({}), but the order is {}. It must be \
                     reconciled by hand.",
                    order.id,
                    order.gateway_order_id.as_deref().unwrap_or_default(),
                    order.status
                )
            },
            PaymentApplication::AlreadyReconciled(order) => {
                debug!("🔄️💳️ Order #{} was already {}. Nothing to do.", order.id, order.status)
            },
            PaymentApplication::NoMatchingOrder => {
                warn!("🔄️💳️ A payment callback arrived for a gateway order that we have no record of")
            },
        }
        Ok(reconciliation)
    }
}
