use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use purity_engine::traits::{GatewayCredentials, GatewayError, PaymentGateway, RemoteOrder, RemoteOrderRequest};

pub const KEY_ID: &str = "rzp_test_key";
pub const KEY_SECRET: &str = "rzp_test_secret";

/// A gateway that hands out sequential order ids, or fails every call if asked to.
#[derive(Clone)]
pub struct FakeGateway {
    credentials: GatewayCredentials,
    calls: Arc<AtomicUsize>,
    fail_with: Option<GatewayError>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self { credentials: GatewayCredentials::new(KEY_ID, KEY_SECRET), calls: Arc::default(), fail_with: None }
    }

    pub fn failing(error: GatewayError) -> Self {
        Self { fail_with: Some(error), ..Self::new() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for FakeGateway {
    fn credentials(&self) -> &GatewayCredentials {
        &self.credentials
    }

    async fn create_remote_order(&self, request: RemoteOrderRequest) -> Result<RemoteOrder, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(e) = &self.fail_with {
            return Err(e.clone());
        }
        Ok(RemoteOrder {
            id: format!("order_fake{n:04}"),
            amount: request.amount(),
            currency: request.currency().to_string(),
            receipt: Some(request.receipt().to_string()),
            status: Some("created".into()),
        })
    }
}
