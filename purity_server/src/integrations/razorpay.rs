//! Razorpay's REST API, or as much of it as the storefront needs: opening an order.
use log::*;
use purity_engine::traits::{GatewayCredentials, GatewayError, PaymentGateway, RemoteOrder, RemoteOrderRequest};
use reqwest::Client;
use serde::Deserialize;

use crate::{config::RazorpayConfig, errors::ServerError};

/// Used when the gateway fails without saying why.
const FALLBACK_ERROR_CODE: &str = "RZP_ERR";

#[derive(Clone)]
pub struct RazorpayGateway {
    credentials: GatewayCredentials,
    api_url: String,
    client: Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetails,
}

#[derive(Deserialize)]
struct ErrorDetails {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl RazorpayGateway {
    pub fn new(config: &RazorpayConfig) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServerError::InitializeError(format!("Could not build the Razorpay client. {e}")))?;
        Ok(Self { credentials: config.credentials(), api_url: config.api_url.clone(), client })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }
}

impl PaymentGateway for RazorpayGateway {
    fn credentials(&self) -> &GatewayCredentials {
        &self.credentials
    }

    async fn create_remote_order(&self, request: RemoteOrderRequest) -> Result<RemoteOrder, GatewayError> {
        let url = self.url("/orders");
        trace!("💳️ Opening Razorpay order for {} (receipt {})", request.amount(), request.receipt());
        let response = self
            .client
            .post(url)
            .basic_auth(&self.credentials.key_id, Some(self.credentials.key_secret.reveal()))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("💳️ Could not reach Razorpay. {e}");
                GatewayError::new(FALLBACK_ERROR_CODE, e.to_string(), e.status().map(|s| s.as_u16()))
            })?;
        let status = response.status().as_u16();
        if response.status().is_success() {
            let order = response.json::<RemoteOrder>().await.map_err(|e| {
                warn!("💳️ Razorpay accepted the order, but the response could not be read. {e}");
                GatewayError::new(FALLBACK_ERROR_CODE, format!("Invalid response. {e}"), Some(status))
            })?;
            debug!("💳️ Razorpay order {} opened for {}", order.id, order.amount);
            Ok(order)
        } else {
            let text = response.text().await.unwrap_or_default();
            let err = gateway_error_from_body(status, &text);
            warn!("💳️ Razorpay order create failed: {err}");
            Err(err)
        }
    }
}

fn gateway_error_from_body(status: u16, body: &str) -> GatewayError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error }) => GatewayError::new(
            error.code.unwrap_or_else(|| FALLBACK_ERROR_CODE.to_string()),
            error.description.unwrap_or_else(|| "Order create failed".to_string()),
            Some(status),
        ),
        Err(_) if body.trim().is_empty() => GatewayError::new(FALLBACK_ERROR_CODE, "Order create failed", Some(status)),
        Err(_) => GatewayError::new(FALLBACK_ERROR_CODE, body.trim(), Some(status)),
    }
}
