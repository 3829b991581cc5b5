//! HTTP client for the inventory backend REST API

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use labdash_core::config::ApiConfig;
use labdash_core::{LowStockAlert, Order, OrderId, Product};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, instrument};

/// Result of a successful accept request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AcceptOutcome {
    /// Confirmation text from the backend
    #[serde(default)]
    pub message: String,

    /// Present when accepting dropped the product to or below its threshold
    #[serde(default)]
    pub low_stock_alert: Option<LowStockAlert>,
}

/// Operations the dashboard needs from the backend
///
/// [`ApiClient`] talks HTTP; [`crate::mock::MockBackend`] serves canned data.
#[async_trait]
pub trait InventoryBackend: Send + Sync {
    /// All orders, any status
    async fn fetch_orders(&self) -> ClientResult<Vec<Order>>;

    /// Products at or below their low stock threshold
    async fn fetch_low_stock(&self) -> ClientResult<Vec<Product>>;

    /// Every product
    async fn fetch_products(&self) -> ClientResult<Vec<Product>>;

    /// Request the `Pending -> Processing` transition
    async fn accept_order(&self, id: OrderId) -> ClientResult<AcceptOutcome>;

    /// Request cancellation; returns the backend's confirmation text
    async fn cancel_order(&self, id: OrderId) -> ClientResult<String>;
}

#[derive(Deserialize)]
struct OrdersEnvelope {
    orders: Vec<Order>,
}

#[derive(Deserialize)]
struct LowStockEnvelope {
    low_stock_products: Vec<Product>,
}

#[derive(Deserialize)]
struct ProductsEnvelope {
    products: Vec<Product>,
}

#[derive(Deserialize)]
struct MessageEnvelope {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Bearer token and the operator it belongs to
#[derive(Clone)]
pub struct Credentials {
    token: String,
    username: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
        }
    }

    /// Operator name sent as `X-Username`
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

/// API client for the inventory backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
    credentials: Option<Credentials>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            credentials: None,
        })
    }

    /// Authenticate every request with these credentials
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn authorize(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(ref credentials) = self.credentials {
            request = request
                .bearer_auth(&credentials.token)
                .header("X-Username", &credentials.username);
        }
        request
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.config.endpoint(path);
        debug!(url = %url, "GET");
        let response = self.authorize(self.client.get(&url)).send().await?;
        Self::read(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.config.endpoint(path);
        debug!(url = %url, "POST");
        let response = self.authorize(self.client.post(&url)).send().await?;
        Self::read(response).await
    }

    async fn read<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error.or(envelope.detail))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string()
                });
            return Err(ClientError::status(status.as_u16(), message));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl InventoryBackend for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_orders(&self) -> ClientResult<Vec<Order>> {
        let envelope: OrdersEnvelope = self.get("admin/orders/").await?;
        Ok(envelope.orders)
    }

    #[instrument(skip(self))]
    async fn fetch_low_stock(&self) -> ClientResult<Vec<Product>> {
        let envelope: LowStockEnvelope = self.get("products/low-stock/").await?;
        Ok(envelope.low_stock_products)
    }

    #[instrument(skip(self))]
    async fn fetch_products(&self) -> ClientResult<Vec<Product>> {
        let envelope: ProductsEnvelope = self.get("products/").await?;
        Ok(envelope.products)
    }

    #[instrument(skip(self))]
    async fn accept_order(&self, id: OrderId) -> ClientResult<AcceptOutcome> {
        self.post(&format!("admin/orders/{id}/accept/")).await
    }

    #[instrument(skip(self))]
    async fn cancel_order(&self, id: OrderId) -> ClientResult<String> {
        let envelope: MessageEnvelope = self.post(&format!("admin/orders/{id}/cancel/")).await?;
        Ok(envelope.message)
    }
}
