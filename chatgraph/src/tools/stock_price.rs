//! Stock price tool backed by the Alpha Vantage `GLOBAL_QUOTE` endpoint.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{required_str, Tool, ToolError, ToolSpec};

/// Tool name for the stock price lookup.
pub const TOOL_GET_STOCK_PRICE: &str = "get_stock_price";

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Fetches the latest quote for a ticker symbol (e.g. `AAPL`, `TSLA`).
///
/// Returns the provider's JSON body unchanged. Requires an API key; without one every call is an
/// execution error rather than a request the provider would reject anyway.
pub struct StockPriceTool {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl StockPriceTool {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_key)
    }

    /// Uses a custom client (timeouts, proxies).
    pub fn with_client(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Overrides the endpoint, e.g. for a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn query<'a>(symbol: &'a str, api_key: &'a str) -> [(&'static str, &'a str); 3] {
        [
            ("function", "GLOBAL_QUOTE"),
            ("symbol", symbol),
            ("apikey", api_key),
        ]
    }
}

#[async_trait]
impl Tool for StockPriceTool {
    fn name(&self) -> &str {
        TOOL_GET_STOCK_PRICE
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_GET_STOCK_PRICE.to_string(),
            description: Some(
                "Fetch the latest stock price for a given symbol (e.g. 'AAPL', 'TSLA').".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "symbol": { "type": "string", "description": "Ticker symbol" }
                },
                "required": ["symbol"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let symbol = required_str(&args, "symbol")?.trim();
        if symbol.is_empty() {
            return Err(ToolError::InvalidInput("symbol must not be empty".to_string()));
        }
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ToolError::Execution("ALPHA_VANTAGE_API_KEY is not set".to_string()))?;

        let response = self
            .client
            .get(&self.base_url)
            .query(&Self::query(symbol, api_key))
            .send()
            .await
            .map_err(|e| ToolError::Transport(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ToolError::Transport(format!(
                "request failed with status: {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ToolError::Transport(format!("failed to read response: {}", e)))?;

        if let Some(msg) = body.get("Error Message").and_then(Value::as_str) {
            return Err(ToolError::Execution(msg.to_string()));
        }
        Ok(body)
    }
}
