use async_trait::async_trait;

use serde_json::{json, Value};

use crate::tools::{required_str, Tool, ToolError, ToolSpec};

/// Tool name for the web search operation.
pub const TOOL_WEB_SEARCH: &str = "web_search";

const DEFAULT_ENDPOINT: &str = "https://api.duckduckgo.com/";
const DEFAULT_REGION: &str = "us-en";
const MAX_RELATED: usize = 5;

/// Tool for searching the web through the DuckDuckGo instant-answer API.
///
/// Wraps reqwest::Client and exposes it as a tool for the model. Returns a compact summary:
/// heading, abstract text and source URL, plus up to five related topics.
///
/// # Examples
///
/// ```no_run
/// use chatgraph::tools::{Tool, WebSearchTool};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let tool = WebSearchTool::new();
/// let result = tool.call(json!({ "query": "capital of France" })).await.unwrap();
/// println!("{}", result["abstract"]);
/// # }
/// ```
///
/// # Interaction
///
/// - **reqwest::Client**: performs the HTTP GET
/// - **ToolRegistry**: registers this tool by name "web_search"
/// - **ToolError**: HTTP failures map to `Transport`
pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
    region: String,
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSearchTool {
    /// Creates a new WebSearchTool with a default HTTP client and the `us-en` region.
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Creates a new WebSearchTool with a custom HTTP client.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatgraph::tools::WebSearchTool;
    /// use std::time::Duration;
    ///
    /// let client = reqwest::Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    /// let tool = WebSearchTool::with_client(client);
    /// ```
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Reduces the instant-answer body to what the model needs.
    fn summarize(query: &str, body: &Value) -> Value {
        let text = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let related: Vec<Value> = body
            .get("RelatedTopics")
            .and_then(Value::as_array)
            .map(|topics| {
                topics
                    .iter()
                    .filter_map(|t| {
                        let text = t.get("Text").and_then(Value::as_str)?;
                        Some(json!({
                            "text": text,
                            "url": t.get("FirstURL").and_then(Value::as_str).unwrap_or_default(),
                        }))
                    })
                    .take(MAX_RELATED)
                    .collect()
            })
            .unwrap_or_default();

        json!({
            "query": query,
            "heading": text("Heading"),
            "abstract": text("AbstractText").or_else(|| text("Answer")),
            "source": text("AbstractURL"),
            "related": related,
        })
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        TOOL_WEB_SEARCH
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_WEB_SEARCH.to_string(),
            description: Some(
                "Search the web for current information. Returns a short abstract and related \
                 topics for the query."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let query = required_str(&args, "query")?;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
                ("kl", self.region.as_str()),
            ])
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

        Ok(Self::summarize(query, &body))
    }
}
