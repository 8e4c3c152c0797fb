//! Tool dispatch
//!
//! Exposes page retrieval and creation as named tools with JSON-schema
//! inputs, the shape automation front ends call into. Dispatch never fails:
//! every problem is reported back as error text.

use crate::error::Error;
use crate::pages::NotionClient;
use crate::types::{JsonObject, JsonValue};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Name of the page retrieval tool
pub const RETRIEVE_PAGE: &str = "notion_retrieve_page";

/// Name of the page creation tool
pub const CREATE_PAGE: &str = "notion_create_page";

/// A tool a front end can invoke
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    /// Unique tool name
    pub name: String,
    /// What the tool does
    pub description: String,
    /// JSON schema of the arguments object
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

/// Text result of a tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    /// Text shown to the caller
    pub text: String,
    /// Whether the call failed
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolOutput {
    fn success(text: String) -> Self {
        Self {
            text,
            is_error: false,
        }
    }

    fn failure(message: impl std::fmt::Display) -> Self {
        Self {
            text: format!("Error: {message}"),
            is_error: true,
        }
    }
}

/// All tools, in a stable order
pub fn list_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: RETRIEVE_PAGE.to_string(),
            description: "Retrieve a Notion page by its ID. Returns the page object with \
                          properties, content, and metadata."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "page_id": {
                        "type": "string",
                        "description": "The ID of the Notion page to retrieve"
                    }
                },
                "required": ["page_id"]
            }),
        },
        ToolDefinition {
            name: CREATE_PAGE.to_string(),
            description: "Create a new page in Notion under a parent page or database."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "parent_id": {
                        "type": "string",
                        "description": "The ID of the parent page or database"
                    },
                    "title": {
                        "type": "string",
                        "description": "The title of the new page"
                    },
                    "properties": {
                        "type": "object",
                        "description": "Optional additional page properties",
                        "additionalProperties": true
                    }
                },
                "required": ["parent_id", "title"]
            }),
        },
    ]
}

/// Routes tool calls to a shared [`NotionClient`]
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    client: Arc<NotionClient>,
}

impl ToolDispatcher {
    /// Create a dispatcher over `client`
    pub fn new(client: Arc<NotionClient>) -> Self {
        Self { client }
    }

    /// Invoke the tool `name` with a JSON arguments object
    pub async fn call(&self, name: &str, arguments: &JsonValue) -> ToolOutput {
        let output = match name {
            RETRIEVE_PAGE => self.retrieve_page(arguments).await,
            CREATE_PAGE => self.create_page(arguments).await,
            _ => ToolOutput::failure(format!("Unknown tool '{name}'")),
        };
        if output.is_error {
            error!("Tool '{}' failed: {}", name, output.text);
        }
        output
    }

    async fn retrieve_page(&self, arguments: &JsonValue) -> ToolOutput {
        let Some(page_id) = required_str(arguments, "page_id") else {
            return ToolOutput::failure("page_id is required");
        };

        info!("Retrieving page: {}", page_id);
        match self.client.retrieve_page(page_id).await {
            Ok(page) => render("Successfully retrieved page", &page),
            Err(e) => ToolOutput::failure(e),
        }
    }

    async fn create_page(&self, arguments: &JsonValue) -> ToolOutput {
        let Some(parent_id) = required_str(arguments, "parent_id") else {
            return ToolOutput::failure("parent_id is required");
        };
        let Some(title) = required_str(arguments, "title") else {
            return ToolOutput::failure("title is required");
        };
        let properties = match optional_object(arguments, "properties") {
            Ok(properties) => properties,
            Err(e) => return ToolOutput::failure(e),
        };

        info!("Creating page with title '{}' under parent {}", title, parent_id);
        match self.client.create_page(parent_id, title, properties).await {
            Ok(page) => render("Successfully created page", &page),
            Err(e) => ToolOutput::failure(e),
        }
    }
}

fn required_str<'a>(arguments: &'a JsonValue, key: &str) -> Option<&'a str> {
    arguments
        .get(key)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn optional_object(arguments: &JsonValue, key: &str) -> Result<Option<JsonObject>, Error> {
    match arguments.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Object(map)) => Ok(Some(map.clone())),
        Some(_) => Err(Error::validation(format!("{key} must be an object"))),
    }
}

fn render(heading: &str, document: &JsonValue) -> ToolOutput {
    match serde_json::to_string_pretty(document) {
        Ok(pretty) => ToolOutput::success(format!("{heading}:\n\n{pretty}")),
        Err(e) => ToolOutput::failure(e),
    }
}
