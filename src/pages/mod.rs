//! Page operations
//!
//! The two resource-shaped calls the rest of the application uses. Inputs
//! are validated and identifiers canonicalized here, before the request
//! touches the rate budget.

use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::ids::canonicalize_id;
use crate::types::{JsonObject, JsonValue, Method};
use serde_json::json;
use tracing::debug;

/// Notion client exposing page retrieval and creation
#[derive(Debug)]
pub struct NotionClient {
    http: HttpClient,
}

impl NotionClient {
    /// Wrap a configured HTTP client
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// The underlying request executor
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Retrieve a page by id
    pub async fn retrieve_page(&self, page_id: &str) -> Result<JsonValue> {
        if page_id.trim().is_empty() {
            return Err(Error::validation("Page ID is required and cannot be empty"));
        }

        let page_id = canonicalize_id(page_id);
        debug!("Retrieving page {}", page_id);

        self.http
            .execute(Method::GET, &format!("/pages/{page_id}"), None)
            .await
            .map_err(|e| e.with_context(format!("Failed to retrieve page {page_id}")))
    }

    /// Create a page under a parent page.
    ///
    /// Extra `properties` are merged over the generated title property.
    pub async fn create_page(
        &self,
        parent_id: &str,
        title: &str,
        properties: Option<JsonObject>,
    ) -> Result<JsonValue> {
        if parent_id.trim().is_empty() {
            return Err(Error::validation(
                "Parent ID is required and cannot be empty",
            ));
        }
        if title.trim().is_empty() {
            return Err(Error::validation("Title is required and cannot be empty"));
        }

        let parent_id = canonicalize_id(parent_id);
        let body = create_page_body(&parent_id, title, properties);
        debug!("Creating page '{}' under {}", title, parent_id);

        self.http
            .execute(Method::POST, "/pages", Some(&body))
            .await
            .map_err(|e| e.with_context(format!("Failed to create page with title '{title}'")))
    }
}

/// Build the request body for a new page
pub fn create_page_body(parent_id: &str, title: &str, properties: Option<JsonObject>) -> JsonValue {
    let mut all_properties = JsonObject::new();
    all_properties.insert(
        "title".to_string(),
        json!({
            "title": [
                { "text": { "content": title } }
            ]
        }),
    );
    if let Some(extra) = properties {
        all_properties.extend(extra);
    }

    json!({
        "parent": { "page_id": parent_id },
        "properties": all_properties,
    })
}
