//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::pages::NotionClient;
use crate::tools::{list_tools, ToolDispatcher};
use crate::types::{JsonObject, JsonValue};
use std::process::ExitCode;
use std::sync::Arc;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<ExitCode> {
        match &self.cli.command {
            Commands::Tools => self.tools(),
            Commands::RetrievePage { page_id } => self.retrieve_page(page_id).await,
            Commands::CreatePage {
                parent_id,
                title,
                properties_json,
            } => {
                self.create_page(parent_id, title, properties_json.as_deref())
                    .await
            }
            Commands::Call {
                tool,
                arguments_json,
            } => self.call(tool, arguments_json).await,
            Commands::Serve { port } => {
                let dispatcher = ToolDispatcher::new(Arc::new(self.client()?));
                crate::cli::serve(dispatcher, *port).await?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }

    /// Build a client from the settings file and environment
    fn client(&self) -> Result<NotionClient> {
        let settings = Settings::load(self.cli.config.as_deref())?;
        tracing::debug!("Loaded settings: {:?}", settings);
        build_client(&settings)
    }

    fn tools(&self) -> Result<ExitCode> {
        let tools = serde_json::to_string_pretty(&list_tools())?;
        println!("{tools}");
        Ok(ExitCode::SUCCESS)
    }

    async fn retrieve_page(&self, page_id: &str) -> Result<ExitCode> {
        let page = self.client()?.retrieve_page(page_id).await?;
        print_json(&page)?;
        Ok(ExitCode::SUCCESS)
    }

    async fn create_page(
        &self,
        parent_id: &str,
        title: &str,
        properties_json: Option<&str>,
    ) -> Result<ExitCode> {
        let properties = properties_json.map(parse_properties).transpose()?;
        let page = self
            .client()?
            .create_page(parent_id, title, properties)
            .await?;
        print_json(&page)?;
        Ok(ExitCode::SUCCESS)
    }

    async fn call(&self, tool: &str, arguments_json: &str) -> Result<ExitCode> {
        let arguments: JsonValue = serde_json::from_str(arguments_json)?;
        let dispatcher = ToolDispatcher::new(Arc::new(self.client()?));

        let output = dispatcher.call(tool, &arguments).await;
        println!("{}", output.text);

        Ok(if output.is_error {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        })
    }
}

/// Build a Notion client from validated settings
pub fn build_client(settings: &Settings) -> Result<NotionClient> {
    let http = HttpClient::with_config(settings.to_http_config()?)?;
    Ok(NotionClient::new(http))
}

fn parse_properties(raw: &str) -> Result<JsonObject> {
    match serde_json::from_str::<JsonValue>(raw)? {
        JsonValue::Object(map) => Ok(map),
        _ => Err(Error::validation("properties must be a JSON object")),
    }
}

fn print_json(value: &JsonValue) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
