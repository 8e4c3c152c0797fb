//! CLI module
//!
//! Command-line interface over the Notion client.
//!
//! # Commands
//!
//! - `tools` - List the tool definitions
//! - `retrieve-page` - Fetch a page by id
//! - `create-page` - Create a page under a parent
//! - `call` - Invoke a tool by name with JSON arguments
//! - `serve` - Start HTTP server mode

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands};
pub use runner::{build_client, Runner};
pub use server::{router, serve};
