//! MCP tool implementations for the Arena server.

mod search_items;

pub use search_items::{NO_ITEMS_FOUND, SEARCH_ITEMS, SearchItemsInput, format_results, tool};
