pub mod catalog;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod matcher;
pub mod model;
pub mod session;

// Re-export main types for convenience
pub use catalog::{CatalogCache, CatalogSnapshot, CatalogView};
pub use client::{AssistantBackend, CatalogBackend, StoreClient};
pub use config::Config;
pub use dispatcher::{QueryDispatcher, Resolution, ResultSource, SearchRequest, SearchResponse};
pub use error::StoreError;
pub use matcher::{match_apps, match_apps_owned};
pub use model::{AppRecord, Category, Downloads, Price};
pub use session::{
    ConversationSession, ConversationTurn, PendingTurn, Sender, SessionState, TurnReply,
};
