pub mod cache;
pub mod error;
pub mod models;
pub mod semantic;
pub mod type_string;

// Re-export commonly used types
pub use cache::Cache;
pub use error::{ApiError, ApiResult};
pub use models::*;
pub use semantic::{MemberMergeStrategy, NoopSymbolSource, SymbolSource};
