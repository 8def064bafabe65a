pub mod cache;
pub mod error;
pub mod logging;
pub mod name_index;
pub mod reference_store;
pub mod symbol_store;
pub mod type_aggregate;

pub use cache::{BucketFileCache, MemoryCache, create_cache};
pub use error::{PhpscopeError, Result};
pub use name_index::{Indexable, NameIndex};
pub use reference_store::ReferenceStore;
pub use symbol_store::{SymbolStore, UniqueSymbolCollection};
pub use type_aggregate::TypeAggregate;
