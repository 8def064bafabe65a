use crate::models::{Reference, Symbol};
use std::sync::Arc;

/// Tie-break policy when several contributing types declare a member with the
/// same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemberMergeStrategy {
    /// Every matching member from every type.
    #[default]
    None,
    /// First seen wins, so the most derived declaration.
    Override,
    /// First seen wins unless it lacks documentation and a later one has it.
    Documented,
    /// Last seen wins, so the root declaration.
    Base,
}

/// Symbol lookups the reference reader needs to type member accesses and
/// calls. Implemented by the symbol store.
pub trait SymbolSource: Send + Sync {
    fn find_symbols_by_reference(
        &self,
        reference: &Reference,
        strategy: MemberMergeStrategy,
    ) -> Vec<Arc<Symbol>>;
}

/// Source with no knowledge beyond the file being read.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSymbolSource;

impl SymbolSource for NoopSymbolSource {
    fn find_symbols_by_reference(
        &self,
        _reference: &Reference,
        _strategy: MemberMergeStrategy,
    ) -> Vec<Arc<Symbol>> {
        Vec::new()
    }
}
