#[cfg(any(test, feature = "test-utils"))]
pub mod fixture;
pub mod name_resolver;
pub mod phpdoc;
pub mod reader;

pub use name_resolver::NameResolver;
pub use reader::{ReferenceReader, SymbolReader};

use phpscope_api::models::{ParsedDocument, ReferenceTable, SymbolTable};
use phpscope_api::semantic::SymbolSource;

/// Declarations of one document.
pub fn read_symbols(doc: &ParsedDocument) -> SymbolTable {
    SymbolReader::read(doc)
}

/// Name usages of one document. `table` must be the document's own symbol
/// table; `source` answers lookups into the rest of the workspace.
pub fn read_references(
    doc: &ParsedDocument,
    table: &SymbolTable,
    source: &dyn SymbolSource,
) -> ReferenceTable {
    ReferenceReader::read(doc, table, source)
}
