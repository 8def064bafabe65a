pub mod position;
pub mod reference;
pub mod symbol;
pub mod symbol_table;
pub mod syntax;

pub use position::*;
pub use reference::*;
pub use symbol::*;
pub use symbol_table::*;
pub use syntax::*;
