pub mod vocabulary;
pub mod fields;
pub mod table;
pub mod merge;

pub use vocabulary::*;
pub use fields::*;
pub use table::*;
