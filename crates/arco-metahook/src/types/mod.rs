//! Table-format catalog types.
//!
//! JSON encodings follow the table format's own metadata representation so
//! values stored as properties stay readable by other engines.

mod ident;
mod metadata;
mod partition;
mod schema;

pub use ident::*;
pub use metadata::*;
pub use partition::*;
pub use schema::*;
