//! Domain models for the front-desk record-keeper.

mod bed;
mod bill;
mod transaction;
mod visit;

pub use bed::*;
pub use bill::*;
pub use transaction::*;
pub use visit::*;
