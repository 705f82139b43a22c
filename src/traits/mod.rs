pub mod describer;
pub mod input;
pub mod query;
pub mod store;

pub use describer::*;
pub use input::*;
pub use query::*;
pub use store::*;
