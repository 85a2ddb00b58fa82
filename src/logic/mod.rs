pub mod coerce;
pub mod resolve;
pub mod schema_defaults;

pub use coerce::*;
pub use resolve::*;
pub use schema_defaults::*;
