pub mod common;
pub mod property;
pub mod property_type;
pub mod sub_field;
pub mod target;

pub use common::*;
pub use property::*;
pub use property_type::*;
pub use sub_field::*;
pub use target::*;
