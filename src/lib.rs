pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

pub use error::{CoercionError, PropertyError};

// Export logic types
pub use logic::{
    is_absent, is_truthy, PresencePolicy, ResolvedProperty, SchemaDefaultAssembler, TypeCoercer,
    ValueResolver,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{
    AttachmentStore, DefinitionRepository, InMemoryStore, PostgresStore, PropertyStore,
};
