mod loader;
pub mod types;
pub mod validation;

pub use loader::{SchemaError, load_schema};
pub use validation::{SchemaLimits, ValidationError, validate_schema_limits};
