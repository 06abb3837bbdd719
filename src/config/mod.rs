//! Option declarations, layered loading and the resolved configuration.

pub mod configuration;
pub mod discovery;
pub mod layers;
pub mod option;
pub mod schema;
pub mod value;

pub use configuration::{Configuration, ValueMap};
pub use layers::{resolve, ConfigFileError, ResolveInput};
pub use option::ConfigOption;
pub use schema::{options, OptionKey};
pub use value::{Value, ValueType};
