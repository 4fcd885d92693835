use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Module already registered: {0}")]
    DuplicateModule(String),

    #[error("Module not registered: {0}")]
    UnknownModule(String),

    #[error("Module {module} has no handler {handler}")]
    UnknownHandler { module: String, handler: String },

    #[error("Module {module} has no getter {getter}")]
    UnknownGetter { module: String, getter: String },

    #[error("Invalid module definition for {module}: {reason}")]
    InvalidDefinition { module: String, reason: String },
}

/// A getter could not interpret its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetterError {
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },
}
