//! Error types for registry, invocation, and binding operations.

/// Failure reported by a catalogue source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors arising while populating or querying the algorithm registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The name is absent from the populated catalogue.
    #[error("unknown algorithm: {0}")]
    UnknownFunction(String),

    /// The catalogue source failed. The registry stays uninitialized.
    #[error("catalogue fetch failed: {0}")]
    Fetch(String),

    /// A pending population was abandoned because the registry was reset.
    #[error("catalogue population abandoned by registry reset")]
    Reset,

    /// A catalogue entry could not be parsed into a signature.
    #[error("invalid catalogue entry `{name}`: {message}")]
    InvalidCatalog { name: String, message: String },
}

impl From<FetchError> for RegistryError {
    fn from(err: FetchError) -> Self {
        RegistryError::Fetch(err.message)
    }
}

/// Errors raised while turning call-time arguments into an invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvocationError {
    /// A named-record call redeclared the implicit receiver parameter.
    #[error("argument collision in {function}: `{argument}` is already bound to the receiver")]
    ArgumentCollision { function: String, argument: String },

    /// More positional values than declared parameters.
    #[error("too many arguments to {function}: expected at most {expected}, got {actual}")]
    TooManyArguments {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("missing required argument `{argument}` to {function}")]
    MissingArgument { function: String, argument: String },

    #[error("unrecognized argument `{argument}` to {function}")]
    UnknownArgument { function: String, argument: String },
}

/// Errors surfaced by bound members and the binder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("{target} has no member `{member}`")]
    NoSuchMember { target: String, member: String },

    #[error("{target}.{member} is not callable")]
    NotCallable { target: String, member: String },
}
