use crate::value::{ArgType, Value};

/// Raw text that could not be turned into the option's declared type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot convert '{raw}' to {expected}: {reason}")]
pub struct ConversionError {
    pub raw: String,
    pub expected: ArgType,
    pub reason: String,
}

/// Why a parse pass stopped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed argument! (see arg number {position})")]
    MalformedToken { position: usize },

    #[error("Unknown option '{token}' (see arg number {position})")]
    UnknownOption { token: String, position: usize },

    #[error(
        "Ambiguous option '{token}' (see arg number {position}), could be: {}",
        join_long_names(.candidates)
    )]
    AmbiguousOption {
        token: String,
        position: usize,
        candidates: Vec<String>,
    },

    #[error("Option '{token}' needs an additional argument")]
    MissingValue { token: String },

    #[error("The following arguments are mandatory: {}", .options.join(", "))]
    MissingMandatory { options: Vec<String> },

    #[error("Invalid value for option '{token}': {source}")]
    InvalidValue {
        token: String,
        #[source]
        source: ConversionError,
    },

    #[error("option definition {index} has neither a short nor a long name")]
    InvalidDefinition { index: usize },

    #[error("default value '{value}' of option {option} is not a {expected}")]
    InvalidDefault {
        option: String,
        value: Value,
        expected: ArgType,
    },

    #[error("help requested")]
    HelpRequested,
}

/// The line printed above the usage text; help has none.
fn error_line(error: &ParseError) -> String {
    match error {
        ParseError::HelpRequested => String::new(),
        other => format!("{}\n", other),
    }
}

fn join_long_names(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("--{}", n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A terminated parse: the error plus the usage text to show with it.
///
/// The library never prints or exits on its own; the host decides what to
/// do with this, typically `failure.exit()`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}{usage}", error_line(.error))]
pub struct Failure {
    #[source]
    pub error: ParseError,
    pub usage: String,
}

impl Failure {
    pub fn is_help(&self) -> bool {
        matches!(self.error, ParseError::HelpRequested)
    }

    /// Every terminating condition, help included, exits with status 1.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Print the report to stderr and terminate the process.
    pub fn exit(&self) -> ! {
        eprint!("{}", self);
        std::process::exit(self.exit_code());
    }
}

/// Typed retrieval error on a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("option {name} has no value and no default")]
    NotSet { name: String },

    #[error("option {name} does not hold a {expected}")]
    TypeMismatch { name: String, expected: &'static str },
}

pub type Result<T> = std::result::Result<T, Failure>;
