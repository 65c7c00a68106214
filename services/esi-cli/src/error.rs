//! Command-line errors

use thiserror::Error;

/// Errors from parsing the command line. Runtime failures (auth, API) are
/// reported through `anyhow` with context instead.
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("missing command\n\n{0}")]
    MissingCommand(&'static str),

    #[error("unknown command {0:?}\n\n{1}")]
    UnknownCommand(String, &'static str),

    #[error("{command}: missing argument <{argument}>")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("{command}: invalid <{argument}> {value:?}: {reason}")]
    InvalidArgument {
        command: &'static str,
        argument: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}: too many arguments")]
    TooManyArguments(&'static str),
}

/// Result alias using the CLI Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_errors_name_command_and_argument() {
        let err = Error::MissingArgument {
            command: "region",
            argument: "region_id",
        };
        assert_eq!(err.to_string(), "region: missing argument <region_id>");

        let err = Error::InvalidArgument {
            command: "type",
            argument: "type_id",
            value: "tritanium".into(),
            reason: "invalid digit found in string".into(),
        };
        assert!(err.to_string().contains("\"tritanium\""), "got: {err}");
    }
}
