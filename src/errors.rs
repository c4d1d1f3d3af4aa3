use std::error::Error;
use std::fmt;

use crate::raxml::RunOutput;

macro_rules! message_error {
    ($name:ident) => {
        pub struct $name {
            pub message: String,
        }

        impl $name {
            pub fn new(message: impl Into<String>) -> Self {
                Self {
                    message: message.into(),
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.message)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.message)
            }
        }

        impl Error for $name {}
    };
}

// Malformed input data: alignments, PHYLIP files, unknown flags.
message_error!(DataError);
// A required parameter was not set before invocation.
message_error!(MissingParameterError);
// The requested parameter combination is not supported by the wrappers.
message_error!(NotImplementedError);
// The binary could not be located.
message_error!(ApplicationNotFoundError);

/// Raised when the external binary fails or does not produce the files it should.
/// Carries the exit code (if the process ran to an exit) and whatever was captured from its streams.
pub struct ApplicationError {
    pub message: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ApplicationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub(crate) fn with_output(message: impl Into<String>, output: &RunOutput) -> Self {
        Self {
            message: message.into(),
            exit_code: output.exit_code,
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
        }
    }
}

impl fmt::Debug for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = self.exit_code {
            write!(f, " (exit code {code})")?;
        }
        if !self.stdout.is_empty() {
            write!(f, "\nStdout:\n{}", self.stdout)?;
        }
        if !self.stderr.is_empty() {
            write!(f, "\nStderr:\n{}", self.stderr)?;
        }
        Ok(())
    }
}

impl Error for ApplicationError {}
