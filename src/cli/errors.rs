use clap::error::ErrorKind;
use thiserror::Error;

/// Errors raised while interpreting the command line, before any run starts.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("input file '{input}' must come before the first flag '{flag}'")]
    MisplacedInput {
        input: String,
        flag: String,
        usage: String,
    },

    /// Also carries `--help` output, which clap reports as an error with exit code 0.
    #[error("{source}")]
    Usage {
        #[source]
        source: clap::Error,
        usage: String,
    },
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::MisplacedInput { .. } => 2,
            AppError::Usage { source, .. } => source.exit_code(),
        }
    }

    /// Whether the rendered text belongs on stderr rather than stdout.
    pub fn use_stderr(&self) -> bool {
        match self {
            AppError::MisplacedInput { .. } => true,
            AppError::Usage { source, .. } => source.use_stderr(),
        }
    }

    /// Text shown to the user, usage line included.
    pub fn render(&self) -> String {
        match self {
            AppError::MisplacedInput { usage, .. } => format!("error: {self}\n\n{usage}\n"),
            AppError::Usage { source, usage } => {
                let text = source.render().to_string();
                if lacks_usage(source.kind()) {
                    format!("{text}\n{usage}\n")
                } else {
                    text
                }
            }
        }
    }
}

/// Value errors clap reports without its usage line.
fn lacks_usage(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::InvalidValue
            | ErrorKind::ValueValidation
            | ErrorKind::NoEquals
            | ErrorKind::TooManyValues
            | ErrorKind::TooFewValues
            | ErrorKind::WrongNumberOfValues
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misplaced_input_renders_usage() {
        let err = AppError::MisplacedInput {
            input: "other.js".into(),
            flag: "-m".into(),
            usage: "Usage: crimp [input_file [input_file ...]] [-m]".into(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.use_stderr());
        assert_eq!(
            err.render(),
            "error: input file 'other.js' must come before the first flag '-m'\n\n\
             Usage: crimp [input_file [input_file ...]] [-m]\n"
        );
    }

    #[test]
    fn value_errors_gain_the_usage_line() {
        let usage = "Usage: crimp [input_file [input_file ...]]".to_string();
        let err = AppError::Usage {
            source: clap::Error::new(ErrorKind::ValueValidation),
            usage: usage.clone(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.render().ends_with(&format!("\n{usage}\n")));

        let err = AppError::Usage {
            source: clap::Error::new(ErrorKind::DisplayHelp),
            usage,
        };
        assert!(!err.render().contains("input_file"));
    }
}
