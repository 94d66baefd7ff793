use serde::Serialize;
use std::io::{self, IsTerminal};
use std::process::ExitCode;

use pagepress_lib::{ErrorPayload, PressError};

use crate::cli::OutputFormat;

/// Exit code for a failed command: 1 when the render itself failed, 2 for
/// configuration, input and environment errors.
pub fn exit_code_for(err: &PressError) -> u8 {
    match err {
        PressError::RenderTimeout { .. }
        | PressError::EngineFault(_)
        | PressError::ResultTooLarge { .. } => 1,
        PressError::InvalidInput(_)
        | PressError::PayloadTooLarge { .. }
        | PressError::OriginNotAllowed(_)
        | PressError::ServiceUnavailable(_)
        | PressError::Io(_)
        | PressError::Serialization(_)
        | PressError::Config(_) => 2,
    }
}

#[derive(Serialize)]
struct ErrorOutput<'a> {
    mode: &'static str,
    #[serde(flatten)]
    error: &'a ErrorPayload,
}

/// Write a serialisable value to stdout in the requested format.
pub fn write_output<T: Serialize>(body: &T, format: OutputFormat, summary: &str) -> io::Result<()> {
    match format {
        OutputFormat::Pretty if io::stdout().is_terminal() => println!("{summary}"),
        _ => {
            let content = serde_json::to_string(body).map_err(io::Error::other)?;
            println!("{content}");
        }
    }
    Ok(())
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: PressError, format: OutputFormat) -> ExitCode {
    let payload = err.to_payload();
    let summary = match &payload.remediation {
        Some(hint) => format!("Error: {}\nHint: {}", payload.error, hint),
        None => format!("Error: {}", payload.error),
    };
    let output = ErrorOutput {
        mode: "error",
        error: &payload,
    };
    if let Err(write_err) = write_output(&output, format, &summary) {
        eprintln!("Failed to write error output: {}", write_err);
        eprintln!("{summary}");
    }
    ExitCode::from(exit_code_for(&err))
}
