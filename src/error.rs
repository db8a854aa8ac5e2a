//! Error types for the emitter.
//!
//! Using thiserror for more idiomatic error handling. The instruction core
//! itself has no error paths; everything that can fail lives on the output
//! side and is propagated to the compilation driver, which decides whether
//! to abort.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for unit emission.
#[derive(Error, Debug)]
pub enum EmitError {
    /// A format template asked for an operand count the renderer does not
    /// support. This signals a code-generation defect, not user input.
    #[error("unhandled operand count {arity} for op {opname} (format \"{format}\")")]
    UnhandledArity {
        opname: String,
        format: String,
        arity: usize,
    },

    /// The textual output destination could not be opened.
    #[error("cannot open output file {}", path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing to an already open textual destination failed.
    #[error("failed writing to output")]
    Io(#[from] io::Error),

    /// The external bytecode sink reported a failure; the cause is carried
    /// through unchanged.
    #[error("bytecode sink failed")]
    Sink {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type alias for emit operations.
pub type EmitResult<T> = Result<T, EmitError>;
