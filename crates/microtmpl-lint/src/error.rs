// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a lint run as a whole; findings inside a document are
/// [`Diagnostic`](crate::Diagnostic)s, never errors.
#[derive(Debug, Error)]
pub enum LintError {
    /// The document could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Invalid configuration or engine failure.
    #[error(transparent)]
    Engine(#[from] microtmpl_engine::Error),
}
