use std::path::PathBuf;

/// Raised while constructing a runner. No runner exists afterwards.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Executable not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("Path is not a regular file: {}", path.display())]
    NotRegularFile { path: PathBuf },
    #[error("File is not executable: {}", path.display())]
    NotExecutable { path: PathBuf },
    #[error("Failed to read metadata of {}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Raised by a single `execute` call. No partial result is produced.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("Failed to spawn {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Child has no {0} pipe")]
    MissingPipe(&'static str),
    #[error("Failed to kill child after timeout")]
    Kill(#[source] std::io::Error),
    #[error("Failed to wait for child exit")]
    Wait(#[source] std::io::Error),
    #[error("Failed to build the execution runtime")]
    Runtime(#[source] std::io::Error),
}
