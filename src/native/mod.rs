/// Native module runs programs by talking to the operating system directly:
/// pipes, process groups and signals, with no sandbox in between.
pub mod child;
pub mod engine;
pub mod runner;

use std::future::Future;

use crate::core::errors::SpawnError;

/// Drives `future` to completion on a fresh current-thread runtime.
///
/// # Panics
///
/// Panics when called from inside another tokio runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output, SpawnError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        panic!("Blocking execution called from inside a tokio runtime; use the async form");
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SpawnError::Runtime)?;
    Ok(runtime.block_on(future))
}
