//! Turn a directory into a tracked root.

use crate::output::Reporter;
use crate::store::Store;
use anyhow::Result;
use std::path::PathBuf;

/// Creates the control directory and the initial HEAD.
///
/// # Errors
///
/// Fails with `AlreadyTrackedRoot` if the directory is already tracked.
pub fn execute(root: PathBuf, reporter: &dyn Reporter) -> Result<()> {
    let store = Store::init(root)?;
    reporter.info(&format!(
        "Initialized tracked root at {}",
        store.root().display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ArkError;
    use crate::output::Recording;
    use tempfile::tempdir;

    #[test]
    fn test_init_then_reinit_fails() -> Result<()> {
        let temp = tempdir()?;
        let reporter = Recording::new();

        execute(temp.path().to_path_buf(), &reporter)?;
        let err = execute(temp.path().to_path_buf(), &reporter).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArkError>(),
            Some(ArkError::AlreadyTrackedRoot(_))
        ));
        Ok(())
    }
}
