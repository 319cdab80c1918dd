//! Opening a served directory in the host's file manager.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ShareError;

#[cfg(target_os = "windows")]
const OPENER: &str = "explorer";
#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const OPENER: &str = "xdg-open";

/// Command that opens `dir` with the platform's default file manager.
pub fn open_command(dir: &Path) -> Command {
    let mut command = Command::new(OPENER);
    command.arg(dir);
    command
}

/// Open `dir` and wait for the opener to exit.
pub async fn open_folder(dir: &Path) -> Result<(), ShareError> {
    debug!("Opening {} with {}", dir.display(), OPENER);

    let status = open_command(dir)
        .status()
        .await
        .map_err(|err| ShareError::OpenFolder(format!("{}: {}", OPENER, err)))?;

    // explorer.exe exits with 1 even on success.
    if !status.success() && !cfg!(target_os = "windows") {
        warn!("{} exited with {}", OPENER, status);
        return Err(ShareError::OpenFolder(format!("{} exited with {}", OPENER, status)));
    }

    Ok(())
}
