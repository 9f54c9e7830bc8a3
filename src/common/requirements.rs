//! Command availability checks.

use crate::common::host::Host;
use crate::error::{ProvisionError, ProvisionResult};
use crate::ui::prelude::*;

/// Succeeds when `name` resolves in PATH.
pub fn command_exists(host: &dyn Host, name: &str) -> ProvisionResult<()> {
    if host.command_in_path(name) {
        return Ok(());
    }
    diag(
        Level::Error,
        "command_exists",
        &format!("required command '{}' not found in PATH", name),
    );
    Err(ProvisionError::NotFound(name.to_string()))
}

/// Check every command, reporting each missing one.
pub fn commands_exist<S: AsRef<str>>(host: &dyn Host, names: &[S]) -> ProvisionResult<()> {
    let missing: Vec<&str> = names
        .iter()
        .map(|name| name.as_ref())
        .filter(|name| command_exists(host, name).is_err())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ProvisionError::NotFound(missing.join(", ")))
    }
}
