use crate::common::host::{Host, Invocation};
use crate::error::{ProvisionError, ProvisionResult};
use crate::ui::prelude::*;

const OPERATION: &str = "require_root";

/// Fail unless the effective user is root. Returns the resolved username.
///
/// Must run before anything that mutates package state.
pub fn require_root(host: &dyn Host) -> ProvisionResult<String> {
    if !host.command_in_path("id") {
        let err = ProvisionError::prerequisite("the 'id' command is required to check privileges");
        diag(Level::Error, OPERATION, &err.to_string());
        return Err(err);
    }

    let uid = query_id(host, "-u")?;
    if uid != "0" {
        let err = ProvisionError::Permission(format!(
            "this operation requires root privileges (effective uid {})",
            uid
        ));
        diag(Level::Error, OPERATION, &err.to_string());
        return Err(err);
    }

    let username = query_id(host, "-un")?;
    diag(Level::Info, OPERATION, &format!("running as {}", username));
    Ok(username)
}

fn query_id(host: &dyn Host, flag: &str) -> ProvisionResult<String> {
    let invocation = Invocation::new("id", [flag]).captured();
    let failure = |detail: String| {
        let err = ProvisionError::generic(format!(
            "'{}' failed: {}",
            invocation.command_line(),
            detail
        ));
        diag(Level::Error, OPERATION, &err.to_string());
        err
    };

    let output = host.run(&invocation).map_err(|e| failure(e.to_string()))?;
    if !output.success() {
        return Err(failure(output.describe_status()));
    }

    let value = output.stdout.trim().to_string();
    if value.is_empty() {
        return Err(failure("empty output".to_string()));
    }
    Ok(value)
}
