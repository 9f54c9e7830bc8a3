//! Installed-package queries.

use crate::common::config::Config;
use crate::common::host::Host;
use crate::error::{ProvisionError, ProvisionResult};
use crate::ui::prelude::*;

use super::manager::QueryBackend;
use super::{PackageSet, resolve_profile};

const OPERATION: &str = "query_packages";

/// Succeeds when every package is reported installed by `backend`.
pub fn packages_installed(
    host: &dyn Host,
    backend: QueryBackend,
    packages: &PackageSet,
) -> ProvisionResult<()> {
    if packages.is_empty() {
        return Ok(());
    }

    let invocation = backend.query_invocation(packages.names());
    let output = host.run(&invocation).map_err(|e| {
        let err = ProvisionError::generic(format!("failed to run {}: {}", backend, e));
        diag(Level::Error, OPERATION, &err.to_string());
        err
    })?;

    if output.success() {
        diag(
            Level::Debug,
            OPERATION,
            &format!("{} reports installed: {}", backend, packages),
        );
        Ok(())
    } else {
        diag(Level::Debug, OPERATION, output.stderr.trim());
        let err = ProvisionError::generic(format!(
            "{} reports packages not installed among: {}",
            backend, packages
        ));
        diag(Level::Info, OPERATION, &err.to_string());
        Err(err)
    }
}

/// Like [`packages_installed`], with the backend chosen from the host identity.
pub fn packages_installed_auto(
    host: &dyn Host,
    config: &Config,
    packages: &PackageSet,
) -> ProvisionResult<()> {
    if packages.is_empty() {
        return Ok(());
    }

    let profile = resolve_profile(host, config, OPERATION)?;
    packages_installed(host, profile.query, packages)
}
