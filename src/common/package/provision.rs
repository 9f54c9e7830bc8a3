//! One-shot provisioning: refresh the index, then install what is missing.

use crate::common::config::Config;
use crate::common::host::Host;
use crate::common::privileges::require_root;
use crate::error::ProvisionResult;
use crate::ui::prelude::*;

use super::install::install_with_profile;
use super::query::packages_installed;
use super::refresh::{RefreshOutcome, RefreshRoute, refresh_route};
use super::select::PackageManagerProfile;
use super::{PackageSet, resolve_identity};

const OPERATION: &str = "provision";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    /// `None` when the host's package manager keeps no separate index
    pub refresh: Option<RefreshOutcome>,
    /// Whether an install ran; false when everything was already present
    pub installed: bool,
}

/// Privilege check and host resolution happen once; every step reuses them.
pub fn provision(
    host: &dyn Host,
    config: &Config,
    packages: &PackageSet,
) -> ProvisionResult<ProvisionReport> {
    let separator = config.progress_separator.as_str();

    progress(OPERATION, "Checking privileges", separator);
    require_root(host)?;
    let identity = resolve_identity(host, config)?;
    let profile = PackageManagerProfile::for_identity(host, &identity)?;

    let refresh = match RefreshRoute::for_family(identity.family) {
        Some(route) => {
            progress(OPERATION, "Refreshing package index", separator);
            Some(refresh_route(host, config, route)?)
        }
        None => {
            diag(
                Level::Info,
                OPERATION,
                &format!("no separate index refresh for {}, skipping", identity.family),
            );
            None
        }
    };

    if packages.is_empty() {
        return Ok(ProvisionReport {
            refresh,
            installed: false,
        });
    }

    progress(OPERATION, "Checking installed packages", separator);
    if packages_installed(host, profile.query, packages).is_ok() {
        diag(
            Level::Info,
            OPERATION,
            &format!("all {} packages already installed", packages.len()),
        );
        return Ok(ProvisionReport {
            refresh,
            installed: false,
        });
    }

    progress(OPERATION, &format!("Installing {}", packages), separator);
    install_with_profile(host, config, &profile, packages)?;
    Ok(ProvisionReport {
        refresh,
        installed: true,
    })
}
