//! Distribution-agnostic package management.
//!
//! # Architecture
//!
//! - [`manager`]: the native backends and the exact invocations they take
//! - [`select`]: which backends a distribution family requires
//! - [`query`], [`refresh`], [`install`]: the package services
//! - [`provision`]: refresh + query + install, the CI entry point
//!
//! Every service reports its own failures through `ui::diag` and returns a
//! [`ProvisionError`](crate::error::ProvisionError) for the caller.

mod install;
mod manager;
mod provision;
mod query;
mod refresh;
mod select;

use std::fmt;

use crate::common::config::Config;
use crate::common::distro::DistroIdentity;
use crate::common::host::Host;
use crate::error::{ProvisionError, ProvisionResult};
use crate::ui::prelude::*;

use select::PackageManagerProfile;

pub use install::{install_packages, install_packages_auto};
pub use manager::{InstallBackend, InstallOptions, QueryBackend};
pub use provision::{ProvisionReport, provision};
pub use query::{packages_installed, packages_installed_auto};
pub use refresh::{RefreshOutcome, refresh_cache};
pub use select::{check_package_managers, required_commands};

/// Resolve the host identity using the configured os-release path.
pub fn resolve_identity(host: &dyn Host, config: &Config) -> ProvisionResult<DistroIdentity> {
    DistroIdentity::resolve(host, &config.os_release_path, &config.category_fallbacks)
}

/// Resolve the host and select its profile for a distribution-agnostic service.
///
/// Any failure to determine the distribution is reported as a generic error
/// under `operation`.
fn resolve_profile(
    host: &dyn Host,
    config: &Config,
    operation: &str,
) -> ProvisionResult<PackageManagerProfile> {
    resolve_identity(host, config)
        .and_then(|identity| PackageManagerProfile::for_identity(host, &identity))
        .map_err(|e| {
            let err = ProvisionError::generic(format!("cannot determine distribution: {}", e));
            diag(Level::Error, operation, &err.to_string());
            err
        })
}

/// Ordered, duplicate-free list of package names for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet {
    names: Vec<String>,
}

impl PackageSet {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    fn push(&mut self, name: String) {
        let name = name.trim().to_string();
        if !name.is_empty() && !self.names.contains(&name) {
            self.names.push(name);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for PackageSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::default();
        for name in iter {
            set.push(name.into());
        }
        set
    }
}

impl<const N: usize> From<[&str; N]> for PackageSet {
    fn from(names: [&str; N]) -> Self {
        names.into_iter().collect()
    }
}

impl fmt::Display for PackageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names.join(" "))
    }
}
