//! Mapping from a distribution family to the package managers it needs.

use crate::common::distro::{DistroFamily, DistroIdentity};
use crate::common::host::Host;
use crate::common::requirements::commands_exist;
use crate::error::ProvisionResult;
use crate::ui::prelude::*;

use super::manager::{InstallBackend, QueryBackend};

/// Everything the package services need to know about a supported host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManagerProfile {
    pub required_commands: Vec<&'static str>,
    pub query: QueryBackend,
    /// Installers in the order they are attempted
    pub installers: Vec<InstallBackend>,
}

impl PackageManagerProfile {
    /// Select the profile for `identity`. RedHat hosts prefer dnf and use
    /// yum only when dnf is not in PATH.
    pub fn for_identity(host: &dyn Host, identity: &DistroIdentity) -> ProvisionResult<Self> {
        let profile = match identity.family {
            DistroFamily::Debian => Self {
                required_commands: vec!["dpkg", "apt-get"],
                query: QueryBackend::Dpkg,
                installers: vec![InstallBackend::AptGet],
            },
            DistroFamily::RedHat => {
                let frontend = if host.command_in_path("dnf") {
                    "dnf"
                } else {
                    "yum"
                };
                Self {
                    required_commands: vec!["rpm", frontend],
                    query: QueryBackend::Rpm,
                    installers: vec![InstallBackend::Dnf, InstallBackend::Yum],
                }
            }
            DistroFamily::ArchLike => Self {
                required_commands: vec!["pacman"],
                query: QueryBackend::Pacman,
                installers: vec![InstallBackend::Pacman],
            },
            DistroFamily::Unknown => {
                let err = identity.unsupported();
                diag(Level::Error, "select_package_manager", &err.to_string());
                return Err(err);
            }
        };
        Ok(profile)
    }
}

/// Commands required to manage packages on this host, in order.
pub fn required_commands(
    host: &dyn Host,
    identity: &DistroIdentity,
) -> ProvisionResult<Vec<&'static str>> {
    PackageManagerProfile::for_identity(host, identity).map(|p| p.required_commands)
}

/// Select the required commands and verify each one is in PATH.
pub fn check_package_managers(
    host: &dyn Host,
    identity: &DistroIdentity,
) -> ProvisionResult<Vec<&'static str>> {
    let commands = required_commands(host, identity)?;
    commands_exist(host, &commands)?;
    Ok(commands)
}
