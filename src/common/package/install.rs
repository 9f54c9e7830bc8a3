//! Package installation through the native backends.

use crate::common::config::Config;
use crate::common::host::Host;
use crate::common::privileges::require_root;
use crate::common::requirements::command_exists;
use crate::error::{ProvisionError, ProvisionResult};
use crate::ui::prelude::*;

use super::manager::{InstallBackend, InstallOptions};
use super::select::PackageManagerProfile;
use super::{PackageSet, resolve_profile};

const OPERATION: &str = "install_packages";

/// Install packages with an explicit backend.
pub fn install_packages(
    host: &dyn Host,
    backend: InstallBackend,
    packages: &PackageSet,
    options: InstallOptions,
) -> ProvisionResult<()> {
    if packages.is_empty() {
        return Ok(());
    }

    require_root(host)?;
    command_exists(host, backend.command())?;
    run_install(host, backend, packages, options).map_err(|err| {
        diag(Level::Error, OPERATION, &err.to_string());
        err
    })
}

/// Install packages with the backend matching the host.
///
/// On RedHat hosts dnf is tried first and yum after it; only the combined
/// failure is reported. Failure to determine the distribution is generic.
pub fn install_packages_auto(
    host: &dyn Host,
    config: &Config,
    packages: &PackageSet,
) -> ProvisionResult<()> {
    if packages.is_empty() {
        return Ok(());
    }

    require_root(host)?;
    let profile = resolve_profile(host, config, OPERATION)?;
    install_with_profile(host, config, &profile, packages)
}

/// Install through the profile's installers. The caller owns the privilege check.
pub(super) fn install_with_profile(
    host: &dyn Host,
    config: &Config,
    profile: &PackageManagerProfile,
    packages: &PackageSet,
) -> ProvisionResult<()> {
    let options = InstallOptions {
        noninteractive: config.debian_noninteractive,
    };

    let candidates: Vec<InstallBackend> = profile
        .installers
        .iter()
        .copied()
        .filter(|backend| host.command_in_path(backend.command()))
        .collect();

    if candidates.is_empty() {
        let names: Vec<&str> = profile.installers.iter().map(|b| b.command()).collect();
        diag(
            Level::Error,
            OPERATION,
            &format!("required command '{}' not found in PATH", names.join("' or '")),
        );
        return Err(ProvisionError::NotFound(names.join(", ")));
    }

    for backend in &candidates {
        match run_install(host, *backend, packages, options) {
            Ok(()) => return Ok(()),
            Err(err) => diag(Level::Debug, OPERATION, &err.to_string()),
        }
    }

    let tried: Vec<&str> = candidates.iter().map(|b| b.command()).collect();
    let err = ProvisionError::generic(format!(
        "failed to install {} with {}",
        packages,
        tried.join(" or ")
    ));
    diag(Level::Error, OPERATION, &err.to_string());
    Err(err)
}

fn run_install(
    host: &dyn Host,
    backend: InstallBackend,
    packages: &PackageSet,
    options: InstallOptions,
) -> ProvisionResult<()> {
    let invocation = backend.install_invocation(packages.names(), options);
    diag(Level::Info, OPERATION, &format!("installing {} with {}", packages, backend));

    let output = host
        .run(&invocation)
        .map_err(|e| ProvisionError::generic(format!("failed to run {}: {}", backend, e)))?;
    if output.success() {
        Ok(())
    } else {
        Err(ProvisionError::generic(format!(
            "'{}' failed with {}",
            invocation.command_line(),
            output.describe_status()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::host::mock::MockHost;

    const UBUNTU: &str = "ID=ubuntu\nID_LIKE=debian\n";
    const ROCKY: &str = "ID=rocky\nID_LIKE=\"rhel centos fedora\"\n";
    const ARCH: &str = "ID=arch\n";

    #[test]
    fn test_empty_set_runs_nothing() {
        let host = MockHost::new();
        let empty = PackageSet::default();
        let options = InstallOptions::default();
        assert!(install_packages(&host, InstallBackend::AptGet, &empty, options).is_ok());
        assert!(install_packages_auto(&host, &Config::default(), &empty).is_ok());
        assert!(host.invocations().is_empty());
    }

    #[test]
    fn test_explicit_backend() {
        let host = MockHost::new().as_root().with_commands(&["apt-get"]);
        let packages = PackageSet::from(["vim", "curl"]);
        let options = InstallOptions::default();
        install_packages(&host, InstallBackend::AptGet, &packages, options).unwrap();

        let installs: Vec<_> = host
            .invocations()
            .into_iter()
            .filter(|i| i.program == "apt-get")
            .collect();
        assert_eq!(installs.len(), 1);
        assert_eq!(installs[0].command_line(), "apt-get install -y vim curl");
        assert_eq!(installs[0].env[0].0, "DEBIAN_FRONTEND");
    }

    #[test]
    fn test_explicit_backend_missing_command() {
        let host = MockHost::new().as_root();
        let packages = PackageSet::from(["vim"]);
        assert_eq!(
            install_packages(&host, InstallBackend::Pacman, &packages, InstallOptions::default()),
            Err(ProvisionError::NotFound("pacman".into()))
        );
    }

    #[test]
    fn test_non_root_never_installs() {
        let host = MockHost::new()
            .as_user(1000, "builder")
            .with_os_release(ARCH)
            .with_commands(&["pacman"]);
        let packages = PackageSet::from(["git"]);
        assert!(matches!(
            install_packages(&host, InstallBackend::Pacman, &packages, InstallOptions::default()),
            Err(ProvisionError::Permission(_))
        ));
        assert!(matches!(
            install_packages_auto(&host, &Config::default(), &packages),
            Err(ProvisionError::Permission(_))
        ));
        assert!(host.package_command_lines().is_empty());
    }

    #[test]
    fn test_backend_failure_is_generic() {
        let host = MockHost::new()
            .as_root()
            .with_commands(&["pacman"])
            .failing("pacman -S");
        let packages = PackageSet::from(["git"]);
        assert!(matches!(
            install_packages(&host, InstallBackend::Pacman, &packages, InstallOptions::default()),
            Err(ProvisionError::Generic(_))
        ));
    }

    #[test]
    fn test_auto_debian_respects_config() {
        let host = MockHost::new()
            .as_root()
            .with_os_release(UBUNTU)
            .with_commands(&["dpkg", "apt-get"]);
        let config = Config {
            debian_noninteractive: false,
            ..Config::default()
        };
        install_packages_auto(&host, &config, &PackageSet::from(["git"])).unwrap();
        let apt = host
            .invocations()
            .into_iter()
            .find(|i| i.program == "apt-get")
            .unwrap();
        assert!(apt.env.is_empty());
    }

    #[test]
    fn test_auto_rhel_falls_back_to_yum_silently() {
        let host = MockHost::new()
            .as_root()
            .with_os_release(ROCKY)
            .with_commands(&["rpm", "dnf", "yum"])
            .failing("dnf install");
        install_packages_auto(&host, &Config::default(), &PackageSet::from(["git"])).unwrap();
        assert_eq!(
            host.package_command_lines(),
            vec!["dnf install -y git", "yum install -y git"]
        );
    }

    #[test]
    fn test_auto_rhel_both_failing_is_one_error() {
        let host = MockHost::new()
            .as_root()
            .with_os_release(ROCKY)
            .with_commands(&["rpm", "dnf", "yum"])
            .failing("dnf install")
            .failing("yum install");
        assert_eq!(
            install_packages_auto(&host, &Config::default(), &PackageSet::from(["git"])),
            Err(ProvisionError::generic("failed to install git with dnf or yum"))
        );
    }

    #[test]
    fn test_auto_arch() {
        let host = MockHost::new()
            .as_root()
            .with_os_release(ARCH)
            .with_commands(&["pacman"]);
        let packages = PackageSet::from(["base-devel"]);
        install_packages_auto(&host, &Config::default(), &packages).unwrap();
        assert_eq!(
            host.package_command_lines(),
            vec!["pacman -S --noconfirm --needed base-devel"]
        );
    }

    #[test]
    fn test_auto_unresolvable_distribution_is_generic() {
        let packages = PackageSet::from(["git"]);

        let host = MockHost::new().as_root().with_os_release("ID=gentoo\n");
        match install_packages_auto(&host, &Config::default(), &packages) {
            Err(ProvisionError::Generic(message)) => {
                assert!(message.starts_with("cannot determine distribution"));
                assert!(message.contains("gentoo"));
            }
            other => panic!("expected a generic error, got {:?}", other),
        }

        // no os-release at all
        let host = MockHost::new().as_root();
        assert!(matches!(
            install_packages_auto(&host, &Config::default(), &packages),
            Err(ProvisionError::Generic(_))
        ));
        assert!(host.package_command_lines().is_empty());
    }
}
