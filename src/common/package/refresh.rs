//! Package index refresh.

use std::path::Path;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};

use crate::common::config::Config;
use crate::common::distro::DistroFamily;
use crate::common::host::{Host, Invocation};
use crate::common::privileges::require_root;
use crate::error::{ProvisionError, ProvisionResult};
use crate::ui::prelude::*;

use super::manager::{InstallBackend, apt_update_invocation};
use super::resolve_identity;

const OPERATION: &str = "refresh_cache";

/// How a family's package index gets refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRoute {
    /// apt-get update, skipped while the cache directory is fresh
    Staleness,
    /// dnf makecache, then yum makecache, unconditionally
    RpmFrontends,
}

impl RefreshRoute {
    /// `None` for families this dispatcher has no route for.
    pub fn for_family(family: DistroFamily) -> Option<Self> {
        match family {
            DistroFamily::Debian => Some(Self::Staleness),
            DistroFamily::RedHat => Some(Self::RpmFrontends),
            DistroFamily::ArchLike | DistroFamily::Unknown => None,
        }
    }
}

/// What the refresh actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed(InstallBackend),
    /// Index refreshed less than the configured interval ago
    Fresh { age: Duration },
}

/// Bring the host's package index up to date.
///
/// A host without a refresh route is a configuration error and terminates
/// the process.
pub fn refresh_cache(host: &dyn Host, config: &Config) -> ProvisionResult<RefreshOutcome> {
    require_root(host)?;
    let identity = resolve_identity(host, config)?;

    let Some(route) = RefreshRoute::for_family(identity.family) else {
        fatal(
            OPERATION,
            &format!(
                "no cache refresh route for category '{}' (id '{}')",
                identity.categories, identity.id
            ),
        );
    };

    refresh_route(host, config, route)
}

/// Refresh along an already selected route. The caller owns the privilege check.
pub(super) fn refresh_route(
    host: &dyn Host,
    config: &Config,
    route: RefreshRoute,
) -> ProvisionResult<RefreshOutcome> {
    match route {
        RefreshRoute::Staleness => refresh_apt(
            host,
            &config.apt_cache_dir,
            Duration::from_secs(config.refresh_interval_secs),
        ),
        RefreshRoute::RpmFrontends => refresh_rpm(host),
    }
}

fn refresh_rpm(host: &dyn Host) -> ProvisionResult<RefreshOutcome> {
    for backend in [InstallBackend::Dnf, InstallBackend::Yum] {
        if !host.command_in_path(backend.command()) {
            continue;
        }
        let Some(invocation) = backend.refresh_invocation() else {
            continue;
        };
        if run_refresh(host, &invocation) {
            diag(Level::Info, OPERATION, &format!("refreshed {} metadata cache", backend));
            return Ok(RefreshOutcome::Refreshed(backend));
        }
        diag(
            Level::Warn,
            OPERATION,
            &format!("'{}' failed", invocation.command_line()),
        );
    }

    let err = ProvisionError::generic("no suitable package manager found (tried dnf, yum)");
    diag(Level::Error, OPERATION, &err.to_string());
    Err(err)
}

fn refresh_apt(
    host: &dyn Host,
    cache_dir: &Path,
    interval: Duration,
) -> ProvisionResult<RefreshOutcome> {
    if let Some(last) = last_refresh(host, cache_dir) {
        let age = cache_age(host.now(), last);
        if age < interval {
            diag(
                Level::Info,
                OPERATION,
                &format!(
                    "package index refreshed {} ago ({}), skipping update",
                    format_age(age),
                    DateTime::<Local>::from(last).format("%Y-%m-%d %H:%M:%S")
                ),
            );
            return Ok(RefreshOutcome::Fresh { age });
        }
    }

    let invocation = apt_update_invocation();
    if run_refresh(host, &invocation) {
        diag(Level::Info, OPERATION, "refreshed apt package index");
        Ok(RefreshOutcome::Refreshed(InstallBackend::AptGet))
    } else {
        let err = ProvisionError::generic(format!("'{}' failed", invocation.command_line()));
        diag(Level::Error, OPERATION, &err.to_string());
        Err(err)
    }
}

/// Last refresh time of the apt index. A missing directory counts as never.
fn last_refresh(host: &dyn Host, cache_dir: &Path) -> Option<SystemTime> {
    match host.modified(cache_dir) {
        Ok(time) => Some(time),
        Err(e) => {
            diag(
                Level::Debug,
                OPERATION,
                &format!("cannot stat {}: {}", cache_dir.display(), e),
            );
            None
        }
    }
}

/// Age of the cache. Timestamps in the future count as just refreshed.
fn cache_age(now: SystemTime, last: SystemTime) -> Duration {
    now.duration_since(last).unwrap_or(Duration::ZERO)
}

fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m", secs / 60),
        _ => format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60),
    }
}

fn run_refresh(host: &dyn Host, invocation: &Invocation) -> bool {
    match host.run(invocation) {
        Ok(output) => {
            if !output.success() {
                diag(
                    Level::Debug,
                    OPERATION,
                    &format!("{}: {}", invocation.command_line(), output.describe_status()),
                );
            }
            output.success()
        }
        Err(e) => {
            diag(
                Level::Debug,
                OPERATION,
                &format!("{}: {}", invocation.command_line(), e),
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::host::mock::MockHost;

    const UBUNTU: &str = "ID=ubuntu\nID_LIKE=debian\n";
    const ROCKY: &str = "ID=\"rocky\"\nID_LIKE=\"rhel centos fedora\"\n";
    const APT_DIR: &str = "/var/cache/apt";

    fn hours(h: u64) -> Duration {
        Duration::from_secs(h * 3600)
    }

    #[test]
    fn test_routes() {
        assert_eq!(
            RefreshRoute::for_family(DistroFamily::Debian),
            Some(RefreshRoute::Staleness)
        );
        assert_eq!(
            RefreshRoute::for_family(DistroFamily::RedHat),
            Some(RefreshRoute::RpmFrontends)
        );
        assert_eq!(RefreshRoute::for_family(DistroFamily::ArchLike), None);
        assert_eq!(RefreshRoute::for_family(DistroFamily::Unknown), None);
    }

    #[test]
    fn test_fresh_apt_cache_is_skipped() {
        let host = MockHost::new()
            .as_root()
            .with_os_release(UBUNTU)
            .with_commands(&["apt-get"])
            .with_mtime_age(APT_DIR, hours(2));
        let outcome = refresh_cache(&host, &Config::default()).unwrap();
        assert_eq!(outcome, RefreshOutcome::Fresh { age: hours(2) });
        assert!(host.package_command_lines().is_empty());
    }

    #[test]
    fn test_stale_apt_cache_is_refreshed_once() {
        let host = MockHost::new()
            .as_root()
            .with_os_release(UBUNTU)
            .with_commands(&["apt-get"])
            .with_mtime_age(APT_DIR, hours(25))
            .touching("apt-get update", APT_DIR);
        let config = Config::default();

        assert_eq!(
            refresh_cache(&host, &config).unwrap(),
            RefreshOutcome::Refreshed(InstallBackend::AptGet)
        );
        assert!(matches!(
            refresh_cache(&host, &config).unwrap(),
            RefreshOutcome::Fresh { .. }
        ));
        assert_eq!(host.package_command_lines(), vec!["apt-get update"]);
    }

    #[test]
    fn test_missing_apt_cache_dir_counts_as_stale() {
        let host = MockHost::new()
            .as_root()
            .with_os_release(UBUNTU)
            .with_commands(&["apt-get"]);
        assert_eq!(
            refresh_cache(&host, &Config::default()).unwrap(),
            RefreshOutcome::Refreshed(InstallBackend::AptGet)
        );
    }

    #[test]
    fn test_future_mtime_is_fresh() {
        assert_eq!(
            cache_age(SystemTime::UNIX_EPOCH, SystemTime::UNIX_EPOCH + hours(1)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_apt_update_failure_is_generic() {
        let host = MockHost::new()
            .as_root()
            .with_os_release(UBUNTU)
            .with_commands(&["apt-get"])
            .failing("apt-get update");
        assert!(matches!(
            refresh_cache(&host, &Config::default()),
            Err(ProvisionError::Generic(_))
        ));
    }

    #[test]
    fn test_custom_interval() {
        let host = MockHost::new()
            .as_root()
            .with_os_release(UBUNTU)
            .with_commands(&["apt-get"])
            .with_mtime_age(APT_DIR, hours(2));
        let config = Config {
            refresh_interval_secs: 3600,
            ..Config::default()
        };
        assert_eq!(
            refresh_cache(&host, &config).unwrap(),
            RefreshOutcome::Refreshed(InstallBackend::AptGet)
        );
    }

    #[test]
    fn test_rhel_with_dnf_never_tries_yum() {
        let host = MockHost::new()
            .as_root()
            .with_os_release(ROCKY)
            .with_commands(&["rpm", "dnf", "yum"]);
        assert_eq!(
            refresh_cache(&host, &Config::default()).unwrap(),
            RefreshOutcome::Refreshed(InstallBackend::Dnf)
        );
        assert_eq!(host.package_command_lines(), vec!["dnf makecache"]);
    }

    #[test]
    fn test_rhel_falls_back_to_yum() {
        let host = MockHost::new()
            .as_root()
            .with_os_release(ROCKY)
            .with_commands(&["rpm", "yum"]);
        assert_eq!(
            refresh_cache(&host, &Config::default()).unwrap(),
            RefreshOutcome::Refreshed(InstallBackend::Yum)
        );
        assert_eq!(host.package_command_lines(), vec!["yum makecache"]);
    }

    #[test]
    fn test_rhel_both_frontends_failing() {
        let host = MockHost::new()
            .as_root()
            .with_os_release(ROCKY)
            .with_commands(&["rpm", "dnf", "yum"])
            .failing("dnf makecache")
            .failing("yum makecache");
        assert_eq!(
            refresh_cache(&host, &Config::default()),
            Err(ProvisionError::generic(
                "no suitable package manager found (tried dnf, yum)"
            ))
        );
        assert_eq!(
            host.package_command_lines(),
            vec!["dnf makecache", "yum makecache"]
        );
    }

    #[test]
    fn test_rhel_without_frontends() {
        let host = MockHost::new()
            .as_root()
            .with_os_release(ROCKY)
            .with_commands(&["rpm"]);
        assert!(matches!(
            refresh_cache(&host, &Config::default()),
            Err(ProvisionError::Generic(_))
        ));
        assert!(host.package_command_lines().is_empty());
    }

    #[test]
    fn test_non_root_aborts_before_anything() {
        let host = MockHost::new()
            .as_user(1000, "builder")
            .with_os_release(UBUNTU)
            .with_commands(&["apt-get"]);
        assert!(matches!(
            refresh_cache(&host, &Config::default()),
            Err(ProvisionError::Permission(_))
        ));
        assert!(host.package_command_lines().is_empty());
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::from_secs(42)), "42s");
        assert_eq!(format_age(Duration::from_secs(600)), "10m");
        assert_eq!(format_age(Duration::from_secs(3 * 3600 + 5 * 60)), "3h05m");
    }
}
