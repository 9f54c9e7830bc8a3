use clap::Subcommand;
use serde_json::json;

use crate::common::config::Config;
use crate::common::distro::{distro_categories, distro_id};
use crate::common::host::Host;
use crate::common::package::{
    self, InstallBackend, InstallOptions, PackageSet, QueryBackend, RefreshOutcome,
};
use crate::common::privileges::require_root;
use crate::common::requirements::commands_exist;
use crate::error::ProvisionResult;
use crate::ui::prelude::*;

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the detected distribution id, categories and family
    Detect {
        /// Print only the distribution id
        #[arg(long, conflicts_with = "categories")]
        id: bool,
        /// Print only the categories (empty when the host declares none)
        #[arg(long)]
        categories: bool,
    },

    /// List the package manager commands this host requires
    Select,

    /// Verify every required package manager command is in PATH
    Check,

    /// Verify that commands are available in PATH
    CommandExists {
        /// Commands to look up
        names: Vec<String>,
    },

    /// Succeed only if every package is installed
    Query {
        /// Query backend (defaults to the host's)
        #[arg(short, long, value_enum)]
        backend: Option<QueryBackend>,
        packages: Vec<String>,
    },

    /// Refresh the package index when it is stale
    Refresh,

    /// Install packages non-interactively
    Install {
        /// Install backend (defaults to the host's)
        #[arg(short, long, value_enum)]
        backend: Option<InstallBackend>,
        /// Allow apt-get configuration prompts
        #[arg(long)]
        interactive: bool,
        packages: Vec<String>,
    },

    /// Refresh the index and install whatever is missing
    Provision { packages: Vec<String> },

    /// Check for root privileges and print the current user
    RequireRoot,
}

pub fn dispatch(host: &dyn Host, config: &Config, command: Commands) -> ProvisionResult<()> {
    match command {
        Commands::Detect { id: true, .. } => {
            let id = distro_id(host, &config.os_release_path)?;
            emit(Level::Info, "distro_id", &id, Some(json!({ "id": id })));
            Ok(())
        }
        Commands::Detect {
            categories: true, ..
        } => {
            let categories = distro_categories(host, &config.os_release_path)?;
            emit(
                Level::Info,
                "distro_categories",
                &categories,
                Some(json!({ "categories": categories })),
            );
            Ok(())
        }
        Commands::Detect { .. } => detect(host, config),
        Commands::Select => {
            let identity = package::resolve_identity(host, config)?;
            let commands = package::required_commands(host, &identity)?;
            print_commands("select", &commands);
            Ok(())
        }
        Commands::Check => {
            let identity = package::resolve_identity(host, config)?;
            let commands = package::check_package_managers(host, &identity)?;
            emit(
                Level::Success,
                "check",
                &format!("all required commands available: {}", commands.join(" ")),
                Some(json!({ "commands": commands })),
            );
            Ok(())
        }
        Commands::CommandExists { names } => commands_exist(host, &names),
        Commands::Query { backend, packages } => {
            let packages: PackageSet = packages.into_iter().collect();
            match backend {
                Some(backend) => package::packages_installed(host, backend, &packages),
                None => package::packages_installed_auto(host, config, &packages),
            }
        }
        Commands::Refresh => {
            let outcome = package::refresh_cache(host, config)?;
            report_refresh(&outcome);
            Ok(())
        }
        Commands::Install {
            backend,
            interactive,
            packages,
        } => {
            let packages: PackageSet = packages.into_iter().collect();
            match backend {
                Some(backend) => {
                    let options = InstallOptions {
                        noninteractive: config.debian_noninteractive && !interactive,
                    };
                    package::install_packages(host, backend, &packages, options)
                }
                None if interactive => {
                    let config = Config {
                        debian_noninteractive: false,
                        ..config.clone()
                    };
                    package::install_packages_auto(host, &config, &packages)
                }
                None => package::install_packages_auto(host, config, &packages),
            }
        }
        Commands::Provision { packages } => {
            let packages: PackageSet = packages.into_iter().collect();
            let report = package::provision(host, config, &packages)?;
            if let Some(outcome) = &report.refresh {
                report_refresh(outcome);
            }
            emit(
                Level::Success,
                "provision",
                if report.installed {
                    "packages installed"
                } else {
                    "nothing to install"
                },
                Some(json!({ "installed": report.installed })),
            );
            Ok(())
        }
        Commands::RequireRoot => {
            let username = require_root(host)?;
            emit(
                Level::Info,
                "require_root",
                &username,
                Some(json!({ "user": username })),
            );
            Ok(())
        }
    }
}

fn detect(host: &dyn Host, config: &Config) -> ProvisionResult<()> {
    let identity = package::resolve_identity(host, config)?;
    let ci = config.is_ci(|key| std::env::var(key).ok());

    let data = json!({
        "id": identity.id,
        "categories": identity.categories,
        "family": identity.family.name(),
        "ci": ci,
    });
    let text = format!(
        "id: {}\ncategories: {}\nfamily: {}\nci: {}",
        identity.id, identity.categories, identity.family, ci
    );
    emit(Level::Info, "detect", &text, Some(data));
    Ok(())
}

fn print_commands(code: &str, commands: &[&str]) {
    emit(
        Level::Info,
        code,
        &commands.join("\n"),
        Some(json!({ "commands": commands })),
    );
}

fn report_refresh(outcome: &RefreshOutcome) {
    let (message, data) = match outcome {
        RefreshOutcome::Refreshed(backend) => (
            format!("package index refreshed with {}", backend),
            json!({ "refreshed": true, "backend": backend.command() }),
        ),
        RefreshOutcome::Fresh { age } => (
            "package index is fresh".to_string(),
            json!({ "refreshed": false, "age_secs": age.as_secs() }),
        ),
    };
    emit(Level::Success, "refresh_cache", &message, Some(data));
}
