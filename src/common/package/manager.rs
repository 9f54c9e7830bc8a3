//! Native package manager backends and their invocations.

use std::fmt;

use crate::common::host::Invocation;

/// Backends that can answer "is this package installed?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum QueryBackend {
    /// Pacman - Arch Linux family
    Pacman,
    /// dpkg - Debian/Ubuntu family
    Dpkg,
    /// rpm - RHEL/Fedora family
    Rpm,
}

impl QueryBackend {
    pub fn command(&self) -> &'static str {
        match self {
            Self::Pacman => "pacman",
            Self::Dpkg => "dpkg",
            Self::Rpm => "rpm",
        }
    }

    /// Bulk query: exits zero only when every package is installed.
    pub fn query_invocation(&self, packages: &[String]) -> Invocation {
        let base: &[&str] = match self {
            Self::Pacman => &["-Q"],
            Self::Dpkg => &["-s"],
            Self::Rpm => &["-q"],
        };
        Invocation::new(
            self.command(),
            base.iter().map(|s| s.to_string()).chain(packages.iter().cloned()),
        )
        .captured()
    }
}

impl fmt::Display for QueryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// Backends that install packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum InstallBackend {
    Pacman,
    #[value(name = "apt-get")]
    AptGet,
    Dnf,
    Yum,
}

/// Per-invocation install settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallOptions {
    /// Suppress debconf configuration prompts (apt-get only)
    pub noninteractive: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            noninteractive: true,
        }
    }
}

impl InstallBackend {
    pub fn command(&self) -> &'static str {
        match self {
            Self::Pacman => "pacman",
            Self::AptGet => "apt-get",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
        }
    }

    /// Non-interactive, auto-confirming install arguments.
    pub fn install_args(&self) -> &'static [&'static str] {
        match self {
            Self::Pacman => &["-S", "--noconfirm", "--needed"],
            Self::AptGet => &["install", "-y"],
            Self::Dnf => &["install", "-y"],
            Self::Yum => &["install", "-y"],
        }
    }

    pub fn install_invocation(&self, packages: &[String], options: InstallOptions) -> Invocation {
        let invocation = Invocation::new(
            self.command(),
            self.install_args()
                .iter()
                .map(|s| s.to_string())
                .chain(packages.iter().cloned()),
        );

        match self {
            Self::AptGet if options.noninteractive => {
                invocation.env("DEBIAN_FRONTEND", "noninteractive")
            }
            _ => invocation,
        }
    }

    /// Index refresh invocation, for backends that keep a local index.
    pub fn refresh_invocation(&self) -> Option<Invocation> {
        match self {
            Self::AptGet => Some(apt_update_invocation()),
            Self::Dnf => Some(Invocation::new("dnf", ["makecache"])),
            Self::Yum => Some(Invocation::new("yum", ["makecache"])),
            Self::Pacman => None,
        }
    }
}

pub fn apt_update_invocation() -> Invocation {
    Invocation::new("apt-get", ["update"])
}

impl fmt::Display for InstallBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command())
    }
}
