use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use crate::common::host::Host;
use crate::error::{ProvisionError, ProvisionResult};
use crate::ui::prelude::*;

/// Package-management lineage of the host, derived once from `ID`/`ID_LIKE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistroFamily {
    /// Debian, Ubuntu and derivatives (dpkg + apt-get)
    Debian,
    /// RHEL, Fedora, CentOS, Rocky... (rpm + dnf/yum)
    RedHat,
    /// Arch Linux itself, which carries no `ID_LIKE`
    ArchLike,
    Unknown,
}

impl DistroFamily {
    /// Classify a host.
    ///
    /// Category substrings always win over the id; the id is only looked at
    /// when no category is declared.
    pub fn classify(id: &str, categories: &str) -> Self {
        if categories.contains("debian") {
            Self::Debian
        } else if categories.contains("rhel") {
            Self::RedHat
        } else if categories.is_empty() {
            match id {
                "arch" => Self::ArchLike,
                _ => Self::Unknown,
            }
        } else {
            Self::Unknown
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Debian => "debian",
            Self::RedHat => "rhel",
            Self::ArchLike => "arch",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DistroFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistroIdentity {
    pub id: String,
    /// `ID_LIKE`, or the empty string when the host declares none
    pub categories: String,
    pub family: DistroFamily,
}

impl DistroIdentity {
    pub fn new(id: impl Into<String>, categories: impl Into<String>) -> Self {
        let id = id.into();
        let categories = categories.into();
        let family = DistroFamily::classify(&id, &categories);
        Self {
            id,
            categories,
            family,
        }
    }

    /// Read the identity file once and derive id, categories and family.
    ///
    /// `fallbacks` supplies categories for ids whose file has no `ID_LIKE`.
    pub fn resolve(
        host: &dyn Host,
        path: &Path,
        fallbacks: &BTreeMap<String, String>,
    ) -> ProvisionResult<Self> {
        let fields = load_os_release(host, path)?;
        let id = id_field(&fields, path)?;
        let categories = categories_field(&fields)
            .or_else(|| fallbacks.get(&id).cloned())
            .unwrap_or_default();

        let identity = Self::new(id, categories);
        diag(
            Level::Debug,
            "resolve_distro",
            &format!(
                "id '{}', categories '{}', family {}",
                identity.id, identity.categories, identity.family
            ),
        );
        Ok(identity)
    }

    pub fn unsupported(&self) -> ProvisionError {
        ProvisionError::UnsupportedDistribution {
            id: self.id.clone(),
            categories: self.categories.clone(),
        }
    }
}

/// Return the host's distribution `ID`.
pub fn distro_id(host: &dyn Host, path: &Path) -> ProvisionResult<String> {
    let fields = load_os_release(host, path)?;
    id_field(&fields, path)
}

/// Return the host's `ID_LIKE`, normalized to the empty string when absent.
pub fn distro_categories(host: &dyn Host, path: &Path) -> ProvisionResult<String> {
    let fields = load_os_release(host, path)?;
    Ok(categories_field(&fields).unwrap_or_default())
}

fn load_os_release(host: &dyn Host, path: &Path) -> ProvisionResult<HashMap<String, String>> {
    let content = host.read_to_string(path).map_err(|e| {
        let err = ProvisionError::prerequisite(format!(
            "cannot load {}: {}",
            path.display(),
            e
        ));
        diag(Level::Error, "resolve_distro", &err.to_string());
        err
    })?;

    parse_os_release(&content).map_err(|e| {
        let err = ProvisionError::prerequisite(format!("cannot parse {}: {}", path.display(), e));
        diag(Level::Error, "resolve_distro", &err.to_string());
        err
    })
}

fn id_field(fields: &HashMap<String, String>, path: &Path) -> ProvisionResult<String> {
    match fields.get("ID").map(|s| s.trim()) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => {
            let err = ProvisionError::generic(format!("no ID field in {}", path.display()));
            diag(Level::Error, "distro_id", &err.to_string());
            Err(err)
        }
    }
}

fn categories_field(fields: &HashMap<String, String>) -> Option<String> {
    fields
        .get("ID_LIKE")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse os-release style `KEY=VALUE` content into a map.
///
/// Values may be bare, single-quoted or double-quoted. Nothing is expanded
/// or executed.
pub fn parse_os_release(content: &str) -> Result<HashMap<String, String>, String> {
    let mut fields = HashMap::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let lineno = index + 1;
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| format!("line {lineno}: expected KEY=VALUE"))?;

        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("line {lineno}: invalid key '{key}'"));
        }

        let value = unquote(value).map_err(|e| format!("line {lineno}: {e}"))?;
        fields.insert(key.to_string(), value);
    }

    Ok(fields)
}

fn unquote(value: &str) -> Result<String, &'static str> {
    let value = value.trim();
    let Some(first) = value.chars().next() else {
        return Ok(String::new());
    };

    match first {
        '\'' => value
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
            .map(str::to_string)
            .ok_or("unterminated single quote"),
        '"' => {
            let mut out = String::new();
            let mut chars = value[1..].chars();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some(escaped) => out.push(escaped),
                        None => return Err("unterminated double quote"),
                    },
                    '"' => {
                        return if chars.as_str().trim().is_empty() {
                            Ok(out)
                        } else {
                            Err("trailing characters after closing quote")
                        };
                    }
                    other => out.push(other),
                }
            }
            Err("unterminated double quote")
        }
        _ => Ok(value.to_string()),
    }
}
