//! Filename classification into precedence tiers.
//!
//! A source file's bare name (final extension stripped) determines where it
//! sits in the cascade and which deployment/instance it is scoped to. The
//! grammar is ambiguous — `local-2` could read as a deployment named "2" —
//! so the checks below run in a fixed order and the first match wins.
//! Reordering them changes which file shadows which and is observable
//! behavior, not a refactor.

use regex_lite::Regex;
use std::fmt;

/// Precedence tier of a classified source. Higher wins.
///
/// The discriminants are the sort ordinals; ties between sources on the
/// same tier keep their directory-enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// `default`
    Default = 1,
    /// `default-<instance>`
    DefaultInstance = 2,
    /// Any otherwise-unrecognized name, read as a deployment name.
    Deployment = 3,
    /// `<deployment>-<instance>`
    DeploymentInstance = 4,
    /// Name equal to the current hostname.
    Host = 5,
    /// `<hostname>-<instance>`
    HostInstance = 6,
    /// `<hostname>-<deployment>`
    HostDeployment = 7,
    /// `<hostname>-<deployment>-<instance>`
    HostDeploymentInstance = 8,
    /// `local`
    Local = 9,
    /// `local-<instance>`
    LocalInstance = 10,
    /// `local-<deployment>`
    LocalDeployment = 11,
    /// `local-<deployment>-<instance>`
    LocalDeploymentInstance = 12,
    /// `env` — values name environment variables.
    Env = 13,
    /// `vault` — values name secret-store coordinates.
    Vault = 14,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Default => "default",
            Tier::DefaultInstance => "default-instance",
            Tier::Deployment => "deployment",
            Tier::DeploymentInstance => "deployment-instance",
            Tier::Host => "host",
            Tier::HostInstance => "host-instance",
            Tier::HostDeployment => "host-deployment",
            Tier::HostDeploymentInstance => "host-deployment-instance",
            Tier::Local => "local",
            Tier::LocalInstance => "local-instance",
            Tier::LocalDeployment => "local-deployment",
            Tier::LocalDeploymentInstance => "local-deployment-instance",
            Tier::Env => "env",
            Tier::Vault => "vault",
        };
        write!(f, "{}", name)
    }
}

/// Result of classifying one filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub tier: Tier,
    /// Deployment name embedded in the filename, if any.
    pub deployment: Option<String>,
    /// Instance id embedded in the filename, if any.
    pub instance: Option<String>,
}

impl Classified {
    fn tier(tier: Tier) -> Self {
        Self {
            tier,
            deployment: None,
            instance: None,
        }
    }
}

/// The classifier's fixed patterns are literals; a failed compile is a
/// programming error caught by the unit tests below.
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("literal pattern")
}

/// Strip the final extension from a file name.
///
/// Only the last extension counts: `name.toml.json` decodes as JSON but
/// classifies from the stem `name.toml`.
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => name,
    }
}

/// Classify an extension-stripped filename against the current hostname.
pub fn classify(stem: &str, hostname: &str) -> Classified {
    if stem == hostname {
        return Classified::tier(Tier::Host);
    }

    if stem == "default" {
        return Classified::tier(Tier::Default);
    }

    if pattern(r"^default-\d+$").is_match(stem) {
        return Classified {
            tier: Tier::DefaultInstance,
            deployment: None,
            instance: Some(stem["default-".len()..].to_string()),
        };
    }

    if stem == "local" {
        return Classified::tier(Tier::Local);
    }

    if pattern(r"^local-\d+$").is_match(stem) {
        return Classified {
            tier: Tier::LocalInstance,
            deployment: None,
            instance: Some(stem["local-".len()..].to_string()),
        };
    }

    // `\w` cannot match a dash, so `local-staging-2` falls through to the
    // deployment+instance arm below.
    if pattern(r"^local-\w+$").is_match(stem) {
        return Classified {
            tier: Tier::LocalDeployment,
            deployment: Some(stem["local-".len()..].to_string()),
            instance: None,
        };
    }

    if let Some(caps) = pattern(r"^local-(\w+)-(\d+)$").captures(stem) {
        return Classified {
            tier: Tier::LocalDeploymentInstance,
            deployment: Some(caps[1].to_string()),
            instance: Some(caps[2].to_string()),
        };
    }

    if stem == "env" {
        return Classified::tier(Tier::Env);
    }

    if stem == "vault" {
        return Classified::tier(Tier::Vault);
    }

    if !hostname.is_empty() && stem.contains(hostname) {
        let rest = stem
            .strip_prefix(&format!("{}-", hostname))
            .unwrap_or(stem);

        if pattern(r"^\d+$").is_match(rest) {
            return Classified {
                tier: Tier::HostInstance,
                deployment: None,
                instance: Some(rest.to_string()),
            };
        }

        if let Some(caps) = pattern(r"^(.+)-(\d+)$").captures(rest) {
            return Classified {
                tier: Tier::HostDeploymentInstance,
                deployment: Some(caps[1].to_string()),
                instance: Some(caps[2].to_string()),
            };
        }

        return Classified {
            tier: Tier::HostDeployment,
            deployment: Some(rest.to_string()),
            instance: None,
        };
    }

    if let Some(caps) = pattern(r"^(.+)-(\d+)$").captures(stem) {
        return Classified {
            tier: Tier::DeploymentInstance,
            deployment: Some(caps[1].to_string()),
            instance: Some(caps[2].to_string()),
        };
    }

    Classified {
        tier: Tier::Deployment,
        deployment: Some(stem.to_string()),
        instance: None,
    }
}
