//! Deployment context resolution.
//!
//! The cascade is parameterized by exactly one (hostname, deployment,
//! instance) triple, resolved here once at construction. Nothing else in
//! the engine reads ambient OS state.

/// Environment variable consulted when no deployment option is given.
pub const DEPLOYMENT_ENV: &str = "CASCADE_DEPLOYMENT";
/// Environment variable consulted when no instance option is given.
pub const INSTANCE_ENV: &str = "CASCADE_INSTANCE";
/// Environment variable consulted when no search directory is given.
pub const DIRECTORY_ENV: &str = "CASCADE_CONFIG_PATH";
/// Search directory used when neither option nor variable is set.
pub const DEFAULT_DIRECTORY: &str = "./config";

/// The resolved deployment context. Immutable for the lifetime of a
/// [`crate::Config`].
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Machine hostname with its domain suffix stripped at the first dot.
    pub hostname: String,
    pub deployment: String,
    pub instance: String,
}

impl Context {
    /// Resolve the context from explicit options, falling back to
    /// environment variables and finally OS defaults.
    pub fn resolve(
        hostname: Option<String>,
        deployment: Option<String>,
        instance: Option<String>,
    ) -> Self {
        let hostname = hostname
            .filter(|h| !h.is_empty())
            .unwrap_or_else(os_hostname);

        let deployment = deployment
            .filter(|d| !d.is_empty())
            .or_else(|| std::env::var(DEPLOYMENT_ENV).ok())
            .unwrap_or_default();

        let instance = instance
            .filter(|i| !i.is_empty())
            .or_else(|| std::env::var(INSTANCE_ENV).ok())
            .unwrap_or_default();

        Self {
            hostname,
            deployment,
            instance,
        }
    }
}

/// Resolve the search directory: explicit option, then the environment
/// fallback, then `./config`.
pub fn resolve_directory(directory: Option<String>) -> String {
    directory
        .filter(|d| !d.is_empty())
        .or_else(|| std::env::var(DIRECTORY_ENV).ok().filter(|d| !d.is_empty()))
        .unwrap_or_else(|| DEFAULT_DIRECTORY.to_string())
}

fn os_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .map(|h| h.split('.').next().unwrap_or("").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_options_win() {
        let ctx = Context::resolve(
            Some("box".to_string()),
            Some("production".to_string()),
            Some("2".to_string()),
        );
        assert_eq!(ctx.hostname, "box");
        assert_eq!(ctx.deployment, "production");
        assert_eq!(ctx.instance, "2");
    }

    #[test]
    fn empty_options_fall_through() {
        let ctx = Context::resolve(Some(String::new()), None, None);
        // The OS hostname is machine-specific; it must at least carry no
        // domain suffix.
        assert!(!ctx.hostname.contains('.'));
    }

    #[test]
    fn explicit_directory_wins() {
        assert_eq!(
            resolve_directory(Some("/etc/app".to_string())),
            "/etc/app"
        );
    }
}
