use crate::config::Settings;
use crate::watch::Domain;

/// The hierarchical remote path layout:
///
/// ```text
/// <root_prefix>/<app>_<env>_<version>/{file|item}/<key>/<fingerprint>
/// ```
///
/// The node at `<key>` holds the configuration payload and is the watch
/// target; the leaf under it is the ephemeral presence node of one client
/// instance.
#[derive(Debug, Clone)]
pub struct PathScheme {
    root_prefix: String,
    app: String,
    env: String,
    version: String,
}

impl PathScheme {
    pub fn new(
        root_prefix: impl Into<String>,
        app: impl Into<String>,
        env: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            root_prefix: root_prefix.into(),
            app: app.into(),
            env: env.into(),
            version: version.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.watch.root_prefix.clone(),
            settings.app.app.clone(),
            settings.app.env.clone(),
            settings.app.version.clone(),
        )
    }

    pub fn root(&self) -> &str {
        &self.root_prefix
    }

    /// `<root>/<app>_<env>_<version>`
    pub fn base_path(&self) -> String {
        join(
            &self.root_prefix,
            &format!("{}_{}_{}", self.app, self.env, self.version),
        )
    }

    /// `<base>/file` or `<base>/item`
    pub fn domain_path(
        &self,
        domain: Domain,
    ) -> String {
        join(&self.base_path(), domain.path_segment())
    }

    /// `<base>/<domain>/<key>` - the watched node
    pub fn monitor_path(
        &self,
        domain: Domain,
        key_name: &str,
    ) -> String {
        join(&self.domain_path(domain), key_name)
    }

    /// `<monitor>/<fingerprint>` - one instance's ephemeral presence node
    pub fn presence_path(
        monitor_path: &str,
        fingerprint: &str,
    ) -> String {
        join(monitor_path, fingerprint)
    }

    /// Every directory from the root downward that must exist before the
    /// monitor node for `(domain, key)` can be watched, shallowest first.
    pub fn ancestry(
        &self,
        domain: Domain,
        key_name: &str,
    ) -> Vec<String> {
        vec![
            self.root_prefix.clone(),
            self.base_path(),
            self.domain_path(domain),
            self.monitor_path(domain, key_name),
        ]
    }
}

/// Join two path segments with exactly one separator.
pub(crate) fn join(
    base: &str,
    child: &str,
) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        child.trim_start_matches('/')
    )
}
