//! Package identity written into the manifest header.

/// Manifest schema version understood by the fleet agent.
pub const SCHEMA_VERSION: &str = "2.0";

/// Default publisher string.
pub const DEFAULT_PUBLISHER: &str = "Uptycs.";

/// Default package description.
pub const DEFAULT_DESCRIPTION: &str = "The Uptycs platform provides you with osquery \
     installation packages for all supported operating systems, configures it for \
     optimal data collection, and automatically schedules the queries necessary to \
     track the historical state and activity of all of your assets. ";

/// Package identity fields of the manifest.
///
/// # Examples
///
/// ```
/// use distributor_packager::bundler::PackageSettings;
///
/// let package = PackageSettings {
///     publisher: "Example Corp.".into(),
///     ..Default::default()
/// };
/// assert_eq!(package.schema_version, "2.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSettings {
    /// `schemaVersion` field of the manifest.
    pub schema_version: String,

    /// `publisher` field of the manifest.
    pub publisher: String,

    /// `description` field of the manifest.
    pub description: String,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            publisher: DEFAULT_PUBLISHER.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}
