/// Application name
pub const APP_NAME: &str = "ordo";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Observed name that subscribes a plugin to every other plugin
pub const WILDCARD: &str = "*";

/// Manifest file stem looked up inside each plugin directory
pub const MANIFEST_FILE_STEM: &str = "plugin";

/// Default plugins directory
pub const DEFAULT_PLUGINS_DIR: &str = "plugins";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "ordo.toml";
