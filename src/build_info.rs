use std::fmt;

/// Values stamped in by `build.rs`
pub struct BuildInfo {
    pub version: &'static str,
    pub timestamp: &'static str,
    pub commit: &'static str,
    pub platform: &'static str,
    pub profile: &'static str,
}

impl BuildInfo {
    pub const CURRENT: BuildInfo = BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        timestamp: env!("BUILD_TIMESTAMP"),
        commit: env!("GIT_HASH_SHORT"),
        platform: env!("TARGET_PLATFORM"),
        profile: env!("BUILD_PROFILE"),
    };
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{} (build {}, commit {}, {} {})",
            self.version, self.timestamp, self.commit, self.platform, self.profile
        )
    }
}
