//! Release notes URL derivation

/// Landing page for builds without a published release (dev builds)
pub const RELEASES_INDEX_URL: &str = "https://soldat.io/releases";

/// Base for per-version release notes; the tag is appended as the last segment
pub const RELEASE_TAG_URL_BASE: &str = "https://github.com/soldat/soldat/releases/tag/";

/// Build the release notes URL for an application version.
///
/// Any version containing `dev` maps to [`RELEASES_INDEX_URL`]. Everything
/// else is treated as a release tag and prefixed with `v` when missing. The
/// input is display text, so nothing is rejected.
pub fn release_notes_url_for_version(version: &str) -> String {
    if version.contains("dev") {
        return RELEASES_INDEX_URL.to_string();
    }

    format!("{}{}", RELEASE_TAG_URL_BASE, release_tag(version))
}

fn release_tag(version: &str) -> String {
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{}", version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_version_returns_releases_index() {
        assert_eq!(
            release_notes_url_for_version("1.7.0-dev-e44b57d"),
            RELEASES_INDEX_URL
        );
        assert_eq!(release_notes_url_for_version("dev"), RELEASES_INDEX_URL);
        assert_eq!(release_notes_url_for_version("v2.0.0-dev"), RELEASES_INDEX_URL);
    }

    #[test]
    fn test_release_version_gets_v_prefix() {
        assert!(release_notes_url_for_version("1.7.0").contains("soldat/soldat/releases/tag/v1.7.0"));
    }

    #[test]
    fn test_existing_v_prefix_is_not_doubled() {
        let url = release_notes_url_for_version("v1.7.0");
        assert!(url.ends_with("/tag/v1.7.0"));
        assert!(!url.contains("vv"));
    }

    #[test]
    fn test_prerelease_suffix_is_kept() {
        assert!(release_notes_url_for_version("1.7.0-beta10")
            .contains("soldat/soldat/releases/tag/v1.7.0-beta10"));
    }

    #[test]
    fn test_version_is_a_path_segment() {
        for version in ["1.8.0", "0.1", "42", "2.0.0-rc1"] {
            let url = release_notes_url_for_version(version);
            let last_segment = url.rsplit('/').next().unwrap();
            assert_eq!(last_segment, format!("v{}", version));
        }
    }

    #[test]
    fn test_malformed_versions_are_accepted() {
        assert_eq!(
            release_notes_url_for_version(""),
            format!("{}v", RELEASE_TAG_URL_BASE)
        );
        assert!(release_notes_url_for_version("not a version").ends_with("vnot a version"));
    }
}
