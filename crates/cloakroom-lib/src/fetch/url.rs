use super::error::ValidationError;
use super::types::FetchRequest;
use url::Url;

/// `owner/repo` split into its two segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepositoryKey<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
}

impl<'a> RepositoryKey<'a> {
    pub fn parse(key: &'a str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidKey {
            key: key.to_string(),
        };

        let (owner, repo) = key.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(invalid());
        }
        Ok(Self { owner, repo })
    }
}

/// Base URL for a host setting. A bare authority gets `https://`; a value
/// carrying its own scheme is used as given, path prefix included.
fn base_url(host: &str) -> Result<Url, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidHost {
        host: host.to_string(),
        reason,
    };

    let url = if host.contains("://") {
        Url::parse(host)
    } else {
        Url::parse(&format!("https://{host}"))
    }
    .map_err(|e| invalid(e.to_string()))?;

    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("not a base URL".to_string()));
    }
    Ok(url)
}

/// Release asset URL:
///
/// - tagged: `https://{host}/{owner}/{repo}/releases/download/{tag}/{artifact}`
/// - latest: `https://{host}/{owner}/{repo}/releases/latest/download/{artifact}`
pub fn source_url(host: &str, request: &FetchRequest) -> Result<Url, ValidationError> {
    let key = RepositoryKey::parse(&request.key)?;
    for (field, value) in [
        ("version", &request.version),
        ("artifact name", &request.artifact_name),
    ] {
        if value.is_empty() {
            return Err(ValidationError::EmptyField {
                key: request.key.clone(),
                field,
            });
        }
    }

    let mut url = base_url(host)?;
    {
        let mut segments = url.path_segments_mut().map_err(|()| {
            ValidationError::InvalidHost {
                host: host.to_string(),
                reason: "not a base URL".to_string(),
            }
        })?;
        segments
            .pop_if_empty()
            .extend([key.owner, key.repo, "releases"]);
        if request.is_latest() {
            segments.extend(["latest", "download"]);
        } else {
            segments.extend(["download", request.version.as_str()]);
        }
        segments.push(&request.artifact_name);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(key: &str, version: &str, artifact: &str) -> FetchRequest {
        FetchRequest {
            key: key.to_string(),
            version: version.to_string(),
            artifact_name: artifact.to_string(),
            destination_path: artifact.into(),
            expected_digest: None,
        }
    }

    #[test]
    fn test_tagged_release_url() {
        let url = source_url("github.com", &request("acme/widget", "v1.2.0", "plugin.jar")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.com/acme/widget/releases/download/v1.2.0/plugin.jar"
        );
    }

    #[test]
    fn test_latest_release_url() {
        let url = source_url("github.com", &request("acme/widget", "latest", "plugin.jar")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.com/acme/widget/releases/latest/download/plugin.jar"
        );
    }

    #[test]
    fn test_host_with_scheme_and_prefix() {
        let url = source_url(
            "http://127.0.0.1:8080/mirror/",
            &request("acme/widget", "v1", "plugin.jar"),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/mirror/acme/widget/releases/download/v1/plugin.jar"
        );
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let url = source_url("github.com", &request("acme/widget", "v1", "my plugin.jar")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.com/acme/widget/releases/download/v1/my%20plugin.jar"
        );
    }

    #[test]
    fn test_key_must_have_two_non_empty_segments() {
        for key in ["acme", "acme/", "/widget", "acme/widget/extra", ""] {
            let err = RepositoryKey::parse(key).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidKey { .. }),
                "{key} should be rejected"
            );
        }
        assert_eq!(
            RepositoryKey::parse("acme/widget").unwrap(),
            RepositoryKey {
                owner: "acme",
                repo: "widget"
            }
        );
    }

    #[test]
    fn test_empty_fields_rejected() {
        let err = source_url("github.com", &request("acme/widget", "", "plugin.jar")).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyField { field: "version", .. }));

        let err = source_url("github.com", &request("acme/widget", "v1", "")).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::EmptyField {
                field: "artifact name",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_host_rejected() {
        let err = source_url("", &request("acme/widget", "v1", "plugin.jar")).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidHost { .. }));
    }
}
