/// Base address of the legacy form-encoded ingestion API.
pub const API_ENDPOINT_V1: &str = "https://api.amplitude.com";
/// Base address of the JSON ingestion API.
pub const API_ENDPOINT_V2: &str = "https://api2.amplitude.com";

/// Parse a base address, dropping surrounding whitespace and trailing slashes.
pub(crate) fn parse_endpoint(url: &str) -> Result<http::Uri, http::uri::InvalidUri> {
    url.trim().trim_end_matches('/').try_into()
}

/// Resolve `path` against `endpoint`.
///
/// Absolute paths replace the endpoint's path, relative ones are appended to it.
pub(crate) fn append_path(
    endpoint: &http::Uri,
    path: &str,
) -> Result<http::Uri, http::uri::InvalidUri> {
    let base = endpoint.to_string();
    let base = base.trim_end_matches('/');
    let joined = if path.starts_with('/') {
        let origin = match (endpoint.scheme_str(), endpoint.authority()) {
            (Some(scheme), Some(authority)) => format!("{}://{}", scheme, authority),
            _ => base.to_string(),
        };
        format!("{}{}", origin, path)
    } else {
        format!("{}/{}", base, path)
    };
    joined.as_str().try_into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(API_ENDPOINT_V1, "https://api.amplitude.com" ; "v1")]
    #[test_case(API_ENDPOINT_V2, "https://api2.amplitude.com" ; "v2")]
    #[test_case(" http://localhost:8080/  ", "http://localhost:8080" ; "trim")]
    #[test_case("https://proxy.example.com/amplitude/", "https://proxy.example.com/amplitude" ; "with path")]
    fn parse_succeeds(url: &'static str, expected: &'static str) {
        assert_eq!(
            http::Uri::try_from(expected).unwrap(),
            parse_endpoint(url).unwrap()
        );
    }

    #[test_case("ftp:/foo" ; "invalid uri")]
    #[test_case("https://exa mple.com" ; "space in host")]
    fn parse_fails(url: &'static str) {
        parse_endpoint(url).unwrap_err();
    }

    #[test_case("https://api2.amplitude.com", "/2/httpapi", "https://api2.amplitude.com/2/httpapi" ; "absolute path")]
    #[test_case("https://api.amplitude.com", "identify", "https://api.amplitude.com/identify" ; "relative path")]
    #[test_case("https://proxy.example.com/amplitude", "identify", "https://proxy.example.com/amplitude/identify" ; "relative path below base path")]
    #[test_case("https://proxy.example.com/amplitude", "/identify", "https://proxy.example.com/identify" ; "absolute path replaces base path")]
    fn append_path_resolves(endpoint: &'static str, path: &'static str, expected: &'static str) {
        let endpoint = parse_endpoint(endpoint).unwrap();
        assert_eq!(
            expected,
            append_path(&endpoint, path).unwrap().to_string()
        );
    }
}
