//! Storage location parsing
//!
//! The job API hands out time-limited storage URLs of the form
//! `https://{account}.blob.core.windows.net/{container}/{dir/...}?{sas}`.
//! [`StorageLocation`] decomposes such a URL into the parts a storage client
//! needs. The access token is a credential: it is excluded from `Debug` and
//! `Display` output and must never be logged or persisted.

use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use url::Url;

use crate::error::MalformedLocationError;

/// Endpoint, container, directory prefix and SAS token of a storage URL.
#[derive(Clone, PartialEq, Eq)]
pub struct StorageLocation {
    endpoint: String,
    container_name: String,
    directory_prefix: String,
    access_token: String,
}

impl StorageLocation {
    /// Parse a storage URL.
    ///
    /// - `endpoint` is scheme and host (with a non-default port), no path or query
    /// - the first non-empty path segment is the container, the remaining
    ///   segments joined by `/` form the directory prefix (empty if none)
    /// - the access token is the raw query string, verbatim
    pub fn parse(raw: &str) -> Result<Self, MalformedLocationError> {
        let url = Url::parse(raw)
            .map_err(|e| MalformedLocationError::new(format!("invalid URL: {}", e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| MalformedLocationError::new("URL has no host"))?;

        let endpoint = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };

        let mut segments = url.path().split('/').filter(|part| !part.is_empty());

        let container_name = segments
            .next()
            .ok_or_else(|| MalformedLocationError::new("URL path has no container name"))?
            .to_string();

        let directory_prefix = segments.collect::<Vec<_>>().join("/");

        let access_token = url.query().unwrap_or_default().to_string();

        Ok(Self {
            endpoint,
            container_name,
            directory_prefix,
            access_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    /// Directory prefix inside the container, empty when objects live at the container root.
    pub fn directory_prefix(&self) -> &str {
        &self.directory_prefix
    }

    /// Raw SAS query string. Credential material: do not log.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// SAS token decoded into key/value pairs, as storage clients expect them.
    pub fn sas_query_pairs(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.access_token.as_bytes())
            .into_owned()
            .collect()
    }

    /// Storage account name, taken from the first label of the endpoint host.
    pub fn account_name(&self) -> Option<&str> {
        self.endpoint
            .split_once("://")
            .map(|(_, host)| host)
            .and_then(|host| host.split(['.', ':']).next())
            .filter(|label| !label.is_empty())
    }

    /// Full object key for `name` under the directory prefix.
    ///
    /// The prefix is joined with a single `/`; a leading `/` on `name` is dropped
    /// so the separator is never doubled.
    pub fn object_key(&self, name: &str) -> String {
        let name = name.trim_start_matches('/');
        if self.directory_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.directory_prefix, name)
        }
    }
}

impl FromStr for StorageLocation {
    type Err = MalformedLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for StorageLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.endpoint, self.container_name)?;
        if !self.directory_prefix.is_empty() {
            write!(f, "/{}", self.directory_prefix)?;
        }
        Ok(())
    }
}

impl Debug for StorageLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageLocation")
            .field("endpoint", &self.endpoint)
            .field("container_name", &self.container_name)
            .field("directory_prefix", &self.directory_prefix)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAS: &str = "sv=2023-11-03&se=2030-01-01T00%3A00%3A00Z&sr=c&sp=rwl&sig=abc%2Bdef%3D";

    #[test]
    fn parses_container_and_nested_prefix() {
        let raw = format!(
            "https://acct.blob.core.windows.net/jobs-input/jobs/42/input?{}",
            SAS
        );
        let location = StorageLocation::parse(&raw).unwrap();

        assert_eq!(location.endpoint(), "https://acct.blob.core.windows.net");
        assert_eq!(location.container_name(), "jobs-input");
        assert_eq!(location.directory_prefix(), "jobs/42/input");
        assert_eq!(location.access_token(), SAS);
    }

    #[test]
    fn single_segment_has_empty_prefix() {
        let location =
            StorageLocation::parse("https://acct.blob.core.windows.net/container?sig=x").unwrap();

        assert_eq!(location.container_name(), "container");
        assert_eq!(location.directory_prefix(), "");
    }

    #[test]
    fn empty_segments_are_discarded() {
        let location =
            StorageLocation::parse("https://acct.blob.core.windows.net//container//a///b/?sig=x")
                .unwrap();

        assert_eq!(location.container_name(), "container");
        assert_eq!(location.directory_prefix(), "a/b");
    }

    #[test]
    fn missing_container_is_malformed() {
        let err = StorageLocation::parse("https://acct.blob.core.windows.net/?sig=x").unwrap_err();
        assert!(err.reason().contains("container"));

        let err = StorageLocation::parse("https://acct.blob.core.windows.net").unwrap_err();
        assert!(err.reason().contains("container"));
    }

    #[test]
    fn unparseable_url_is_malformed() {
        assert!(StorageLocation::parse("not a url").is_err());
        assert!(StorageLocation::parse("").is_err());
        assert!(StorageLocation::parse("mailto:someone@example.com").is_err());
    }

    #[test]
    fn endpoint_keeps_non_default_port() {
        let location =
            StorageLocation::parse("http://127.0.0.1:10000/container/dir?sig=x").unwrap();
        assert_eq!(location.endpoint(), "http://127.0.0.1:10000");
    }

    #[test]
    fn missing_query_yields_empty_token() {
        let location = StorageLocation::parse("https://acct.blob.core.windows.net/c/d").unwrap();
        assert_eq!(location.access_token(), "");
        assert!(location.sas_query_pairs().is_empty());
    }

    #[test]
    fn sas_pairs_are_decoded() {
        let raw = format!("https://acct.blob.core.windows.net/c?{}", SAS);
        let location = StorageLocation::parse(&raw).unwrap();
        let pairs = location.sas_query_pairs();

        assert!(pairs.contains(&("se".to_string(), "2030-01-01T00:00:00Z".to_string())));
        assert!(pairs.contains(&("sig".to_string(), "abc+def=".to_string())));
    }

    #[test]
    fn account_name_is_first_host_label() {
        let location = StorageLocation::parse("https://acct.blob.core.windows.net/c?sig=x").unwrap();
        assert_eq!(location.account_name(), Some("acct"));
    }

    #[test]
    fn object_key_joins_prefix_once() {
        let with_prefix =
            StorageLocation::parse("https://acct.blob.core.windows.net/c/jobs/42?sig=x").unwrap();
        assert_eq!(with_prefix.object_key("a.wav"), "jobs/42/a.wav");
        assert_eq!(with_prefix.object_key("/a.wav"), "jobs/42/a.wav");

        let root = StorageLocation::parse("https://acct.blob.core.windows.net/c?sig=x").unwrap();
        assert_eq!(root.object_key("a.wav"), "a.wav");
    }

    #[test]
    fn token_is_never_formatted() {
        let raw = format!("https://acct.blob.core.windows.net/c/jobs?{}", SAS);
        let location = StorageLocation::parse(&raw).unwrap();

        let debug = format!("{:?}", location);
        let display = location.to_string();

        assert!(!debug.contains("sig="));
        assert!(debug.contains("<redacted>"));
        assert!(!display.contains("sig="));
        assert_eq!(display, "https://acct.blob.core.windows.net/c/jobs");
    }
}
