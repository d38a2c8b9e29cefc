use url::Url;

use crate::error::ProxyError;

/// Prefix rewrite in the shape of `/api/python/:path*` -> `http://host/api/v1/:path*`.
#[derive(Debug, Clone)]
pub struct ProxyRule {
    source_prefix: String,
    destination: Url,
}

impl ProxyRule {
    pub fn new(source_prefix: &str, destination: &str) -> Result<Self, ProxyError> {
        let mut destination = Url::parse(destination).map_err(|source| {
            ProxyError::InvalidUpstream {
                url: destination.to_string(),
                source,
            }
        })?;
        // Url::join replaces the last segment unless the base ends with '/'
        if !destination.path().ends_with('/') {
            let path = format!("{}/", destination.path());
            destination.set_path(&path);
        }

        let mut source_prefix = source_prefix.to_string();
        if !source_prefix.ends_with('/') {
            source_prefix.push('/');
        }

        Ok(Self {
            source_prefix,
            destination,
        })
    }

    /// Maps a local path onto the upstream, or `None` if the prefix doesn't match.
    pub fn rewrite(&self, path: &str) -> Option<Url> {
        if path == self.source_prefix.trim_end_matches('/') {
            return Some(self.destination.clone());
        }

        let rest = path.strip_prefix(&self.source_prefix)?;
        self.destination.join(rest.trim_start_matches('/')).ok()
    }
}
