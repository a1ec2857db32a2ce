use std::collections::HashMap;
use thiserror::Error;

use crate::error::ApiError;

/// Errors in the `STRICT_NAMESPACE_MAPPING` value, fatal at startup
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("mapping entry '{0}' is missing the ':' between domain and namespace")]
    MissingSeparator(String),

    #[error("mapping entry '{0}' contains more than one ':'")]
    TooManySeparators(String),

    #[error("mapping entry '{0}' has an empty domain or namespace")]
    EmptyPart(String),
}

/// Static lookup from request domain to the only namespace it may see
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespaceMap {
    entries: HashMap<String, String>,
}

impl NamespaceMap {
    /// Parse `domain1:ns1,domain2:ns2`
    ///
    /// An absent or empty value means no mapping. A repeated domain keeps the
    /// last namespace given for it.
    pub fn parse(raw: Option<&str>) -> Result<Option<Self>, MappingError> {
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            return Ok(None);
        };

        let mut entries = HashMap::new();
        for item in raw.split(',') {
            let (domain, namespace) = item
                .split_once(':')
                .ok_or_else(|| MappingError::MissingSeparator(item.to_string()))?;

            if namespace.contains(':') {
                return Err(MappingError::TooManySeparators(item.to_string()));
            }
            if domain.is_empty() || namespace.is_empty() {
                return Err(MappingError::EmptyPart(item.to_string()));
            }

            entries.insert(domain.to_lowercase(), namespace.to_string());
        }

        Ok(Some(Self { entries }))
    }

    /// Namespace mapped to `domain`, compared case-insensitively
    pub fn get(&self, domain: &str) -> Option<&str> {
        self.entries
            .get(&domain.to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strip the port from a `Host` header value
///
/// Bracketed IPv6 literals keep their brackets: `[::1]:8000` gives `[::1]`.
pub fn request_domain(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}

/// Decides which namespace a request may see
#[derive(Clone, Debug, Default)]
pub struct NamespaceResolver {
    mapping: Option<NamespaceMap>,
}

impl NamespaceResolver {
    pub fn new(mapping: Option<NamespaceMap>) -> Self {
        Self { mapping }
    }

    /// Build from the raw `STRICT_NAMESPACE_MAPPING` value
    pub fn from_mapping_value(raw: Option<&str>) -> Result<Self, MappingError> {
        Ok(Self::new(NamespaceMap::parse(raw)?))
    }

    pub fn mapping(&self) -> Option<&NamespaceMap> {
        self.mapping.as_ref()
    }

    /// Namespace pinned to the request's host, if any
    pub fn mapped(&self, host: Option<&str>) -> Option<&str> {
        let mapping = self.mapping.as_ref()?;
        mapping.get(request_domain(host?))
    }

    /// Effective namespace for the listing endpoints
    ///
    /// A mapped domain wins over the `namespace` query parameter. `None`
    /// means every namespace.
    pub fn listing_namespace<'a>(
        &'a self,
        host: Option<&str>,
        requested: Option<&'a str>,
    ) -> Option<&'a str> {
        self.mapped(host)
            .or_else(|| requested.filter(|ns| !ns.is_empty()))
    }

    /// Check the namespace requested from the log endpoint
    ///
    /// Unlike the listings, a mapped domain asking for another namespace is
    /// rejected instead of overridden.
    pub fn check_log_namespace(&self, host: Option<&str>, requested: &str) -> Result<(), ApiError> {
        match self.mapped(host) {
            Some(mapped) if mapped != requested => Err(ApiError::NamespaceMismatch {
                requested: requested.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(raw: &str) -> NamespaceResolver {
        NamespaceResolver::from_mapping_value(Some(raw)).unwrap()
    }

    #[test]
    fn test_parse_mapping() {
        let map = NamespaceMap::parse(Some(
            "frontend.develop.example.com:develop,frontend.staging.example.com:staging",
        ))
        .unwrap()
        .unwrap();

        assert_eq!(map.len(), 2);
        assert!(!map.is_empty());
        assert_eq!(map.get("frontend.develop.example.com"), Some("develop"));
        assert_eq!(map.get("Frontend.Staging.Example.com"), Some("staging"));
        assert_eq!(map.get("other.example.com"), None);
    }

    #[test]
    fn test_parse_absent_or_empty() {
        assert_eq!(NamespaceMap::parse(None), Ok(None));
        assert_eq!(NamespaceMap::parse(Some("")), Ok(None));
    }

    #[test]
    fn test_parse_malformed_entries() {
        assert_eq!(
            NamespaceMap::parse(Some("a.example.com:develop,b.example.com")),
            Err(MappingError::MissingSeparator("b.example.com".to_string()))
        );
        assert_eq!(
            NamespaceMap::parse(Some("a.example.com:develop:extra")),
            Err(MappingError::TooManySeparators(
                "a.example.com:develop:extra".to_string()
            ))
        );
        assert_eq!(
            NamespaceMap::parse(Some(":develop")),
            Err(MappingError::EmptyPart(":develop".to_string()))
        );
        assert!(NamespaceMap::parse(Some("a.example.com:develop,")).is_err());
    }

    #[test]
    fn test_parse_duplicate_domain_keeps_last() {
        let map = NamespaceMap::parse(Some("a.example.com:develop,a.example.com:staging"))
            .unwrap()
            .unwrap();
        assert_eq!(map.get("a.example.com"), Some("staging"));
    }

    #[test]
    fn test_request_domain() {
        assert_eq!(request_domain("www.alpha.example.com"), "www.alpha.example.com");
        assert_eq!(request_domain("www.alpha.example.com:8000"), "www.alpha.example.com");
        assert_eq!(request_domain("[::1]:8000"), "[::1]");
    }

    #[test]
    fn test_listing_namespace() {
        let resolver = resolver("dev.example.com:develop");

        // Mapped domain ignores the query parameter
        assert_eq!(
            resolver.listing_namespace(Some("dev.example.com:8000"), Some("staging")),
            Some("develop")
        );

        // Unmapped domain falls back to the query parameter
        assert_eq!(
            resolver.listing_namespace(Some("other.example.com"), Some("staging")),
            Some("staging")
        );
        assert_eq!(resolver.listing_namespace(Some("other.example.com"), None), None);
        assert_eq!(resolver.listing_namespace(Some("other.example.com"), Some("")), None);
        assert_eq!(resolver.listing_namespace(None, Some("staging")), Some("staging"));
    }

    #[test]
    fn test_listing_namespace_without_mapping() {
        let resolver = NamespaceResolver::default();
        assert_eq!(
            resolver.listing_namespace(Some("dev.example.com"), Some("develop")),
            Some("develop")
        );
        assert_eq!(resolver.listing_namespace(Some("dev.example.com"), None), None);
    }

    #[test]
    fn test_check_log_namespace() {
        let resolver = resolver("dev.example.com:develop");

        assert!(resolver.check_log_namespace(Some("dev.example.com"), "develop").is_ok());
        assert!(matches!(
            resolver.check_log_namespace(Some("dev.example.com"), "staging"),
            Err(ApiError::NamespaceMismatch { .. })
        ));
        assert!(resolver.check_log_namespace(Some("other.example.com"), "staging").is_ok());
    }
}
