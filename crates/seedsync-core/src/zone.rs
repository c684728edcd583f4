//! Zone context
//!
//! Names the record set a provider manages: `subdomain.domain`, or just
//! `domain` when no subdomain is configured. Built once and never mutated.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Domain, subdomain and the fully-qualified record name derived from them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneContext {
    domain_name: String,
    subdomain_name: Option<String>,
    fulldomain_name: String,
}

impl ZoneContext {
    /// Build a zone context
    ///
    /// An empty subdomain is treated the same as no subdomain.
    pub fn new(domain_name: impl Into<String>, subdomain_name: Option<&str>) -> Result<Self> {
        let domain_name = domain_name.into();
        let domain_name = domain_name.trim().trim_end_matches('.').to_string();
        if domain_name.is_empty() {
            return Err(Error::config("Domain name cannot be empty"));
        }

        let subdomain_name = subdomain_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let fulldomain_name = match &subdomain_name {
            Some(sub) => format!("{}.{}", sub, domain_name),
            None => domain_name.clone(),
        };

        Ok(Self {
            domain_name,
            subdomain_name,
            fulldomain_name,
        })
    }

    /// The zone apex, e.g. `example.com`
    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    /// The label under the apex, e.g. `node`
    pub fn subdomain_name(&self) -> Option<&str> {
        self.subdomain_name.as_deref()
    }

    /// The record name, e.g. `node.example.com`
    pub fn fulldomain_name(&self) -> &str {
        &self.fulldomain_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_subdomain_and_domain() {
        let zone = ZoneContext::new("example.com", Some("node")).unwrap();
        assert_eq!(zone.fulldomain_name(), "node.example.com");
        assert_eq!(zone.subdomain_name(), Some("node"));
        assert_eq!(zone.domain_name(), "example.com");
    }

    #[test]
    fn apex_when_no_subdomain() {
        let zone = ZoneContext::new("example.com", None).unwrap();
        assert_eq!(zone.fulldomain_name(), "example.com");

        let zone = ZoneContext::new("example.com", Some("")).unwrap();
        assert_eq!(zone.fulldomain_name(), "example.com");
        assert_eq!(zone.subdomain_name(), None);
    }

    #[test]
    fn rejects_empty_domain() {
        assert!(ZoneContext::new("  ", Some("node")).is_err());
    }
}
