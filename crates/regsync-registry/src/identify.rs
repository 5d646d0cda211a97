//! Registry host classification.
//!
//! Managed ECR registries have hosts of the form
//! `<account>.dkr.ecr.<region>.amazonaws.com`, with a trailing `.cn` in the
//! China partition. Classification is purely structural; no lookups happen.

/// An ECR registry identified from its host name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcrRegistry {
    /// The full registry host.
    pub host: String,
    /// AWS region, e.g. `us-east-1`.
    pub region: String,
    /// AWS account ID the registry belongs to.
    pub account: String,
}

impl EcrRegistry {
    /// Classifies a registry host.
    ///
    /// Returns `None` for anything that is not an ECR host. Never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use regsync_registry::EcrRegistry;
    ///
    /// let ecr = EcrRegistry::identify("123456789012.dkr.ecr.us-east-1.amazonaws.com").unwrap();
    /// assert_eq!(ecr.region, "us-east-1");
    /// assert_eq!(ecr.account, "123456789012");
    ///
    /// assert!(EcrRegistry::identify("registry.example.com").is_none());
    /// ```
    #[must_use]
    pub fn identify(host: &str) -> Option<Self> {
        let parts: Vec<&str> = host.split('.').collect();

        match parts.as_slice() {
            [account, "dkr", "ecr", region, "amazonaws", "com"]
            | [account, "dkr", "ecr", region, "amazonaws", "com", "cn"] => Some(Self {
                host: host.to_string(),
                region: (*region).to_string(),
                account: (*account).to_string(),
            }),
            _ => None,
        }
    }

    /// Returns true if the registry lives in the China partition.
    #[must_use]
    pub fn is_china(&self) -> bool {
        self.host.ends_with(".cn")
    }
}

/// Returns true if the host names an ECR registry.
#[must_use]
pub fn is_ecr(host: &str) -> bool {
    EcrRegistry::identify(host).is_some()
}
