//! Endpoint selection: primary vs. fallback, decided fresh on every attempt.

/// The role an endpoint plays in failover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    /// The fastest endpoint, typically paid/dedicated. Used first.
    Primary,
    /// Public/free endpoint used while the primary is throttling us.
    Fallback,
}

impl std::fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// One upstream JSON-RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub role: EndpointRole,
}

impl Endpoint {
    pub fn primary(url: impl Into<String>) -> Self {
        Self { url: url.into(), role: EndpointRole::Primary }
    }

    pub fn fallback(url: impl Into<String>) -> Self {
        Self { url: url.into(), role: EndpointRole::Fallback }
    }
}

/// The immutable endpoint list for one logical target.
///
/// Selection is a pure function of circuit state and attempt count — nothing
/// is cached per operation, so a mid-retry circuit-open event reroutes the
/// very next attempt.
#[derive(Debug, Clone)]
pub struct EndpointSet {
    primary: Endpoint,
    fallbacks: Vec<Endpoint>,
}

impl EndpointSet {
    /// A target with a primary and any number of fallbacks.
    pub fn new(primary: Endpoint, fallbacks: Vec<Endpoint>) -> Self {
        Self { primary, fallbacks }
    }

    /// A target with a single endpoint and no failover.
    pub fn single(url: impl Into<String>) -> Self {
        Self { primary: Endpoint::primary(url), fallbacks: Vec::new() }
    }

    pub fn primary(&self) -> &Endpoint {
        &self.primary
    }

    pub fn has_fallback(&self) -> bool {
        !self.fallbacks.is_empty()
    }

    /// Choose the endpoint for the given attempt.
    ///
    /// Fallback when the breaker is open or the attempt count has reached
    /// `failover_after_attempt`; otherwise primary. Multiple fallbacks
    /// rotate by attempt index. Without fallbacks the primary is all we have.
    pub fn select(&self, breaker_open: bool, attempt: u32, failover_after_attempt: u32) -> &Endpoint {
        if self.fallbacks.is_empty() {
            return &self.primary;
        }
        if breaker_open || attempt >= failover_after_attempt {
            let idx = attempt as usize % self.fallbacks.len();
            &self.fallbacks[idx]
        } else {
            &self.primary
        }
    }
}
