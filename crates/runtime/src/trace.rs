use std::fmt;

/// Inbound/outbound correlation header.
pub const TRACE_HEADER: &str = "X-Trace-Id";

/// Correlation id for one invocation. Lives as long as the invocation and is
/// only persisted through logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceContext {
    id: String,
}

impl TraceContext {
    /// Uses the caller's id when it is non-blank, otherwise generates one.
    pub fn resolve(inbound: Option<&str>) -> Self {
        match inbound.map(str::trim) {
            Some(id) if !id.is_empty() => Self { id: id.to_string() },
            _ => Self::generate(),
        }
    }

    /// Random 128-bit (UUID v4) id.
    pub fn generate() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_inbound_id_kept() {
        assert_eq!(TraceContext::resolve(Some("T-0001")).id(), "T-0001");
        assert_eq!(TraceContext::resolve(Some("  T-0002 ")).id(), "T-0002");
    }

    #[test]
    fn test_blank_inbound_generates() {
        for inbound in [None, Some(""), Some("   ")] {
            let trace = TraceContext::resolve(inbound);
            assert!(uuid::Uuid::parse_str(trace.id()).is_ok());
        }
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let ids: HashSet<String> = (0..1000)
            .map(|_| TraceContext::generate().id().to_string())
            .collect();
        assert_eq!(ids.len(), 1000);
    }
}
