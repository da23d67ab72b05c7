use tracing_subscriber::EnvFilter;

/// Installs a JSON log formatter on stdout, filtered by `RUST_LOG`
/// (default `info`). Returns `false` if a global subscriber already exists.
pub fn init_logging() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        let _ = init_logging();
        assert!(!init_logging());
    }
}
