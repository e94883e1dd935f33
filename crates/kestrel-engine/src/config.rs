/// Batching configuration shared by every item kind.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BatchConfig {
    /// Items per batch before a flush is forced.
    pub batch_size: u32,
}

impl BatchConfig {
    pub const DEFAULT_BATCH_SIZE: u32 = 1000;

    /// Environment variable overriding [`BatchConfig::batch_size`].
    pub const ENV_BATCH_SIZE: &'static str = "KESTREL_BATCH_SIZE";

    /// Defaults, overridden by `KESTREL_BATCH_SIZE` when it holds a positive integer.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var(Self::ENV_BATCH_SIZE) {
            match Self::parse_batch_size(&raw) {
                Some(n) => cfg.batch_size = n,
                None => log::warn!("ignoring {}={raw:?}: expected a positive integer", Self::ENV_BATCH_SIZE),
            }
        }
        cfg
    }

    fn parse_batch_size(raw: &str) -> Option<u32> {
        raw.trim().parse::<u32>().ok().filter(|n| *n > 0)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_batch_size() {
        assert_eq!(BatchConfig::default().batch_size, 1000);
    }

    #[test]
    fn parses_only_positive_integers() {
        assert_eq!(BatchConfig::parse_batch_size(" 64 "), Some(64));
        assert_eq!(BatchConfig::parse_batch_size("0"), None);
        assert_eq!(BatchConfig::parse_batch_size("-3"), None);
        assert_eq!(BatchConfig::parse_batch_size("lots"), None);
    }
}
