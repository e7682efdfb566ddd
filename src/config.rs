//! Limits applied while decoding and reassembling telegrams.

use std::num::NonZeroUsize;

const DEFAULT_MAX_DEPTH: NonZeroUsize = NonZeroUsize::MIN.saturating_add(63);
const DEFAULT_MAX_TELEGRAM_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(1024 * 1024 - 1);
const DEFAULT_MAX_RETAINED_TELEGRAMS: NonZeroUsize = NonZeroUsize::MIN.saturating_add(4095);

/// Settings that bound recursion while decoding one telegram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Deepest struct or object nesting accepted before decoding of the
    /// body is abandoned.
    pub max_depth: NonZeroUsize,
}

impl DecoderConfig {
    /// Create a configuration with the given nesting limit.
    #[must_use]
    pub const fn new(max_depth: NonZeroUsize) -> Self { Self { max_depth } }

    /// Replace the nesting limit.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: NonZeroUsize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self { Self::new(DEFAULT_MAX_DEPTH) }
}

/// Settings that bound the memory held by fragment runs and reassembled
/// telegrams.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReassemblyConfig {
    /// Hard cap on a reassembled telegram, header and trailer included.
    pub max_telegram_size: NonZeroUsize,
    /// Reassembled telegrams kept for revisited last fragments.
    pub max_retained_telegrams: NonZeroUsize,
}

impl ReassemblyConfig {
    /// Create a configuration with the given size cap and the default
    /// retention.
    #[must_use]
    pub const fn new(max_telegram_size: NonZeroUsize) -> Self {
        Self {
            max_telegram_size,
            max_retained_telegrams: DEFAULT_MAX_RETAINED_TELEGRAMS,
        }
    }

    /// Replace the size cap.
    #[must_use]
    pub const fn with_max_telegram_size(mut self, max_telegram_size: NonZeroUsize) -> Self {
        self.max_telegram_size = max_telegram_size;
        self
    }

    /// Replace the number of reassembled telegrams kept.
    #[must_use]
    pub const fn with_max_retained_telegrams(
        mut self,
        max_retained_telegrams: NonZeroUsize,
    ) -> Self {
        self.max_retained_telegrams = max_retained_telegrams;
        self
    }
}

impl Default for ReassemblyConfig {
    fn default() -> Self { Self::new(DEFAULT_MAX_TELEGRAM_SIZE) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_generous() {
        assert_eq!(DecoderConfig::default().max_depth.get(), 64);
        assert_eq!(ReassemblyConfig::default().max_telegram_size.get(), 1 << 20);
        assert_eq!(ReassemblyConfig::default().max_retained_telegrams.get(), 4096);
    }

    #[test]
    fn builders_replace_limits() {
        let depth = NonZeroUsize::new(3).expect("non-zero");
        let size = NonZeroUsize::new(128).expect("non-zero");
        assert_eq!(DecoderConfig::default().with_max_depth(depth).max_depth, depth);
        assert_eq!(
            ReassemblyConfig::default()
                .with_max_telegram_size(size)
                .max_telegram_size,
            size
        );
        let retained = NonZeroUsize::new(2).expect("non-zero");
        let config = ReassemblyConfig::new(size).with_max_retained_telegrams(retained);
        assert_eq!(config.max_telegram_size, size);
        assert_eq!(config.max_retained_telegrams, retained);
    }
}
