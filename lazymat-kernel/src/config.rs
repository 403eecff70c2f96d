//! Runtime evaluation configuration.

use std::sync::OnceLock;

/// Thresholds and switches consulted by [`select_strategy`](crate::select_strategy).
///
/// Pass one explicitly (`assign_configured`, `evaluate_with`) or install a
/// process-wide instance once at startup with [`EvalConfig::install_global`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    /// Allow the external GEMM backend when one is compiled in.
    pub external: bool,
    /// Minimum element count for blocked element-wise kernels, and minimum
    /// `m * n * k` for blocked matrix products.
    pub vectorize_threshold: usize,
    /// Minimum `m * n * k` for the external backend.
    pub external_threshold: usize,
    /// Allow rayon fan-out of blocked kernels.
    pub parallel: bool,
    /// Minimum output element count before fanning out.
    pub parallel_threshold: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            external: cfg!(any(feature = "blas", feature = "faer")),
            vectorize_threshold: 256,
            external_threshold: 32 * 32 * 32,
            parallel: cfg!(feature = "parallel"),
            parallel_threshold: crate::threading::MINTHREADLENGTH,
        }
    }
}

static GLOBAL: OnceLock<EvalConfig> = OnceLock::new();

impl EvalConfig {
    /// Defaults overridden by `LAZYMAT_*` environment variables.
    ///
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        let flag = |key: &str| lookup(key).and_then(|v| parse_flag(&v));
        let size = |key: &str| lookup(key).and_then(|v| v.trim().parse::<usize>().ok());
        if let Some(v) = flag("LAZYMAT_EXTERNAL") {
            cfg.external = v;
        }
        if let Some(v) = size("LAZYMAT_VECTORIZE_THRESHOLD") {
            cfg.vectorize_threshold = v;
        }
        if let Some(v) = size("LAZYMAT_EXTERNAL_THRESHOLD") {
            cfg.external_threshold = v;
        }
        if let Some(v) = flag("LAZYMAT_PARALLEL") {
            cfg.parallel = v;
        }
        if let Some(v) = size("LAZYMAT_PARALLEL_THRESHOLD") {
            cfg.parallel_threshold = v;
        }
        cfg
    }

    /// Install the process-wide configuration.
    ///
    /// Returns the rejected value if a configuration is already installed
    /// (explicitly or by an earlier [`EvalConfig::global`] call).
    pub fn install_global(self) -> Result<(), EvalConfig> {
        GLOBAL.set(self)
    }

    /// The process-wide configuration, initialized from the environment on
    /// first use.
    pub fn global() -> &'static EvalConfig {
        GLOBAL.get_or_init(|| {
            let cfg = Self::from_env();
            tracing::debug!(?cfg, "initialized global evaluation config");
            cfg
        })
    }

    /// Configuration that always picks the scalar loop.
    pub fn scalar_only() -> Self {
        Self {
            external: false,
            vectorize_threshold: usize::MAX,
            external_threshold: usize::MAX,
            parallel: false,
            parallel_threshold: usize::MAX,
        }
    }

    /// Configuration that picks the blocked loop whenever the operands allow it.
    pub fn blocked_always() -> Self {
        Self {
            external: false,
            vectorize_threshold: 0,
            external_threshold: usize::MAX,
            ..Self::default()
        }
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let cfg = EvalConfig::from_lookup(lookup(&[
            ("LAZYMAT_EXTERNAL", "off"),
            ("LAZYMAT_VECTORIZE_THRESHOLD", "17"),
            ("LAZYMAT_PARALLEL", "0"),
            ("LAZYMAT_PARALLEL_THRESHOLD", " 99 "),
        ]));
        assert!(!cfg.external);
        assert_eq!(cfg.vectorize_threshold, 17);
        assert!(!cfg.parallel);
        assert_eq!(cfg.parallel_threshold, 99);
        assert_eq!(
            cfg.external_threshold,
            EvalConfig::default().external_threshold
        );
    }

    #[test]
    fn test_unparsable_values_ignored() {
        let cfg = EvalConfig::from_lookup(lookup(&[
            ("LAZYMAT_EXTERNAL_THRESHOLD", "lots"),
            ("LAZYMAT_PARALLEL", "maybe"),
        ]));
        assert_eq!(cfg, EvalConfig::default());
    }

    #[test]
    fn test_global_is_set_once() {
        let first = *EvalConfig::global();
        assert_eq!(EvalConfig::scalar_only().install_global(), Err(EvalConfig::scalar_only()));
        assert_eq!(*EvalConfig::global(), first);
    }
}
