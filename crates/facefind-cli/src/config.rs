use std::path::PathBuf;

/// Run configuration, loaded from environment variables. CLI flags override it.
pub struct Config {
    /// Directory containing det_10g.onnx and w600k_r50.onnx.
    pub model_dir: PathBuf,
    /// Maximum signature distance accepted as a match.
    pub tolerance: f32,
    /// ONNX Runtime intra-op threads per model.
    pub intra_threads: usize,
}

impl Config {
    /// Load configuration from `FACEFIND_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("FACEFIND_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| facefind_core::default_model_dir());

        Self {
            model_dir,
            tolerance: env_f32("FACEFIND_TOLERANCE", facefind_core::DEFAULT_TOLERANCE),
            intra_threads: env_usize("FACEFIND_INTRA_THREADS", 2),
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_fallbacks() {
        assert_eq!(env_f32("FACEFIND_TEST_UNSET_F32", 0.6), 0.6);
        assert_eq!(env_usize("FACEFIND_TEST_UNSET_USIZE", 3), 3);
    }

    #[test]
    fn test_env_unparseable_uses_default() {
        std::env::set_var("FACEFIND_TEST_GARBAGE_F32", "strict");
        assert_eq!(env_f32("FACEFIND_TEST_GARBAGE_F32", 0.5), 0.5);
        std::env::set_var("FACEFIND_TEST_THREADS", "4");
        assert_eq!(env_usize("FACEFIND_TEST_THREADS", 1), 4);
    }
}
