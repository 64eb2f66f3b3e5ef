//! Global limits and defaults for configuration and runtime

/// Minimum allowed timeout for provider calls in milliseconds
pub const MIN_PROVIDER_TIMEOUT_MS: u64 = 100; // 100ms

/// Maximum allowed timeout for provider calls in milliseconds
pub const MAX_PROVIDER_TIMEOUT_MS: u64 = 300_000; // 5min

/// Default per-attempt timeout for provider calls in milliseconds
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 20_000; // 20s

/// Default overall deadline for one orchestration request in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000; // 30s

/// Default maximum attempts (first call included) for one logical LLM call
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;

/// Upper bound for configurable retry attempts
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Default base delay for exponential retry backoff in milliseconds
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000; // 1s

/// Default cap for a single retry delay in milliseconds
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 8_000; // 8s

/// Largest jitter ratio accepted for retry delays (+/- 20%)
pub const MAX_RETRY_JITTER_RATIO: f64 = 0.2;

/// Smallest failure window the circuit breaker may be configured with
pub const MIN_FAILURE_WINDOW_SIZE: usize = 5;

/// Default number of logical call outcomes kept per provider
pub const DEFAULT_FAILURE_WINDOW_SIZE: usize = 10;

/// Default failure ratio that trips a closed circuit (strictly exceeded)
pub const DEFAULT_FAILURE_THRESHOLD: f64 = 0.5;

/// Default time an open circuit waits before allowing a trial call
pub const DEFAULT_CIRCUIT_COOLDOWN_MS: u64 = 60_000; // 60s

/// Largest cooldown (base or grown) an open circuit may be configured with
pub const MAX_CIRCUIT_COOLDOWN_MS: u64 = 86_400_000; // 24h

/// Minimum number of successful results for a consensus vote
pub const CONSENSUS_MIN_RESULTS: usize = 2;

/// Weight of mean field confidence in the quality score
pub const QUALITY_CONFIDENCE_WEIGHT: f64 = 0.5;

/// Weight of required-field completeness in the quality score
pub const QUALITY_COMPLETENESS_WEIGHT: f64 = 0.3;

/// Weight of schema validity in the quality score
pub const QUALITY_SCHEMA_WEIGHT: f64 = 0.2;

/// Default window used for provider health snapshots
pub const DEFAULT_HEALTH_WINDOW_MINUTES: u64 = 15;

/// Default number of raw metrics data points retained per provider
pub const DEFAULT_MAX_POINTS_PER_PROVIDER: usize = 10_000;
