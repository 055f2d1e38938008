/// Default clamp floor for aggregated signal strength, in dBm.
pub const DEFAULT_NOISE_FLOOR_DBM: f64 = -120.0;

/// Default transmit power for the built-in path-loss oracle, in dBm.
pub const DEFAULT_TX_POWER_DBM: f64 = 30.0;

/// Default carrier frequency for the built-in path-loss oracle, in Hz.
pub const DEFAULT_FREQUENCY_HZ: f64 = 3.5e9;

/// Default number of scoring workers.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Default per-evaluation timeout, in milliseconds.
pub const DEFAULT_TIMEOUT_PER_EVALUATION_MS: u64 = 30_000;

/// Minimum propagation distance, in meters. Path loss is evaluated at this
/// distance for any receiver closer than it, keeping the model finite.
pub const MIN_PATH_DISTANCE_M: f64 = 1.0;
