//! Service configuration.

use std::time::Duration;

/// Which storage backend to open at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local in-memory maps (data lost on restart).
    Memory,

    /// `RocksDB` document store (requires the `rocksdb-backend` feature).
    Rocks,
}

/// JWT signing configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret for both token kinds.
    pub secret: String,

    /// Issuer claim.
    pub issuer: String,

    /// Audience claim.
    pub audience: String,

    /// Access token lifetime in seconds (default: 1 hour).
    pub access_ttl_secs: i64,

    /// Refresh token lifetime in seconds (default: 7 days).
    pub refresh_ttl_secs: i64,
}

/// Ledger limits.
#[derive(Debug, Clone)]
pub struct BankingConfig {
    /// Opening balance granted to each new account, in cents.
    pub opening_balance_cents: i64,

    /// Smallest allowed transfer, in cents.
    pub min_transfer_cents: i64,

    /// Largest allowed transfer, in cents.
    pub max_transfer_cents: i64,

    /// Maximum transfer message length in characters.
    pub message_max_chars: usize,

    /// Default page size for transaction history.
    pub transactions_per_page: usize,
}

/// Verification-code parameters.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Number of digits in a code.
    pub code_length: usize,

    /// Code lifetime in seconds (default: 10 minutes).
    pub code_ttl_secs: i64,

    /// Minimum interval between two code issuances for the same address.
    pub resend_cooldown_secs: i64,

    /// Wrong attempts tolerated before the entry is purged.
    pub max_attempts: u32,
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Storage backend selection (default: memory).
    pub backend: StorageBackend,

    /// Path to the `RocksDB` data directory (default: "/data/krona").
    pub data_dir: String,

    /// JWT configuration.
    pub jwt: JwtConfig,

    /// Ledger limits.
    pub banking: BankingConfig,

    /// Verification-code parameters.
    pub verification: VerificationConfig,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Maximum number of in-flight requests.
    pub max_concurrency: usize,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let backend = match std::env::var("STORAGE_BACKEND").as_deref() {
            Ok("rocks") => StorageBackend::Rocks,
            _ => StorageBackend::Memory,
        };

        Self {
            listen_addr: env_or("LISTEN_ADDR", defaults.listen_addr),
            backend,
            data_dir: env_or("DATA_DIR", defaults.data_dir),
            jwt: JwtConfig {
                secret: env_or("JWT_SECRET", defaults.jwt.secret),
                issuer: env_or("JWT_ISSUER", defaults.jwt.issuer),
                audience: env_or("JWT_AUDIENCE", defaults.jwt.audience),
                access_ttl_secs: env_parse("JWT_ACCESS_TTL_SECS", defaults.jwt.access_ttl_secs),
                refresh_ttl_secs: env_parse("JWT_REFRESH_TTL_SECS", defaults.jwt.refresh_ttl_secs),
            },
            banking: BankingConfig {
                opening_balance_cents: env_parse(
                    "OPENING_BALANCE_CENTS",
                    defaults.banking.opening_balance_cents,
                ),
                min_transfer_cents: env_parse(
                    "MIN_TRANSFER_CENTS",
                    defaults.banking.min_transfer_cents,
                ),
                max_transfer_cents: env_parse(
                    "MAX_TRANSFER_CENTS",
                    defaults.banking.max_transfer_cents,
                ),
                message_max_chars: env_parse(
                    "TRANSFER_MESSAGE_MAX_CHARS",
                    defaults.banking.message_max_chars,
                ),
                transactions_per_page: env_parse(
                    "TRANSACTIONS_PER_PAGE",
                    defaults.banking.transactions_per_page,
                ),
            },
            verification: VerificationConfig {
                code_length: env_parse("VERIFICATION_CODE_LENGTH", defaults.verification.code_length),
                code_ttl_secs: env_parse(
                    "VERIFICATION_CODE_TTL_SECS",
                    defaults.verification.code_ttl_secs,
                ),
                resend_cooldown_secs: env_parse(
                    "VERIFICATION_RESEND_COOLDOWN_SECS",
                    defaults.verification.resend_cooldown_secs,
                ),
                max_attempts: env_parse(
                    "VERIFICATION_MAX_ATTEMPTS",
                    defaults.verification.max_attempts,
                ),
            },
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES", defaults.max_body_bytes),
            request_timeout_seconds: env_parse(
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            ),
            max_concurrency: env_parse("MAX_CONCURRENCY", defaults.max_concurrency),
        }
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            backend: StorageBackend::Memory,
            data_dir: "/data/krona".into(),
            jwt: JwtConfig {
                secret: "change-me-in-production".into(),
                issuer: "krona".into(),
                audience: "krona-clients".into(),
                access_ttl_secs: 3600,           // 1 hour
                refresh_ttl_secs: 7 * 24 * 3600, // 7 days
            },
            banking: BankingConfig {
                opening_balance_cents: 10_000,
                min_transfer_cents: 1,
                max_transfer_cents: 1_000_000,
                message_max_chars: 100,
                transactions_per_page: 10,
            },
            verification: VerificationConfig {
                code_length: 6,
                code_ttl_secs: 600, // 10 minutes
                resend_cooldown_secs: 60,
                max_attempts: 5,
            },
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            max_concurrency: 1024,
        }
    }
}
