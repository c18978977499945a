use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Command-line flags. Every flag can also be supplied through the environment
/// (a `.env` file is loaded before parsing).
#[derive(Debug, Clone, Parser)]
#[command(name = "reelbase-api", version, about = "Movie catalog JSON API")]
pub struct Args {
    /// API server port
    #[arg(long, env = "API_PORT", default_value_t = 4000)]
    pub port: u16,

    /// Environment (development|staging|production)
    #[arg(long = "env", env = "APP_ENV", value_enum, default_value_t = Environment::Development)]
    pub environment: Environment,

    /// PostgreSQL DSN
    #[arg(long = "db-dsn", env = "DATABASE_URL", default_value = "")]
    pub db_dsn: String,

    /// PostgreSQL max open connections
    #[arg(long = "db-max-open-conns", env = "DATABASE_MAX_OPEN_CONNS", default_value_t = 25)]
    pub db_max_open_conns: u32,

    /// PostgreSQL max connection idle time, in seconds
    #[arg(long = "db-max-idle-time", env = "DATABASE_MAX_IDLE_TIME", default_value_t = 900)]
    pub db_max_idle_time_secs: u64,

    /// Apply pending migrations on startup
    #[arg(long = "db-migrate", env = "DATABASE_MIGRATE", default_value_t = false)]
    pub db_migrate: bool,

    /// Rate limiter maximum requests per second
    #[arg(long = "limiter-rps", env = "LIMITER_RPS", default_value_t = 2.0)]
    pub limiter_rps: f64,

    /// Rate limiter maximum burst
    #[arg(long = "limiter-burst", env = "LIMITER_BURST", default_value_t = 4)]
    pub limiter_burst: u32,

    /// Enable rate limiter
    #[arg(
        long = "limiter-enabled",
        env = "LIMITER_ENABLED",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub limiter_enabled: bool,

    /// SMTP host
    #[arg(long = "smtp-host", env = "SMTP_HOST", default_value = "sandbox.smtp.mailtrap.io")]
    pub smtp_host: String,

    /// SMTP port
    #[arg(long = "smtp-port", env = "SMTP_PORT", default_value_t = 25)]
    pub smtp_port: u16,

    /// SMTP username
    #[arg(long = "smtp-username", env = "SMTP_USERNAME", default_value = "")]
    pub smtp_username: String,

    /// SMTP password
    #[arg(long = "smtp-password", env = "SMTP_PASSWORD", default_value = "")]
    pub smtp_password: String,

    /// SMTP sender
    #[arg(
        long = "smtp-sender",
        env = "SMTP_SENDER",
        default_value = "Reelbase <no-reply@reelbase.example>"
    )]
    pub smtp_sender: String,

    /// Trusted CORS origins (space separated)
    #[arg(
        long = "cors-trusted-origins",
        env = "CORS_TRUSTED_ORIGINS",
        value_delimiter = ' ',
        num_args = 0..
    )]
    pub cors_trusted_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub limiter: LimiterConfig,
    pub smtp: SmtpConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub dsn: String,
    pub max_open_conns: u32,
    pub max_idle_time: Duration,
    pub migrate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    pub rps: f64,
    pub burst: u32,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub sender: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    pub trusted_origins: Vec<String>,
}

impl AppConfig {
    /// Parse flags from the process arguments and environment.
    pub fn from_args() -> Self {
        Self::from(Args::parse())
    }

    /// Defaults suitable for tests: no database, limiter on with the stock
    /// rate, no trusted origins.
    pub fn development() -> Self {
        Self::from(Args::parse_from(["reelbase-api"]))
    }
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        Self {
            port: args.port,
            environment: args.environment,
            database: DatabaseConfig {
                dsn: args.db_dsn,
                max_open_conns: args.db_max_open_conns,
                max_idle_time: Duration::from_secs(args.db_max_idle_time_secs),
                migrate: args.db_migrate,
            },
            limiter: LimiterConfig {
                rps: args.limiter_rps,
                burst: args.limiter_burst,
                enabled: args.limiter_enabled,
            },
            smtp: SmtpConfig {
                host: args.smtp_host,
                port: args.smtp_port,
                username: args.smtp_username,
                password: args.smtp_password,
                sender: args.smtp_sender,
            },
            cors: CorsConfig {
                trusted_origins: args
                    .cors_trusted_origins
                    .into_iter()
                    .filter(|origin| !origin.is_empty())
                    .collect(),
            },
        }
    }
}
