use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::{Datelike, NaiveDate};

use crate::program::payments::domain::TuitionSchedule;
use crate::program::students::domain::EnrollmentDefaults;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub program: ProgramConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            program: ProgramConfig::load()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Tuition fees and enrollment fallbacks. Loaded once and passed into the
/// program components as plain data; nothing deeper reads the environment.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    pub enrollment_fee: f64,
    pub monthly_fee: f64,
    pub months_in_year: u32,
    pub default_grade: String,
    pub default_city: String,
    pub default_province: String,
    pub default_country: String,
}

impl ProgramConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            enrollment_fee: parse_amount("PROGRAM_ENROLLMENT_FEE", 20.0)?,
            monthly_fee: parse_amount("PROGRAM_MONTHLY_FEE", 40.0)?,
            months_in_year: parse_count("PROGRAM_MONTHS_IN_YEAR", 10)?,
            default_grade: env::var("PROGRAM_DEFAULT_GRADE")
                .unwrap_or_else(|_| "Jardín".to_string()),
            default_city: env::var("PROGRAM_DEFAULT_CITY")
                .unwrap_or_else(|_| "Lichinga".to_string()),
            default_province: env::var("PROGRAM_DEFAULT_PROVINCE")
                .unwrap_or_else(|_| "Niassa".to_string()),
            default_country: env::var("PROGRAM_DEFAULT_COUNTRY")
                .unwrap_or_else(|_| "Mozambique".to_string()),
        })
    }

    pub fn tuition_schedule(&self) -> TuitionSchedule {
        TuitionSchedule {
            enrollment_fee: self.enrollment_fee,
            monthly_fee: self.monthly_fee,
            months_in_year: self.months_in_year,
        }
    }

    /// Enrollment fallbacks for a given date; the academic year defaults to
    /// the calendar year of `today`.
    pub fn enrollment_defaults(&self, today: NaiveDate) -> EnrollmentDefaults {
        EnrollmentDefaults {
            grade: self.default_grade.clone(),
            academic_year: today.year().to_string(),
            city: self.default_city.clone(),
            province: self.default_province.clone(),
            country: self.default_country.clone(),
        }
    }
}

fn parse_amount(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

fn parse_count(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
