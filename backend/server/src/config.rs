use std::{env, fmt::Display, fs::read_to_string, ops::RangeInclusive, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_FOLDER: &str = "meter-installations";

pub const JWT_EXPIRE_DAYS: RangeInclusive<i64> = 1..=3650;
/// What the bcrypt crate accepts.
pub const BCRYPT_COST: RangeInclusive<u32> = 4..=31;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("{0} must be set as an environment variable or secret")]
    Missing(&'static str),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// No URL means the in-memory store.
    pub redis_url: Option<String>,
    pub cors_origin: String,
    pub jwt_secret: String,
    pub jwt_expire_days: i64,
    pub bcrypt_cost: u32,
    pub frontend_url: String,
    pub mail: Option<MailConfig>,
    pub images: Option<CloudinaryConfig>,
    pub admin: Option<AdminSeed>,
}

/// SMTP transport. Present only when both user and password are set.
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
}

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
}

/// First admin account, created only while the user collection is empty.
#[derive(Clone, Debug)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub name: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("PORT", "5000")?,
            redis_url: optional("REDIS_URL"),
            cors_origin: try_load("CORS_ORIGIN", "http://localhost:3000")?,
            jwt_secret: optional("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            jwt_expire_days: within(
                "JWT_EXPIRE_DAYS",
                try_load("JWT_EXPIRE_DAYS", "30")?,
                JWT_EXPIRE_DAYS,
            )?,
            bcrypt_cost: within("BCRYPT_COST", try_load("BCRYPT_COST", "10")?, BCRYPT_COST)?,
            frontend_url: try_load("FRONTEND_URL", "http://localhost:3000")?,
            mail: load_mail()?,
            images: load_images(),
            admin: load_admin(),
        })
    }
}

fn load_mail() -> Result<Option<MailConfig>, ConfigError> {
    let (Some(user), Some(password)) = (optional("EMAIL_USER"), optional("EMAIL_PASSWORD")) else {
        warn!("Email service not configured, set EMAIL_USER and EMAIL_PASSWORD");
        return Ok(None);
    };

    Ok(Some(MailConfig {
        host: try_load("EMAIL_HOST", "smtp.gmail.com")?,
        port: try_load("EMAIL_PORT", "587")?,
        from: optional("EMAIL_FROM").unwrap_or_else(|| user.clone()),
        user,
        password,
    }))
}

fn load_images() -> Option<CloudinaryConfig> {
    let (Some(cloud_name), Some(api_key), Some(api_secret)) = (
        optional("CLOUDINARY_CLOUD_NAME"),
        optional("CLOUDINARY_API_KEY"),
        optional("CLOUDINARY_API_SECRET"),
    ) else {
        warn!("Image hosting not configured, photo uploads are disabled");
        return None;
    };

    Some(CloudinaryConfig {
        cloud_name,
        api_key,
        api_secret,
        folder: optional("CLOUDINARY_FOLDER").unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
    })
}

fn load_admin() -> Option<AdminSeed> {
    let (Some(username), Some(password)) = (optional("ADMIN_USERNAME"), optional("ADMIN_PASSWORD"))
    else {
        return None;
    };

    Some(AdminSeed {
        username,
        password,
        name: optional("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
    })
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("Environment variable {key} not found");
    })
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                message: e.to_string(),
            }
        })
}

fn within<T>(key: &'static str, value: T, range: RangeInclusive<T>) -> Result<T, ConfigError>
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        return Ok(value);
    }

    warn!("Invalid {key} value: {value}");
    Err(ConfigError::Invalid {
        key,
        message: format!("{value} is outside {}..={}", range.start(), range.end()),
    })
}

/// Environment first, then a mounted secret of the same name.
fn optional(key: &str) -> Option<String> {
    var(key)
        .ok()
        .or_else(|| read_secret(key))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path).ok()
}
