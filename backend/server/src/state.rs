use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::{
    auth::TokenKeys,
    config::{Config, ConfigError},
    database::{Database, DocumentStore, MemoryStore, RedisStore, StoreError, init_redis},
    error::AppError,
    images::{Cloudinary, ImageHost},
    mail::{MailError, Mailer, SmtpMailer},
};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to connect to the document store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to build the mail transport: {0}")]
    Mail(#[from] MailError),

    #[error("Failed to create the initial admin: {0}")]
    Bootstrap(#[from] AppError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct AppState {
    pub config: Config,
    pub database: Database,
    pub tokens: TokenKeys,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub images: Option<Arc<dyn ImageHost>>,
}

impl AppState {
    pub async fn new() -> Result<Arc<Self>, StartupError> {
        let config = Config::load()?;

        let store: Arc<dyn DocumentStore> = match &config.redis_url {
            Some(redis_url) => Arc::new(RedisStore::new(init_redis(redis_url).await?)),
            None => {
                warn!("REDIS_URL not set, documents are kept in memory only");
                Arc::new(MemoryStore::default())
            }
        };

        let mailer: Option<Arc<dyn Mailer>> = match &config.mail {
            Some(mail) => Some(Arc::new(SmtpMailer::new(mail)?)),
            None => None,
        };

        let images: Option<Arc<dyn ImageHost>> = config
            .images
            .clone()
            .map(|images| Arc::new(Cloudinary::new(images)) as Arc<dyn ImageHost>);

        let state = Self::from_parts(config, store, mailer, images);
        info!(store = state.database.backend_tag(), "State ready");

        Ok(state)
    }

    pub fn from_parts(
        config: Config,
        store: Arc<dyn DocumentStore>,
        mailer: Option<Arc<dyn Mailer>>,
        images: Option<Arc<dyn ImageHost>>,
    ) -> Arc<Self> {
        let tokens = TokenKeys::new(&config.jwt_secret, config.jwt_expire_days);

        Arc::new(Self {
            database: Database::new(store),
            tokens,
            mailer,
            images,
            config,
        })
    }
}
