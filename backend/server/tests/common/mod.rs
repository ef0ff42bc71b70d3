#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use client::ApiClient;
use models::{
    Role,
    payloads::{UserInput, VendorInput},
};
use server::{
    bootstrap_admin, build_router,
    config::{AdminSeed, Config},
    database::MemoryStore,
    images::{ImageError, ImageFile, ImageHost},
    mail::{MailError, Mailer, OutgoingMail},
    state::AppState,
};
use tokio::net::TcpListener;

pub const ADMIN_PASSWORD: &str = "admin123";

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

pub struct FakeImages;

#[async_trait]
impl ImageHost for FakeImages {
    async fn upload(&self, file: ImageFile) -> Result<String, ImageError> {
        Ok(format!(
            "https://images.test/meter-installations/{}",
            file.file_name
        ))
    }
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        redis_url: None,
        cors_origin: "http://localhost:3000".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_expire_days: 30,
        bcrypt_cost: 4,
        frontend_url: "http://localhost:3000".to_string(),
        mail: None,
        images: None,
        admin: Some(AdminSeed {
            username: "admin".to_string(),
            password: ADMIN_PASSWORD.to_string(),
            name: "Admin User".to_string(),
        }),
    }
}

pub struct TestServer {
    pub base_url: String,
    pub state: Arc<AppState>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(None, None).await
    }

    pub async fn start_with(
        mailer: Option<Arc<dyn Mailer>>,
        images: Option<Arc<dyn ImageHost>>,
    ) -> Self {
        let state = AppState::from_parts(
            test_config(),
            Arc::new(MemoryStore::default()),
            mailer,
            images,
        );
        bootstrap_admin(&state).await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let app = build_router(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{address}"),
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url)
    }

    pub async fn admin(&self) -> ApiClient {
        let mut client = self.client();
        client.login("admin", ADMIN_PASSWORD).await.unwrap();
        client
    }

    pub async fn vendor(&self, admin: &ApiClient, name: &str) -> String {
        let input = VendorInput {
            name: Some(name.to_string()),
            contact_number: Some("9876543210".to_string()),
            email: Some("contact@example.com".to_string()),
        };

        admin.create_vendor(&input).await.unwrap().id
    }

    /// Creates an account and returns a client signed in as it.
    pub async fn account(
        &self,
        admin: &ApiClient,
        username: &str,
        role: Role,
        vendor_id: Option<&str>,
    ) -> ApiClient {
        let input = UserInput {
            username: Some(username.to_string()),
            password: Some("password1".to_string()),
            name: Some(format!("{username} name")),
            role: Some(role),
            vendor_id: vendor_id.map(str::to_string),
            email: None,
        };
        admin.create_user(&input).await.unwrap();

        let mut client = self.client();
        client.login(username, "password1").await.unwrap();
        client
    }
}
