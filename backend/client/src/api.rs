use models::{
    Installation, InstallationStatus, Meter, MeterStats, MeterStatus, User, Vendor,
    payloads::{
        AssignRequest, Assignment, DataResponse, ErrorResponse, InstallationInput,
        InstallationResponse, ListResponse, LoginRequest, LoginResponse, MeResponse,
        MessageResponse, StatusUpdate, SyncResponse, UploadResponse, UserInput, UserResponse,
        VendorInput,
    },
};
use reqwest::{
    Client, Method, RequestBuilder,
    multipart::{Form, Part},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with its error envelope.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not logged in")]
    NoSession,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// One photo for [`ApiClient::upload_photos`].
#[derive(Debug, Clone)]
pub struct Photo {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Typed access to the `/api` endpoints. Holds the bearer token after login.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// `base_url` is the server origin, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}/api{path}", self.base_url));

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        warn!(status = status.as_u16(), %message, "API request failed");

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        Self::send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        Self::send(self.request(Method::POST, path).json(body)).await
    }

    async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        Self::send(self.request(Method::PUT, path).json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let _: DataResponse<Value> = Self::send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    pub async fn health(&self) -> Result<MessageResponse, ClientError> {
        self.get("/health").await
    }

    /// Logs in and keeps the token for later calls.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<User, ClientError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.post("/auth/login", &request).await?;
        self.token = Some(response.token);

        Ok(response.user)
    }

    pub async fn me(&self) -> Result<User, ClientError> {
        if self.token.is_none() {
            return Err(ClientError::NoSession);
        }

        let response: MeResponse = self.get("/auth/me").await?;
        Ok(response.user)
    }

    pub async fn users(&self) -> Result<Vec<User>, ClientError> {
        let response: ListResponse<User> = self.get("/users").await?;
        Ok(response.data)
    }

    pub async fn user(&self, id: &str) -> Result<User, ClientError> {
        let response: DataResponse<User> = self.get(&format!("/users/{id}")).await?;
        Ok(response.data)
    }

    pub async fn create_user(&self, input: &UserInput) -> Result<UserResponse, ClientError> {
        self.post("/users", input).await
    }

    pub async fn update_user(
        &self,
        id: &str,
        input: &UserInput,
    ) -> Result<UserResponse, ClientError> {
        self.put(&format!("/users/{id}"), input).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&format!("/users/{id}")).await
    }

    pub async fn vendors(&self) -> Result<Vec<Vendor>, ClientError> {
        let response: ListResponse<Vendor> = self.get("/vendors").await?;
        Ok(response.data)
    }

    pub async fn vendor(&self, id: &str) -> Result<Vendor, ClientError> {
        let response: DataResponse<Vendor> = self.get(&format!("/vendors/{id}")).await?;
        Ok(response.data)
    }

    pub async fn create_vendor(&self, input: &VendorInput) -> Result<Vendor, ClientError> {
        let response: DataResponse<Vendor> = self.post("/vendors", input).await?;
        Ok(response.data)
    }

    pub async fn update_vendor(&self, id: &str, input: &VendorInput) -> Result<Vendor, ClientError> {
        let response: DataResponse<Vendor> = self.put(&format!("/vendors/{id}"), input).await?;
        Ok(response.data)
    }

    pub async fn delete_vendor(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&format!("/vendors/{id}")).await
    }

    pub async fn meters(
        &self,
        status: Option<MeterStatus>,
        vendor_id: Option<&str>,
    ) -> Result<Vec<Meter>, ClientError> {
        let mut query = Vec::new();
        if let Some(status) = status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(vendor_id) = vendor_id {
            query.push(("vendorId", vendor_id.to_string()));
        }

        let response: ListResponse<Meter> =
            Self::send(self.request(Method::GET, "/meters").query(&query)).await?;
        Ok(response.data)
    }

    pub async fn vendor_meters(&self, vendor_id: &str) -> Result<Vec<Meter>, ClientError> {
        let response: ListResponse<Meter> =
            self.get(&format!("/meters/vendor/{vendor_id}")).await?;
        Ok(response.data)
    }

    pub async fn meter_stats(&self) -> Result<MeterStats, ClientError> {
        let response: DataResponse<MeterStats> = self.get("/meters/stats").await?;
        Ok(response.data)
    }

    pub async fn assign_meters(
        &self,
        vendor_id: &str,
        quantity: i64,
    ) -> Result<Assignment, ClientError> {
        let request = AssignRequest {
            vendor_id: Some(vendor_id.to_string()),
            quantity: Some(quantity),
        };
        let response: DataResponse<Assignment> = self.post("/meters/assign", &request).await?;
        Ok(response.data)
    }

    pub async fn installations(&self) -> Result<Vec<Installation>, ClientError> {
        let response: ListResponse<Installation> = self.get("/installations").await?;
        Ok(response.data)
    }

    pub async fn installation(&self, id: &str) -> Result<Installation, ClientError> {
        let response: DataResponse<Installation> =
            self.get(&format!("/installations/{id}")).await?;
        Ok(response.data)
    }

    pub async fn create_installation(
        &self,
        input: &InstallationInput,
    ) -> Result<InstallationResponse, ClientError> {
        self.post("/installations", input).await
    }

    pub async fn update_installation_status(
        &self,
        id: &str,
        status: InstallationStatus,
    ) -> Result<InstallationResponse, ClientError> {
        let update = StatusUpdate {
            status: Some(status),
        };
        self.put(&format!("/installations/{id}"), &update).await
    }

    pub async fn sync_meter_statuses(&self) -> Result<SyncResponse, ClientError> {
        Self::send(self.request(Method::POST, "/installations/sync-meter-statuses")).await
    }

    /// Returns the hosted URLs in upload order.
    pub async fn upload_photos(&self, photos: Vec<Photo>) -> Result<Vec<String>, ClientError> {
        let mut form = Form::new();
        for photo in photos {
            let part = Part::bytes(photo.bytes)
                .file_name(photo.file_name)
                .mime_str(&photo.content_type)?;
            form = form.part("photos", part);
        }

        let response: UploadResponse =
            Self::send(self.request(Method::POST, "/upload").multipart(form)).await?;
        Ok(response.data)
    }
}
