use models::{
    Installation, InstallationStatus, Meter, Role, User, Vendor,
    payloads::{InstallationInput, InstallationResponse, UserInput, UserResponse, VendorInput},
};
use tracing::info;

use crate::{
    api::{ApiClient, ClientError, Photo},
    views::Stock,
};

/// Session state of one signed in client. Every write goes to the server
/// first and only touches the local snapshot once the server accepted it.
/// A failed action leaves its message in [`ClientStore::error`] for display.
pub struct ClientStore {
    api: ApiClient,
    pub session: Option<User>,
    pub users: Vec<User>,
    pub vendors: Vec<Vendor>,
    pub meters: Vec<Meter>,
    pub installations: Vec<Installation>,
    pub error: Option<String>,
}

impl ClientStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            session: None,
            users: Vec::new(),
            vendors: Vec::new(),
            meters: Vec::new(),
            installations: Vec::new(),
            error: None,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn stock(&self) -> Stock {
        Stock::compute(&self.meters, &self.installations)
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn track<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        match &result {
            Ok(_) => self.error = None,
            Err(e) => self.error = Some(e.to_string()),
        }
        result
    }

    fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(|user| user.role == Role::Admin)
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<User, ClientError> {
        let result = self.api.login(username, password).await;
        let user = self.track(result)?;

        info!(username = %user.username, "Signed in");
        self.session = Some(user.clone());

        Ok(user)
    }

    /// Forgets the token and every snapshot.
    pub fn logout(&mut self) {
        let api = self.api.clone();
        *self = Self::new(api);
        self.api.logout();
    }

    /// Reloads everything the signed in role may read.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let result = self.load().await;
        self.track(result)
    }

    async fn load(&mut self) -> Result<(), ClientError> {
        let session = self.api.me().await?;

        self.vendors = self.api.vendors().await?;
        self.installations = self.api.installations().await?;
        self.meters = match (session.role, session.vendor_id.as_deref()) {
            (Role::Vendor, Some(vendor_id)) => self.api.vendor_meters(vendor_id).await?,
            _ => self.api.meters(None, None).await?,
        };
        self.users = match session.role {
            Role::Admin => self.api.users().await?,
            _ => Vec::new(),
        };
        self.session = Some(session);

        Ok(())
    }

    pub async fn assign_meters(&mut self, vendor_id: &str, quantity: i64) -> Result<u64, ClientError> {
        let result = self.api.assign_meters(vendor_id, quantity).await;
        let assignment = self.track(result)?;

        self.meters.extend(assignment.meters);
        if let Some(vendor) = self.vendors.iter_mut().find(|v| v.id == vendor_id) {
            vendor.assigned_meters_count += assignment.assigned_count;
        }

        Ok(assignment.assigned_count)
    }

    /// Applies the server's meter status mapping to the local copy.
    fn mirror_meter(&mut self, installation: &Installation) {
        let installer_id = self.session.as_ref().map(|user| user.id.clone());

        if let Some(meter) = self
            .meters
            .iter_mut()
            .find(|m| m.serial_number == installation.meter_serial_number)
        {
            meter.status = installation.status.meter_status();
            meter.installation_id = Some(installation.id.clone());
            if installer_id.is_some() {
                meter.installer_id = installer_id;
            }
        }
    }

    pub async fn record_installation(
        &mut self,
        input: &InstallationInput,
    ) -> Result<InstallationResponse, ClientError> {
        let result = self.api.create_installation(input).await;
        let response = self.track(result)?;

        if response.meter_synced {
            self.mirror_meter(&response.data);
        }
        self.installations.insert(0, response.data.clone());

        Ok(response)
    }

    pub async fn update_installation_status(
        &mut self,
        id: &str,
        status: InstallationStatus,
    ) -> Result<InstallationResponse, ClientError> {
        let result = self.api.update_installation_status(id, status).await;
        let response = self.track(result)?;

        if response.meter_synced {
            self.mirror_meter(&response.data);
        }
        if let Some(installation) = self.installations.iter_mut().find(|i| i.id == id) {
            *installation = response.data.clone();
        }

        Ok(response)
    }

    /// Runs the server side repair and reloads the meters it touched.
    pub async fn sync_meter_statuses(&mut self) -> Result<String, ClientError> {
        let result = self.api.sync_meter_statuses().await;
        let response = self.track(result)?;

        let meters = self.api.meters(None, None).await;
        self.meters = self.track(meters)?;

        Ok(response.message)
    }

    pub async fn upload_photos(&mut self, photos: Vec<Photo>) -> Result<Vec<String>, ClientError> {
        let result = self.api.upload_photos(photos).await;
        self.track(result)
    }

    pub async fn create_vendor(&mut self, input: &VendorInput) -> Result<Vendor, ClientError> {
        let result = self.api.create_vendor(input).await;
        let vendor = self.track(result)?;

        self.vendors.push(vendor.clone());
        self.vendors.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(vendor)
    }

    pub async fn update_vendor(&mut self, id: &str, input: &VendorInput) -> Result<Vendor, ClientError> {
        let result = self.api.update_vendor(id, input).await;
        let vendor = self.track(result)?;

        if let Some(current) = self.vendors.iter_mut().find(|v| v.id == id) {
            *current = vendor.clone();
        }

        Ok(vendor)
    }

    pub async fn delete_vendor(&mut self, id: &str) -> Result<(), ClientError> {
        let result = self.api.delete_vendor(id).await;
        self.track(result)?;

        self.vendors.retain(|v| v.id != id);

        Ok(())
    }

    pub async fn create_user(&mut self, input: &UserInput) -> Result<UserResponse, ClientError> {
        let result = self.api.create_user(input).await;
        let response = self.track(result)?;

        if self.is_admin() {
            self.users.insert(0, response.data.clone());
        }

        Ok(response)
    }

    pub async fn update_user(
        &mut self,
        id: &str,
        input: &UserInput,
    ) -> Result<UserResponse, ClientError> {
        let result = self.api.update_user(id, input).await;
        let response = self.track(result)?;

        if let Some(user) = self.users.iter_mut().find(|u| u.id == id) {
            *user = response.data.clone();
        }

        Ok(response)
    }

    pub async fn delete_user(&mut self, id: &str) -> Result<(), ClientError> {
        let result = self.api.delete_user(id).await;
        self.track(result)?;

        self.users.retain(|u| u.id != id);

        Ok(())
    }
}
