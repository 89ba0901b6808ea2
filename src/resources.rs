/// Admin CRUD resources
///
/// The records themselves belong to the server; this module only knows
/// where each collection lives and routes every call through the gateway,
/// so all of them get the bearer token and the 401 handling.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;

use crate::api_client::ApiClient;
use crate::error::ApiError;

pub const EMPLOYEES: &str = "/api/employees";
pub const USERS: &str = "/api/users";
pub const ROLES: &str = "/api/roles";
pub const PERMISSIONS: &str = "/api/permissions";
pub const DEPARTMENTS: &str = "/api/departments";

/// A REST collection at a fixed path
pub struct Resource<'a> {
    client: &'a ApiClient,
    path: &'a str,
}

impl<'a> Resource<'a> {
    pub fn new(client: &'a ApiClient, path: &'a str) -> Self {
        Self { client, path }
    }

    pub fn path(&self) -> &str {
        self.path
    }

    fn item_path(&self, id: impl Display) -> String {
        format!("{}/{}", self.path, id)
    }

    pub async fn list<T: DeserializeOwned>(&self) -> Result<Vec<T>, ApiError> {
        self.client.get_list(self.path).await
    }

    pub async fn get<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.client.get(&self.item_path(id)).await
    }

    pub async fn create<B, T>(&self, body: &B) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.client.post(self.path, serde_json::to_value(body)?).await
    }

    pub async fn update<B, T>(&self, id: impl Display, body: &B) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.client
            .put(&self.item_path(id), serde_json::to_value(body)?)
            .await
    }

    pub async fn delete(&self, id: impl Display) -> Result<(), ApiError> {
        self.client.delete(&self.item_path(id)).await
    }
}

impl ApiClient {
    pub fn resource<'a>(&'a self, path: &'a str) -> Resource<'a> {
        Resource::new(self, path)
    }

    pub fn employees(&self) -> Resource<'_> {
        self.resource(EMPLOYEES)
    }

    pub fn users(&self) -> Resource<'_> {
        self.resource(USERS)
    }

    pub fn roles(&self) -> Resource<'_> {
        self.resource(ROLES)
    }

    pub fn permissions(&self) -> Resource<'_> {
        self.resource(PERMISSIONS)
    }

    pub fn departments(&self) -> Resource<'_> {
        self.resource(DEPARTMENTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::tests::{harness, FakeBackend};
    use crate::auth::TokenPair;

    #[test]
    fn test_item_paths() {
        let h = harness(FakeBackend::refreshing_to(TokenPair::new("A1", "R1")), None);
        let api = ApiClient::new("http://127.0.0.1:8000", reqwest::Client::new(), h.session);

        assert_eq!(api.employees().path(), "/api/employees");
        assert_eq!(api.departments().path(), DEPARTMENTS);
        assert_eq!(api.roles().item_path(7), "/api/roles/7");
        assert_eq!(api.resource("/api/wards").item_path("icu"), "/api/wards/icu");
    }
}
