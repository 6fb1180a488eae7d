use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STATUS_ALIVE: &str = "ALIVE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Document stored in each member node. The layout is fixed and versionless;
/// `additionalEndpoints` is always written empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPayload {
    pub service_endpoint: ServiceEndpoint,
    pub additional_endpoints: BTreeMap<String, ServiceEndpoint>,
    pub status: String,
}

impl MemberPayload {
    pub fn alive(endpoint: &ServiceEndpoint) -> Self {
        Self {
            service_endpoint: endpoint.clone(),
            additional_endpoints: BTreeMap::new(),
            status: STATUS_ALIVE.to_string(),
        }
    }

    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
