//! `getInstancePool` response payloads
//!
//! Only the fields needed to extract member addresses are modelled.

use serde::Deserialize;
use std::net::IpAddr;

/// Top-level envelope: `{"getinstancepoolresponse": {...}}`
#[derive(Debug, Deserialize)]
pub struct GetInstancePoolEnvelope {
    #[serde(rename = "getinstancepoolresponse")]
    pub response: GetInstancePoolResponse,
}

#[derive(Debug, Default, Deserialize)]
pub struct GetInstancePoolResponse {
    #[serde(default, rename = "instancepool")]
    pub instance_pools: Vec<InstancePool>,
}

#[derive(Debug, Deserialize)]
pub struct InstancePool {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, rename = "virtualmachines")]
    pub virtual_machines: Vec<VirtualMachine>,
}

#[derive(Debug, Deserialize)]
pub struct VirtualMachine {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nic: Vec<Nic>,
}

impl VirtualMachine {
    /// Address of the default (first) NIC
    pub fn default_ip(&self) -> Option<IpAddr> {
        self.nic.first().and_then(|nic| nic.ip_address)
    }

    /// Identifier for logs
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("<unknown>")
    }
}

#[derive(Debug, Deserialize)]
pub struct Nic {
    #[serde(default, rename = "ipaddress")]
    pub ip_address: Option<IpAddr>,
}

/// Extract `errortext` from an API error body
///
/// Error bodies look like `{"<command>response": {"errorcode": 431,
/// "errortext": "..."}}` or `{"errorresponse": {...}}`.
pub fn api_error_text(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .as_object()?
        .values()
        .find_map(|inner| inner.get("errortext")?.as_str().map(str::to_string))
}
