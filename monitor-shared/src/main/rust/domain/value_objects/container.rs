use serde::{Deserialize, Serialize};

/// Short container ids are the first 12 hex characters
pub const SHORT_ID_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockerContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
    pub state: String,
    #[serde(default)]
    pub ports: Vec<ContainerPort>,
    pub created: String,
    #[serde(default)]
    pub started: Option<String>,
}

impl DockerContainer {
    pub fn short_id(id: &str) -> &str {
        match id.char_indices().nth(SHORT_ID_LEN) {
            Some((idx, _)) => &id[..idx],
            None => id,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == "running"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub private_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_port: Option<u16>,
    #[serde(rename = "type")]
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerStats {
    pub id: String,
    pub name: String,
    pub cpu: ContainerCpu,
    pub memory: ContainerMemory,
    pub network: ContainerTraffic,
    pub io: ContainerIo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerCpu {
    pub usage: u32,
    pub system: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerMemory {
    pub usage: u64,
    pub limit: u64,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerTraffic {
    pub rx: u64,
    pub tx: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerIo {
    pub read: u64,
    pub write: u64,
}
