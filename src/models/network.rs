// Network throughput model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkRate {
    #[serde(rename = "interface")]
    pub name: String,
    #[serde(rename = "rx_MiBs")]
    pub rx_mibs: f64,
    #[serde(rename = "tx_MiBs")]
    pub tx_mibs: f64,
    #[serde(rename = "rx_Mbps")]
    pub rx_mbps: f64,
    #[serde(rename = "tx_Mbps")]
    pub tx_mbps: f64,
}

impl NetworkRate {
    /// A zero rate for `name`, used when no sample could be taken.
    pub fn idle(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}
