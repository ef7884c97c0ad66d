// Per-disk metadata from the host-maintained disks.ini

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, error, warn};

use super::read_source;

pub const DISKS_INI: &str = "/var/local/emhttp/disks.ini";
/// `temp` value meaning the drive reports no temperature (usually spun down).
const TEMP_UNAVAILABLE: &str = "*";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryEntry {
    pub id: String,
    /// Degrees Celsius, 0 when unavailable.
    pub temp: u64,
    pub spun_down: bool,
}

impl InventoryEntry {
    pub fn is_spinning(&self) -> bool {
        !self.spun_down
    }
}

/// Entries keyed by disk name ("disk1", "cache", "parity2"...), sorted.
pub type Inventory = BTreeMap<String, InventoryEntry>;

/// Reads the inventory fresh. Any failure yields an empty inventory.
pub async fn fetch_inventory(path: &Path) -> Inventory {
    match read_source(path).await {
        Ok(content) => parse_inventory(&content),
        Err(e) => {
            error!(error = %e, "Disk unable to read inventory");
            Inventory::new()
        }
    }
}

pub fn parse_inventory(content: &str) -> Inventory {
    let mut sections: Vec<(String, HashMap<String, String>)> = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            sections.push((unquote(header).to_string(), HashMap::new()));
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            debug!(line, "Disk inventory line without key=value");
            continue;
        };
        // Keys before the first section have nowhere to go.
        if let Some((_, keys)) = sections.last_mut() {
            keys.insert(key.trim().to_string(), unquote(value).to_string());
        }
    }

    sections
        .into_iter()
        .filter_map(|(name, keys)| entry_from_section(&name, &keys).map(|entry| (name, entry)))
        .collect()
}

fn entry_from_section(name: &str, keys: &HashMap<String, String>) -> Option<InventoryEntry> {
    let key = |k: &str| {
        let value = keys.get(k);
        if value.is_none() {
            error!(section = name, key = k, "Disk inventory section missing key");
        }
        value
    };
    let id = key("id")?;
    let temp = key("temp")?;
    let spundown = key("spundown")?;

    let temp = if temp == TEMP_UNAVAILABLE {
        debug!(disk = name, "Disk temperature unavailable");
        0
    } else {
        temp.parse::<u64>().unwrap_or_else(|e| {
            warn!(disk = name, temp = %temp, error = %e, "Disk unable to parse temperature");
            0
        })
    };

    Some(InventoryEntry {
        id: id.clone(),
        temp,
        spun_down: spundown == "1",
    })
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISKS: &str = r#"
["parity"]
idx="0"
name="parity"
id="WDC_WD80EFAX_1"
temp="34"
spundown="0"
["disk1"]
name="disk1"
id="ST4000VN008_2"
temp="*"
spundown="1"
["cache"]
id="Samsung_SSD_3"
temp="41"
spundown="0"
["broken"]
id="NO_TEMP_KEY"
spundown="0"
["weird"]
id="X"
temp="hot"
spundown="0"
"#;

    #[test]
    fn parses_quoted_sections_and_values() {
        let inv = parse_inventory(DISKS);
        let parity = &inv["parity"];
        assert_eq!(parity.id, "WDC_WD80EFAX_1");
        assert_eq!(parity.temp, 34);
        assert!(parity.is_spinning());
    }

    #[test]
    fn unavailable_temperature_is_zero_and_spundown_flag_is_read() {
        let inv = parse_inventory(DISKS);
        let disk1 = &inv["disk1"];
        assert_eq!(disk1.temp, 0);
        assert!(disk1.spun_down);
        assert!(!disk1.is_spinning());
    }

    #[test]
    fn section_missing_a_key_is_skipped() {
        let inv = parse_inventory(DISKS);
        assert!(!inv.contains_key("broken"));
    }

    #[test]
    fn unparseable_temperature_keeps_the_entry() {
        let inv = parse_inventory(DISKS);
        assert_eq!(inv["weird"].temp, 0);
        assert_eq!(inv["weird"].id, "X");
    }

    #[test]
    fn keys_are_sorted_by_name() {
        let inv = parse_inventory(DISKS);
        let names: Vec<&str> = inv.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["cache", "disk1", "parity", "weird"]);
    }

    #[test]
    fn unquoted_ini_is_accepted() {
        let inv = parse_inventory("[disk2]\nid = ABC\ntemp = 30\nspundown = 0\n");
        assert_eq!(inv["disk2"].id, "ABC");
        assert_eq!(inv["disk2"].temp, 30);
    }

    #[test]
    fn empty_content_is_empty_inventory() {
        assert!(parse_inventory("").is_empty());
    }
}
