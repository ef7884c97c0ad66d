// Byte-size prefixes (decimal K/M/G..., binary Ki/Mi/Gi...) and conversions between them

use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

pub const BYTE: &str = "B";
pub const KIBI: &str = "Ki";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("unknown unit {0:?}")]
    UnknownUnit(String),
    #[error("invalid size {0:?}")]
    InvalidSize(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitPrefix {
    pub label: &'static str,
    pub exponent: i32,
    /// Base 1024 when true, base 1000 otherwise.
    pub binary: bool,
}

impl UnitPrefix {
    const fn decimal(label: &'static str, exponent: i32) -> Self {
        Self {
            label,
            exponent,
            binary: false,
        }
    }

    const fn binary(label: &'static str, exponent: i32) -> Self {
        Self {
            label,
            exponent,
            binary: true,
        }
    }

    /// Size of one unit, in bytes.
    fn magnitude(self) -> f64 {
        let base: f64 = if self.binary { 1024.0 } else { 1000.0 };
        base.powi(self.exponent)
    }
}

const PREFIXES: [UnitPrefix; 17] = [
    UnitPrefix::binary(BYTE, 0),
    UnitPrefix::decimal("K", 1),
    UnitPrefix::decimal("M", 2),
    UnitPrefix::decimal("G", 3),
    UnitPrefix::decimal("T", 4),
    UnitPrefix::decimal("P", 5),
    UnitPrefix::decimal("E", 6),
    UnitPrefix::decimal("Z", 7),
    UnitPrefix::decimal("Y", 8),
    UnitPrefix::binary(KIBI, 1),
    UnitPrefix::binary("Mi", 2),
    UnitPrefix::binary("Gi", 3),
    UnitPrefix::binary("Ti", 4),
    UnitPrefix::binary("Pi", 5),
    UnitPrefix::binary("Ei", 6),
    UnitPrefix::binary("Zi", 7),
    UnitPrefix::binary("Yi", 8),
];

/// Multiplicative ratio for every (from, to) pair whose bases differ.
static CROSS_FAMILY_RATIOS: LazyLock<HashMap<(&'static str, &'static str), f64>> =
    LazyLock::new(|| {
        let mut ratios = HashMap::new();
        for from in PREFIXES {
            for to in PREFIXES.iter().filter(|to| to.binary != from.binary) {
                ratios.insert((from.label, to.label), from.magnitude() / to.magnitude());
            }
        }
        ratios
    });

/// Looks up a prefix by label ("B", "K", "Mi", ...).
pub fn prefix(label: &str) -> Result<UnitPrefix, UnitError> {
    PREFIXES
        .iter()
        .copied()
        .find(|p| p.label == label)
        .ok_or_else(|| UnitError::UnknownUnit(label.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scale {
    PowerOfTwo(i32),
    PowerOfTen(i32),
    Ratio(f64),
}

/// Converts magnitudes from one unit to another. Built once, applied per sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeConverter {
    scale: Scale,
    to_bytes: bool,
}

impl SizeConverter {
    pub fn new(from: &str, to: &str) -> Result<Self, UnitError> {
        let from = prefix(from)?;
        let to = prefix(to)?;
        let scale = match (from.binary, to.binary) {
            (true, true) => Scale::PowerOfTwo(10 * (from.exponent - to.exponent)),
            (false, false) => Scale::PowerOfTen(3 * (from.exponent - to.exponent)),
            _ => Scale::Ratio(
                CROSS_FAMILY_RATIOS
                    .get(&(from.label, to.label))
                    .copied()
                    .ok_or_else(|| UnitError::UnknownUnit(format!("{}->{}", from.label, to.label)))?,
            ),
        };
        Ok(Self {
            scale,
            to_bytes: to.exponent == 0,
        })
    }

    pub fn convert(&self, value: f64) -> f64 {
        let converted = match self.scale {
            Scale::PowerOfTwo(shift) => value * 2f64.powi(shift),
            Scale::PowerOfTen(exp) if exp >= 0 => value * 10f64.powi(exp),
            Scale::PowerOfTen(exp) => value / 10f64.powi(-exp),
            Scale::Ratio(ratio) => value * ratio,
        };
        // Byte counts are integral.
        if self.to_bytes {
            converted.round()
        } else {
            converted
        }
    }
}

/// Parses a `zfs list` size ("12.5G", "93K", "100B", "0") into bytes.
/// ZFS prints binary-scaled values with single decimal-looking letters.
pub fn parse_zfs_size(size: &str) -> Result<f64, UnitError> {
    let size = size.trim();
    let invalid = || UnitError::InvalidSize(size.to_string());
    let (mantissa, letter) = match size.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&size[..i], Some(c.to_ascii_uppercase())),
        Some(_) => (size, None),
        None => return Err(invalid()),
    };
    let mantissa: f64 = mantissa.parse().map_err(|_| invalid())?;
    let from = match letter {
        None | Some('B') => BYTE.to_string(),
        Some(c) => format!("{c}i"),
    };
    Ok(SizeConverter::new(&from, BYTE)?.convert(mantissa))
}

/// Throughput units a bytes-per-second rate is presented in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUnit {
    /// MiB/s, base 1024.
    MebibytesPerSecond,
    /// Mbps, decimal megabits.
    MegabitsPerSecond,
}

impl RateUnit {
    pub fn from_bytes_per_second(self, rate: f64) -> f64 {
        match self {
            RateUnit::MebibytesPerSecond => rate * 2f64.powi(-20),
            RateUnit::MegabitsPerSecond => rate * 8.0 / 1_000_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_enough(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn conversion_table_cases() {
        let cases = [
            ("M", "G", 1000.0, 1.0),
            ("G", "M", 1.0, 1000.0),
            ("K", "M", 1000.0, 1.0),
            ("Mi", "Gi", 1024.0, 1.0),
            ("Gi", "Mi", 1.0, 1024.0),
            ("Ki", "Mi", 1024.0, 1.0),
            ("Gi", "Ki", 2.8, 2936012.8),
            ("G", "Gi", 1.0, 0.931322574615478515625),
            ("M", "Gi", 1600.0, 1.4901161193847656),
            ("G", "Ki", 1.11, 1083984.375),
            ("Gi", "G", 32.0, 34.359738368),
            ("Mi", "M", 1.78, 1.86646528),
            ("Y", "Pi", 0.522200000262, 463806771.0001081),
            ("M", "M", 123.45, 123.45),
            ("Mi", "Mi", 123.45, 123.45),
            ("Gi", "B", 1.760422268882, 1890239018.0),
            ("G", "B", 77.973234914, 77973234914.0),
        ];
        for (from, to, input, expected) in cases {
            let got = SizeConverter::new(from, to).unwrap().convert(input);
            assert!(
                close_enough(got, expected),
                "{from} -> {to}: input={input} expected={expected} got={got}"
            );
        }
    }

    #[test]
    fn conversion_there_and_back_returns_original() {
        let labels: Vec<&str> = PREFIXES
            .iter()
            .map(|p| p.label)
            .filter(|l| *l != BYTE)
            .collect();
        for from in &labels {
            for to in &labels {
                let there = SizeConverter::new(from, to).unwrap();
                let back = SizeConverter::new(to, from).unwrap();
                let value = 123.456;
                let got = back.convert(there.convert(value));
                assert!(close_enough(got, value), "{from} <-> {to}: {got}");
            }
        }
    }

    #[test]
    fn binary_shift_is_exact() {
        let c = SizeConverter::new("Ki", "Gi").unwrap();
        assert_eq!(c.convert(3.0 * 1024.0 * 1024.0), 3.0);
    }

    #[test]
    fn zero_and_negative_pass_through() {
        let c = SizeConverter::new("G", "Gi").unwrap();
        assert_eq!(c.convert(0.0), 0.0);
        assert!(c.convert(-1.0) < 0.0);
    }

    #[test]
    fn unknown_unit_is_rejected() {
        assert_eq!(
            SizeConverter::new("Gb", "Mi").unwrap_err(),
            UnitError::UnknownUnit("Gb".into())
        );
    }

    #[test]
    fn zfs_sizes_are_binary_scaled() {
        assert_eq!(parse_zfs_size("12.5G").unwrap(), 13421772800.0);
        assert_eq!(parse_zfs_size("230.5T").unwrap(), 253437430202368.0);
        assert_eq!(parse_zfs_size("130.50M").unwrap(), 136839168.0);
        assert_eq!(parse_zfs_size("93K").unwrap(), 95232.0);
        assert_eq!(parse_zfs_size("100B").unwrap(), 100.0);
        assert_eq!(parse_zfs_size("0").unwrap(), 0.0);
    }

    #[test]
    fn zfs_size_rejects_garbage() {
        assert!(parse_zfs_size("").is_err());
        assert!(parse_zfs_size("-").is_err());
        assert!(parse_zfs_size("abcG").is_err());
        assert!(parse_zfs_size("12X").is_err());
    }

    #[test]
    fn rate_units_are_independent() {
        let rate = 1_048_576.0;
        assert_eq!(RateUnit::MebibytesPerSecond.from_bytes_per_second(rate), 1.0);
        assert!(close_enough(
            RateUnit::MegabitsPerSecond.from_bytes_per_second(rate),
            8.388608
        ));
    }
}
