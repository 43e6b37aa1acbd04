//! Machine sizes and the dimensions rules scale by.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const MB_PER_GB: Decimal = dec!(1024);

/// Machine size an instance runs at. Shared by reference across history entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub name: String,
    pub identifier: String,
    pub cpu: u32,
    /// RAM in MB.
    pub ram: u32,
    /// Disk in GB.
    pub disk: u32,
}

impl Size {
    pub fn new(
        name: impl Into<String>,
        identifier: impl Into<String>,
        cpu: u32,
        ram: u32,
        disk: u32,
    ) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
            cpu,
            ram,
            disk,
        }
    }

    pub fn ram_gb(&self) -> Decimal {
        Decimal::from(self.ram) / MB_PER_GB
    }

    pub fn attribute(&self, attribute: SizeAttribute) -> Decimal {
        match attribute {
            SizeAttribute::Cpu => Decimal::from(self.cpu),
            SizeAttribute::Ram => self.ram_gb(),
            SizeAttribute::Disk => Decimal::from(self.disk),
        }
    }
}

/// Size dimension a multiplier rule scales by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeAttribute {
    Cpu,
    /// RAM in GB.
    Ram,
    /// Disk in GB.
    Disk,
}

impl SizeAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Ram => "ram",
            Self::Disk => "disk",
        }
    }

    /// Most decimal places [`Size::attribute`] yields for this dimension.
    pub fn decimal_places(&self) -> u32 {
        match self {
            // MB / 1024 terminates within ten places.
            Self::Ram => 10,
            Self::Cpu | Self::Disk => 0,
        }
    }
}

impl std::fmt::Display for SizeAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_attributes() {
        let size = Size::new("Small Fry", "test.small", 2, 4096, 60);
        assert_eq!(size.attribute(SizeAttribute::Cpu), dec!(2));
        assert_eq!(size.attribute(SizeAttribute::Ram), dec!(4));
        assert_eq!(size.attribute(SizeAttribute::Disk), dec!(60));
    }

    #[test]
    fn test_fractional_ram() {
        let size = Size::new("Odd", "test.odd", 1, 1536, 0);
        assert_eq!(size.ram_gb(), dec!(1.5));

        let smallest = Size::new("Odd", "test.odd", 1, 1, 0);
        assert_eq!(smallest.ram_gb(), dec!(0.0009765625));
        assert_eq!(
            smallest.ram_gb().normalize().scale(),
            SizeAttribute::Ram.decimal_places()
        );
    }
}
