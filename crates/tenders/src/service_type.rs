use core::str::FromStr;

use serde::{Deserialize, Serialize};

use tenderflow_core::DomainError;

/// Category of work a tender procures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    Construction,
    Delivery,
    Manufacture,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [
        ServiceType::Construction,
        ServiceType::Delivery,
        ServiceType::Manufacture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Construction => "Construction",
            ServiceType::Delivery => "Delivery",
            ServiceType::Manufacture => "Manufacture",
        }
    }
}

impl core::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ServiceType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown service type '{wanted}' (expected one of: Construction, Delivery, Manufacture)"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignores_case() {
        assert_eq!("construction".parse::<ServiceType>().unwrap(), ServiceType::Construction);
        assert_eq!("DELIVERY".parse::<ServiceType>().unwrap(), ServiceType::Delivery);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!("Catering".parse::<ServiceType>().is_err());
    }
}
