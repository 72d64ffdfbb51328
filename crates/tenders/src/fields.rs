use serde::{Deserialize, Serialize};

use tenderflow_core::{DomainError, DomainResult};

use crate::ServiceType;

pub const NAME_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 500;

/// The user-editable content of a tender.
///
/// These are exactly the values a revision captures and a rollback restores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderFields {
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
}

impl TenderFields {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        service_type: ServiceType,
    ) -> DomainResult<Self> {
        let fields = Self {
            name: name.into(),
            description: description.into(),
            service_type,
        };
        fields.validate()?;
        Ok(fields)
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_text("name", &self.name, NAME_MAX_LEN)?;
        validate_text("description", &self.description, DESCRIPTION_MAX_LEN)
    }
}

/// A partial edit: `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub service_type: Option<ServiceType>,
}

impl TenderPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.service_type.is_none()
    }

    /// Merge onto `current` and validate the result.
    pub fn apply_to(&self, current: &TenderFields) -> DomainResult<TenderFields> {
        if self.is_empty() {
            return Err(DomainError::validation(
                "edit must change at least one of: name, description, serviceType",
            ));
        }

        let merged = TenderFields {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            service_type: self.service_type.unwrap_or(current.service_type),
        };
        merged.validate()?;
        Ok(merged)
    }
}

pub(crate) fn validate_text(field: &str, value: &str, max_len: usize) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> TenderFields {
        TenderFields::new("Road repair", "Resurface 2km", ServiceType::Construction).unwrap()
    }

    #[test]
    fn rejects_blank_name() {
        let err = TenderFields::new("   ", "desc", ServiceType::Delivery).unwrap_err();
        assert_eq!(err, DomainError::validation("name must not be empty"));
    }

    #[test]
    fn length_limits_count_characters_not_bytes() {
        // 100 two-byte characters is still within the limit.
        let name = "я".repeat(NAME_MAX_LEN);
        assert!(TenderFields::new(name, "desc", ServiceType::Delivery).is_ok());

        let too_long = "x".repeat(DESCRIPTION_MAX_LEN + 1);
        assert!(TenderFields::new("n", too_long, ServiceType::Delivery).is_err());
    }

    #[test]
    fn patch_keeps_unspecified_fields() {
        let patch = TenderPatch {
            description: Some("Resurface 3km".to_string()),
            ..TenderPatch::default()
        };
        let merged = patch.apply_to(&fields()).unwrap();
        assert_eq!(merged.name, "Road repair");
        assert_eq!(merged.description, "Resurface 3km");
        assert_eq!(merged.service_type, ServiceType::Construction);
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(TenderPatch::default().apply_to(&fields()).is_err());
    }

    #[test]
    fn patch_result_is_validated() {
        let patch = TenderPatch {
            name: Some(String::new()),
            ..TenderPatch::default()
        };
        assert!(patch.apply_to(&fields()).is_err());
    }
}
