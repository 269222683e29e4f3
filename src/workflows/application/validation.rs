use serde::Serialize;

use super::domain::Application;

/// Required fields, in the order the form checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredField {
    FirstName,
    LastName,
    Country,
    PhoneNumber,
    InstagramUrl,
    ExperienceYears,
    AvgDealSize,
    WorkedCommissionOnly,
    WhyConsider,
}

impl RequiredField {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::FirstName,
            Self::LastName,
            Self::Country,
            Self::PhoneNumber,
            Self::InstagramUrl,
            Self::ExperienceYears,
            Self::AvgDealSize,
            Self::WorkedCommissionOnly,
            Self::WhyConsider,
        ]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Country => "country",
            Self::PhoneNumber => "phoneNumber",
            Self::InstagramUrl => "instagramUrl",
            Self::ExperienceYears => "experienceYears",
            Self::AvgDealSize => "avgDealSize",
            Self::WorkedCommissionOnly => "workedCommissionOnly",
            Self::WhyConsider => "whyConsider",
        }
    }

    // Text counts as present when non-empty; whitespace is not trimmed.
    fn is_present(self, application: &Application) -> bool {
        match self {
            Self::FirstName => !application.first_name.is_empty(),
            Self::LastName => !application.last_name.is_empty(),
            Self::Country => application.country.is_some(),
            Self::PhoneNumber => !application.phone_number.is_empty(),
            Self::InstagramUrl => !application.instagram_url.is_empty(),
            Self::ExperienceYears => application.experience_years.is_some(),
            Self::AvgDealSize => application.avg_deal_size.is_some(),
            Self::WorkedCommissionOnly => application.worked_commission_only.is_some(),
            Self::WhyConsider => !application.why_consider.is_empty(),
        }
    }
}

/// Raised when a submit attempt finds the draft incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {}", .0.name())]
    MissingRequiredField(RequiredField),
    #[error("no experience type selected")]
    NoExperienceType,
}

impl ValidationError {
    /// Message shown above the submit button.
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::MissingRequiredField(_) => "All fields are required.",
            Self::NoExperienceType => "Please select at least one type of experience.",
        }
    }
}

/// Every required field still missing from the draft, in check order.
pub fn missing_fields(application: &Application) -> Vec<RequiredField> {
    RequiredField::ordered()
        .into_iter()
        .filter(|field| !field.is_present(application))
        .collect()
}

/// Completeness check run at submit time.
///
/// Eligibility is not checked here: a "no" on the commission question is a complete answer.
pub fn validate(application: &Application) -> Result<(), ValidationError> {
    if let Some(field) = RequiredField::ordered()
        .into_iter()
        .find(|field| !field.is_present(application))
    {
        return Err(ValidationError::MissingRequiredField(field));
    }

    if application.experience_types.is_empty() {
        return Err(ValidationError::NoExperienceType);
    }

    Ok(())
}
