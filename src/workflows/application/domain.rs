use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Country of residence offered by the application form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "United States")]
    UnitedStates,
    #[serde(rename = "United Kingdom")]
    UnitedKingdom,
    Canada,
    Australia,
    Germany,
    France,
    #[serde(rename = "United Arab Emirates")]
    UnitedArabEmirates,
    Singapore,
    Netherlands,
    Sweden,
    Switzerland,
    Spain,
    Italy,
    Ireland,
    Other,
}

impl Country {
    pub const fn ordered() -> [Self; 15] {
        [
            Self::UnitedStates,
            Self::UnitedKingdom,
            Self::Canada,
            Self::Australia,
            Self::Germany,
            Self::France,
            Self::UnitedArabEmirates,
            Self::Singapore,
            Self::Netherlands,
            Self::Sweden,
            Self::Switzerland,
            Self::Spain,
            Self::Italy,
            Self::Ireland,
            Self::Other,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::UnitedStates => "United States",
            Self::UnitedKingdom => "United Kingdom",
            Self::Canada => "Canada",
            Self::Australia => "Australia",
            Self::Germany => "Germany",
            Self::France => "France",
            Self::UnitedArabEmirates => "United Arab Emirates",
            Self::Singapore => "Singapore",
            Self::Netherlands => "Netherlands",
            Self::Sweden => "Sweden",
            Self::Switzerland => "Switzerland",
            Self::Spain => "Spain",
            Self::Italy => "Italy",
            Self::Ireland => "Ireland",
            Self::Other => "Other",
        }
    }
}

/// Years of closing experience bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExperienceYears {
    #[serde(rename = "1-2 years")]
    OneToTwo,
    #[serde(rename = "2-4 years")]
    TwoToFour,
    #[serde(rename = "4+ years")]
    FourPlus,
}

impl ExperienceYears {
    pub const fn ordered() -> [Self; 3] {
        [Self::OneToTwo, Self::TwoToFour, Self::FourPlus]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::OneToTwo => "1-2 years",
            Self::TwoToFour => "2-4 years",
            Self::FourPlus => "4+ years",
        }
    }
}

/// Kinds of closing work an applicant can claim; several may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExperienceType {
    #[serde(rename = "High-ticket closing")]
    HighTicketClosing,
    #[serde(rename = "Commission-only roles")]
    CommissionOnlyRoles,
    #[serde(rename = "DM closing")]
    DmClosing,
    #[serde(rename = "Call closing")]
    CallClosing,
}

impl ExperienceType {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::HighTicketClosing,
            Self::CommissionOnlyRoles,
            Self::DmClosing,
            Self::CallClosing,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HighTicketClosing => "High-ticket closing",
            Self::CommissionOnlyRoles => "Commission-only roles",
            Self::DmClosing => "DM closing",
            Self::CallClosing => "Call closing",
        }
    }
}

/// Average deal size closed, in dollar buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DealSize {
    #[serde(rename = "Under $1,000")]
    UnderOneThousand,
    #[serde(rename = "$1,000 – $3,000")]
    OneToThreeThousand,
    #[serde(rename = "$3,000 – $5,000")]
    ThreeToFiveThousand,
    #[serde(rename = "$5,000+")]
    FiveThousandPlus,
}

impl DealSize {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::UnderOneThousand,
            Self::OneToThreeThousand,
            Self::ThreeToFiveThousand,
            Self::FiveThousandPlus,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::UnderOneThousand => "Under $1,000",
            Self::OneToThreeThousand => "$1,000 – $3,000",
            Self::ThreeToFiveThousand => "$3,000 – $5,000",
            Self::FiveThousandPlus => "$5,000+",
        }
    }
}

/// Answer to "Have you ever worked without a fixed salary?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionAnswer {
    Yes,
    No,
}

impl CommissionAnswer {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

macro_rules! display_via_label {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }
        )+
    };
}

display_via_label!(
    Country,
    ExperienceYears,
    ExperienceType,
    DealSize,
    CommissionAnswer
);

/// Draft of answers collected for one form session.
///
/// Serialized with the same camelCase keys the landing page posts, so a sink can forward
/// the record untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub first_name: String,
    pub last_name: String,
    pub country: Option<Country>,
    pub phone_number: String,
    pub instagram_url: String,
    pub experience_years: Option<ExperienceYears>,
    pub experience_types: BTreeSet<ExperienceType>,
    pub avg_deal_size: Option<DealSize>,
    pub worked_commission_only: Option<CommissionAnswer>,
    pub why_consider: String,
}

impl Application {
    /// Overwrite a single field. Last write wins.
    pub fn apply(&mut self, field: FormField) {
        match field {
            FormField::FirstName(value) => self.first_name = value,
            FormField::LastName(value) => self.last_name = value,
            FormField::Country(value) => self.country = Some(value),
            FormField::PhoneNumber(value) => self.phone_number = value,
            FormField::InstagramUrl(value) => self.instagram_url = value,
            FormField::ExperienceYears(value) => self.experience_years = Some(value),
            FormField::AvgDealSize(value) => self.avg_deal_size = Some(value),
            FormField::WhyConsider(value) => self.why_consider = value,
        }
    }

    /// Flip membership of `value`; returns whether it is selected afterwards.
    pub fn toggle_experience_type(&mut self, value: ExperienceType) -> bool {
        if self.experience_types.remove(&value) {
            false
        } else {
            self.experience_types.insert(value);
            true
        }
    }
}

/// Typed update for one text or single-choice field of the draft.
///
/// On the wire this is `{"field": "firstName", "value": "Jane"}`; values outside a field's
/// option list fail to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FormField {
    FirstName(String),
    LastName(String),
    Country(Country),
    PhoneNumber(String),
    InstagramUrl(String),
    ExperienceYears(ExperienceYears),
    AvgDealSize(DealSize),
    WhyConsider(String),
}

impl FormField {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FirstName(_) => "firstName",
            Self::LastName(_) => "lastName",
            Self::Country(_) => "country",
            Self::PhoneNumber(_) => "phoneNumber",
            Self::InstagramUrl(_) => "instagramUrl",
            Self::ExperienceYears(_) => "experienceYears",
            Self::AvgDealSize(_) => "avgDealSize",
            Self::WhyConsider(_) => "whyConsider",
        }
    }
}

/// Static option lists rendered by the form's selects and checkboxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormOptions {
    pub countries: Vec<&'static str>,
    pub experience_years: Vec<&'static str>,
    pub experience_types: Vec<&'static str>,
    pub deal_sizes: Vec<&'static str>,
}

impl FormOptions {
    pub fn standard() -> Self {
        Self {
            countries: Country::ordered().iter().map(|c| c.label()).collect(),
            experience_years: ExperienceYears::ordered()
                .iter()
                .map(|years| years.label())
                .collect(),
            experience_types: ExperienceType::ordered()
                .iter()
                .map(|kind| kind.label())
                .collect(),
            deal_sizes: DealSize::ordered().iter().map(|size| size.label()).collect(),
        }
    }
}
