//! ABO/Rh blood types and the donor compatibility table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One of the eight ABO/Rh blood types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BloodType {
    /// A positive.
    #[serde(rename = "A+")]
    APositive,
    /// A negative.
    #[serde(rename = "A-")]
    ANegative,
    /// B positive.
    #[serde(rename = "B+")]
    BPositive,
    /// B negative.
    #[serde(rename = "B-")]
    BNegative,
    /// AB positive, the universal recipient.
    #[serde(rename = "AB+")]
    AbPositive,
    /// AB negative.
    #[serde(rename = "AB-")]
    AbNegative,
    /// O positive.
    #[serde(rename = "O+")]
    OPositive,
    /// O negative, the universal donor.
    #[serde(rename = "O-")]
    ONegative,
}

/// All eight blood types, in the conventional listing order.
pub const ALL_BLOOD_TYPES: [BloodType; 8] = [
    BloodType::APositive,
    BloodType::ANegative,
    BloodType::BPositive,
    BloodType::BNegative,
    BloodType::AbPositive,
    BloodType::AbNegative,
    BloodType::OPositive,
    BloodType::ONegative,
];

/// Parse failure for [`BloodType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised blood type: {value}")]
pub struct BloodTypeParseError {
    /// The rejected input.
    pub value: String,
}

impl BloodType {
    /// Canonical string form, e.g. `"AB+"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }

    /// Donor blood types that may legally donate to this recipient type.
    ///
    /// This is the fixed universal donor/recipient table; it is static domain
    /// knowledge and never derived at runtime. The table is total over the
    /// enum, so unknown inputs can only arise at parse time and are handled
    /// there.
    pub const fn compatible_donors(self) -> &'static [BloodType] {
        match self {
            Self::APositive => &[
                Self::APositive,
                Self::ANegative,
                Self::OPositive,
                Self::ONegative,
            ],
            Self::ANegative => &[Self::ANegative, Self::ONegative],
            Self::BPositive => &[
                Self::BPositive,
                Self::BNegative,
                Self::OPositive,
                Self::ONegative,
            ],
            Self::BNegative => &[Self::BNegative, Self::ONegative],
            Self::AbPositive => &[
                Self::APositive,
                Self::ANegative,
                Self::BPositive,
                Self::BNegative,
                Self::AbPositive,
                Self::AbNegative,
                Self::OPositive,
                Self::ONegative,
            ],
            Self::AbNegative => &[
                Self::ANegative,
                Self::BNegative,
                Self::AbNegative,
                Self::ONegative,
            ],
            Self::OPositive => &[Self::OPositive, Self::ONegative],
            Self::ONegative => &[Self::ONegative],
        }
    }

    /// Whether a donor of type `donor` may donate to this recipient type.
    pub fn accepts(self, donor: BloodType) -> bool {
        self.compatible_donors().contains(&donor)
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = BloodTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A+" => Ok(Self::APositive),
            "A-" => Ok(Self::ANegative),
            "B+" => Ok(Self::BPositive),
            "B-" => Ok(Self::BNegative),
            "AB+" => Ok(Self::AbPositive),
            "AB-" => Ok(Self::AbNegative),
            "O+" => Ok(Self::OPositive),
            "O-" => Ok(Self::ONegative),
            other => Err(BloodTypeParseError {
                value: other.to_owned(),
            }),
        }
    }
}
