//! Region keys used to partition records into output folders.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Width applied to region keys when a schema does not override it.
pub const DEFAULT_REGION_WIDTH: usize = 2;

/// A validated, zero-padded region code such as a state FIPS code.
///
/// The key doubles as the output folder name, the GeoJSON file stem and the
/// recipe layer name, so it only ever contains ASCII alphanumerics.
///
/// # Examples
/// ```
/// use tileprep_core::RegionKey;
///
/// let key = RegionKey::parse(" 6 ", 2)?;
/// assert_eq!(key.as_str(), "06");
/// # Ok::<(), tileprep_core::RegionKeyError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RegionKey(String);

/// Reasons a raw value cannot become a [`RegionKey`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegionKeyError {
    /// The value was empty after trimming.
    #[error("region key is empty")]
    Empty,
    /// The value is wider than the configured key width.
    #[error("region key {value:?} exceeds {width} characters")]
    TooLong { value: String, width: usize },
    /// The value contains characters other than ASCII letters and digits.
    #[error("region key {value:?} contains characters other than ASCII letters and digits")]
    InvalidCharacter { value: String },
}

impl RegionKey {
    /// Validate `raw` and left-pad it with `0` to exactly `width` characters.
    pub fn parse(raw: &str, width: usize) -> Result<Self, RegionKeyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RegionKeyError::Empty);
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RegionKeyError::InvalidCharacter {
                value: trimmed.to_owned(),
            });
        }
        if trimmed.len() > width {
            return Err(RegionKeyError::TooLong {
                value: trimmed.to_owned(),
                width,
            });
        }
        Ok(Self(format!("{trimmed:0>width$}")))
    }

    /// Borrow the padded key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RegionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// State and territory names as they appear in export file names, paired
/// with their two-digit FIPS codes.
const STATE_FIPS: &[(&str, &str)] = &[
    ("Alabama", "01"),
    ("Alaska", "02"),
    ("Arizona", "04"),
    ("Arkansas", "05"),
    ("California", "06"),
    ("Colorado", "08"),
    ("Connecticut", "09"),
    ("Delaware", "10"),
    ("DistrictofColumbia", "11"),
    ("Florida", "12"),
    ("Georgia", "13"),
    ("Hawaii", "15"),
    ("Idaho", "16"),
    ("Illinois", "17"),
    ("Indiana", "18"),
    ("Iowa", "19"),
    ("Kansas", "20"),
    ("Kentucky", "21"),
    ("Louisiana", "22"),
    ("Maine", "23"),
    ("Maryland", "24"),
    ("Massachusetts", "25"),
    ("Michigan", "26"),
    ("Minnesota", "27"),
    ("Mississippi", "28"),
    ("Missouri", "29"),
    ("Montana", "30"),
    ("Nebraska", "31"),
    ("Nevada", "32"),
    ("NewHampshire", "33"),
    ("NewJersey", "34"),
    ("NewMexico", "35"),
    ("NewYork", "36"),
    ("NorthCarolina", "37"),
    ("NorthDakota", "38"),
    ("Ohio", "39"),
    ("Oklahoma", "40"),
    ("Oregon", "41"),
    ("Pennsylvania", "42"),
    ("RhodeIsland", "44"),
    ("SouthCarolina", "45"),
    ("SouthDakota", "46"),
    ("Tennessee", "47"),
    ("Texas", "48"),
    ("Utah", "49"),
    ("Vermont", "50"),
    ("Virginia", "51"),
    ("Washington", "53"),
    ("WestVirginia", "54"),
    ("Wisconsin", "55"),
    ("Wyoming", "56"),
    ("AmericanSamoa", "60"),
    ("Guam", "66"),
    ("NorthernMarianaIslands", "69"),
    ("PuertoRico", "72"),
    ("VirginIslands", "78"),
];

/// Look up the FIPS region for a state name taken from an export file name.
///
/// # Examples
/// ```
/// use tileprep_core::region::state_fips;
///
/// assert_eq!(state_fips("WestVirginia").map(|k| k.to_string()), Some("54".into()));
/// assert!(state_fips("Atlantis").is_none());
/// ```
#[must_use]
pub fn state_fips(state_name: &str) -> Option<RegionKey> {
    STATE_FIPS
        .iter()
        .find(|(name, _)| *name == state_name)
        .map(|(_, code)| RegionKey((*code).to_owned()))
}
