//! Schema versions recognised by the Engine Library format
//!
//! Hardware firmware and the desktop application have each shipped several
//! revisions of the library schema. A version is a semantic triple; 1.18.0
//! additionally exists in two variants that share the triple and differ only
//! in the declared SQL type of their boolean columns.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Variant tag for schema versions that share a version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// Player firmware flavour (boolean columns declared NUMERIC).
    Firmware,
    /// Desktop application flavour (boolean columns declared INTEGER).
    Desktop,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Firmware => "fw",
            Variant::Desktop => "ep",
        }
    }
}

/// A schema version as stated in the `Information` row of both stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub major: i64,
    pub minor: i64,
    pub patch: i64,
    pub variant: Option<Variant>,
}

impl SchemaVersion {
    pub const fn new(major: i64, minor: i64, patch: i64) -> Self {
        Self { major, minor, patch, variant: None }
    }

    pub const fn with_variant(major: i64, minor: i64, patch: i64, variant: Variant) -> Self {
        Self { major, minor, patch, variant: Some(variant) }
    }

    /// The bare version triple, used for ordering. The variant never
    /// participates in comparisons, only in equality.
    pub fn triple(&self) -> (i64, i64, i64) {
        (self.major, self.minor, self.patch)
    }

    pub fn is_at_least(&self, major: i64, minor: i64, patch: i64) -> bool {
        self.triple() >= (major, minor, patch)
    }

    /// Whether this version is in the set of recognised schema versions.
    pub fn is_supported(&self) -> bool {
        ALL_VERSIONS.contains(self)
    }

    /// Descriptive product name for a recognised version.
    pub fn name(&self) -> Option<&'static str> {
        match *self {
            v if v == VERSION_1_6_0 => Some("SC5000 Firmware 1.0.0"),
            v if v == VERSION_1_7_1 => Some("SC5000 Firmware 1.0.3"),
            v if v == VERSION_1_9_1 => Some("Engine Prime 1.1.1"),
            v if v == VERSION_1_11_1 => Some("SC5000 Firmware 1.2.0"),
            v if v == VERSION_1_13_0 => Some("SC5000 Firmware 1.2.2"),
            v if v == VERSION_1_13_1 => Some("Engine Prime 1.2.2"),
            v if v == VERSION_1_13_2 => Some("SC5000 Firmware 1.3.1"),
            v if v == VERSION_1_15_0 => Some("SC5000 Firmware 1.4.0"),
            v if v == VERSION_1_17_0 => Some("SC5000 Firmware 1.5.1/1.5.2"),
            v if v == VERSION_1_18_0_EP => Some("Engine Prime 1.5.1/1.6.0/1.6.1"),
            v if v == VERSION_1_18_0_FW => Some("SC5000 Firmware 1.6.0/1.6.1/1.6.2"),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant {
            Some(variant) => write!(
                f,
                "{}.{}.{}+{}",
                self.major,
                self.minor,
                self.patch,
                variant.as_str()
            ),
            None => write!(f, "{}.{}.{}", self.major, self.minor, self.patch),
        }
    }
}

pub const VERSION_1_6_0: SchemaVersion = SchemaVersion::new(1, 6, 0);
pub const VERSION_1_7_1: SchemaVersion = SchemaVersion::new(1, 7, 1);
pub const VERSION_1_9_1: SchemaVersion = SchemaVersion::new(1, 9, 1);
pub const VERSION_1_11_1: SchemaVersion = SchemaVersion::new(1, 11, 1);
pub const VERSION_1_13_0: SchemaVersion = SchemaVersion::new(1, 13, 0);
pub const VERSION_1_13_1: SchemaVersion = SchemaVersion::new(1, 13, 1);
pub const VERSION_1_13_2: SchemaVersion = SchemaVersion::new(1, 13, 2);
pub const VERSION_1_15_0: SchemaVersion = SchemaVersion::new(1, 15, 0);
pub const VERSION_1_17_0: SchemaVersion = SchemaVersion::new(1, 17, 0);
pub const VERSION_1_18_0_EP: SchemaVersion =
    SchemaVersion::with_variant(1, 18, 0, Variant::Desktop);
pub const VERSION_1_18_0_FW: SchemaVersion =
    SchemaVersion::with_variant(1, 18, 0, Variant::Firmware);

/// Every schema version this crate can create and validate.
pub const ALL_VERSIONS: [SchemaVersion; 11] = [
    VERSION_1_6_0,
    VERSION_1_7_1,
    VERSION_1_9_1,
    VERSION_1_11_1,
    VERSION_1_13_0,
    VERSION_1_13_1,
    VERSION_1_13_2,
    VERSION_1_15_0,
    VERSION_1_17_0,
    VERSION_1_18_0_EP,
    VERSION_1_18_0_FW,
];

/// The most recent schema version supported by the crate.
pub const LATEST_VERSION: SchemaVersion = VERSION_1_18_0_FW;
