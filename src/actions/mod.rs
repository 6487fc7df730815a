//! External action references: version compatibility and pin resolution.

pub mod pins;
pub mod versions;

pub use pins::{ActionPin, ActionPins};
pub use versions::{compare_versions, extract_major_version, is_compatible};
