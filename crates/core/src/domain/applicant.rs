use serde::{Deserialize, Serialize};

/// Chat-platform user id; doubles as the notification recipient id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

impl std::fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity and contact fields required by the upstream booking form.
///
/// Owned by the profile store; the engine reads it once per acquisition
/// cycle and never writes it back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub given_name: String,
    pub family_name: String,
    pub document: String,
    pub email: String,
    pub phone: String,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}
