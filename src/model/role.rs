use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Foreman,
    Journeyman,
    Apprentice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_labels() {
        assert_eq!("foreman".parse::<Role>().unwrap(), Role::Foreman);
        assert_eq!(Role::Apprentice.as_ref(), "apprentice");
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(
            serde_json::from_str::<Role>("\"journeyman\"").unwrap(),
            Role::Journeyman
        );
    }
}
