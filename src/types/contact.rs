//! Contact types

use serde::{Deserialize, Serialize};

/// Loose contact data as it appears on an imported row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
}

impl ContactFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.company.is_none()
    }

    /// Split the full name into first token and the rest.
    /// "Mary Ann Smith" -> ("Mary", "Ann Smith"); "Cher" -> ("Cher", None).
    pub fn split_name(&self) -> (Option<String>, Option<String>) {
        let Some(name) = self.name.as_deref() else {
            return (None, None);
        };
        let mut parts = name.split_whitespace();
        let first = parts.next().map(str::to_string);
        let rest: Vec<&str> = parts.collect();
        let last = if rest.is_empty() { None } else { Some(rest.join(" ")) };
        (first, last)
    }
}

/// Contact creation payload. The owning account is passed separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
}

impl From<&ContactFields> for NewContact {
    fn from(fields: &ContactFields) -> Self {
        let (first_name, last_name) = fields.split_name();
        Self {
            first_name,
            last_name,
            company_name: fields.company.clone(),
            email: fields.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> ContactFields {
        ContactFields { name: Some(name.to_string()), ..Default::default() }
    }

    #[test]
    fn test_split_name_multi_part_surname() {
        assert_eq!(
            named("Mary  Ann Smith").split_name(),
            (Some("Mary".to_string()), Some("Ann Smith".to_string()))
        );
    }

    #[test]
    fn test_split_name_single_token() {
        assert_eq!(named("Cher").split_name(), (Some("Cher".to_string()), None));
    }

    #[test]
    fn test_split_name_absent() {
        assert_eq!(ContactFields::default().split_name(), (None, None));
        assert!(ContactFields::default().is_empty());
    }
}
