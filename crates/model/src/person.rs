use serde::{Deserialize, Serialize};

/// A network account: `DOMAIN\username`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkIdentity {
    pub domain: String,
    pub username: String,
    /// Directory id of the account. Usually equal to `username`.
    pub id: String,
}

impl NetworkIdentity {
    pub fn new(domain: impl Into<String>, username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            domain: domain.into(),
            id: username.clone(),
            username,
        }
    }
}

/// The resolved caller of an approvals operation.
///
/// Service accounts may carry only a network identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Canonical (Hanford) id.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub network: Option<NetworkIdentity>,
}

impl Person {
    /// Canonical id, falling back to the employee id.
    pub fn canonical_id(&self) -> Option<&str> {
        non_empty(self.id.as_deref()).or_else(|| non_empty(self.employee_id.as_deref()))
    }

    pub fn network_username(&self) -> Option<&str> {
        non_empty(self.network.as_ref().map(|n| n.username.as_str()))
    }

    pub fn network_id(&self) -> Option<&str> {
        non_empty(self.network.as_ref().map(|n| n.id.as_str()))
    }

    /// Whether `candidate` names this caller's canonical id.
    pub fn is(&self, candidate: &str) -> bool {
        non_empty(self.id.as_deref()) == Some(candidate)
    }

    /// A caller known only by network account (service accounts).
    pub fn network_only(domain: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: None,
            employee_id: None,
            network: Some(NetworkIdentity::new(domain, username)),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// One person's identifiers across the employee, Hanford and network
/// namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonIdentification {
    pub employee_id: String,
    pub hanford_id: String,
    pub domain: String,
    pub network_id: String,
    pub is_active: bool,
}

impl PersonIdentification {
    /// Whether `id` names this person in any namespace.
    pub fn matches_any(&self, id: &str) -> bool {
        self.hanford_id == id || self.employee_id == id || self.network_id == id
    }
}

impl From<PersonIdentification> for Person {
    fn from(pi: PersonIdentification) -> Self {
        Person {
            id: Some(pi.hanford_id),
            employee_id: Some(pi.employee_id),
            network: Some(NetworkIdentity::new(pi.domain, pi.network_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_id_falls_back_to_employee_id() {
        let person = Person {
            id: Some(String::new()),
            employee_id: Some("E1234".to_string()),
            network: None,
        };
        assert_eq!(person.canonical_id(), Some("E1234"));
    }

    #[test]
    fn network_only_has_no_canonical_id() {
        let person = Person::network_only("PNL", "msaActMan$");
        assert_eq!(person.canonical_id(), None);
        assert_eq!(person.network_username(), Some("msaActMan$"));
        assert!(!person.is(""));
    }

    #[test]
    fn identification_converts_to_person() {
        let person: Person = PersonIdentification {
            employee_id: "E1".to_string(),
            hanford_id: "1000001".to_string(),
            domain: "PNL".to_string(),
            network_id: "d3x001".to_string(),
            is_active: true,
        }
        .into();
        assert!(person.is("1000001"));
        assert_eq!(person.network_username(), Some("d3x001"));
    }
}
