use serde::{Deserialize, Serialize};

/// Umbrella admin group with unrestricted visibility.
pub const GENERAL_GROUP: &str = "general";
/// Wildcard entry accepted in either permission list.
pub const ALL_SENTINEL: &str = "all";

/// City/category restrictions stored on a scoped admin account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permissions {
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// What an admin is allowed to see and mutate. Pure data; all checks are
/// predicates over already-loaded rows.
#[derive(Debug, Clone)]
pub enum AdminScope {
    Unrestricted,
    Limited(Permissions),
}

impl AdminScope {
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, AdminScope::Unrestricted)
    }

    pub fn allows_city(&self, city: &str) -> bool {
        match self {
            AdminScope::Unrestricted => true,
            AdminScope::Limited(p) => p.cities.iter().any(|c| c == city || c == ALL_SENTINEL),
        }
    }

    pub fn allows_category(&self, category: &str) -> bool {
        match self {
            AdminScope::Unrestricted => true,
            AdminScope::Limited(p) => p
                .categories
                .iter()
                .any(|c| c == category || c == ALL_SENTINEL),
        }
    }

    pub fn allows(&self, city: &str, category: &str) -> bool {
        self.allows_city(city) && self.allows_category(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limited(cities: &[&str], categories: &[&str]) -> AdminScope {
        AdminScope::Limited(Permissions {
            cities: cities.iter().map(|s| s.to_string()).collect(),
            categories: categories.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn unrestricted_allows_everything() {
        let scope = AdminScope::Unrestricted;
        assert!(scope.allows("Chimoio", "Buraco na Rua"));
        assert!(scope.allows("Beira", "Outros"));
    }

    #[test]
    fn city_scoped_admin_cannot_cross_cities() {
        let scope = limited(&["Chimoio"], &["all"]);
        assert!(scope.allows("Chimoio", "Buraco na Rua"));
        assert!(scope.allows("Chimoio", "Vazamento de Água"));
        assert!(!scope.allows("Beira", "Buraco na Rua"));
    }

    #[test]
    fn category_list_is_conjunctive_with_city() {
        let scope = limited(&["Beira"], &["Acúmulo de Lixo"]);
        assert!(scope.allows("Beira", "Acúmulo de Lixo"));
        assert!(!scope.allows("Beira", "Buraco na Rua"));
        assert!(!scope.allows("Chimoio", "Acúmulo de Lixo"));
    }

    #[test]
    fn all_sentinel_works_for_cities_too() {
        let scope = limited(&["all"], &["Outros"]);
        assert!(scope.allows("Chimoio", "Outros"));
        assert!(scope.allows("Beira", "Outros"));
        assert!(!scope.allows("Beira", "Buraco na Rua"));
    }

    #[test]
    fn empty_permissions_allow_nothing() {
        let scope = limited(&[], &[]);
        assert!(!scope.allows("Chimoio", "Outros"));
    }

    #[test]
    fn permissions_deserialize_with_missing_fields() {
        let p: Permissions = serde_json::from_str(r#"{"cities": ["Chimoio"]}"#).unwrap();
        assert_eq!(p.cities, vec!["Chimoio"]);
        assert!(p.categories.is_empty());
    }
}
