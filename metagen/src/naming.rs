//! Naming rules for generated items.

use std::sync::LazyLock;

use regex::Regex;

static LOWER_UPPER_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("([a-z])([A-Z])").expect("boundary pattern is valid"));

/// Attribute name to constant name.
///
/// Only a lowercase letter followed by an uppercase letter is split, so
/// `firstName` becomes `FIRST_NAME` while `URLValue` becomes `URLVALUE`.
pub fn constant_name(attribute: &str) -> String {
    LOWER_UPPER_BOUNDARY.replace_all(attribute, "${1}_${2}").to_uppercase()
}

/// Convert PascalCase to snake_case.
pub fn to_snake_case(name: &str) -> String {
    let mut result = String::new();
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(ch.to_ascii_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// Name of the generated companion for an entity (`Person` + `_`).
pub fn generated_name(entity_simple_name: &str, suffix: &str) -> String {
    format!("{entity_simple_name}{suffix}")
}

/// File the companion is written to (`person_.rs`).
pub fn file_name(generated_name: &str) -> String {
    format!("{}.rs", to_snake_case(generated_name))
}

/// Path accessor method for an attribute (`name_`).
pub fn path_accessor(attribute: &str) -> String {
    format!("{attribute}_")
}

/// Join accessor method for a relationship attribute (`join_parent`).
pub fn join_accessor(attribute: &str) -> String {
    format!("join_{attribute}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_name() {
        assert_eq!(constant_name("firstName"), "FIRST_NAME");
        assert_eq!(constant_name("id"), "ID");
        assert_eq!(constant_name("first_name"), "FIRST_NAME");
        assert_eq!(constant_name("URLValue"), "URLVALUE");
        assert_eq!(constant_name("aBC"), "A_BC");
        assert_eq!(constant_name("createdAtUtc"), "CREATED_AT_UTC");
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("Guild"), "guild");
        assert_eq!(to_snake_case("GuildMember_"), "guild_member_");
        assert_eq!(to_snake_case("HTTPRequest"), "h_t_t_p_request");
    }

    #[test]
    fn test_generated_names() {
        let name = generated_name("Person", "_");
        assert_eq!(name, "Person_");
        assert_eq!(file_name(&name), "person_.rs");
        assert_eq!(path_accessor("name"), "name_");
        assert_eq!(join_accessor("parent"), "join_parent");
    }
}
