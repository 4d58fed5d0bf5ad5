//! Identifier sanitization and per-scope name-conflict resolution.

use indexmap::IndexMap;

/// Rewrite `name` into a valid proto/Go identifier: a leading ASCII letter
/// followed by `[A-Za-z0-9_]`. Invalid characters become `_`.
pub fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len().max(1));
    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            if c.is_ascii_alphabetic() {
                result.push(c);
            } else if c.is_ascii_digit() {
                result.push('_');
                result.push(c);
            } else {
                result.push('_');
            }
        } else if c.is_ascii_alphanumeric() || c == '_' {
            result.push(c);
        } else {
            result.push('_');
        }
    }
    if result.is_empty() {
        result.push('_');
    }
    result
}

/// PascalCase a schema or property name (`dog_breed` -> `DogBreed`,
/// `Pet` -> `Pet`).
pub fn to_pascal_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for word in name.split(|c: char| c == '_' || c == '-' || c == ' ') {
        if word.is_empty() {
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }
    if result.is_empty() {
        sanitize_identifier(name)
    } else {
        result
    }
}

/// True when `name` looks plural (ends in `s`), the heuristic the array
/// inline-naming rule uses to reject un-derivable message/enum names.
pub fn is_plural(name: &str) -> bool {
    name.ends_with('s') || name.ends_with("es")
}

/// `DogBreed` -> `DOG_BREED`. Used to prefix synthesized integer-enum
/// symbols so sibling enums never collide in proto3's flat enum-value
/// namespace.
pub fn to_screaming_snake_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            if prev.is_lowercase() || prev.is_ascii_digit() {
                result.push('_');
            }
        }
        result.push(c.to_ascii_uppercase());
    }
    result
}

/// Assigns `_2`, `_3`, ... suffixes to sanitized names that collide within
/// one emission scope (a message's field list, say). Earlier entries keep
/// the bare name.
#[derive(Debug, Default)]
pub struct NameTracker {
    seen: IndexMap<String, u32>,
}

impl NameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `base` and return the identifier to actually use.
    pub fn assign(&mut self, base: &str) -> String {
        let count = self.seen.entry(base.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base.to_string()
        } else {
            format!("{base}_{count}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_leading_digit() {
        assert_eq!(sanitize_identifier("123abc"), "_123abc");
    }

    #[test]
    fn sanitizes_invalid_chars() {
        assert_eq!(sanitize_identifier("user-name!"), "user_name_");
    }

    #[test]
    fn pascal_cases_snake_case() {
        assert_eq!(to_pascal_case("dog_breed"), "DogBreed");
        assert_eq!(to_pascal_case("Pet"), "Pet");
        assert_eq!(to_pascal_case("userId"), "UserId");
    }

    #[test]
    fn plural_detection() {
        assert!(is_plural("tags"));
        assert!(is_plural("addresses"));
        assert!(!is_plural("tag"));
    }

    #[test]
    fn screaming_snake_case_inserts_boundaries() {
        assert_eq!(to_screaming_snake_case("DogBreed"), "DOG_BREED");
        assert_eq!(to_screaming_snake_case("Status"), "STATUS");
    }

    #[test]
    fn tracker_assigns_suffixes_in_order() {
        let mut tracker = NameTracker::new();
        assert_eq!(tracker.assign("name"), "name");
        assert_eq!(tracker.assign("name"), "name_2");
        assert_eq!(tracker.assign("name"), "name_3");
        assert_eq!(tracker.assign("other"), "other");
    }
}
