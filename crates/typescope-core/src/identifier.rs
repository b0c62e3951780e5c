//! Interned identifiers for catalog entities and graph elements.
//!
//! Entity names are compared and hashed constantly while the render set is
//! diffed against the drawn graph, so they are interned once and passed
//! around as the `Copy` type [`Id`].

use std::{
    cmp::Ordering,
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Process-wide interner backing every [`Id`].
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Interned identifier of an entity, node or port.
///
/// Two `Id`s are equal exactly when the strings they were created from are
/// equal. Ordering follows the string value so sorted output is stable across
/// runs regardless of interning order.
///
/// # Examples
///
/// ```
/// use typescope_core::identifier::Id;
///
/// let user = Id::new("User");
/// assert_eq!(user, "User");
/// assert_eq!(user, Id::from("User"));
/// assert!(Id::new("Address") < user);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Interns `name` and returns its identifier.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Returns an owned copy of the identifier text.
    pub fn to_text(self) -> String {
        interner().resolve(self.0).unwrap_or_default().to_string()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Id {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        interner().resolve(self.0) == Some(other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Id {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        let interner = interner();
        interner.resolve(self.0).cmp(&interner.resolve(other.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_interns_equal_strings() {
        let a = Id::new("Query");
        let b = Id::new("Query");
        let c = Id::new("Mutation");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, "Query");
    }

    #[test]
    fn test_display_and_to_text() {
        let id = Id::new("PageInfo");
        assert_eq!(id.to_string(), "PageInfo");
        assert_eq!(id.to_text(), "PageInfo");
    }

    #[test]
    fn test_ordering_follows_text() {
        // Intern in reverse order to make sure symbol order is not used.
        let zebra = Id::new("zz_Zebra");
        let apple = Id::new("aa_Apple");

        assert!(apple < zebra);

        let mut ids = vec![zebra, apple];
        ids.sort();
        assert_eq!(ids, vec![apple, zebra]);
    }

    #[test]
    fn test_hash_map_key() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(Id::new("User"), 1);
        map.insert(Id::new("Post"), 2);

        assert_eq!(map.get(&Id::from("User")), Some(&1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_partial_eq_str_ref() {
        let id = Id::new("Comment");
        let name = String::from("Comment");
        assert!(id == name.as_str());
        assert!(id != "Post");
    }
}
