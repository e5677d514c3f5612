use std::collections::HashSet;
use std::fmt;

/// An ordered set of class tokens.
///
/// Parsing keeps the first occurrence of every token, in order. Every edit
/// leaves the list duplicate-free and renders with single spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList {
    tokens: Vec<String>,
}

impl ClassList {
    pub fn parse(value: &str) -> Self {
        let mut list = ClassList::default();
        list.add(value);
        list
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Append tokens not yet present. Returns whether anything was added.
    pub fn add(&mut self, classes: &str) -> bool {
        let mut seen: HashSet<String> = self.tokens.iter().cloned().collect();
        let before = self.tokens.len();
        for token in classes.split_whitespace() {
            if seen.insert(token.to_string()) {
                self.tokens.push(token.to_string());
            }
        }
        self.tokens.len() != before
    }

    /// Drop every token listed in `classes`. Returns whether anything was removed.
    pub fn remove(&mut self, classes: &str) -> bool {
        let remove: HashSet<&str> = classes.split_whitespace().collect();
        let before = self.tokens.len();
        self.tokens.retain(|t| !remove.contains(t.as_str()));
        self.tokens.len() != before
    }

    /// Substitute exact matches of `from` with the tokens of `to`, in place.
    pub fn replace(&mut self, from: &str, to: &str) -> bool {
        let from = from.trim();
        if from.is_empty() || !self.contains(from) {
            return false;
        }
        let mut next = Vec::with_capacity(self.tokens.len());
        let mut seen = HashSet::new();
        for token in &self.tokens {
            let replacement: Vec<&str> = if token == from {
                to.split_whitespace().collect()
            } else {
                vec![token.as_str()]
            };
            for t in replacement {
                if seen.insert(t) {
                    next.push(t.to_string());
                }
            }
        }
        if next == self.tokens {
            return false;
        }
        self.tokens = next;
        true
    }
}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

/// Join class strings into one duplicate-free class attribute value.
pub fn merge_classes<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut list = ClassList::default();
    for part in parts {
        list.add(part);
    }
    list.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dedups_and_normalizes() {
        let list = ClassList::parse("  flex  p-4 flex\ttext-sm ");
        assert_eq!(list.to_string(), "flex p-4 text-sm");
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut list = ClassList::parse("px-4");
        assert!(list.add("bg-blue-500"));
        assert!(!list.add("bg-blue-500"));
        assert_eq!(list.to_string(), "px-4 bg-blue-500");
    }

    #[test]
    fn test_remove_all_occurrences() {
        let mut list = ClassList::parse("a b c");
        assert!(list.remove("b a"));
        assert_eq!(list.to_string(), "c");
        assert!(!list.remove("zzz"));
    }

    #[test]
    fn test_replace_exact_tokens_only() {
        let mut list = ClassList::parse("bg-black text-white bg-black-50");
        assert!(list.replace("bg-black", "bg-blue-600"));
        assert_eq!(list.to_string(), "bg-blue-600 text-white bg-black-50");
        assert!(!list.replace("bg-red", "bg-green"));
    }

    #[test]
    fn test_replace_collapses_duplicates() {
        let mut list = ClassList::parse("p-2 p-4");
        assert!(list.replace("p-2", "p-4"));
        assert_eq!(list.to_string(), "p-4");
    }

    #[test]
    fn test_replace_with_itself_is_noop() {
        let mut list = ClassList::parse("p-2");
        assert!(!list.replace("p-2", "p-2"));
    }

    #[test]
    fn test_merge_classes() {
        assert_eq!(
            merge_classes(["flex flex-col", "", "flex gap-4"]),
            "flex flex-col gap-4"
        );
    }
}
