use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ForgeError, ForgeResult};

/// A component the mapper may emit: where it comes from, which tag renders
/// it, and its default classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteEntry {
    pub key: String,
    #[serde(default)]
    pub lib: Library,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tailwind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_props: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_hints: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Library {
    #[default]
    Html,
    Shadcn,
    Mui,
}

/// (key, tag, classes, default `type` prop, match hints)
type BuiltinRow = (
    &'static str,
    &'static str,
    &'static str,
    Option<&'static str>,
    &'static [&'static str],
);

const BUILTIN: &[BuiltinRow] = &[
    ("layout.card", "div", "rounded-2xl shadow-md p-6 bg-white", None, &["card", "container", "box", "panel"]),
    ("layout.stack", "div", "flex flex-col gap-4", None, &["stack", "column", "vertical", "list"]),
    ("layout.row", "div", "flex flex-row gap-4", None, &["row", "horizontal", "inline"]),
    ("layout.grid", "div", "grid gap-4", None, &["grid", "table", "matrix"]),
    ("typography.h1", "h1", "text-2xl font-semibold", None, &["title", "heading", "header", "main"]),
    ("typography.h2", "h2", "text-xl font-semibold", None, &["subtitle", "section", "secondary"]),
    ("typography.h3", "h3", "text-lg font-medium", None, &["subheading", "small-title"]),
    ("typography.p", "p", "text-sm text-gray-600", None, &["text", "description", "content", "body"]),
    ("typography.span", "span", "text-sm", None, &["inline", "label", "small-text"]),
    ("form.input", "input", "border rounded-md px-3 py-2 w-full", None, &["input", "field", "text-input", "search"]),
    ("form.textarea", "textarea", "border rounded-md px-3 py-2 w-full", None, &["textarea", "multiline", "description", "comment"]),
    ("form.select", "select", "border rounded-md px-3 py-2 w-full", None, &["select", "dropdown", "choice", "option"]),
    ("form.option", "option", "", None, &["option", "choice"]),
    ("form.checkbox", "input", "h-4 w-4 rounded border", Some("checkbox"), &["checkbox", "toggle", "switch"]),
    ("form.button", "button", "bg-black text-white rounded-md px-4 py-2", Some("submit"), &["button", "submit", "action", "click", "primary"]),
    ("form.button.secondary", "button", "bg-gray-200 text-gray-800 rounded-md px-4 py-2", Some("button"), &["secondary", "cancel", "back", "outline"]),
    ("list.ul", "ul", "divide-y", None, &["list", "items", "menu", "navigation"]),
    ("list.li", "li", "px-4 py-2", None, &["item", "entry", "row"]),
    ("media.img", "img", "rounded-md", None, &["image", "photo", "picture", "avatar"]),
    ("icon.button", "button", "p-2 rounded-md hover:bg-gray-100", Some("button"), &["icon", "symbol", "emoji", "glyph"]),
];

/// Read-only registry of palette entries, keyed by `PaletteEntry::key`.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    /// Build a palette from explicit entries. Keys must be non-empty and unique.
    pub fn new(entries: Vec<PaletteEntry>) -> ForgeResult<Self> {
        let mut errors = Vec::new();
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.key.trim().is_empty() {
                errors.push(format!("entries[{}]: key must not be empty", i));
            } else if entry.tag.trim().is_empty() {
                errors.push(format!("entries[{}] '{}': tag must not be empty", i, entry.key));
            } else if index.insert(entry.key.clone(), i).is_some() {
                errors.push(format!("entries[{}]: duplicate key '{}'", i, entry.key));
            }
        }
        if !errors.is_empty() {
            return Err(ForgeError::Validation(errors));
        }
        Ok(Self { entries, index })
    }

    /// The fixed catalog of layout, typography, form, list, media and icon entries.
    pub fn builtin() -> Self {
        let entries: Vec<PaletteEntry> = BUILTIN
            .iter()
            .map(|&(key, tag, classes, kind, hints)| PaletteEntry {
                key: key.to_string(),
                lib: Library::Html,
                tag: tag.to_string(),
                import: None,
                tailwind: (!classes.is_empty()).then(|| classes.to_string()),
                default_props: kind.map(|k| {
                    BTreeMap::from([("type".to_string(), Value::String(k.to_string()))])
                }),
                match_hints: Some(hints.iter().map(|h| h.to_string()).collect()),
            })
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key.clone(), i))
            .collect();
        Self { entries, index }
    }

    /// Process-wide builtin palette, built on first use.
    pub fn shared() -> &'static Palette {
        static SHARED: OnceLock<Palette> = OnceLock::new();
        SHARED.get_or_init(Palette::builtin)
    }

    /// Builtin entries overlaid with a YAML catalog (`entries: [...]`).
    /// Catalog entries replace builtins with the same key; new keys are appended.
    pub fn from_yaml(yaml: &str) -> ForgeResult<Self> {
        let catalog: Catalog = serde_yaml::from_str(yaml)?;
        let mut entries = Palette::builtin().entries;
        for entry in catalog.entries {
            match entries.iter_mut().find(|e| e.key == entry.key) {
                Some(slot) => *slot = entry,
                None => entries.push(entry),
            }
        }
        Palette::new(entries)
    }

    pub fn load_catalog(path: impl AsRef<Path>) -> ForgeResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ForgeError::Config(format!("failed to read palette {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn lookup(&self, key: &str) -> Option<&PaletteEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Keys in catalog order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let palette = Palette::builtin();
        assert_eq!(palette.len(), 20);
        let card = palette.lookup("layout.card").unwrap();
        assert_eq!(card.tag, "div");
        assert_eq!(
            card.tailwind.as_deref(),
            Some("rounded-2xl shadow-md p-6 bg-white")
        );
        assert!(palette.contains("form.option"));
        assert!(palette.lookup("form.option").unwrap().tailwind.is_none());
        assert!(palette.lookup("ui.carousel").is_none());
    }

    #[test]
    fn test_keys_in_catalog_order() {
        let palette = Palette::builtin();
        let keys: Vec<&str> = palette.keys().take(3).collect();
        assert_eq!(keys, vec!["layout.card", "layout.stack", "layout.row"]);
    }

    #[test]
    fn test_button_default_type() {
        let palette = Palette::builtin();
        let props = palette
            .lookup("form.button")
            .unwrap()
            .default_props
            .clone()
            .unwrap();
        assert_eq!(props["type"], "submit");
    }

    #[test]
    fn test_shared_is_single_instance() {
        assert!(std::ptr::eq(Palette::shared(), Palette::shared()));
        assert!(Palette::shared().contains("media.img"));
    }

    #[test]
    fn test_yaml_catalog_overlays_builtin() {
        let yaml = r#"
entries:
  - key: form.button
    lib: shadcn
    tag: Button
    import: 'import { Button } from "@/components/ui/button"'
  - key: ui.badge
    tag: span
    tailwind: rounded-full px-2 text-xs
"#;
        let palette = Palette::from_yaml(yaml).unwrap();
        assert_eq!(palette.len(), 21);
        let button = palette.lookup("form.button").unwrap();
        assert_eq!(button.lib, Library::Shadcn);
        assert_eq!(button.tag, "Button");
        assert_eq!(palette.keys().last(), Some("ui.badge"));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let entry = Palette::builtin().entries()[0].clone();
        let result = Palette::new(vec![entry.clone(), entry]);
        assert!(matches!(result, Err(ForgeError::Validation(_))));
    }
}
