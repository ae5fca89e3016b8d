//! Text helpers shared by the menu pipeline and the admin editor:
//! normalization, slug derivation, category classification and the
//! bilingual (ES/EN) fallback.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use unicode_normalization::UnicodeNormalization;

/// Lower-case, strip diacritics, collapse non-word runs into `-` and trim
/// separators at both ends.
///
/// Slug derivation and category classification both go through this, so a
/// stored group label and a section title agree on what "the same text" is.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.nfd() {
        // combining marks left over from NFD decomposition
        if ('\u{0300}'..='\u{036f}').contains(&c) {
            continue;
        }
        for lc in c.to_lowercase() {
            if lc.is_ascii_alphanumeric() || lc == '_' {
                out.push(lc);
            } else if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Section identifiers are the normalized form of the title, stable once
/// created.
pub fn slugify(title: &str) -> String {
    normalize(title)
}

/// Active display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl Locale {
    /// Bilingual field fallback: the active locale's value when non-empty,
    /// else the other locale's, else `""`. Pure and total.
    pub fn pick<'a>(self, es: Option<&'a str>, en: Option<&'a str>) -> &'a str {
        let (first, second) = match self {
            Locale::Es => (es, en),
            Locale::En => (en, es),
        };
        non_empty(first).or_else(|| non_empty(second)).unwrap_or("")
    }
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.filter(|s| !s.is_empty())
}

/// Top-level navigation bucket a section is classified into.
///
/// The four fixed categories carry the navigation order; anything else keeps
/// its normalized label and sorts after them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Poffertjes,
    Cafe,
    Desayunos,
    Bebidas,
    Other(String),
}

/// Fixed categories in navigation order.
pub const FIXED_CATEGORIES: [Category; 4] = [
    Category::Poffertjes,
    Category::Cafe,
    Category::Desayunos,
    Category::Bebidas,
];

impl Category {
    /// Map a free-text or stored group label to a category by normalized
    /// prefix. Unmapped labels fall through to their own slug, or the
    /// catch-all `otros` when normalization yields nothing; no error is
    /// raised for unmapped input.
    pub fn classify(raw: &str) -> Category {
        let s = normalize(raw);
        if s.starts_with("poff") {
            Category::Poffertjes
        } else if s.starts_with("caf") {
            Category::Cafe
        } else if s.starts_with("desayun") {
            Category::Desayunos
        } else if s.starts_with("bebid") {
            Category::Bebidas
        } else if s.is_empty() {
            Category::Other("otros".to_string())
        } else {
            Category::Other(s)
        }
    }

    pub fn from_id(id: &str) -> Category {
        match id {
            "poffertjes" => Category::Poffertjes,
            "cafe" => Category::Cafe,
            "desayunos" => Category::Desayunos,
            "bebidas" => Category::Bebidas,
            other => Category::Other(other.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Category::Poffertjes => "poffertjes",
            Category::Cafe => "cafe",
            Category::Desayunos => "desayunos",
            Category::Bebidas => "bebidas",
            Category::Other(s) => s,
        }
    }

    /// Position in the fixed navigation order; custom categories rank after
    /// all fixed ones.
    pub fn rank(&self) -> usize {
        FIXED_CATEGORIES
            .iter()
            .position(|c| c == self)
            .unwrap_or(FIXED_CATEGORIES.len())
    }

    /// Built-in display name, used when settings carry no override.
    pub fn default_label(&self, locale: Locale) -> &str {
        match (self, locale) {
            (Category::Poffertjes, Locale::Es) => "Poffertjes",
            (Category::Poffertjes, Locale::En) => "Mini Pancakes",
            (Category::Cafe, Locale::Es) => "Café",
            (Category::Cafe, Locale::En) => "Coffee",
            (Category::Desayunos, Locale::Es) => "Desayunos",
            (Category::Desayunos, Locale::En) => "Breakfast",
            (Category::Bebidas, Locale::Es) => "Bebidas",
            (Category::Bebidas, Locale::En) => "Drinks",
            (Category::Other(s), _) => s,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Category::from_id(&s))
    }
}
