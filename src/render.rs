//! Pure projection from aggregated menu data to the view the frontends
//! display: navigation tabs plus the content blocks of one active category.
//!
//! Nothing here touches the store; switching locale or tab is a re-projection
//! of the same in-memory tree.

use serde::Serialize;

use crate::menu::MenuData;
use crate::model::{Base, Item, MenuSettings, Section, Topping};
use crate::price::format_price;
use crate::text::{slugify, Category, Locale};

#[derive(Debug, Serialize)]
pub struct MenuView {
    pub locale: Locale,
    pub tabs: Vec<NavTab>,
    pub sections: Vec<SectionBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo: Option<PromoView>,
    /// Set when the active category has nothing to show.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NavTab {
    pub id: String,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct SectionBlock {
    pub anchor: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<BaseView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub toppings: Vec<ToppingView>,
    /// Chooser hint above the toppings list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toppings_hint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemView>,
}

#[derive(Debug, Serialize)]
pub struct BaseView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ToppingView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PromoView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

pub fn render_menu(data: &MenuData, active: &Category, locale: Locale) -> MenuView {
    let tabs = data
        .by_group
        .keys()
        .map(|category| NavTab {
            id: category.id().to_string(),
            label: nav_label(&data.settings, category, locale),
            active: category == active,
        })
        .collect();

    let sections: Vec<SectionBlock> = data
        .by_group
        .get(active)
        .map(|sections| {
            sections
                .iter()
                .map(|s| render_section(s, locale))
                .collect()
        })
        .unwrap_or_default();

    let empty_message = sections.is_empty().then(|| {
        match locale {
            Locale::Es => "No hay elementos en esta categoría.",
            Locale::En => "No items in this category.",
        }
        .to_string()
    });

    MenuView {
        locale,
        tabs,
        sections,
        tax_note: resolve(
            locale,
            data.settings.igic_note.as_deref(),
            data.settings.igic_note_en.as_deref(),
        ),
        promo: render_promo(&data.settings, locale),
        empty_message,
    }
}

/// Tab label: settings override first, built-in bilingual default next, raw
/// category id as the last resort.
fn nav_label(settings: &MenuSettings, category: &Category, locale: Locale) -> String {
    if let Some(label) = settings.nav_labels.get(category.id()) {
        let text = locale.pick(label.es.as_deref(), label.en.as_deref());
        if !text.is_empty() {
            return text.to_string();
        }
    }
    let text = category.default_label(locale);
    if text.is_empty() {
        category.id().to_string()
    } else {
        text.to_string()
    }
}

fn render_section(section: &Section, locale: Locale) -> SectionBlock {
    let title = locale
        .pick(Some(&section.title), section.title_en.as_deref())
        .to_string();
    let anchor = if title.is_empty() {
        section.id.clone()
    } else {
        slugify(&title)
    };

    // the build-your-own category shows a base descriptor and the toppings
    // chooser instead of the plain note
    let build_your_own = section.category() == Category::Poffertjes;

    let base = if build_your_own {
        section
            .base
            .as_ref()
            .filter(|b| !b.is_empty())
            .map(|b| render_base(b, locale))
    } else {
        None
    };
    let toppings: Vec<ToppingView> = if build_your_own {
        section
            .toppings
            .iter()
            .map(|t| render_topping(t, locale))
            .collect()
    } else {
        Vec::new()
    };
    let toppings_hint = (!toppings.is_empty()).then(|| {
        match locale {
            Locale::Es => "Elige los que quieras",
            Locale::En => "Choose as many as you like",
        }
        .to_string()
    });

    SectionBlock {
        anchor,
        title,
        subtitle: resolve(locale, section.subtitle.as_deref(), section.subtitle_en.as_deref()),
        note: if build_your_own {
            None
        } else {
            resolve(locale, section.note.as_deref(), section.note_en.as_deref())
        },
        base,
        toppings,
        toppings_hint,
        items: section.items.iter().map(|i| render_item(i, locale)).collect(),
    }
}

fn render_base(base: &Base, locale: Locale) -> BaseView {
    BaseView {
        title: resolve(locale, base.title.as_deref(), base.title_en.as_deref()),
        description: resolve(
            locale,
            base.description.as_deref(),
            base.description_en.as_deref(),
        ),
        price: base.price.as_ref().map(|p| format_price(p, locale)),
    }
}

fn render_item(item: &Item, locale: Locale) -> ItemView {
    ItemView {
        name: locale
            .pick(Some(&item.name), item.name_en.as_deref())
            .to_string(),
        desc: resolve(locale, item.desc.as_deref(), item.desc_en.as_deref()),
        price: item.price.as_ref().map(|p| format_price(p, locale)),
    }
}

fn render_topping(topping: &Topping, locale: Locale) -> ToppingView {
    let price = if topping.free {
        Some(
            match locale {
                Locale::Es => "Gratis",
                Locale::En => "Free",
            }
            .to_string(),
        )
    } else {
        topping.price.as_ref().map(|p| format_price(p, locale))
    };
    ToppingView {
        name: locale
            .pick(Some(&topping.name), topping.name_en.as_deref())
            .to_string(),
        price,
    }
}

fn render_promo(settings: &MenuSettings, locale: Locale) -> Option<PromoView> {
    let promo = settings.promo.as_ref().filter(|p| p.enabled)?;
    Some(PromoView {
        version: promo.version.clone(),
        image: promo.image.clone(),
        title: resolve(locale, promo.title.as_deref(), promo.title_en.as_deref()),
        alt: resolve(locale, promo.alt.as_deref(), promo.alt_en.as_deref()),
        link: resolve(locale, promo.link.as_deref(), promo.link_en.as_deref()),
    })
}

fn resolve(locale: Locale, es: Option<&str>, en: Option<&str>) -> Option<String> {
    let text = locale.pick(es, en);
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
