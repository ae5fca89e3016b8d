//! Declarative admin forms.
//!
//! The editor collects every field of an operation in one modal and submits
//! a single flat value map, or nothing at all on cancel. Field schemas are
//! served to the client as data; the same schema then cleans the submitted
//! map before anything is written, so no partial document write can happen
//! without a complete, validated record.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::ORDER_LAST;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("unknown form '{0}'")]
    UnknownForm(String),

    #[error("field '{0}' is required")]
    MissingField(&'static str),

    #[error("submission must be an object or null")]
    MalformedSubmission,
}

/// Result of a modal round-trip: a confirmed value map, or a cancel that
/// must leave the store untouched.
#[derive(Debug)]
pub enum Submission {
    Submitted(Map<String, Value>),
    Cancelled,
}

impl Submission {
    pub fn from_body(body: Value) -> Result<Submission, FormError> {
        match body {
            Value::Null => Ok(Submission::Cancelled),
            Value::Object(map) => Ok(Submission::Submitted(map)),
            _ => Err(FormError::MalformedSubmission),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Number,
    Checkbox,
    Select,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
    /// Visible (and submitted) only while the named checkbox field is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<&'static str>,
}

impl FieldSpec {
    fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            placeholder: None,
            help: None,
            options: Vec::new(),
            depends_on: None,
        }
    }

    fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    fn textarea(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Textarea)
    }

    fn number(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Number)
    }

    fn checkbox(name: &'static str, help: &'static str) -> Self {
        let mut f = Self::new(name, "", FieldKind::Checkbox);
        f.help = Some(help);
        f
    }

    fn select(name: &'static str, label: &'static str, options: &[&'static str]) -> Self {
        let mut f = Self::new(name, label, FieldKind::Select);
        f.options = options.to_vec();
        f
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn optional_hint(mut self) -> Self {
        self.placeholder = Some("Opcional");
        self
    }

    fn depends_on(mut self, field: &'static str) -> Self {
        self.depends_on = Some(field);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct FormSchema {
    pub id: &'static str,
    pub fields: Vec<FieldSpec>,
}

const GROUP_OPTIONS: [&str; 4] = ["Poffertjes", "Café", "Desayunos", "Bebidas"];

pub fn schema(kind: &str) -> Result<FormSchema, FormError> {
    let fields = match kind {
        "section" => vec![
            FieldSpec::select("group", "Grupo", &GROUP_OPTIONS).required(),
            FieldSpec::text("title", "Título (ES)").required(),
            FieldSpec::text("title_en", "Title (EN)").optional_hint(),
            FieldSpec::text("subtitle", "Subtítulo (ES)").optional_hint(),
            FieldSpec::text("subtitle_en", "Subtitle (EN)").optional_hint(),
            FieldSpec::textarea("note", "Nota (ES)").optional_hint(),
            FieldSpec::textarea("note_en", "Note (EN)").optional_hint(),
            FieldSpec::number("order", "Orden"),
            FieldSpec::checkbox("base_enable", "Añadir BASE (título/desc/precio)"),
            FieldSpec::text("base_title", "Base · Título (ES)").depends_on("base_enable"),
            FieldSpec::text("base_title_en", "Base · Title (EN)")
                .optional_hint()
                .depends_on("base_enable"),
            FieldSpec::textarea("base_desc", "Base · Descripción (ES)").depends_on("base_enable"),
            FieldSpec::textarea("base_desc_en", "Base · Description (EN)")
                .optional_hint()
                .depends_on("base_enable"),
            FieldSpec::text("base_price", "Base · Precio").depends_on("base_enable"),
        ],
        "item" => vec![
            FieldSpec::text("name", "Nombre (ES)").required(),
            FieldSpec::text("name_en", "Name (EN)").optional_hint(),
            FieldSpec::textarea("desc", "Descripción (ES)").optional_hint(),
            FieldSpec::textarea("desc_en", "Description (EN)").optional_hint(),
            FieldSpec::text("price", "Precio"),
            FieldSpec::number("order", "Orden"),
        ],
        "topping" => vec![
            FieldSpec::text("name", "Nombre (ES)").required(),
            FieldSpec::text("name_en", "Name (EN)").optional_hint(),
            FieldSpec::text("price", "Precio (opcional)"),
            FieldSpec::checkbox("free", "Gratis (ignora el precio)"),
            FieldSpec::number("order", "Orden"),
        ],
        "order" => vec![FieldSpec::number("order", "Orden").required()],
        "nav_labels" => vec![
            FieldSpec::text("poff_es", "Poffertjes (ES)").required(),
            FieldSpec::text("poff_en", "Poffertjes (EN)").required(),
            FieldSpec::text("cafe_es", "Café (ES)").required(),
            FieldSpec::text("cafe_en", "Café (EN)").required(),
            FieldSpec::text("des_es", "Desayunos (ES)").required(),
            FieldSpec::text("des_en", "Desayunos (EN)").required(),
            FieldSpec::text("beb_es", "Bebidas (ES)").required(),
            FieldSpec::text("beb_en", "Bebidas (EN)").required(),
        ],
        other => return Err(FormError::UnknownForm(other.to_string())),
    };
    Ok(FormSchema { id: kind_id(kind), fields })
}

fn kind_id(kind: &str) -> &'static str {
    match kind {
        "section" => "section",
        "item" => "item",
        "topping" => "topping",
        "order" => "order",
        _ => "nav_labels",
    }
}

/// Whether a cleaned map feeds a create (empty optionals dropped, stored
/// absent) or an edit (the form submits the full field set, so an empty
/// optional is an explicit clear).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CleanMode {
    Create,
    Edit,
}

/// Validate and normalize a submitted value map against a schema.
///
/// Fields whose visibility dependency is off are dropped entirely; required
/// text must be non-empty; numbers accept numeric or string input and fall
/// back to the order sentinel when unparsable; everything not in the schema
/// is discarded.
pub fn clean(
    schema: &FormSchema,
    raw: &Map<String, Value>,
    mode: CleanMode,
) -> Result<Map<String, Value>, FormError> {
    let mut out = Map::new();

    for field in &schema.fields {
        if let Some(dep) = field.depends_on {
            if !truthy(raw.get(dep)) {
                continue;
            }
        }

        let value = raw.get(field.name);
        match field.kind {
            FieldKind::Checkbox => {
                out.insert(field.name.to_string(), Value::Bool(truthy(value)));
            }
            FieldKind::Number => match value {
                None => {}
                Some(Value::Number(n)) => {
                    out.insert(field.name.to_string(), Value::Number(n.clone()));
                }
                Some(Value::String(s)) => {
                    let n = s.trim().parse::<f64>().unwrap_or(ORDER_LAST);
                    out.insert(field.name.to_string(), n.into());
                }
                Some(_) => {
                    out.insert(field.name.to_string(), ORDER_LAST.into());
                }
            },
            FieldKind::Text | FieldKind::Textarea | FieldKind::Select => {
                let text = value.and_then(Value::as_str).map(str::trim).unwrap_or("");
                if text.is_empty() {
                    if field.required {
                        return Err(FormError::MissingField(field.name));
                    }
                    if mode == CleanMode::Edit {
                        out.insert(field.name.to_string(), Value::Null);
                    }
                } else {
                    out.insert(field.name.to_string(), Value::String(text.to_string()));
                }
            }
        }
    }

    Ok(out)
}

/// Fold the flat `base_*` section-form fields into the nested `base`
/// structure the section payloads expect. With the base checkbox off, a
/// create carries no base at all and an edit clears the whole substructure.
pub fn lift_base(values: &mut Map<String, Value>, mode: CleanMode) {
    let enabled = truthy(values.remove("base_enable").as_ref());
    let mapping = [
        ("base_title", "title"),
        ("base_title_en", "title_en"),
        ("base_desc", "description"),
        ("base_desc_en", "description_en"),
        ("base_price", "price"),
    ];

    let mut base = Map::new();
    for (flat, nested) in mapping {
        if let Some(v) = values.remove(flat) {
            base.insert(nested.to_string(), v);
        }
    }

    if enabled {
        if mode == CleanMode::Create {
            base.retain(|_, v| !v.is_null());
            if !base.is_empty() {
                values.insert("base".to_string(), Value::Object(base));
            }
        } else {
            values.insert("base".to_string(), Value::Object(base));
        }
    } else if mode == CleanMode::Edit {
        values.insert("base".to_string(), Value::Null);
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) != 0.0,
        Some(Value::String(s)) => !s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn cancelled_submission_is_distinct() {
        assert!(matches!(
            Submission::from_body(Value::Null),
            Ok(Submission::Cancelled)
        ));
        assert!(matches!(
            Submission::from_body(json!({ "title": "x" })),
            Ok(Submission::Submitted(_))
        ));
        assert!(Submission::from_body(json!([1, 2])).is_err());
    }

    #[test]
    fn create_drops_empty_optionals() {
        let schema = schema("section").unwrap();
        let cleaned = clean(
            &schema,
            &raw(json!({
                "group": "Desayunos",
                "title": "  Tostas  ",
                "title_en": "",
                "subtitle": "   ",
                "order": "2"
            })),
            CleanMode::Create,
        )
        .unwrap();
        assert_eq!(cleaned["title"], json!("Tostas"));
        assert_eq!(cleaned["order"], json!(2.0));
        assert!(!cleaned.contains_key("title_en"));
        assert!(!cleaned.contains_key("subtitle"));
    }

    #[test]
    fn edit_turns_empty_optionals_into_clears() {
        let schema = schema("item").unwrap();
        let cleaned = clean(
            &schema,
            &raw(json!({ "name": "Matcha", "name_en": "", "price": "3,50" })),
            CleanMode::Edit,
        )
        .unwrap();
        assert_eq!(cleaned["name_en"], Value::Null);
        assert_eq!(cleaned["desc"], Value::Null);
        assert_eq!(cleaned["price"], json!("3,50"));
    }

    #[test]
    fn required_fields_are_enforced() {
        let schema = schema("section").unwrap();
        let err = clean(
            &schema,
            &raw(json!({ "group": "Desayunos", "title": "  " })),
            CleanMode::Create,
        )
        .unwrap_err();
        assert!(matches!(err, FormError::MissingField("title")));
    }

    #[test]
    fn invalid_order_falls_back_to_sentinel() {
        let schema = schema("order").unwrap();
        let cleaned = clean(
            &schema,
            &raw(json!({ "order": "abc" })),
            CleanMode::Edit,
        )
        .unwrap();
        assert_eq!(cleaned["order"], json!(ORDER_LAST));
    }

    #[test]
    fn dependent_fields_follow_their_checkbox() {
        let schema = schema("section").unwrap();
        let off = clean(
            &schema,
            &raw(json!({
                "group": "Poffertjes",
                "title": "Mini Pancakes",
                "base_enable": false,
                "base_title": "ignored"
            })),
            CleanMode::Create,
        )
        .unwrap();
        assert!(!off.contains_key("base_title"));

        let mut on = clean(
            &schema,
            &raw(json!({
                "group": "Poffertjes",
                "title": "Mini Pancakes",
                "base_enable": true,
                "base_title": "1 · Comienza con la base",
                "base_price": "4.50"
            })),
            CleanMode::Create,
        )
        .unwrap();
        lift_base(&mut on, CleanMode::Create);
        assert_eq!(
            on["base"],
            json!({ "title": "1 · Comienza con la base", "price": "4.50" })
        );
        assert!(!on.contains_key("base_enable"));
    }

    #[test]
    fn lift_base_clears_on_edit_when_disabled() {
        let mut values = raw(json!({ "title": "Mini Pancakes", "base_enable": false }));
        lift_base(&mut values, CleanMode::Edit);
        assert_eq!(values["base"], Value::Null);

        let mut values = raw(json!({
            "title": "Mini Pancakes",
            "base_enable": true,
            "base_title": "Base",
            "base_desc": null
        }));
        lift_base(&mut values, CleanMode::Edit);
        assert_eq!(values["base"], json!({ "title": "Base", "description": null }));
    }

    #[test]
    fn unknown_schema_kind() {
        assert!(schema("zone").is_err());
    }
}
