//! Recipes and normalization of their ingredient/instruction payloads.
//!
//! Recipe documents were written by several versions of the admin app, so the
//! `ingredients` and `instructions` fields come in several shapes:
//!
//! ```json
//! ["2 cups flour", "1 cup sugar"]
//! [{"name": "flour", "quantity": "2 cups"}, {"instruction": "Mix"}]
//! {"1": "Preheat oven", "2": {"text": "Mix"}}
//! {"steps": ["Preheat oven", "Mix"]}
//! "Preheat oven\nMix"
//! ```
//!
//! [`RecipeItems`] names each shape and [`RecipeItems::normalize`] turns any of
//! them into a plain list of lines.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::RecipeId;

/// Keys that hold the text of a single entry, in lookup order.
const TEXT_KEYS: [&str; 5] = ["name", "instruction", "text", "step", "description"];

/// Keys that hold the amount of an ingredient, in lookup order.
const QUANTITY_KEYS: [&str; 2] = ["quantity", "amount"];

/// Keys under which a whole list is sometimes nested.
const NESTED_LIST_KEYS: [&str; 5] = ["items", "steps", "list", "ingredients", "instructions"];

/// One ingredient or instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeEntry {
    /// A bare string.
    Text(String),
    /// An object with a text field and an optional amount.
    Detailed {
        text: String,
        quantity: Option<String>,
    },
}

impl RecipeEntry {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::Text(text)),
            Value::Number(n) => Some(Self::Text(n.to_string())),
            Value::Object(map) => {
                let text = TEXT_KEYS
                    .iter()
                    .find_map(|key| map.get(*key).and_then(scalar_text))?;
                let quantity = QUANTITY_KEYS
                    .iter()
                    .find_map(|key| map.get(*key).and_then(scalar_text));
                let quantity = match (quantity, map.get("unit").and_then(scalar_text)) {
                    (Some(amount), Some(unit)) => Some(format!("{amount} {unit}")),
                    (amount, _) => amount,
                };
                Some(Self::Detailed { text, quantity })
            }
            Value::Null | Value::Bool(_) | Value::Array(_) => None,
        }
    }

    /// Canonical single-line rendering.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Detailed {
                text,
                quantity: Some(quantity),
            } => format!("{} {}", quantity.trim(), text.trim()),
            Self::Detailed {
                text,
                quantity: None,
            } => text.trim().to_string(),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The known shapes of an ingredient or instruction list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RecipeItems {
    /// `[entry, entry, ...]`
    List(Vec<RecipeEntry>),
    /// `{"1": entry, "2": entry}`, kept in key order.
    Keyed(Vec<(String, RecipeEntry)>),
    /// `{"steps": <items>}` and similar wrappers.
    Nested(Box<RecipeItems>),
    /// One newline-separated string.
    Text(String),
    /// Missing, null or an unrecognized shape.
    #[default]
    Empty,
}

impl RecipeItems {
    /// Classify a raw JSON value.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(values) => Self::List(
                values
                    .into_iter()
                    .filter_map(RecipeEntry::from_value)
                    .collect(),
            ),
            Value::String(text) => Self::Text(text),
            Value::Object(mut map) => {
                if map.len() == 1 {
                    if let Some(key) = NESTED_LIST_KEYS.iter().find(|key| map.contains_key(**key)) {
                        let inner = map.remove(*key).unwrap_or(Value::Null);
                        return Self::Nested(Box::new(Self::from_value(inner)));
                    }
                }
                if let Some(entry) = RecipeEntry::from_value(Value::Object(map.clone())) {
                    if TEXT_KEYS.iter().any(|key| map.contains_key(*key)) {
                        return Self::List(vec![entry]);
                    }
                }
                let mut keyed: Vec<(String, RecipeEntry)> = map
                    .into_iter()
                    .filter_map(|(key, value)| RecipeEntry::from_value(value).map(|e| (key, e)))
                    .collect();
                keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b));
                Self::Keyed(keyed)
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => Self::Empty,
        }
    }

    /// Canonical list of non-blank lines.
    #[must_use]
    pub fn normalize(&self) -> Vec<String> {
        let lines: Vec<String> = match self {
            Self::List(entries) => entries.iter().map(RecipeEntry::render).collect(),
            Self::Keyed(entries) => entries.iter().map(|(_, entry)| entry.render()).collect(),
            Self::Nested(inner) => return inner.normalize(),
            Self::Text(text) => text.lines().map(|line| line.trim().to_string()).collect(),
            Self::Empty => Vec::new(),
        };
        lines.into_iter().filter(|line| !line.is_empty()).collect()
    }
}

/// Numeric keys sort numerically ("2" before "10"); others lexically after them.
fn compare_keys(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl<'de> Deserialize<'de> for RecipeItems {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

impl Serialize for RecipeItems {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.normalize().serialize(serializer)
    }
}

/// A recipe from the recipes screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "_id", alias = "id")]
    pub id: RecipeId,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients: RecipeItems,
    #[serde(default, alias = "steps")]
    pub instructions: RecipeItems,
}

impl Recipe {
    /// Ingredient lines in canonical form.
    #[must_use]
    pub fn ingredient_lines(&self) -> Vec<String> {
        self.ingredients.normalize()
    }

    /// Instruction lines in canonical form.
    #[must_use]
    pub fn instruction_lines(&self) -> Vec<String> {
        self.instructions.normalize()
    }
}

/// Body of an admin create/update recipe request, always in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

impl From<&Recipe> for RecipeInput {
    fn from(recipe: &Recipe) -> Self {
        Self {
            title: recipe.title.clone(),
            description: recipe.description.clone(),
            image_url: recipe.image_url.clone(),
            ingredients: recipe.ingredient_lines(),
            instructions: recipe.instruction_lines(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn items(value: Value) -> Vec<String> {
        serde_json::from_value::<RecipeItems>(value).unwrap().normalize()
    }

    #[test]
    fn test_plain_list() {
        assert_eq!(
            items(json!(["2 cups flour", " 1 cup sugar ", ""])),
            vec!["2 cups flour", "1 cup sugar"]
        );
    }

    #[test]
    fn test_list_of_objects_with_mixed_keys() {
        assert_eq!(
            items(json!([
                {"name": "flour", "quantity": "2", "unit": "cups"},
                {"instruction": "Whisk eggs"},
                {"text": "Fold gently", "amount": 1},
                {"unexpected": true}
            ])),
            vec!["2 cups flour", "Whisk eggs", "1 Fold gently"]
        );
    }

    #[test]
    fn test_keyed_object_sorts_numerically() {
        assert_eq!(
            items(json!({
                "10": "Serve",
                "2": {"step": "Mix"},
                "1": "Preheat oven"
            })),
            vec!["Preheat oven", "Mix", "Serve"]
        );
    }

    #[test]
    fn test_nested_wrapper() {
        let parsed: RecipeItems =
            serde_json::from_value(json!({"steps": ["Preheat", "Bake"]})).unwrap();
        assert!(matches!(parsed, RecipeItems::Nested(_)));
        assert_eq!(parsed.normalize(), vec!["Preheat", "Bake"]);
    }

    #[test]
    fn test_single_object_entry() {
        assert_eq!(
            items(json!({"description": "Let cool for an hour"})),
            vec!["Let cool for an hour"]
        );
    }

    #[test]
    fn test_text_and_empty_shapes() {
        assert_eq!(items(json!("Preheat\n\n Bake ")), vec!["Preheat", "Bake"]);
        assert!(items(json!(null)).is_empty());
        assert!(items(json!(42)).is_empty());
    }

    #[test]
    fn test_recipe_defaults_and_aliases() {
        let recipe: Recipe = serde_json::from_value(json!({
            "_id": "r1",
            "name": "Sponge",
            "steps": {"1": "Mix", "2": "Bake"}
        }))
        .unwrap();

        assert_eq!(recipe.title, "Sponge");
        assert!(recipe.ingredient_lines().is_empty());
        assert_eq!(recipe.instruction_lines(), vec!["Mix", "Bake"]);

        let input = RecipeInput::from(&recipe);
        assert_eq!(input.instructions, vec!["Mix", "Bake"]);
    }
}
