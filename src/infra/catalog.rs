//! Static item catalog loaded from a JSON export of the game's item records.

use std::{fs, io, path::Path};

use serde::Deserialize;
use serde_json::Error as SerdeError;
use tracing::info;

use crate::domain::{Item, ResourceRequirement};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse catalog: {0}")]
    Serde(#[from] SerdeError),
}

pub fn load_catalog(path: &Path) -> Result<Vec<Item>, CatalogError> {
    let data = fs::read_to_string(path)?;
    let items = parse_catalog(&data)?;
    info!("Loaded {} catalog items from {}", items.len(), path.display());
    Ok(items)
}

pub fn parse_catalog(json: &str) -> Result<Vec<Item>, CatalogError> {
    let records: Vec<CatalogRecordDto> = serde_json::from_str(json)?;
    Ok(records.into_iter().map(Item::from).collect())
}

#[derive(Debug, Deserialize)]
struct CatalogRecordDto {
    #[serde(rename = "UniqueName")]
    unique_name: String,
    #[serde(rename = "EN-US", default)]
    name: Option<String>,
    #[serde(rename = "SlotType", default)]
    slot_type: Option<String>,
    #[serde(
        rename = "@enchantmentlevel",
        default,
        deserialize_with = "optional_string_from_json"
    )]
    enchantment_level: Option<String>,
    #[serde(rename = "CraftingRequirements", default)]
    crafting_requirements: OneOrMany<CraftingRequirementsDto>,
}

#[derive(Debug, Deserialize)]
struct CraftingRequirementsDto {
    #[serde(default)]
    craftresource: OneOrMany<CraftResourceDto>,
}

#[derive(Debug, Deserialize)]
struct CraftResourceDto {
    #[serde(rename = "@uniquename")]
    unique_name: String,
    #[serde(rename = "@count", default, deserialize_with = "optional_string_from_json")]
    count: Option<String>,
    #[serde(
        rename = "@maxreturnamount",
        default,
        deserialize_with = "optional_string_from_json"
    )]
    max_return_amount: Option<String>,
}

/// The XML-derived records hold a bare object where a list has one entry.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

impl From<CatalogRecordDto> for Item {
    fn from(dto: CatalogRecordDto) -> Self {
        // Only the first recipe is priced when an item lists alternatives.
        let recipe = dto
            .crafting_requirements
            .into_vec()
            .into_iter()
            .next()
            .map(|recipe| recipe.craftresource.into_vec())
            .unwrap_or_default();

        let name = dto.name.unwrap_or_else(|| dto.unique_name.clone());
        let mut item = recipe
            .into_iter()
            .map(ResourceRequirement::from)
            .fold(Item::new(dto.unique_name, name), Item::with_resource);

        if let Some(slot_type) = dto.slot_type {
            item = item.with_slot_type(slot_type);
        }
        item.enchantment_level = dto
            .enchantment_level
            .and_then(|level| level.trim().parse().ok());
        item
    }
}

impl From<CraftResourceDto> for ResourceRequirement {
    fn from(dto: CraftResourceDto) -> Self {
        let count = dto.count.and_then(|count| count.trim().parse().ok());
        let resource = ResourceRequirement::new(dto.unique_name, count);
        if dto.max_return_amount.as_deref().map(str::trim) == Some("0") {
            resource.artifact()
        } else {
            resource
        }
    }
}

fn optional_string_from_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> serde::de::Visitor<'de> for StringOrNumber {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string, number or null")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}
