use crate::explorer::{CollectionProps, ImageDescriptor, unique_keys};
use chrono::NaiveDate;
use pulldown_cmark::{Parser, html};
use serde::{Deserialize, Serialize};

/// One `[[collections]]` entry of the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectionConfig {
    pub id: String,
    pub title: String,
    /// Markdown.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub initial_items: Vec<InitialItemConfig>,
    /// Defaults to the number of `initial_items`.
    #[serde(default)]
    pub initial_total_count: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InitialItemConfig {
    pub url: String,
    #[serde(default)]
    pub public_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    pub id: String,
    pub title: String,
    pub formatted_date: String,
    pub url: String,
}

/// Resolves collection ids from the URL into the metadata the explorer
/// mounts with.
#[derive(Debug, Clone, Default)]
pub struct CollectionCatalog {
    collections: Vec<CollectionConfig>,
}

impl CollectionCatalog {
    pub fn new(collections: Vec<CollectionConfig>) -> Self {
        Self { collections }
    }

    pub fn get(&self, collection_id: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.id == collection_id)
    }

    pub fn props_for(&self, collection_id: &str) -> Option<CollectionProps> {
        self.get(collection_id).map(CollectionConfig::to_props)
    }

    pub fn summaries(&self) -> Vec<CollectionSummary> {
        self.collections
            .iter()
            .map(|c| CollectionSummary {
                id: c.id.clone(),
                title: c.title.clone(),
                formatted_date: c.date.map(format_date).unwrap_or_default(),
                url: format!("/gallery/{}", urlencoding::encode(&c.id)),
            })
            .collect()
    }
}

impl CollectionConfig {
    pub fn to_props(&self) -> CollectionProps {
        let formatted_date = self.date.map(format_date).unwrap_or_default();
        let date = Some(formatted_date.clone()).filter(|d| !d.is_empty());

        let initial_items: Vec<ImageDescriptor> = self
            .initial_items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                ImageDescriptor::new(
                    &self.title,
                    index + 1,
                    item.url.clone(),
                    item.public_id.clone(),
                    date.clone(),
                )
            })
            .collect();
        let initial_items = unique_keys(initial_items);

        CollectionProps {
            collection_id: self.id.clone(),
            title: self.title.clone(),
            description: render_description(&self.description),
            formatted_date,
            initial_total_count: self
                .initial_total_count
                .unwrap_or(initial_items.len())
                .max(initial_items.len()),
            initial_items,
        }
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

pub fn render_description(markdown: &str) -> String {
    if markdown.trim().is_empty() {
        return String::new();
    }
    let parser = Parser::new(markdown);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}
