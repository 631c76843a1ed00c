use serde::Deserialize;
use serde_json::Value;

/// A chat model advertised by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub name: String,
}

impl ModelDescriptor {
    pub fn new(name: &str) -> Self {
        ModelDescriptor {
            name: name.to_string(),
        }
    }

    /// Normalize any supported model-listing shape into descriptors.
    ///
    /// Unknown shapes yield an empty list rather than an error.
    pub fn from_listing(listing: Value) -> Vec<ModelDescriptor> {
        let entries = match serde_json::from_value::<ModelListing>(listing) {
            Ok(ModelListing::Ollama { models }) => models,
            Ok(ModelListing::OpenAi { data }) => data,
            Ok(ModelListing::Bare(entries)) => entries,
            Err(_) => Vec::new(),
        };

        entries
            .into_iter()
            .filter_map(ModelEntry::into_name)
            .filter(|name| !name.trim().is_empty())
            .map(|name| ModelDescriptor { name })
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModelListing {
    Ollama { models: Vec<ModelEntry> },
    OpenAi { data: Vec<ModelEntry> },
    Bare(Vec<ModelEntry>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModelEntry {
    Named { name: String },
    Tagged { model: String },
    Identified { id: String },
    Bare(String),
    Unknown(Value),
}

impl ModelEntry {
    fn into_name(self) -> Option<String> {
        match self {
            ModelEntry::Named { name } => Some(name),
            ModelEntry::Tagged { model } => Some(model),
            ModelEntry::Identified { id } => Some(id),
            ModelEntry::Bare(name) => Some(name),
            ModelEntry::Unknown(_) => None,
        }
    }
}

/// Pick a model: the first preference substring that matches any model
/// wins, otherwise the first model listed.
pub fn select_model<'a>(models: &'a [ModelDescriptor], preference: &[String]) -> Option<&'a ModelDescriptor> {
    for wanted in preference {
        let wanted = wanted.to_lowercase();
        if let Some(model) = models.iter().find(|m| m.name.to_lowercase().contains(&wanted)) {
            return Some(model);
        }
    }
    models.first()
}
