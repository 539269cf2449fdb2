//! UI resource declaration model.
//!
//! Pages and actions declare the permissions they need. The frontend uses
//! them to decide what to render; the permission set stays authoritative.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A navigable page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiPage {
    /// Stable page key.
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Client route.
    #[serde(default)]
    pub path: String,
    /// Permissions required to show the page.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Icon name.
    #[serde(default)]
    pub icon: Option<String>,
    /// Navigation order; unset sorts as zero.
    #[serde(default)]
    pub order: Option<i32>,
    /// Navigation section.
    #[serde(default)]
    pub section: Option<String>,
}

/// A gated action such as a button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiAction {
    /// Stable action key.
    pub id: String,
    /// Permissions required to offer the action.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Display label.
    #[serde(default)]
    pub label: Option<String>,
    /// Whether the client should confirm before running it.
    #[serde(default)]
    pub confirm: Option<bool>,
}

/// Everything a tenant declares for its UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiResources {
    /// Pages.
    #[serde(default)]
    pub pages: Vec<UiPage>,
    /// Actions.
    #[serde(default)]
    pub actions: Vec<UiAction>,
    /// Feature flags.
    #[serde(default, rename = "featureFlags")]
    pub feature_flags: BTreeMap<String, bool>,
}

impl UiResources {
    /// Drop blank entries, fill missing titles/paths, and sort pages by
    /// `(order, lowercase title)`.
    pub fn normalized(mut self) -> Self {
        self.pages.retain(|p| !p.id.trim().is_empty());
        for page in &mut self.pages {
            page.id = page.id.trim().to_string();
            if page.title.trim().is_empty() {
                page.title = capitalize(&page.id);
            }
            if page.path.trim().is_empty() {
                page.path = format!("/{}", page.id);
            }
            page.requires = trimmed(&page.requires);
        }
        self.pages.sort_by(|a, b| {
            (a.order.unwrap_or(0), a.title.to_lowercase())
                .cmp(&(b.order.unwrap_or(0), b.title.to_lowercase()))
        });

        self.actions.retain(|a| !a.id.trim().is_empty());
        for action in &mut self.actions {
            action.id = action.id.trim().to_string();
            action.requires = trimmed(&action.requires);
        }

        self.feature_flags = self
            .feature_flags
            .into_iter()
            .filter_map(|(k, v)| {
                let key = k.trim().to_string();
                (!key.is_empty()).then_some((key, v))
            })
            .collect();
        self
    }
}

fn trimmed(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
