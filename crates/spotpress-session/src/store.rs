//! In-memory configuration store with built-in defaults.
//!
//! Holds the style preset list, mockup catalog, texture catalog, and
//! provider credentials. Backed storage is out of scope; the store
//! supports JSON snapshots so a host can persist it however it likes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mockup catalog categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MockupCategory {
    /// Shirts, hoodies and the like.
    Apparel,
    /// Pillows, mugs, wall art.
    Home,
    /// Bags, hats, phone cases.
    Accessories,
}

/// A named background texture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texture {
    /// Display name.
    pub name: String,
    /// Image URL or handle.
    pub url: String,
}

/// Editable configuration with reset-to-defaults semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigStore {
    styles: Vec<String>,
    mockups: BTreeMap<MockupCategory, Vec<String>>,
    textures: Vec<Texture>,
    credentials: BTreeMap<String, String>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        let styles = [
            "Keith Haring Street",
            "Basquiat Neo-Expressionist",
            "Takashi Murakami Superflat",
            "Yayoi Kusama Polka Dot",
            "Banksy Stencil Art",
            "Jeff Koons Balloon",
            "Shepard Fairey Obey",
            "David Hockney Pop",
            "Andy Warhol Pop Art",
            "Roy Lichtenstein Comic",
            "Henri Matisse Cut-outs",
            "Bridget Riley Op Art",
            "Modern Vector Minimal",
            "Organic Watercolor",
        ]
        .map(String::from)
        .to_vec();

        let mut mockups = BTreeMap::new();
        mockups.insert(
            MockupCategory::Apparel,
            vec![
                String::from("https://images.unsplash.com/photo-1521572163474-6864f9cf17ab"),
                String::from("https://images.unsplash.com/photo-1503341455253-b2e723099de5"),
                String::from("https://images.unsplash.com/photo-1556905055-8f358a7a47b2"),
            ],
        );
        mockups.insert(
            MockupCategory::Home,
            vec![
                String::from("https://images.unsplash.com/photo-1514228742587-6b1558fcca3d"),
                String::from("https://images.unsplash.com/photo-1584100936595-c0654b55a2e6"),
            ],
        );
        mockups.insert(
            MockupCategory::Accessories,
            vec![
                String::from("https://images.unsplash.com/photo-1578353022142-091753d59042"),
                String::from("https://images.unsplash.com/photo-1588645065097-9e7978255b91"),
            ],
        );

        let textures = vec![
            Texture {
                name: String::from("Grunge"),
                url: String::from("https://images.unsplash.com/photo-1621193677201-657c6b547849"),
            },
            Texture {
                name: String::from("Paper"),
                url: String::from("https://images.unsplash.com/photo-1577610537482-1698e5473489"),
            },
            Texture {
                name: String::from("Canvas"),
                url: String::from("https://images.unsplash.com/photo-1550684848-fac1c5b4e853"),
            },
        ];

        let credentials = ["gemini", "stability", "openai", "huggingface"]
            .into_iter()
            .map(|provider| (provider.to_owned(), String::new()))
            .collect();

        Self {
            styles,
            mockups,
            textures,
            credentials,
        }
    }
}

impl ConfigStore {
    /// A store populated with the built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The style preset list, in display order.
    #[must_use]
    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    /// Append a style preset.
    pub fn add_style(&mut self, style: impl Into<String>) {
        self.styles.push(style.into());
    }

    /// Remove every style preset with this exact name.
    pub fn remove_style(&mut self, style: &str) {
        self.styles.retain(|s| s != style);
    }

    /// Mockup URLs for a category.
    #[must_use]
    pub fn mockups(&self, category: MockupCategory) -> &[String] {
        self.mockups.get(&category).map_or(&[], Vec::as_slice)
    }

    /// Append a mockup URL to a category.
    pub fn add_mockup(&mut self, category: MockupCategory, url: impl Into<String>) {
        self.mockups.entry(category).or_default().push(url.into());
    }

    /// Remove a mockup URL from a category.
    pub fn remove_mockup(&mut self, category: MockupCategory, url: &str) {
        if let Some(urls) = self.mockups.get_mut(&category) {
            urls.retain(|u| u != url);
        }
    }

    /// The texture catalog.
    #[must_use]
    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    /// Append a texture.
    pub fn add_texture(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.textures.push(Texture {
            name: name.into(),
            url: url.into(),
        });
    }

    /// Remove every texture with this URL.
    pub fn remove_texture(&mut self, url: &str) {
        self.textures.retain(|t| t.url != url);
    }

    /// The credential stored for a provider, empty if unset.
    #[must_use]
    pub fn credential(&self, provider: &str) -> &str {
        self.credentials
            .get(provider)
            .map_or("", String::as_str)
    }

    /// Set a provider credential.
    pub fn set_credential(&mut self, provider: impl Into<String>, value: impl Into<String>) {
        self.credentials.insert(provider.into(), value.into());
    }

    /// Discard all edits and restore the built-in defaults.
    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }

    /// Serialize the whole store to a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns any `serde_json` serialization error.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a store from a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns any `serde_json` deserialization error.
    pub fn from_json(snapshot: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(snapshot)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_populated() {
        let store = ConfigStore::new();
        assert_eq!(store.styles().len(), 14);
        assert_eq!(store.mockups(MockupCategory::Apparel).len(), 3);
        assert_eq!(store.textures().len(), 3);
        assert_eq!(store.credential("gemini"), "");
        assert_eq!(store.credential("unknown-provider"), "");
    }

    #[test]
    fn add_and_remove_styles() {
        let mut store = ConfigStore::new();
        store.add_style("Vaporwave Grid");
        assert!(store.styles().iter().any(|s| s == "Vaporwave Grid"));
        store.remove_style("Vaporwave Grid");
        assert!(!store.styles().iter().any(|s| s == "Vaporwave Grid"));
    }

    #[test]
    fn reset_discards_edits() {
        let mut store = ConfigStore::new();
        store.add_mockup(MockupCategory::Home, "https://example.com/mug.jpg");
        store.set_credential("stability", "sk-123");
        store.reset_to_defaults();
        assert_eq!(store, ConfigStore::default());
    }

    #[test]
    fn json_snapshot_round_trips() {
        let mut store = ConfigStore::new();
        store.add_texture("Denim", "https://example.com/denim.jpg");
        store.set_credential("openai", "key");
        let snapshot = store.to_json().unwrap();
        let restored = ConfigStore::from_json(&snapshot).unwrap();
        assert_eq!(store, restored);
    }
}
