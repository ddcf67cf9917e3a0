//! Dashboard color configuration.
//!
//! Settings are persisted to localStorage so they survive page reloads.

use crate::storage::{load_json, save_json, KeyValueStore};
use serde::{Deserialize, Serialize};

/// User-chosen dashboard colors as sRGB triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    /// Buttons, links, and the active sidebar entry.
    pub primary: [u8; 3],
    /// Badges and highlights.
    pub accent: [u8; 3],
    /// Sidebar background.
    pub sidebar: [u8; 3],
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            primary: [37, 99, 235],
            accent: [245, 158, 11],
            sidebar: [24, 28, 40],
        }
    }
}

impl ThemeColors {
    /// localStorage key for persisting colors.
    pub const STORAGE_KEY: &'static str = "library_admin_theme_colors";

    /// Load colors, falling back to defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json(store, Self::STORAGE_KEY) {
            Ok(Some(colors)) => {
                log::info!("Loaded theme colors from localStorage");
                colors
            }
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Failed to parse theme colors: {}", e);
                Self::default()
            }
        }
    }

    /// Save colors.
    pub fn save(&self, store: &dyn KeyValueStore) {
        if let Err(e) = save_json(store, Self::STORAGE_KEY, self) {
            log::warn!("Failed to save theme colors: {}", e);
        } else {
            log::info!("Saved theme colors to localStorage");
        }
    }
}

/// Format an sRGB triple as `#rrggbb`.
pub fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_load_save() {
        let store = MemoryStore::new();
        assert_eq!(ThemeColors::load(&store), ThemeColors::default());

        let colors = ThemeColors {
            primary: [1, 2, 3],
            ..ThemeColors::default()
        };
        colors.save(&store);
        assert_eq!(ThemeColors::load(&store), colors);

        store.set_item(ThemeColors::STORAGE_KEY, "garbage").unwrap();
        assert_eq!(ThemeColors::load(&store), ThemeColors::default());
    }

    #[test]
    fn test_hex() {
        assert_eq!(to_hex([37, 99, 235]), "#2563eb");
    }
}
