//! Site header / navigation configuration.

use serde::{Deserialize, Serialize};

/// Header configuration rendered on every page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SiteHeader {
    pub logo_text: String,
    pub logo_url: String,
    pub logo_light: Logo,
    pub logo_dark: Logo,
    pub main_navigation: Vec<NavItem>,
    pub enable_search: bool,
    pub search_placeholder: String,
    pub top_bar: TopBar,
}

/// Logo image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Logo {
    pub url: String,
    pub alt: String,
}

/// Top-level navigation entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub text: String,
    pub url: String,
    #[serde(default)]
    pub has_dropdown: bool,
    #[serde(default)]
    pub children: Vec<NavChild>,
}

/// Dropdown entry under a navigation item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NavChild {
    pub id: u64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default)]
    pub open_in_new_tab: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub badge: String,
    #[serde(default)]
    pub css_class: String,
}

/// Strip above the header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TopBar {
    pub enable_top_bar: bool,
    pub background_color: String,
    pub height: String,
}

impl Default for TopBar {
    fn default() -> Self {
        Self {
            enable_top_bar: true,
            background_color: "#212121".to_string(),
            height: "40px".to_string(),
        }
    }
}

impl SiteHeader {
    /// Navigation served when the CMS has none configured.
    pub fn default_navigation() -> Vec<NavItem> {
        [
            ("⚡️24/7 Flash Haberler", "/flash"),
            ("Bitcoin", "/category/bitcoin"),
            ("Ethereum/Solana", "/category/ethereum-solana"),
            ("Haberler", "/category/haberler"),
            ("Rehberler", "/rehberler"),
        ]
        .into_iter()
        .map(|(text, url)| NavItem {
            text: text.to_string(),
            url: url.to_string(),
            has_dropdown: false,
            children: Vec::new(),
        })
        .collect()
    }

    pub fn default_logo_light() -> Logo {
        Logo {
            url: "https://kriptosaat.com/wp-content/uploads/2025/06/b9fdf65408.png".to_string(),
            alt: "Kripto Saat Light Logo".to_string(),
        }
    }

    pub fn default_logo_dark() -> Logo {
        Logo {
            url: "https://kriptosaat.com/wp-content/uploads/2025/06/5eca877f1b-1.png".to_string(),
            alt: "Kripto Saat Dark Logo".to_string(),
        }
    }
}

impl Default for SiteHeader {
    fn default() -> Self {
        Self {
            logo_text: "Kripto Saat".to_string(),
            logo_url: "/".to_string(),
            logo_light: Self::default_logo_light(),
            logo_dark: Self::default_logo_dark(),
            main_navigation: Self::default_navigation(),
            enable_search: true,
            search_placeholder: "Ara...".to_string(),
            top_bar: TopBar::default(),
        }
    }
}
