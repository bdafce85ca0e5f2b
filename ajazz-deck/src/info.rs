//! Static panel geometry

use serde::{Deserialize, Serialize};

/// Supported panel models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanelModel {
    /// 6x3 keys, 854x480 logo screen
    #[default]
    Akp153,
}

impl PanelModel {
    pub fn info(self) -> PanelInfo {
        match self {
            PanelModel::Akp153 => PanelInfo {
                columns: 6,
                rows: 3,
                keys: 18,
                pixels: 85,
                dpi: 124,
                padding: 16,
            },
        }
    }
}

/// Key grid and per-key image geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelInfo {
    pub columns: u8,
    pub rows: u8,
    pub keys: u8,
    /// Key images are `pixels` x `pixels`
    pub pixels: u32,
    pub dpi: u32,
    /// Gap between keys in pixels
    pub padding: u32,
}

impl Default for PanelInfo {
    fn default() -> Self {
        PanelModel::default().info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_akp153_grid_matches_key_count() {
        let info = PanelModel::Akp153.info();
        assert_eq!(info.columns as usize * info.rows as usize, info.keys as usize);
    }
}
