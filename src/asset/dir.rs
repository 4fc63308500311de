//! Kind-specific output directories.

use crate::graph::ModuleKind;

/// Output directory of a routed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetDir {
    Images,
    Media,
    Fonts,
    Scripts,
    Styles,
}

impl AssetDir {
    #[cfg(test)]
    pub const ALL: [Self; 5] = [
        Self::Images,
        Self::Media,
        Self::Fonts,
        Self::Scripts,
        Self::Styles,
    ];

    pub const fn for_kind(kind: ModuleKind) -> Self {
        match kind {
            ModuleKind::Image => Self::Images,
            ModuleKind::Font => Self::Fonts,
            ModuleKind::Media => Self::Media,
            ModuleKind::Script => Self::Scripts,
            ModuleKind::Style => Self::Styles,
        }
    }

    pub const fn path(self) -> &'static str {
        match self {
            Self::Images => "asset/imgs",
            Self::Media => "asset/media",
            Self::Fonts => "asset/fonts",
            Self::Scripts => "js",
            Self::Styles => "asset/css",
        }
    }

    /// Key under `[output.assets]` overriding this directory's template.
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Media => "media",
            Self::Fonts => "fonts",
            Self::Scripts => "scripts",
            Self::Styles => "styles",
        }
    }

    /// Template used for standalone files when no rule overrides it.
    pub fn default_template(self) -> String {
        format!("{}/[hash:10][ext][query]", self.path())
    }
}
