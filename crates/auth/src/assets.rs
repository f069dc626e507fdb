//! Static-asset classification.
//!
//! A request is public when it names a static file of a known kind and lives
//! where static files are served from. Both conditions must hold, so adding a
//! new file type never opens up an application route by accident.

use serde::{Deserialize, Serialize};

/// Kinds of static files that may be served without a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Image,
    Icon,
    Font,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Image, AssetKind::Icon, AssetKind::Font];

    /// Classify a file extension (without the dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "avif" | "bmp" => {
                Some(AssetKind::Image)
            }
            "ico" => Some(AssetKind::Icon),
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Some(AssetKind::Font),
            _ => None,
        }
    }
}

/// Where public assets live and which kinds count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicAssets {
    prefixes: Vec<String>,
    kinds: Vec<AssetKind>,
}

impl Default for PublicAssets {
    fn default() -> Self {
        Self::new(["/assets/"], AssetKind::ALL)
    }
}

impl PublicAssets {
    /// Prefixes are normalised to start and end with `/`.
    pub fn new<P, S>(prefixes: P, kinds: impl IntoIterator<Item = AssetKind>) -> Self
    where
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(|p| normalize_prefix(p.as_ref()))
            .filter(|p| p != "/")
            .collect();

        Self {
            prefixes,
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn kinds(&self) -> &[AssetKind] {
        &self.kinds
    }

    /// Returns the asset kind if `path` is a public static asset.
    pub fn classify(&self, path: &str) -> Option<AssetKind> {
        if !path.starts_with('/') || path.split('/').any(|seg| seg == "..") {
            return None;
        }

        // `rfind` cannot fail: the path starts with '/'.
        let slash = path.rfind('/')?;
        let (dir, file) = path.split_at(slash + 1);

        let (stem, ext) = file.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }

        let kind = AssetKind::from_extension(ext)?;
        if !self.kinds.contains(&kind) {
            return None;
        }

        let located = dir == "/" || self.prefixes.iter().any(|p| path.starts_with(p.as_str()));
        located.then_some(kind)
    }

    pub fn is_public_path(&self, path: &str) -> bool {
        self.classify(path).is_some()
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}
