// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const ENV_CONFIG_PATH: &str = "CURATOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_TOML: &str = "config/curator.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/curator.json";

/// Hard ceiling on rendered previews per document.
pub const MAX_PREVIEW_PAGES: usize = 5;

fn default_feed_url() -> String {
    "http://export.arxiv.org/api/query?search_query=cat:cs.CV&sortBy=lastUpdatedDate&sortOrder=descending&max_results=250".into()
}
fn default_keywords_path() -> PathBuf {
    PathBuf::from("keywords.csv")
}
fn default_artifact_root() -> PathBuf {
    PathBuf::from("/var/www/arxiv-curator")
}
fn default_site_url() -> String {
    "https://localhost".into()
}
fn default_output_file() -> String {
    "arxiv.xml".into()
}
fn default_papers_dir() -> String {
    "papers".into()
}

/// What to do when a single entry fails (bad timestamp, download, render...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryErrorPolicy {
    /// Abort the whole run on the first failing entry.
    #[default]
    Abort,
    /// Log and drop the failing entry, keep curating the rest.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default = "ChannelConfig::default_title")]
    pub title: String,
    #[serde(default = "ChannelConfig::default_link")]
    pub link: String,
    #[serde(default = "ChannelConfig::default_description")]
    pub description: String,
    /// Branding image, relative to `site_url`.
    #[serde(default = "ChannelConfig::default_image_path")]
    pub image_path: String,
}

impl ChannelConfig {
    fn default_title() -> String {
        "Personalized cs.CV updates on arXiv.org".into()
    }
    fn default_link() -> String {
        "https://arxiv.org/list/cs.CV/recent".into()
    }
    fn default_description() -> String {
        "Selection of the latest Computer Vision and Pattern Recognition (cs.CV) updates on arXiv.org, filtered by a keyword watchlist.".into()
    }
    fn default_image_path() -> String {
        "resources/logo.png".into()
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            link: Self::default_link(),
            description: Self::default_description(),
            image_path: Self::default_image_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "WindowConfig::default_narrow")]
    pub narrow_hours: i64,
    #[serde(default = "WindowConfig::default_wide")]
    pub wide_hours: i64,
    /// Truncate each cutoff to 00:00 UTC of its day.
    #[serde(default)]
    pub align_to_utc_day: bool,
}

impl WindowConfig {
    fn default_narrow() -> i64 {
        24
    }
    fn default_wide() -> i64 {
        72
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            narrow_hours: Self::default_narrow(),
            wide_hours: Self::default_wide(),
            align_to_utc_day: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "PreviewConfig::default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "PreviewConfig::default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "PreviewConfig::default_render_dpi")]
    pub render_dpi: u32,
    /// Display size of gallery thumbnails in the HTML description.
    #[serde(default = "PreviewConfig::default_thumb_width")]
    pub thumb_width: u32,
    #[serde(default = "PreviewConfig::default_thumb_height")]
    pub thumb_height: u32,
    /// Only trust artifact directories that carry a completion sentinel.
    #[serde(default)]
    pub require_completion_marker: bool,
    #[serde(default)]
    pub pdfium_library_path: Option<PathBuf>,
}

impl PreviewConfig {
    fn default_max_pages() -> usize {
        MAX_PREVIEW_PAGES
    }
    fn default_jpeg_quality() -> u8 {
        50
    }
    fn default_render_dpi() -> u32 {
        150
    }
    fn default_thumb_width() -> u32 {
        212
    }
    fn default_thumb_height() -> u32 {
        275
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_pages: Self::default_max_pages(),
            jpeg_quality: Self::default_jpeg_quality(),
            render_dpi: Self::default_render_dpi(),
            thumb_width: Self::default_thumb_width(),
            thumb_height: Self::default_thumb_height(),
            require_completion_marker: false,
            pdfium_library_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    #[serde(default = "LinkConfig::default_abstract_token")]
    pub abstract_token: String,
    #[serde(default = "LinkConfig::default_document_token")]
    pub document_token: String,
    /// Prefix of the trailing `(prefix:id)` annotation stripped from titles.
    #[serde(default = "LinkConfig::default_source_prefix")]
    pub source_prefix: String,
}

impl LinkConfig {
    fn default_abstract_token() -> String {
        "/abs/".into()
    }
    fn default_document_token() -> String {
        "/pdf/".into()
    }
    fn default_source_prefix() -> String {
        "arXiv".into()
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            abstract_token: Self::default_abstract_token(),
            document_token: Self::default_document_token(),
            source_prefix: Self::default_source_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// arXiv rejects bare library clients; send a browser-like agent.
    #[serde(default = "HttpConfig::default_user_agent")]
    pub user_agent: String,
    /// Request timeout; `None` keeps the client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    fn default_user_agent() -> String {
        "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:108.0) Gecko/20100101 Firefox/108.0".into()
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: Self::default_user_agent(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratorConfig {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_keywords_path")]
    pub keywords_path: PathBuf,
    /// Root for published files: the output feed and the `papers/` previews.
    #[serde(default = "default_artifact_root")]
    pub artifact_root: PathBuf,
    /// Public base URL that serves `artifact_root`.
    #[serde(default = "default_site_url")]
    pub site_url: String,
    #[serde(default = "default_output_file")]
    pub output_file: String,
    #[serde(default = "default_papers_dir")]
    pub papers_dir: String,
    #[serde(default)]
    pub on_entry_error: EntryErrorPolicy,
    /// Prometheus textfile written after each run (node_exporter collector).
    #[serde(default)]
    pub metrics_textfile: Option<PathBuf>,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub links: LinkConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            keywords_path: default_keywords_path(),
            artifact_root: default_artifact_root(),
            site_url: default_site_url(),
            output_file: default_output_file(),
            papers_dir: default_papers_dir(),
            on_entry_error: EntryErrorPolicy::default(),
            metrics_textfile: None,
            channel: ChannelConfig::default(),
            window: WindowConfig::default(),
            preview: PreviewConfig::default(),
            links: LinkConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl CuratorConfig {
    /// Load from an explicit path. TOML or JSON, picked by extension.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: CuratorConfig = match ext.as_str() {
            "json" => serde_json::from_str(&data)
                .with_context(|| format!("parsing JSON config {}", path.display()))?,
            _ => toml::from_str(&data)
                .with_context(|| format!("parsing TOML config {}", path.display()))?,
        };
        Ok(cfg.apply_env().sanitized())
    }

    /// Resolve the config path and load it:
    /// 1) explicit path (CLI flag)
    /// 2) $CURATOR_CONFIG_PATH
    /// 3) config/curator.toml
    /// 4) config/curator.json
    /// 5) built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            return Self::load_from_file(p);
        }
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        for candidate in [DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_JSON] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
        }
        tracing::info!("no config file found, using built-in defaults");
        Ok(Self::default().apply_env().sanitized())
    }

    /// Environment overrides for deployment-specific values.
    fn apply_env(mut self) -> Self {
        if let Ok(v) = env::var("CURATOR_FEED_URL") {
            self.feed_url = v;
        }
        if let Ok(v) = env::var("CURATOR_ARTIFACT_ROOT") {
            self.artifact_root = PathBuf::from(v);
        }
        if let Ok(v) = env::var("CURATOR_SITE_URL") {
            self.site_url = v;
        }
        if let Ok(v) = env::var("CURATOR_KEYWORDS_PATH") {
            self.keywords_path = PathBuf::from(v);
        }
        self
    }

    fn sanitized(mut self) -> Self {
        self.preview.max_pages = self.preview.max_pages.clamp(1, MAX_PREVIEW_PAGES);
        self.preview.jpeg_quality = self.preview.jpeg_quality.clamp(1, 100);
        if self.preview.render_dpi == 0 {
            self.preview.render_dpi = PreviewConfig::default_render_dpi();
        }
        if self.window.narrow_hours <= 0 {
            self.window.narrow_hours = WindowConfig::default_narrow();
        }
        if self.window.wide_hours <= 0 {
            self.window.wide_hours = WindowConfig::default_wide();
        }
        if self.window.narrow_hours > self.window.wide_hours {
            // keep the fallback at least as wide as the first pass
            std::mem::swap(&mut self.window.narrow_hours, &mut self.window.wide_hours);
        }
        self.site_url = self.site_url.trim_end_matches('/').to_string();
        self
    }

    /// Directory holding one subdirectory of previews per document.
    pub fn papers_root(&self) -> PathBuf {
        self.artifact_root.join(&self.papers_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.artifact_root.join(&self.output_file)
    }
}
