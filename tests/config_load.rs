// tests/config_load.rs
// Tests here mutate process env and CWD, hence #[serial].

use arxiv_curator::config::{CuratorConfig, EntryErrorPolicy, ENV_CONFIG_PATH};
use std::path::PathBuf;
use std::{env, fs};

const OVERRIDES: [&str; 4] = [
    "CURATOR_FEED_URL",
    "CURATOR_ARTIFACT_ROOT",
    "CURATOR_SITE_URL",
    "CURATOR_KEYWORDS_PATH",
];

/// Snapshot & restore the curator env vars around a test.
struct EnvSnapshot {
    saved: Vec<(String, Option<String>)>,
}

impl EnvSnapshot {
    fn set(pairs: &[(&str, Option<&str>)]) -> Self {
        let mut saved = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            saved.push((k.to_string(), env::var(k).ok()));
            match v {
                Some(val) => env::set_var(k, val),
                None => env::remove_var(k),
            }
        }
        Self { saved }
    }

    fn cleared() -> Self {
        let mut pairs: Vec<(&str, Option<&str>)> = OVERRIDES.iter().map(|k| (*k, None)).collect();
        pairs.push((ENV_CONFIG_PATH, None));
        Self::set(&pairs)
    }
}

impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (k, maybe_v) in self.saved.drain(..) {
            match maybe_v {
                Some(v) => env::set_var(&k, v),
                None => env::remove_var(&k),
            }
        }
    }
}

#[serial_test::serial]
#[test]
fn toml_and_json_files_load() {
    let _env = EnvSnapshot::cleared();
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("curator.toml");
    fs::write(
        &p_toml,
        r#"
feed_url = "http://export.arxiv.org/rss/cs.CV"
site_url = "https://feeds.example.test/"
on_entry_error = "skip"

[window]
narrow_hours = 12
wide_hours = 48

[preview]
max_pages = 9
"#,
    )
    .unwrap();
    let cfg = CuratorConfig::load_from_file(&p_toml).unwrap();
    assert_eq!(cfg.feed_url, "http://export.arxiv.org/rss/cs.CV");
    assert_eq!(cfg.site_url, "https://feeds.example.test");
    assert_eq!(cfg.on_entry_error, EntryErrorPolicy::Skip);
    assert_eq!((cfg.window.narrow_hours, cfg.window.wide_hours), (12, 48));
    assert_eq!(cfg.preview.max_pages, 5);
    assert_eq!(cfg.output_file, "arxiv.xml");

    let p_json = dir.path().join("curator.json");
    fs::write(
        &p_json,
        r#"{"artifact_root": "/srv/www", "papers_dir": "p", "channel": {"title": "Watch"}}"#,
    )
    .unwrap();
    let cfg = CuratorConfig::load_from_file(&p_json).unwrap();
    assert_eq!(cfg.papers_root(), PathBuf::from("/srv/www/p"));
    assert_eq!(cfg.output_path(), PathBuf::from("/srv/www/arxiv.xml"));
    assert_eq!(cfg.channel.title, "Watch");
    assert_eq!(cfg.window.wide_hours, 72);
}

#[serial_test::serial]
#[test]
fn malformed_file_is_an_error() {
    let _env = EnvSnapshot::cleared();
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("broken.toml");
    fs::write(&p, "feed_url = [").unwrap();
    assert!(CuratorConfig::load_from_file(&p).is_err());
}

#[serial_test::serial]
#[test]
fn resolution_order_env_then_cwd_then_defaults() {
    let _env = EnvSnapshot::cleared();
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    // 1) nothing on disk: built-in defaults
    let cfg = CuratorConfig::load(None).unwrap();
    assert_eq!(cfg.window.narrow_hours, 24);
    assert_eq!(cfg.on_entry_error, EntryErrorPolicy::Abort);

    // 2) ./config/curator.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/curator.toml"),
        r#"site_url = "https://cwd.example.test""#,
    )
    .unwrap();
    let cfg = CuratorConfig::load(None).unwrap();
    assert_eq!(cfg.site_url, "https://cwd.example.test");

    // 3) env path wins over CWD
    let p_env = tmp.path().join("other.json");
    fs::write(&p_env, r#"{"site_url": "https://env.example.test"}"#).unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let cfg = CuratorConfig::load(None).unwrap();
    assert_eq!(cfg.site_url, "https://env.example.test");

    // 4) explicit path wins over env
    let cfg = CuratorConfig::load(Some(&tmp.path().join("config/curator.toml"))).unwrap();
    assert_eq!(cfg.site_url, "https://cwd.example.test");

    // 5) env pointing nowhere is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml"));
    assert!(CuratorConfig::load(None).is_err());
    env::remove_var(ENV_CONFIG_PATH);

    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_file_values() {
    let _env = EnvSnapshot::cleared();
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("curator.toml");
    fs::write(
        &p,
        r#"
feed_url = "http://file.example.test/feed"
site_url = "https://file.example.test"
"#,
    )
    .unwrap();

    let _over = EnvSnapshot::set(&[
        ("CURATOR_FEED_URL", Some("http://env.example.test/feed")),
        ("CURATOR_SITE_URL", Some("https://env.example.test/")),
        ("CURATOR_ARTIFACT_ROOT", Some("/var/www/html")),
        ("CURATOR_KEYWORDS_PATH", Some("/etc/curator/keywords.csv")),
    ]);
    let cfg = CuratorConfig::load_from_file(&p).unwrap();
    assert_eq!(cfg.feed_url, "http://env.example.test/feed");
    assert_eq!(cfg.site_url, "https://env.example.test");
    assert_eq!(cfg.artifact_root, PathBuf::from("/var/www/html"));
    assert_eq!(cfg.keywords_path, PathBuf::from("/etc/curator/keywords.csv"));
}
