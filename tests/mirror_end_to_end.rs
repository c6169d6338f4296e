// tests/mirror_end_to_end.rs

use std::error::Error;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use docmirror::config::MirrorConfig;
use docmirror::fs::{FileSystem, RealFileSystem};
use docmirror::types::SessionState;
use docmirror::watch::WatchRegistry;
use docmirror_test_utils::{eventually, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

struct Site {
    _dir: TempDir,
    source: PathBuf,
    target: PathBuf,
}

fn site() -> Result<Site, Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    let source = root.join("docs");
    let target = root.join("out");

    fs::create_dir_all(source.join("_templates"))?;
    fs::create_dir_all(source.join("api"))?;
    fs::create_dir_all(source.join("img"))?;
    fs::create_dir_all(source.join("empty/nested"))?;

    fs::write(
        source.join("index.md"),
        "# {{ vars.title }}\r\n\r\n\r\n{% include \"_intro.md\" %}",
    )?;
    fs::write(source.join("_intro.md"), "Hi")?;
    fs::write(source.join("site.vars.json"), r#"{"title": "Manual"}"#)?;
    fs::write(
        source.join("api/ref.json"),
        r#"{"template": "ref.md.tmpl", "name": "x"}"#,
    )?;
    fs::write(source.join("_templates/ref.md.tmpl"), "# Ref {{ name }}\n")?;
    fs::write(source.join("img/logo.png"), [0u8, 1, 2, 255])?;

    fs::create_dir_all(source.join("node_modules/pkg"))?;
    fs::write(source.join("node_modules/pkg/readme.md"), "vendored")?;

    Ok(Site {
        _dir: dir,
        source,
        target,
    })
}

fn config(site: &Site) -> MirrorConfig {
    let mut cfg = MirrorConfig::new(&site.source, &site.target);
    cfg.variables = Some(site.source.join("site.vars.json"));
    cfg.expand_documents = true;
    cfg
}

fn registry(site: &Site) -> Result<WatchRegistry, Box<dyn Error>> {
    Ok(WatchRegistry::new(config(site))?)
}

fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path.strip_prefix(root).unwrap().to_path_buf());
            }
        }
    }
    out.sort();
    out
}

#[tokio::test]
async fn run_once_mirrors_a_real_tree() -> TestResult {
    init_tracing();
    let site = site()?;
    let registry = registry(&site)?;

    let report = with_timeout(registry.run_once()).await?;
    assert!(report.initial_sync_complete);
    assert_eq!(report.written, 3);
    assert_eq!(report.failed, 0);
    // _intro.md and site.vars.json; _templates and node_modules are never walked.
    assert_eq!(report.skipped, 2);

    assert_eq!(
        files_under(&site.target),
        vec![
            PathBuf::from("api/ref.md"),
            PathBuf::from("img/logo.png"),
            PathBuf::from("index.md"),
        ]
    );
    assert_eq!(fs::read_to_string(site.target.join("index.md"))?, "# Manual\n\nHi\n");
    assert_eq!(fs::read_to_string(site.target.join("api/ref.md"))?, "# Ref x\n");
    assert_eq!(fs::read(site.target.join("img/logo.png"))?, vec![0u8, 1, 2, 255]);
    assert!(site.target.join("empty/nested").is_dir());
    assert!(!site.target.join("_templates").exists());
    assert!(!site.target.join("node_modules").exists());

    // Nothing changed, so nothing is rewritten.
    let again = with_timeout(registry.run_once()).await?;
    assert_eq!(again.written, 0);
    assert_eq!(again.unchanged, 3);
    Ok(())
}

#[tokio::test]
async fn live_session_follows_edits() -> TestResult {
    init_tracing();
    let site = site()?;
    let registry = registry(&site)?;

    let id = registry.start_dir_watch()?;
    let state = with_timeout(registry.wait_until_active(&id)).await?;
    assert_eq!(state, SessionState::Active);
    eventually(|| site.target.join("index.md").is_file()).await;

    fs::write(site.source.join("new.md"), "fresh\n")?;
    let new_target = site.target.join("new.md");
    eventually(|| fs::read_to_string(&new_target).map(|s| s == "fresh\n").unwrap_or(false)).await;

    fs::remove_file(site.source.join("new.md"))?;
    eventually(|| !new_target.exists()).await;

    let report = registry.stop_watch(&id)?.wait().await?;
    assert!(report.initial_sync_complete);
    Ok(())
}

#[tokio::test]
async fn default_config_copies_pages_with_braces_verbatim() -> TestResult {
    let site = site()?;
    let page = "## Install {#install}\n\nUse {{ message }} in a Vue template.\n";
    fs::write(site.source.join("vue.md"), page)?;

    let mut cfg = MirrorConfig::new(&site.source, &site.target);
    cfg.variables = Some(site.source.join("site.vars.json"));
    let registry = WatchRegistry::new(cfg)?;

    let report = with_timeout(registry.run_once()).await?;
    assert_eq!(report.failed, 0);
    assert_eq!(fs::read_to_string(site.target.join("vue.md"))?, page);
    Ok(())
}

#[tokio::test]
async fn expanding_a_page_with_an_undefined_variable_fails_it() -> TestResult {
    let site = site()?;
    fs::write(site.source.join("vue.md"), "Use {{ message }} here.\n")?;
    let registry = registry(&site)?;

    let report = with_timeout(registry.run_once()).await?;
    assert_eq!(report.failed, 1);
    assert!(!site.target.join("vue.md").exists());
    assert!(site.target.join("index.md").is_file());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_back_to_the_source_is_not_followed() -> TestResult {
    init_tracing();
    let site = site()?;
    std::os::unix::fs::symlink(&site.source, site.source.join("loop"))?;
    let registry = registry(&site)?;

    let report = with_timeout(registry.run_once()).await?;
    assert_eq!(report.written, 3);
    assert!(!site.target.join("loop").exists());
    assert_eq!(
        files_under(&site.target),
        vec![
            PathBuf::from("api/ref.md"),
            PathBuf::from("img/logo.png"),
            PathBuf::from("index.md"),
        ]
    );
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn removing_a_target_dir_leaves_symlinked_outside_files_alone() -> TestResult {
    init_tracing();
    let site = site()?;
    let outside = site._dir.path().join("outside");
    fs::create_dir_all(&outside)?;
    fs::write(outside.join("precious.txt"), "keep me")?;

    let registry = registry(&site)?;
    let id = registry.start_dir_watch()?;
    with_timeout(registry.wait_until_active(&id)).await?;

    let api_target = site.target.join("api");
    std::os::unix::fs::symlink(&outside, api_target.join("linked"))?;

    fs::remove_dir_all(site.source.join("api"))?;
    eventually(|| !api_target.exists()).await;

    assert_eq!(fs::read_to_string(outside.join("precious.txt"))?, "keep me");
    registry.stop_watch(&id)?.wait().await?;
    Ok(())
}

/// Blocks directory listings until opened. Gives up after two seconds and
/// records that it had to.
#[derive(Debug, Default)]
struct Gate {
    state: Mutex<GateState>,
    cond: Condvar,
}

#[derive(Debug, Default)]
struct GateState {
    open: bool,
    timed_out: bool,
}

impl Gate {
    fn wait(&self) {
        let guard = self.state.lock().unwrap();
        let (mut state, res) = self
            .cond
            .wait_timeout_while(guard, Duration::from_secs(2), |s| !s.open)
            .unwrap();
        if res.timed_out() {
            state.timed_out = true;
            state.open = true;
        }
    }

    fn open(&self) {
        self.state.lock().unwrap().open = true;
        self.cond.notify_all();
    }

    fn timed_out(&self) -> bool {
        self.state.lock().unwrap().timed_out
    }
}

struct OpenOnDrop(Arc<Gate>);

impl Drop for OpenOnDrop {
    fn drop(&mut self) {
        self.0.open();
    }
}

#[derive(Debug)]
struct GatedFileSystem {
    inner: RealFileSystem,
    gate: Arc<Gate>,
}

impl FileSystem for GatedFileSystem {
    fn read(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
        self.inner.read(path)
    }
    fn read_to_string(&self, path: &Path) -> anyhow::Result<String> {
        self.inner.read_to_string(path)
    }
    fn open_read(&self, path: &Path) -> anyhow::Result<Box<dyn Read + Send>> {
        self.inner.open_read(path)
    }
    fn write(&self, path: &Path, contents: &[u8]) -> anyhow::Result<()> {
        self.inner.write(path, contents)
    }
    fn create_dir_all(&self, path: &Path) -> anyhow::Result<()> {
        self.inner.create_dir_all(path)
    }
    fn remove_file(&self, path: &Path) -> anyhow::Result<()> {
        self.inner.remove_file(path)
    }
    fn remove_dir(&self, path: &Path) -> anyhow::Result<()> {
        self.inner.remove_dir(path)
    }
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }
    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }
    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }
    fn is_symlink(&self, path: &Path) -> bool {
        self.inner.is_symlink(path)
    }
    fn canonicalize(&self, path: &Path) -> anyhow::Result<PathBuf> {
        self.inner.canonicalize(path)
    }
    fn read_dir(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
        self.gate.wait();
        self.inner.read_dir(path)
    }
}

#[tokio::test]
async fn starting_a_watch_does_not_wait_for_the_initial_scan() -> TestResult {
    init_tracing();
    let site = site()?;
    let gate = Arc::new(Gate::default());
    let _open = OpenOnDrop(Arc::clone(&gate));
    let fs: Arc<dyn FileSystem> = Arc::new(GatedFileSystem {
        inner: RealFileSystem,
        gate: Arc::clone(&gate),
    });
    let registry = WatchRegistry::builder(config(&site)).file_system(fs).build()?;

    let id = registry.start_dir_watch()?;
    assert_eq!(registry.state_of(&id), Some(SessionState::Initializing));
    assert!(!site.target.join("index.md").exists());

    gate.open();
    let state = with_timeout(registry.wait_until_active(&id)).await?;
    assert_eq!(state, SessionState::Active);
    assert!(!gate.timed_out(), "start_dir_watch blocked on the scan");
    assert!(site.target.join("index.md").is_file());

    registry.stop_watch(&id)?.wait().await?;
    Ok(())
}
