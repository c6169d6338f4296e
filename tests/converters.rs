// tests/converters.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docmirror::convert::{FileConverter, MarkdownConverter, TemplateConverter};
use docmirror::errors::SyncError;
use docmirror::fs::mock::MockFileSystem;
use docmirror::fs::FileSystem;

fn site() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/docs/site.vars.json", r#"{"name": "Docs", "version": "1.2"}"#);
    fs.add_file(
        "/docs/_templates/page.md.tmpl",
        "# {{ title }}\n{% for s in steps %}- {{ s }}\n{% endfor %}Site: {{ vars.name }}\n",
    );
    fs.add_file("/docs/_intro.md", "Welcome!");
    fs
}

fn template_converter(fs: &MockFileSystem) -> TemplateConverter {
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    TemplateConverter::new(
        shared,
        "/docs",
        "/docs/_templates",
        Some(PathBuf::from("/docs/site.vars.json")),
    )
}

fn markdown_converter(fs: &MockFileSystem, expand: bool) -> MarkdownConverter {
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    MarkdownConverter::new(
        shared,
        "/docs",
        "/docs/_templates",
        Some(PathBuf::from("/docs/site.vars.json")),
        expand,
    )
}

fn assert_render_error(err: SyncError) {
    assert!(matches!(err, SyncError::Render { .. }), "got {err:?}");
}

#[test]
fn template_var_expands_named_template() {
    let fs = site();
    fs.add_file(
        "/docs/install.json",
        r#"{"template": "page.md.tmpl", "title": "Install", "steps": ["a", "b"]}"#,
    );

    let out = template_converter(&fs)
        .convert(Path::new("/docs/install.json"))
        .unwrap();
    assert_eq!(out, "# Install\n- a\n- b\nSite: Docs\n");
}

#[test]
fn template_name_falls_back_to_source_root() {
    let fs = site();
    fs.add_file("/docs/shared/card.tmpl", "[{{ label }}]");
    fs.add_file(
        "/docs/cards/one.json",
        r#"{"template": "shared/card.tmpl", "label": "one"}"#,
    );

    let out = template_converter(&fs)
        .convert(Path::new("/docs/cards/one.json"))
        .unwrap();
    assert_eq!(out, "[one]");
}

#[test]
fn template_names_cannot_escape_the_tree() {
    let fs = site();
    fs.add_file("/secret.tmpl", "nope");
    fs.add_file("/docs/evil.json", r#"{"template": "../secret.tmpl"}"#);

    let err = template_converter(&fs)
        .convert(Path::new("/docs/evil.json"))
        .unwrap_err();
    assert_render_error(err);
}

#[test]
fn template_var_input_errors_are_render_errors() {
    let fs = site();
    fs.add_file("/docs/no_key.json", r#"{"title": "x"}"#);
    fs.add_file("/docs/bad_key.json", r#"{"template": 3}"#);
    fs.add_file("/docs/array.json", r#"["page.md.tmpl"]"#);
    fs.add_file("/docs/broken.json", r#"{"template": "#);
    fs.add_file("/docs/unknown.json", r#"{"template": "missing.tmpl"}"#);

    let conv = template_converter(&fs);
    for path in [
        "/docs/no_key.json",
        "/docs/bad_key.json",
        "/docs/array.json",
        "/docs/broken.json",
        "/docs/unknown.json",
    ] {
        assert_render_error(conv.convert(Path::new(path)).unwrap_err());
    }
}

#[test]
fn missing_source_is_a_source_read_error() {
    let fs = site();
    let err = template_converter(&fs)
        .convert(Path::new("/docs/gone.json"))
        .unwrap_err();
    assert!(matches!(err, SyncError::SourceRead { .. }), "got {err:?}");
}

#[test]
fn markdown_expands_includes_and_vars() {
    let fs = site();
    fs.add_file(
        "/docs/guide.md",
        "{% include \"_intro.md\" %}\nVersion {{ vars.version }}\n",
    );

    let out = markdown_converter(&fs, true)
        .convert(Path::new("/docs/guide.md"))
        .unwrap();
    assert_eq!(out, "Welcome!\nVersion 1.2\n");
}

#[test]
fn markdown_without_expansion_is_verbatim() {
    let fs = site();
    fs.add_file("/docs/raw.md", "Literal {{ braces }} stay\n");

    let out = markdown_converter(&fs, false)
        .convert(Path::new("/docs/raw.md"))
        .unwrap();
    assert_eq!(out, "Literal {{ braces }} stay\n");
}

#[test]
fn markdown_syntax_error_is_a_render_error() {
    let fs = site();
    fs.add_file("/docs/bad.md", "{% if %}\n");

    let err = markdown_converter(&fs, true)
        .convert(Path::new("/docs/bad.md"))
        .unwrap_err();
    assert_render_error(err);
}

#[test]
fn missing_variables_file_means_empty_vars() {
    let fs = MockFileSystem::new();
    fs.add_file("/docs/page.md", "[{{ vars | length }}]");

    let out = markdown_converter(&fs, true)
        .convert(Path::new("/docs/page.md"))
        .unwrap();
    assert_eq!(out, "[0]");
}

#[test]
fn markdown_keeps_framework_braces_and_heading_ids_verbatim() {
    let fs = site();
    let page = "## Install {#install}\n\nUse {{ message }} in a Vue template.\n";
    fs.add_file("/docs/vue.md", page);

    let out = markdown_converter(&fs, false)
        .convert(Path::new("/docs/vue.md"))
        .unwrap();
    assert_eq!(out, page);
}

#[test]
fn undefined_variables_fail_the_render() {
    let fs = site();
    fs.add_file("/docs/page.md", "Use {{ message }} here.\n");
    fs.add_file("/docs/card.json", r#"{"template": "card.tmpl"}"#);
    fs.add_file("/docs/_templates/card.tmpl", "[{{ label }}]");

    let err = markdown_converter(&fs, true)
        .convert(Path::new("/docs/page.md"))
        .unwrap_err();
    assert_render_error(err);

    let err = template_converter(&fs)
        .convert(Path::new("/docs/card.json"))
        .unwrap_err();
    assert_render_error(err);
}

#[test]
fn heading_id_is_a_render_error_when_expanding() {
    let fs = site();
    fs.add_file("/docs/anchor.md", "## Install {#install}\n");

    let err = markdown_converter(&fs, true)
        .convert(Path::new("/docs/anchor.md"))
        .unwrap_err();
    assert_render_error(err);
}

#[test]
fn invalid_variables_file_is_a_render_error() {
    let fs = site();
    fs.add_file("/docs/site.vars.json", "{ not json");
    fs.add_file("/docs/page.md", "hi");

    let err = markdown_converter(&fs, true)
        .convert(Path::new("/docs/page.md"))
        .unwrap_err();
    assert_render_error(err);
}
