// tests/dispatcher_state.rs

use std::path::PathBuf;

use docmirror::config::MirrorConfig;
use docmirror::engine::{Dispatcher, MirrorAction, WatchEvent};
use docmirror::mirror::{Filter, PathMapper};
use docmirror::types::{FileCategory, SessionKind, SessionState};

fn dir_dispatcher() -> Dispatcher {
    let cfg = MirrorConfig::new("/docs", "/out/docs");
    Dispatcher::new(
        SessionKind::Dir,
        "/docs",
        cfg.mapper(),
        cfg.filter().unwrap(),
    )
}

fn p(s: &str) -> PathBuf {
    PathBuf::from(s)
}

#[test]
fn starts_initializing() {
    let d = dir_dispatcher();
    assert_eq!(d.state(), SessionState::Initializing);
}

#[test]
fn initial_scan_events_are_mirrored_before_ready() {
    let mut d = dir_dispatcher();

    let step = d.step(WatchEvent::Added(p("/docs/intro.md")));
    assert_eq!(d.state(), SessionState::Initializing);
    assert!(!step.became_active);
    assert_eq!(
        step.actions,
        vec![MirrorAction::Render {
            source: p("/docs/intro.md"),
            target: p("/out/docs/intro.md"),
            category: FileCategory::NormalDoc,
        }]
    );
}

#[test]
fn ready_activates_and_builds_skeleton_for_dir_sessions() {
    let mut d = dir_dispatcher();

    let step = d.step(WatchEvent::Ready);
    assert!(step.became_active);
    assert_eq!(d.state(), SessionState::Active);
    assert_eq!(
        step.actions,
        vec![
            MirrorAction::BuildSkeleton { root: p("/docs") },
            MirrorAction::InitialSyncComplete,
        ]
    );

    // A second ready is ignored.
    let again = d.step(WatchEvent::Ready);
    assert!(again.actions.is_empty());
    assert!(!again.became_active);
    assert_eq!(d.state(), SessionState::Active);
}

#[test]
fn file_sessions_skip_the_skeleton() {
    let cfg = MirrorConfig::new("/docs", "/out/docs");
    let mut d = Dispatcher::new(
        SessionKind::File,
        "/docs/intro.md",
        cfg.mapper(),
        cfg.filter().unwrap(),
    );

    let step = d.step(WatchEvent::Ready);
    assert_eq!(step.actions, vec![MirrorAction::InitialSyncComplete]);
    assert_eq!(d.state(), SessionState::Active);
}

#[test]
fn non_rendered_categories_are_copied() {
    let mut d = dir_dispatcher();
    d.step(WatchEvent::Ready);

    let step = d.step(WatchEvent::Changed(p("/docs/img/logo.png")));
    assert_eq!(
        step.actions,
        vec![MirrorAction::Copy {
            source: p("/docs/img/logo.png"),
            target: p("/out/docs/img/logo.png"),
        }]
    );
}

#[test]
fn template_var_renders_to_document_extension() {
    let mut d = dir_dispatcher();
    d.step(WatchEvent::Ready);

    let step = d.step(WatchEvent::Changed(p("/docs/api/endpoints.json")));
    assert_eq!(
        step.actions,
        vec![MirrorAction::Render {
            source: p("/docs/api/endpoints.json"),
            target: p("/out/docs/api/endpoints.md"),
            category: FileCategory::TemplateVar,
        }]
    );
}

#[test]
fn filtered_paths_produce_no_actions() {
    let mut d = dir_dispatcher();
    d.step(WatchEvent::Ready);

    for path in [
        "/docs/_intro.md",
        "/docs/site.vars.json",
        "/docs/_templates/page.md.tmpl",
        "/docs/node_modules/pkg/readme.md",
    ] {
        let step = d.step(WatchEvent::Changed(p(path)));
        assert!(step.actions.is_empty(), "{path} produced {:?}", step.actions);
        assert!(step.skipped, "{path} not reported as skipped");
    }
}

#[test]
fn filtering_is_not_applied_to_removals() {
    let mut d = dir_dispatcher();
    d.step(WatchEvent::Ready);

    // A removed source always removes its mirror, if any.
    let step = d.step(WatchEvent::Removed(p("/docs/guide/intro.md")));
    assert_eq!(
        step.actions,
        vec![MirrorAction::RemoveFile {
            source: p("/docs/guide/intro.md"),
            target: p("/out/docs/guide/intro.md"),
        }]
    );
}

#[test]
fn dir_removal_maps_whole_subtree() {
    let mut d = dir_dispatcher();
    d.step(WatchEvent::Ready);

    let step = d.step(WatchEvent::DirRemoved(p("/docs/guide")));
    assert_eq!(
        step.actions,
        vec![MirrorAction::RemoveTree {
            source: p("/docs/guide"),
            target: p("/out/docs/guide"),
        }]
    );
}

#[test]
fn events_outside_the_root_are_skipped() {
    let mut d = dir_dispatcher();
    d.step(WatchEvent::Ready);

    let step = d.step(WatchEvent::Changed(p("/tmp/other.md")));
    assert!(step.actions.is_empty());
    assert!(step.skipped);
}

#[test]
fn closed_session_ignores_everything() {
    let mut d = dir_dispatcher();
    d.step(WatchEvent::Ready);
    d.close();
    assert_eq!(d.state(), SessionState::Closed);

    for event in [
        WatchEvent::Added(p("/docs/a.md")),
        WatchEvent::Changed(p("/docs/a.md")),
        WatchEvent::Removed(p("/docs/a.md")),
        WatchEvent::DirRemoved(p("/docs/guide")),
        WatchEvent::Ready,
    ] {
        let step = d.step(event);
        assert!(step.actions.is_empty());
        assert!(!step.became_active);
    }
    assert_eq!(d.state(), SessionState::Closed);
}

#[test]
fn allow_all_filter_renders_fragments_verbatim() {
    let mut d = Dispatcher::new(
        SessionKind::Dir,
        "/docs",
        PathMapper::new("/docs", "/out", "md"),
        Filter::allow_all(),
    );
    d.step(WatchEvent::Ready);

    let step = d.step(WatchEvent::Changed(p("/docs/_intro.md")));
    assert_eq!(
        step.actions,
        vec![MirrorAction::Copy {
            source: p("/docs/_intro.md"),
            target: p("/out/_intro.md"),
        }]
    );
}

#[test]
fn removing_the_source_root_removes_the_target_root() {
    let mut d = dir_dispatcher();
    d.step(WatchEvent::Ready);

    let step = d.step(WatchEvent::DirRemoved(p("/docs")));
    assert_eq!(
        step.actions,
        vec![MirrorAction::RemoveTree {
            source: p("/docs"),
            target: p("/out/docs"),
        }]
    );
}
