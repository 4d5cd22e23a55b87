use pretty_assertions::assert_eq;
use respond_lib::dom::dom_tree::{Node, NodeRef};
use respond_lib::{
    create_dom_tree, Engine, EngineConfig, FsSheetSource, ManualClock, RespondError,
    SharedViewport, SheetSource,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Responsive</title>
<link rel="stylesheet" href="css/site.css">
<link rel="stylesheet" href="css/print.css" media="print">
<link rel="stylesheet" href="http://cdn.example.net/lib.css">
<script src="app.js"></script>
</head>
<body><p>Hello</p></body>
</html>"#;

const SITE_CSS: &str = r#"
body { margin: 0; }
@media screen and (min-width: 600px) {
    .nav { display: flex; background: url(images/nav.png); }
}
@media screen and (max-width: 599px) {
    .nav { display: block; }
}
@media screen and (min-width: 600px) and (max-width: 800px), print {
    .sidebar { display: none; }
}
"#;

#[derive(Default)]
struct MemorySource {
    sheets: HashMap<String, String>,
    fetched: Vec<String>,
}

impl MemorySource {
    fn with(sheets: &[(&str, &str)]) -> Self {
        MemorySource {
            sheets: sheets
                .iter()
                .map(|(href, css)| (href.to_string(), css.to_string()))
                .collect(),
            fetched: Vec::new(),
        }
    }
}

impl SheetSource for MemorySource {
    fn fetch(&mut self, href: &str) -> respond_lib::error::Result<Option<String>> {
        self.fetched.push(href.to_string());
        Ok(self.sheets.get(href).cloned())
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup(width: f64) -> (Engine, SharedViewport, ManualClock) {
    init_logging();
    let viewport = SharedViewport::new(width);
    let clock = ManualClock::new(0);
    let engine = Engine::new(create_dom_tree(PAGE), viewport.clone())
        .with_clock(clock.clone())
        .with_config(EngineConfig {
            page_host: Some("example.com".to_string()),
            ..EngineConfig::default()
        });
    (engine, viewport, clock)
}

fn injected_styles(engine: &Engine) -> Vec<(String, String)> {
    engine
        .injected()
        .iter()
        .map(|node: &NodeRef| match &*node.borrow() {
            Node::Element(elem) => (
                elem.attr("media").unwrap_or_default().to_string(),
                elem.text_content(),
            ),
            other => panic!("injected a non-element: {:?}", other),
        })
        .collect()
}

#[test]
fn update_parses_same_origin_sheets_once() {
    let (mut engine, _, _) = setup(1024.0);
    let mut source = MemorySource::with(&[
        ("css/site.css", SITE_CSS),
        ("css/print.css", ".ad { display: none; }"),
    ]);

    engine.update(&mut source).unwrap();
    engine.update(&mut source).unwrap();

    assert_eq!(source.fetched, vec!["css/site.css", "css/print.css"]);
    // three blocks in site.css (one with two conditions) plus the print sheet
    assert_eq!(engine.rules().len(), 4);
    assert_eq!(engine.descriptors().len(), 5);
}

#[test]
fn wide_viewport_injects_screen_and_print_buckets() {
    let (mut engine, _, _) = setup(1024.0);
    let mut source = MemorySource::with(&[
        ("css/site.css", SITE_CSS),
        ("css/print.css", ".ad { display: none; }"),
    ]);
    engine.update(&mut source).unwrap();

    let styles = injected_styles(&engine);
    assert_eq!(
        styles,
        vec![
            (
                "screen".to_string(),
                "\n    .nav { display: flex; background: url(css/images/nav.png); }\n".to_string()
            ),
            (
                "print".to_string(),
                "\n    .sidebar { display: none; }\n\n.ad { display: none; }".to_string()
            ),
        ]
    );
}

#[test]
fn injected_styles_follow_last_link() {
    let (mut engine, _, _) = setup(700.0);
    engine
        .parse(SITE_CSS, "http://example.com/css/site.css", None)
        .unwrap();

    let html = engine.document().to_html();
    let link = html.find(r#"href="http://cdn.example.net/lib.css">"#).unwrap();
    let style = html.find("<style").unwrap();
    let script = html.find("<script").unwrap();
    assert!(link < style && style < script, "{}", html);
    assert!(html.contains("url(http://example.com/css/images/nav.png)"));
    assert!(html.contains(".sidebar { display: none; }"));
}

#[test]
fn resize_swaps_active_rules() {
    let (mut engine, viewport, clock) = setup(1024.0);
    engine.parse(SITE_CSS, "css/site.css", None).unwrap();
    assert!(engine.document().to_html().contains("display: flex"));

    clock.advance(100);
    viewport.set_width(400.0);
    engine.on_viewport_change().unwrap();

    let html = engine.document().to_html();
    assert!(html.contains(".nav { display: block; }"));
    assert!(!html.contains("display: flex"));
    assert_eq!(html.matches("<style").count(), 2, "screen and print buckets");
}

#[test]
fn live_query_lifecycle() {
    let (mut engine, viewport, clock) = setup(400.0);
    let query = engine.match_media("(max-width: 500px)").unwrap();
    assert!(query.matches());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let id = query.add_listener(move |q| {
        log.borrow_mut().push((q.media().to_string(), q.matches()));
        Ok(())
    });
    let other_calls = Rc::new(Cell::new(0));
    let counter = other_calls.clone();
    query.add_listener(move |_| {
        counter.set(counter.get() + 1);
        Ok(())
    });

    clock.advance(100);
    viewport.set_width(600.0);
    engine.on_viewport_change().unwrap();
    assert!(!query.matches());
    assert_eq!(
        *seen.borrow(),
        vec![("(max-width: 500px)".to_string(), false)]
    );

    assert!(query.remove_listener(id));
    clock.advance(100);
    viewport.set_width(300.0);
    engine.on_viewport_change().unwrap();
    assert!(query.matches());
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(other_calls.get(), 2);
}

#[test]
fn query_without_listeners_keeps_evaluating() {
    let (mut engine, viewport, _) = setup(400.0);
    let query = engine.match_media("screen and (min-width: 30em), print").unwrap();
    assert!(query.matches(), "print branch is unconstrained");

    let wide_only = engine.match_media("(min-width: 30em)").unwrap();
    assert!(wide_only.matches(), "em bounds compare unconverted: 400 >= 30");

    viewport.set_width(20.0);
    engine.apply().unwrap();
    assert!(!wide_only.matches());
    assert!(query.matches());
}

#[test]
fn failing_listener_propagates() {
    let (mut engine, viewport, _) = setup(400.0);
    let query = engine.match_media("(max-width: 500px)").unwrap();
    let reached = Rc::new(Cell::new(false));
    query.add_listener(|_| Err("listener failed".into()));
    let flag = reached.clone();
    query.add_listener(move |_| {
        flag.set(true);
        Ok(())
    });

    viewport.set_width(900.0);
    let err = engine.apply().unwrap_err();
    assert!(matches!(err, RespondError::Listener { ref media, .. } if media == "(max-width: 500px)"));
    assert_eq!(err.to_string(), "listener for media query `(max-width: 500px)` failed");
    assert!(!reached.get());
    assert!(!query.matches());

    // Already committed: the next pass has nothing to report.
    engine.apply().unwrap();
}

#[test]
fn media_attribute_guards_plain_sheet() {
    let (mut engine, viewport, _) = setup(1024.0);
    engine
        .parse(".big { font-size: 2em; }", "css/big.css", Some("(min-width: 900px)"))
        .unwrap();
    assert_eq!(
        injected_styles(&engine),
        vec![("all".to_string(), ".big { font-size: 2em; }".to_string())]
    );

    viewport.set_width(800.0);
    engine.apply().unwrap();
    assert!(injected_styles(&engine).is_empty());
}

#[test]
fn sheet_without_conditions_is_left_alone() {
    let (mut engine, _, _) = setup(1024.0);
    let added = engine.parse("p { color: red; }", "css/plain.css", None).unwrap();
    assert!(added.is_empty());
    assert!(engine.injected().is_empty());
}

#[test]
fn fs_source_failures_are_skipped() {
    let (mut engine, _, _) = setup(1024.0);
    let missing = std::env::temp_dir().join(format!("respond-missing-{}", std::process::id()));
    engine.update(&mut FsSheetSource::new(missing)).unwrap();
    assert!(engine.rules().is_empty());
}

#[test]
fn query_created_during_failing_pass_stays_reachable() {
    let (mut engine, viewport, _) = setup(400.0);
    let failing = engine.match_media("(max-width: 500px)").unwrap();
    failing.add_listener(|_| Err("listener failed".into()));

    viewport.set_width(900.0);
    let err = engine.match_media("(min-width: 800px)").unwrap_err();
    assert!(matches!(err, RespondError::Listener { .. }));

    let created = engine.rules().queries().last().cloned().unwrap();
    assert_eq!(created.media(), "(min-width: 800px)");
    assert!(!created.matches(), "dispatch stopped before reaching it");

    engine.apply().unwrap();
    assert!(created.matches());

    viewport.set_width(600.0);
    engine.apply().unwrap();
    assert!(!created.matches());
}
