//! End-to-end coverage of the one-shot `bind` API: single apps, composed
//! apps with overriding template roots, filters, globals, custom tags, and
//! request-context processors.

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use minijinja::Value;
use serde_json::json;
use tempfile::TempDir;
use viewbind::{
    app_ref, bind, AppRef, BasicApp, Config, ContextProcessor, FsLoader, RequestLocals,
    TagDelimiters, TemplateLoader, ViewContext, ViewError,
};

fn fixture(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

fn app_with(dir: &TempDir) -> AppRef {
    app_ref(BasicApp::new(vec![dir.path().to_path_buf()]))
}

fn render(app: &AppRef, name: &str, vars: serde_json::Value) -> Result<String, ViewError> {
    let vars = match vars {
        serde_json::Value::Object(map) => map,
        _ => ViewContext::new(),
    };
    app.borrow().render(name, vars, &RequestLocals::new())
}

/// Alternating-case filter, the classic smoke test for user filters.
fn snake(value: Value, _args: &[Value]) -> Result<Value, minijinja::Error> {
    let text = value.as_str().unwrap_or_default();
    let snaked: String = text
        .chars()
        .enumerate()
        .map(|(i, ch)| {
            if i % 2 == 0 {
                ch.to_ascii_uppercase()
            } else {
                ch.to_ascii_lowercase()
            }
        })
        .collect();
    Ok(Value::from(snaked))
}

#[test]
fn simple_page() {
    let t = fixture(&[("simple.html", "<h1>{{ title }}</h1>")]);
    let app = app_with(&t);

    bind(vec![app.clone()], Config::new()).unwrap();

    let out = render(&app, "simple", json!({"title": "simple page"})).unwrap();
    assert!(out.contains("simple page"));
}

#[test]
fn custom_filters() {
    let t = fixture(&[("filters.html", "{{ title|snake }}")]);
    let app = app_with(&t);

    bind(vec![app.clone()], Config::new().filter("snake", snake)).unwrap();

    let out = render(&app, "filters", json!({"title": "snake"})).unwrap();
    assert!(out.contains("SnAkE"));
}

#[test]
fn custom_globals() {
    let t = fixture(&[("globals.html", "{{ brand }}: {{ title }}")]);
    let app = app_with(&t);

    bind(
        vec![app.clone()],
        Config::new().global("brand", json!("mysite")),
    )
    .unwrap();

    let out = render(&app, "globals", json!({"title": "front"})).unwrap();
    assert!(out.contains("mysite: front"));
}

#[test]
fn custom_tags() {
    let t = fixture(&[("tags.html", "<$ title $> <# ignored #><% if title %>!<% endif %>")]);
    let app = app_with(&t);

    let tags = TagDelimiters {
        block: ("<%".into(), "%>".into()),
        variable: ("<$".into(), "$>".into()),
        comment: ("<#".into(), "#>".into()),
    };
    bind(vec![app.clone()], Config::new().tags(tags)).unwrap();

    let out = render(&app, "tags", json!({"title": "custom tags"})).unwrap();
    assert!(out.contains("custom tags"));
    assert!(out.contains('!'));
    assert!(!out.contains("ignored"));
}

#[test]
fn extended_template() {
    let t = fixture(&[
        (
            "base.html",
            "### base ###{% block content %}{% endblock %}",
        ),
        (
            "extended.html",
            "{% extends \"base.html\" %}{% block content %}### extended: {{ title }} ###{% endblock %}",
        ),
    ]);
    let app = app_with(&t);

    bind(vec![app.clone()], Config::new()).unwrap();

    let out = render(&app, "extended", json!({"title": "base page"})).unwrap();
    assert!(out.contains("### base ###"));
    assert!(out.contains("### extended: base page ###"));
}

#[test]
fn multiple_dirs_first_match_wins() {
    let t = fixture(&[("page.html", "from t"), ("only-t.html", "only t")]);
    let t1 = fixture(&[("page.html", "from t1"), ("only-t1.html", "only t1")]);

    let app = app_ref(BasicApp::new(vec![
        t.path().to_path_buf(),
        t1.path().to_path_buf(),
    ]));
    bind(vec![app.clone()], Config::new()).unwrap();

    assert_eq!(render(&app, "page", json!({})).unwrap(), "from t");
    assert_eq!(render(&app, "only-t", json!({})).unwrap(), "only t");
    assert_eq!(render(&app, "only-t1", json!({})).unwrap(), "only t1");
}

#[test]
fn custom_extension() {
    let t = fixture(&[("custom-ext.njk", "{{ title }}")]);
    let app = app_ref(
        BasicApp::new(vec![t.path().to_path_buf()]).with_view_ext("njk"),
    );

    bind(vec![app.clone()], Config::new()).unwrap();

    let out = render(&app, "custom-ext", json!({"title": "custom ext"})).unwrap();
    assert!(out.contains("custom ext"));
}

#[test]
fn no_apps_is_rejected() {
    assert!(matches!(
        bind(vec![], Config::new()),
        Err(ViewError::NoApplications)
    ));
}

#[test]
fn context_processors_feed_the_render() {
    let t = fixture(&[(
        "ctx-proc.html",
        "{{ title }}|{{ scripts[0] }}|{{ styles[0] }}",
    )]);
    let app = app_with(&t);

    let views = bind(vec![app.clone()], Config::new()).unwrap();

    struct Req;
    let assets: ContextProcessor<Req> = Rc::new(|_req, ctx| {
        ctx.insert("scripts".into(), json!(["index.js"]));
        ctx.insert("styles".into(), json!(["index.css"]));
    });
    let middleware = views.ctx_proc(vec![assets]);

    let mut locals = RequestLocals::new();
    middleware(&Req, &mut locals);

    let mut vars = ViewContext::new();
    vars.insert("title".into(), json!("ctx proc"));
    let out = app.borrow().render("ctx-proc", vars, &locals).unwrap();
    assert_eq!(out, "ctx proc|index.js|index.css");
}

#[test]
fn explicit_vars_beat_processor_keys() {
    let t = fixture(&[("page.html", "{{ title }}")]);
    let app = app_with(&t);
    let views = bind(vec![app.clone()], Config::new()).unwrap();

    struct Req;
    let titler: ContextProcessor<Req> = Rc::new(|_req, ctx| {
        ctx.insert("title".into(), json!("from processor"));
    });
    let middleware = views.ctx_proc(vec![titler]);

    let mut locals = RequestLocals::new();
    middleware(&Req, &mut locals);

    let mut vars = ViewContext::new();
    vars.insert("title".into(), json!("explicit"));
    let out = app.borrow().render("page", vars, &locals).unwrap();
    assert_eq!(out, "explicit");

    // Without explicit vars the processor value shows through.
    let out = app
        .borrow()
        .render("page", ViewContext::new(), &locals)
        .unwrap();
    assert_eq!(out, "from processor");
}

#[test]
fn multiple_apps_share_one_environment() {
    let root_t = fixture(&[("index.html", "app index")]);
    let sub_t = fixture(&[("subapp/index.html", "subapp index")]);

    let app = app_with(&root_t);
    let sub = app_with(&sub_t);

    let views = bind(vec![app.clone(), sub.clone()], Config::new()).unwrap();

    assert!(render(&app, "index", json!({})).unwrap().contains("app index"));
    assert!(render(&sub, "subapp/index", json!({}))
        .unwrap()
        .contains("subapp index"));

    // One environment behind both apps.
    assert_eq!(
        views.env.template_roots(),
        vec![root_t.path().to_path_buf(), sub_t.path().to_path_buf()]
    );
}

#[test]
fn root_app_overrides_subapp_template() {
    let templates = fixture(&[("index.html", "app index")]);
    let templates1 = fixture(&[("subapp/index.html", "override subapp index")]);
    let sub_t = fixture(&[("subapp/index.html", "subapp index")]);

    let app = app_ref(BasicApp::new(vec![
        templates.path().to_path_buf(),
        templates1.path().to_path_buf(),
    ]));
    let sub = app_with(&sub_t);

    bind(vec![app, sub.clone()], Config::new()).unwrap();

    let out = render(&sub, "subapp/index", json!({})).unwrap();
    assert!(out.contains("override subapp index"));
}

#[test]
fn alternate_loader_constructor() {
    let t = fixture(&[("index.html", "Post list")]);
    let app = app_with(&t);

    let config = Config::new().loader(Box::new(|dirs: Vec<PathBuf>, _opts| {
        Ok(Arc::new(FsLoader::new(dirs)?) as Arc<dyn TemplateLoader>)
    }));
    bind(vec![app.clone()], config).unwrap();

    assert!(render(&app, "index", json!({})).unwrap().contains("Post list"));
}

#[test]
fn watch_mode_picks_up_edits_between_renders() {
    let t = fixture(&[("live.html", "first version")]);
    let app = app_with(&t);

    bind(vec![app.clone()], Config::new().watch(true)).unwrap();

    assert_eq!(render(&app, "live", json!({})).unwrap(), "first version");
    fs::write(t.path().join("live.html"), "second version, longer").unwrap();
    assert_eq!(
        render(&app, "live", json!({})).unwrap(),
        "second version, longer"
    );
}
