use async_trait::async_trait;
use serde_json::json;
use slice_framework::action::ViewNameInferrer;
use slice_framework::config::ApplicationConfiguration;
use slice_framework::http::Session;
use slice_framework::mock::{MockView, RecordingViewContext, StaticInferrer, StaticRoutes};
use slice_framework::providers::monitor::Event;
use slice_framework::view::RoutesHelper;
use slice_framework::{
    Application, Capability, Collaborators, ConfigurationError, Env, FrameworkError, Monitor,
    Request, Response, Slice, Value,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// --- Test Handlers ---

/// Does nothing; rendering is left to the finish step.
struct ShowHome;

#[async_trait]
impl slice_framework::ActionHandler for ShowHome {
    fn name(&self) -> &str {
        "Main::Actions::Home::Show"
    }

    async fn handle(
        &self,
        _collaborators: &Collaborators,
        _req: &mut Request,
        _res: &mut Response,
    ) -> Result<(), FrameworkError> {
        Ok(())
    }
}

/// Writes its own body.
struct ApiStatus;

#[async_trait]
impl slice_framework::ActionHandler for ApiStatus {
    fn name(&self) -> &str {
        "Main::Actions::Api::Status"
    }

    async fn handle(
        &self,
        _collaborators: &Collaborators,
        _req: &mut Request,
        res: &mut Response,
    ) -> Result<(), FrameworkError> {
        res.set_body(json!({"status": "ok"}).to_string());
        Ok(())
    }
}

/// Opts out of auto-rendering even with a view present.
struct Redirect;

#[async_trait]
impl slice_framework::ActionHandler for Redirect {
    fn name(&self) -> &str {
        "Main::Actions::Home::Redirect"
    }

    async fn handle(
        &self,
        _collaborators: &Collaborators,
        _req: &mut Request,
        res: &mut Response,
    ) -> Result<(), FrameworkError> {
        res.set_status(302);
        res.set_header("Location", "/");
        Ok(())
    }

    fn render(&self, _collaborators: &Collaborators, _res: &Response) -> bool {
        false
    }
}

/// Remembers the signed-in user in the session.
struct SignIn;

#[async_trait]
impl slice_framework::ActionHandler for SignIn {
    fn name(&self) -> &str {
        "Main::Actions::Sessions::Create"
    }

    async fn handle(
        &self,
        _collaborators: &Collaborators,
        req: &mut Request,
        res: &mut Response,
    ) -> Result<(), FrameworkError> {
        let user_id = req.params.get("user_id").cloned().unwrap_or_default();
        req.session()?.insert("user_id", user_id);
        res.set_body("signed in");
        Ok(())
    }
}

/// Flips the theme cookie.
struct ToggleTheme;

#[async_trait]
impl slice_framework::ActionHandler for ToggleTheme {
    fn name(&self) -> &str {
        "Main::Actions::Theme::Toggle"
    }

    async fn handle(
        &self,
        _collaborators: &Collaborators,
        req: &mut Request,
        res: &mut Response,
    ) -> Result<(), FrameworkError> {
        let next = match req.cookies()?.get("theme") {
            Some("dark") => "light",
            _ => "dark",
        };
        res.cookies_mut()?.set("theme", next);
        res.set_body(next);
        Ok(())
    }
}

// --- Helpers ---

fn app_with<F>(configure: F) -> (Application, Arc<Slice>)
where
    F: FnOnce(&mut ApplicationConfiguration) -> Result<(), ConfigurationError>,
{
    let app = Application::with_env("bookshelf", Env::default());
    app.configure(configure).unwrap();
    let main = app.register_slice("main").unwrap().unwrap();
    (app, main)
}

fn default_app() -> (Application, Arc<Slice>) {
    app_with(|_| Ok(()))
}

fn inferring(candidates: &[&str]) -> Arc<dyn ViewNameInferrer> {
    Arc::new(StaticInferrer::new(candidates.iter().copied()))
}

// --- View resolution ---

#[tokio::test]
async fn test_first_registered_candidate_is_the_view() {
    let (app, main) = app_with(|c| {
        c.actions
            .set_view_name_inferrer(inferring(&["actions.home.show_view", "views.home.show"]))
    });
    let view = MockView::new();
    main.register_view("views.home.show", view.clone()).unwrap();
    view.expect_render().return_ok("<h1>Home</h1>");

    let action = app.action("main", ShowHome).unwrap().build();
    assert!(action.view().is_some());

    let res = action.call(Request::get("/")).await.unwrap();
    assert_eq!(res.body(), "<h1>Home</h1>");
    view.verify();
}

#[tokio::test]
async fn test_standard_inferrer_resolves_from_handler_name() {
    let (app, main) = default_app();
    let view = MockView::new();
    main.register_view("views.home.show", view.clone()).unwrap();
    view.expect_render().return_ok("home");

    let action = app.action("main", ShowHome).unwrap().build();
    let res = action.call(Request::get("/")).await.unwrap();
    assert_eq!(res.body(), "home");
}

#[tokio::test]
async fn test_view_registered_only_in_application_is_not_inferred() {
    let (app, _main) = default_app();
    let view = MockView::new();
    app.register("views.home.show", Arc::new(view.clone()) as Arc<dyn slice_framework::view::View>)
        .unwrap();

    let action = app.action("main", ShowHome).unwrap().build();
    assert!(action.view().is_none());
    let res = action.call(Request::get("/")).await.unwrap();
    assert_eq!(res.body(), "");
    assert_eq!(view.call_count(), 0);
}

#[tokio::test]
async fn test_wrongly_typed_view_is_ignored() {
    let (app, main) = default_app();
    main.register("views.home.show", "not a view".to_string()).unwrap();

    let action = app.action("main", ShowHome).unwrap().build();
    assert!(action.view().is_none());
}

#[tokio::test]
async fn test_explicit_collaborators_skip_resolution() {
    let (app, main) = default_app();
    main.register_view("views.home.show", MockView::new()).unwrap();
    app.register(
        "routes_helper",
        Arc::new(StaticRoutes::new()) as Arc<dyn RoutesHelper>,
    )
    .unwrap();

    let action = app
        .action("main", ShowHome)
        .unwrap()
        .no_view()
        .no_routes()
        .dependency("per_page", 25_u32)
        .build();
    assert!(action.view().is_none());
    assert!(action.routes().is_none());
    assert_eq!(action.collaborators().dependency::<u32>("per_page").unwrap(), 25);
    assert!(matches!(
        action.collaborators().dependency::<u32>("missing"),
        Err(FrameworkError::MissingCollaborator(_))
    ));
}

// --- View context & routes ---

#[tokio::test]
async fn test_view_context_falls_back_to_application_and_sees_request() {
    let (app, main) = default_app();
    let context = RecordingViewContext::new();
    app.register(
        "view.context",
        Arc::new(context.clone()) as Arc<dyn slice_framework::view::ViewContext>,
    )
    .unwrap();
    let view = MockView::new();
    main.register_view("views.home.show", view.clone()).unwrap();
    view.expect_render().return_ok("ok");

    let action = app.action("main", ShowHome).unwrap().build();
    assert!(action.view_context().is_some());

    action
        .call(Request::get("/home").with_param("page", 2))
        .await
        .unwrap();

    let received = context.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].request.as_ref().unwrap().path, "/home");

    let call = &view.calls()[0];
    assert_eq!(call.params["page"], json!(2));
    assert!(call.context.is_some());
}

#[tokio::test]
async fn test_slice_view_context_wins_over_application() {
    let (app, main) = default_app();
    let app_context = RecordingViewContext::new();
    let slice_context = RecordingViewContext::new();
    app.register(
        "view.context",
        Arc::new(app_context.clone()) as Arc<dyn slice_framework::view::ViewContext>,
    )
    .unwrap();
    main.register_view_context("view.context", slice_context.clone())
        .unwrap();
    let view = MockView::new();
    main.register_view("views.home.show", view.clone()).unwrap();
    view.expect_render().return_ok("ok");

    app.action("main", ShowHome)
        .unwrap()
        .build()
        .call(Request::get("/"))
        .await
        .unwrap();
    assert_eq!(slice_context.received().len(), 1);
    assert!(app_context.received().is_empty());
}

#[tokio::test]
async fn test_routes_come_from_application_only() {
    let (app, main) = default_app();
    main.register_routes("routes_helper", StaticRoutes::new()).unwrap();
    assert!(app.action("main", ShowHome).unwrap().build().routes().is_none());

    app.register(
        "routes_helper",
        Arc::new(StaticRoutes::new().route("book", "/books/:id")) as Arc<dyn RoutesHelper>,
    )
    .unwrap();
    let action = app.action("main", ShowHome).unwrap().build();
    let mut params = slice_framework::Params::new();
    params.insert("id".into(), json!(7));
    assert_eq!(action.routes().unwrap().path("book", &params).unwrap(), "/books/7");
}

// --- Render decision ---

#[tokio::test]
async fn test_non_empty_body_is_not_rendered() {
    let (app, main) = default_app();
    let view = MockView::new();
    main.register_view("views.api.status", view.clone()).unwrap();

    let res = app
        .action("main", ApiStatus)
        .unwrap()
        .build()
        .call(Request::get("/status"))
        .await
        .unwrap();
    assert_eq!(res.body(), r#"{"status":"ok"}"#);
    assert_eq!(view.call_count(), 0);
    assert!(res.is_finalized());
}

#[tokio::test]
async fn test_no_view_means_no_render() {
    let (app, _main) = default_app();
    let action = app.action("main", ShowHome).unwrap().build();
    let res = action.call(Request::get("/")).await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.body(), "");
}

#[tokio::test]
async fn test_render_hook_can_opt_out() {
    let (app, main) = default_app();
    let view = MockView::new();
    main.register_view("views.home.redirect", view.clone()).unwrap();

    let action = app.action("main", Redirect).unwrap().build();
    assert!(action.view().is_some());
    let res = action.call(Request::get("/")).await.unwrap();
    assert_eq!(res.status(), 302);
    assert_eq!(view.call_count(), 0);
}

#[tokio::test]
async fn test_render_errors_propagate() {
    let (app, main) = default_app();
    let view = MockView::new();
    main.register_view("views.home.show", view.clone()).unwrap();
    view.expect_render()
        .return_err(FrameworkError::Render("boom".into()));

    let result = app
        .action("main", ShowHome)
        .unwrap()
        .build()
        .call(Request::get("/"))
        .await;
    assert!(matches!(result, Err(FrameworkError::Render(_))));
}

// --- Capabilities ---

#[tokio::test]
async fn test_sessions_enabled_exposes_session() {
    let (app, _main) = app_with(|c| {
        c.actions.set_sessions("cookie")?;
        c.actions.set_csrf_protection(false)
    });
    let base = app.action_base("main").unwrap();
    assert!(base.has(Capability::Sessions));
    assert!(!base.has(Capability::CsrfProtection));

    let session = Session::new();
    let res = app
        .action("main", SignIn)
        .unwrap()
        .build()
        .call(
            Request::post("/sessions")
                .with_session(session.clone())
                .with_param("user_id", 42),
        )
        .await
        .unwrap();
    assert_eq!(res.body(), "signed in");
    assert_eq!(session.get("user_id"), Some(json!(42)));
}

#[tokio::test]
async fn test_sessions_disabled_raises_descriptive_error() {
    let (app, _main) = default_app();
    assert!(!app.action_base("main").unwrap().has(Capability::Sessions));

    let err = app
        .action("main", SignIn)
        .unwrap()
        .build()
        .call(Request::post("/sessions").with_session(Session::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, FrameworkError::MissingSession { .. }));
    assert_eq!(
        err.to_string(),
        "To use `session`, please enable sessions for the current slice"
    );
}

#[tokio::test]
async fn test_csrf_follows_sessions_and_rejects_forged_posts() {
    let (app, _main) = app_with(|c| c.actions.set_sessions("cookie"));
    assert!(app
        .action_base("main")
        .unwrap()
        .has(Capability::CsrfProtection));

    let action = app.action("main", SignIn).unwrap().build();
    let forged = action
        .call(Request::post("/sessions").with_param("_csrf_token", "guess"))
        .await;
    assert!(matches!(forged, Err(FrameworkError::InvalidCsrfToken)));

    let session = Session::new();
    session.insert("_csrf_token", "t0ken");
    let res = action
        .call(
            Request::post("/sessions")
                .with_session(session)
                .with_param("_csrf_token", "t0ken"),
        )
        .await
        .unwrap();
    assert_eq!(res.body(), "signed in");
}

#[tokio::test]
async fn test_cookies_are_read_and_written() {
    let (app, _main) = app_with(|c| {
        let mut options = BTreeMap::new();
        options.insert("path".to_string(), Value::from("/"));
        c.actions.set_cookies(Value::Map(options))
    });
    let res = app
        .action("main", ToggleTheme)
        .unwrap()
        .build()
        .call(Request::get("/theme").with_header("Cookie", "theme=dark"))
        .await
        .unwrap();
    assert_eq!(res.body(), "light");
    assert_eq!(res.header("Set-Cookie"), Some("theme=light; path=/"));
}

#[tokio::test]
async fn test_cookies_disabled_raises() {
    let (app, _main) = app_with(|c| c.actions.set_cookies(false));
    let err = app
        .action("main", ToggleTheme)
        .unwrap()
        .build()
        .call(Request::get("/theme"))
        .await
        .unwrap_err();
    assert!(matches!(err, FrameworkError::MissingCookies { .. }));
}

// --- Action base lifecycle ---

#[tokio::test]
async fn test_action_base_is_a_snapshot_until_reset() {
    let (app, main) = default_app();
    let before = app.action_base("main").unwrap();
    assert!(!before.has(Capability::Sessions));

    main.configure_actions(|actions| actions.set_sessions("cookie"))
        .unwrap();
    assert!(!app.action_base("main").unwrap().has(Capability::Sessions));

    app.reset_action_base("main");
    let after = app.action_base("main").unwrap();
    assert!(after.has(Capability::Sessions));
    assert!(after.has(Capability::CsrfProtection));
}

#[tokio::test]
async fn test_application_actions_configured_after_registration_reach_slice() {
    let (app, main) = default_app();
    app.configure(|c| c.actions.set_sessions("cookie")).unwrap();

    assert!(main.actions_config().sessions_enabled());
    let base = app.action_base("main").unwrap();
    assert!(base.has(Capability::Sessions));
    assert!(base.has(Capability::CsrfProtection));
}

#[tokio::test]
async fn test_slice_override_survives_later_application_changes() {
    let (app, main) = default_app();
    main.configure_actions(|actions| actions.set_csrf_protection(false))
        .unwrap();
    app.configure(|c| c.actions.set_sessions("cookie")).unwrap();

    let base = app.action_base("main").unwrap();
    assert!(base.has(Capability::Sessions));
    assert!(!base.has(Capability::CsrfProtection));
}

#[tokio::test]
async fn test_slice_actions_are_frozen_after_prepare() {
    let (app, main) = default_app();
    app.prepare().unwrap();

    let err = main
        .configure_actions(|actions| actions.set_sessions("cookie"))
        .unwrap_err();
    assert!(err.is_misconfiguration());
    assert!(matches!(
        err,
        FrameworkError::Configuration(ConfigurationError::Finalized { .. })
    ));
    app.reset_action_base("main");
    assert!(!app.action_base("main").unwrap().has(Capability::Sessions));
}

#[tokio::test]
async fn test_slices_have_independent_bases() {
    let app = Application::with_env("bookshelf", Env::default());
    let _main = app.register_slice("main").unwrap().unwrap();
    let admin = app.register_slice("admin").unwrap().unwrap();
    admin
        .configure_actions(|actions| actions.set_sessions("cookie"))
        .unwrap();

    assert!(!app.action_base("main").unwrap().has(Capability::Sessions));
    assert!(app.action_base("admin").unwrap().has(Capability::Sessions));
    assert!(matches!(
        app.action_base("reports"),
        Err(FrameworkError::SliceNotFound(_))
    ));
}

// --- Response defaults, instrumentation, inspect ---

#[tokio::test]
async fn test_default_headers_and_format_apply_to_response() {
    let (app, _main) = app_with(|c| {
        let mut headers = BTreeMap::new();
        headers.insert("X-Frame-Options".to_string(), Value::from("DENY"));
        c.actions.set_default_headers(Value::Map(headers))?;
        c.actions.set_default_response_format("json")
    });
    let res = app
        .action("main", ApiStatus)
        .unwrap()
        .build()
        .call(Request::get("/status"))
        .await
        .unwrap();
    assert_eq!(res.header("x-frame-options"), Some("DENY"));
    assert_eq!(res.header("content-type"), Some("application/json; charset=utf-8"));
    assert_eq!(res.format(), Some("json"));
    assert_eq!(res.charset(), Some("utf-8"));
}

#[tokio::test]
async fn test_action_calls_are_instrumented() {
    let (app, _main) = default_app();
    app.prepare().unwrap();
    let events = Arc::new(Mutex::new(Vec::<Event>::new()));
    let sink = Arc::clone(&events);
    app.get::<Monitor>("rack.monitor")
        .unwrap()
        .subscribe("action.call", move |event| sink.lock().unwrap().push(event.clone()));

    app.action("main", ApiStatus)
        .unwrap()
        .build()
        .call(Request::get("/status"))
        .await
        .unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload["slice"], json!("main"));
    assert_eq!(events[0].payload["status"], json!(200));
}

#[tokio::test]
async fn test_debug_output_names_action_and_slice() {
    let (app, _main) = default_app();
    let action = app.action("main", ShowHome).unwrap().build();
    assert_eq!(format!("{action:?}"), "#<Main::Actions::Home::Show[main]>");
}
