use crate::dict::{
    DEFAULT_LANGUAGE, DEFAULT_WORDS_URL, DictError, DictStore, HttpSource, WordDef, WordSource,
};
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::outline::OutlineEntry;
use crate::pages::{grammar_sections, introduction_markdown, render_grammar};
use crate::popover::{PopoverLayout, Rect, Viewport, place};
use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use markdown::{Options as MarkdownOptions, to_html_with_options};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

pub struct AppState<S = HttpSource> {
    pub dict: DictStore<S>,
    pub dispatcher: Dispatcher,
    pub base_url: String,
}

type SharedState<S> = Arc<AppState<S>>;

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub words_url: String,
    pub base_url: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            words_url: DEFAULT_WORDS_URL.to_string(),
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

pub async fn serve(config: WebConfig) -> Result<(), WebError> {
    let state = Arc::new(AppState {
        dict: DictStore::new(HttpSource::new(config.words_url.clone())),
        dispatcher: Dispatcher::new(),
        base_url: config.base_url.clone(),
    });
    let router = build_router(state);
    info!(
        addr = %config.addr,
        words = %config.words_url,
        base = %config.base_url,
        "Binding HTTP listener"
    );
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

pub fn build_router<S>(state: SharedState<S>) -> Router
where
    S: WordSource + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(home::<S>))
        .route("/grammar", get(grammar::<S>))
        .route("/dictionary", get(dictionary::<S>))
        .route("/tools", get(tools))
        .route("/api/search", get(api_search::<S>))
        .route("/api/word", get(api_word::<S>))
        .route("/api/popover", post(api_popover::<S>))
        .route("/api/popover/dismiss", post(api_popover_dismiss::<S>))
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

impl From<DictError> for ApiError {
    fn from(value: DictError) -> Self {
        ApiError::bad_gateway(value.to_string())
    }
}

const SITE_CSS: &str = r#"
    body { font-family: system-ui, sans-serif; margin: 0; color: #1e293b; background: #f8fafc; }
    header { background: #0f172a; color: #f8fafc; padding: 0.75rem 1.5rem; display: flex; gap: 1.25rem; align-items: baseline; }
    header a { color: #e2e8f0; text-decoration: none; font-weight: 600; }
    header a:hover { text-decoration: underline; }
    header .brand { font-size: 1.2rem; color: #fff; }
    main { max-width: 64rem; margin: 0 auto; padding: 1.5rem; }
    .tm-word { color: #1d4ed8; cursor: pointer; }
    .tm-word:hover { text-decoration: underline; }
    .example { margin: 0.5rem 0 0.5rem 1.25rem; }
    .example .tm { font-weight: 600; margin-right: 0.75rem; }
    .example .translation { color: #64748b; font-style: italic; }
    .badge { font-size: 0.7rem; background: #fbbf24; color: #451a03; border-radius: 0.5rem; padding: 0.1rem 0.4rem; vertical-align: middle; }
    .layout { display: flex; gap: 2rem; }
    nav.toc { min-width: 14rem; font-size: 0.9rem; }
    nav.toc ol { padding-left: 1.1rem; }
    nav.toc a { text-decoration: none; color: #334155; }
    .notice { background: #fef9c3; border: 1px solid #fde047; padding: 0.5rem 0.75rem; border-radius: 0.375rem; margin-bottom: 1rem; }
    table { border-collapse: collapse; width: 100%; }
    th, td { text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid #e2e8f0; vertical-align: top; }
    .pos { color: #64748b; font-size: 0.85rem; }
    #tm-popover { position: absolute; background: #fff; border: 1px solid #cbd5e1; border-radius: 0.5rem; box-shadow: 0 8px 24px rgba(15, 23, 42, 0.15); padding: 0.75rem; z-index: 50; }
    #tm-popover .tip { position: absolute; top: -7px; width: 12px; height: 12px; background: #fff; border-left: 1px solid #cbd5e1; border-top: 1px solid #cbd5e1; transform: rotate(45deg); }
    #tm-popover h3 { margin: 0 0 0.25rem; }
"#;

const POPOVER_JS: &str = r#"
    (function () {
      function dismiss() {
        var popover = document.getElementById('tm-popover');
        if (popover) {
          popover.remove();
          fetch('/api/popover/dismiss', { method: 'POST' });
        }
      }
      function show(data) {
        dismiss();
        if (data.outcome !== 'shown' || !data.layout || !data.entry) { return; }
        var popover = document.createElement('div');
        popover.id = 'tm-popover';
        popover.style.top = data.layout.top + 'px';
        popover.style.left = data.layout.left + 'px';
        popover.style.width = data.layout.width + 'px';
        var tip = document.createElement('div');
        tip.className = 'tip';
        tip.style.left = data.layout.tip_offset + 'px';
        popover.appendChild(tip);
        var title = document.createElement('h3');
        title.textContent = data.entry.emoji + ' ' + data.entry.word;
        popover.appendChild(title);
        var gloss = document.createElement('p');
        gloss.textContent = data.entry.short;
        popover.appendChild(gloss);
        document.body.appendChild(popover);
      }
      document.addEventListener('click', function (event) {
        var anchor = event.target.closest('.tm-word');
        if (!anchor) {
          dismiss();
          return;
        }
        var rect = anchor.getBoundingClientRect();
        var lang = new URLSearchParams(window.location.search).get('lang');
        fetch('/api/popover' + (lang ? '?lang=' + encodeURIComponent(lang) : ''), {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({
            word: anchor.dataset.word,
            anchor: anchor.id,
            anchor_rect: { top: rect.top, left: rect.left, width: rect.width, height: rect.height },
            viewport: {
              width: window.innerWidth,
              height: window.innerHeight,
              scroll_x: window.scrollX,
              scroll_y: window.scrollY
            }
          })
        }).then(function (response) { return response.json(); })
          .then(show);
      });
    })();
"#;

fn nav_html() -> &'static str {
    r#"<header>
      <a class="brand" href="/">toki ma</a>
      <a href="/grammar">Grammar</a>
      <a href="/dictionary">Dictionary</a>
      <a href="/tools">Tools</a>
    </header>"#
}

async fn home<S>(State(state): State<SharedState<S>>) -> impl IntoResponse
where
    S: WordSource + Send + Sync + 'static,
{
    let intro = render_markdown(introduction_markdown());
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>toki ma</title>
    <link rel="canonical" href="{base_url}/">
    <style>{css}</style>
  </head>
  <body>
    {nav}
    <main>{intro}</main>
  </body>
</html>"#,
        base_url = state.base_url,
        css = SITE_CSS,
        nav = nav_html(),
        intro = intro,
    ))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "tokima-site" }))
}

#[derive(Debug, Deserialize)]
struct LangParams {
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    exact: Option<bool>,
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WordParams {
    word: Option<String>,
    lang: Option<String>,
}

fn requested_language(lang: &Option<String>) -> &str {
    lang.as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_LANGUAGE)
}

fn fallback_note(requested: &str, resolved: &str) -> String {
    format!("No word list for {requested:?}; showing {resolved} definitions.")
}

async fn grammar<S>(
    State(state): State<SharedState<S>>,
    Query(params): Query<LangParams>,
) -> impl IntoResponse
where
    S: WordSource + Send + Sync + 'static,
{
    let lang = requested_language(&params.lang);
    // The word list is only needed once a word is clicked, but
    // resolving it up front surfaces fetch failures and the language
    // fallback banner on page load instead of on first click.
    let note = match state.dict.word_list(lang).await {
        Ok(resolved) if resolved.fell_back() => {
            Some(fallback_note(&resolved.requested, &resolved.resolved))
        }
        Ok(_) => None,
        Err(err) => return Html(render_error_page(err.to_string())),
    };
    let page = match render_grammar(&grammar_sections()) {
        Ok(page) => page,
        Err(err) => return Html(render_error_page(err.to_string())),
    };
    let template = GrammarTemplate {
        css: SITE_CSS,
        js: POPOVER_JS,
        nav: nav_html(),
        toc: outline_list_html(page.outline.roots()),
        body: page.html,
        fallback_note: note,
    };
    Html(
        template
            .render()
            .unwrap_or_else(|err| render_error_page(err.to_string())),
    )
}

async fn dictionary<S>(
    State(state): State<SharedState<S>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse
where
    S: WordSource + Send + Sync + 'static,
{
    let lang = requested_language(&params.lang);
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    let exact = params.exact.unwrap_or(false);
    let resolved = match state.dict.word_list(lang).await {
        Ok(resolved) => resolved,
        Err(err) => return Html(render_error_page(err.to_string())),
    };
    let languages = match state.dict.languages().await {
        Ok(languages) => languages,
        Err(err) => return Html(render_error_page(err.to_string())),
    };
    let note = resolved
        .fell_back()
        .then(|| fallback_note(&resolved.requested, &resolved.resolved));
    let rows: Vec<EntryRow> = if query.is_empty() {
        Vec::new()
    } else {
        resolved
            .list
            .search(query, exact)
            .into_iter()
            .map(|def| EntryRow {
                definitions: def
                    .definitions()
                    .map(|(pos, text)| {
                        (resolved.list.label_for(pos).to_string(), text.to_string())
                    })
                    .collect(),
                def: def.clone(),
            })
            .collect()
    };
    let canonical = format!(
        "{}/dictionary?q={}&lang={}",
        state.base_url,
        encode_component(query),
        encode_component(&resolved.resolved),
    );
    let template = DictionaryTemplate {
        css: SITE_CSS,
        js: POPOVER_JS,
        nav: nav_html(),
        canonical,
        query: query.to_string(),
        exact,
        searched: !query.is_empty(),
        lang: resolved.resolved.clone(),
        languages,
        fallback_note: note,
        rows,
    };
    Html(
        template
            .render()
            .unwrap_or_else(|err| render_error_page(err.to_string())),
    )
}

async fn tools() -> impl IntoResponse {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>toki ma • Tools</title>
    <style>{css}</style>
  </head>
  <body>
    {nav}
    <main>
      <h1>Tools</h1>
      <p>Community tools for toki ma will appear here.</p>
    </main>
  </body>
</html>"#,
        css = SITE_CSS,
        nav = nav_html(),
    ))
}

#[derive(Debug, Serialize)]
struct SearchResponsePayload {
    query: String,
    exact: bool,
    requested: String,
    resolved: String,
    results: Vec<WordDef>,
}

async fn api_search<S>(
    State(state): State<SharedState<S>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponsePayload>, ApiError>
where
    S: WordSource + Send + Sync + 'static,
{
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter `q` is required"))?;
    let exact = params.exact.unwrap_or(false);
    let resolved = state
        .dict
        .word_list(requested_language(&params.lang))
        .await?;
    let results = resolved
        .list
        .search(query, exact)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(SearchResponsePayload {
        query: query.to_string(),
        exact,
        requested: resolved.requested,
        resolved: resolved.resolved,
        results,
    }))
}

async fn api_word<S>(
    State(state): State<SharedState<S>>,
    Query(params): Query<WordParams>,
) -> Result<Json<WordDef>, ApiError>
where
    S: WordSource + Send + Sync + 'static,
{
    let word = params
        .word
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter `word` is required"))?;
    let resolved = state
        .dict
        .word_list(requested_language(&params.lang))
        .await?;
    resolved
        .list
        .lookup(word)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No entry found for word {word:?}")))
}

#[derive(Debug, Deserialize)]
struct PopoverRequest {
    word: String,
    anchor: String,
    anchor_rect: Rect,
    viewport: Viewport,
}

#[derive(Debug, Serialize)]
struct PopoverResponse {
    outcome: DispatchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    layout: Option<PopoverLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entry: Option<WordDef>,
}

async fn api_popover<S>(
    State(state): State<SharedState<S>>,
    Query(params): Query<LangParams>,
    Json(request): Json<PopoverRequest>,
) -> Result<Json<PopoverResponse>, ApiError>
where
    S: WordSource + Send + Sync + 'static,
{
    let outcome = state.dispatcher.request(&request.word, &request.anchor);
    if outcome == DispatchOutcome::Hidden {
        return Ok(Json(PopoverResponse {
            outcome,
            layout: None,
            entry: None,
        }));
    }
    let resolved = state
        .dict
        .word_list(requested_language(&params.lang))
        .await?;
    match resolved.list.lookup(&request.word) {
        Some(entry) => Ok(Json(PopoverResponse {
            outcome,
            layout: Some(place(request.anchor_rect, request.viewport)),
            entry: Some(entry.clone()),
        })),
        None => {
            // Lookup miss shows nothing; the slot must not keep
            // pointing at a popover that never appeared.
            state.dispatcher.dismiss();
            Ok(Json(PopoverResponse {
                outcome: DispatchOutcome::Hidden,
                layout: None,
                entry: None,
            }))
        }
    }
}

async fn api_popover_dismiss<S>(State(state): State<SharedState<S>>) -> Json<serde_json::Value>
where
    S: WordSource + Send + Sync + 'static,
{
    state.dispatcher.dismiss();
    Json(json!({ "outcome": "hidden" }))
}

fn outline_list_html(entries: &[OutlineEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ol>");
    for entry in entries {
        out.push_str("<li><a href=\"#");
        out.push_str(&entry.id);
        out.push_str("\">");
        out.push_str(&crate::content::escape_html(&entry.title));
        out.push_str("</a>");
        if entry.unofficial {
            out.push_str(" <span class=\"badge\">unofficial</span>");
        }
        out.push_str(&outline_list_html(&entry.children));
        out.push_str("</li>");
    }
    out.push_str("</ol>");
    out
}

fn render_error_page(message: impl Into<String>) -> String {
    let message = message.into();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>toki ma • Error</title>
    <style>{css}</style>
  </head>
  <body>
    {nav}
    <main>
      <h1>Something went wrong</h1>
      <p>{message}</p>
      <a href="/">Back to home</a>
    </main>
  </body>
</html>"#,
        css = SITE_CSS,
        nav = nav_html(),
        message = crate::content::escape_html(&message),
    )
}

fn render_markdown(input: &str) -> String {
    let options = MarkdownOptions::gfm();
    to_html_with_options(input, &options).unwrap_or_else(|_| input.to_string())
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>toki ma • Grammar</title>
    <style>{{ css|safe }}</style>
  </head>
  <body>
    {{ nav|safe }}
    <main>
      {% if fallback_note.is_some() %}
      <p class="notice">{{ fallback_note.as_ref().unwrap() }}</p>
      {% endif %}
      <h1>Grammar guide</h1>
      <div class="layout">
        <nav class="toc" aria-label="Table of contents">
          {{ toc|safe }}
        </nav>
        <article>
          {{ body|safe }}
        </article>
      </div>
    </main>
    <script>{{ js|safe }}</script>
  </body>
</html>"#,
    ext = "html"
)]
struct GrammarTemplate {
    css: &'static str,
    js: &'static str,
    nav: &'static str,
    toc: String,
    body: String,
    fallback_note: Option<String>,
}

struct EntryRow {
    def: WordDef,
    /// (display label, definition text) pairs in part-of-speech order.
    definitions: Vec<(String, String)>,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>toki ma • Dictionary</title>
    <link rel="canonical" href="{{ canonical }}">
    <style>{{ css|safe }}</style>
  </head>
  <body>
    {{ nav|safe }}
    <main>
      {% if fallback_note.is_some() %}
      <p class="notice">{{ fallback_note.as_ref().unwrap() }}</p>
      {% endif %}
      <h1>Dictionary</h1>
      <form method="get" action="/dictionary">
        <input type="search" name="q" value="{{ query }}" placeholder="toki ma or {{ lang }}" />
        <label>
          <input type="checkbox" name="exact" value="true" {% if exact %}checked{% endif %} />
          exact match
        </label>
        <select name="lang">
          {% for language in languages %}
          <option value="{{ language }}" {% if language.as_str() == lang.as_str() %}selected{% endif %}>{{ language }}</option>
          {% endfor %}
        </select>
        <button type="submit">Search</button>
      </form>
      {% if searched %}
        {% if rows.len() == 0 %}
        <p>No entries matched "{{ query }}".</p>
        {% else %}
        <table>
          <thead>
            <tr><th></th><th>Word</th><th>Definitions</th></tr>
          </thead>
          <tbody>
            {% for row in rows %}
            <tr>
              <td>{{ row.def.emoji }}</td>
              <td>
                <strong>{{ row.def.word }}</strong>
                <div class="pos">{{ row.def.base }}</div>
                {% if row.def.etymology.len() > 0 %}
                <div class="pos">from {{ row.def.etymology }}</div>
                {% endif %}
              </td>
              <td>
                <div>{{ row.def.short }}</div>
                {% for definition in row.definitions %}
                <div><span class="pos">{{ definition.0 }}:</span> {{ definition.1 }}</div>
                {% endfor %}
              </td>
            </tr>
            {% endfor %}
          </tbody>
        </table>
        {% endif %}
      {% endif %}
    </main>
    <script>{{ js|safe }}</script>
  </body>
</html>"#,
    ext = "html"
)]
struct DictionaryTemplate {
    css: &'static str,
    js: &'static str,
    nav: &'static str,
    canonical: String,
    query: String,
    exact: bool,
    searched: bool,
    lang: String,
    languages: Vec<String>,
    fallback_note: Option<String>,
    rows: Vec<EntryRow>,
}
