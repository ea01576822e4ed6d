//! An in-process stand-in for a Plans server.
//!
//! [`FakePlans`] serves the handful of pages clans scrapes, with the same
//! markers the real server uses: a `body` id naming each page, a bug-report
//! link in the footer naming the logged-in user, `infomessage` and
//! `alertmessage` banners, and a fingerprinted edit form. It runs on its own
//! thread and runtime so both async tests and command-line tests can use it.
//!
//! ```rust,no_run
//! use clans_test_utils::FakePlans;
//!
//! let server = FakePlans::builder()
//!     .user("baldwint", "hunter2")
//!     .plan("baldwint", "this is my plan")
//!     .start();
//! println!("serving on {}", server.base_url());
//! ```

use std::{
    collections::{BTreeMap, HashMap},
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use axum::{
    extract::{Form, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use jiff::{tz::TimeZone, Zoned};
use md5::{Digest, Md5};
use tokio::sync::oneshot;

pub const SESSION_COOKIE: &str = "PHPSESSID";

/// Alert shown when the submitted fingerprint is stale.
pub const CONFLICT_MESSAGE: &str = "Your plan was edited from another instance of the edit page.";
pub const TOO_LONG_MESSAGE: &str = "Sorry, your plan is too long.";
pub const SUCCESS_MESSAGE: &str = "Plan changed successfully.";

pub const DEFAULT_MAX_PLAN_LEN: usize = 65_000;

const SERVER_TIMEZONE: &str = "America/Chicago";
const BUG_REPORT_URL: &str = "http://code.google.com/p/grinnellplans/issues/entry";

type Shared = Arc<Mutex<PlansState>>;

#[derive(Debug, Clone, Default)]
struct Account {
    password: String,
    plan: String,
    planname: String,
    lastupdated: Option<String>,
    lastlogin: Option<String>,
}

#[derive(Debug, Default)]
struct PlansState {
    accounts: BTreeMap<String, Account>,
    sessions: HashMap<String, String>,
    next_session: u64,
    autoread: Vec<(u32, Vec<String>)>,
    planwatch: Vec<(String, String)>,
    max_plan_len: usize,
    legacy: bool,
}

/// Seeds a [`FakePlans`] before it starts serving.
#[derive(Debug)]
pub struct FakePlansBuilder {
    state: PlansState,
}

impl Default for FakePlansBuilder {
    fn default() -> Self {
        Self {
            state: PlansState {
                max_plan_len: DEFAULT_MAX_PLAN_LEN,
                ..PlansState::default()
            },
        }
    }
}

impl FakePlansBuilder {
    /// Adds an account with an empty plan.
    pub fn user(mut self, username: &str, password: &str) -> Self {
        self.state.accounts.insert(
            username.to_string(),
            Account {
                password: password.to_string(),
                ..Account::default()
            },
        );
        self
    }

    /// Sets the stored edit text of an existing account.
    pub fn plan(mut self, username: &str, text: &str) -> Self {
        if let Some(account) = self.state.accounts.get_mut(username) {
            account.plan = text.to_string();
        }
        self
    }

    pub fn planname(mut self, username: &str, planname: &str) -> Self {
        if let Some(account) = self.state.accounts.get_mut(username) {
            account.planname = planname.to_string();
        }
        self
    }

    /// Sets the header dates, in the server's long form.
    pub fn dates(mut self, username: &str, lastupdated: &str, lastlogin: &str) -> Self {
        if let Some(account) = self.state.accounts.get_mut(username) {
            account.lastupdated = Some(lastupdated.to_string());
            account.lastlogin = Some(lastlogin.to_string());
        }
        self
    }

    /// Adds a tier to every user's autoread list.
    pub fn autoread(mut self, level: u32, usernames: &[&str]) -> Self {
        let names = usernames.iter().map(|n| (*n).to_string()).collect();
        self.state.autoread.push((level, names));
        self
    }

    /// Adds a planwatch entry, with the time in the server's short form.
    pub fn watched(mut self, username: &str, when: &str) -> Self {
        self.state
            .planwatch
            .push((username.to_string(), when.to_string()));
        self
    }

    pub fn max_plan_len(mut self, len: usize) -> Self {
        self.state.max_plan_len = len;
        self
    }

    /// Serves pages without the `body` ids of the current interface.
    pub fn legacy(mut self) -> Self {
        self.state.legacy = true;
        self
    }

    /// Binds to an ephemeral port on localhost and starts serving.
    ///
    /// # Panics
    ///
    /// If the port cannot be bound or the runtime cannot start.
    pub fn start(self) -> FakePlans {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind fake Plans server");
        listener
            .set_nonblocking(true)
            .expect("non-blocking listener");
        let addr = listener.local_addr().expect("listener address");

        let shared: Shared = Arc::new(Mutex::new(self.state));
        let app = router(shared.clone());
        let (shutdown, stop) = oneshot::channel::<()>();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("fake server runtime");
            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = stop.await;
                    })
                    .await
                    .expect("fake Plans server");
            });
        });

        FakePlans {
            addr,
            state: shared,
            shutdown: Some(shutdown),
        }
    }
}

/// A running fake server. Stops when dropped.
#[derive(Debug)]
pub struct FakePlans {
    addr: SocketAddr,
    state: Shared,
    shutdown: Option<oneshot::Sender<()>>,
}

impl FakePlans {
    pub fn builder() -> FakePlansBuilder {
        FakePlansBuilder::default()
    }

    /// The accounts and data most tests start from.
    ///
    /// - `baldwint` / `hunter2`, plan `this is my plan`
    /// - `gorp` / `secret`, whose plan loves baldwint twice
    /// - `bff` / `secret`, whose plan loves baldwint once
    pub fn standard() -> FakePlansBuilder {
        Self::builder()
            .user("baldwint", "hunter2")
            .plan("baldwint", "this is my plan")
            .planname("baldwint", "clever catchphrase")
            .dates(
                "baldwint",
                "Wed January 28th 2015, 5:46 PM",
                "Thu January 29th 2015, 9:01 AM",
            )
            .user("gorp", "secret")
            .plan("gorp", "hi [baldwint]\r\nalso [baldwint] again\r\nand nobody else")
            .user("bff", "secret")
            .plan("bff", "<b>best</b> friend [baldwint]")
            .autoread(1, &["gorp", "bff"])
            .autoread(2, &["baldwint"])
            .watched("gorp", "01/28/15, 5:46 PM")
            .watched("bff", "01/27/15, 9:01 AM")
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Root URL, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// The stored edit text of `username`.
    pub fn plan(&self, username: &str) -> Option<String> {
        lock(&self.state)
            .accounts
            .get(username)
            .map(|a| a.plan.clone())
    }

    /// Changes a plan behind the client's back, as another editor would.
    pub fn set_plan(&self, username: &str, text: &str) {
        if let Some(account) = lock(&self.state).accounts.get_mut(username) {
            account.plan = text.to_string();
        }
    }

    /// Hands every open session to `username`.
    pub fn reassign_sessions(&self, username: &str) {
        for owner in lock(&self.state).sessions.values_mut() {
            *owner = username.to_string();
        }
    }

    /// Forgets every session, as if they had timed out.
    pub fn expire_sessions(&self) {
        lock(&self.state).sessions.clear();
    }

    pub fn session_count(&self) -> usize {
        lock(&self.state).sessions.len()
    }
}

impl Drop for FakePlans {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

fn lock(shared: &Shared) -> MutexGuard<'_, PlansState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn router(shared: Shared) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/index.php", get(index).post(login))
        .route("/home.php", get(home))
        .route("/edit.php", get(edit_form).post(edit_submit))
        .route("/read.php", get(read))
        .route("/search.php", get(search))
        .route("/planwatch.php", get(planwatch).post(planwatch))
        .route("/api/1/index.php", get(api))
        .with_state(shared)
}

type Params = HashMap<String, String>;

fn param<'a>(params: &'a Params, key: &str) -> &'a str {
    params.get(key).map_or("", String::as_str)
}

async fn index(State(shared): State<Shared>) -> Html<String> {
    let state = lock(&shared);
    index_page(&state)
}

async fn login(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Form(form): Form<Params>,
) -> Response {
    let mut state = lock(&shared);
    if state.current_user(&headers).is_some() {
        return redirect_home(None);
    }
    let username = param(&form, "username");
    let password = param(&form, "password");
    let accepted = state
        .accounts
        .get(username)
        .is_some_and(|account| !username.is_empty() && account.password == password);
    if !accepted {
        return index_page(&state).into_response();
    }
    state.next_session += 1;
    let sid = format!("fake{:08x}", state.next_session);
    state.sessions.insert(sid.clone(), username.to_string());
    redirect_home(Some(&sid))
}

async fn home(State(shared): State<Shared>, headers: HeaderMap) -> Html<String> {
    let state = lock(&shared);
    match state.current_user(&headers) {
        Some(user) => state.page("planspage_home", Some(user.as_str()), "<p>Welcome back.</p>"),
        None => index_page(&state),
    }
}

async fn edit_form(State(shared): State<Shared>, headers: HeaderMap) -> Html<String> {
    let state = lock(&shared);
    match state.current_user(&headers) {
        Some(user) => state.edit_page(&user, ""),
        None => index_page(&state),
    }
}

async fn edit_submit(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Form(form): Form<Params>,
) -> Html<String> {
    let mut state = lock(&shared);
    let Some(user) = state.current_user(&headers) else {
        return index_page(&state);
    };
    let submitted = param(&form, "plan").to_string();
    let declared = param(&form, "edit_text_md5").to_ascii_lowercase();
    let current = state
        .accounts
        .get(&user)
        .map(|a| md5_hex(&a.plan))
        .unwrap_or_default();

    let banner = if declared != current {
        alert("Error", CONFLICT_MESSAGE)
    } else if submitted.chars().count() > state.max_plan_len {
        alert("Error", TOO_LONG_MESSAGE)
    } else {
        let now = server_now();
        if let Some(account) = state.accounts.get_mut(&user) {
            account.plan = submitted;
            account.lastupdated = Some(long_form(&now));
        }
        state.planwatch.retain(|(name, _)| name != &user);
        state.planwatch.insert(0, (user.clone(), short_form(&now)));
        info("Success", SUCCESS_MESSAGE)
    };
    state.edit_page(&user, &banner)
}

async fn read(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<Params>,
) -> Html<String> {
    let state = lock(&shared);
    let Some(user) = state.current_user(&headers) else {
        return index_page(&state);
    };
    let name = param(&query, "searchname");
    let Some(account) = state.accounts.get(name) else {
        let message = alert(&format!("No such user: {}", escape(name)), "");
        return state.page("planspage_read", Some(user.as_str()), &message);
    };

    let date = |value: &Option<String>| {
        let value = value.as_deref().unwrap_or_default();
        format!("<span class=\"long\">{value}</span>")
    };
    let content = format!(
        "<div id=\"header\"><ul>\
         <li class=\"username\"><span class=\"title\">Username:</span><span class=\"value\">{name}</span></li>\
         <li class=\"lastupdated\"><span class=\"title\">Last Updated:</span><span class=\"value\">{}</span></li>\
         <li class=\"lastlogin\"><span class=\"title\">Last Login:</span><span class=\"value\">{}</span></li>\
         <li class=\"planname\"><span class=\"title\">Name:</span><span class=\"value\">{}</span></li>\
         </ul></div>\
         <div class=\"plan_text\">\n{}</div>",
        date(&account.lastupdated),
        date(&account.lastlogin),
        escape(&account.planname),
        state.planify(&account.plan),
    );
    state.page("planspage_read", Some(user.as_str()), &content)
}

async fn search(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<Params>,
) -> Html<String> {
    let state = lock(&shared);
    let Some(user) = state.current_user(&headers) else {
        return index_page(&state);
    };
    let term = param(&query, "mysearch");
    let needle = if param(&query, "planlove") == "1" {
        format!("[{term}]")
    } else {
        term.to_string()
    }
    .to_lowercase();

    let mut groups = String::new();
    for (name, account) in &state.accounts {
        let lines: Vec<&str> = account
            .plan
            .split("\r\n")
            .filter(|line| !needle.is_empty() && line.to_lowercase().contains(&needle))
            .collect();
        if lines.is_empty() {
            continue;
        }
        let excerpts: String = lines
            .iter()
            .map(|line| format!("<li><span>{}</span></li>", state.planify(line)))
            .collect();
        groups.push_str(&format!(
            "<li><div class=\"result_user_group\">\
             <a href=\"read.php?searchname={name}\" class=\"planlove\">{name}</a>\
             <span>{}</span><ul>{excerpts}</ul></div></li>",
            lines.len()
        ));
    }
    let content = if groups.is_empty() {
        "<p>No results found.</p>".to_string()
    } else {
        format!("<ul id=\"search_results\">{groups}</ul>")
    };
    state.page("planspage_search", Some(user.as_str()), &content)
}

async fn planwatch(State(shared): State<Shared>, headers: HeaderMap) -> Html<String> {
    let state = lock(&shared);
    let Some(user) = state.current_user(&headers) else {
        return index_page(&state);
    };
    let items: String = state
        .planwatch
        .iter()
        .map(|(name, when)| {
            format!(
                "<li><a href=\"read.php?searchname={name}\" class=\"planlove\">{name}</a> <span>{when}</span></li>"
            )
        })
        .collect();
    let content = format!("<ul id=\"new_plan_list\">{items}</ul>");
    state.page("planspage_planwatch", Some(user.as_str()), &content)
}

async fn api(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<Params>,
) -> Response {
    let state = lock(&shared);
    let body = match (state.current_user(&headers), param(&query, "task")) {
        (Some(_), "autofingerlist") => {
            let list: Vec<serde_json::Value> = state
                .autoread
                .iter()
                .map(|(level, names)| serde_json::json!({ "level": level, "usernames": names }))
                .collect();
            serde_json::json!({ "success": true, "message": "", "autofingerList": list })
        }
        (Some(_), task) => {
            serde_json::json!({ "success": false, "message": format!("Unknown task: {task}") })
        }
        (None, _) => serde_json::json!({ "success": false, "message": "You are not logged in." }),
    };
    (
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

impl PlansState {
    fn current_user(&self, headers: &HeaderMap) -> Option<String> {
        let sid = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == SESSION_COOKIE)
            .map(|(_, value)| value)?;
        self.sessions.get(sid).cloned()
    }

    fn page(&self, body_id: &str, user: Option<&str>, content: &str) -> Html<String> {
        let body_open = if self.legacy {
            "<body>".to_string()
        } else {
            format!("<body id=\"{body_id}\">")
        };
        let footer = match user {
            Some(user) => {
                let comment: String =
                    url::form_urlencoded::byte_serialize(format!("Reported by [{user}]").as_bytes())
                        .collect();
                format!("<a href=\"{BUG_REPORT_URL}?comment={comment}\">Report a bug</a>")
            }
            None => String::new(),
        };
        Html(format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Plans</title></head>\
             {body_open}<div id=\"main\">{content}</div><div id=\"footer\">{footer}</div></body></html>"
        ))
    }

    fn edit_page(&self, user: &str, banner: &str) -> Html<String> {
        let plan = self
            .accounts
            .get(user)
            .map(|a| a.plan.as_str())
            .unwrap_or_default();
        let content = format!(
            "{banner}<form action=\"edit.php\" method=\"post\">\
             <textarea name=\"plan\" rows=\"25\" cols=\"80\">\n{}</textarea>\
             <input type=\"hidden\" name=\"edit_text_md5\" value=\"{}\">\
             <input type=\"submit\" name=\"submit\" value=\"Change Plan\"></form>",
            escape(plan),
            md5_hex(plan)
        );
        self.page("planspage_edit", Some(user), &content)
    }

    /// Renders plan text the way the server does: line breaks become `<br>`
    /// and `[user]` becomes planlove for known users.
    fn planify(&self, text: &str) -> String {
        let mut html = text.replace("\r\n", "\n").replace('\n', "<br>");
        for name in self.accounts.keys() {
            html = html.replace(
                &format!("[{name}]"),
                &format!("[<a href=\"read.php?searchname={name}\" class=\"planlove\">{name}</a>]"),
            );
        }
        html
    }
}

fn index_page(state: &PlansState) -> Html<String> {
    state.page(
        "planspage_index",
        None,
        "<form action=\"index.php\" method=\"post\">\
         <input type=\"text\" name=\"username\"><input type=\"password\" name=\"password\">\
         <input type=\"submit\" name=\"submit\" value=\"Login\"></form>",
    )
}

fn redirect_home(sid: Option<&str>) -> Response {
    let mut response = (StatusCode::SEE_OTHER, [(header::LOCATION, "/home.php")]).into_response();
    if let Some(sid) = sid {
        if let Ok(cookie) = HeaderValue::from_str(&format!("{SESSION_COOKIE}={sid}; path=/")) {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
    }
    response
}

fn alert(title: &str, message: &str) -> String {
    banner("alertmessage", title, message)
}

fn info(title: &str, message: &str) -> String {
    banner("infomessage", title, message)
}

fn banner(class: &str, title: &str, message: &str) -> String {
    if message.is_empty() {
        format!("<div class=\"{class}\"><h3>{title}</h3></div>")
    } else {
        format!("<div class=\"{class}\"><h3>{title}</h3><p>{message}</p></div>")
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn md5_hex(text: &str) -> String {
    hex::encode(Md5::digest(text.as_bytes()))
}

fn server_now() -> Zoned {
    let tz = TimeZone::get(SERVER_TIMEZONE).unwrap_or(TimeZone::UTC);
    Zoned::now().with_time_zone(tz)
}

/// `Wed January 28th 2015, 5:46 PM`
fn long_form(when: &Zoned) -> String {
    let day = when.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!(
        "{} {day}{suffix} {}",
        when.strftime("%a %B"),
        when.strftime("%Y, %-I:%M %p")
    )
}

/// `01/28/15, 5:46 PM`
fn short_form(when: &Zoned) -> String {
    when.strftime("%m/%d/%y, %-I:%M %p").to_string()
}
