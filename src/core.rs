use crate::config;
use crate::error::FetchError;
use crate::fetch::{ApiRequest, LoginOutcome, PageToken};
use crate::model::{Settings, Theme, TrackRecord};
use crate::stats::{ListenDataStore, SortOption};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Tracks,
    Login,
    About,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Tracks => "/tracks",
            Self::Login => "/login",
            Self::About => "/about",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Tracks => "tracks",
            Self::Login => "login",
            Self::About => "about",
        }
    }

    pub fn from_path(raw: &str) -> Option<Self> {
        match raw.trim().trim_start_matches('/').to_ascii_lowercase().as_str() {
            "" | "home" => Some(Self::Home),
            "tracks" => Some(Self::Tracks),
            "login" => Some(Self::Login),
            "about" => Some(Self::About),
            _ => None,
        }
    }

    pub fn requires_session(self) -> bool {
        matches!(self, Self::Home | Self::Tracks)
    }

    fn shows_listen_data(self) -> bool {
        matches!(self, Self::Home | Self::Tracks)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavLink {
    Page(Route),
    Logout,
}

impl NavLink {
    pub fn label(self) -> &'static str {
        match self {
            Self::Page(route) => route.label(),
            Self::Logout => "logout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub logged_in: bool,
    pub display_name: String,
}

impl Session {
    pub fn anonymous(display_name: &str) -> Self {
        Self {
            logged_in: false,
            display_name: display_name.to_string(),
        }
    }
}

pub fn nav_links(session: &Session) -> Vec<NavLink> {
    if session.logged_in {
        vec![
            NavLink::Page(Route::About),
            NavLink::Page(Route::Home),
            NavLink::Page(Route::Tracks),
            NavLink::Logout,
        ]
    } else {
        vec![NavLink::Page(Route::About), NavLink::Page(Route::Login)]
    }
}

/// One mounted statistics page and the store it owns.
#[derive(Debug)]
pub struct StatsPage {
    pub token: PageToken,
    pub store: ListenDataStore,
    pub selected: usize,
}

#[derive(Debug)]
pub struct WrappedCore {
    pub settings: Settings,
    pub session: Session,
    pub route: Route,
    pub page: Option<StatsPage>,
    pub theme: Theme,
    pub status: String,
    pub dirty: bool,
    request_in_flight: Option<ApiRequest>,
    next_token: u64,
}

impl WrappedCore {
    pub fn new(settings: Settings, session: Session) -> Self {
        Self {
            theme: settings.theme,
            settings,
            session,
            route: Route::Login,
            page: None,
            status: String::from("Ready"),
            dirty: true,
            request_in_flight: None,
            next_token: 1,
        }
    }

    /// Enters the landing page for the current session.
    pub fn start(&mut self) -> Option<ApiRequest> {
        let landing = if self.session.logged_in {
            Route::Home
        } else {
            Route::Login
        };
        self.navigate(landing)
    }

    /// Mounts `route` as a fresh page visit. Statistics pages get a new store and
    /// ask for exactly one fetch.
    pub fn navigate(&mut self, route: Route) -> Option<ApiRequest> {
        let route = if route.requires_session() && !self.session.logged_in {
            self.set_status("Log in to see your listens");
            Route::Login
        } else {
            route
        };

        if let Some(previous) = self.page.take() {
            debug!(page = previous.token.0, "page unmounted");
        }
        self.route = route;
        self.dirty = true;
        info!(route = route.path(), "navigated");

        if !route.shows_listen_data() {
            return None;
        }

        let token = PageToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        let mut store = ListenDataStore::new();
        store.begin_fetch();
        self.page = Some(StatsPage {
            token,
            store,
            selected: 0,
        });
        Some(ApiRequest::ListenData(token))
    }

    pub fn deliver_listen_data(
        &mut self,
        token: PageToken,
        result: Result<Vec<TrackRecord>, FetchError>,
    ) {
        let Some(page) = self.page.as_mut().filter(|page| page.token == token) else {
            debug!(page = token.0, "discarding listen data for unmounted page");
            return;
        };

        if let Err(err) = &result {
            self.status = format!("Listen data unavailable: {err}");
        }
        if page.store.resolve(result) {
            page.selected = 0;
            self.dirty = true;
        }
    }

    pub fn change_sort(&mut self, sort: SortOption) {
        let Some(page) = self.page.as_mut() else {
            self.set_status("Nothing to sort on this page");
            return;
        };
        if page.store.change_sort(sort) {
            page.selected = 0;
            debug!(sort = sort.label(), "sort changed");
            self.set_status(&format!("Sorted by {}", sort.label()));
        } else {
            self.set_status("Nothing to sort yet");
        }
    }

    pub fn cycle_sort(&mut self) {
        let next = self.sort().next();
        self.change_sort(next);
    }

    pub fn sort(&self) -> SortOption {
        self.page
            .as_ref()
            .map(|page| page.store.sort())
            .unwrap_or_default()
    }

    pub fn store(&self) -> Option<&ListenDataStore> {
        self.page.as_ref().map(|page| &page.store)
    }

    pub fn selected_row(&self) -> usize {
        self.page.as_ref().map(|page| page.selected).unwrap_or(0)
    }

    pub fn select_next(&mut self) {
        let Some(page) = self.page.as_mut() else {
            return;
        };
        let len = page.store.data().map(|data| data.len()).unwrap_or(0);
        if len == 0 {
            return;
        }
        page.selected = (page.selected + 1).min(len - 1);
        self.dirty = true;
    }

    pub fn select_prev(&mut self) {
        let Some(page) = self.page.as_mut() else {
            return;
        };
        page.selected = page.selected.saturating_sub(1);
        self.dirty = true;
    }

    /// The page's primary button: the arrow on the summary and "start tracking"
    /// on the login page.
    pub fn activate(&mut self) -> Option<ApiRequest> {
        match self.route {
            Route::Home => self.navigate(Route::Tracks),
            Route::Login if self.session.logged_in => self.navigate(Route::Home),
            Route::Login => self.request_login(),
            Route::Tracks | Route::About => None,
        }
    }

    pub fn request_login(&mut self) -> Option<ApiRequest> {
        if self.session.logged_in {
            self.set_status("Already logged in");
            return None;
        }
        self.issue(ApiRequest::Login, "Contacting Spotify...")
    }

    pub fn request_logout(&mut self) -> Option<ApiRequest> {
        if !self.session.logged_in {
            self.set_status("Not logged in");
            return None;
        }
        self.issue(ApiRequest::Logout, "Logging out...")
    }

    fn issue(&mut self, request: ApiRequest, status: &str) -> Option<ApiRequest> {
        if self.request_in_flight.is_some() {
            self.set_status("Still waiting on the last request");
            return None;
        }
        self.request_in_flight = Some(request.clone());
        self.set_status(status);
        Some(request)
    }

    pub fn login_finished(
        &mut self,
        result: Result<LoginOutcome, FetchError>,
    ) -> Option<ApiRequest> {
        self.request_in_flight = None;
        match result {
            Ok(outcome) => {
                self.session.logged_in = true;
                info!("session started");
                match outcome.authorize_url {
                    // The service only serves listen data once the browser hop is done.
                    Some(url) => {
                        self.set_status(&format!("Finish signing in at {url}, then press h"));
                        None
                    }
                    None => {
                        let request = self.navigate(Route::Home);
                        self.set_status("Logged in");
                        request
                    }
                }
            }
            Err(err) => {
                self.set_status(&format!("Login failed: {}", err.user_message()));
                None
            }
        }
    }

    pub fn logout_finished(&mut self, result: Result<(), FetchError>) -> Option<ApiRequest> {
        self.request_in_flight = None;
        match result {
            Ok(()) => {
                self.session.logged_in = false;
                info!("session ended");
                let request = self.navigate(Route::Login);
                self.set_status("Logged out");
                request
            }
            Err(err) => {
                self.set_status(&format!("Logout failed: {}", err.user_message()));
                None
            }
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.settings.theme = theme;
        self.set_status(&format!("Theme: {theme:?}"));
    }

    pub fn save(&mut self) -> anyhow::Result<()> {
        config::save_settings(&self.settings)?;
        self.set_status("Settings saved");
        Ok(())
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
        self.dirty = true;
    }
}
