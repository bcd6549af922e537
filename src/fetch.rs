use crate::error::FetchError;
use crate::model::{self, Settings, TrackRecord};
use std::io::Read;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const LISTEN_DATA_PATH: &str = "/api/listen-data";
const LOGIN_PATH: &str = "/spotify-login";
const LOGOUT_PATH: &str = "/logout";
const MAX_BODY_BYTES: u64 = 8 * 1024 * 1024;

/// Identifies one visit to a statistics page. Results carrying a stale token are
/// dropped by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageToken(pub u64);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Where the identity provider wants the listener to continue, when the
    /// service answered with a redirect.
    pub authorize_url: Option<String>,
}

pub trait RemoteApi: Send + Sync {
    fn listen_data(&self) -> Result<Vec<TrackRecord>, FetchError>;
    fn spotify_login(&self) -> Result<LoginOutcome, FetchError>;
    fn logout(&self) -> Result<(), FetchError>;
}

/// Blocking HTTP client for the listen-data service. One attempt per call.
pub struct HttpApi {
    base_url: String,
    http_client: ureq::Agent,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(timeout.min(Duration::from_secs(5)))
            .timeout_read(timeout)
            .timeout_write(timeout)
            .redirects(0)
            .build();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.api_base_url,
            Duration::from_secs(settings.request_timeout_secs.max(1)),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get(&self, path: &str) -> Result<ureq::Response, FetchError> {
        let url = self.url(path);
        debug!(%url, "issuing request");
        let response = self.http_client.get(&url).call()?;
        Ok(response)
    }
}

impl RemoteApi for HttpApi {
    fn listen_data(&self) -> Result<Vec<TrackRecord>, FetchError> {
        let response = self.get(LISTEN_DATA_PATH)?;
        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status(status));
        }

        let body = read_capped(response.into_reader(), MAX_BODY_BYTES)?;
        model::decode_listen_data(&body)
    }

    fn spotify_login(&self) -> Result<LoginOutcome, FetchError> {
        let response = self.get(LOGIN_PATH)?;
        let authorize_url = (300..400)
            .contains(&response.status())
            .then(|| response.header("Location").map(str::to_string))
            .flatten();
        Ok(LoginOutcome { authorize_url })
    }

    fn logout(&self) -> Result<(), FetchError> {
        self.get(LOGOUT_PATH).map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    ListenData(PageToken),
    Login,
    Logout,
}

#[derive(Debug)]
pub enum ApiEvent {
    ListenData {
        token: PageToken,
        result: Result<Vec<TrackRecord>, FetchError>,
    },
    Login(Result<LoginOutcome, FetchError>),
    Logout(Result<(), FetchError>),
}

#[derive(Debug)]
enum WorkerCommand {
    Request(ApiRequest),
    Shutdown,
}

/// Runs requests on a background thread so the UI loop never blocks.
pub struct ApiWorker {
    cmd_tx: Sender<WorkerCommand>,
    event_rx: Receiver<ApiEvent>,
}

impl ApiWorker {
    pub fn start(api: Box<dyn RemoteApi>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        thread::spawn(move || worker_loop(api, cmd_rx, event_tx));
        Self { cmd_tx, event_rx }
    }

    pub fn send(&self, request: ApiRequest) {
        let _ = self.cmd_tx.send(WorkerCommand::Request(request));
    }

    pub fn try_recv_event(&self) -> Option<ApiEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(WorkerCommand::Shutdown);
    }
}

impl Drop for ApiWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    api: Box<dyn RemoteApi>,
    cmd_rx: Receiver<WorkerCommand>,
    event_tx: Sender<ApiEvent>,
) {
    while let Ok(WorkerCommand::Request(request)) = cmd_rx.recv() {
        let event = match request {
            ApiRequest::ListenData(token) => {
                let result = api.listen_data();
                match &result {
                    Ok(records) => {
                        info!(page = token.0, tracks = records.len(), "listen data received")
                    }
                    Err(err) => {
                        warn!(page = token.0, error = %err, "listen data request failed")
                    }
                }
                ApiEvent::ListenData { token, result }
            }
            ApiRequest::Login => {
                let result = api.spotify_login();
                if let Err(err) = &result {
                    warn!(error = %err, "login request failed");
                }
                ApiEvent::Login(result)
            }
            ApiRequest::Logout => {
                let result = api.logout();
                if let Err(err) = &result {
                    warn!(error = %err, "logout request failed");
                }
                ApiEvent::Logout(result)
            }
        };
        if event_tx.send(event).is_err() {
            break;
        }
    }
    debug!("api worker stopped");
}

fn read_capped(reader: impl Read, limit: u64) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|err| FetchError::Network(format!("failed to read response body: {err}")))?;
    if body.len() as u64 > limit {
        return Err(FetchError::Parse(format!(
            "listen data exceeds {} MiB",
            limit / (1024 * 1024)
        )));
    }
    Ok(body)
}
