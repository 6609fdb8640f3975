//! Explicit wiring of the client: one session store shared by the services,
//! the router and the 401 hook.

use std::sync::Arc;

use tracing::info;

use crate::api::{Api, ApiClient, UnauthorizedHook};
use crate::boundary::{ErrorBoundary, Recovery, Rendered};
use crate::config::ClientConfig;
use crate::error::AppResult;
use crate::identity::{AuthService, FileTokenStorage, Session, SessionAction, SessionStore, TokenStorage};
use crate::notify::RecordingNotifier;
use crate::pages::{self, PageContent};
use crate::routing::{DashboardShell, Router, Screen, View};

/// After a 401: the client has already dropped the token; end the session and show login.
struct ForceLogin {
    store: Arc<SessionStore>,
    router: Arc<Router>,
}

impl UnauthorizedHook for ForceLogin {
    fn on_unauthorized(&self) {
        self.store.dispatch(SessionAction::Logout);
        self.router.force_login();
    }
}

/// A navigation and, when a page rendered, its content.
#[derive(Debug)]
pub struct Opened {
    pub screen: Screen,
    pub content: Option<Rendered<PageContent>>,
}

pub struct App {
    pub config: ClientConfig,
    pub store: Arc<SessionStore>,
    pub api: Api,
    pub auth: AuthService,
    pub router: Arc<Router>,
    pub boundary: ErrorBoundary,
    pub notices: Arc<RecordingNotifier>,
    storage: Arc<dyn TokenStorage>,
}

impl App {
    /// Token kept in the file named by the config.
    pub fn new(config: ClientConfig) -> AppResult<Self> {
        let storage: Arc<dyn TokenStorage> = Arc::new(FileTokenStorage::new(config.token_path.clone()));
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: ClientConfig, storage: Arc<dyn TokenStorage>) -> AppResult<Self> {
        let store = Arc::new(SessionStore::new(storage.clone()));
        let client = Arc::new(ApiClient::new(config.api_base_url.clone(), storage.clone())?);
        let router = Arc::new(Router::new(store.clone()));
        client.set_unauthorized_hook(Arc::new(ForceLogin { store: store.clone(), router: router.clone() }));
        let api = Api::new(client);
        let notices = Arc::new(RecordingNotifier::new());
        let auth = AuthService::new(store.clone(), api.auth.clone(), notices.clone());
        Ok(Self { config, store, api, auth, router, boundary: ErrorBoundary::new(), notices, storage })
    }

    /// Settle the initial session (verifying a stored token if there is one).
    pub async fn start(&self) -> Session {
        let session = self.auth.initialize().await;
        info!(
            target: "startup",
            state = self.store.state().name(),
            user = session.user.as_ref().map(|u| u.email.as_str()).unwrap_or("-"),
            "session ready"
        );
        session
    }

    pub fn session(&self) -> Session { self.store.snapshot() }

    pub fn shell(&self) -> DashboardShell {
        let session = self.store.snapshot();
        DashboardShell::build(session.user.as_ref(), &self.router.location().path)
    }

    /// Navigate and load the resulting page inside the boundary.
    pub async fn open(&self, path: &str) -> Opened {
        let screen = self.router.navigate(path);
        self.render(screen).await
    }

    pub async fn back(&self) -> Option<Opened> {
        let screen = self.router.back()?;
        Some(self.render(screen).await)
    }

    /// Load the current screen again.
    pub async fn refresh(&self) -> Opened { self.render(self.router.current()).await }

    async fn render(&self, screen: Screen) -> Opened {
        let content = match &screen.view {
            View::Page(page) => {
                let session = self.store.snapshot();
                Some(self.boundary.run(pages::load(&self.api, &session, page)).await)
            }
            View::Denied(_) => None,
        };
        // A 401 during the load may have moved the router to the login page.
        let current = self.router.current();
        if current.location != screen.location {
            return Opened { screen: current, content: None };
        }
        Opened { screen, content }
    }

    /// Apply a failure panel's choice. `Reload` rebuilds everything from durable storage.
    pub async fn recover(&mut self, choice: Recovery) -> AppResult<Opened> {
        match choice {
            Recovery::Reset => {
                self.boundary.reset();
            }
            Recovery::Reload => {
                info!(target: "startup", "reloading from durable storage");
                let path = self.router.location().path;
                *self = App::with_storage(self.config.clone(), self.storage.clone())?;
                self.start().await;
                return Ok(self.open(&path).await);
            }
        }
        Ok(self.refresh().await)
    }
}
