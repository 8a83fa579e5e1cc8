use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::client::{ApiClient, endpoints};
use crate::error::Error;
use crate::navigation::Navigator;
use crate::session::{AuthSuccess, Refresher, SessionStore};
use crate::types::{
    AuthResponse, ChangePassword, LoginCredentials, MessageResponse, PasswordReset,
    RegisterData, User,
};

const REQUIRED_REGISTRATION_FIELDS: &str = "Email, password, nombre y apellido son requeridos";

/// Authentication operations against the dashboard API.
///
/// Every operation goes through the [`ApiClient`] and reports its outcome to the
/// [`SessionStore`]. Construct with [`AuthGateway::new`], which also registers the
/// gateway as the store's refresher.
pub struct AuthGateway {
    api: ApiClient,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    email: &'a str,
    password: &'a str,
    nombre: &'a str,
    apellido: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    telefono: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetBody<'a> {
    token: &'a str,
    new_password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeBody<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

impl AuthResponse {
    fn into_success(self, fallback_refresh: Option<String>) -> AuthSuccess {
        AuthSuccess {
            user: self.user,
            token: self.token,
            refresh_token: self.refresh_token.or(fallback_refresh),
            expires_in: self.expires_in.map(Duration::from_millis),
        }
    }
}

impl AuthGateway {
    /// Create the gateway and bind it as the session's refresher.
    #[must_use]
    pub fn new(api: ApiClient, navigator: Arc<dyn Navigator>) -> Arc<Self> {
        let gateway = Arc::new(Self {
            store: api.store().clone(),
            api,
            navigator,
        });
        gateway.store.bind_refresher(&gateway);
        gateway
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Sign in with e-mail and password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with the server message on rejection, [`Error::Http`] on
    /// network failure, and [`Error::Superseded`] if the session was cleared while
    /// the request was in flight.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let body = LoginBody {
            email: &credentials.email,
            password: &credentials.password,
        };
        self.authenticate("login", endpoints::LOGIN, &body, credentials.remember_me)
            .await
    }

    /// Create an account and sign in with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without touching the network when the password
    /// confirmation differs or a required field is empty; otherwise as
    /// [`login`](Self::login).
    pub async fn register(&self, data: &RegisterData) -> Result<User, Error> {
        if data.password != data.confirm_password {
            let err = Error::password_mismatch();
            self.store.fail(&err);
            return Err(err);
        }
        let required = [&data.email, &data.password, &data.first_name, &data.last_name];
        if required.iter().any(|field| field.trim().is_empty()) {
            let err = Error::Validation(REQUIRED_REGISTRATION_FIELDS.into());
            self.store.fail(&err);
            return Err(err);
        }

        let body = RegisterBody {
            email: &data.email,
            password: &data.password,
            nombre: &data.first_name,
            apellido: &data.last_name,
            telefono: data.phone.as_deref().filter(|p| !p.is_empty()),
        };
        self.authenticate("register", endpoints::REGISTER, &body, false)
            .await
    }

    /// Sign out locally, tell the server in the background and optionally go to login.
    ///
    /// Never fails: the server notification is fire-and-forget.
    pub fn logout(&self, navigate: bool) {
        self.api.notify(endpoints::LOGOUT);
        self.store.clear();
        tracing::info!("Logged out");

        if navigate {
            self.navigator.navigate(self.api.config().login_path());
        }
    }

    /// Exchange the persisted refresh token for a new session.
    ///
    /// The session the refresh started under is cleared on any failure. If it was
    /// replaced while the request was in flight, the newer session is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRefreshToken`] without a network call when none is
    /// persisted, or the request error otherwise.
    pub async fn refresh(&self) -> Result<User, Error> {
        let Some(refresh_token) = self.store.refresh_token() else {
            self.store.clear();
            return Err(Error::NoRefreshToken);
        };

        let epoch = self.store.epoch();
        let remember = self.store.remembered();
        let body = RefreshBody {
            refresh_token: &refresh_token,
        };

        let response = match self
            .api
            .post_json::<_, AuthResponse>("refresh", endpoints::REFRESH, &body)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh failed");
                // A 401 has already invalidated this epoch; a newer session is left alone.
                self.store.invalidate(epoch);
                return Err(e);
            }
        };

        let user = response.user.clone();
        self.store
            .apply_success(epoch, response.into_success(Some(refresh_token)), remember)?;
        tracing::debug!("Session refreshed");
        Ok(user)
    }

    /// Ask the server to e-mail a password reset link.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn request_password_reset(&self, email: &str) -> Result<String, Error> {
        let response: MessageResponse = self
            .api
            .post_json(
                "password reset request",
                endpoints::PASSWORD_RESET_REQUEST,
                &EmailBody { email },
            )
            .await?;
        Ok(response.message)
    }

    /// Set a new password using a reset token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without a network call when the confirmation
    /// differs, or the request error.
    pub async fn reset_password(&self, reset: &PasswordReset) -> Result<String, Error> {
        if reset.new_password != reset.confirm_password {
            return Err(Error::password_mismatch());
        }
        let body = ResetBody {
            token: &reset.token,
            new_password: &reset.new_password,
        };
        let response: MessageResponse = self
            .api
            .post_json("password reset", endpoints::PASSWORD_RESET, &body)
            .await?;
        Ok(response.message)
    }

    /// Change the password of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without a network call when the confirmation
    /// differs, or the request error.
    pub async fn change_password(&self, change: &ChangePassword) -> Result<String, Error> {
        if change.new_password != change.confirm_password {
            return Err(Error::password_mismatch());
        }
        let body = ChangeBody {
            current_password: &change.current_password,
            new_password: &change.new_password,
        };
        let response: MessageResponse = self
            .api
            .post_json("change password", endpoints::CHANGE_PASSWORD, &body)
            .await?;
        Ok(response.message)
    }

    async fn authenticate<B: Serialize + Sync>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
        remember: bool,
    ) -> Result<User, Error> {
        let epoch = self.store.begin();

        let response = match self.api.post_json::<_, AuthResponse>(operation, path, body).await {
            Ok(response) => response,
            Err(e) => {
                self.store.fail(&e);
                return Err(e);
            }
        };

        let user = response.user.clone();
        self.store
            .apply_success(epoch, response.into_success(None), remember)?;
        tracing::info!(operation, user_id = %user.id, "Authenticated");
        Ok(user)
    }
}

impl Refresher for AuthGateway {
    async fn refresh(&self) -> Result<(), Error> {
        Self::refresh(self).await.map(drop)
    }
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGateway")
            .field("api", &self.api)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::config::ClientConfig;
    use crate::error::PASSWORD_MISMATCH;
    use crate::navigation::HistoryNavigator;
    use crate::storage::{AuthStorage, MemoryStorage, Storage};

    struct Fixture {
        gateway: Arc<AuthGateway>,
        store: SessionStore,
        nav: Arc<HistoryNavigator>,
        durable: Arc<MemoryStorage>,
        session: Arc<MemoryStorage>,
    }

    fn fixture(server: &MockServer) -> Fixture {
        let config = Arc::new(ClientConfig::new(server.base_url().parse().unwrap()));
        let durable = Arc::new(MemoryStorage::new());
        let session = Arc::new(MemoryStorage::new());
        let storage = AuthStorage::new(
            durable.clone(),
            session.clone(),
            config.storage_keys().clone(),
        );
        let store = SessionStore::new(storage, config.refresh_lead());
        let nav = Arc::new(HistoryNavigator::new());
        let api = ApiClient::new(config, store.clone(), nav.clone());
        let gateway = AuthGateway::new(api, nav.clone());
        Fixture {
            gateway,
            store,
            nav,
            durable,
            session,
        }
    }

    fn auth_body(token: &str, refresh: Option<&str>) -> serde_json::Value {
        let mut body = json!({
            "user": {
                "id": "1",
                "email": "ana@example.com",
                "nombre": "Ana",
                "apellido": "García",
                "rol": "USER"
            },
            "token": token,
            "expiresIn": 3_600_000
        });
        if let Some(refresh) = refresh {
            body["refreshToken"] = json!(refresh);
        }
        body
    }

    fn registration() -> RegisterData {
        RegisterData {
            email: "ana@example.com".into(),
            password: "Secreta123".into(),
            confirm_password: "Secreta123".into(),
            first_name: "Ana".into(),
            last_name: "García".into(),
            phone: None,
            accepts_terms: true,
        }
    }

    #[tokio::test]
    async fn login_success_authenticates() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/login")
                .json_body(json!({ "email": "ana@example.com", "password": "Secreta123" }));
            then.status(200).json_body(auth_body("tok-1", Some("ref-1")));
        });

        let f = fixture(&server);
        let user = f
            .gateway
            .login(&LoginCredentials::new("ana@example.com", "Secreta123").remember(true))
            .await
            .unwrap();

        mock.assert();
        assert!(f.store.is_authenticated());
        assert_eq!(f.store.current_user(), Some(user));
        assert_eq!(f.store.current_token().as_deref(), Some("tok-1"));
        assert_eq!(f.durable.get("auth_token").as_deref(), Some("tok-1"));
        assert_eq!(f.durable.get("refresh_token").as_deref(), Some("ref-1"));
        assert_eq!(f.session.get("auth_token"), None);
        assert!(f.store.has_pending_refresh());
    }

    #[tokio::test]
    async fn login_without_remember_uses_session_scope() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200).json_body(auth_body("tok-1", None));
        });

        let f = fixture(&server);
        f.gateway
            .login(&LoginCredentials::new("ana@example.com", "x"))
            .await
            .unwrap();

        assert_eq!(f.session.get("auth_token").as_deref(), Some("tok-1"));
        assert_eq!(f.durable.get("auth_token"), None);
        assert_eq!(f.durable.get("remember_me"), None);
    }

    #[tokio::test]
    async fn login_failure_surfaces_server_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(401)
                .json_body(json!({ "message": "Credenciales inválidas" }));
        });

        let f = fixture(&server);
        let err = f
            .gateway
            .login(&LoginCredentials::new("ana@example.com", "bad"))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Credenciales inválidas");
        assert!(!f.store.is_authenticated());
        assert!(!f.store.is_loading());
        assert_eq!(f.store.last_error().as_deref(), Some("Credenciales inválidas"));
        assert!(f.nav.history().is_empty());
    }

    #[tokio::test]
    async fn register_mismatch_never_reaches_network() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.any_request();
            then.status(201).json_body(auth_body("tok", None));
        });

        let f = fixture(&server);
        let data = RegisterData {
            password: "a".into(),
            confirm_password: "b".into(),
            ..registration()
        };
        let err = f.gateway.register(&data).await.unwrap_err();

        assert!(matches!(err, Error::Validation(ref m) if m == PASSWORD_MISMATCH));
        assert_eq!(err.user_message(), "Las contraseñas no coinciden");
        assert_eq!(f.store.last_error().as_deref(), Some(PASSWORD_MISMATCH));
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn register_requires_fields() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.any_request();
            then.status(201).json_body(auth_body("tok", None));
        });

        let f = fixture(&server);
        let data = RegisterData {
            last_name: "  ".into(),
            ..registration()
        };
        let err = f.gateway.register(&data).await.unwrap_err();

        assert_eq!(err.user_message(), REQUIRED_REGISTRATION_FIELDS);
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn register_success_signs_in() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/auth/register").json_body(json!({
                "email": "ana@example.com",
                "password": "Secreta123",
                "nombre": "Ana",
                "apellido": "García"
            }));
            then.status(201).json_body(auth_body("tok-r", None));
        });

        let f = fixture(&server);
        f.gateway.register(&registration()).await.unwrap();

        mock.assert();
        assert!(f.store.is_authenticated());
        assert_eq!(f.session.get("auth_token").as_deref(), Some("tok-r"));
    }

    #[tokio::test]
    async fn register_conflict_is_surfaced() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/register");
            then.status(409).json_body(json!({ "message": "El usuario ya existe" }));
        });

        let f = fixture(&server);
        let err = f.gateway.register(&registration()).await.unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.user_message(), "El usuario ya existe");
    }

    #[tokio::test]
    async fn logout_clears_even_when_server_fails() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200).json_body(auth_body("tok-1", Some("ref-1")));
        });
        server.mock(|when, then| {
            when.method(POST).path("/auth/logout");
            then.status(500);
        });

        let f = fixture(&server);
        f.gateway
            .login(&LoginCredentials::new("ana@example.com", "x").remember(true))
            .await
            .unwrap();

        f.gateway.logout(true);

        assert!(!f.store.is_authenticated());
        assert!(!f.store.has_pending_refresh());
        assert_eq!(f.durable.get("auth_token"), None);
        assert_eq!(f.durable.get("refresh_token"), None);
        assert_eq!(f.nav.current().as_deref(), Some("/login"));
    }

    #[tokio::test]
    async fn logout_without_navigation() {
        let server = MockServer::start();
        let f = fixture(&server);
        f.gateway.logout(false);
        assert!(f.nav.history().is_empty());
        assert!(!f.store.is_authenticated());
    }

    #[tokio::test]
    async fn refresh_without_token_fails_fast() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.any_request();
            then.status(200);
        });

        let f = fixture(&server);
        let err = f.gateway.refresh().await.unwrap_err();

        assert!(matches!(err, Error::NoRefreshToken));
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn refresh_replaces_token_and_keeps_refresh_credential() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200).json_body(auth_body("tok-1", Some("ref-1")));
        });
        let refresh = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/refresh")
                .header("authorization", "Bearer tok-1")
                .json_body(json!({ "refreshToken": "ref-1" }));
            then.status(200).json_body(auth_body("tok-2", None));
        });

        let f = fixture(&server);
        f.gateway
            .login(&LoginCredentials::new("ana@example.com", "x").remember(true))
            .await
            .unwrap();
        f.gateway.refresh().await.unwrap();

        refresh.assert();
        assert_eq!(f.store.current_token().as_deref(), Some("tok-2"));
        assert_eq!(f.durable.get("auth_token").as_deref(), Some("tok-2"));
        assert_eq!(f.durable.get("refresh_token").as_deref(), Some("ref-1"));
        assert!(f.store.remembered());
    }

    #[tokio::test]
    async fn refresh_failure_clears_session() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200).json_body(auth_body("tok-1", Some("ref-1")));
        });
        server.mock(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(400)
                .json_body(json!({ "message": "Refresh token es requerido" }));
        });

        let f = fixture(&server);
        f.gateway
            .login(&LoginCredentials::new("ana@example.com", "x"))
            .await
            .unwrap();
        let err = f.gateway.refresh().await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert!(!f.store.is_authenticated());
        assert_eq!(f.session.get("refresh_token"), None);
    }

    #[tokio::test]
    async fn password_mismatch_checks_are_local() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.any_request();
            then.status(200).json_body(json!({ "message": "ok" }));
        });

        let f = fixture(&server);
        let reset = PasswordReset {
            token: "t".into(),
            new_password: "Nueva123".into(),
            confirm_password: "Nueva124".into(),
        };
        let change = ChangePassword {
            current_password: "Vieja123".into(),
            new_password: "Nueva123".into(),
            confirm_password: "nueva123".into(),
        };

        let reset_err = f.gateway.reset_password(&reset).await.unwrap_err();
        let change_err = f.gateway.change_password(&change).await.unwrap_err();

        assert_eq!(reset_err.user_message(), PASSWORD_MISMATCH);
        assert_eq!(change_err.user_message(), PASSWORD_MISMATCH);
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn password_endpoints_return_server_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/auth/password-reset-request")
                .json_body(json!({ "email": "ana@example.com" }));
            then.status(200)
                .json_body(json!({ "message": "Se ha enviado un email" }));
        });
        server.mock(|when, then| {
            when.method(POST)
                .path("/auth/password-reset")
                .json_body(json!({ "token": "abc", "newPassword": "Nueva123" }));
            then.status(200)
                .json_body(json!({ "message": "Contraseña actualizada" }));
        });

        let f = fixture(&server);
        let sent = f
            .gateway
            .request_password_reset("ana@example.com")
            .await
            .unwrap();
        let reset = f
            .gateway
            .reset_password(&PasswordReset {
                token: "abc".into(),
                new_password: "Nueva123".into(),
                confirm_password: "Nueva123".into(),
            })
            .await
            .unwrap();

        assert_eq!(sent, "Se ha enviado un email");
        assert_eq!(reset, "Contraseña actualizada");
    }

    #[tokio::test]
    async fn login_result_after_logout_is_discarded() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200)
                .json_body(auth_body("tok-late", None))
                .delay(Duration::from_millis(200));
        });

        let f = fixture(&server);
        let gateway = f.gateway.clone();
        let pending = tokio::spawn(async move {
            gateway
                .login(&LoginCredentials::new("ana@example.com", "x"))
                .await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        f.gateway.logout(false);

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(Error::Superseded)));
        assert!(!f.store.is_authenticated());
        assert_eq!(f.session.get("auth_token"), None);
    }

    #[tokio::test]
    async fn late_refresh_failure_keeps_newer_login() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200).json_body(auth_body("tok-1", Some("ref-1")));
        });
        server.mock(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(400)
                .json_body(json!({ "message": "Refresh token inválido" }))
                .delay(Duration::from_millis(300));
        });

        let f = fixture(&server);
        f.gateway
            .login(&LoginCredentials::new("ana@example.com", "x"))
            .await
            .unwrap();

        let gateway = f.gateway.clone();
        let pending = tokio::spawn(async move { gateway.refresh().await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        f.gateway.logout(false);
        f.gateway
            .login(&LoginCredentials::new("ana@example.com", "x"))
            .await
            .unwrap();

        let err = pending.await.unwrap().unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(f.store.is_authenticated());
        assert_eq!(f.session.get("auth_token").as_deref(), Some("tok-1"));
        assert_eq!(f.session.get("refresh_token").as_deref(), Some("ref-1"));
    }
}
