use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::clock::{Clock, IdGenerator};
use crate::error::{StoreError, StoreResult};
use crate::models::{RegisteredUser, SessionUser};
use crate::notify::Notifier;
use crate::storage::{PersistentStore, SESSION_KEY, USERS_KEY};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Owns the registered-user table and the active session.
pub struct SessionStore {
    user: Mutex<Option<SessionUser>>,
    store: Arc<PersistentStore>,
    notifier: Arc<Notifier>,
    clock: Clock,
    ids: Arc<IdGenerator>,
    latency: Duration,
}

impl SessionStore {
    /// Restore a persisted session if one decodes cleanly; a corrupt
    /// session key is cleared and the store starts signed out.
    pub fn open(
        store: Arc<PersistentStore>,
        notifier: Arc<Notifier>,
        clock: Clock,
        ids: Arc<IdGenerator>,
        latency: Duration,
    ) -> Self {
        let user = store.load::<SessionUser>(SESSION_KEY);
        if let Some(user) = &user {
            tracing::debug!(email = %user.email, "restored session");
        }
        SessionStore {
            user: Mutex::new(user),
            store,
            notifier,
            clock,
            ids,
            latency,
        }
    }

    fn user(&self) -> MutexGuard<'_, Option<SessionUser>> {
        self.user.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn registered_users(&self) -> Vec<RegisteredUser> {
        self.store.load(USERS_KEY).unwrap_or_default()
    }

    fn start_session(&self, user: SessionUser) -> StoreResult<SessionUser> {
        self.store.save(SESSION_KEY, &user)?;
        *self.user() = Some(user.clone());
        Ok(user)
    }

    fn reject<T>(&self, error: StoreError) -> StoreResult<T> {
        self.notifier.error(error.to_string());
        Err(error)
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.user().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// The signed-in user, or `Unauthenticated`.
    pub fn require_user(&self) -> StoreResult<SessionUser> {
        self.current_user().ok_or(StoreError::Unauthenticated)
    }

    /// Sign in with an exact email and password match.
    ///
    /// A failed attempt leaves any existing session untouched and does not
    /// say which of the two was wrong.
    pub async fn login(&self, email: &str, password: &str) -> StoreResult<SessionUser> {
        self.clock.settle_after(self.latency).await;

        let found = self
            .registered_users()
            .into_iter()
            .find(|u| u.email == email && u.password == password);

        let Some(found) = found else {
            tracing::info!(email = %email, "login rejected");
            return self.reject(StoreError::InvalidCredentials);
        };

        let user = match self.start_session(SessionUser {
            email: email.to_string(),
            id: found.id,
        }) {
            Ok(user) => user,
            Err(e) => return self.reject(e),
        };

        tracing::info!(email = %user.email, "logged in");
        self.notifier.success("Welcome back! Login successful.");
        Ok(user)
    }

    /// Register a new user and sign them in.
    ///
    /// Checks run in order and the first failure wins: password mismatch,
    /// existing email, missing field, short password.
    pub async fn signup(&self, email: &str, password: &str, confirm_password: &str) -> StoreResult<SessionUser> {
        self.clock.settle_after(self.latency).await;

        if password != confirm_password {
            return self.reject(StoreError::Validation("Passwords do not match".to_string()));
        }

        let mut users = self.registered_users();
        if users.iter().any(|u| u.email == email) {
            return self.reject(StoreError::Conflict(
                "User already exists. Please login instead.".to_string(),
            ));
        }

        if email.is_empty() || password.is_empty() {
            return self.reject(StoreError::Validation("Please fill all fields".to_string()));
        }

        if password.chars().count() < MIN_PASSWORD_LEN {
            return self.reject(StoreError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let registered = RegisteredUser {
            email: email.to_string(),
            password: password.to_string(),
            id: self.ids.next(&self.clock),
            created_at: self.clock.now(),
        };
        let session = SessionUser {
            email: registered.email.clone(),
            id: registered.id.clone(),
        };
        users.push(registered);

        let user = match self
            .store
            .save(USERS_KEY, &users)
            .map_err(StoreError::from)
            .and_then(|_| self.start_session(session))
        {
            Ok(user) => user,
            Err(e) => return self.reject(e),
        };

        tracing::info!(email = %user.email, id = %user.id, "signed up");
        self.notifier
            .success("Account created successfully! Welcome to TicketFlow.");
        Ok(user)
    }

    pub fn logout(&self) {
        if let Err(e) = self.store.remove(SESSION_KEY) {
            let cause = format!("{:#}", e);
            tracing::warn!(error = %cause, "failed to clear persisted session");
        }
        if let Some(user) = self.user().take() {
            tracing::info!(email = %user.email, "logged out");
        }
        self.notifier.info("You have been logged out successfully.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationKind;
    use crate::storage::{MemoryMedium, StorageMedium};

    struct Harness {
        session: Arc<SessionStore>,
        store: Arc<PersistentStore>,
        notifier: Arc<Notifier>,
    }

    fn open_session(store: Arc<PersistentStore>) -> Harness {
        let notifier = Arc::new(Notifier::default());
        let session = Arc::new(SessionStore::open(
            store.clone(),
            notifier.clone(),
            Clock::new(),
            Arc::new(IdGenerator::new()),
            Duration::from_millis(1500),
        ));
        Harness {
            session,
            store,
            notifier,
        }
    }

    fn setup() -> Harness {
        open_session(Arc::new(PersistentStore::in_memory("test")))
    }

    fn last_toast(h: &Harness) -> (NotificationKind, String) {
        let toast = h.notifier.active().pop().unwrap();
        (toast.kind, toast.message)
    }

    // ==================== Unit Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_signup_then_login_same_id() {
        let h = setup();
        let signed_up = h.session.signup("a@x.com", "pw1234", "pw1234").await.unwrap();
        h.session.logout();

        let logged_in = h.session.login("a@x.com", "pw1234").await.unwrap();
        assert_eq!(logged_in.id, signed_up.id);
        assert_eq!(logged_in.email, "a@x.com");
        assert_eq!(h.session.current_user(), Some(logged_in));
    }

    #[tokio::test(start_paused = true)]
    async fn test_signup_logs_in_and_persists() {
        let h = setup();
        let user = h.session.signup("a@x.com", "pw1234", "pw1234").await.unwrap();

        assert!(h.session.is_authenticated());
        assert_eq!(h.store.load::<SessionUser>(SESSION_KEY), Some(user.clone()));

        let users: Vec<RegisteredUser> = h.store.load(USERS_KEY).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, user.id);
        assert_eq!(users[0].password, "pw1234");
        assert_eq!(
            last_toast(&h),
            (
                NotificationKind::Success,
                "Account created successfully! Welcome to TicketFlow.".to_string()
            )
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_record_has_no_password() {
        let h = setup();
        h.session.signup("a@x.com", "pw1234", "pw1234").await.unwrap();
        let raw = h.store.raw(SESSION_KEY).unwrap().unwrap();
        assert!(!raw.contains("pw1234"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_password_rejected_without_touching_session() {
        let h = setup();
        let user = h.session.signup("a@x.com", "pw1234", "pw1234").await.unwrap();

        let result = h.session.login("a@x.com", "wrong").await;

        assert!(matches!(result, Err(StoreError::InvalidCredentials)));
        assert_eq!(h.session.current_user(), Some(user.clone()));
        assert_eq!(h.store.load::<SessionUser>(SESSION_KEY), Some(user));
        let (kind, message) = last_toast(&h);
        assert_eq!(kind, NotificationKind::Error);
        assert_eq!(message, "Invalid email or password. Please sign up first.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_email_same_message_as_wrong_password() {
        let h = setup();
        h.session.signup("a@x.com", "pw1234", "pw1234").await.unwrap();
        h.session.logout();

        let unknown = h.session.login("b@x.com", "pw1234").await.unwrap_err();
        let wrong = h.session.login("a@x.com", "nope12").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(!h.session.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_takes_auth_latency() {
        let h = setup();
        h.session.signup("a@x.com", "pw1234", "pw1234").await.unwrap();
        h.session.logout();

        let start = tokio::time::Instant::now();
        h.session.login("a@x.com", "pw1234").await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_signup_validation_order() {
        let h = setup();
        h.session.signup("a@x.com", "pw1234", "pw1234").await.unwrap();

        // Mismatch wins over everything else
        let err = h.session.signup("a@x.com", "", "x").await.unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");

        // Existing email wins over short password
        let err = h.session.signup("a@x.com", "abc", "abc").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Missing field wins over short password
        let err = h.session.signup("", "abc", "abc").await.unwrap_err();
        assert_eq!(err.to_string(), "Please fill all fields");

        let err = h.session.signup("b@x.com", "abc", "abc").await.unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_signup_does_not_register() {
        let h = setup();
        h.session.signup("b@x.com", "abc", "abc").await.unwrap_err();

        assert!(h.store.load::<Vec<RegisteredUser>>(USERS_KEY).is_none());
        assert!(!h.session.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_clears_session() {
        let h = setup();
        h.session.signup("a@x.com", "pw1234", "pw1234").await.unwrap();

        h.session.logout();

        assert!(!h.session.is_authenticated());
        assert!(h.store.raw(SESSION_KEY).unwrap().is_none());
        assert!(matches!(h.session.require_user(), Err(StoreError::Unauthenticated)));
        assert_eq!(
            last_toast(&h),
            (
                NotificationKind::Info,
                "You have been logged out successfully.".to_string()
            )
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_restored_on_open() {
        let h = setup();
        let user = h.session.signup("a@x.com", "pw1234", "pw1234").await.unwrap();

        let reopened = open_session(h.store.clone());
        assert_eq!(reopened.session.current_user(), Some(user));
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupt_session_cleared_on_open() {
        let medium = Arc::new(MemoryMedium::new());
        medium.set("test_session", "{{{").unwrap();
        let h = open_session(Arc::new(PersistentStore::new(medium.clone(), "test")));

        assert!(!h.session.is_authenticated());
        assert_eq!(medium.get("test_session").unwrap(), None);
        assert!(h.notifier.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_users_never_deleted_by_logout() {
        let h = setup();
        h.session.signup("a@x.com", "pw1234", "pw1234").await.unwrap();
        h.session.logout();
        h.session.signup("b@x.com", "pw5678", "pw5678").await.unwrap();
        h.session.logout();

        let users: Vec<RegisteredUser> = h.store.load(USERS_KEY).unwrap();
        let emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
        assert_ne!(users[0].id, users[1].id);
    }
}
