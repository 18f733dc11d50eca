// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session
//!
//! Owns everything the UI chrome asks about the signed-in user: the token,
//! the unverified claims decoded from it, the authoritative profile, the
//! visibility matrix and the change bus.
//!
//! ## Lifecycle
//!
//! 1. [`Session::login`] stores the token, decodes its claims, clears any
//!    previous user and matrix, then loads the profile and the matrix
//! 2. Navigation calls [`Session::is_visible`] / [`Session::visible_nav`],
//!    which never wait on the network
//! 3. Signals from the bus are applied through [`Session::handle_signal`]
//!    (usually by the [`Refresher`](crate::refresher::Refresher))
//! 4. [`Session::logout`] drops all of it; responses still in flight for
//!    the old token are discarded

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::api::AuthBackend;
use crate::auth::{
    decode_unverified, resolve_mutating_role, resolve_role, EffectiveUser, ProfilePatch, Role,
    UnverifiedClaims,
};
use crate::bus::{ChangeBus, Signal};
use crate::error::ClientError;
use crate::visibility::{
    default_nav, resolver, LegacyPolicy, MatrixStore, NavItem, PageKey, RouteAccess,
    VisibilityMatrix, VisibilityMode,
};

#[derive(Default)]
struct SessionState {
    token: Option<String>,
    claims: Option<UnverifiedClaims>,
    user: Option<EffectiveUser>,
    /// Bumped on login/logout; profile responses from an older epoch are dropped
    epoch: u64,
}

/// Client session for one signed-in (or signed-out) user.
pub struct Session<B> {
    backend: B,
    mode: VisibilityMode,
    nav: Vec<NavItem>,
    state: RwLock<SessionState>,
    matrix: MatrixStore,
    bus: ChangeBus,
}

impl<B: AuthBackend> Session<B> {
    /// Create a signed-out session.
    pub fn new(backend: B, mode: VisibilityMode) -> Self {
        Self {
            backend,
            mode,
            nav: default_nav(),
            state: RwLock::new(SessionState::default()),
            matrix: MatrixStore::new(),
            bus: ChangeBus::new(),
        }
    }

    /// Replace the navigation catalogue.
    pub fn with_nav(mut self, nav: Vec<NavItem>) -> Self {
        self.nav = nav;
        self
    }

    /// Share an existing bus instead of a private one.
    pub fn with_bus(mut self, bus: ChangeBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub fn matrix_store(&self) -> &MatrixStore {
        &self.matrix
    }

    pub fn mode(&self) -> VisibilityMode {
        self.mode
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ------------------------------------------------------------------
    // Token lifecycle
    // ------------------------------------------------------------------

    /// Sign in with `token` and load the profile and matrix.
    ///
    /// Failures are logged, not returned: until the matrix loads every page
    /// stays hidden, and until the profile loads the token's role is used.
    pub async fn login(&self, token: impl Into<String>) {
        let token = token.into();
        let claims = decode_unverified(Some(&token));
        if claims.is_none() {
            tracing::debug!("Token payload not decodable, no optimistic identity available");
        }

        {
            let mut state = self.write();
            state.epoch += 1;
            state.token = Some(token);
            state.claims = claims;
            state.user = None;
        }
        self.matrix.clear();

        let profile_loaded = self.refresh_profile().await;
        if !profile_loaded && self.claims().is_none() {
            tracing::warn!("No user available after login, leaving visibility unloaded");
            return;
        }

        self.refresh_visibility().await;
        tracing::info!(
            role = %self.effective_role(),
            matrix = ?self.matrix.status(),
            "Session ready"
        );
    }

    /// Sign out: forget token, user and matrix.
    pub fn logout(&self) {
        {
            let mut state = self.write();
            let epoch = state.epoch + 1;
            *state = SessionState {
                epoch,
                ..SessionState::default()
            };
        }
        self.matrix.clear();
        tracing::info!("Session signed out");
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().token.is_some()
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Unverified claims from the current token (display only).
    pub fn claims(&self) -> Option<UnverifiedClaims> {
        self.read().claims.clone()
    }

    /// Authoritative user, once the profile has loaded.
    pub fn user(&self) -> Option<EffectiveUser> {
        self.read().user.clone()
    }

    /// Email to show in the header: profile first, token second.
    pub fn display_email(&self) -> Option<String> {
        let state = self.read();
        state
            .user
            .as_ref()
            .and_then(|u| u.email.clone())
            .or_else(|| state.claims.as_ref().map(|c| c.email.clone()))
    }

    /// Role used for navigation and page guards.
    pub fn effective_role(&self) -> Role {
        let state = self.read();
        resolve_role(state.user.as_ref(), state.claims.as_ref())
    }

    /// Role used to enable mutating actions; ignores the token's claims.
    pub fn mutating_role(&self) -> Role {
        resolve_mutating_role(self.read().user.as_ref())
    }

    /// Fetch `GET /auth/profile` and replace the cached user.
    /// Returns whether the user was updated.
    pub async fn refresh_profile(&self) -> bool {
        let Some((token, epoch)) = self.token_and_epoch() else {
            return false;
        };

        match self.backend.fetch_profile(&token).await {
            Ok(profile) => {
                let user = EffectiveUser::from_profile(profile);
                let mut state = self.write();
                if state.epoch != epoch {
                    tracing::debug!("Discarding profile response for a previous token");
                    return false;
                }
                tracing::debug!(role = ?user.role, "Profile loaded");
                state.user = Some(user);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile fetch failed, using token claims if any");
                false
            }
        }
    }

    /// Merge a `profileUpdated` payload into the cached user.
    pub fn apply_profile_patch(&self, patch: &ProfilePatch) {
        let mut state = self.write();
        if state.token.is_none() {
            return;
        }
        match state.user.as_mut() {
            Some(user) => user.apply_patch(patch),
            // Role changes without a loaded profile are left to the refetch.
            None => tracing::debug!("Profile patch received before profile loaded"),
        }
    }

    // ------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------

    /// Refetch the matrix for navigation. No-op in legacy mode.
    /// Returns whether a new matrix was installed.
    pub async fn refresh_visibility(&self) -> bool {
        if self.mode == VisibilityMode::Legacy {
            return false;
        }
        let Some(token) = self.token() else {
            return false;
        };
        self.matrix.refresh(&self.backend, &token).await
    }

    /// Whether navigation to `page` should be shown to the current user.
    pub fn is_visible(&self, page: impl Into<PageKey>) -> bool {
        let page = page.into();
        let role = self.effective_role();
        match self.mode {
            VisibilityMode::Matrix => {
                let matrix = self.matrix.current();
                resolver::is_visible(role, &page, matrix.as_deref())
            }
            VisibilityMode::Legacy => LegacyPolicy.is_visible(role, &page),
        }
    }

    /// Navigation entries the current user may see, in catalogue order.
    pub fn visible_nav(&self) -> Vec<NavItem> {
        let role = self.effective_role();
        match self.mode {
            VisibilityMode::Matrix => {
                let matrix = self.matrix.current();
                resolver::visible_nav(role, &self.nav, matrix.as_deref())
                    .into_iter()
                    .cloned()
                    .collect()
            }
            VisibilityMode::Legacy => self
                .nav
                .iter()
                .filter(|item| LegacyPolicy.is_visible(role, &item.page))
                .cloned()
                .collect(),
        }
    }

    /// Route guard decision for `page`.
    pub fn route_access(&self, page: impl Into<PageKey>) -> RouteAccess {
        let page = page.into();
        let role = self.effective_role();
        match self.mode {
            VisibilityMode::Matrix => {
                let matrix = self.matrix.current();
                resolver::route_access(role, &page, matrix.as_deref())
            }
            VisibilityMode::Legacy if LegacyPolicy.is_visible(role, &page) => RouteAccess::Granted,
            VisibilityMode::Legacy => RouteAccess::Denied,
        }
    }

    /// Whether the visibility editor's save action should be enabled.
    pub fn can_edit_visibility(&self) -> bool {
        self.is_authenticated() && self.mutating_role().can_edit_visibility()
    }

    // ------------------------------------------------------------------
    // Visibility editor
    // ------------------------------------------------------------------

    /// Load the matrix for the editor screen. Errors are returned so the
    /// screen can show them.
    pub async fn load_visibility_editor(&self) -> Result<Arc<VisibilityMatrix>, ClientError> {
        let token = self.token().ok_or(ClientError::NotAuthenticated)?;
        match self.mode {
            VisibilityMode::Matrix => self.matrix.fetch(&self.backend, &token).await,
            VisibilityMode::Legacy => Ok(Arc::new(self.backend.fetch_visibility(&token).await?)),
        }
    }

    /// Save a new matrix. Only enabled for a SuperAdmin profile; the backend
    /// makes the real decision.
    ///
    /// On success the matrix is installed locally and `visibilityUpdated` is
    /// published so every consumer re-resolves.
    pub async fn save_visibility(&self, matrix: VisibilityMatrix) -> Result<(), ClientError> {
        let (token, epoch) = self.token_and_epoch().ok_or(ClientError::NotAuthenticated)?;
        let role = self.mutating_role();
        if !role.can_edit_visibility() {
            return Err(ClientError::Forbidden {
                role,
                action: "edit page visibility",
            });
        }

        self.backend.save_visibility(&token, &matrix).await?;
        tracing::info!(role = %role, "Visibility matrix saved");

        // A login or logout during the save owns the store now.
        if self.mode == VisibilityMode::Matrix && self.read().epoch == epoch {
            self.matrix.replace(matrix);
        }
        self.bus.publish(Signal::VisibilityUpdated);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------

    /// React to a bus signal.
    ///
    /// - `visibilityUpdated`: mark the matrix stale and refetch it
    /// - `profileUpdated`: merge the patch; refetch the profile when the role changed
    /// - `notificationsCleared`: nothing to resolve
    pub async fn handle_signal(&self, signal: &Signal) {
        match signal {
            Signal::VisibilityUpdated => {
                self.matrix.mark_stale();
                self.refresh_visibility().await;
            }
            Signal::ProfileUpdated(patch) => {
                self.apply_profile_patch(patch);
                if patch.changes_role() {
                    self.refresh_profile().await;
                }
            }
            Signal::NotificationsCleared => {
                tracing::trace!("Notifications cleared, visibility unaffected");
            }
        }
    }

    fn token_and_epoch(&self) -> Option<(String, u64)> {
        let state = self.read();
        state.token.clone().map(|token| (token, state.epoch))
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::auth::claims::tests::token_with_payload;
    use crate::bus::SignalKind;
    use crate::visibility::{pages, MatrixStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn admin_token() -> String {
        token_with_payload(r#"{"sub":"u1","email":"a@b.com","role":"admin"}"#)
    }

    fn scenario_matrix() -> VisibilityMatrix {
        serde_json::from_str(
            r#"{"admin":{"dashboard":true,"admin_users":false},"superadmin":{"dashboard":true,"visibility":true}}"#,
        )
        .unwrap()
    }

    fn session(backend: FakeBackend) -> Session<FakeBackend> {
        Session::new(backend, VisibilityMode::Matrix)
    }

    #[tokio::test]
    async fn signed_out_session_hides_everything() {
        let s = session(FakeBackend::new());
        assert_eq!(s.effective_role(), Role::Guest);
        assert!(!s.is_visible(pages::DASHBOARD));
        assert!(s.visible_nav().is_empty());
        assert_eq!(s.route_access(pages::DASHBOARD), RouteAccess::Pending);
    }

    #[tokio::test]
    async fn login_loads_profile_and_matrix() {
        let backend = FakeBackend::new();
        backend.set_profile(r#"{"_id":"u1","role":"admin","email":"profile@b.com"}"#);
        backend.set_matrix(scenario_matrix());
        let s = session(backend);

        s.login(admin_token()).await;

        assert_eq!(s.effective_role(), Role::Admin);
        assert_eq!(s.display_email().as_deref(), Some("profile@b.com"));
        assert!(s.is_visible(pages::DASHBOARD));
        assert!(!s.is_visible(pages::ADMIN_USERS));
        assert!(!s.is_visible(pages::VISIBILITY));
        assert_eq!(s.route_access(pages::ADMIN_USERS), RouteAccess::Denied);
        let labels: Vec<_> = s.visible_nav().into_iter().map(|i| i.label).collect();
        assert_eq!(labels, vec!["Dashboard"]);
    }

    #[tokio::test]
    async fn profile_failure_falls_back_to_token_role() {
        let backend = FakeBackend::new();
        backend.fail_profile(500);
        backend.set_matrix(scenario_matrix());
        let s = session(backend);

        s.login(admin_token()).await;

        assert!(s.user().is_none());
        assert_eq!(s.effective_role(), Role::Admin);
        assert_eq!(s.display_email().as_deref(), Some("a@b.com"));
        assert!(s.is_visible(pages::DASHBOARD));
        // Token role never enables mutations.
        assert_eq!(s.mutating_role(), Role::Guest);
        assert!(!s.can_edit_visibility());
    }

    #[tokio::test]
    async fn no_user_at_all_skips_matrix_fetch() {
        let backend = FakeBackend::new();
        backend.fail_profile(401);
        backend.set_matrix(scenario_matrix());
        let s = session(backend);

        s.login("opaque-token").await;

        assert_eq!(s.backend().visibility_calls(), 0);
        assert_eq!(s.matrix_store().status(), MatrixStatus::Unloaded);
        assert!(!s.is_visible(pages::DASHBOARD));
    }

    #[tokio::test]
    async fn matrix_failure_hides_everything() {
        let backend = FakeBackend::new();
        backend.set_profile(r#"{"role":"admin"}"#);
        backend.fail_matrix(502);
        let s = session(backend);

        s.login(admin_token()).await;

        assert_eq!(s.effective_role(), Role::Admin);
        assert!(!s.is_visible(pages::DASHBOARD));
        assert!(s.matrix_store().last_error().is_some());
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let backend = FakeBackend::new();
        backend.set_profile(r#"{"role":"admin"}"#);
        backend.set_matrix(scenario_matrix());
        let s = session(backend);
        s.login(admin_token()).await;
        assert!(s.is_visible(pages::DASHBOARD));

        s.logout();

        assert!(!s.is_authenticated());
        assert!(s.user().is_none());
        assert!(s.claims().is_none());
        assert_eq!(s.effective_role(), Role::Guest);
        assert!(!s.is_visible(pages::DASHBOARD));
        assert!(!s.refresh_visibility().await);
        assert!(!s.refresh_profile().await);
    }

    #[tokio::test]
    async fn relogin_does_not_leak_previous_matrix() {
        let backend = FakeBackend::new();
        backend.set_profile(r#"{"role":"admin"}"#);
        backend.set_matrix(scenario_matrix());
        let s = session(backend);
        s.login(admin_token()).await;
        assert!(s.is_visible(pages::DASHBOARD));

        s.backend().fail_matrix(500);
        s.login(admin_token()).await;
        assert!(!s.is_visible(pages::DASHBOARD));
    }

    #[tokio::test]
    async fn visibility_updated_signal_refetches() {
        let backend = FakeBackend::new();
        backend.set_profile(r#"{"role":"admin"}"#);
        backend.set_matrix(scenario_matrix());
        let s = session(backend);
        s.login(admin_token()).await;
        assert!(!s.is_visible(pages::ADMIN_USERS));

        s.backend().set_matrix(
            VisibilityMatrix::new()
                .with(Role::Admin, pages::DASHBOARD, true)
                .with(Role::Admin, pages::ADMIN_USERS, true),
        );
        s.handle_signal(&Signal::VisibilityUpdated).await;

        assert!(s.is_visible(pages::ADMIN_USERS));
        assert_eq!(s.matrix_store().status(), MatrixStatus::Fresh);
    }

    #[tokio::test]
    async fn profile_patch_with_role_change_refetches_profile() {
        let backend = FakeBackend::new();
        backend.set_profile(r#"{"role":"admin","avatarUrl":"a.png"}"#);
        backend.set_matrix(scenario_matrix());
        let s = session(backend);
        s.login(admin_token()).await;
        assert_eq!(s.backend().profile_calls(), 1);

        s.handle_signal(&Signal::ProfileUpdated(ProfilePatch {
            avatar_url: Some("b.png".to_string()),
            ..Default::default()
        }))
        .await;
        assert_eq!(s.user().unwrap().avatar_url.as_deref(), Some("b.png"));
        assert_eq!(s.backend().profile_calls(), 1);

        s.backend().set_profile(r#"{"role":"superadmin"}"#);
        s.handle_signal(&Signal::ProfileUpdated(ProfilePatch {
            role: Some(Role::SuperAdmin),
            ..Default::default()
        }))
        .await;
        assert_eq!(s.backend().profile_calls(), 2);
        assert_eq!(s.effective_role(), Role::SuperAdmin);
        assert!(s.is_visible(pages::VISIBILITY));
    }

    #[tokio::test]
    async fn save_requires_superadmin_profile() {
        let backend = FakeBackend::new();
        backend.set_profile(r#"{"role":"admin"}"#);
        backend.set_matrix(scenario_matrix());
        let s = session(backend);

        let err = s.save_visibility(VisibilityMatrix::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));

        // Token claims superadmin, profile says admin: profile decides.
        s.login(token_with_payload(r#"{"sub":"u1","email":"a@b.com","role":"superadmin"}"#))
            .await;
        assert_eq!(s.effective_role(), Role::Admin);
        let err = s.save_visibility(VisibilityMatrix::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::Forbidden { role: Role::Admin, .. }));
        assert!(s.backend().saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_installs_matrix_and_publishes() {
        let backend = FakeBackend::new();
        backend.set_profile(r#"{"role":"superadmin"}"#);
        backend.set_matrix(scenario_matrix());
        let s = session(backend);
        s.login(admin_token()).await;
        assert!(s.can_edit_visibility());

        let published = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&published);
        let _sub = s.bus().subscribe(SignalKind::VisibilityUpdated, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let edited = (*s.load_visibility_editor().await.unwrap())
            .clone()
            .with(Role::SuperAdmin, pages::ADMIN_USERS, true);
        s.save_visibility(edited).await.unwrap();

        assert!(s.is_visible(pages::ADMIN_USERS));
        assert_eq!(published.load(Ordering::SeqCst), 1);
        assert_eq!(s.backend().saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_finishing_after_relogin_is_not_installed() {
        let backend = FakeBackend::new();
        backend.set_profile(r#"{"role":"superadmin"}"#);
        backend.set_matrix(scenario_matrix());
        let s = session(backend);
        s.login(admin_token()).await;

        let gate = s.backend().hold_saves();
        let edited = scenario_matrix().with(Role::SuperAdmin, pages::ADMIN_USERS, true);
        let relogin = async {
            s.logout();
            s.login(admin_token()).await;
            gate.notify_one();
        };
        let (saved, ()) = tokio::join!(s.save_visibility(edited), relogin);
        saved.unwrap();

        // Same token string, new session: the matrix it loaded stays.
        assert_eq!(s.backend().saved.lock().unwrap().len(), 1);
        assert_eq!(s.matrix_store().status(), MatrixStatus::Fresh);
        assert!(!s.is_visible(pages::ADMIN_USERS));
    }

    #[tokio::test]
    async fn shared_bus_reaches_outside_subscribers() {
        let bus = ChangeBus::new();
        let published = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&published);
        let _sub = bus.subscribe(SignalKind::VisibilityUpdated, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let backend = FakeBackend::new();
        backend.set_profile(r#"{"role":"superadmin"}"#);
        backend.set_matrix(scenario_matrix());
        let s = session(backend).with_bus(bus.clone());
        s.login(admin_token()).await;

        s.save_visibility(scenario_matrix()).await.unwrap();
        assert_eq!(published.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(SignalKind::VisibilityUpdated), 1);
    }

    #[tokio::test]
    async fn custom_nav_catalogue() {
        let backend = FakeBackend::new();
        backend.set_profile(r#"{"role":"admin"}"#);
        backend.set_matrix(
            serde_json::from_str(r#"{"admin":{"dashboard":true,"deals":true,"reports":true,"contacts":false}}"#)
                .unwrap(),
        );
        let s = session(backend).with_nav(vec![
            NavItem::new(pages::CONTACTS, "Contacts", "/contacts"),
            NavItem::new("reports", "Reports", "/reports"),
            NavItem::new(pages::DEALS, "Deals", "/deals"),
        ]);
        s.login(admin_token()).await;

        let paths: Vec<String> = s.visible_nav().into_iter().map(|item| item.path).collect();
        assert_eq!(paths, vec!["/reports", "/deals"]);
    }

    #[tokio::test]
    async fn editor_surfaces_fetch_errors() {
        let backend = FakeBackend::new();
        backend.set_profile(r#"{"role":"superadmin"}"#);
        backend.fail_matrix(500);
        let s = session(backend);

        assert!(matches!(
            s.load_visibility_editor().await,
            Err(ClientError::NotAuthenticated)
        ));

        s.login(admin_token()).await;
        let err = s.load_visibility_editor().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn legacy_mode_never_touches_matrix() {
        let backend = FakeBackend::new();
        backend.set_profile(r#"{"role":"admin"}"#);
        backend.set_matrix(VisibilityMatrix::new().with(Role::Admin, pages::DASHBOARD, false));
        let s = Session::new(backend, VisibilityMode::Legacy);

        // Before login the guest still sees the dashboard under the fixed table.
        assert!(s.is_visible(pages::DASHBOARD));

        s.login(admin_token()).await;
        assert_eq!(s.backend().visibility_calls(), 0);
        assert_eq!(s.matrix_store().status(), MatrixStatus::Unloaded);
        assert!(s.is_visible(pages::DASHBOARD));
        assert!(s.is_visible(pages::ADMIN_USERS));
        assert!(!s.is_visible(pages::VISIBILITY));
        assert_eq!(s.route_access(pages::VISIBILITY), RouteAccess::Denied);
        assert_eq!(s.visible_nav().len(), 6);

        s.handle_signal(&Signal::VisibilityUpdated).await;
        assert_eq!(s.backend().visibility_calls(), 0);
    }
}
