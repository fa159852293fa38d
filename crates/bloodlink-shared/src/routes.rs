//! The application's URL surface, the access level of every route, and the
//! navigation decisions the route guards make.
//!
//! Guard decisions are pure functions of the route's [`Access`] and the
//! caller's [`Viewer`] state, so the server middleware and the tests share a
//! single source of truth.

use serde::Serialize;

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Protected,
    Admin,
}

/// Every page of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppRoute {
    Home,
    Login,
    Register,
    ForgotPassword,
    ResetPassword,
    CompleteProfile,
    Dashboard,
    Profile,
    Donations,
    NewDonation,
    EmergencyRequests,
    NewEmergencyRequest,
    AdminDashboard,
    AdminDonations,
    AdminEmergencyRequests,
    AdminUsers,
}

impl AppRoute {
    pub const ALL: [AppRoute; 16] = [
        AppRoute::Home,
        AppRoute::Login,
        AppRoute::Register,
        AppRoute::ForgotPassword,
        AppRoute::ResetPassword,
        AppRoute::CompleteProfile,
        AppRoute::Dashboard,
        AppRoute::Profile,
        AppRoute::Donations,
        AppRoute::NewDonation,
        AppRoute::EmergencyRequests,
        AppRoute::NewEmergencyRequest,
        AppRoute::AdminDashboard,
        AppRoute::AdminDonations,
        AppRoute::AdminEmergencyRequests,
        AppRoute::AdminUsers,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            AppRoute::Home => "/",
            AppRoute::Login => "/login",
            AppRoute::Register => "/register",
            AppRoute::ForgotPassword => "/forgot-password",
            AppRoute::ResetPassword => "/reset-password",
            AppRoute::CompleteProfile => "/complete-profile",
            AppRoute::Dashboard => "/dashboard",
            AppRoute::Profile => "/profile",
            AppRoute::Donations => "/donations",
            AppRoute::NewDonation => "/donations/new",
            AppRoute::EmergencyRequests => "/emergency-requests",
            AppRoute::NewEmergencyRequest => "/emergency-requests/new",
            AppRoute::AdminDashboard => "/admin",
            AppRoute::AdminDonations => "/admin/donations",
            AppRoute::AdminEmergencyRequests => "/admin/emergency-requests",
            AppRoute::AdminUsers => "/admin/users",
        }
    }

    pub fn access(&self) -> Access {
        match self {
            AppRoute::Home
            | AppRoute::Login
            | AppRoute::Register
            | AppRoute::ForgotPassword
            | AppRoute::ResetPassword => Access::Public,
            AppRoute::AdminDashboard
            | AppRoute::AdminDonations
            | AppRoute::AdminEmergencyRequests
            | AppRoute::AdminUsers => Access::Admin,
            _ => Access::Protected,
        }
    }

    /// Match a request path against the route table. Trailing slashes and
    /// query strings are ignored; anything unmatched resolves to `Home`.
    pub fn resolve(path: &str) -> AppRoute {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };

        AppRoute::ALL
            .into_iter()
            .find(|route| route.path() == normalized)
            .unwrap_or(AppRoute::Home)
    }
}

/// The slice of session state the guards look at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    pub signed_in: bool,
    /// `None` while the profile has not been completed.
    pub is_admin: Option<bool>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Outcome of running a route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(AppRoute),
}

/// `ProtectedRoute`: a session must be present.
pub fn protected_route(viewer: &Viewer) -> GuardDecision {
    if viewer.signed_in {
        GuardDecision::Render
    } else {
        GuardDecision::Redirect(AppRoute::Login)
    }
}

/// `AdminRoute`: the session's profile must carry the admin flag.
pub fn admin_route(viewer: &Viewer) -> GuardDecision {
    if viewer.signed_in && viewer.is_admin == Some(true) {
        GuardDecision::Render
    } else {
        GuardDecision::Redirect(AppRoute::Dashboard)
    }
}

/// Run every guard that applies to `route`, outermost first.
pub fn guard(route: AppRoute, viewer: &Viewer) -> GuardDecision {
    match route.access() {
        Access::Public => GuardDecision::Render,
        Access::Protected => protected_route(viewer),
        Access::Admin => match protected_route(viewer) {
            GuardDecision::Render => admin_route(viewer),
            redirect => redirect,
        },
    }
}

// ---------------------------------------------------------------------------
// Sidebar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub name: &'static str,
    pub path: &'static str,
    pub active: bool,
}

const USER_LINKS: [(&str, AppRoute); 4] = [
    ("Dashboard", AppRoute::Dashboard),
    ("My Donations", AppRoute::Donations),
    ("Emergency Requests", AppRoute::EmergencyRequests),
    ("My Profile", AppRoute::Profile),
];

const ADMIN_LINKS: [(&str, AppRoute); 4] = [
    ("Admin Dashboard", AppRoute::AdminDashboard),
    ("Manage Users", AppRoute::AdminUsers),
    ("Manage Donations", AppRoute::AdminDonations),
    ("Manage Emergencies", AppRoute::AdminEmergencyRequests),
];

/// Role-aware sidebar: admins see the user links followed by the admin ones.
pub fn sidebar_links(is_admin: bool, current_path: &str) -> Vec<NavLink> {
    let admin: &[(&str, AppRoute)] = if is_admin { &ADMIN_LINKS } else { &[] };
    USER_LINKS
        .iter()
        .chain(admin.iter())
        .map(|&(name, route)| NavLink {
            name,
            path: route.path(),
            active: route.path() == current_path,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> Viewer {
        Viewer {
            signed_in: true,
            is_admin: Some(false),
        }
    }

    fn admin() -> Viewer {
        Viewer {
            signed_in: true,
            is_admin: Some(true),
        }
    }

    #[test]
    fn every_route_resolves_to_itself() {
        for route in AppRoute::ALL {
            assert_eq!(AppRoute::resolve(route.path()), route);
        }
    }

    #[test]
    fn unmatched_paths_resolve_home() {
        for path in ["/nope", "/admin/secret", "/donations/42", "", "//", "/dashboard/x"] {
            assert_eq!(AppRoute::resolve(path), AppRoute::Home, "path {path:?}");
        }
        assert_eq!(AppRoute::resolve("/donations/?x=1"), AppRoute::Donations);
        assert_eq!(
            AppRoute::resolve("/reset-password/?token=abc"),
            AppRoute::ResetPassword
        );
    }

    #[test]
    fn protected_routes_need_session() {
        for route in AppRoute::ALL.into_iter().filter(|r| r.access() != Access::Public) {
            assert_eq!(
                guard(route, &Viewer::anonymous()),
                GuardDecision::Redirect(AppRoute::Login),
                "{route:?}"
            );
        }
    }

    #[test]
    fn admin_routes_deny_non_admins() {
        let no_profile = Viewer {
            signed_in: true,
            is_admin: None,
        };
        for route in AppRoute::ALL.into_iter().filter(|r| r.access() == Access::Admin) {
            assert_eq!(guard(route, &member()), GuardDecision::Redirect(AppRoute::Dashboard));
            assert_eq!(guard(route, &no_profile), GuardDecision::Redirect(AppRoute::Dashboard));
            assert_eq!(guard(route, &admin()), GuardDecision::Render);
        }
    }

    #[test]
    fn reset_password_is_public() {
        assert_eq!(AppRoute::ResetPassword.access(), Access::Public);
        assert_eq!(
            guard(AppRoute::ResetPassword, &Viewer::anonymous()),
            GuardDecision::Render
        );
    }

    #[test]
    fn public_routes_always_render() {
        for route in AppRoute::ALL.into_iter().filter(|r| r.access() == Access::Public) {
            assert_eq!(guard(route, &Viewer::anonymous()), GuardDecision::Render);
        }
    }

    #[test]
    fn sidebar_is_role_aware() {
        let links = sidebar_links(false, "/donations");
        assert_eq!(links.len(), 4);
        assert!(links.iter().all(|l| !l.path.starts_with("/admin")));
        assert!(links.iter().any(|l| l.path == "/donations" && l.active));

        let links = sidebar_links(true, "/admin");
        assert_eq!(links.len(), 8);
        assert_eq!(links.iter().filter(|l| l.active).count(), 1);
    }
}
