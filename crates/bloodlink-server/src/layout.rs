//! The frame every page view is wrapped in.

use serde::Serialize;

use bloodlink_shared::routes::{sidebar_links, AppRoute, NavLink};
use bloodlink_store::Profile;

use crate::auth::Session;

#[derive(Debug, Serialize)]
pub struct Layout {
    pub app_name: String,
    /// Absent on public pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<LayoutUser>,
    pub sidebar: Vec<NavLink>,
    pub active_path: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LayoutUser {
    pub email: String,
    pub name: Option<String>,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub title: &'static str,
    pub layout: Layout,
    pub data: T,
}

impl<T> Page<T> {
    /// A page shown to a signed-in user, with the sidebar for their role.
    pub fn member(
        app_name: &str,
        title: &'static str,
        route: AppRoute,
        session: &Session,
        data: T,
    ) -> Self {
        let is_admin = session.is_admin();
        Self {
            title,
            layout: Layout {
                app_name: app_name.to_string(),
                user: Some(LayoutUser {
                    email: session.email.clone(),
                    name: session.profile.as_ref().map(Profile::full_name),
                    is_admin,
                }),
                sidebar: sidebar_links(is_admin, route.path()),
                active_path: route.path(),
            },
            data,
        }
    }

    /// A public page. No sidebar.
    pub fn public(app_name: &str, title: &'static str, route: AppRoute, data: T) -> Self {
        Self {
            title,
            layout: Layout {
                app_name: app_name.to_string(),
                user: None,
                sidebar: Vec::new(),
                active_path: route.path(),
            },
            data,
        }
    }
}
