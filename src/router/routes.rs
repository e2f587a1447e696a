//! Static route table and path resolution.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

/// A navigable leaf route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Classmates,
    Activities,
    Photos,
    Profile,
    Login,
    Register,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Home,
        Route::Classmates,
        Route::Activities,
        Route::Photos,
        Route::Profile,
        Route::Login,
        Route::Register,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Classmates => "classmates",
            Self::Activities => "activities",
            Self::Photos => "photos",
            Self::Profile => "profile",
            Self::Login => "login",
            Self::Register => "register",
        }
    }

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Classmates => "/classmates",
            Self::Activities => "/activities",
            Self::Photos => "/photos",
            Self::Profile => "/profile",
            Self::Login => "/login",
            Self::Register => "/register",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Routes only meaningful to anonymous visitors.
    #[must_use]
    pub fn is_anonymous_only(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

/// One entry of the declarative route table.
#[derive(Debug, PartialEq, Eq)]
pub struct RouteRecord {
    /// Absolute path, or relative to the parent record (`""` = parent path).
    pub path: &'static str,
    pub name: &'static str,
    /// View rendered for this record.
    pub component: &'static str,
    pub requires_auth: bool,
    pub children: &'static [RouteRecord],
}

const fn leaf(path: &'static str, name: &'static str, component: &'static str, requires_auth: bool) -> RouteRecord {
    RouteRecord { path, name, component, requires_auth, children: &[] }
}

pub static ROUTES: &[RouteRecord] = &[
    RouteRecord {
        path: "/",
        name: "layout",
        component: "MainLayout",
        requires_auth: false,
        children: &[
            leaf("", "home", "HomeView", true),
            leaf("/classmates", "classmates", "ClassmatesView", true),
            leaf("/activities", "activities", "ActivitiesView", true),
            leaf("/photos", "photos", "PhotosView", true),
            leaf("/profile", "profile", "ProfileView", true),
        ],
    },
    leaf("/login", "login", "LoginView", false),
    leaf("/register", "register", "RegisterView", false),
];

/// Result of resolving a location against [`ROUTES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matched {
    pub route: Route,
    pub record: &'static RouteRecord,
    /// True when any record on the matched chain requires authentication.
    pub requires_auth: bool,
}

/// Strip query, fragment, and trailing slash from a location.
#[must_use]
pub fn normalize(location: &str) -> String {
    let path = location.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

/// Resolve a location to its leaf route, if any.
#[must_use]
pub fn resolve(location: &str) -> Option<Matched> {
    let path = normalize(location);
    find(ROUTES, "/", false, &path)
}

fn find(records: &'static [RouteRecord], parent: &str, inherited: bool, path: &str) -> Option<Matched> {
    for record in records {
        let full = join(parent, record.path);
        let requires_auth = inherited || record.requires_auth;
        if !record.children.is_empty() {
            if let Some(found) = find(record.children, &full, requires_auth, path) {
                return Some(found);
            }
            continue;
        }
        if full == path {
            let route = Route::from_name(record.name)?;
            return Some(Matched { route, record, requires_auth });
        }
    }
    None
}

fn join(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return normalize(child);
    }
    if child.is_empty() {
        return normalize(parent);
    }
    normalize(&format!("{}/{child}", parent.trim_end_matches('/')))
}
