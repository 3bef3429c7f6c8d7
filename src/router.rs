//! Mapping paths to screens, and deciding who may visit them.

use crate::{
    session::{AuthState, Session, SessionError},
    CourseId,
};
use std::time::SystemTime;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
/// Where authenticated users end up when they can't go where they asked.
pub const LANDING_PATH: &str = "/course";
pub const ADMIN_PREFIX: &str = "/admin";

/// Every screen the client knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Courses,
    CourseDetail(CourseId),
    Recommend,
    Dashboard,
    KnowledgeGraph,
    Profile,
    AdminCourses,
    AdminCourseEdit(CourseId),
    AdminCourseRegister,
    AdminUsers,
    NotFound(String),
}

impl Route {
    /// Match a normalised path (see [`normalize()`]) against the route table.
    pub fn resolve(path: &str) -> Route {
        let segments: Vec<&str> =
            path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["course"] => Route::Courses,
            ["course", id] => Route::CourseDetail(CourseId::from(*id)),
            ["recommend"] => Route::Recommend,
            ["dashboard"] => Route::Dashboard,
            ["graph"] => Route::KnowledgeGraph,
            ["profile"] => Route::Profile,
            ["admin", "course"] => Route::AdminCourses,
            ["admin", "course", "edit", id] => {
                Route::AdminCourseEdit(CourseId::from(*id))
            },
            ["admin", "course", "register"] => Route::AdminCourseRegister,
            ["admin", "users"] => Route::AdminUsers,
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Register => "Register",
            Route::Courses => "Course",
            Route::CourseDetail(_) => "CourseDetail",
            Route::Recommend => "Recommend",
            Route::Dashboard => "Dashboard",
            Route::KnowledgeGraph => "KnowledgeGraph",
            Route::Profile => "Profile",
            Route::AdminCourses => "AdminCourse",
            Route::AdminCourseEdit(_) => "AdminCourseEdit",
            Route::AdminCourseRegister => "AdminCourseRegister",
            Route::AdminUsers => "AdminUsers",
            Route::NotFound(_) => "NotFound",
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => String::from(LOGIN_PATH),
            Route::Register => String::from(REGISTER_PATH),
            Route::Courses => String::from(LANDING_PATH),
            Route::CourseDetail(id) => format!("/course/{}", id),
            Route::Recommend => String::from("/recommend"),
            Route::Dashboard => String::from("/dashboard"),
            Route::KnowledgeGraph => String::from("/graph"),
            Route::Profile => String::from("/profile"),
            Route::AdminCourses => String::from("/admin/course"),
            Route::AdminCourseEdit(id) => format!("/admin/course/edit/{}", id),
            Route::AdminCourseRegister => String::from("/admin/course/register"),
            Route::AdminUsers => String::from("/admin/users"),
            Route::NotFound(path) => path.clone(),
        }
    }
}

/// The guard's verdict on a navigation attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Guard {
    Allow,
    Redirect(&'static str),
}

/// Decide whether someone in `state` may visit `path`.
pub fn guard(state: AuthState, path: &str) -> Guard {
    let path = normalize(path);
    let path = path.as_str();

    if path == LOGIN_PATH || path == REGISTER_PATH {
        Guard::Allow
    } else if state == AuthState::Unauthenticated {
        Guard::Redirect(LOGIN_PATH)
    } else if is_admin_path(path) && state != AuthState::Admin {
        Guard::Redirect(LANDING_PATH)
    } else {
        Guard::Allow
    }
}

fn is_admin_path(path: &str) -> bool {
    path == ADMIN_PREFIX
        || path
            .strip_prefix(ADMIN_PREFIX)
            .map_or(false, |rest| rest.starts_with('/'))
}

/// Strip any fragment prefix, query string and empty segments so
/// `#/course/3/?tab=videos`, `//course//3` and `/course/3` compare equal.
pub fn normalize(path: &str) -> String {
    let path = path.trim().trim_start_matches('#');
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    let segments: Vec<&str> =
        path[..end].split('/').filter(|s| !s.is_empty()).collect();

    format!("/{}", segments.join("/"))
}

/// Tracks the current screen and runs the guard on every transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Router {
    current: Option<Route>,
}

impl Router {
    pub fn new() -> Self { Router::default() }

    pub fn current(&self) -> Option<&Route> { self.current.as_ref() }

    /// Try to go to `path`, ending up wherever the guard lets us.
    pub fn navigate(
        &mut self,
        session: &mut Session,
        path: &str,
    ) -> Result<Route, SessionError> {
        self.navigate_at(session, path, SystemTime::now())
    }

    pub fn navigate_at(
        &mut self,
        session: &mut Session,
        path: &str,
        now: SystemTime,
    ) -> Result<Route, SessionError> {
        session.expire_if_stale_at(now)?;
        let state = session.auth_state_at(now);

        let mut target = normalize(path);
        if target == "/" {
            target = String::from(LANDING_PATH);
        }

        // login and register are always allowed, so this settles within two
        // hops
        while let Guard::Redirect(to) = guard(state, &target) {
            log::debug!("Redirecting from {} to {}", target, to);
            target = String::from(to);
        }

        let route = Route::resolve(&target);
        log::debug!("Navigated to {} ({})", route.name(), target);
        self.current = Some(route.clone());

        Ok(route)
    }
}
