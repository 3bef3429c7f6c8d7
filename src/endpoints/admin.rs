//! Catalog and account management. The server rejects these unless the
//! session belongs to an administrator.

use super::{CourseQuery, EndpointError};
use crate::{ApiClient, CourseId, Record, Session};
use reqwest::{Method, RequestBuilder};

pub async fn admin_list_courses(
    api: &ApiClient,
    session: &Session,
    query: &CourseQuery,
) -> Result<Record, EndpointError> {
    let request = api
        .request(session, Method::POST, "/admin/course/list")?
        .json(query);

    super::send(request).await
}

pub async fn admin_create_course(
    api: &ApiClient,
    session: &Session,
    course: &Record,
) -> Result<Record, EndpointError> {
    log::trace!("Payload: {}", course);
    super::send(create_request(api, session, course)?).await
}

pub async fn admin_update_course(
    api: &ApiClient,
    session: &Session,
    id: &CourseId,
    course: &Record,
) -> Result<Record, EndpointError> {
    log::trace!("Payload: {}", course);
    super::send(update_request(api, session, id, course)?).await
}

pub async fn admin_delete_course(
    api: &ApiClient,
    session: &Session,
    id: &CourseId,
) -> Result<(), EndpointError> {
    super::send_and_discard(delete_request(api, session, id)?).await
}

pub async fn admin_list_users(
    api: &ApiClient,
    session: &Session,
) -> Result<Record, EndpointError> {
    let request = api.request(session, Method::GET, "/admin/users")?;

    super::send(request).await
}

fn create_request(
    api: &ApiClient,
    session: &Session,
    course: &Record,
) -> Result<RequestBuilder, EndpointError> {
    Ok(api.request(session, Method::POST, "/admin/course")?.json(course))
}

fn update_request(
    api: &ApiClient,
    session: &Session,
    id: &CourseId,
    course: &Record,
) -> Result<RequestBuilder, EndpointError> {
    let url = api.url_with_id("/admin/course", id)?;
    Ok(api.request_to(session, Method::PUT, url).json(course))
}

fn delete_request(
    api: &ApiClient,
    session: &Session,
    id: &CourseId,
) -> Result<RequestBuilder, EndpointError> {
    let url = api.url_with_id("/admin/course", id)?;
    Ok(api.request_to(session, Method::DELETE, url))
}
