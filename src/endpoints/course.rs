use super::EndpointError;
use crate::{ApiClient, CourseId, Record, Session};
use reqwest::{Method, RequestBuilder};
use serde_derive::{Deserialize, Serialize};

/// Filters and paging for the course catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_num: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

pub async fn get_categories(
    api: &ApiClient,
    session: &Session,
) -> Result<Record, EndpointError> {
    super::send(categories_request(api, session)?).await
}

/// Search the course catalog.
pub async fn get_courses(
    api: &ApiClient,
    session: &Session,
    query: &CourseQuery,
) -> Result<Record, EndpointError> {
    log::trace!("Payload: {:#?}", query);
    super::send(courses_request(api, session, query)?).await
}

/// Everything about a single course, including its videos.
pub async fn get_course(
    api: &ApiClient,
    session: &Session,
    id: &CourseId,
) -> Result<Record, EndpointError> {
    super::send(course_request(api, session, id)?).await
}

/// Courses the backend thinks the current user should take next.
pub async fn get_recommendations(
    api: &ApiClient,
    session: &Session,
) -> Result<Record, EndpointError> {
    super::send(recommendations_request(api, session)?).await
}

fn categories_request(
    api: &ApiClient,
    session: &Session,
) -> Result<RequestBuilder, EndpointError> {
    api.request(session, Method::GET, "/course/categories")
}

fn courses_request(
    api: &ApiClient,
    session: &Session,
    query: &CourseQuery,
) -> Result<RequestBuilder, EndpointError> {
    Ok(api.request(session, Method::POST, "/course/list")?.json(query))
}

fn course_request(
    api: &ApiClient,
    session: &Session,
    id: &CourseId,
) -> Result<RequestBuilder, EndpointError> {
    let url = api.url_with_id("/course", id)?;
    Ok(api.request_to(session, Method::GET, url))
}

fn recommendations_request(
    api: &ApiClient,
    session: &Session,
) -> Result<RequestBuilder, EndpointError> {
    api.request(session, Method::GET, "/course/recommend")
}
