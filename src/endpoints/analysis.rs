use super::EndpointError;
use crate::{ApiClient, CourseId, Record, Session};
use reqwest::{Method, RequestBuilder};

/// The knowledge points of a course and how they depend on each other.
pub async fn get_knowledge_graph(
    api: &ApiClient,
    session: &Session,
    course_id: &CourseId,
) -> Result<Record, EndpointError> {
    super::send(knowledge_graph_request(api, session, course_id)?).await
}

/// Learning progress, either overall or for one course.
pub async fn get_progress(
    api: &ApiClient,
    session: &Session,
    course_id: Option<&CourseId>,
) -> Result<Record, EndpointError> {
    super::send(progress_request(api, session, course_id)?).await
}

/// Scores for the ability radar chart.
pub async fn get_ability_radar(
    api: &ApiClient,
    session: &Session,
) -> Result<Record, EndpointError> {
    let request = api.request(session, Method::GET, "/analysis/ability")?;

    super::send(request).await
}

fn knowledge_graph_request(
    api: &ApiClient,
    session: &Session,
    course_id: &CourseId,
) -> Result<RequestBuilder, EndpointError> {
    Ok(api
        .request(session, Method::GET, "/analysis/knowledge-graph")?
        .query(&[("courseId", &**course_id)]))
}

fn progress_request(
    api: &ApiClient,
    session: &Session,
    course_id: Option<&CourseId>,
) -> Result<RequestBuilder, EndpointError> {
    let request = api.request(session, Method::GET, "/analysis/progress")?;

    Ok(match course_id {
        Some(id) => request.query(&[("courseId", &**id)]),
        None => request,
    })
}
