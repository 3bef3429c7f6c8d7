//! The CourseHub API's endpoints.

mod admin;
mod analysis;
mod course;
mod user;

pub use admin::{
    admin_create_course, admin_delete_course, admin_list_courses,
    admin_list_users, admin_update_course,
};
pub use analysis::{get_ability_radar, get_knowledge_graph, get_progress};
pub use course::{
    get_categories, get_course, get_courses, get_recommendations, CourseQuery,
};
pub use user::{get_profile, login, register, Credentials, LoginError, Registration};

use crate::{Config, CourseId, Record, Session};
use reqwest::{Client, Method, RequestBuilder};
use url::Url;

/// Typical endpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The HTTP client encountered an error.
    #[error("Unable to send the request")]
    HttpClient(#[from] reqwest::Error),
    #[error("Unable to build the request URL")]
    BadUrl(#[from] url::ParseError),
    #[error("\"{0}\" can't be used as a base URL")]
    NotABaseUrl(Url),
}

/// A handle to the backend, shared by every endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .cookie_store(true)
            .build()?;

        Ok(ApiClient {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url { &self.base_url }

    /// Resolve `path` against the base URL, keeping any prefix the base URL
    /// already has (e.g. `http://host/api`).
    pub fn url(&self, path: &str) -> Result<Url, EndpointError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{}/{}", base, path.trim_start_matches('/')))?;

        Ok(url)
    }

    /// Like [`ApiClient::url()`], with `id` appended as an escaped path
    /// segment.
    pub fn url_with_id(
        &self,
        path: &str,
        id: &CourseId,
    ) -> Result<Url, EndpointError> {
        let mut url = self.url(path)?;
        if url.cannot_be_a_base() {
            return Err(EndpointError::NotABaseUrl(url));
        }

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id);
        }

        Ok(url)
    }

    /// Start a request to `path`, authenticated as the `session`'s user when
    /// there is one.
    pub fn request(
        &self,
        session: &Session,
        method: Method,
        path: &str,
    ) -> Result<RequestBuilder, EndpointError> {
        let url = self.url(path)?;
        Ok(self.request_to(session, method, url))
    }

    pub fn request_to(
        &self,
        session: &Session,
        method: Method,
        url: Url,
    ) -> RequestBuilder {
        log::debug!("Sending a {} request to {}", method, url);
        let builder = self.client.request(method, url);

        match session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

async fn send(request: RequestBuilder) -> Result<Record, EndpointError> {
    let response = request.send().await?.error_for_status()?;
    log::trace!("Headers: {:#?}", response.headers());

    let body: Record = response.json().await?;
    log::trace!("Response: {}", body);

    Ok(body)
}

/// For endpoints where we only care that the server said yes.
async fn send_and_discard(request: RequestBuilder) -> Result<(), EndpointError> {
    let response = request.send().await?.error_for_status()?;
    log::trace!("Headers: {:#?}", response.headers());

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{claims::forge, MemoryStorage};
    use reqwest::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Request,
    };
    use serde_json::json;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    fn api_at(base_url: &str) -> ApiClient {
        ApiClient::new(&Config::new(base_url).unwrap()).unwrap()
    }

    pub(crate) fn api() -> ApiClient { api_at("http://localhost:8080") }

    pub(crate) fn anonymous() -> Session { Session::new(MemoryStorage::new()) }

    pub(crate) fn is_json(request: &Request) -> bool {
        request
            .headers()
            .get(CONTENT_TYPE)
            .map_or(false, |ct| ct == "application/json")
    }

    pub(crate) fn logged_in() -> (Session, String) {
        let token = forge(&json!({
            "userId": 1,
            "username": "alice",
            "role": "USER",
            "exp": 4_000_000_000_i64,
        }));
        let mut session = Session::new(MemoryStorage::new());
        session.set_token(&token).unwrap();

        (session, token)
    }

    #[test]
    fn attach_the_bearer_token_when_logged_in() {
        let (session, token) = logged_in();

        let request = api()
            .request(&session, Method::GET, "/user/profile")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:8080/user/profile");
        assert_eq!(
            request.headers()[AUTHORIZATION].to_str().unwrap(),
            format!("Bearer {}", token)
        );
    }

    #[test]
    fn anonymous_requests_have_no_authorization_header() {
        let session = anonymous();

        let request = api()
            .request(&session, Method::POST, "/user/login")
            .unwrap()
            .build()
            .unwrap();

        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn keep_the_base_urls_prefix() {
        let api = api_at("http://example.com/api/");

        let got = api.url("/course/list").unwrap();

        assert_eq!(got.as_str(), "http://example.com/api/course/list");
    }

    #[test]
    fn ids_are_escaped_as_a_single_segment() {
        let got = api()
            .url_with_id("/admin/course", &CourseId::from("a/b c"))
            .unwrap();

        assert_eq!(got.as_str(), "http://localhost:8080/admin/course/a%2Fb%20c");
    }

    /// Serve a single canned response on a random local port.
    async fn serve_once(response: &'static str) -> String {
        let mut listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = [0; 4096];
            let _ = socket.read(&mut buffer).await;
            let _ = socket.write_all(response.as_bytes()).await;
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn error_statuses_reach_the_caller_untouched() {
        let base_url = serve_once(
            "HTTP/1.1 403 Forbidden\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let api = api_at(&base_url);

        let got = admin_list_users(&api, &anonymous()).await.unwrap_err();

        match got {
            EndpointError::HttpClient(e) => {
                assert_eq!(e.status(), Some(reqwest::StatusCode::FORBIDDEN))
            },
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn successful_responses_are_decoded_as_json() {
        let base_url = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 10\r\nconnection: close\r\n\r\n{\"id\": 12}",
        )
        .await;
        let api = api_at(&base_url);

        let got = get_profile(&api, &anonymous()).await.unwrap();

        assert_eq!(got, json!({ "id": 12 }));
    }
}
