use std::collections::HashMap;

use actix_web::web::Query;
use actix_web::HttpRequest;

const HEADER_PREFIX: &str = "http.request.header.";
const QUERY_PREFIX: &str = "http.request.uri.query.";

/// Request attributes captured once when a request enters the pipeline.
#[derive(Debug, Clone, Default)]
pub struct RequestValues {
    pub method: String,
    pub scheme: String,
    pub host: String,
    pub uri: String,
    pub path: String,
    pub query: String,
    pub remote_host: Option<String>,
    pub uuid: String,
    /// Keyed by lowercased header name; repeated headers are joined with `,`.
    headers: HashMap<String, String>,
    query_params: HashMap<String, String>,
}

impl RequestValues {
    pub fn from_request(req: &HttpRequest, uuid: &str) -> Self {
        let conn = req.connection_info();
        let query = req.query_string().to_string();

        let mut headers: HashMap<String, String> = HashMap::new();
        for (name, value) in req.headers() {
            let Ok(value) = value.to_str() else {
                continue;
            };
            headers
                .entry(name.as_str().to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let query_params = Query::<HashMap<String, String>>::from_query(&query)
            .map(Query::into_inner)
            .unwrap_or_default();

        Self {
            method: req.method().to_string(),
            scheme: conn.scheme().to_string(),
            host: conn.host().to_string(),
            uri: req.uri().to_string(),
            path: req.path().to_string(),
            query,
            remote_host: conn.realip_remote_addr().map(strip_port),
            uuid: uuid.to_string(),
            headers,
            query_params,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let value = match name {
            "http.request.method" => Some(self.method.as_str()),
            "http.request.scheme" => Some(self.scheme.as_str()),
            "http.request.host" => Some(self.host.as_str()),
            "http.request.uri" => Some(self.uri.as_str()),
            "http.request.uri.path" => Some(self.path.as_str()),
            "http.request.uri.query" => Some(self.query.as_str()),
            "http.request.remote.host" => self.remote_host.as_deref(),
            "http.request.uuid" => Some(self.uuid.as_str()),
            _ => {
                if let Some(header) = name.strip_prefix(HEADER_PREFIX) {
                    self.header(header)
                } else if let Some(key) = name.strip_prefix(QUERY_PREFIX) {
                    self.query_params.get(key).map(String::as_str)
                } else {
                    None
                }
            }
        };
        value.map(str::to_string)
    }
}

fn strip_port(addr: &str) -> String {
    // "[::1]:8080" and "127.0.0.1:8080"; bare IPv6 addresses have no port.
    if let Some(rest) = addr.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest).to_string();
    }
    match addr.rsplit_once(':') {
        Some((host, _)) if !host.contains(':') => host.to_string(),
        _ => addr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn test_captures_request_attributes() {
        let req = TestRequest::get()
            .uri("/login?next=%2Fhome&name=alice")
            .insert_header(("X-User", "alice"))
            .insert_header(("Host", "auth.example.com"))
            .peer_addr("10.0.0.7:51000".parse().unwrap())
            .to_http_request();

        let values = RequestValues::from_request(&req, "req-1");

        assert_eq!(values.get("http.request.method").as_deref(), Some("GET"));
        assert_eq!(values.get("http.request.uri.path").as_deref(), Some("/login"));
        assert_eq!(
            values.get("http.request.uri.query").as_deref(),
            Some("next=%2Fhome&name=alice")
        );
        assert_eq!(
            values.get("http.request.uri.query.next").as_deref(),
            Some("/home")
        );
        assert_eq!(values.get("http.request.host").as_deref(), Some("auth.example.com"));
        assert_eq!(values.get("http.request.remote.host").as_deref(), Some("10.0.0.7"));
        assert_eq!(values.get("http.request.uuid").as_deref(), Some("req-1"));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = TestRequest::get()
            .insert_header(("X-Forwarded-User", "bob"))
            .to_http_request();
        let values = RequestValues::from_request(&req, "req-2");

        assert_eq!(
            values.get("http.request.header.x-forwarded-user").as_deref(),
            Some("bob")
        );
        assert_eq!(
            values.get("http.request.header.X-FORWARDED-USER").as_deref(),
            Some("bob")
        );
        assert_eq!(values.get("http.request.header.X-Missing"), None);
    }

    #[test]
    fn test_unknown_names_are_none() {
        let values = RequestValues::default();
        assert_eq!(values.get("http.request.nope"), None);
        assert_eq!(values.get("http.request.uri.query.absent"), None);
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("127.0.0.1:8080"), "127.0.0.1");
        assert_eq!(strip_port("[::1]:8080"), "::1");
        assert_eq!(strip_port("::1"), "::1");
        assert_eq!(strip_port("example.com"), "example.com");
    }
}
