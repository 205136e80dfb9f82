use std::{sync::Arc, time::Duration};

use log::debug;
use reqwest::Url;

use crate::{
    error::HistoryError,
    model::{Coordinates, HistoricalParameters, HistoricalWeatherData},
    transport::{HttpTransport, ReqwestTransport},
    unit::DataUnit,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/history/city";

/// Construction-time options for [`HistoricalClient`].
#[derive(Debug, Clone)]
pub enum ClientOption {
    /// Use this transport instead of the default one. `None` is rejected.
    HttpTransport(Option<Arc<dyn HttpTransport>>),
    /// Timeout for the default transport. Ignored when a transport is supplied.
    Timeout(Duration),
    BaseUrl(String),
}

impl ClientOption {
    pub fn transport<T: HttpTransport + 'static>(transport: T) -> Self {
        ClientOption::HttpTransport(Some(Arc::new(transport)))
    }
}

/// Client for the historical weather endpoint.
///
/// Each query returns its own [`HistoricalWeatherData`]; the client holds no
/// per-request state and can be cloned or shared freely.
#[derive(Debug, Clone)]
pub struct HistoricalClient {
    unit: DataUnit,
    api_key: String,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl HistoricalClient {
    pub fn new(
        unit: &str,
        api_key: impl Into<String>,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> Result<Self, HistoryError> {
        let unit = DataUnit::from_token_ignore_case(unit)?;

        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(HistoryError::MissingApiKey);
        }

        let mut transport: Option<Arc<dyn HttpTransport>> = None;
        let mut timeout = None;
        let mut base_url = DEFAULT_BASE_URL.to_string();

        for option in options {
            match option {
                ClientOption::HttpTransport(Some(t)) => transport = Some(t),
                ClientOption::HttpTransport(None) => return Err(HistoryError::InvalidTransport),
                ClientOption::Timeout(t) => timeout = Some(t),
                ClientOption::BaseUrl(url) => base_url = validate_base_url(url)?,
            }
        }

        let transport = match (transport, timeout) {
            (Some(t), _) => t,
            (None, Some(timeout)) => {
                let built = ReqwestTransport::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(HistoryError::TransportConfig)?;
                Arc::new(built)
            }
            (None, None) => Arc::new(ReqwestTransport::new()),
        };

        Ok(Self { unit, api_key, base_url, transport })
    }

    pub fn unit(&self) -> DataUnit {
        self.unit
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.transport.timeout()
    }

    /// History for a free-text location such as "Vancouver" or "London,GB".
    pub async fn history_by_name(
        &self,
        location: &str,
    ) -> Result<HistoricalWeatherData, HistoryError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(HistoryError::EmptyLocation);
        }

        self.fetch(vec![("q", location.to_string())]).await
    }

    pub async fn history_by_id(
        &self,
        id: u64,
        params: &HistoricalParameters,
    ) -> Result<HistoricalWeatherData, HistoryError> {
        let mut pairs = vec![("id", id.to_string())];
        pairs.extend(params.query_pairs());

        self.fetch(pairs).await
    }

    pub async fn history_by_coord(
        &self,
        coords: &Coordinates,
        params: &HistoricalParameters,
    ) -> Result<HistoricalWeatherData, HistoryError> {
        let mut pairs = vec![
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
        ];
        pairs.extend(params.query_pairs());

        self.fetch(pairs).await
    }

    async fn fetch(
        &self,
        target: Vec<(&'static str, String)>,
    ) -> Result<HistoricalWeatherData, HistoryError> {
        debug!("GET {} units={} {:?}", self.base_url, self.unit.api_code(), target);

        let mut query = vec![
            ("appid", self.api_key.clone()),
            ("units", self.unit.api_code().to_string()),
        ];
        query.extend(target);

        let res = self
            .transport
            .get(&self.base_url, &query)
            .await
            .map_err(|source| HistoryError::Transport { url: self.base_url.clone(), source })?;

        debug!("{} responded with status {}", self.base_url, res.status);

        if !res.is_success() {
            return Err(HistoryError::HttpStatus {
                status: res.status,
                body: truncate_body(&res.body),
            });
        }

        let data: HistoricalWeatherData =
            serde_json::from_str(&res.body).map_err(HistoryError::Decode)?;

        if !data.is_ok_code() {
            return Err(HistoryError::Service { cod: data.cod, message: data.message });
        }

        Ok(data)
    }
}

fn validate_base_url(url: String) -> Result<String, HistoryError> {
    let parsed = Url::parse(&url)
        .map_err(|e| HistoryError::InvalidBaseUrl { url: url.clone(), reason: e.to_string() })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(HistoryError::InvalidBaseUrl {
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
            url,
        });
    }

    Ok(url)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::transport::{TransportError, TransportResponse};

    const HISTORY_JSON: &str = r#"{
        "message": "Count: 1",
        "cod": "200",
        "city_id": 6173331,
        "calctime": 0.0042,
        "cnt": 1,
        "list": [{
            "dt": 1461598510,
            "main": {"temp": 52.3, "temp_min": 50.0, "temp_max": 54.0, "pressure": 1020, "humidity": 81},
            "wind": {"speed": 3.4, "deg": 180},
            "clouds": {"all": 75},
            "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}]
        }]
    }"#;

    type Query = Vec<(String, String)>;

    /// Serves queued responses in order and records every request.
    #[derive(Debug, Default)]
    struct CannedTransport {
        responses: Mutex<Vec<Result<TransportResponse, TransportError>>>,
        requests: Mutex<Vec<(String, Query)>>,
        timeout: Option<Duration>,
    }

    impl CannedTransport {
        fn serving(mut responses: Vec<Result<TransportResponse, TransportError>>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self { responses: Mutex::new(responses), ..Default::default() })
        }

        fn ok(body: &str) -> Result<TransportResponse, TransportError> {
            Ok(TransportResponse { status: 200, body: body.to_string() })
        }

        fn requests(&self) -> Vec<(String, Query)> {
            self.requests.lock().unwrap().clone()
        }

        fn last_query(&self) -> Query {
            self.requests().last().expect("a request was made").1.clone()
        }
    }

    #[async_trait]
    impl HttpTransport for CannedTransport {
        async fn get(
            &self,
            url: &str,
            query: &[(&str, String)],
        ) -> Result<TransportResponse, TransportError> {
            let query = query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
            self.requests.lock().unwrap().push((url.to_string(), query));
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(TransportError::Other("no canned response left".into())))
        }

        fn timeout(&self) -> Option<Duration> {
            self.timeout
        }
    }

    fn client_with(transport: &Arc<CannedTransport>, unit: &str) -> HistoricalClient {
        let transport: Arc<dyn HttpTransport> = transport.clone();
        HistoricalClient::new(unit, "KEY", [ClientOption::HttpTransport(Some(transport))])
            .expect("client should build")
    }

    fn value<'a>(query: &'a Query, key: &str) -> Option<&'a str> {
        query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn sample_params() -> HistoricalParameters {
        HistoricalParameters { start: 1461598510, end: 1461588510, cnt: Some(1) }
    }

    #[test]
    fn new_accepts_every_unit() {
        for unit in DataUnit::all() {
            let client = HistoricalClient::new(unit.token(), "KEY", []).expect("valid unit");
            assert_eq!(client.unit(), *unit);
            assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        }
    }

    #[test]
    fn new_rejects_unknown_unit() {
        let err = HistoricalClient::new("asdf", "KEY", []).unwrap_err();
        assert!(matches!(err, HistoryError::UnitUnavailable(_)));
    }

    #[test]
    fn new_rejects_blank_api_key() {
        let err = HistoricalClient::new("C", "  ", []).unwrap_err();
        assert!(matches!(err, HistoryError::MissingApiKey));
    }

    #[test]
    fn explicit_empty_transport_is_an_error() {
        let result = HistoricalClient::new("c", "KEY", [ClientOption::HttpTransport(None)]);
        assert!(matches!(result, Err(HistoryError::InvalidTransport)));
    }

    #[test]
    fn custom_transport_timeout_is_preserved() {
        let transport = ReqwestTransport::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .expect("client should build");

        let client = HistoricalClient::new("c", "KEY", [ClientOption::transport(transport)])
            .expect("client should build");

        assert_eq!(client.unit(), DataUnit::Celsius);
        assert_eq!(client.timeout(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn timeout_option_configures_default_transport() {
        let client = HistoricalClient::new("K", "KEY", [ClientOption::Timeout(Duration::from_secs(5))])
            .expect("client should build");
        assert_eq!(client.timeout(), Some(Duration::from_secs(5)));

        let client = HistoricalClient::new("K", "KEY", []).expect("client should build");
        assert_eq!(client.timeout(), None);
    }

    #[test]
    fn supplied_transport_wins_over_timeout() {
        let transport = Arc::new(CannedTransport { timeout: Some(Duration::from_secs(9)), ..Default::default() });
        let transport: Arc<dyn HttpTransport> = transport;
        let client = HistoricalClient::new(
            "F",
            "KEY",
            [ClientOption::HttpTransport(Some(transport)), ClientOption::Timeout(Duration::from_secs(1))],
        )
        .expect("client should build");

        assert_eq!(client.timeout(), Some(Duration::from_secs(9)));
    }

    #[test]
    fn base_url_option() {
        let client = HistoricalClient::new("F", "KEY", [ClientOption::BaseUrl("http://localhost:8080/history".into())])
            .expect("client should build");
        assert_eq!(client.base_url(), "http://localhost:8080/history");

        let err = HistoricalClient::new("F", "KEY", [ClientOption::BaseUrl("not a url".into())]).unwrap_err();
        assert!(matches!(err, HistoryError::InvalidBaseUrl { .. }));

        let err = HistoricalClient::new("F", "KEY", [ClientOption::BaseUrl("ftp://example.com".into())]).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[tokio::test]
    async fn history_by_name_returns_data() {
        let transport = CannedTransport::serving(vec![CannedTransport::ok(HISTORY_JSON)]);
        let client = client_with(&transport, "F");

        let data = client.history_by_name("Vancouver").await.expect("query should succeed");
        assert!(!data.is_empty());
        assert_eq!(data.city_id, 6173331);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, DEFAULT_BASE_URL);

        let query = &requests[0].1;
        assert_eq!(value(query, "q"), Some("Vancouver"));
        assert_eq!(value(query, "appid"), Some("KEY"));
        assert_eq!(value(query, "units"), Some("imperial"));
        assert_eq!(value(query, "type"), None);
        assert_eq!(value(query, "start"), None);
    }

    #[tokio::test]
    async fn history_by_id_forwards_window_as_given() {
        let transport = CannedTransport::serving(vec![CannedTransport::ok(HISTORY_JSON)]);
        let client = client_with(&transport, "F");

        let data = client.history_by_id(5344157, &sample_params()).await.expect("query should succeed");
        assert_eq!(data.list.len(), 1);

        let query = transport.last_query();
        assert_eq!(value(&query, "id"), Some("5344157"));
        assert_eq!(value(&query, "type"), Some("hour"));
        assert_eq!(value(&query, "start"), Some("1461598510"));
        assert_eq!(value(&query, "end"), Some("1461588510"));
        assert_eq!(value(&query, "cnt"), Some("1"));
    }

    #[tokio::test]
    async fn history_by_coord_sends_lat_lon() {
        let transport = CannedTransport::serving(vec![CannedTransport::ok(HISTORY_JSON)]);
        let client = client_with(&transport, "C");

        let coords = Coordinates { longitude: -112.07, latitude: 33.45 };
        let params = HistoricalParameters::new(1461598510, 1461588510);
        let data = client.history_by_coord(&coords, &params).await.expect("query should succeed");
        assert!(!data.is_empty());

        let query = transport.last_query();
        assert_eq!(value(&query, "lat"), Some("33.45"));
        assert_eq!(value(&query, "lon"), Some("-112.07"));
        assert_eq!(value(&query, "units"), Some("metric"));
        assert_eq!(value(&query, "cnt"), None);
    }

    #[tokio::test]
    async fn empty_location_makes_no_request() {
        let transport = CannedTransport::serving(vec![]);
        let client = client_with(&transport, "F");

        let err = client.history_by_name("   ").await.unwrap_err();
        assert!(matches!(err, HistoryError::EmptyLocation));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn failures_leave_client_usable() {
        let transport = CannedTransport::serving(vec![
            Ok(TransportResponse { status: 401, body: r#"{"cod":401,"message":"Invalid API key"}"#.into() }),
            CannedTransport::ok("not json"),
            Err(TransportError::Other("connection reset".into())),
            CannedTransport::ok(HISTORY_JSON),
        ]);
        let client = client_with(&transport, "F");

        let err = client.history_by_name("Vancouver").await.unwrap_err();
        match err {
            HistoryError::HttpStatus { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = client.history_by_id(5344157, &sample_params()).await.unwrap_err();
        assert!(matches!(err, HistoryError::Decode(_)));

        let err = client.history_by_name("Vancouver").await.unwrap_err();
        assert!(matches!(err, HistoryError::Transport { .. }));

        let data = client.history_by_name("Vancouver").await.expect("client should still work");
        assert!(!data.is_empty());
        assert_eq!(transport.requests().len(), 4);
    }

    #[tokio::test]
    async fn bodies_outside_the_schema_are_rejected() {
        let transport = CannedTransport::serving(vec![
            CannedTransport::ok("{}"),
            CannedTransport::ok(r#"{"unexpected":true}"#),
            CannedTransport::ok(r#"{"cod":"404","message":"city not found"}"#),
            CannedTransport::ok(r#"{"cod":"404","message":"city not found","list":[]}"#),
        ]);
        let client = client_with(&transport, "F");

        for _ in 0..3 {
            let err = client.history_by_name("Nowhere").await.unwrap_err();
            assert!(matches!(err, HistoryError::Decode(_)), "unexpected error: {err:?}");
        }

        let err = client.history_by_name("Nowhere").await.unwrap_err();
        match err {
            HistoryError::Service { cod, message } => {
                assert_eq!(cod, "404");
                assert_eq!(message, "city not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn new_accepts_lowercase_unit() {
        let client = HistoricalClient::new("f", "KEY", []).expect("lowercase unit");
        assert_eq!(client.unit(), DataUnit::Fahrenheit);

        let err = HistoricalClient::new(" f ", "KEY", []).unwrap_err();
        assert!(matches!(err, HistoryError::UnitUnavailable(_)));
    }

    #[test]
    fn transport_build_failure_is_a_configuration_error() {
        let err = HistoryError::TransportConfig(TransportError::Other("tls backend unavailable".into()));
        assert_eq!(err.to_string(), "Failed to configure the default HTTP transport");
        let source = std::error::Error::source(&err).expect("source is kept");
        assert_eq!(source.to_string(), "tls backend unavailable");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let short = "short body";
        assert_eq!(truncate_body(short), short);

        let long = "é".repeat(150);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 203);
    }

    // Requires network access and OWM_API_KEY.
    #[tokio::test]
    #[ignore]
    async fn live_history_by_name() {
        let key = std::env::var("OWM_API_KEY").expect("OWM_API_KEY must be set");
        let client = HistoricalClient::new("F", key, []).expect("client should build");

        let data = client.history_by_name("Vancouver").await.expect("query should succeed");
        assert!(!data.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn live_history_by_id_and_coord() {
        let key = std::env::var("OWM_API_KEY").expect("OWM_API_KEY must be set");
        let client = HistoricalClient::new("F", key, []).expect("client should build");

        client.history_by_id(5344157, &sample_params()).await.expect("query by id should succeed");

        let coords = Coordinates { longitude: -112.07, latitude: 33.45 };
        client.history_by_coord(&coords, &sample_params()).await.expect("query by coord should succeed");
    }
}
