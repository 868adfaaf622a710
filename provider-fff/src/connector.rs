//! FFF API connector implementation
//!
//! Implements the `FederationSource` trait over an injected `HttpClient`.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::federation::{
    ClubRecord, CompetitionRecord, EngagementRecord, FederationSource, MatchRecord,
    StandingRecord, TeamRecord, COMPETITION_TYPE_LEAGUE,
};
use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::FffError;
use crate::types::{resolve_link, CollectionPage};

/// Public FFF data API base URL
pub const DEFAULT_BASE_URL: &str = "https://api-dofa.fff.fr/api";

/// Engagements visited when fanning out to pool endpoints
const DEFAULT_MAX_ENGAGEMENTS: usize = 50;

/// Connector settings
#[derive(Debug, Clone)]
pub struct FffSettings {
    /// API root, without trailing slash
    pub base_url: String,
    /// Federation number of the tracked club
    pub club_number: i64,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry policy for transient failures
    pub retry: RetryPolicy,
    /// Pages followed per collection
    pub max_pages: u32,
    /// Engagements visited for match and standings fan-out
    pub max_engagements: usize,
}

impl FffSettings {
    pub fn new(base_url: impl Into<String>, club_number: i64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            club_number,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            max_pages: 20,
            max_engagements: DEFAULT_MAX_ENGAGEMENTS,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn with_max_engagements(mut self, max_engagements: usize) -> Self {
        self.max_engagements = max_engagements;
        self
    }
}

/// Pool address used by the per-pool match and standings endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PoolKey {
    competition: i64,
    phase: i64,
    pool: i64,
}

impl PoolKey {
    fn path(&self) -> String {
        format!(
            "/compets/{}/phases/{}/poules/{}",
            self.competition, self.phase, self.pool
        )
    }
}

/// FFF API connector
///
/// # Example
///
/// ```ignore
/// use provider_fff::{FffConnector, FffSettings};
/// use bridge_traits::FederationSource;
///
/// let connector = FffConnector::new(http_client, FffSettings::new(DEFAULT_BASE_URL, 5403));
/// let club = connector.fetch_club().await?;
/// ```
pub struct FffConnector {
    http_client: Arc<dyn HttpClient>,
    settings: FffSettings,
    warnings: Mutex<Vec<String>>,
}

impl FffConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, settings: FffSettings) -> Self {
        Self {
            http_client,
            settings,
            warnings: Mutex::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> &FffSettings {
        &self.settings
    }

    /// Queue a warning for the next `drain_warnings`; repeats are folded
    fn note(&self, warning: String) {
        let mut warnings = self
            .warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !warnings.contains(&warning) {
            warnings.push(warning);
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url, path)
    }

    /// GET a URL and decode the body as JSON
    #[instrument(skip(self))]
    async fn get_json(&self, url: &str) -> std::result::Result<Value, FffError> {
        let request = HttpRequest::get(url)
            .accept_json()
            .header("Accept-Language", "fr-FR,fr;q=0.9")
            .timeout(self.settings.timeout);

        let response = self
            .http_client
            .execute_with_retry(request, self.settings.retry.clone())
            .await?;

        if !response.is_success() {
            warn!(status = response.status, url, "FFF API request failed");
            return Err(FffError::ApiError {
                status_code: response.status,
                url: url.to_string(),
                message: String::from_utf8_lossy(&response.body)
                    .chars()
                    .take(200)
                    .collect(),
            });
        }

        debug!(status = response.status, bytes = response.body.len(), "FFF API request succeeded");

        serde_json::from_slice(&response.body)
            .map_err(|e| FffError::ParseError(format!("{}: {}", url, e)))
    }

    /// Fetch a single object
    async fn fetch_object<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, FffError> {
        let url = self.url(path);
        let value = self.get_json(&url).await?;

        serde_json::from_value(value).map_err(|e| FffError::ParseError(format!("{}: {}", url, e)))
    }

    /// Fetch every page of a collection, up to the configured page cap
    async fn fetch_collection<T: DeserializeOwned>(
        &self,
        path: &str,
        item_key: &str,
    ) -> std::result::Result<Vec<T>, FffError> {
        let mut url = self.url(path);
        let mut items = Vec::new();
        let mut pages = 0;

        loop {
            let value = self.get_json(&url).await?;
            let page = CollectionPage::from_value(value, item_key, &url)?;
            let next = page.next.clone();
            let decoded = page.decode::<T>();
            for reason in decoded.rejected {
                warn!(path, reason = %reason, "Unreadable collection item skipped");
                self.note(format!("{}: skipped unreadable {}", path, reason));
            }
            items.extend(decoded.items);
            pages += 1;

            match next {
                Some(link) if pages < self.settings.max_pages => {
                    url = resolve_link(&self.settings.base_url, &link);
                }
                Some(link) => {
                    warn!(
                        path,
                        pages,
                        next = %link,
                        "Page cap reached; remaining pages not fetched"
                    );
                    break;
                }
                None => break,
            }
        }

        Ok(items)
    }

    /// Engagements of the tracked club that can address pool endpoints
    ///
    /// Engagements without a competition number are dropped; the list is
    /// capped at `max_engagements`.
    async fn fetch_engagements(&self) -> std::result::Result<Vec<EngagementRecord>, FffError> {
        let path = format!("/engagements?club.cl_no={}", self.settings.club_number);
        let engagements: Vec<EngagementRecord> = self.fetch_collection(&path, "competition").await?;
        let total = engagements.len();

        let mut usable: Vec<EngagementRecord> = engagements
            .into_iter()
            .filter(|e| e.competition.as_ref().and_then(|c| c.cp_no).is_some())
            .collect();

        if usable.len() < total {
            debug!(
                dropped = total - usable.len(),
                "Engagements without competition number ignored"
            );
        }

        if usable.len() > self.settings.max_engagements {
            let dropped = usable.len() - self.settings.max_engagements;
            warn!(
                total = usable.len(),
                limit = self.settings.max_engagements,
                "Engagement fan-out capped"
            );
            self.note(format!(
                "engagements: {} over the fan-out limit of {} not fetched",
                dropped, self.settings.max_engagements
            ));
            usable.truncate(self.settings.max_engagements);
        }

        Ok(usable)
    }

    /// Competition to attach to a match reached through `engagement`
    ///
    /// The match's own embedded competition is kept when present, but the
    /// cup/league type always comes from the engagement (league when the
    /// engagement does not say).
    fn match_competition(
        engagement: &EngagementRecord,
        embedded: Option<CompetitionRecord>,
    ) -> Option<CompetitionRecord> {
        let competition_type = engagement
            .competition
            .as_ref()
            .and_then(|c| c.competition_type.clone())
            .unwrap_or_else(|| COMPETITION_TYPE_LEAGUE.to_string());

        let mut competition = embedded.or_else(|| engagement.competition.clone())?;
        competition.competition_type = Some(competition_type);
        Some(competition)
    }

    fn pool_key(engagement: &EngagementRecord) -> Option<PoolKey> {
        let competition = engagement.competition.as_ref()?.cp_no?;
        Some(PoolKey {
            competition,
            phase: engagement.phase_number(),
            pool: engagement.pool_number(),
        })
    }
}

#[async_trait]
impl FederationSource for FffConnector {
    #[instrument(skip(self), fields(club = self.settings.club_number))]
    async fn fetch_club(&self) -> Result<ClubRecord> {
        let path = format!("/clubs/{}", self.settings.club_number);
        let club: ClubRecord = self.fetch_object(&path).await?;

        info!(
            venues = club.venues.len(),
            members = club.members.len(),
            "Fetched club"
        );
        Ok(club)
    }

    #[instrument(skip(self), fields(club = self.settings.club_number))]
    async fn fetch_teams(&self) -> Result<Vec<TeamRecord>> {
        let path = format!("/clubs/{}/equipes", self.settings.club_number);
        let teams: Vec<TeamRecord> = self.fetch_collection(&path, "category_code").await?;

        info!(teams = teams.len(), "Fetched teams");
        Ok(teams)
    }

    #[instrument(skip(self), fields(club = self.settings.club_number))]
    async fn fetch_matches(&self) -> Result<Vec<MatchRecord>> {
        let engagements = self.fetch_engagements().await?;
        let mut seen = HashSet::new();
        let mut all = Vec::new();

        for engagement in &engagements {
            let Some(key) = Self::pool_key(engagement) else {
                continue;
            };
            if !seen.insert(key) {
                continue;
            }

            let path = format!("{}/matchs?clNo={}", key.path(), self.settings.club_number);
            let matches: Vec<MatchRecord> = self.fetch_collection(&path, "ma_no").await?;
            debug!(competition = key.competition, matches = matches.len(), "Fetched pool matches");

            all.extend(matches.into_iter().map(|mut m| {
                m.competition = Self::match_competition(engagement, m.competition.take());
                m
            }));
        }

        info!(
            engagements = engagements.len(),
            pools = seen.len(),
            matches = all.len(),
            "Fetched matches"
        );
        Ok(all)
    }

    #[instrument(skip(self), fields(club = self.settings.club_number))]
    async fn fetch_standings(&self) -> Result<Vec<StandingRecord>> {
        let engagements = self.fetch_engagements().await?;
        let mut seen = HashSet::new();
        let mut all = Vec::new();

        for engagement in &engagements {
            let is_league = engagement
                .competition
                .as_ref()
                .map(|c| c.is_league())
                .unwrap_or(false);
            if !is_league {
                continue;
            }
            let Some(key) = Self::pool_key(engagement) else {
                continue;
            };
            if !seen.insert(key) {
                continue;
            }

            let path = format!("{}/classement_journees", key.path());
            let rows: Vec<StandingRecord> = self.fetch_collection(&path, "cj_no").await?;

            all.extend(rows.into_iter().map(|mut row| {
                row.competition = engagement.competition.clone();
                row
            }));
        }

        info!(pools = seen.len(), standings = all.len(), "Fetched standings");
        Ok(all)
    }

    fn drain_warnings(&self) -> Vec<String> {
        std::mem::take(
            &mut *self
                .warnings
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::http::HttpResponse;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
            async fn execute_with_retry(&self, request: HttpRequest, policy: RetryPolicy) -> Result<HttpResponse>;
        }
    }

    fn ok(body: &str) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        })
    }

    fn settings() -> FffSettings {
        FffSettings::new("https://api.test/api/", 5403)
    }

    const ENGAGEMENTS: &str = r#"{
        "hydra:member": [
            {"competition": {"cp_no": 400, "type": "CH", "name": "Régional 1"}, "phase": {"number": 1}, "poule": {"stage_number": 2}},
            {"competition": {"cp_no": 900, "type": "CP", "name": "Coupe de France"}},
            {"competition": {"cp_no": 400, "type": "CH", "name": "Régional 1"}, "phase": {"number": 1}, "poule": {"stage_number": 2}},
            {"competition": {"name": "Sans numéro"}}
        ]
    }"#;

    #[tokio::test]
    async fn test_fetch_club() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .times(1)
            .returning(|req, _| {
                assert_eq!(req.url, "https://api.test/api/clubs/5403");
                assert_eq!(req.headers.get("Accept").map(String::as_str), Some("application/json"));
                ok(r#"{"cl_no": 5403, "name": "ES Val", "terrains": [{"te_no": 11, "name": "Stade"}], "membres": []}"#)
            });

        let connector = FffConnector::new(Arc::new(mock_http), settings());
        let club = connector.fetch_club().await.unwrap();

        assert_eq!(club.cl_no, Some(5403));
        assert_eq!(club.venues.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_teams_follows_pages() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .times(2)
            .returning(|req, _| {
                if req.url.ends_with("page=2") {
                    assert_eq!(req.url, "https://api.test/api/clubs/5403/equipes?page=2");
                    ok(r#"{"hydra:member": [{"category_code": "U13", "number": 1}]}"#)
                } else {
                    ok(r#"{
                        "hydra:member": [{"category_code": "SEM", "number": 1}],
                        "hydra:view": {"hydra:next": "/api/clubs/5403/equipes?page=2"}
                    }"#)
                }
            });

        let connector = FffConnector::new(Arc::new(mock_http), settings());
        let teams = connector.fetch_teams().await.unwrap();

        assert_eq!(teams.len(), 2);
        assert_eq!(teams[1].category_code.as_deref(), Some("U13"));
    }

    #[tokio::test]
    async fn test_page_cap_stops_following() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .times(1)
            .returning(|_, _| {
                ok(r#"{
                    "hydra:member": [{"category_code": "SEM", "number": 1}],
                    "hydra:view": {"hydra:next": "/api/clubs/5403/equipes?page=2"}
                }"#)
            });

        let connector = FffConnector::new(Arc::new(mock_http), settings().with_max_pages(1));
        assert_eq!(connector.fetch_teams().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_matches_fans_out_and_attaches_competition() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .times(3)
            .returning(|req, _| {
                if req.url.contains("/engagements?club.cl_no=5403") {
                    ok(ENGAGEMENTS)
                } else if req.url.contains("/compets/400/phases/1/poules/2/matchs?clNo=5403") {
                    ok(r#"[{"ma_no": 1, "home_score": 2}, {"ma_no": 2, "competition": {"cp_no": 400, "type": "CH", "name": "R1"}}]"#)
                } else if req.url.contains("/compets/900/phases/1/poules/1/matchs?clNo=5403") {
                    ok(r#"{"0": {"ma_no": 3, "home_score": 1}}"#)
                } else {
                    panic!("unexpected url {}", req.url);
                }
            });

        let connector = FffConnector::new(Arc::new(mock_http), settings());
        let matches = connector.fetch_matches().await.unwrap();

        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].competition_number(), Some(400));
        assert_eq!(
            matches[0].competition.as_ref().and_then(|c| c.name.as_deref()),
            Some("Régional 1")
        );
        assert_eq!(
            matches[1].competition.as_ref().and_then(|c| c.name.as_deref()),
            Some("R1")
        );
        assert!(matches[2].competition.as_ref().unwrap().is_cup());
    }

    #[tokio::test]
    async fn test_fetch_standings_only_for_leagues() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .times(2)
            .returning(|req, _| {
                if req.url.contains("/engagements") {
                    ok(ENGAGEMENTS)
                } else {
                    assert!(req.url.ends_with("/compets/400/phases/1/poules/2/classement_journees"));
                    ok(r#"{"hydra:member": [{"cj_no": 5, "type": "G", "equipe": {"club": {"cl_no": 5403}}, "rank": 1}]}"#)
                }
            });

        let connector = FffConnector::new(Arc::new(mock_http), settings());
        let standings = connector.fetch_standings().await.unwrap();

        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].club_number(), Some(5403));
        assert_eq!(
            standings[0].competition.as_ref().and_then(|c| c.cp_no),
            Some(400)
        );
    }

    #[tokio::test]
    async fn test_engagement_cap() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .times(2)
            .returning(|req, _| {
                if req.url.contains("/engagements") {
                    ok(ENGAGEMENTS)
                } else {
                    assert!(req.url.contains("/compets/400/"));
                    ok("[]")
                }
            });

        let connector = FffConnector::new(Arc::new(mock_http), settings().with_max_engagements(1));
        assert!(connector.fetch_matches().await.unwrap().is_empty());

        let warnings = connector.drain_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("2 over the fan-out limit of 1"));
        assert!(connector.drain_warnings().is_empty());
    }

    #[tokio::test]
    async fn test_cup_type_comes_from_engagement() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .times(2)
            .returning(|req, _| {
                if req.url.contains("/engagements") {
                    ok(r#"[{"competition": {"cp_no": 900, "type": "CP", "name": "Coupe de France"}}]"#)
                } else {
                    ok(r#"[
                        {"ma_no": 1, "home_score": 1, "competition": {"cp_no": 900, "name": "Coupe"}},
                        {"ma_no": 2, "home_score": 3, "competition": {"cp_no": 900, "name": "Coupe"}}
                    ]"#)
                }
            });

        let connector = FffConnector::new(Arc::new(mock_http), settings());
        let matches = connector.fetch_matches().await.unwrap();

        assert_eq!(matches.len(), 2);
        for m in &matches {
            let competition = m.competition.as_ref().unwrap();
            assert!(competition.is_cup());
            assert_eq!(competition.name.as_deref(), Some("Coupe"));
        }
    }

    #[tokio::test]
    async fn test_untyped_engagement_defaults_matches_to_league() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .times(2)
            .returning(|req, _| {
                if req.url.contains("/engagements") {
                    ok(r#"[{"competition": {"cp_no": 401}}]"#)
                } else {
                    ok(r#"[{"ma_no": 1, "competition": {"cp_no": 401, "type": "CP"}}]"#)
                }
            });

        let connector = FffConnector::new(Arc::new(mock_http), settings());
        let matches = connector.fetch_matches().await.unwrap();

        assert_eq!(
            matches[0].competition.as_ref().unwrap().competition_type.as_deref(),
            Some("CH")
        );
    }

    #[tokio::test]
    async fn test_unreadable_match_is_skipped_with_warning() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .times(2)
            .returning(|req, _| {
                if req.url.contains("/engagements") {
                    ok(r#"[{"competition": {"cp_no": 400, "type": "CH"}}]"#)
                } else {
                    ok(r#"[{"ma_no": 1, "home_score": 2}, {"ma_no": 2, "home": "/api/equipes/77"}]"#)
                }
            });

        let connector = FffConnector::new(Arc::new(mock_http), settings());
        let matches = connector.fetch_matches().await.unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].ma_no, Some(1));

        let warnings = connector.drain_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("/compets/400/phases/1/poules/1/matchs"));
        assert!(warnings[0].contains("item 1"));
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .times(1)
            .returning(|_, _| {
                Ok(HttpResponse {
                    status: 404,
                    headers: HashMap::new(),
                    body: Bytes::from_static(b"{\"detail\":\"Not Found\"}"),
                })
            });

        let connector = FffConnector::new(Arc::new(mock_http), settings());
        let result = connector.fetch_club().await;

        assert!(matches!(
            result,
            Err(bridge_traits::error::BridgeError::SourceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed_payload() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .times(1)
            .returning(|_, _| ok("<html>maintenance</html>"));

        let connector = FffConnector::new(Arc::new(mock_http), settings());
        let result = connector.fetch_teams().await;

        assert!(matches!(
            result,
            Err(bridge_traits::error::BridgeError::MalformedPayload(_))
        ));
    }
}
