//! Federation Data Source Abstraction
//!
//! Contract for the remote federation API the sync engine pulls from, plus the
//! record shapes it hands back. Records mirror the wire payloads closely:
//! nearly every field is optional because the source omits fields freely, and
//! scalar fields tolerate both numbers and numeric strings.
//!
//! Validation (required keys, date parsing) is the reconciler's job, not the
//! source's.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Competition type code for leagues (championnat)
pub const COMPETITION_TYPE_LEAGUE: &str = "CH";

/// Competition type code for cups (coupe)
pub const COMPETITION_TYPE_CUP: &str = "CP";

/// Remote federation data source
///
/// Implementations fetch one club's data for the current season. Any
/// unreachable endpoint or unreadable top-level payload is reported as an
/// error; the caller treats that as fatal for the run. A single unreadable
/// item inside a collection is dropped and reported through
/// [`FederationSource::drain_warnings`].
#[async_trait]
pub trait FederationSource: Send + Sync {
    /// Club identity with nested venues and members
    async fn fetch_club(&self) -> Result<ClubRecord>;

    /// Team roster with nested engagements
    async fn fetch_teams(&self) -> Result<Vec<TeamRecord>>;

    /// Every match of every engagement of the club, played or not
    ///
    /// Each match carries its competition (attached from the engagement
    /// when the payload omits it). The competition type is always the
    /// engagement's, defaulting to a league.
    async fn fetch_matches(&self) -> Result<Vec<MatchRecord>>;

    /// Standings rows of every league engagement, competition attached
    async fn fetch_standings(&self) -> Result<Vec<StandingRecord>>;

    /// Non-fatal problems noticed since the last call (unreadable items
    /// dropped from a collection, fan-out truncated), oldest first
    fn drain_warnings(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Club payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClubRecord {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub cl_no: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub affiliation_number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub colors: Option<String>,
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub address3: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub distributor_office: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub district: Option<GoverningBodyRef>,
    #[serde(default, rename = "terrains")]
    pub venues: Vec<VenueRecord>,
    #[serde(default, rename = "membres")]
    pub members: Vec<MemberRecord>,
}

/// District / governing body reference (`cdg`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoverningBodyRef {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub cg_no: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Venue (terrain) payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VenueRecord {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub te_no: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub longitude: Option<f64>,
    #[serde(default, rename = "libelle_surface")]
    pub surface_type: Option<String>,
}

/// Club staff member payload (no stable identifier)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberRecord {
    #[serde(default, rename = "in_nom")]
    pub last_name: Option<String>,
    #[serde(default, rename = "in_prenom")]
    pub first_name: Option<String>,
    #[serde(default, rename = "ti_lib")]
    pub role: Option<String>,
}

/// Team (equipe) payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamRecord {
    #[serde(default)]
    pub category_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub number: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub code: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default, rename = "type")]
    pub competition_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub season: Option<i64>,
    #[serde(default)]
    pub category_label: Option<String>,
    #[serde(default)]
    pub category_gender: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub diffusable: bool,
    #[serde(default)]
    pub engagements: Vec<EngagementRecord>,
}

/// A team's participation in one competition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngagementRecord {
    #[serde(default)]
    pub competition: Option<CompetitionRecord>,
    #[serde(default)]
    pub terrain: Option<VenueReference>,
    #[serde(default, rename = "en_statut")]
    pub status: Option<String>,
    #[serde(default, rename = "en_forf_gene")]
    pub general_forfeit: Option<String>,
    #[serde(default, rename = "en_tour_no", deserialize_with = "lenient::opt_i64")]
    pub round_number: Option<i64>,
    #[serde(default, rename = "en_elimine")]
    pub eliminated: Option<String>,
    #[serde(default)]
    pub phase: Option<PhaseRef>,
    #[serde(default)]
    pub poule: Option<PoolRef>,
}

impl EngagementRecord {
    /// Phase number used to address the pool endpoints (defaults to 1)
    pub fn phase_number(&self) -> i64 {
        self.phase.as_ref().and_then(|p| p.number).unwrap_or(1)
    }

    /// Pool stage number used to address the pool endpoints (defaults to 1)
    pub fn pool_number(&self) -> i64 {
        self.poule.as_ref().and_then(|p| p.stage_number).unwrap_or(1)
    }
}

/// Competition payload as embedded in engagements, matches and standings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitionRecord {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub cp_no: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub season: Option<i64>,
    #[serde(default, rename = "type")]
    pub competition_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub level: Option<String>,
    #[serde(default)]
    pub cdg: Option<GoverningBodyRef>,
    #[serde(default)]
    pub external_updated_at: Option<String>,
}

impl CompetitionRecord {
    /// Cups are `CP`; everything else is handled as a league
    pub fn is_cup(&self) -> bool {
        self.competition_type.as_deref() == Some(COMPETITION_TYPE_CUP)
    }

    /// Missing type counts as a league
    pub fn is_league(&self) -> bool {
        matches!(
            self.competition_type.as_deref(),
            None | Some(COMPETITION_TYPE_LEAGUE)
        )
    }
}

/// Competition phase descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseRef {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub number: Option<i64>,
    #[serde(default, rename = "type")]
    pub phase_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Pool (poule) descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolRef {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub stage_number: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cdg: Option<GoverningBodyRef>,
}

/// Matchday (poule_journee) descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchdayRef {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub number: Option<i64>,
}

/// Venue reference as it appears on engagements and matches
///
/// The source sends either the bare venue number, an IRI such as
/// `/api/terrains/42`, or an embedded venue object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VenueReference {
    Number(i64),
    Text(String),
    Embedded {
        #[serde(default, deserialize_with = "lenient::opt_i64")]
        te_no: Option<i64>,
    },
}

/// Club identity inside a match side or standings team
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClubRef {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub cl_no: Option<i64>,
    #[serde(default)]
    pub logo: Option<String>,
}

/// One side (home or away) of a match
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchSide {
    #[serde(default)]
    pub club: Option<ClubRef>,
    #[serde(default)]
    pub category_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub number: Option<i64>,
    #[serde(default)]
    pub short_name: Option<String>,
}

impl MatchSide {
    pub fn club_number(&self) -> Option<i64> {
        self.club.as_ref().and_then(|c| c.cl_no)
    }

    pub fn logo(&self) -> Option<&str> {
        self.club.as_ref().and_then(|c| c.logo.as_deref())
    }
}

/// Match payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub ma_no: Option<i64>,
    #[serde(default)]
    pub competition: Option<CompetitionRecord>,
    #[serde(default)]
    pub terrain: Option<VenueReference>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub season: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub initial_date: Option<String>,
    #[serde(default)]
    pub phase: Option<PhaseRef>,
    #[serde(default)]
    pub poule: Option<PoolRef>,
    #[serde(default)]
    pub poule_journee: Option<MatchdayRef>,
    #[serde(default)]
    pub home: Option<MatchSide>,
    #[serde(default)]
    pub away: Option<MatchSide>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub home_score: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub away_score: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub home_is_forfeit: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub away_is_forfeit: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(default)]
    pub status_label: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub is_overtime: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub seems_postponed: Option<String>,
    #[serde(default)]
    pub external_updated_at: Option<String>,
}

impl MatchRecord {
    /// A match with a home score is a completed result
    pub fn is_result(&self) -> bool {
        self.home_score.is_some()
    }

    pub fn competition_number(&self) -> Option<i64> {
        self.competition.as_ref().and_then(|c| c.cp_no)
    }
}

/// Team identity inside a standings row (`equipe`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandingTeam {
    #[serde(default)]
    pub club: Option<ClubRef>,
    #[serde(default)]
    pub category_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub number: Option<i64>,
    #[serde(default)]
    pub short_name: Option<String>,
}

/// Standings row (classement journee)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandingRecord {
    #[serde(default)]
    pub competition: Option<CompetitionRecord>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub season: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub cj_no: Option<i64>,
    #[serde(default, rename = "type")]
    pub ranking_type: Option<String>,
    #[serde(default, rename = "equipe")]
    pub team: Option<StandingTeam>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub rank: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub point_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub penalty_point_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub total_games_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub won_games_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub draw_games_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub lost_games_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub forfeits_games_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub goals_for_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub goals_against_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub goals_diff: Option<i64>,
    #[serde(default)]
    pub poule: Option<PoolRef>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_forfait: bool,
    #[serde(default)]
    pub external_updated_at: Option<String>,
}

impl StandingRecord {
    pub fn club_number(&self) -> Option<i64> {
        self.team
            .as_ref()
            .and_then(|t| t.club.as_ref())
            .and_then(|c| c.cl_no)
    }
}

/// Deserializers tolerant of the source's loose scalar typing
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.and_then(|v| match v {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }))
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }))
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(if b { "1" } else { "0" }.to_string()),
            _ => None,
        }))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Bool(b)) => b,
            Some(Value::Number(n)) => n.as_i64().map(|i| i != 0).unwrap_or(false),
            Some(Value::String(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "o" | "y" | "yes"
            ),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_club_with_nested_collections() {
        let json = r#"{
            "cl_no": 5403,
            "affiliation_number": 500650,
            "name": "ENTENTE SPORTIVE DU VAL",
            "short_name": "ES VAL",
            "latitude": "48.8566",
            "longitude": 2.3522,
            "logo": "https://cdn.example/5403.png",
            "district": {"name": "District Nord", "cg_no": 19},
            "terrains": [
                {"te_no": 42, "name": "Stade Municipal", "libelle_surface": "Gazon naturel"}
            ],
            "membres": [
                {"in_nom": "DUPONT", "in_prenom": "Marie", "ti_lib": "Présidente"}
            ]
        }"#;

        let club: ClubRecord = serde_json::from_str(json).unwrap();

        assert_eq!(club.cl_no, Some(5403));
        assert_eq!(club.affiliation_number.as_deref(), Some("500650"));
        assert_eq!(club.latitude, Some(48.8566));
        assert_eq!(club.district.as_ref().and_then(|d| d.cg_no), Some(19));
        assert_eq!(club.venues.len(), 1);
        assert_eq!(club.venues[0].surface_type.as_deref(), Some("Gazon naturel"));
        assert_eq!(club.members[0].role.as_deref(), Some("Présidente"));
    }

    #[test]
    fn test_venue_reference_shapes() {
        let number: VenueReference = serde_json::from_str("42").unwrap();
        let text: VenueReference = serde_json::from_str(r#""/api/terrains/42""#).unwrap();
        let embedded: VenueReference = serde_json::from_str(r#"{"te_no": "42", "name": "x"}"#).unwrap();

        assert_eq!(number, VenueReference::Number(42));
        assert_eq!(text, VenueReference::Text("/api/terrains/42".to_string()));
        assert_eq!(embedded, VenueReference::Embedded { te_no: Some(42) });
    }

    #[test]
    fn test_deserialize_match_with_null_scores() {
        let json = r#"{
            "ma_no": 9911,
            "season": 2025,
            "date": "2025-09-14T00:00:00+00:00",
            "status": "A",
            "home_score": null,
            "terrain": null,
            "competition": {"cp_no": 778899, "type": "CH", "name": "Régional 1"},
            "home": {"club": {"cl_no": 5403}, "short_name": "ES VAL"},
            "away": {"club": {"cl_no": 9001, "logo": "l.png"}, "short_name": "AS NORD"}
        }"#;

        let record: MatchRecord = serde_json::from_str(json).unwrap();

        assert!(!record.is_result());
        assert!(record.terrain.is_none());
        assert_eq!(record.competition_number(), Some(778899));
        assert_eq!(record.away.as_ref().and_then(|s| s.club_number()), Some(9001));
        assert_eq!(record.away.as_ref().and_then(|s| s.logo()), Some("l.png"));
    }

    #[test]
    fn test_competition_kind_defaults_to_league() {
        let untyped = CompetitionRecord::default();
        assert!(untyped.is_league());
        assert!(!untyped.is_cup());

        let cup = CompetitionRecord {
            competition_type: Some("CP".to_string()),
            ..Default::default()
        };
        assert!(cup.is_cup());
        assert!(!cup.is_league());
    }

    #[test]
    fn test_flags_accept_loose_values() {
        let team: TeamRecord =
            serde_json::from_str(r#"{"category_code": "SEM", "number": "1", "diffusable": 1}"#)
                .unwrap();
        assert!(team.diffusable);
        assert_eq!(team.number, Some(1));

        let standing: StandingRecord =
            serde_json::from_str(r#"{"cj_no": 3, "is_forfait": "false"}"#).unwrap();
        assert!(!standing.is_forfait);
    }

    #[test]
    fn test_engagement_pool_addressing_defaults() {
        let engagement = EngagementRecord::default();
        assert_eq!(engagement.phase_number(), 1);
        assert_eq!(engagement.pool_number(), 1);
    }
}
