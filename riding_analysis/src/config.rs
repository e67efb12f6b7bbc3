// ********* Input data structures ***********

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// The parties tracked at the riding level.
///
/// All the candidates that do not belong to one of the five main parties are
/// grouped under `Ind`. The `Merged` variant is the synthetic party created by
/// the counterfactual transforms, it carries its own code (for example `GDP`
/// for the NDP and the Greens pooled together).
///
/// Parties are ordered by their code. This order is also the tie-break order
/// when two parties have the same share in a riding.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Party {
    Bloc,
    Cpc,
    Gpc,
    Lpc,
    Ndp,
    Ind,
    Merged(String),
}

impl Party {
    /// The parties that get a share column in the aggregated ridings.
    pub const TRACKED: [Party; 6] = [
        Party::Bloc,
        Party::Cpc,
        Party::Gpc,
        Party::Lpc,
        Party::Ndp,
        Party::Ind,
    ];

    /// The parties considered when tabulating swings. Independents are not a
    /// party from one election to the next.
    pub const SWING_PARTIES: [Party; 5] = [
        Party::Bloc,
        Party::Cpc,
        Party::Gpc,
        Party::Lpc,
        Party::Ndp,
    ];

    pub fn code(&self) -> &str {
        match self {
            Party::Bloc => "BLOC",
            Party::Cpc => "CPC",
            Party::Gpc => "GPC",
            Party::Lpc => "LPC",
            Party::Ndp => "NDP",
            Party::Ind => "IND",
            Party::Merged(code) => code.as_str(),
        }
    }

    /// Reads a party code. The comparison ignores the case, so that `Bloc` and
    /// `BLOC` are the same party. Anything that is not a known code is an
    /// independent.
    pub fn from_code(code: &str) -> Party {
        match code.trim().to_uppercase().as_str() {
            "BLOC" => Party::Bloc,
            "CPC" => Party::Cpc,
            "GPC" => Party::Gpc,
            "LPC" => Party::Lpc,
            "NDP" => Party::Ndp,
            _ => Party::Ind,
        }
    }

    pub fn is_tracked(&self) -> bool {
        !self.is_merged()
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Party::Merged(_))
    }
}

impl Ord for Party {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.code(), self.is_merged()).cmp(&(other.code(), other.is_merged()))
    }
}

impl PartialOrd for Party {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The result of one candidate in one electoral district.
///
/// The vote share is a percentage (0 to 100) of the votes cast in the district.
#[derive(PartialEq, Debug, Clone)]
pub struct CandidateRecord {
    pub district_number: u32,
    pub district_name: String,
    pub candidate: Option<String>,
    pub party: Party,
    pub votes: Option<u64>,
    pub vote_share: f64,
    pub province: String,
}

// ******** Output data structures *********

/// One electoral district, summarized.
///
/// Every party of the party set has a share (0.0 if it did not run in the
/// district) and a margin, which is its share minus the share of the winner.
#[derive(PartialEq, Debug, Clone)]
pub struct RidingRecord {
    pub district_number: u32,
    pub district_name: String,
    pub province: String,
    pub shares: BTreeMap<Party, f64>,
    pub winner: Party,
    pub winner_share: f64,
    pub margins: BTreeMap<Party, f64>,
}

impl RidingRecord {
    pub fn share(&self, party: &Party) -> f64 {
        self.shares.get(party).copied().unwrap_or(0.0)
    }

    /// The margin of a party, if that party is part of the party set of this riding.
    pub fn margin(&self, party: &Party) -> Option<f64> {
        self.margins.get(party).copied()
    }

    pub fn parties(&self) -> impl Iterator<Item = &Party> {
        self.shares.keys()
    }
}

impl AsRef<RidingRecord> for RidingRecord {
    fn as_ref(&self) -> &RidingRecord {
        self
    }
}

/// A riding in which some parties have been pooled into a synthetic party.
#[derive(PartialEq, Debug, Clone)]
pub struct AlternateRidingRecord {
    /// The riding, over the new party set.
    pub riding: RidingRecord,
    pub merged_party: Party,
    pub merged_from: Vec<Party>,
    /// Set when the strong variant handed the riding to the merged party.
    pub reassigned: bool,
}

impl AsRef<RidingRecord> for AlternateRidingRecord {
    fn as_ref(&self) -> &RidingRecord {
        &self.riding
    }
}

/// The same district in two elections.
#[derive(PartialEq, Debug, Clone)]
pub struct JoinedRiding {
    pub district_number: u32,
    pub current: RidingRecord,
    /// Missing when the district did not exist in the previous election.
    pub previous: Option<RidingRecord>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SwingRecord {
    pub district_number: u32,
    pub district_name: String,
    pub province: String,
    pub party: Party,
    pub swing: f64,
}

/// All the swings of a district, one column per party.
#[derive(PartialEq, Debug, Clone)]
pub struct SwingRow {
    pub district_number: u32,
    pub district_name: String,
    pub swings: BTreeMap<Party, f64>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SeatCount {
    pub party: Party,
    pub seats: u32,
}

/// Ridings won with more than `min_share` of the votes.
#[derive(PartialEq, Debug, Clone)]
pub struct DominationSummary {
    pub min_share: f64,
    pub by_party: Vec<(Party, u32)>,
    pub by_province: Vec<(String, u32)>,
}

/// Errors that prevent an analysis from completing.
#[derive(PartialEq, Debug, Clone)]
pub enum AnalysisError {
    /// A candidate or a riding is missing a required field, or carries a value
    /// that cannot be used.
    MalformedInput {
        district: Option<u32>,
        reason: String,
    },
    /// The request to pool parties together does not make sense.
    InvalidMerge { reason: String },
    UnknownDistrict { district: u32 },
}

impl Error for AnalysisError {}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::MalformedInput {
                district: Some(d),
                reason,
            } => write!(f, "Malformed input in district {}: {}", d, reason),
            AnalysisError::MalformedInput {
                district: None,
                reason,
            } => write!(f, "Malformed input: {}", reason),
            AnalysisError::InvalidMerge { reason } => write!(f, "Invalid merge: {}", reason),
            AnalysisError::UnknownDistrict { district } => {
                write!(f, "Unknown district {}", district)
            }
        }
    }
}

// ********* Configuration **********

/// Losses closer than this many points count as near-misses.
pub const NEAR_MISS_MARGIN_FLOOR: f64 = -10.0;

/// How far behind the merged party may be for the strong variant to hand it the riding.
pub const DEFAULT_STRONG_THRESHOLD: f64 = 10.0;

/// A riding is dominated when the winner got more than this share.
pub const DOMINATION_SHARE: f64 = 60.0;

/// What to do with the districts that only exist in the current election.
///
/// - KeepUnmatched keeps them, without a previous riding. They do not produce swings.
///
/// - RejectUnmatched fails the join.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum JoinPolicy {
    KeepUnmatched,
    RejectUnmatched,
}

impl Default for JoinPolicy {
    fn default() -> Self {
        JoinPolicy::KeepUnmatched
    }
}
