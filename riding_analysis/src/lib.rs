/*!

Riding-level analysis of Canadian federal elections.

The elections results are published per candidate. This crate turns a table of
candidates into one [`RidingRecord`] per electoral district (riding), with the
share of every tracked party, the winner and the margin of each party against
the winner. From there:

- [`merge_parties`] and [`merge_parties_strong`] replay the elections after
pooling several parties into a synthetic one (the "unified left" scenario),
- [`join_by_district`] and [`compute_swings`] compare two elections,
- [`near_misses`] lists the ridings that a party lost by a small margin,
- [`seat_counts`] and [`domination_summary`] summarize the resulting house.

```
use riding_analysis::builder::Builder;
use riding_analysis::*;

let mut builder = Builder::new().district_in(35001, "Ajax", "Ontario")?;
builder.add_result(35001, Party::Lpc, 45.0)?;
builder.add_result(35001, Party::Cpc, 40.0)?;
builder.add_result(35001, Party::Ndp, 10.0)?;
builder.add_result(35001, Party::Gpc, 5.0)?;

let ridings = aggregate(builder.candidates())?;
assert_eq!(ridings[0].winner, Party::Lpc);

let unified = merge_parties(&ridings, &[Party::Ndp, Party::Gpc], "GDP")?;
assert_eq!(unified[0].riding.share(&Party::Merged("GDP".to_string())), 15.0);
# Ok::<(), AnalysisError>(())
```

All the operations are pure: they borrow their inputs and build new
collections. The loading of the raw data is not part of this crate.
*/

pub mod builder;
mod config;
pub mod manual;

use log::{debug, info, warn};

use std::collections::{BTreeMap, HashMap, HashSet};

pub use crate::config::*;

type AResult<T> = Result<T, AnalysisError>;

// **** Riding aggregation ****

/// Reduces a table of candidates to one riding per district.
///
/// The candidates do not need to be sorted or grouped. The output is sorted by
/// district number.
///
/// The share of a party in a district is the best share among the candidates
/// of that party, so that duplicated rows do not add up. The name and the
/// province of a district are taken from its first candidate.
pub fn aggregate(candidates: &[CandidateRecord]) -> Result<Vec<RidingRecord>, AnalysisError> {
    info!(
        "aggregate: processing {:?} candidate records",
        candidates.len()
    );
    let mut districts: BTreeMap<u32, Vec<&CandidateRecord>> = BTreeMap::new();
    for c in candidates.iter() {
        check_candidate(c)?;
        districts.entry(c.district_number).or_default().push(c);
    }

    let mut res: Vec<RidingRecord> = Vec::with_capacity(districts.len());
    for (district_number, local_results) in districts.iter() {
        let first = local_results
            .first()
            .ok_or_else(|| AnalysisError::MalformedInput {
                district: Some(*district_number),
                reason: "no candidate".to_string(),
            })?;

        let mut shares: BTreeMap<Party, f64> = BTreeMap::new();
        for party in Party::TRACKED.iter() {
            let share = local_results
                .iter()
                .filter(|c| c.party == *party)
                .map(|c| c.vote_share)
                .fold(0.0_f64, f64::max);
            shares.insert(party.clone(), share);
        }

        let riding = build_riding(
            *district_number,
            &first.district_name,
            &first.province,
            shares,
        )?;
        debug!(
            "aggregate: district {} ({}): {} -> {} with {}",
            riding.district_number,
            riding.district_name,
            local_results.len(),
            riding.winner,
            riding.winner_share
        );
        res.push(riding);
    }
    info!("aggregate: {:?} ridings", res.len());
    Ok(res)
}

fn check_candidate(c: &CandidateRecord) -> AResult<()> {
    let malformed = |reason: String| AnalysisError::MalformedInput {
        district: Some(c.district_number),
        reason,
    };
    if c.district_name.trim().is_empty() {
        return Err(malformed("missing district name".to_string()));
    }
    if c.province.trim().is_empty() {
        return Err(malformed("missing province".to_string()));
    }
    if c.party.is_merged() {
        return Err(malformed(format!(
            "candidate {:?} belongs to the synthetic party {}",
            c.candidate, c.party
        )));
    }
    if !c.vote_share.is_finite() || c.vote_share < 0.0 || c.vote_share > 100.0 {
        return Err(malformed(format!(
            "vote share {} of candidate {:?} is not a percentage",
            c.vote_share, c.candidate
        )));
    }
    Ok(())
}

/// The winner of a riding is the party with the largest share. On ties, the
/// party that comes first in code order wins.
fn pick_winner(shares: &BTreeMap<Party, f64>) -> Option<(&Party, f64)> {
    let mut best: Option<(&Party, f64)> = None;
    for (party, share) in shares.iter() {
        match best {
            Some((_, best_share)) if *share <= best_share => {}
            _ => best = Some((party, *share)),
        }
    }
    best
}

fn margins_against(shares: &BTreeMap<Party, f64>, winner_share: f64) -> BTreeMap<Party, f64> {
    shares
        .iter()
        .map(|(party, share)| (party.clone(), share - winner_share))
        .collect()
}

fn build_riding(
    district_number: u32,
    district_name: &str,
    province: &str,
    shares: BTreeMap<Party, f64>,
) -> AResult<RidingRecord> {
    let (winner, winner_share) = match pick_winner(&shares) {
        Some((p, s)) => (p.clone(), s),
        None => {
            return Err(AnalysisError::MalformedInput {
                district: Some(district_number),
                reason: "no party to elect".to_string(),
            })
        }
    };
    let margins = margins_against(&shares, winner_share);
    Ok(RidingRecord {
        district_number,
        district_name: district_name.to_string(),
        province: province.to_string(),
        shares,
        winner,
        winner_share,
        margins,
    })
}

// **** Counterfactual transforms ****

/// Pools the shares of the `sources` parties into a new party called `target`
/// and elects again every riding.
///
/// The source parties disappear from the ridings. The winners and the margins
/// are computed from scratch with the same rule as [`aggregate`], so a riding
/// only changes hands when the pooled share is larger than every other share.
///
/// Arguments:
/// * `ridings` the ridings to transform, they are not modified
/// * `sources` at least two distinct tracked parties
/// * `target` the code of the synthetic party. It may not be the code of a tracked party.
pub fn merge_parties(
    ridings: &[RidingRecord],
    sources: &[Party],
    target: &str,
) -> Result<Vec<AlternateRidingRecord>, AnalysisError> {
    let merged = check_merge(sources, target)?;
    info!(
        "merge_parties: pooling {:?} into {} over {:?} ridings",
        sources,
        merged,
        ridings.len()
    );
    ridings
        .iter()
        .map(|r| merge_riding(r, sources, &merged))
        .collect()
}

/// Like [`merge_parties`], and then hands to the merged party every riding it
/// lost by less than `threshold` points. A riding where the merged party tied
/// the leader and lost on the party order counts as lost by 0 points.
///
/// This models a swing toward the merged party on top of the pooling. The
/// shares are left untouched: only the winner, the winner share and the
/// margins change. In a reassigned riding, the margins are computed against
/// the merged party, so the previous leader ends up with a positive margin.
pub fn merge_parties_strong(
    ridings: &[RidingRecord],
    sources: &[Party],
    target: &str,
    threshold: f64,
) -> Result<Vec<AlternateRidingRecord>, AnalysisError> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(AnalysisError::InvalidMerge {
            reason: format!("threshold {} must be a non-negative number", threshold),
        });
    }
    let weak = merge_parties(ridings, sources, target)?;
    let res: Vec<AlternateRidingRecord> = weak
        .into_iter()
        .map(|alt| reassign_close_loss(alt, threshold))
        .collect();
    info!(
        "merge_parties_strong: {:?} ridings reassigned within {} points",
        res.iter().filter(|alt| alt.reassigned).count(),
        threshold
    );
    Ok(res)
}

fn check_merge(sources: &[Party], target: &str) -> AResult<Party> {
    let invalid = |reason: String| AnalysisError::InvalidMerge { reason };
    if sources.len() < 2 {
        return Err(invalid(format!(
            "at least two parties are required, got {:?}",
            sources
        )));
    }
    let mut seen: HashSet<&Party> = HashSet::new();
    for p in sources.iter() {
        if !p.is_tracked() {
            return Err(invalid(format!("{} is not a tracked party", p)));
        }
        if !seen.insert(p) {
            return Err(invalid(format!("{} is listed twice", p)));
        }
    }
    let code = target.trim();
    if code.is_empty() {
        return Err(invalid("the merged party needs a code".to_string()));
    }
    if let Some(p) = sources.iter().find(|p| p.code().eq_ignore_ascii_case(code)) {
        return Err(invalid(format!("{} cannot be merged into itself", p)));
    }
    if let Some(p) = Party::TRACKED
        .iter()
        .find(|p| p.code().eq_ignore_ascii_case(code))
    {
        return Err(invalid(format!("{} is already a tracked party", p)));
    }
    Ok(Party::Merged(code.to_string()))
}

fn merge_riding(
    riding: &RidingRecord,
    sources: &[Party],
    merged: &Party,
) -> AResult<AlternateRidingRecord> {
    if riding.shares.contains_key(merged) {
        return Err(AnalysisError::InvalidMerge {
            reason: format!(
                "district {} already has a party {}",
                riding.district_number, merged
            ),
        });
    }
    let pooled: f64 = sources.iter().map(|p| riding.share(p)).sum();
    let mut shares: BTreeMap<Party, f64> = riding
        .shares
        .iter()
        .filter(|(p, _)| !sources.contains(p))
        .map(|(p, s)| (p.clone(), *s))
        .collect();
    shares.insert(merged.clone(), pooled);

    let alt = build_riding(
        riding.district_number,
        &riding.district_name,
        &riding.province,
        shares,
    )?;
    if alt.winner != riding.winner {
        debug!(
            "merge_parties: district {}: {} -> {}",
            riding.district_number, riding.winner, alt.winner
        );
    }
    Ok(AlternateRidingRecord {
        riding: alt,
        merged_party: merged.clone(),
        merged_from: sources.to_vec(),
        reassigned: false,
    })
}

fn reassign_close_loss(mut alt: AlternateRidingRecord, threshold: f64) -> AlternateRidingRecord {
    let margin = match alt.riding.margin(&alt.merged_party) {
        Some(m) => m,
        None => return alt,
    };
    // A tie lost on the party order is a loss by 0 points.
    if alt.riding.winner != alt.merged_party && margin > -threshold {
        let share = alt.riding.share(&alt.merged_party);
        debug!(
            "merge_parties_strong: district {}: {} -> {} (margin {})",
            alt.riding.district_number, alt.riding.winner, alt.merged_party, margin
        );
        alt.riding.winner = alt.merged_party.clone();
        alt.riding.winner_share = share;
        alt.riding.margins = margins_against(&alt.riding.shares, share);
        alt.reassigned = true;
    }
    alt
}

// **** Comparisons between elections ****

/// Aligns the ridings of two elections on the district number.
///
/// This is a left join: the output follows the order of `current`, and the
/// districts of `previous` that are not in `current` are ignored. The policy
/// decides what happens to the districts of `current` that are missing from
/// `previous`.
pub fn join_by_district(
    current: &[RidingRecord],
    previous: &[RidingRecord],
    policy: JoinPolicy,
) -> Result<Vec<JoinedRiding>, AnalysisError> {
    check_unique_districts(current)?;
    check_unique_districts(previous)?;
    let previous_by_district: HashMap<u32, &RidingRecord> = previous
        .iter()
        .map(|r| (r.district_number, r))
        .collect();

    let mut res: Vec<JoinedRiding> = Vec::with_capacity(current.len());
    for r in current.iter() {
        let prev = previous_by_district.get(&r.district_number).cloned();
        if prev.is_none() {
            if policy == JoinPolicy::RejectUnmatched {
                return Err(AnalysisError::UnknownDistrict {
                    district: r.district_number,
                });
            }
            debug!(
                "join_by_district: district {} ({}) has no previous result",
                r.district_number, r.district_name
            );
        }
        res.push(JoinedRiding {
            district_number: r.district_number,
            current: r.clone(),
            previous: prev.cloned(),
        });
    }
    Ok(res)
}

fn check_unique_districts(ridings: &[RidingRecord]) -> AResult<()> {
    let mut seen: HashSet<u32> = HashSet::new();
    for r in ridings.iter() {
        if !seen.insert(r.district_number) {
            return Err(AnalysisError::MalformedInput {
                district: Some(r.district_number),
                reason: "the district appears more than once".to_string(),
            });
        }
    }
    Ok(())
}

/// The change of share of each party between the two elections, one record per
/// district and per party.
///
/// The districts without a previous riding are skipped.
pub fn compute_swings(joined: &[JoinedRiding], parties: &[Party]) -> Vec<SwingRecord> {
    let mut res: Vec<SwingRecord> = Vec::new();
    for j in joined.iter() {
        let previous = match &j.previous {
            Some(p) => p,
            None => {
                warn!(
                    "compute_swings: skipping district {} ({}): no previous result",
                    j.district_number, j.current.district_name
                );
                continue;
            }
        };
        for party in parties.iter() {
            res.push(SwingRecord {
                district_number: j.district_number,
                district_name: j.current.district_name.clone(),
                province: j.current.province.clone(),
                party: party.clone(),
                swing: j.current.share(party) - previous.share(party),
            });
        }
    }
    res
}

/// The swings of all the main parties, as one row per district.
pub fn swing_table(joined: &[JoinedRiding]) -> Vec<SwingRow> {
    let mut rows: Vec<SwingRow> = Vec::new();
    for j in joined.iter().filter(|j| j.previous.is_some()) {
        let swings: BTreeMap<Party, f64> =
            compute_swings(std::slice::from_ref(j), &Party::SWING_PARTIES)
                .into_iter()
                .map(|s| (s.party, s.swing))
                .collect();
        rows.push(SwingRow {
            district_number: j.district_number,
            district_name: j.current.district_name.clone(),
            swings,
        });
    }
    rows
}

// **** Summaries ****

/// The ridings that `party` lost by less than `-margin_floor` points.
///
/// The output is sorted by increasing margin: the heaviest losses come first
/// and the closest ones last. Ridings in which the party has no margin (because
/// it is not part of the party set) are skipped.
pub fn near_misses<R>(ridings: &[R], party: &Party, margin_floor: f64) -> Vec<R>
where
    R: AsRef<RidingRecord> + Clone,
{
    let mut res: Vec<(f64, R)> = ridings
        .iter()
        .filter_map(|r| {
            r.as_ref()
                .margin(party)
                .filter(|m| *m < 0.0 && *m > margin_floor)
                .map(|m| (m, r.clone()))
        })
        .collect();
    res.sort_by(|(m1, r1), (m2, r2)| {
        m1.total_cmp(m2)
            .then_with(|| r1.as_ref().district_number.cmp(&r2.as_ref().district_number))
    });
    debug!(
        "near_misses: {} lost {:?} ridings by less than {}",
        party,
        res.len(),
        -margin_floor
    );
    res.into_iter().map(|(_, r)| r).collect()
}

/// The composition of the house: the number of ridings won by each party.
///
/// Sorted by decreasing number of seats, then by party.
pub fn seat_counts<R: AsRef<RidingRecord>>(ridings: &[R]) -> Vec<SeatCount> {
    let mut counts: BTreeMap<&Party, u32> = BTreeMap::new();
    for r in ridings.iter() {
        *counts.entry(&r.as_ref().winner).or_insert(0) += 1;
    }
    let mut res: Vec<SeatCount> = counts
        .into_iter()
        .map(|(party, seats)| SeatCount {
            party: party.clone(),
            seats,
        })
        .collect();
    res.sort_by(|a, b| b.seats.cmp(&a.seats).then_with(|| a.party.cmp(&b.party)));
    res
}

/// The ridings in which the winner got more than `min_share` of the votes.
pub fn dominated_ridings<R>(ridings: &[R], min_share: f64) -> Vec<R>
where
    R: AsRef<RidingRecord> + Clone,
{
    ridings
        .iter()
        .filter(|r| r.as_ref().winner_share > min_share)
        .cloned()
        .collect()
}

/// Counts the dominated ridings by winning party and by province.
pub fn domination_summary<R: AsRef<RidingRecord>>(
    ridings: &[R],
    min_share: f64,
) -> DominationSummary {
    let mut by_party: BTreeMap<Party, u32> = BTreeMap::new();
    let mut by_province: BTreeMap<String, u32> = BTreeMap::new();
    for r in ridings.iter().map(|r| r.as_ref()) {
        if r.winner_share > min_share {
            *by_party.entry(r.winner.clone()).or_insert(0) += 1;
            *by_province.entry(r.province.clone()).or_insert(0) += 1;
        }
    }
    let mut by_party: Vec<(Party, u32)> = by_party.into_iter().collect();
    by_party.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let mut by_province: Vec<(String, u32)> = by_province.into_iter().collect();
    by_province.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    DominationSummary {
        min_share,
        by_party,
        by_province,
    }
}

// **** Districts ****

/// The province of a district, from the first two digits of its number.
///
/// Elections Canada numbers the districts with a five-digit code whose prefix
/// is the province (35xxx for Ontario, 24xxx for Quebec, ...).
pub fn province_for_district_number(district_number: u32) -> Option<&'static str> {
    let province = match district_number / 1000 {
        10 => "Newfoundland",
        11 => "PEI",
        12 => "Nova Scotia",
        13 => "New Brunswick",
        24 => "Quebec",
        35 => "Ontario",
        46 => "Manitoba",
        47 => "Saskatchewan",
        48 => "Alberta",
        59 => "BC",
        60 => "Yukon",
        61 => "NWT",
        62 => "Nunavut",
        _ => return None,
    };
    Some(province)
}

/// All the candidates of one district, in input order.
pub fn results_for_district(
    candidates: &[CandidateRecord],
    district_number: u32,
) -> Result<Vec<&CandidateRecord>, AnalysisError> {
    let res: Vec<&CandidateRecord> = candidates
        .iter()
        .filter(|c| c.district_number == district_number)
        .collect();
    if res.is_empty() {
        return Err(AnalysisError::UnknownDistrict {
            district: district_number,
        });
    }
    Ok(res)
}
