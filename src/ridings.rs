use log::{debug, info, warn};

use riding_analysis::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::ridings::config_reader::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;

#[derive(Debug, Snafu)]
pub enum RidingsError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Cannot find worksheet {name} in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("The file {path} is empty"))]
    EmptyFile { path: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Cannot find the column {column} in the header of {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Line {lineno} of {path}: cannot read {column} from {content}"))]
    WrongCell {
        path: String,
        lineno: usize,
        column: String,
        content: String,
    },
    #[snafu(display("Line {lineno} of {path}: no province for district {district}"))]
    MissingProvince {
        path: String,
        lineno: usize,
        district: u32,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Cannot find the directory of {path}"))]
    MissingParentDir { path: String },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Provider {provider} is not supported (use csv or xlsx)"))]
    UnknownProvider { provider: String },
    #[snafu(display("Unknown party code {code}"))]
    UnknownParty { code: String },
    #[snafu(display("No election data: provide an input file or a configuration file"))]
    MissingElection {},
    #[snafu(display("Analysis of {election} failed: {source}"))]
    Analysis {
        source: AnalysisError,
        election: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type RidingsResult<T> = Result<T, RidingsError>;
type BRidingsResult<T> = Result<T, Box<RidingsError>>;

/// The analyses to run, once the settings have been checked.
#[derive(PartialEq, Debug, Clone)]
struct AnalysisPlan {
    merge: Option<(Vec<Party>, String)>,
    strong_threshold: f64,
    near_miss_parties: Vec<Party>,
    near_miss_floor: f64,
    domination_share: f64,
    swing_parties: Vec<Party>,
    join_policy: JoinPolicy,
}

// Party codes in the settings must be known codes: a typo should not silently
// become an independent.
fn read_party_code(code: &str) -> RidingsResult<Party> {
    let p = Party::from_code(code);
    ensure!(
        p != Party::Ind || code.trim().eq_ignore_ascii_case("IND"),
        UnknownPartySnafu { code }
    );
    Ok(p)
}

fn read_party_codes(codes: &[String]) -> RidingsResult<Vec<Party>> {
    codes.iter().map(|c| read_party_code(c)).collect()
}

fn validate_analysis(settings: &AnalysisSettings) -> RidingsResult<AnalysisPlan> {
    let merge = match &settings.merge_parties {
        Some(codes) if !codes.is_empty() => {
            let parties = read_party_codes(codes)?;
            let name = settings.merged_party_name.clone().unwrap_or_else(|| {
                parties
                    .iter()
                    .map(|p| p.code())
                    .collect::<Vec<&str>>()
                    .join("+")
            });
            Some((parties, name))
        }
        _ => None,
    };
    let swing_parties = match &settings.swing_parties {
        Some(codes) => read_party_codes(codes)?,
        None => Party::SWING_PARTIES.to_vec(),
    };
    Ok(AnalysisPlan {
        merge,
        strong_threshold: settings
            .strong_merge_threshold
            .unwrap_or(DEFAULT_STRONG_THRESHOLD),
        near_miss_parties: read_party_codes(
            settings.near_miss_parties.as_deref().unwrap_or_default(),
        )?,
        near_miss_floor: settings.near_miss_floor.unwrap_or(NEAR_MISS_MARGIN_FLOOR),
        domination_share: settings.domination_share.unwrap_or(DOMINATION_SHARE),
        swing_parties,
        join_policy: match settings.reject_unmatched_districts {
            Some(true) => JoinPolicy::RejectUnmatched,
            _ => JoinPolicy::KeepUnmatched,
        },
    })
}

fn read_candidates(source: &ElectionSource) -> BRidingsResult<Vec<CandidateRecord>> {
    let path = source.file_path.as_str();
    info!(
        "Attempting to read election {} from {:?}",
        source.name, path
    );
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_candidates(path),
        "xlsx" => io_excel::read_excel_candidates(path, source),
        x => Err(Box::new(RidingsError::UnknownProvider {
            provider: x.to_string(),
        })),
    }
}

// ******** Summary ********

fn shares_to_json(shares: &std::collections::BTreeMap<Party, f64>) -> JSValue {
    let m: serde_json::Map<String, JSValue> = shares
        .iter()
        .map(|(p, s)| (p.code().to_string(), json!(s)))
        .collect();
    JSValue::Object(m)
}

fn riding_to_json(r: &RidingRecord) -> JSValue {
    json!({
        "distnum": r.district_number,
        "distname": r.district_name,
        "province": r.province,
        "shares": shares_to_json(&r.shares),
        "margins": shares_to_json(&r.margins),
        "winner": r.winner.code(),
        "winnershare": r.winner_share,
    })
}

fn alternate_to_json(alt: &AlternateRidingRecord) -> JSValue {
    let mut js = riding_to_json(&alt.riding);
    js["reassigned"] = json!(alt.reassigned);
    js
}

fn house_to_json(seats: &[SeatCount]) -> JSValue {
    let l: Vec<JSValue> = seats
        .iter()
        .map(|s| json!({"party": s.party.code(), "seats": s.seats}))
        .collect();
    JSValue::Array(l)
}

fn domination_to_json(d: &DominationSummary, dominated: &[RidingRecord]) -> JSValue {
    let by_party: Vec<JSValue> = d
        .by_party
        .iter()
        .map(|(p, c)| json!({"party": p.code(), "ridings": c}))
        .collect();
    let by_province: Vec<JSValue> = d
        .by_province
        .iter()
        .map(|(p, c)| json!({"province": p, "ridings": c}))
        .collect();
    let districts: Vec<u32> = dominated.iter().map(|r| r.district_number).collect();
    json!({
        "minShare": d.min_share,
        "byParty": by_party,
        "byProvince": by_province,
        "districts": districts,
    })
}

fn swing_to_json(s: &SwingRecord) -> JSValue {
    json!({
        "distnum": s.district_number,
        "distname": s.district_name,
        "province": s.province,
        "party": s.party.code(),
        "swing": s.swing,
    })
}

fn swing_row_to_json(row: &SwingRow) -> JSValue {
    json!({
        "distnum": row.district_number,
        "distname": row.district_name,
        "swings": shares_to_json(&row.swings),
    })
}

fn run_unified(ridings: &[RidingRecord], plan: &AnalysisPlan) -> RidingsResult<Option<JSValue>> {
    let (sources, name) = match &plan.merge {
        Some(x) => x,
        None => return Ok(None),
    };
    let election = format!("unified {}", name);
    let weak = merge_parties(ridings, sources, name).context(AnalysisSnafu {
        election: election.as_str(),
    })?;
    let strong = merge_parties_strong(ridings, sources, name, plan.strong_threshold)
        .context(AnalysisSnafu {
            election: election.as_str(),
        })?;
    let weak_house = seat_counts(&weak);
    let strong_house = seat_counts(&strong);
    info!("House with {}: {:?}", name, weak_house);
    info!(
        "House with {} within {} points: {:?}",
        name, plan.strong_threshold, strong_house
    );
    let merged_from: Vec<&str> = sources.iter().map(|p| p.code()).collect();
    Ok(Some(json!({
        "party": name,
        "mergedFrom": merged_from,
        "weak": {
            "house": house_to_json(&weak_house),
            "ridings": weak.iter().map(alternate_to_json).collect::<Vec<JSValue>>(),
        },
        "strong": {
            "threshold": plan.strong_threshold,
            "house": house_to_json(&strong_house),
            "ridings": strong.iter().map(alternate_to_json).collect::<Vec<JSValue>>(),
        },
    })))
}

fn run_swings(
    current: &[RidingRecord],
    previous_source: &ElectionSource,
    previous: &[RidingRecord],
    plan: &AnalysisPlan,
) -> RidingsResult<JSValue> {
    let joined = join_by_district(current, previous, plan.join_policy).context(AnalysisSnafu {
        election: previous_source.name.as_str(),
    })?;
    let unmatched: Vec<u32> = joined
        .iter()
        .filter(|j| j.previous.is_none())
        .map(|j| j.district_number)
        .collect();
    if !unmatched.is_empty() {
        warn!(
            "{:?} districts are not in election {}: {:?}",
            unmatched.len(),
            previous_source.name,
            unmatched
        );
    }
    let swings = compute_swings(&joined, &plan.swing_parties);
    let table = swing_table(&joined);
    Ok(json!({
        "previous": previous_source.name,
        "unmatchedDistricts": unmatched,
        "swings": swings.iter().map(swing_to_json).collect::<Vec<JSValue>>(),
        "byDistrict": table.iter().map(swing_row_to_json).collect::<Vec<JSValue>>(),
    }))
}

/// Runs all the analyses described by the configuration and assembles the summary.
pub fn run_analysis_config(config: &RidingsConfig) -> BRidingsResult<JSValue> {
    let plan = validate_analysis(&config.analysis.clone().unwrap_or_default())?;
    debug!("run_analysis_config: plan: {:?}", plan);

    let current_source = config
        .elections
        .first()
        .context(MissingElectionSnafu {})?;
    let candidates = read_candidates(current_source)?;
    let ridings = aggregate(&candidates).context(AnalysisSnafu {
        election: current_source.name.as_str(),
    })?;
    let house = seat_counts(&ridings);
    info!("House for {}: {:?}", current_source.name, house);

    let mut near_miss_js = serde_json::Map::new();
    for party in plan.near_miss_parties.iter() {
        let misses = near_misses(&ridings, party, plan.near_miss_floor);
        info!(
            "{} lost {:?} ridings by less than {} points",
            party,
            misses.len(),
            -plan.near_miss_floor
        );
        near_miss_js.insert(
            party.code().to_string(),
            JSValue::Array(misses.iter().map(riding_to_json).collect()),
        );
    }

    let mut summary = json!({
        "config": {
            "contest": config.output_settings.contest_name,
            "elections": config.elections.iter().map(|e| e.name.clone()).collect::<Vec<String>>(),
        },
        "ridings": ridings.iter().map(riding_to_json).collect::<Vec<JSValue>>(),
        "house": house_to_json(&house),
        "domination": domination_to_json(
            &domination_summary(&ridings, plan.domination_share),
            &dominated_ridings(&ridings, plan.domination_share),
        ),
        "nearMisses": near_miss_js,
    });

    if let Some(unified) = run_unified(&ridings, &plan)? {
        summary["unified"] = unified;
    }

    if let Some(previous_source) = config.elections.get(1) {
        let previous_candidates = read_candidates(previous_source)?;
        let previous = aggregate(&previous_candidates).context(AnalysisSnafu {
            election: previous_source.name.as_str(),
        })?;
        summary["swings"] = run_swings(&ridings, previous_source, &previous, &plan)?;
    }
    if config.elections.len() > 2 {
        warn!(
            "Only the first two elections are compared, ignoring {:?}",
            &config.elections[2..]
        );
    }
    Ok(summary)
}

fn check_reference(summary: &JSValue, reference: &JSValue) -> RidingsResult<()> {
    let pretty_summary =
        serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    let pretty_reference =
        serde_json::to_string_pretty(reference).context(ParsingJsonSnafu {})?;
    if pretty_reference != pretty_summary {
        warn!("Found differences with the reference summary");
        print_diff(pretty_reference.as_str(), pretty_summary.as_str(), "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

fn write_summary(summary: &JSValue, output_path: Option<&str>) -> BRidingsResult<()> {
    let pretty = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    match output_path {
        None | Some("stdout") => {
            println!("{}", pretty);
        }
        Some(path) => {
            info!("Writing summary to {:?}", path);
            fs::write(path, pretty).context(WritingSummarySnafu { path })?;
        }
    }
    Ok(())
}

pub fn run_analysis(args: &Args) -> BRidingsResult<()> {
    let config = config_from_args(args)?;
    info!("config: {:?}", config);

    let summary = run_analysis_config(&config)?;
    write_summary(&summary, config.output_settings.output_path.as_deref())?;

    // The reference summary, if provided for comparison
    if let Some(reference_p) = &args.reference {
        let reference = read_summary(reference_p)?;
        check_reference(&summary, &reference)?;
        info!("The summary matches the reference {:?}", reference_p);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn data_path(name: &str) -> String {
        let p: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "data", name]
            .iter()
            .collect();
        p.display().to_string()
    }

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn config_2019() -> RidingsConfig {
        read_config(&data_path("config.json")).unwrap()
    }

    #[test]
    fn config_paths_are_resolved() {
        let config = config_2019();
        assert_eq!(config.elections.len(), 2);
        assert_eq!(config.elections[0].file_path, data_path("candidates_2019.csv"));
        assert!(Path::new(&config.elections[1].file_path).exists());
    }

    #[test]
    fn party_settings() {
        assert_eq!(read_party_code("ndp").unwrap(), Party::Ndp);
        assert_eq!(read_party_code("IND").unwrap(), Party::Ind);
        assert!(matches!(
            read_party_code("NPD"),
            Err(RidingsError::UnknownParty { .. })
        ));

        let plan = validate_analysis(&AnalysisSettings {
            merge_parties: Some(vec!["NDP".to_string(), "GPC".to_string()]),
            ..AnalysisSettings::default()
        })
        .unwrap();
        assert_eq!(
            plan.merge,
            Some((vec![Party::Ndp, Party::Gpc], "NDP+GPC".to_string()))
        );
        assert_eq!(plan.strong_threshold, DEFAULT_STRONG_THRESHOLD);
        assert_eq!(plan.join_policy, JoinPolicy::KeepUnmatched);
        assert!(plan.near_miss_parties.is_empty());
    }

    #[test]
    fn full_analysis() {
        init();
        let summary = run_analysis_config(&config_2019()).unwrap();

        assert_eq!(summary["config"]["elections"], json!(["2019", "2015"]));
        let ridings = summary["ridings"].as_array().unwrap();
        assert_eq!(ridings.len(), 5);
        assert_eq!(ridings[0]["distnum"], json!(24001));
        assert_eq!(ridings[0]["winner"], json!("BLOC"));
        assert_eq!(ridings[0]["margins"]["LPC"], json!(-4.0));
        assert_eq!(ridings[1]["province"], json!("Ontario"));
        assert_eq!(ridings[1]["shares"]["IND"], json!(1.0));

        assert_eq!(
            summary["house"],
            json!([
                {"party": "CPC", "seats": 3},
                {"party": "BLOC", "seats": 1},
                {"party": "LPC", "seats": 1},
            ])
        );
        assert_eq!(
            summary["domination"]["byParty"],
            json!([{"party": "CPC", "ridings": 1}])
        );

        let lpc_misses = summary["nearMisses"]["LPC"].as_array().unwrap();
        assert_eq!(lpc_misses.len(), 2);
        assert_eq!(lpc_misses[0]["distnum"], json!(59002));
        assert_eq!(lpc_misses[1]["distnum"], json!(24001));

        let unified = &summary["unified"];
        assert_eq!(unified["party"], json!("GDP"));
        assert_eq!(
            unified["weak"]["house"],
            json!([
                {"party": "CPC", "seats": 2},
                {"party": "BLOC", "seats": 1},
                {"party": "GDP", "seats": 1},
                {"party": "LPC", "seats": 1},
            ])
        );
        assert_eq!(
            unified["strong"]["house"],
            json!([
                {"party": "GDP", "seats": 2},
                {"party": "BLOC", "seats": 1},
                {"party": "CPC", "seats": 1},
                {"party": "LPC", "seats": 1},
            ])
        );
        let strong_ridings = unified["strong"]["ridings"].as_array().unwrap();
        assert_eq!(strong_ridings[3]["distnum"], json!(59001));
        assert_eq!(strong_ridings[3]["reassigned"], json!(true));
        assert_eq!(strong_ridings[3]["margins"]["CPC"], json!(6.0));

        let swings = &summary["swings"];
        assert_eq!(swings["unmatchedDistricts"], json!([59002]));
        let swings = swings["swings"].as_array().unwrap();
        // 4 matched districts, 5 parties.
        assert_eq!(swings.len(), 20);
        assert_eq!(
            swings[0],
            json!({
                "distnum": 24001,
                "distname": "Abitibi--Baie-James--Nunavik--Eeyou",
                "province": "Quebec",
                "party": "BLOC",
                "swing": 5.0,
            })
        );
        assert_eq!(swings[3]["party"], json!("LPC"));
        assert_eq!(swings[3]["swing"], json!(-4.0));

        let by_district = summary["swings"]["byDistrict"].as_array().unwrap();
        assert_eq!(by_district.len(), 4);
        assert_eq!(
            by_district[0]["swings"],
            json!({"BLOC": 5.0, "CPC": -1.0, "GPC": 0.0, "LPC": -4.0, "NDP": 0.0})
        );
        assert_eq!(summary["domination"]["districts"], json!([48001]));
    }

    #[test]
    fn strict_join_fails() {
        let mut config = config_2019();
        let mut analysis = config.analysis.clone().unwrap();
        analysis.reject_unmatched_districts = Some(true);
        config.analysis = Some(analysis);
        let err = run_analysis_config(&config).unwrap_err();
        assert!(matches!(
            *err,
            RidingsError::Analysis {
                source: AnalysisError::UnknownDistrict { district: 59002 },
                ..
            }
        ));
    }

    #[test]
    fn bad_merge_request() {
        let mut config = config_2019();
        let mut analysis = config.analysis.clone().unwrap();
        analysis.merge_parties = Some(vec!["NDP".to_string()]);
        config.analysis = Some(analysis);
        let err = run_analysis_config(&config).unwrap_err();
        assert!(matches!(
            *err,
            RidingsError::Analysis {
                source: AnalysisError::InvalidMerge { .. },
                ..
            }
        ));
    }

    #[test]
    fn unknown_provider() {
        let mut config = config_2019();
        config.elections[0].provider = "ods".to_string();
        let err = run_analysis_config(&config).unwrap_err();
        assert!(matches!(*err, RidingsError::UnknownProvider { .. }));
    }

    #[test]
    fn command_line_only() {
        init();
        let input = data_path("candidates_2019.csv");
        let args = Args::try_parse_from([
            "ridings",
            "-i",
            input.as_str(),
            "-m",
            "NDP",
            "-m",
            "GPC",
            "--merged-name",
            "GDP",
            "--near-miss",
            "CPC",
        ])
        .unwrap();
        let config = config_from_args(&args).unwrap();
        assert_eq!(config.elections.len(), 1);
        assert_eq!(config.elections[0].provider, "csv");
        let summary = run_analysis_config(&config).unwrap();
        assert!(summary.get("swings").is_none());
        assert_eq!(summary["unified"]["party"], json!("GDP"));
        let cpc_misses = summary["nearMisses"]["CPC"].as_array().unwrap();
        assert_eq!(cpc_misses.len(), 0);
    }

    #[test]
    fn command_line_overrides_config() {
        let config_p = data_path("config.json");
        let previous = data_path("candidates_2015.csv");
        let args = Args::try_parse_from([
            "ridings",
            "-c",
            config_p.as_str(),
            "--previous",
            previous.as_str(),
            "--strong-threshold",
            "5",
            "-o",
            "stdout",
        ])
        .unwrap();
        let config = config_from_args(&args).unwrap();
        assert_eq!(config.elections[1].name, "previous");
        assert_eq!(config.elections[1].file_path, previous);
        let analysis = config.analysis.unwrap();
        assert_eq!(analysis.strong_merge_threshold, Some(5.0));
        assert_eq!(analysis.merged_party_name, Some("GDP".to_string()));
        assert_eq!(config.output_settings.output_path, Some("stdout".to_string()));
    }

    #[test]
    fn no_input() {
        let args = Args::try_parse_from(["ridings"]).unwrap();
        let err = config_from_args(&args).unwrap_err();
        assert!(matches!(*err, RidingsError::MissingElection {}));
    }

    fn run_reference_test(test_name: &str) {
        init();
        let config_p = data_path(format!("{}.json", test_name).as_str());
        let reference_p = data_path(format!("{}_expected_summary.json", test_name).as_str());
        info!("Running test {}", test_name);
        let args = Args::try_parse_from([
            "ridings",
            "-c",
            config_p.as_str(),
            "-r",
            reference_p.as_str(),
            "-o",
            "stdout",
        ])
        .unwrap();
        if let Err(e) = run_analysis(&args) {
            panic!("{}: {}", test_name, e);
        }
    }

    #[test]
    fn config_matches_reference() {
        run_reference_test("config");
    }

    #[test]
    fn reference_comparison() {
        let summary = json!({"house": [{"party": "CPC", "seats": 2}]});
        assert!(check_reference(&summary, &summary.clone()).is_ok());
        let other = json!({"house": [{"party": "CPC", "seats": 3}]});
        assert!(check_reference(&summary, &other).is_err());
    }
}
