use crate::ridings::*;
use snafu::{OptionExt, ResultExt};

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    /// A file path, or `stdout`.
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSource {
    pub name: String,
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(rename = "mergeParties")]
    pub merge_parties: Option<Vec<String>>,
    #[serde(rename = "mergedPartyName")]
    pub merged_party_name: Option<String>,
    #[serde(rename = "strongMergeThreshold")]
    pub strong_merge_threshold: Option<f64>,
    #[serde(rename = "nearMissParties")]
    pub near_miss_parties: Option<Vec<String>>,
    #[serde(rename = "nearMissFloor")]
    pub near_miss_floor: Option<f64>,
    #[serde(rename = "dominationShare")]
    pub domination_share: Option<f64>,
    #[serde(rename = "swingParties")]
    pub swing_parties: Option<Vec<String>>,
    #[serde(rename = "rejectUnmatchedDistricts")]
    pub reject_unmatched_districts: Option<bool>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RidingsConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    /// The current election first, then optionally the previous one.
    pub elections: Vec<ElectionSource>,
    pub analysis: Option<AnalysisSettings>,
}

/// Reads a configuration file. The relative paths of the elections are
/// resolved against the directory of the configuration file.
pub fn read_config(path: &str) -> BRidingsResult<RidingsConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut config: RidingsConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let root_p = Path::new(path).parent().context(MissingParentDirSnafu { path })?;
    for source in config.elections.iter_mut() {
        let p = Path::new(source.file_path.as_str());
        if p.is_relative() {
            let full: PathBuf = root_p.join(p);
            source.file_path = full.display().to_string();
        }
    }
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> BRidingsResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// The input type, when it is not provided: Excel for `.xlsx` files, CSV otherwise.
pub fn guess_provider(path: &str) -> String {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("xlsx") => "xlsx".to_string(),
        _ => "csv".to_string(),
    }
}

/// Builds the configuration from the command line, on top of the
/// configuration file if one is provided.
pub fn config_from_args(args: &Args) -> BRidingsResult<RidingsConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => read_config(path)?,
        None => RidingsConfig {
            output_settings: OutputSettings {
                contest_name: "ridings".to_string(),
                output_path: None,
            },
            elections: Vec::new(),
            analysis: None,
        },
    };

    let source_from_args = |name: &str, path: &String| ElectionSource {
        name: name.to_string(),
        provider: args
            .input_type
            .clone()
            .unwrap_or_else(|| guess_provider(path)),
        file_path: path.clone(),
        excel_worksheet_name: args.excel_worksheet_name.clone(),
    };
    if let Some(path) = &args.input {
        let source = source_from_args("current", path);
        match config.elections.first_mut() {
            Some(e) => *e = source,
            None => config.elections.push(source),
        }
    }
    if let Some(path) = &args.previous {
        if config.elections.is_empty() {
            return Err(Box::new(RidingsError::MissingElection {}));
        }
        let source = source_from_args("previous", path);
        config.elections.truncate(1);
        config.elections.push(source);
    }
    if config.elections.is_empty() {
        return Err(Box::new(RidingsError::MissingElection {}));
    }

    let mut analysis = config.analysis.clone().unwrap_or_default();
    if let Some(parties) = &args.merge {
        analysis.merge_parties = Some(parties.clone());
    }
    if let Some(name) = &args.merged_name {
        analysis.merged_party_name = Some(name.clone());
    }
    if let Some(threshold) = args.strong_threshold {
        analysis.strong_merge_threshold = Some(threshold);
    }
    if let Some(parties) = &args.near_miss {
        analysis.near_miss_parties = Some(parties.clone());
    }
    config.analysis = Some(analysis);

    if let Some(out) = &args.out {
        config.output_settings.output_path = Some(out.clone());
    }
    Ok(config)
}
