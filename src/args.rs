use clap::Parser;

/// This is a riding-level analysis program for Canadian federal elections.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the elections to read and the analyses to run.
    /// For more information about the file format, read the manual of the riding_analysis crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the summary of the analysis in JSON format. If provided, ridings will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the analysis will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The candidate table of the election to analyze. Setting this option overrides the first
    /// election that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path or empty) The candidate table of an earlier election. If provided, the swings between the two
    /// elections are computed.
    #[clap(short, long, value_parser)]
    pub previous: Option<String>,

    /// (csv or xlsx) The type of the input files. By default, it is deduced from the extension of the files.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (party code, repeated) The parties to pool into a single party, for example `-m NDP -m GPC`.
    #[clap(short, long, value_parser)]
    pub merge: Option<Vec<String>>,

    /// (party code) The code of the party created by --merge.
    #[clap(long, value_parser)]
    pub merged_name: Option<String>,

    /// (default 10) The merged party also wins the ridings it lost by less than this many points.
    #[clap(long, value_parser)]
    pub strong_threshold: Option<f64>,

    /// (party code, repeated) The parties for which the ridings lost by less than 10 points are listed.
    #[clap(long, value_parser)]
    pub near_miss: Option<Vec<String>>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
