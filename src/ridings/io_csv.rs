// Primitives for reading CSV files.

use std::fs::File;

use crate::ridings::{
    io_common::{get_col_indexes, parse_row},
    *,
};
use snafu::{OptionExt, ResultExt};

pub fn read_csv_candidates(path: &str) -> BRidingsResult<Vec<CandidateRecord>> {
    let mut records = get_records(path)?;

    let header: Vec<Option<String>> = records
        .next()
        .context(EmptyFileSnafu { path })?
        .context(CsvLineParseSnafu { path, lineno: 1_usize })?
        .iter()
        .map(|s| Some(s.to_string()))
        .collect();
    debug!("read_csv_candidates: header: {:?}", header);
    let cols = get_col_indexes(path, &header)?;

    let mut res: Vec<CandidateRecord> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let row: Vec<Option<String>> = line.iter().map(|s| Some(s.to_string())).collect();
        if row.iter().all(|c| c.as_deref().map(str::trim) == Some("")) {
            debug!("read_csv_candidates: skipping empty line {}", lineno);
            continue;
        }
        res.push(parse_row(path, lineno, &row, &cols)?);
    }
    info!(
        "read_csv_candidates: {:?} candidates in {}",
        res.len(),
        path
    );
    Ok(res)
}

fn get_records(path: &str) -> RidingsResult<csv::StringRecordsIntoIter<File>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    Ok(rdr.into_records())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_2019() {
        let path = format!("{}/tests/data/candidates_2019.csv", env!("CARGO_MANIFEST_DIR"));
        let candidates = read_csv_candidates(&path).unwrap();
        assert_eq!(candidates.len(), 21);
        let first = &candidates[0];
        assert_eq!(first.district_number, 24001);
        assert_eq!(first.district_name, "Abitibi--Baie-James--Nunavik--Eeyou");
        assert_eq!(first.province, "Quebec");
        assert_eq!(first.party, Party::Bloc);
        assert_eq!(first.candidate.as_deref(), Some("Sylvie Bérubé"));
        assert_eq!(first.votes, Some(12778));
        assert_eq!(first.vote_share, 35.0);
    }

    #[test]
    fn missing_file() {
        let err = read_csv_candidates("/nonexistent/candidates.csv").unwrap_err();
        assert!(matches!(*err, RidingsError::CsvOpen { .. }));
    }
}
