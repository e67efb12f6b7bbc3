use std::collections::HashMap;

use crate::ridings::*;
use snafu::OptionExt;

/// The positions of the columns of a candidate table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnIndexes {
    pub distnum: usize,
    pub distname: usize,
    pub party: usize,
    pub voteshare: usize,
    pub candidate: Option<usize>,
    pub numvotes: Option<usize>,
    pub province: Option<usize>,
}

pub fn get_col_indexes(path: &str, header: &[Option<String>]) -> BRidingsResult<ColumnIndexes> {
    let col_names: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, x)| x.as_ref().map(|s| (s.trim().to_lowercase(), idx)))
        .collect();
    debug!("get_col_indexes: col_names: {:?}", col_names);

    let required = |column: &str| -> BRidingsResult<usize> {
        let idx = col_names
            .get(column)
            .context(MissingColumnSnafu { column, path })?;
        Ok(*idx)
    };
    Ok(ColumnIndexes {
        distnum: required("distnum")?,
        distname: required("distname")?,
        party: required("party")?,
        voteshare: required("voteshare")?,
        candidate: col_names.get("candidate").cloned(),
        numvotes: col_names.get("numvotes").cloned(),
        province: col_names.get("province").cloned(),
    })
}

/// Maps a party cell to a party: either a party code, or the political
/// affiliation as spelled by Elections Canada.
pub fn party_from_label(label: &str) -> Party {
    match label.trim() {
        "Bloc Québécois" | "Bloc Québécois/Bloc Québécois" => Party::Bloc,
        "Conservative" | "Conservative/Conservateur" => Party::Cpc,
        "Green Party" | "Green Party/Parti Vert" => Party::Gpc,
        "Liberal" | "Liberal/Libéral" => Party::Lpc,
        "NDP-New Democratic Party" | "NDP-New Democratic Party/NPD-Nouveau Parti démocratique" => {
            Party::Ndp
        }
        code => Party::from_code(code),
    }
}

/// Reads one row of a candidate table. `lineno` starts at 1 with the header.
pub fn parse_row(
    path: &str,
    lineno: usize,
    row: &[Option<String>],
    cols: &ColumnIndexes,
) -> BRidingsResult<CandidateRecord> {
    let cell = |idx: usize| {
        row.get(idx)
            .and_then(|c| c.as_deref())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    };
    let wrong_cell = |column: &'static str, idx: usize| WrongCellSnafu {
        path,
        lineno,
        column,
        content: row.get(idx).cloned().flatten().unwrap_or_default(),
    };

    let district_number: u32 = cell(cols.distnum)
        .and_then(parse_int)
        .and_then(|x| u32::try_from(x).ok())
        .context(wrong_cell("distnum", cols.distnum))?;
    let district_name = cell(cols.distname)
        .context(wrong_cell("distname", cols.distname))?
        .to_string();
    let party = party_from_label(cell(cols.party).context(wrong_cell("party", cols.party))?);
    let vote_share: f64 = cell(cols.voteshare)
        .and_then(|s| s.parse::<f64>().ok())
        .context(wrong_cell("voteshare", cols.voteshare))?;

    let votes: Option<u64> = match cols.numvotes.and_then(cell) {
        Some(s) => Some(
            parse_int(s)
                .and_then(|x| u64::try_from(x).ok())
                .context(wrong_cell("numvotes", cols.numvotes.unwrap_or_default()))?,
        ),
        None => None,
    };
    let candidate = cols.candidate.and_then(cell).map(|s| s.to_string());
    let province = match cols.province.and_then(cell) {
        Some(s) => s.to_string(),
        None => province_for_district_number(district_number)
            .context(MissingProvinceSnafu {
                path,
                lineno,
                district: district_number,
            })?
            .to_string(),
    };

    Ok(CandidateRecord {
        district_number,
        district_name,
        candidate,
        party,
        votes,
        vote_share,
        province,
    })
}

// Spreadsheets store the integers as floating point numbers.
fn parse_int(s: &str) -> Option<i64> {
    if let Ok(x) = s.parse::<i64>() {
        return Some(x);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<Option<String>> {
        names.iter().map(|s| Some(s.to_string())).collect()
    }

    fn row(cells: &[&str]) -> Vec<Option<String>> {
        cells.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn parties() {
        assert_eq!(party_from_label("Bloc Québécois"), Party::Bloc);
        assert_eq!(party_from_label("Bloc"), Party::Bloc);
        assert_eq!(party_from_label("NDP-New Democratic Party"), Party::Ndp);
        assert_eq!(party_from_label("Conservative"), Party::Cpc);
        assert_eq!(party_from_label(" LPC "), Party::Lpc);
        assert_eq!(party_from_label("People's Party"), Party::Ind);
    }

    #[test]
    fn columns() {
        let cols = get_col_indexes(
            "t.csv",
            &header(&["DistNum", "distname", "candidate", "party", "voteshare"]),
        )
        .unwrap();
        assert_eq!(cols.distnum, 0);
        assert_eq!(cols.voteshare, 4);
        assert_eq!(cols.candidate, Some(2));
        assert_eq!(cols.numvotes, None);
        assert_eq!(cols.province, None);

        let err = get_col_indexes("t.csv", &header(&["distnum", "distname", "party"])).unwrap_err();
        assert!(matches!(*err, RidingsError::MissingColumn { .. }));
    }

    #[test]
    fn rows() {
        let cols = get_col_indexes(
            "t.csv",
            &header(&["distnum", "distname", "party", "numvotes", "voteshare", "province"]),
        )
        .unwrap();
        let c = parse_row(
            "t.csv",
            2,
            &row(&["48001.0", "Banff", "Conservative", "41000", "72.5", ""]),
            &cols,
        )
        .unwrap();
        assert_eq!(c.district_number, 48001);
        assert_eq!(c.party, Party::Cpc);
        assert_eq!(c.votes, Some(41000));
        assert_eq!(c.vote_share, 72.5);
        assert_eq!(c.province, "Alberta");
        assert_eq!(c.candidate, None);

        let err = parse_row(
            "t.csv",
            3,
            &row(&["48001", "Banff", "Liberal", "41000", "lots", "Alberta"]),
            &cols,
        )
        .unwrap_err();
        assert!(matches!(*err, RidingsError::WrongCell { lineno: 3, .. }));
        assert_eq!(
            err.to_string(),
            "Line 3 of t.csv: cannot read voteshare from lots"
        );

        let err = parse_row(
            "t.csv",
            4,
            &row(&["99001", "Nowhere", "Liberal", "", "40", ""]),
            &cols,
        )
        .unwrap_err();
        assert!(matches!(
            *err,
            RidingsError::MissingProvince {
                district: 99001,
                ..
            }
        ));
    }
}
