use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::ridings::{
    io_common::{get_col_indexes, parse_row},
    *,
};
use snafu::{OptionExt, ResultExt};

pub fn read_excel_candidates(
    path: &str,
    source: &ElectionSource,
) -> BRidingsResult<Vec<CandidateRecord>> {
    let wrange = get_range(path, source)?;

    let mut iter = wrange.rows();
    let header: Vec<Option<String>> = iter
        .next()
        .context(EmptyFileSnafu { path })?
        .iter()
        .map(cell_to_string)
        .collect();
    debug!("read_excel_candidates: header: {:?}", header);
    let cols = get_col_indexes(path, &header)?;

    let mut res: Vec<CandidateRecord> = Vec::new();
    for (idx, cells) in iter.enumerate() {
        let lineno = idx + 2;
        let row: Vec<Option<String>> = cells.iter().map(cell_to_string).collect();
        if row.iter().all(|c| c.is_none()) {
            continue;
        }
        res.push(parse_row(path, lineno, &row, &cols)?);
    }
    info!(
        "read_excel_candidates: {:?} candidates in {}",
        res.len(),
        path
    );
    Ok(res)
}

fn get_range(path: &str, source: &ElectionSource) -> BRidingsResult<calamine::Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, &source.excel_worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    let wrange = match &source.excel_worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyFileSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    Ok(wrange)
}

fn cell_to_string(cell: &DataType) -> Option<String> {
    match cell {
        DataType::Empty => None,
        DataType::String(s) => Some(s.clone()),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        DataType::Float(f) => Some(f.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        other => Some(format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(cell_to_string(&DataType::Empty), None);
        assert_eq!(
            cell_to_string(&DataType::String("Ajax".to_string())),
            Some("Ajax".to_string())
        );
        assert_eq!(
            cell_to_string(&DataType::Float(35001.0)),
            Some("35001".to_string())
        );
        assert_eq!(
            cell_to_string(&DataType::Float(45.25)),
            Some("45.25".to_string())
        );
        assert_eq!(cell_to_string(&DataType::Int(12)), Some("12".to_string()));
    }

    #[test]
    fn missing_workbook() {
        let source = ElectionSource {
            name: "2019".to_string(),
            provider: "xlsx".to_string(),
            file_path: "/nonexistent/candidates.xlsx".to_string(),
            excel_worksheet_name: None,
        };
        let err = read_excel_candidates(&source.file_path, &source).unwrap_err();
        assert!(matches!(*err, RidingsError::OpeningExcel { .. }));
    }
}
