pub use crate::config::*;

use crate::province_for_district_number;

/// A builder for candidate tables.
///
/// The districts are declared first, then the results of the candidates are
/// added to them.
///
/// ```
/// pub use riding_analysis::builder::Builder;
/// pub use riding_analysis::Party;
/// # use riding_analysis::AnalysisError;
///
/// let mut builder = Builder::new().district(35001, "Ajax")?;
///
/// builder.add_result(35001, Party::Lpc, 52.5)?;
/// builder.add_candidate(35001, "Jane Doe", Party::Cpc, 12_000, 30.1)?;
///
/// assert_eq!(builder.candidates()[1].province, "Ontario");
///
/// # Ok::<(), AnalysisError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _districts: Vec<(u32, String, String)>,
    pub(crate) _candidates: Vec<CandidateRecord>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Declares a district. The province is deduced from the district number.
    pub fn district(self, number: u32, name: &str) -> Result<Builder, AnalysisError> {
        let province =
            province_for_district_number(number).ok_or_else(|| AnalysisError::MalformedInput {
                district: Some(number),
                reason: "cannot find the province of this district number".to_string(),
            })?;
        self.district_in(number, name, province)
    }

    /// Declares a district in the given province.
    pub fn district_in(
        mut self,
        number: u32,
        name: &str,
        province: &str,
    ) -> Result<Builder, AnalysisError> {
        if self._districts.iter().any(|(n, _, _)| *n == number) {
            return Err(AnalysisError::MalformedInput {
                district: Some(number),
                reason: "the district is declared twice".to_string(),
            });
        }
        self._districts
            .push((number, name.to_string(), province.to_string()));
        Ok(self)
    }

    /// Adds the share of a party in a district.
    ///
    /// It is the simplest use case, when the names of the candidates and the
    /// counts of votes are not relevant.
    pub fn add_result(
        &mut self,
        district: u32,
        party: Party,
        vote_share: f64,
    ) -> Result<(), AnalysisError> {
        self.add_record(district, None, party, None, vote_share)
    }

    pub fn add_candidate(
        &mut self,
        district: u32,
        candidate: &str,
        party: Party,
        votes: u64,
        vote_share: f64,
    ) -> Result<(), AnalysisError> {
        self.add_record(
            district,
            Some(candidate.to_string()),
            party,
            Some(votes),
            vote_share,
        )
    }

    fn add_record(
        &mut self,
        district: u32,
        candidate: Option<String>,
        party: Party,
        votes: Option<u64>,
        vote_share: f64,
    ) -> Result<(), AnalysisError> {
        let (_, name, province) = self
            ._districts
            .iter()
            .find(|(n, _, _)| *n == district)
            .ok_or(AnalysisError::UnknownDistrict { district })?;
        self._candidates.push(CandidateRecord {
            district_number: district,
            district_name: name.clone(),
            candidate,
            party,
            votes,
            vote_share,
            province: province.clone(),
        });
        Ok(())
    }

    pub fn candidates(&self) -> &[CandidateRecord] {
        &self._candidates
    }

    pub fn build(self) -> Vec<CandidateRecord> {
        self._candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_province() {
        assert_eq!(
            Builder::new().district(99001, "Nowhere").unwrap_err(),
            AnalysisError::MalformedInput {
                district: Some(99001),
                reason: "cannot find the province of this district number".to_string(),
            }
        );
    }

    #[test]
    fn undeclared_district() {
        let mut b = Builder::new().district(24001, "Abitibi").unwrap();
        assert_eq!(
            b.add_result(24002, Party::Bloc, 40.0),
            Err(AnalysisError::UnknownDistrict { district: 24002 })
        );
        assert!(b.candidates().is_empty());
    }

    #[test]
    fn declared_twice() {
        let b = Builder::new().district(24001, "Abitibi").unwrap();
        assert!(b.district_in(24001, "Abitibi", "Quebec").is_err());
    }

    #[test]
    fn records() {
        let mut b = Builder::new().district(59001, "Abbotsford").unwrap();
        b.add_candidate(59001, "Jane Doe", Party::Ndp, 1_234, 12.5)
            .unwrap();
        let candidates = b.build();
        assert_eq!(
            candidates,
            vec![CandidateRecord {
                district_number: 59001,
                district_name: "Abbotsford".to_string(),
                candidate: Some("Jane Doe".to_string()),
                party: Party::Ndp,
                votes: Some(1_234),
                vote_share: 12.5,
                province: "BC".to_string(),
            }]
        );
    }
}
