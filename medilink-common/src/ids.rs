//! Identifier generation
//!
//! Identifiers are a fixed prefix plus a decimal number drawn from a fixed
//! range. Random draws are checked against the identifiers already taken;
//! after a bounded number of collisions the range is scanned for the first
//! free number, so a returned identifier is always unused.

use rand::Rng;
use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::{Error, Result};

const RANDOM_ATTEMPTS: usize = 32;

/// Prefix and numeric range for one identifier family
#[derive(Debug, Clone)]
pub struct IdScheme {
    pub prefix: &'static str,
    pub range: RangeInclusive<u32>,
}

/// Patients: `MED-` + 6 digits
pub const PATIENT_IDS: IdScheme = IdScheme {
    prefix: "MED-",
    range: 100_000..=999_999,
};

/// Consultations: `CNS-` + 5 digits
pub const CONSULTATION_IDS: IdScheme = IdScheme {
    prefix: "CNS-",
    range: 10_000..=99_999,
};

/// Doctors: `DOC-` + 4 digits
pub const DOCTOR_IDS: IdScheme = IdScheme {
    prefix: "DOC-",
    range: 1_000..=9_999,
};

impl IdScheme {
    fn format(&self, n: u32) -> String {
        format!("{}{}", self.prefix, n)
    }

    /// Generate an identifier not present in `taken`
    pub fn generate<'a, I>(&self, taken: I) -> Result<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let taken: HashSet<String> = taken.into_iter().map(str::to_uppercase).collect();
        let mut rng = rand::thread_rng();

        for _ in 0..RANDOM_ATTEMPTS {
            let candidate = self.format(rng.gen_range(self.range.clone()));
            if !taken.contains(&candidate) {
                return Ok(candidate);
            }
        }

        self.range
            .clone()
            .map(|n| self.format(n))
            .find(|candidate| !taken.contains(candidate))
            .ok_or_else(|| {
                Error::Internal(format!("identifier range for {} exhausted", self.prefix))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = PATIENT_IDS.generate(std::iter::empty()).unwrap();
        let digits = id.strip_prefix("MED-").unwrap();
        assert_eq!(digits.len(), 6);
        let n: u32 = digits.parse().unwrap();
        assert!(PATIENT_IDS.range.contains(&n));
    }

    #[test]
    fn test_avoids_taken_ids() {
        let scheme = IdScheme {
            prefix: "T-",
            range: 1..=3,
        };
        let taken = ["T-1", "T-3"];
        for _ in 0..20 {
            assert_eq!(scheme.generate(taken.iter().copied()).unwrap(), "T-2");
        }
    }

    #[test]
    fn test_taken_comparison_ignores_case() {
        let scheme = IdScheme {
            prefix: "T-",
            range: 1..=2,
        };
        assert_eq!(scheme.generate(["t-1"]).unwrap(), "T-2");
    }

    #[test]
    fn test_exhausted_range_is_an_error() {
        let scheme = IdScheme {
            prefix: "T-",
            range: 1..=2,
        };
        let result = scheme.generate(["T-1", "T-2"]);
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[test]
    fn test_consultation_and_doctor_shapes() {
        let cns = CONSULTATION_IDS.generate(std::iter::empty()).unwrap();
        assert!(cns.starts_with("CNS-") && cns.len() == 9);
        let doc = DOCTOR_IDS.generate(std::iter::empty()).unwrap();
        assert!(doc.starts_with("DOC-") && doc.len() == 8);
    }
}
