//! # Errors with a defined process exit status
//!
//! Most failures in `ldpair` are propagated as plain [`anyhow`] errors and
//! map to the user-error exit status. The variants here are the ones the
//! process must distinguish by exit code.
use thiserror::Error;

/// User errors exit with status 1, system errors with status 2.
pub const USER_ERROR: u8 = 1;
pub const SYSTEM_ERROR: u8 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LdError {
    /// A decoded allele pair was not drawn from {A, a}.
    #[error("Genotype must be AA, Aa or aa (position {position}, sample {person_id})")]
    InvalidGenotype { position: i32, person_id: i32 },

    /// The per-locus genotype capacity was exhausted.
    #[error("Number of genotypes supported per locus ({max}) exceeded")]
    TooManySamples { max: usize },
}

impl LdError {
    pub fn exit_code(&self) -> u8 {
        match self {
            LdError::InvalidGenotype { .. } => USER_ERROR,
            LdError::TooManySamples { .. } => SYSTEM_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let err = LdError::InvalidGenotype {
            position: 100,
            person_id: 1,
        };
        assert_eq!(USER_ERROR, err.exit_code());

        let err = LdError::TooManySamples { max: 10 };
        assert_eq!(SYSTEM_ERROR, err.exit_code());
    }
}
