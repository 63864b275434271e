//! Verdicts and the decode/verify step shared by scans and stored certificates

pub mod rules;
pub mod verdict;
pub mod verifier;

pub use rules::{BusinessRules, RuleOutcome, StandardRules};
pub use verdict::{messages, Verdict, VerdictStatus};
pub use verifier::Verifier;
