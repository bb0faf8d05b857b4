//! Process-wide mutable state shared by the tool handlers
//!
//! Every registry is in-memory and internally synchronized; nothing survives a
//! restart.

pub mod confirmations;
pub mod jobs;
pub mod risk_policy;

pub use confirmations::{ConfirmationRegistry, ConfirmationTicket};
pub use jobs::{
    AlertCondition, CrossingType, JobCallback, JobError, JobKind, JobRecord, JobRegistry, JobSpec,
};
pub use risk_policy::{RiskPolicy, RiskPolicyStore, RiskPolicyUpdate};

use rand::Rng;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random lowercase alphanumeric identifier of `len` characters
pub fn random_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// The registries owned by one server process
#[derive(Default)]
pub struct Registries {
    pub confirmations: ConfirmationRegistry,
    pub jobs: JobRegistry,
    pub risk_policy: RiskPolicyStore,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }
}
