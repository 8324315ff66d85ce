//! Contacts: parsing raw text into contact seeds and deriving organization keys.

pub mod model;
pub mod org_key;
pub mod parser;

pub use model::{
    CandidatePerson, ContactSeed, ContactStatus, EnrichedContact, LineError, LineErrorReason,
    PersonSummary,
};
pub use org_key::derive_key;
pub use parser::{ParseOutput, parse};
