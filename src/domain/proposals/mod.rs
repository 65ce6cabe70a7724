pub mod error;
pub mod model;
pub mod service;

pub use error::ProposalServiceError;
pub use model::{CreateProposalRequest, SavedProposal, SavedProposalResponse};
pub use service::{ProposalService, ProposalServiceApi};
