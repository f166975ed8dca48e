pub mod finalize_publication;

pub use finalize_publication::{
    FinalizePublicationRequest, FinalizePublicationResult, finalize_publication,
};
