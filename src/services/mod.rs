// Services built on top of the entity store
pub mod dashboard;
pub mod draft_library;

pub use dashboard::{summarize_leads, ContactQuery, LeadQuery, LeadSort, LeadSummary};
pub use draft_library::{DraftError, DraftInput, DraftLibrary, EmailDraft};
