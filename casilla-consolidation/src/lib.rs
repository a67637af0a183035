pub mod capture;
pub mod models;
pub mod repository;
pub mod selection;

pub use capture::CaptureService;
pub use models::{Consolidation, ConsolidationError, ConsolidationStatus, PaymentReference};
pub use repository::ConsolidationRepository;
pub use selection::SelectionTotals;
