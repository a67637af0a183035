pub mod models;
pub mod pricing;
pub mod quote;
pub mod repository;
pub mod warranty;

pub use models::{GexQuote, PaymentOption, PolicyAttachment, SignatureArtifact, WarrantySubmission};
pub use pricing::{FeeSchedule, PricingError, QuoteBreakdown};
pub use quote::{QuoteError, QuoteService};
pub use repository::WarrantyRepository;
pub use warranty::{WarrantyError, WarrantyFlow, WarrantyStep};
