use std::sync::Arc;

use casilla_consolidation::{CaptureService, ConsolidationRepository};
use casilla_core::repository::PackageRepository;
use casilla_gex::{QuoteService, WarrantyRepository};

#[derive(Clone)]
pub struct AppState {
    pub packages: Arc<dyn PackageRepository>,
    pub consolidations: Arc<dyn ConsolidationRepository>,
    pub warranties: Arc<dyn WarrantyRepository>,
    pub quotes: Arc<QuoteService>,
    pub capture: Arc<CaptureService>,
}
