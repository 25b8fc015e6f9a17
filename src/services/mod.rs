pub mod dispatch;
pub mod orders;
pub mod reconciliation;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, gateway::PaymentGateway};

pub use dispatch::DispatchService;
pub use orders::OrderService;
pub use reconciliation::ReconciliationService;

/// Aggregated services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: OrderService,
    pub reconciliation: ReconciliationService,
    pub dispatch: DispatchService,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            orders: OrderService::new(db.clone()),
            reconciliation: ReconciliationService::new(db.clone(), gateway, config),
            dispatch: DispatchService::new(db),
        }
    }
}
