//! Read-only view over completed transfers.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::page::{Page, PageRequest};
use crate::models::transfer::TransferView;
use crate::repositories::TransferRepository;

#[derive(Clone)]
pub struct MonitorService {
    transfers: Arc<dyn TransferRepository>,
}

impl MonitorService {
    pub fn new(transfers: Arc<dyn TransferRepository>) -> Self {
        Self { transfers }
    }

    /// One page of successful transfers, oldest first.
    pub async fn successful_transfers(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<TransferView>, AppError> {
        let request = PageRequest::new(page, page_size)?;
        let transfers = self.transfers.find_page(request).await?;
        Ok(transfers.map(TransferView::from))
    }
}
