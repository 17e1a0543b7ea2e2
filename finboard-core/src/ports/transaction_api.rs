//! Transactions API port - the backend the import engine talks to

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{Category, CreatedTransaction, PaymentType, TransactionDraft};

/// Backend operations used by an import session
///
/// Transport and authentication are the implementation's concern. The HTTP
/// adapter carries them in an explicit request context.
#[async_trait]
pub trait TransactionApi: Send + Sync {
    /// Fetch every category visible to the user
    async fn fetch_categories(&self) -> Result<Vec<Category>>;

    /// Fetch every payment type visible to the user
    async fn fetch_payment_types(&self) -> Result<Vec<PaymentType>>;

    /// Create one transaction under `category_id`
    ///
    /// Any 2xx status means the record exists. The created record is `None`
    /// when the response body is empty or not a transaction.
    async fn create_transaction(
        &self,
        category_id: i64,
        draft: &TransactionDraft,
    ) -> Result<Option<CreatedTransaction>>;
}
