//! Order submission: validate, upload the slip, record the order, then sync
//! stock.
//!
//! The three-step sequence is deliberately best-effort and non-transactional.
//! Upload failure aborts everything (a slip is mandatory input and we never
//! substitute a placeholder URL). A failure recording the order aborts before
//! any stock is touched. Stock decrements run after the order exists, one line
//! at a time in cart order; a failing decrement is logged and reported as a
//! warning on the receipt but the order stays placed — the customer already
//! paid, inventory drift is an operator problem. There is no reservation step,
//! so concurrent submissions can oversell; that race is accepted.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    media::{self, UploadConstraintError},
    models::{CartLine, Customer},
};

/// Where uploaded payment slips end up.
pub trait SlipStorage {
    fn upload(
        &self,
        bytes: &[u8],
        hint: &str,
    ) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Durable order store. Orders are always created `pending`.
pub trait OrderSink {
    fn create_order(&self, draft: &OrderDraft) -> impl Future<Output = anyhow::Result<Uuid>> + Send;
}

/// Catalog stock decrements. Implementations clamp at zero.
pub trait StockSource {
    fn decrease_stock(
        &self,
        product_id: Uuid,
        quantity: u32,
    ) -> impl Future<Output = anyhow::Result<i32>> + Send;
}

#[derive(Debug, Clone)]
pub struct SlipUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

#[derive(Debug)]
pub struct SubmissionRequest {
    pub customer: Customer,
    pub lines: Vec<CartLine>,
    pub slip: Option<SlipUpload>,
}

/// Everything the order store needs to persist a new pending order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDraft {
    pub customer: Customer,
    pub items: Vec<CartLine>,
    pub total_price: i64,
    pub payment_slip_url: String,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("customer {0} is required")]
    MissingCustomerField(&'static str),

    #[error("cart is empty")]
    EmptyCart,

    #[error("payment slip is required")]
    MissingPaymentSlip,

    #[error("payment slip rejected: {0}")]
    Slip(#[from] UploadConstraintError),
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("payment slip upload failed")]
    Upload(#[source] anyhow::Error),

    #[error("order could not be recorded")]
    OrderCreate(#[source] anyhow::Error),
}

/// A stock decrement that did not go through. Operator-facing only; the
/// customer still sees a successful submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockWarning {
    pub product_id: Uuid,
    pub quantity: u32,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Completed,
    CompletedWithStockWarnings,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmissionReceipt {
    pub order_id: Uuid,
    pub payment_slip_url: String,
    pub total_price: i64,
    pub stock_warnings: Vec<StockWarning>,
}

impl SubmissionReceipt {
    pub fn outcome(&self) -> SubmissionOutcome {
        if self.stock_warnings.is_empty() {
            SubmissionOutcome::Completed
        } else {
            SubmissionOutcome::CompletedWithStockWarnings
        }
    }
}

fn validate(request: &SubmissionRequest) -> Result<(), ValidationError> {
    let customer = &request.customer;
    for (field, value) in [
        ("name", &customer.name),
        ("phone", &customer.phone),
        ("address", &customer.address),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingCustomerField(field));
        }
    }
    if request.lines.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    let slip = request
        .slip
        .as_ref()
        .ok_or(ValidationError::MissingPaymentSlip)?;
    media::check_image_upload(&slip.content_type, slip.bytes.len())?;
    Ok(())
}

/// Run one order submission end to end.
///
/// No side effect happens before validation passes: a bad request uploads
/// nothing and records nothing.
pub async fn submit_order<S, O, C>(
    slips: &S,
    orders: &O,
    catalog: &C,
    request: SubmissionRequest,
) -> Result<SubmissionReceipt, SubmissionError>
where
    S: SlipStorage,
    O: OrderSink,
    C: StockSource,
{
    validate(&request)?;
    let Some(slip) = request.slip.as_ref() else {
        return Err(ValidationError::MissingPaymentSlip.into());
    };

    let hint = media::destination_hint("payment-slips", &slip.file_name);
    let payment_slip_url = slips
        .upload(&slip.bytes, &hint)
        .await
        .map_err(SubmissionError::Upload)?;

    let total_price = request.lines.iter().map(CartLine::line_total).sum();
    let draft = OrderDraft {
        customer: request.customer.clone(),
        items: request.lines.clone(),
        total_price,
        payment_slip_url: payment_slip_url.clone(),
    };
    let order_id = orders
        .create_order(&draft)
        .await
        .map_err(SubmissionError::OrderCreate)?;

    // The order is placed; from here on nothing fails the submission.
    let mut stock_warnings = Vec::new();
    for line in &request.lines {
        match catalog.decrease_stock(line.product_id, line.quantity).await {
            Ok(new_stock) => {
                tracing::debug!(product_id = %line.product_id, new_stock, "stock decreased");
            }
            Err(err) => {
                tracing::warn!(
                    order_id = %order_id,
                    product_id = %line.product_id,
                    error = %err,
                    "stock decrement failed after order creation"
                );
                stock_warnings.push(StockWarning {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    detail: err.to_string(),
                });
            }
        }
    }

    Ok(SubmissionReceipt {
        order_id,
        payment_slip_url,
        total_price,
        stock_warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSlips {
        uploads: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingSlips {
        fn new(fail: bool) -> Self {
            Self {
                uploads: Mutex::new(Vec::new()),
                fail,
            }
        }

        fn upload_count(&self) -> usize {
            self.uploads.lock().unwrap().len()
        }
    }

    impl SlipStorage for RecordingSlips {
        async fn upload(&self, _bytes: &[u8], hint: &str) -> anyhow::Result<String> {
            if self.fail {
                anyhow::bail!("storage unreachable");
            }
            self.uploads.lock().unwrap().push(hint.to_string());
            Ok(format!("/media/{hint}"))
        }
    }

    struct RecordingOrders {
        drafts: Mutex<Vec<OrderDraft>>,
        fail: bool,
    }

    impl RecordingOrders {
        fn new(fail: bool) -> Self {
            Self {
                drafts: Mutex::new(Vec::new()),
                fail,
            }
        }

        fn created(&self) -> usize {
            self.drafts.lock().unwrap().len()
        }
    }

    impl OrderSink for RecordingOrders {
        async fn create_order(&self, draft: &OrderDraft) -> anyhow::Result<Uuid> {
            if self.fail {
                anyhow::bail!("order store down");
            }
            self.drafts.lock().unwrap().push(draft.clone());
            Ok(Uuid::new_v4())
        }
    }

    struct FlakyStock {
        /// product ids whose decrement should fail
        broken: Vec<Uuid>,
        calls: Mutex<Vec<Uuid>>,
    }

    impl FlakyStock {
        fn new(broken: Vec<Uuid>) -> Self {
            Self {
                broken,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl StockSource for FlakyStock {
        async fn decrease_stock(&self, product_id: Uuid, _quantity: u32) -> anyhow::Result<i32> {
            self.calls.lock().unwrap().push(product_id);
            if self.broken.contains(&product_id) {
                anyhow::bail!("catalog rejected decrement");
            }
            Ok(3)
        }
    }

    fn line(price: i64, quantity: u32) -> CartLine {
        CartLine {
            product_id: Uuid::new_v4(),
            name: "Perfume".into(),
            unit_price: price,
            quantity,
        }
    }

    fn request(lines: Vec<CartLine>) -> SubmissionRequest {
        SubmissionRequest {
            customer: Customer {
                name: "Nok".into(),
                phone: "0812345678".into(),
                address: "99 Sukhumvit Rd, Bangkok".into(),
                note: None,
            },
            lines,
            slip: Some(SlipUpload {
                bytes: vec![0u8; 128],
                content_type: "image/jpeg".into(),
                file_name: "slip.jpg".into(),
            }),
        }
    }

    #[tokio::test]
    async fn happy_path_reports_clean_outcome() {
        let slips = RecordingSlips::new(false);
        let orders = RecordingOrders::new(false);
        let stock = FlakyStock::new(vec![]);

        let lines = vec![line(100, 2), line(50, 1)];
        let receipt = submit_order(&slips, &orders, &stock, request(lines))
            .await
            .unwrap();

        assert_eq!(receipt.total_price, 250);
        assert_eq!(receipt.outcome(), SubmissionOutcome::Completed);
        assert!(receipt.payment_slip_url.starts_with("/media/payment-slips/"));
        assert_eq!(orders.created(), 1);
        assert_eq!(stock.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_address_fails_before_any_side_effect() {
        let slips = RecordingSlips::new(false);
        let orders = RecordingOrders::new(false);
        let stock = FlakyStock::new(vec![]);

        let mut req = request(vec![line(100, 1)]);
        req.customer.address = "   ".into();

        let err = submit_order(&slips, &orders, &stock, req).await.unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Validation(ValidationError::MissingCustomerField("address"))
        ));
        assert_eq!(slips.upload_count(), 0);
        assert_eq!(orders.created(), 0);
        assert!(stock.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_cart_and_missing_slip_are_distinct_errors() {
        let slips = RecordingSlips::new(false);
        let orders = RecordingOrders::new(false);
        let stock = FlakyStock::new(vec![]);

        let err = submit_order(&slips, &orders, &stock, request(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Validation(ValidationError::EmptyCart)
        ));

        let mut req = request(vec![line(100, 1)]);
        req.slip = None;
        let err = submit_order(&slips, &orders, &stock, req).await.unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Validation(ValidationError::MissingPaymentSlip)
        ));
        assert_eq!(orders.created(), 0);
    }

    #[tokio::test]
    async fn oversized_or_wrong_type_slip_is_rejected_up_front() {
        let slips = RecordingSlips::new(false);
        let orders = RecordingOrders::new(false);
        let stock = FlakyStock::new(vec![]);

        let mut req = request(vec![line(100, 1)]);
        if let Some(slip) = req.slip.as_mut() {
            slip.content_type = "application/pdf".into();
        }
        let err = submit_order(&slips, &orders, &stock, req).await.unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Validation(ValidationError::Slip(_))
        ));
        assert_eq!(slips.upload_count(), 0);
    }

    #[tokio::test]
    async fn upload_failure_aborts_the_whole_submission() {
        let slips = RecordingSlips::new(true);
        let orders = RecordingOrders::new(false);
        let stock = FlakyStock::new(vec![]);

        let err = submit_order(&slips, &orders, &stock, request(vec![line(100, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Upload(_)));
        assert_eq!(orders.created(), 0);
        assert!(stock.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn order_store_failure_leaves_stock_untouched() {
        let slips = RecordingSlips::new(false);
        let orders = RecordingOrders::new(true);
        let stock = FlakyStock::new(vec![]);

        let err = submit_order(&slips, &orders, &stock, request(vec![line(100, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::OrderCreate(_)));
        assert!(stock.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stock_failure_is_a_warning_not_a_failure() {
        let slips = RecordingSlips::new(false);
        let orders = RecordingOrders::new(false);

        let good = line(100, 2);
        let bad = line(50, 1);
        let stock = FlakyStock::new(vec![bad.product_id]);

        let receipt = submit_order(&slips, &orders, &stock, request(vec![good, bad.clone()]))
            .await
            .unwrap();

        assert_eq!(
            receipt.outcome(),
            SubmissionOutcome::CompletedWithStockWarnings
        );
        assert_eq!(receipt.stock_warnings.len(), 1);
        assert_eq!(receipt.stock_warnings[0].product_id, bad.product_id);
        assert_eq!(orders.created(), 1);
        // the failing line did not stop the attempt list
        assert_eq!(stock.calls.lock().unwrap().len(), 2);
    }
}
