//! Customer-facing flow without a database: build a cart the way the cart
//! endpoints do, then push it through order submission against in-memory
//! collaborators and a real on-disk media store.

use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use perfume_shop_api::{
    cart::CartStore,
    checkout::{
        OrderDraft, OrderSink, StockSource, SlipUpload, SubmissionError, SubmissionOutcome,
        SubmissionRequest, ValidationError, submit_order,
    },
    media::FsMediaStore,
    models::{Customer, Product},
};

struct MemoryOrders {
    drafts: Mutex<Vec<OrderDraft>>,
}

impl MemoryOrders {
    fn new() -> Self {
        Self {
            drafts: Mutex::new(Vec::new()),
        }
    }
}

impl OrderSink for MemoryOrders {
    async fn create_order(&self, draft: &OrderDraft) -> anyhow::Result<Uuid> {
        self.drafts.lock().unwrap().push(draft.clone());
        Ok(Uuid::new_v4())
    }
}

struct MemoryStock {
    calls: Mutex<Vec<(Uuid, u32)>>,
}

impl MemoryStock {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl StockSource for MemoryStock {
    async fn decrease_stock(&self, product_id: Uuid, quantity: u32) -> anyhow::Result<i32> {
        self.calls.lock().unwrap().push((product_id, quantity));
        Ok(1)
    }
}

fn product(name: &str, price: i64, stock: i32) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        price,
        volume: Some("100ml".to_string()),
        notes: None,
        image_url: None,
        stock,
        created_at: Utc::now(),
    }
}

fn customer() -> Customer {
    Customer {
        name: "Nok".into(),
        phone: "0812345678".into(),
        address: "99 Sukhumvit Rd, Bangkok".into(),
        note: Some("leave at the gate".into()),
    }
}

fn slip() -> SlipUpload {
    SlipUpload {
        bytes: vec![0xAB; 2048],
        content_type: "image/png".into(),
        file_name: "transfer receipt.png".into(),
    }
}

fn temp_media() -> (FsMediaStore, std::path::PathBuf) {
    let dir = std::env::temp_dir().join(format!("slips-{}", Uuid::new_v4()));
    (FsMediaStore::new(&dir, "/media"), dir)
}

#[tokio::test]
async fn cart_to_receipt_round_trip() {
    let (media, dir) = temp_media();
    let orders = MemoryOrders::new();
    let stock = MemoryStock::new();

    let green = product("Coach Green", 239_000, 12);
    let omnia = product("BVLGARI Omnia Amethyste", 329_000, 8);

    // Two adds of the same product merge into one line.
    let mut cart = CartStore::new();
    cart.add_item(&green);
    cart.add_item(&green);
    cart.add_item(&omnia);
    assert_eq!(cart.total_items(), 3);

    // Quantities arrive as strings from the client and are truncated.
    cart.update_quantity(omnia.id, "2.9");
    assert_eq!(cart.total_items(), 4);
    assert_eq!(cart.total_price(), 2 * 239_000 + 2 * 329_000);

    let receipt = submit_order(
        &media,
        &orders,
        &stock,
        SubmissionRequest {
            customer: customer(),
            lines: cart.lines().to_vec(),
            slip: Some(slip()),
        },
    )
    .await
    .unwrap();

    assert_eq!(receipt.outcome(), SubmissionOutcome::Completed);
    assert_eq!(receipt.total_price, cart.total_price());

    // The slip landed on disk under the public URL the receipt reports.
    let relative = receipt
        .payment_slip_url
        .strip_prefix("/media/")
        .expect("public url");
    let on_disk = tokio::fs::read(dir.join(relative)).await.unwrap();
    assert_eq!(on_disk.len(), 2048);

    // The draft snapshots the cart lines verbatim.
    let drafts = orders.drafts.lock().unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].items, cart.lines().to_vec());
    assert_eq!(drafts[0].customer.note.as_deref(), Some("leave at the gate"));

    // Every line got a stock decrement, in cart order.
    let calls = stock.calls.lock().unwrap();
    assert_eq!(calls.as_slice(), &[(green.id, 2), (omnia.id, 2)]);
    drop(calls);

    tokio::fs::remove_dir_all(&dir).await.ok();
}

#[tokio::test]
async fn snapshot_survives_persistence_and_rejects_garbage_quantities() {
    let green = product("Coach Green", 239_000, 12);

    let mut cart = CartStore::new();
    cart.add_item(&green);
    cart.update_quantity(green.id, "3");

    // Round-trip through the JSON snapshot the way the session store does.
    let restored = CartStore::from_snapshot(&cart.snapshot().to_string());
    assert_eq!(restored.lines(), cart.lines());

    // Garbage input leaves the restored cart untouched.
    let mut restored = restored;
    for raw in ["-2", "0", "abc", "NaN", ""] {
        restored.update_quantity(green.id, raw);
    }
    assert_eq!(restored.total_items(), 3);
}

#[tokio::test]
async fn empty_cart_never_reaches_the_media_store() {
    let (media, dir) = temp_media();
    let orders = MemoryOrders::new();
    let stock = MemoryStock::new();

    let err = submit_order(
        &media,
        &orders,
        &stock,
        SubmissionRequest {
            customer: customer(),
            lines: vec![],
            slip: Some(slip()),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        SubmissionError::Validation(ValidationError::EmptyCart)
    ));
    assert!(orders.drafts.lock().unwrap().is_empty());
    // Nothing was written; the directory was never created.
    assert!(tokio::fs::metadata(&dir).await.is_err());
}

#[tokio::test]
async fn out_of_stock_products_cannot_be_added() {
    let sold_out = product("Chanel Chance Eau Fraiche", 399_000, 0);

    let mut cart = CartStore::new();
    cart.add_item(&sold_out);

    assert!(cart.is_empty());
}
