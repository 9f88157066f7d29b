use budget_tracker::budget::{add_category, set_salary};
use budget_tracker::models::{Frequency, TransactionRequest};
use budget_tracker::recurring::add_recurring;
use budget_tracker::{ApiClient, BudgetData, BudgetError, ClientError};
use chrono::{Duration as Days, Local};
use once_cell::sync::Lazy;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("budget_tracker_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(client: &ApiClient) {
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if client.load().await.is_ok() {
            return;
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_budget_tracker"))
        .env("PORT", port.to_string())
        .env("BIND_ADDR", "127.0.0.1")
        .env("APP_DATA_PATH", unique_data_path())
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&ApiClient::new(base_url.clone())).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

/// Resets the server to a record with a salary and two categories.
async fn seeded_client() -> ApiClient {
    let server = shared_server().await;
    let client = ApiClient::new(server.base_url.clone());

    let mut data = BudgetData::default();
    set_salary(&mut data, 3000.0).unwrap();
    add_category(&mut data, "food", "Food", 400.0, None).unwrap();
    add_category(&mut data, "rent", "Rent", 1200.0, None).unwrap();
    client.save(&data).await.unwrap();
    client
}

#[tokio::test]
async fn http_add_transaction_updates_category_spent() {
    let _guard = TEST_LOCK.lock().await;
    let client = seeded_client().await;

    let tx = client
        .add_transaction(&TransactionRequest::new("food", 12.5, "lunch"))
        .await
        .unwrap();

    let data = client.load().await.unwrap();
    assert_eq!(data.transactions, vec![tx.clone()]);
    assert_eq!(data.categories["food"].spent, 12.5);
    assert_eq!(tx.date, Local::now().date_naive().to_string());
}

#[tokio::test]
async fn http_edit_and_delete_keep_totals_consistent() {
    let _guard = TEST_LOCK.lock().await;
    let client = seeded_client().await;

    let tx = client
        .add_transaction(&TransactionRequest::new("food", 40.0, "groceries"))
        .await
        .unwrap();
    let moved = client
        .update_transaction(tx.id, &TransactionRequest::new("rent", 45.5, "deposit"))
        .await
        .unwrap();
    assert_eq!(moved.id, tx.id);

    let data = client.load().await.unwrap();
    assert_eq!(data.categories["food"].spent, 0.0);
    assert_eq!(data.categories["rent"].spent, 45.5);

    client.delete_transaction(tx.id).await.unwrap();
    let data = client.load().await.unwrap();
    assert!(data.transactions.is_empty());
    assert_eq!(data.categories["rent"].spent, 0.0);
}

#[tokio::test]
async fn http_rejects_invalid_transactions() {
    let _guard = TEST_LOCK.lock().await;
    let client = seeded_client().await;

    let err = client
        .add_transaction(&TransactionRequest::new("food", 0.0, ""))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }));

    let err = client
        .add_transaction(&TransactionRequest::new("travel", 5.0, ""))
        .await
        .unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "category 'travel' does not exist");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = client.delete_transaction(999).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 404, .. }));

    assert!(client.load().await.unwrap().transactions.is_empty());
}

#[tokio::test]
async fn http_mutate_saves_wholesale() {
    let _guard = TEST_LOCK.lock().await;
    let client = seeded_client().await;

    client
        .mutate(|data| add_category(data, "fun", "Fun", 75.0, None).map(|_| ()))
        .await
        .unwrap();
    let err = client
        .mutate(|data| add_category(data, "fun", "Fun", 75.0, None).map(|_| ()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Budget(BudgetError::DuplicateCategory(_))
    ));

    let data = client.load().await.unwrap();
    assert_eq!(data.categories["fun"].budget, 75.0);
    assert_eq!(data.categories.len(), 3);
}

#[tokio::test]
async fn http_recurring_and_analytics() {
    let _guard = TEST_LOCK.lock().await;
    let client = seeded_client().await;
    let start = Local::now().date_naive() - Days::days(14);

    client
        .mutate(|data| add_recurring(data, "rent", 100.0, "storage", Frequency::Weekly, start))
        .await
        .unwrap();

    let generated = client.process_recurring().await.unwrap();
    assert_eq!(generated.len(), 3);
    assert!(client.process_recurring().await.unwrap().is_empty());

    let report = client.analytics().await.unwrap();
    assert_eq!(report.summary.total_spent, 300.0);
    assert_eq!(report.statistics.count, 3);
    assert_eq!(report.statistics.mean, 100.0);
    assert_eq!(report.last_7_days.len(), 7);
}

#[tokio::test]
async fn http_close_month_archives_transactions() {
    let _guard = TEST_LOCK.lock().await;
    let client = seeded_client().await;

    let mut request = TransactionRequest::new("food", 30.0, "old");
    request.date = Some("2025-11-20".into());
    client.add_transaction(&request).await.unwrap();

    let snapshot = client.close_month("2025-11").await.unwrap();
    assert_eq!(snapshot.total_spent, 30.0);
    assert_eq!(snapshot.transaction_count, 1);

    let err = client.close_month("2025-11").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 409, .. }));
    let err = client.close_month("november").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }));

    let data = client.load().await.unwrap();
    assert!(data.transactions.is_empty());
    assert_eq!(data.categories["food"].spent, 0.0);
    assert_eq!(data.monthly_history.len(), 1);
}

#[tokio::test]
async fn http_malformed_requests_get_json_errors() {
    let _guard = TEST_LOCK.lock().await;
    let client = seeded_client().await;
    let http = reqwest::Client::new();

    let bodies = [
        serde_json::json!({ "category": "food" }),
        serde_json::json!({ "category": "food", "amount": "5" }),
    ];
    for body in bodies {
        let response = http
            .post(format!("{}/api/transactions", client.base_url()))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    let response = http
        .delete(format!("{}/api/transactions/abc", client.base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    assert!(client.load().await.unwrap().transactions.is_empty());
}

#[tokio::test]
async fn http_drifted_save_is_accepted_and_reported() {
    let _guard = TEST_LOCK.lock().await;
    let client = seeded_client().await;

    client
        .add_transaction(&TransactionRequest::new("food", 30.0, "market"))
        .await
        .unwrap();
    assert!(client.integrity().await.unwrap().is_consistent());

    let mut data = client.load().await.unwrap();
    data.categories.get_mut("food").unwrap().spent = 99.0;
    client.save(&data).await.unwrap();

    let report = client.integrity().await.unwrap();
    assert_eq!(report.drifts.len(), 1);
    assert_eq!(report.drifts[0].category, "food");
    assert_eq!(report.drifts[0].recorded, 99.0);
    assert_eq!(report.drifts[0].actual, 30.0);
    assert!(report.orphaned_transactions.is_empty());
    assert_eq!(client.load().await.unwrap().categories["food"].spent, 99.0);
}

#[tokio::test]
async fn http_closed_month_rejects_backdated_transactions() {
    let _guard = TEST_LOCK.lock().await;
    let client = seeded_client().await;

    client.close_month("2025-10").await.unwrap();
    let mut request = TransactionRequest::new("food", 12.0, "late receipt");
    request.date = Some("2025-10-15".into());
    let err = client.add_transaction(&request).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 409, .. }));
    assert!(client.load().await.unwrap().transactions.is_empty());
}
