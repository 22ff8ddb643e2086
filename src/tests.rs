use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;
use serde_json::json;

use crate::app::open_dataset_grid;
use crate::config::GridConfig;
use crate::domain::entities::dataset::DatasetId;
use crate::domain::entities::grid::{ColumnFilter, ColumnSort, Pagination, Query};
use crate::infra::import::csv::import_csv_to_sqlite;
use crate::infra::import::xlsx::import_xlsx_sheets_to_sqlite;
use crate::infra::sqlite::queries::{create_dataset_from_rows, list_datasets, query_page};
use crate::infra::sqlite::repo::{DatasetSource, SqliteRepo};
use crate::infra::sqlite::schema::init_db;
use crate::platform::desktop::blocking::fetch_in_background;
use crate::usecase::ports::delivery::{DeliveryError, FileDelivery};
use crate::usecase::ports::report::CollectingReporter;
use crate::usecase::ports::source::DataSource;
use crate::usecase::ports::store::KeyValueStore;
use crate::usecase::services::grid_controller::{FetchOutcome, GridStatus};
use crate::usecase::services::import_service::ImportService;

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("record-grid-{prefix}-{nanos}"))
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn people_dataset(db_path: &std::path::Path) -> DatasetId {
    create_dataset_from_rows(
        db_path,
        "people",
        "people.csv",
        &strings(&["name", "city", "age"]),
        &[
            strings(&["Ada", "London", "36"]),
            strings(&["Grace", "New York", "45"]),
            strings(&["Linus", "Helsinki", "28"]),
            strings(&["Alan", "London", "41"]),
            strings(&["Edsger", "Rotterdam", "52"]),
        ],
    )
    .expect("dataset should be created")
}

fn query(page_index: usize, page_size: usize) -> Query {
    Query {
        pagination: Pagination {
            page_index,
            page_size,
        },
        sorting: Vec::new(),
        column_filters: Vec::new(),
        global_filter: String::new(),
    }
}

fn names(page: &crate::domain::entities::grid::PageResult) -> Vec<String> {
    page.rows
        .iter()
        .map(|row| row["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[derive(Default)]
struct CapturedFile {
    files: RefCell<Vec<(Vec<u8>, String)>>,
}

impl FileDelivery for CapturedFile {
    fn deliver(&self, payload: &[u8], _mime: &str, filename: &str) -> Result<(), DeliveryError> {
        self.files
            .borrow_mut()
            .push((payload.to_vec(), filename.to_string()));
        Ok(())
    }
}

struct CancelledDialog;

impl FileDelivery for CancelledDialog {
    fn deliver(&self, _payload: &[u8], _mime: &str, _filename: &str) -> Result<(), DeliveryError> {
        Err(DeliveryError::Cancelled)
    }
}

#[test]
fn init_db_creates_required_tables() {
    let temp_dir = unique_test_dir("init-db");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");

    let result = init_db(&db_path);

    assert!(result.is_ok(), "init_db should succeed: {result:?}");

    let conn = Connection::open(&db_path).expect("should open sqlite db");
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('dataset','column_name','cell','preference')",
            [],
            |row| row.get(0),
        )
        .expect("table count query should succeed");

    assert_eq!(table_count, 4, "required tables should exist");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn query_page_pages_through_rows_in_import_order() {
    let temp_dir = unique_test_dir("query-paging");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");
    let dataset_id = people_dataset(&db_path);

    let first = query_page(&db_path, dataset_id.0, &query(0, 2)).expect("first page");
    let last = query_page(&db_path, dataset_id.0, &query(2, 2)).expect("last page");
    let beyond = query_page(&db_path, dataset_id.0, &query(9, 2)).expect("beyond last page");

    assert_eq!(names(&first), vec!["Ada", "Grace"]);
    assert_eq!(first.page_count, 3);
    assert_eq!(first.total_row_count, 5);
    assert_eq!(names(&last), vec!["Edsger"]);
    assert!(beyond.rows.is_empty());
    assert_eq!(beyond.page_count, 3);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn query_page_applies_filters_and_multi_sort() {
    let temp_dir = unique_test_dir("query-filters");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");
    let dataset_id = people_dataset(&db_path);

    let mut by_city = query(0, 10);
    by_city.sorting = vec![ColumnSort::asc("city"), ColumnSort::desc("age")];
    let sorted = query_page(&db_path, dataset_id.0, &by_city).expect("sorted page");
    assert_eq!(
        names(&sorted),
        vec!["Linus", "Alan", "Ada", "Grace", "Edsger"]
    );

    let mut filtered = query(0, 10);
    filtered.column_filters = vec![ColumnFilter::new("city", "lond")];
    filtered.global_filter = "a".to_string();
    let page = query_page(&db_path, dataset_id.0, &filtered).expect("filtered page");
    assert_eq!(names(&page), vec!["Ada", "Alan"]);
    assert_eq!(page.total_row_count, 2);
    assert_eq!(page.page_count, 1);

    let mut unknown = query(0, 10);
    unknown.sorting = vec![ColumnSort::asc("missing")];
    unknown.column_filters = vec![ColumnFilter::new("missing", "x")];
    let page = query_page(&db_path, dataset_id.0, &unknown).expect("unknown columns are ignored");
    assert_eq!(page.total_row_count, 5);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn query_page_returns_records_keyed_by_column_name() {
    let temp_dir = unique_test_dir("query-records");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");
    let dataset_id = people_dataset(&db_path);

    let page = query_page(&db_path, dataset_id.0, &query(0, 1)).expect("page");

    assert_eq!(
        serde_json::Value::Object(page.rows[0].clone()),
        json!({"name": "Ada", "city": "London", "age": "36"})
    );

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn query_page_rejects_zero_page_size() {
    let temp_dir = unique_test_dir("query-zero");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");
    let dataset_id = people_dataset(&db_path);

    let result = query_page(&db_path, dataset_id.0, &query(0, 0));

    assert!(result.is_err());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn query_page_matches_wildcards_literally() {
    let temp_dir = unique_test_dir("query-wildcards");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");
    let dataset_id = create_dataset_from_rows(
        &db_path,
        "discounts",
        "discounts.csv",
        &strings(&["name", "code"]),
        &[
            strings(&["half", "50% off"]),
            strings(&["tenth", "10 off"]),
            strings(&["snake", "a_b"]),
            strings(&["plain", "axb"]),
            strings(&["path", "c:\\tmp"]),
        ],
    )
    .expect("dataset should be created");

    let mut percent = query(0, 10);
    percent.global_filter = "%".to_string();
    let mut underscore = query(0, 10);
    underscore.column_filters = vec![ColumnFilter::new("code", "a_b")];
    let mut backslash = query(0, 10);
    backslash.column_filters = vec![ColumnFilter::new("code", "\\")];

    let percent = query_page(&db_path, dataset_id.0, &percent).expect("percent search");
    let underscore = query_page(&db_path, dataset_id.0, &underscore).expect("underscore filter");
    let backslash = query_page(&db_path, dataset_id.0, &backslash).expect("backslash filter");

    assert_eq!(names(&percent), vec!["half"]);
    assert_eq!(names(&underscore), vec!["snake"]);
    assert_eq!(names(&backslash), vec!["path"]);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn import_csv_creates_dataset_and_cells() {
    let temp_dir = unique_test_dir("import-csv");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");
    let csv_path = temp_dir.join("orders.csv");
    fs::write(&csv_path, "\u{feff}id,item\n1,apple\n2,\"pear, green\"\n3\n")
        .expect("should write csv");

    let result = import_csv_to_sqlite(&db_path, &csv_path).expect("csv import should succeed");

    assert_eq!(result.row_count, 3);
    let datasets = list_datasets(&db_path).expect("should list datasets");
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].name, "orders");

    let page = query_page(&db_path, result.dataset_id.0, &query(0, 10)).expect("page");
    assert_eq!(page.rows[1]["item"], json!("pear, green"));
    assert_eq!(page.rows[2]["item"], json!(""));
    assert!(page.rows[0].contains_key("id"));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn import_xlsx_creates_one_dataset_per_sheet() {
    let temp_dir = unique_test_dir("import-xlsx");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");
    let xlsx_path = temp_dir.join("book.xlsx");

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Stock").expect("sheet name should be valid");
    sheet.write_string(0, 0, "sku").expect("should write header");
    sheet.write_string(0, 1, "qty").expect("should write header");
    sheet.write_string(1, 0, "A-1").expect("should write cell");
    sheet.write_number(1, 1, 12.0).expect("should write cell");
    let empty = workbook.add_worksheet();
    empty.set_name("Empty").expect("sheet name should be valid");
    workbook.save(&xlsx_path).expect("should save workbook");

    let results =
        import_xlsx_sheets_to_sqlite(&db_path, &xlsx_path).expect("xlsx import should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].row_count, 1);
    let page = query_page(&db_path, results[0].dataset_id.0, &query(0, 10)).expect("page");
    assert_eq!(page.rows[0]["sku"], json!("A-1"));
    assert_eq!(page.rows[0]["qty"], json!("12"));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn import_service_rejects_unknown_extension() {
    let temp_dir = unique_test_dir("import-unknown");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let service = ImportService::new(temp_dir.join("app.sqlite"));

    let result = service.import_path(&temp_dir.join("notes.txt"));

    assert!(result.is_err());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn sqlite_repo_stores_preferences() {
    let temp_dir = unique_test_dir("preference-store");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let repo = SqliteRepo::new(temp_dir.join("app.sqlite"));

    assert_eq!(repo.get("k").expect("should read"), None);
    repo.set("k", "one").expect("should write");
    repo.set("k", "two").expect("should overwrite");
    assert_eq!(repo.get("k").expect("should read"), Some("two".to_string()));
    repo.remove("k").expect("should remove");
    repo.remove("k").expect("second remove should be a no-op");
    assert_eq!(repo.get("k").expect("should read"), None);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn dataset_source_serves_grid_queries() {
    let temp_dir = unique_test_dir("dataset-source");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let repo = Arc::new(SqliteRepo::new(temp_dir.join("app.sqlite")));
    let dataset_id = people_dataset(&repo.db_path);
    let source = DatasetSource::new(repo.clone(), dataset_id);

    let page = source.fetch(&query(1, 2)).expect("fetch should succeed");
    let missing = DatasetSource::new(repo, dataset_id)
        .fetch(&query(0, 0))
        .expect_err("zero page size should fail");

    assert_eq!(names(&page), vec!["Linus", "Alan"]);
    assert!(missing.to_string().contains("page_size"));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn dataset_grid_round_trips_layout_through_sqlite() {
    let temp_dir = unique_test_dir("dataset-grid");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let repo = Arc::new(SqliteRepo::new(temp_dir.join("app.sqlite")));
    let dataset_id = people_dataset(&repo.db_path);
    let reporter = Arc::new(CollectingReporter::new());
    let config = GridConfig {
        page_size: 2,
        ..GridConfig::default()
    };

    let (mut grid, source, initial) =
        open_dataset_grid(&repo, reporter.clone(), dataset_id, config.clone())
            .expect("grid should open");
    grid.drive(Some(initial), &source);
    assert_eq!(grid.status(), GridStatus::Ready);
    assert_eq!(grid.page_count(), Some(3));

    let request = grid.set_column_filter("city", "London");
    grid.drive(request, &source);
    assert_eq!(grid.total_row_count(), 2);
    let request = grid.toggle_sorting("age", false);
    grid.drive(request, &source);
    assert_eq!(grid.rows()[0]["name"], json!("Ada"));
    assert!(grid.save_preferences());

    let (mut reopened, source, initial) =
        open_dataset_grid(&repo, reporter.clone(), dataset_id, config).expect("grid should reopen");
    assert_eq!(initial.query.column_filters, vec![ColumnFilter::new("city", "London")]);
    reopened.drive(Some(initial), &source);
    assert_eq!(
        reopened.state().column_filters,
        vec![ColumnFilter::new("city", "London")]
    );
    assert_eq!(reopened.total_row_count(), 2);
    assert!(reporter.messages().is_empty());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn dataset_grid_exports_visible_page() {
    let temp_dir = unique_test_dir("dataset-export");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let repo = Arc::new(SqliteRepo::new(temp_dir.join("app.sqlite")));
    let dataset_id = people_dataset(&repo.db_path);
    let reporter = Arc::new(CollectingReporter::new());
    let config = GridConfig {
        page_size: 2,
        ..GridConfig::default()
    };
    let (mut grid, source, initial) =
        open_dataset_grid(&repo, reporter.clone(), dataset_id, config).expect("grid should open");
    grid.drive(Some(initial), &source);
    grid.toggle_column_visibility("age");
    let delivery = CapturedFile::default();

    assert!(grid.export_csv(&delivery));
    assert!(!grid.export_xlsx(&CancelledDialog));

    let files = delivery.files.borrow();
    let (payload, filename) = &files[0];
    assert_eq!(filename, &format!("dataset_{}.csv", dataset_id.0));
    let text = String::from_utf8(payload.clone()).expect("csv should be utf-8");
    assert_eq!(
        text,
        "\u{feff}\"name\",\"city\"\n\"Ada\",\"London\"\n\"Grace\",\"New York\"\n"
    );
    assert!(reporter.messages().is_empty(), "cancellation is not an error");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[tokio::test]
async fn background_fetches_settle_on_the_latest_request() {
    let temp_dir = unique_test_dir("dataset-background");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let repo = Arc::new(SqliteRepo::new(temp_dir.join("app.sqlite")));
    let dataset_id = people_dataset(&repo.db_path);
    let reporter = Arc::new(CollectingReporter::new());
    let (mut grid, source, initial) =
        open_dataset_grid(&repo, reporter.clone(), dataset_id, GridConfig::default())
            .expect("grid should open");
    let london = grid.set_global_filter("London").expect("search should fetch");
    let helsinki = grid.set_global_filter("Helsinki").expect("search should fetch");

    let initial_result = fetch_in_background(source.clone(), initial.query.clone()).await;
    let london_result = fetch_in_background(source.clone(), london.query.clone()).await;
    let helsinki_result = fetch_in_background(source.clone(), helsinki.query.clone()).await;

    assert_eq!(grid.complete(helsinki.seq, helsinki_result), FetchOutcome::Applied);
    assert_eq!(grid.complete(london.seq, london_result), FetchOutcome::Stale);
    assert_eq!(grid.complete(initial.seq, initial_result), FetchOutcome::Stale);
    assert!(!grid.is_loading());
    assert_eq!(grid.total_row_count(), 1);
    assert_eq!(grid.rows()[0]["name"], json!("Linus"));
    assert!(reporter.messages().is_empty());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}
