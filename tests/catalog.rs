mod common;

use encoding_rs::UTF_8;
use unicode_normalization::UnicodeNormalization;
use qc_report::{
    catalog::{Catalogs, discover_documents},
    error::CatalogError,
    io_utils::{LoadOptions, discover_datasets},
};

use common::TestWorkspace;

fn write_catalogs(workspace: &TestWorkspace) {
    workspace.write_document(
        "01_테이블정의서.csv",
        "스키마명,테이블 영문명,테이블 한글명",
        &["SALES,ORDERS,주문", "SALES,CUSTOMERS,고객"],
    );
    workspace.write_document(
        "02_컬럼정의서.csv",
        "테이블 영문명,컬럼 영문명,컬럼 한글명,\"데이터\n타입\",코드대분류",
        &[
            "ORDERS,ORDER_ID,주문번호,INT,",
            "ORDERS,STATUS,주문상태,VARCHAR(2),ORD_STAT",
        ],
    );
    workspace.write_document(
        "03_코드정의서.csv",
        "코드 대분류,코드값",
        &["ORD_STAT,OK", "ORD_STAT,CX", "ORD_STAT,", "PAY,CARD"],
    );
}

#[test]
fn documents_are_found_by_file_name_keyword() {
    let workspace = TestWorkspace::new();
    write_catalogs(&workspace);
    workspace.write("documents/notes.txt", "not a catalog");

    let documents = discover_documents(&workspace.docs_dir(), UTF_8).unwrap();
    assert!(documents.table.is_some());
    assert!(documents.column.is_some());
    assert!(documents.code.is_some());
    let column = documents.column.as_ref().unwrap();
    assert!(column.headers.iter().any(|h| h == "데이터 타입"));
}

#[test]
fn catalogs_resolve_tables_columns_and_codes() {
    let workspace = TestWorkspace::new();
    write_catalogs(&workspace);
    let documents = discover_documents(&workspace.docs_dir(), UTF_8).unwrap();
    let catalogs = Catalogs::load(&documents).unwrap();

    let orders = catalogs.resolve_table("ORDERS");
    assert!(orders.found);
    assert_eq!(orders.schema.as_deref(), Some("SALES"));
    assert_eq!(orders.korean_name.as_deref(), Some("주문"));
    assert!(!catalogs.resolve_table("UNKNOWN").found);

    let status = catalogs.resolve_column("ORDERS", "status");
    assert_eq!(status.english_name, "status");
    assert_eq!(status.korean_name.as_deref(), Some("주문상태"));
    assert_eq!(status.declared_type.as_deref(), Some("VARCHAR(2)"));
    let codes = status.defined_codes.unwrap();
    assert_eq!(codes.into_iter().collect::<Vec<_>>(), vec!["CX", "OK"]);

    let order_id = catalogs.resolve_column("ORDERS", "order_id");
    assert_eq!(order_id.code_group, None);
    assert_eq!(order_id.defined_codes, None);

    let missing = catalogs.resolve_column("ORDERS", "created_at");
    assert_eq!(missing.english_name, "created_at");
    assert_eq!(missing.korean_name, None);
    assert_eq!(missing.declared_type, None);
}

#[test]
fn decomposed_hangul_file_names_still_match() {
    let workspace = TestWorkspace::new();
    let decomposed = "02_컬럼정의서.csv".nfd().collect::<String>();
    assert_ne!(decomposed, "02_컬럼정의서.csv");
    workspace.write_document(
        &decomposed,
        "테이블 영문명,컬럼 영문명,컬럼 한글명,데이터 타입,코드대분류",
        &["ORDERS,ID,번호,INT,"],
    );
    let documents = discover_documents(&workspace.docs_dir(), UTF_8).unwrap();
    assert!(documents.column.is_some());
    let catalogs = Catalogs::load(&documents).unwrap();
    assert_eq!(
        catalogs.resolve_column("ORDERS", "id").korean_name.as_deref(),
        Some("번호")
    );

    let table = "주문".nfd().collect::<String>();
    workspace.write_dataset(&format!("{table}.csv"), "id\n1\n");
    let datasets = discover_datasets(&workspace.data_dir(), &LoadOptions::default()).unwrap();
    assert_eq!(datasets[0].name, "주문");
}

#[test]
fn missing_document_directory_means_no_catalogs() {
    let workspace = TestWorkspace::new();
    let documents = discover_documents(&workspace.docs_dir(), UTF_8).unwrap();
    let catalogs = Catalogs::load(&documents).unwrap();
    let record = catalogs.resolve_column("ORDERS", "id");
    assert_eq!(record.english_name, "id");
    assert_eq!(record.defined_codes, None);
}

#[test]
fn malformed_column_catalog_is_fatal() {
    let workspace = TestWorkspace::new();
    workspace.write_document(
        "컬럼정의서.csv",
        "테이블 영문명,컬럼 영문명,컬럼 한글명",
        &["ORDERS,ID,번호"],
    );
    let documents = discover_documents(&workspace.docs_dir(), UTF_8).unwrap();
    let err = Catalogs::load(&documents).unwrap_err();
    match err {
        CatalogError::MissingColumn { column, .. } => assert_eq!(column, "데이터 타입"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn datasets_load_in_file_name_order_with_upper_case_names() {
    let workspace = TestWorkspace::new();
    workspace.write_dataset("orders.csv", "id,status\n1,OK\n2,CX\n");
    workspace.write_dataset("customers.tsv", "id\tname\n1\tKim\n");
    workspace.write_dataset(".hidden.csv", "a\n1\n");
    workspace.write_dataset("readme.md", "# not data");

    let datasets = discover_datasets(&workspace.data_dir(), &LoadOptions::default()).unwrap();
    let names = datasets.iter().map(|d| d.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["CUSTOMERS", "ORDERS"]);
    assert_eq!(datasets[0].column_names(), vec!["id", "name"]);
    assert_eq!(datasets[1].row_count(), 2);
}
