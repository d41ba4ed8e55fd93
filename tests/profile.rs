mod common;

use std::collections::BTreeSet;

use proptest::prelude::*;
use qc_report::{
    catalog::{CatalogDocuments, Catalogs, Document},
    data::Value,
    dataset::{Column, Dataset, StorageType},
    missing::MissingValueNormalizer,
    profile::{
        ALL_MISSING_REMARK, Annotation, ColumnKind, OTHER_BUCKET, TYPE_MISMATCH_REMARK,
    },
    table_profile::profile_table,
};

use common::{no_catalogs, text_dataset};

fn column_catalog(rows: &[[&str; 5]]) -> Document {
    Document::new(
        ["테이블 영문명", "컬럼 영문명", "컬럼 한글명", "데이터 타입", "코드대분류"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                    .collect()
            })
            .collect(),
    )
}

fn code_catalog(rows: &[(&str, &str)]) -> Document {
    Document::new(
        vec!["코드 대분류".to_string(), "코드값".to_string()],
        rows.iter()
            .map(|(group, code)| vec![Some(group.to_string()), Some(code.to_string())])
            .collect(),
    )
}

#[test]
fn six_distinct_values_truncate_the_category_list() {
    let dataset = text_dataset(
        "T",
        &[("grade", &["a", "b", "c", "d", "e", "f", "f", ""][..])],
    );
    let profile = profile_table(&dataset, &no_catalogs(), &BTreeSet::new(), 1);
    let column = &profile.columns[0];
    assert_eq!(column.kind, ColumnKind::Textual);
    assert_eq!(
        column.categorical.sample_categories,
        Some(vec![
            "a".to_string(),
            "b".to_string(),
            "...".to_string(),
            "e".to_string(),
            "f".to_string()
        ])
    );
    let proportions = column.categorical.category_proportions.clone().unwrap();
    let labels = proportions.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();
    assert_eq!(labels, vec!["a", "b", "c", "d", "e", OTHER_BUCKET]);
    let total = proportions.iter().map(|(_, r)| r).sum::<f64>();
    assert!((total - 1.0).abs() < 1e-9);
    assert_eq!(column.categorical.modes, Some(vec!["f".to_string()]));
    assert_eq!(
        column.categorical.mode_counts,
        Some(vec![("f".to_string(), 2)])
    );
}

#[test]
fn all_missing_column_gets_the_all_missing_remark() {
    let dataset = text_dataset(
        "T",
        &[("id", &["1", "2", "3"][..]), ("memo", &["", "", ""][..])],
    );
    let profile = profile_table(&dataset, &no_catalogs(), &BTreeSet::new(), 1);
    let memo = profile.column("memo").unwrap();
    assert_eq!(memo.remark(), Some(ALL_MISSING_REMARK));
    assert_eq!(memo.common.null_count, 3);
    assert_eq!(memo.common.loaded_count, 0);
    assert_eq!(profile.column("id").unwrap().annotation, Annotation::None);
}

#[test]
fn catalog_declared_numeric_over_text_is_flagged_not_raised() {
    let dataset = text_dataset(
        "ORDERS",
        &[
            ("amount", &["ten", "twenty"][..]),
            ("qty", &["1", "2"][..]),
        ],
    );
    let catalogs = Catalogs::load(&CatalogDocuments {
        column: Some(column_catalog(&[
            ["ORDERS", "AMOUNT", "금액", "NUMERIC(10,2)", ""],
            ["ORDERS", "QTY", "수량", "INT", ""],
        ])),
        ..CatalogDocuments::default()
    })
    .unwrap();
    let profile = profile_table(&dataset, &catalogs, &BTreeSet::new(), 1);
    let amount = profile.column("amount").unwrap();
    assert_eq!(amount.remark(), Some(TYPE_MISMATCH_REMARK));
    assert_eq!(amount.common.korean_name.as_deref(), Some("금액"));
    assert_eq!(amount.common.resolved_type, "NUMERIC(10,2)");
    let qty = profile.column("qty").unwrap();
    assert_eq!(qty.annotation, Annotation::None);
    assert_eq!(qty.continuous.mean, Some(1.5));
}

#[test]
fn displayed_categories_outside_the_code_set_are_reported() {
    let dataset = text_dataset("ORDERS", &[("status", &["A", "B", "C", "A"][..])]);
    let catalogs = Catalogs::load(&CatalogDocuments {
        column: Some(column_catalog(&[[
            "ORDERS", "STATUS", "상태", "VARCHAR(1)", "STATUS_CD",
        ]])),
        code: Some(code_catalog(&[("STATUS_CD", "A"), ("STATUS_CD", "B")])),
        ..CatalogDocuments::default()
    })
    .unwrap();
    let profile = profile_table(&dataset, &catalogs, &BTreeSet::new(), 1);
    let status = profile.column("status").unwrap();
    assert_eq!(
        status.categorical.out_of_definition_sample,
        Some(vec!["C".to_string()])
    );
    assert_eq!(status.categorical.out_of_definition_count, Some(1));
}

#[test]
fn unknown_code_group_skips_the_definition_check() {
    let dataset = text_dataset("ORDERS", &[("status", &["A", "Z"][..])]);
    let catalogs = Catalogs::load(&CatalogDocuments {
        column: Some(column_catalog(&[[
            "ORDERS", "STATUS", "상태", "VARCHAR(1)", "MISSING_CD",
        ]])),
        code: Some(code_catalog(&[("STATUS_CD", "A")])),
        ..CatalogDocuments::default()
    })
    .unwrap();
    let profile = profile_table(&dataset, &catalogs, &BTreeSet::new(), 1);
    let status = profile.column("status").unwrap();
    assert_eq!(status.categorical.out_of_definition_count, None);
    assert_eq!(status.categorical.out_of_definition_sample, None);
}

#[test]
fn temporal_columns_get_range_and_categories() {
    let dataset = Dataset::new(
        "EVENTS",
        vec![Column::from_text(
            "at",
            &["2024-01-03", "2024-01-01 12:30:00", "2024-01-03"],
            true,
        )],
    )
    .unwrap();
    let profile = profile_table(&dataset, &no_catalogs(), &BTreeSet::new(), 1);
    let at = &profile.columns[0];
    assert_eq!(at.common.resolved_type, "datetime64[ns]");
    assert_eq!(at.kind, ColumnKind::Temporal);
    assert_eq!(
        at.continuous.min.as_ref().map(Value::as_display).as_deref(),
        Some("2024-01-01 12:30:00")
    );
    assert_eq!(at.continuous.mean, None);
    assert_eq!(at.categorical.distinct_count, Some(2));
}

#[test]
fn bool_columns_are_not_profiled_beyond_common_fields() {
    let dataset = text_dataset("T", &[("flag", &["true", "false"][..])]);
    let profile = profile_table(&dataset, &no_catalogs(), &BTreeSet::new(), 1);
    let flag = &profile.columns[0];
    assert_eq!(flag.common.resolved_type, "bool");
    assert_eq!(flag.kind, ColumnKind::Unprofiled);
    assert_eq!(flag.continuous.min, None);
    assert_eq!(flag.categorical.distinct_count, None);
}

fn numeric_dataset(values: &[Option<i64>]) -> Dataset {
    Dataset::new(
        "T",
        vec![Column::new(
            "n",
            StorageType::Int64,
            values.iter().map(|v| v.map(Value::Integer)).collect(),
        )],
    )
    .unwrap()
}

proptest! {
    #[test]
    fn null_and_loaded_counts_partition_the_rows(
        values in prop::collection::vec(prop::option::of(-1_000i64..1_000), 0..60)
    ) {
        let dataset = numeric_dataset(&values);
        let profile = profile_table(&dataset, &Catalogs::default(), &BTreeSet::new(), 1);
        let common = &profile.columns[0].common;
        prop_assert_eq!(common.null_count + common.loaded_count, values.len());
    }

    #[test]
    fn median_lies_between_min_and_max(
        first in -10_000i64..10_000,
        rest in prop::collection::vec(prop::option::of(-10_000i64..10_000), 0..60)
    ) {
        let mut values = vec![Some(first)];
        values.extend(rest);
        let dataset = numeric_dataset(&values);
        let profile = profile_table(&dataset, &Catalogs::default(), &BTreeSet::new(), 1);
        let continuous = &profile.columns[0].continuous;
        let min = continuous.min.as_ref().and_then(Value::as_f64).unwrap();
        let max = continuous.max.as_ref().and_then(Value::as_f64).unwrap();
        let median = continuous.median.unwrap();
        prop_assert!(min <= median && median <= max);
    }

    #[test]
    fn normalizer_second_pass_changes_nothing(
        values in prop::collection::vec(
            prop::sample::select(vec!["a", "b", "na", "?", "NULL", " ", "[NULL]", "x y"]),
            1..40
        )
    ) {
        let mut dataset = Dataset::new(
            "T",
            vec![Column::new(
                "c",
                StorageType::Object,
                values.iter().map(|v| Some(Value::String(v.to_string()))).collect(),
            )],
        )
        .unwrap();
        let normalizer = MissingValueNormalizer::default();
        normalizer.normalize(&mut dataset);
        let snapshot = dataset.clone();
        prop_assert_eq!(normalizer.normalize(&mut dataset), 0);
        prop_assert_eq!(dataset, snapshot);
    }
}
