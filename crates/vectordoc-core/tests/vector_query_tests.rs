//! End-to-end tests for vector queries through both query surfaces.
//!
//! The fixture is the three-document collection used throughout the docs:
//! `{1: [1, 0]}`, `{2: [0, 1]}`, `{3: [1, 1]}`, queried with `[1, 0]`.
//! Under cosine distance document 3 sits at `1 - 1/sqrt(2) ~= 0.2929`.
#![allow(clippy::cast_precision_loss, clippy::uninlined_format_args)]

use vectordoc_core::docql::Parser;
use vectordoc_core::{
    Config, Database, DistanceMetric, Document, Error, Expr, NamedOperator, Params, Result,
    SelectItem, Value,
};

fn fixture() -> Database {
    let db = Database::new();
    let docs = db.create_collection("docs").expect("Failed to create collection");
    docs.insert(
        Document::new(1)
            .with("title", "east")
            .with("lang", "en")
            .with("embedding", vec![1.0_f32, 0.0]),
    )
    .expect("insert 1");
    docs.insert(
        Document::new(2)
            .with("title", "north")
            .with("lang", "en")
            .with("embedding", vec![0.0_f32, 1.0]),
    )
    .expect("insert 2");
    docs.insert(
        Document::new(3)
            .with("title", "north-east")
            .with("lang", "fr")
            .with("embedding", vec![1.0_f32, 1.0]),
    )
    .expect("insert 3");
    db
}

fn sql_ids(db: &Database, sql: &str) -> Vec<u64> {
    sql_ids_with(db, sql, &Params::new())
}

fn sql_ids_with(db: &Database, sql: &str, params: &Params) -> Vec<u64> {
    db.execute(sql, params)
        .unwrap_or_else(|e| panic!("{sql}: {e}"))
        .map(|row| row.expect("row").id)
        .collect()
}

fn mock_embedding(seed: u64, dim: usize) -> Vec<f32> {
    (0..dim)
        .map(|i| (seed as f32 * 0.37 + i as f32 * 0.11).sin())
        .collect()
}

// =============================================================================
// Near-filter
// =============================================================================

mod near_filter {
    use super::*;

    #[test]
    fn test_threshold_below_diagonal() {
        let db = fixture();

        let ids = sql_ids(&db, "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], 0.25)");

        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_threshold_includes_diagonal() {
        let db = fixture();

        let ids = sql_ids(&db, "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], 0.3)");

        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_builder_matches_docql() {
        let db = fixture();

        let built: Vec<u64> = db
            .query("docs")
            .where_near("embedding", vec![1.0_f32, 0.0], 0.3)
            .to_vec()
            .expect("query")
            .iter()
            .map(|d| d.id)
            .collect();

        assert_eq!(built, vec![1, 3]);
    }

    #[test]
    fn test_bound_is_inclusive() {
        let db = fixture();

        let ids = sql_ids(&db, "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], 1.0)");

        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_combined_with_filter() {
        let db = fixture();

        let ids = sql_ids(
            &db,
            "SELECT * FROM docs WHERE lang = 'en' AND NEAR(embedding, [1, 0], 0.3)",
        );

        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_euclidean_metric_argument() {
        let db = fixture();

        let ids = sql_ids(&db, "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], 1.0, 'l2')");

        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_documents_without_vectors_are_skipped() {
        let db = fixture();
        let docs = db.collection("docs").expect("collection");
        docs.insert(Document::new(4).with("title", "no vector"))
            .expect("insert");
        docs.insert(Document::new(5).with("embedding", "not a vector"))
            .expect("insert");

        let ids = sql_ids(&db, "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], 2.0)");

        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_near_inside_or_is_a_predicate() {
        let db = fixture();

        let ids = sql_ids(
            &db,
            "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], 0.1) OR title = 'north'",
        );

        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_parameter_bound_in_any_position() {
        let db = fixture();
        let mut params = Params::new();
        params.insert("max".into(), Value::from(0.1));

        let top_level = sql_ids_with(
            &db,
            "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], $max)",
            &params,
        );
        let nested = sql_ids_with(
            &db,
            "SELECT * FROM docs WHERE NOT NOT NEAR(embedding, [1, 0], $max)",
            &params,
        );
        let under_or = sql_ids_with(
            &db,
            "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], $max) OR title = 'north'",
            &params,
        );

        assert_eq!(top_level, vec![1]);
        assert_eq!(nested, vec![1]);
        assert_eq!(under_or, vec![1, 2]);
    }

    #[test]
    fn test_metric_argument_in_any_position() {
        let db = fixture();

        let top_level = sql_ids(&db, "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], 1.0, 'l2')");
        let nested = sql_ids(
            &db,
            "SELECT * FROM docs WHERE NOT NOT NEAR(embedding, [1, 0], 1.0, 'l2')",
        );
        let under_or = sql_ids(
            &db,
            "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], 0.1, 'l2') OR title = 'north'",
        );

        assert_eq!(top_level, vec![1, 3]);
        assert_eq!(nested, vec![1, 3]);
        assert_eq!(under_or, vec![1, 2]);
    }

    #[test]
    fn test_bad_near_arguments_fail_in_any_position() {
        let db = fixture();
        let mut params = Params::new();
        params.insert("max".into(), Value::from("far"));

        for sql in [
            "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], 0.1, 'hamming')",
            "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], 0.1, 'hamming') OR lang = 'fr'",
        ] {
            let result = db.execute(sql, &params);
            assert!(matches!(result, Err(Error::InvalidArgument(_))), "{sql}");
        }
        for sql in [
            "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], $max)",
            "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], $max) OR lang = 'fr'",
        ] {
            let result = db.execute(sql, &params);
            assert!(matches!(result, Err(Error::TypeMismatch(_))), "{sql}");
        }
    }
}

// =============================================================================
// Top-k
// =============================================================================

mod top_k {
    use super::*;

    #[test]
    fn test_two_nearest() {
        let db = fixture();

        let ids = sql_ids(&db, "SELECT * FROM docs WHERE TOP_K(embedding, [1, 0], 2)");

        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_non_positive_k_returns_nothing() {
        let db = fixture();

        let zero = sql_ids(&db, "SELECT * FROM docs WHERE TOP_K(embedding, [1, 0], 0)");
        let negative = sql_ids(&db, "SELECT * FROM docs WHERE TOP_K(embedding, [1, 0], -2)");

        assert!(zero.is_empty());
        assert!(negative.is_empty());
    }

    #[test]
    fn test_k_larger_than_collection() {
        let db = fixture();

        let ids = sql_ids(&db, "SELECT * FROM docs WHERE TOP_K(embedding, [1, 0], 10)");

        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn test_filter_applies_before_ranking() {
        let db = fixture();

        let ids = sql_ids(
            &db,
            "SELECT * FROM docs WHERE lang = 'en' AND TOP_K(embedding, [1, 0], 2)",
        );

        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_dot_metric_ties_keep_scan_order() {
        let db = fixture();

        // Documents 1 and 3 both have inner product 1 with the target.
        let ids = sql_ids(&db, "SELECT * FROM docs WHERE TOP_K(embedding, [1, 0], 2, 'dot')");

        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_builder_metric() {
        let db = fixture();

        let ids: Vec<u64> = db
            .query("docs")
            .top_k_near("embedding", vec![0.0_f32, 0.0], 1)
            .metric(DistanceMetric::Euclidean)
            .to_vec()
            .expect("query")
            .iter()
            .map(|d| d.id)
            .collect();

        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_database_default_metric() {
        let mut config = Config::default();
        config.query.default_metric = DistanceMetric::Euclidean;
        let db = Database::with_config(config).expect("config");
        let docs = db.create_collection("docs").expect("create");
        docs.insert(Document::new(1).with("v", vec![10.0_f32, 0.0]))
            .expect("insert");
        docs.insert(Document::new(2).with("v", vec![0.5_f32, 0.5]))
            .expect("insert");

        // Cosine would rank 1 first; Euclidean ranks the short vector first.
        let ids = sql_ids(&db, "SELECT * FROM docs WHERE TOP_K(v, [1, 0], 1)");

        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_order_by_distance_limit_matches_top_k() {
        // Arrange
        let db = Database::new();
        let docs = db.create_collection("docs").expect("create");
        for id in 0..200 {
            docs.insert(Document::new(id).with("embedding", mock_embedding(id, 16)))
                .expect("insert");
        }
        let mut params = Params::new();
        params.insert("q".into(), Value::from(mock_embedding(7_777, 16)));

        // Act
        let ranked = sql_ids_with(
            &db,
            "SELECT * FROM docs ORDER BY DISTANCE(embedding, $q) LIMIT 10",
            &params,
        );
        let top_k = sql_ids_with(
            &db,
            "SELECT * FROM docs WHERE TOP_K(embedding, $q, 10)",
            &params,
        );

        // Assert
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked, top_k);
    }

    #[test]
    fn test_later_stages_apply_after_ranking() {
        let db = fixture();

        let ids = sql_ids(
            &db,
            "SELECT * FROM docs WHERE TOP_K(embedding, [1, 0], 3) ORDER BY _id DESC LIMIT 1 OFFSET 1",
        );

        assert_eq!(ids, vec![2]);
    }
}

// =============================================================================
// Errors
// =============================================================================

mod errors {
    use super::*;

    #[test]
    fn test_dimension_mismatch_aborts_query() {
        let db = fixture();

        let mut cursor = db
            .execute(
                "SELECT * FROM docs WHERE NEAR(embedding, [1, 0, 0], 0.5)",
                &Params::new(),
            )
            .expect("binding succeeds");

        let first = cursor.next().expect("error row");
        assert_eq!(
            first.expect_err("mismatch"),
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
        assert!(cursor.next().is_none());

        // the fault is local to that query
        let ids = sql_ids(&db, "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], 0.3)");
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_dimension_mismatch_in_top_k() {
        let db = fixture();

        let result: Result<Vec<Document>> = db
            .query("docs")
            .top_k_near("embedding", vec![1.0_f32, 0.0, 0.0], 2)
            .to_vec();

        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_empty_query_vector_is_rejected_at_bind() {
        let db = fixture();

        let result = db.execute("SELECT * FROM docs WHERE TOP_K(embedding, [], 1)", &Params::new());

        assert!(matches!(result, Err(Error::EmptyVector)));
    }

    #[test]
    fn test_missing_parameter() {
        let db = fixture();

        let result = db.execute("SELECT * FROM docs WHERE TOP_K(embedding, $q, 1)", &Params::new());

        assert!(matches!(result, Err(Error::MissingParameter(name)) if name == "q"));
    }

    #[test]
    fn test_unknown_function() {
        let db = fixture();

        let result = db.execute("SELECT * FROM docs WHERE HAMMING(embedding, [1, 0]) < 1", &Params::new());

        assert!(matches!(result, Err(Error::UnknownOperator { arity: 2, .. })));
    }

    #[test]
    fn test_oversized_query_vector() {
        let mut config = Config::default();
        config.limits.max_dimensions = 2;
        let db = Database::with_config(config).expect("config");
        db.create_collection("docs").expect("create");

        let result = db
            .query("docs")
            .where_near("embedding", vec![1.0_f32, 0.0, 0.0], 0.5)
            .execute();

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}

// =============================================================================
// Query surfaces
// =============================================================================

mod surfaces {
    use super::*;

    #[test]
    fn test_builder_and_docql_build_the_same_plan() {
        let db = fixture();

        let built = db
            .query("docs")
            .filter(Expr::field("lang").eq("en"))
            .where_near("embedding", vec![1.0_f32, 0.0], 0.3)
            .top_k_near("embedding", vec![1.0_f32, 0.0], 2)
            .limit(5)
            .plan();
        let parsed = Parser::parse(
            "SELECT * FROM docs WHERE lang = 'en' AND NEAR(embedding, [1, 0], 0.3) \
             AND TOP_K(embedding, [1, 0], 2) LIMIT 5",
        )
        .expect("parse")
        .into_plan()
        .expect("plan");

        assert_eq!(built, parsed);
    }

    #[test]
    fn test_parameter_binding() {
        let db = fixture();
        let mut params = Params::new();
        params.insert("q".into(), Value::from(vec![0.0_f32, 1.0]));

        let ids = sql_ids_with(&db, "SELECT * FROM docs WHERE TOP_K(embedding, $q, 1)", &params);

        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_text_parameter_is_cast() {
        let db = fixture();

        let ids: Vec<u64> = db
            .query("docs")
            .top_k_near("embedding", Expr::param("q"), 1)
            .param("q", "[0, 1]")
            .to_vec()
            .expect("query")
            .iter()
            .map(|d| d.id)
            .collect();

        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_projection_with_distance_column() {
        // Arrange
        let db = fixture();

        // Act
        let rows: Vec<Document> = db
            .execute(
                "SELECT title, DISTANCE(embedding, [1, 0]) AS score, rating \
                 FROM docs WHERE TOP_K(embedding, [1, 0], 2)",
                &Params::new(),
            )
            .expect("bind")
            .collect::<Result<_>>()
            .expect("rows");

        // Assert
        assert_eq!(rows.len(), 2);
        let first = &rows[0];
        assert_eq!(first.id, 1);
        let names: Vec<&str> = first.fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["title", "score", "rating"]);
        assert_eq!(first.fields.get("title"), Some(&Value::from("east")));
        assert_eq!(first.fields.get("rating"), Some(&Value::Null));
        let score = rows[1]
            .fields
            .get("score")
            .and_then(Value::as_f64)
            .expect("score");
        assert!((score - 0.292_893).abs() < 1e-5);
    }

    #[test]
    fn test_builder_projection() {
        let db = fixture();

        let rows = db
            .query("docs")
            .top_k_near("embedding", vec![1.0_f32, 0.0], 1)
            .select([
                SelectItem::from("title"),
                SelectItem::aliased(Expr::call("DIMENSION", vec![Expr::field("embedding")]), "dim"),
            ])
            .to_vec()
            .expect("query");

        assert_eq!(rows[0].fields.get("dim"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_query_sees_snapshot_at_execute() {
        let db = fixture();
        let cursor = db
            .execute("SELECT * FROM docs WHERE TOP_K(embedding, [1, 0], 10)", &Params::new())
            .expect("bind");

        let docs = db.collection("docs").expect("collection");
        docs.insert(Document::new(9).with("embedding", vec![1.0_f32, 0.0]))
            .expect("insert");
        docs.delete(3);

        let ids: Vec<u64> = cursor.map(|row| row.expect("row").id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }
}

// =============================================================================
// Custom operators
// =============================================================================

mod custom_operators {
    use super::*;

    /// `FIRST(v)`: the first component of a vector.
    #[derive(Debug)]
    struct First;

    impl NamedOperator for First {
        fn name(&self) -> &str {
            "FIRST"
        }

        fn arity(&self) -> usize {
            1
        }

        fn call(&self, args: &[Option<&Value>]) -> Result<Option<Value>> {
            Ok(args
                .first()
                .copied()
                .flatten()
                .and_then(Value::as_vector)
                .and_then(|v| v.as_slice().first().copied())
                .map(Value::from))
        }
    }

    #[test]
    fn test_registered_operator_is_callable_from_docql() {
        let db = fixture();
        db.register_operator(First);

        let ids = sql_ids(&db, "SELECT * FROM docs WHERE FIRST(embedding) > 0.5");

        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_registered_operator_in_order_by() {
        let db = fixture();
        db.register_operator(First);

        let ids = sql_ids(&db, "SELECT * FROM docs ORDER BY first(embedding) DESC, _id DESC");

        assert_eq!(ids, vec![3, 1, 2]);
    }
}
