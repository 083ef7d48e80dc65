//! Property-based tests using proptest.

use std::collections::BTreeMap;

use proptest::prelude::*;
use review_topics::results::{top_term_ids, topic_sentiment};
use review_topics::{select_best, DocumentTermMatrix, LatentDirichletAllocation, LdaConfig};

fn matrix_strategy() -> impl Strategy<Value = (Vec<Vec<u32>>, usize)> {
    (2usize..6, 2usize..8).prop_flat_map(|(docs, terms)| {
        (
            proptest::collection::vec(proptest::collection::vec(0u32..4, terms), docs),
            Just(terms),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_doc_topic_rows_sum_to_one((rows, terms) in matrix_strategy(), k in 2usize..5, seed in 0u64..1000) {
        prop_assume!(k <= terms);
        prop_assume!(rows.iter().flatten().any(|&c| c > 0));

        let dtm = DocumentTermMatrix::from_dense(&rows, terms).unwrap();
        let lda = LatentDirichletAllocation::new(LdaConfig {
            max_iterations: 5,
            seed,
            ..LdaConfig::default()
        });
        let model = lda.fit(&dtm, k).unwrap();

        prop_assert_eq!(model.topic_term().len(), k);
        prop_assert_eq!(model.doc_topic().len(), rows.len());
        for row in model.doc_topic() {
            prop_assert_eq!(row.len(), k);
            prop_assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        }
        prop_assert_eq!(model, lda.fit(&dtm, k).unwrap());
    }

    #[test]
    fn prop_top_term_ids_distinct_and_bounded(weights in proptest::collection::vec(0.0f64..1.0, 1..30), n in 1usize..15) {
        let ids = top_term_ids(&weights, n);
        prop_assert_eq!(ids.len(), n.min(weights.len()));

        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), ids.len());

        for pair in ids.windows(2) {
            prop_assert!(weights[pair[0]] >= weights[pair[1]]);
        }
    }

    #[test]
    fn prop_topic_sentiment_within_bounds(
        rows in proptest::collection::vec(proptest::collection::vec(0.0f64..1.0, 3), 1..12),
        seed_sentiment in proptest::collection::vec(-1.0f64..1.0, 12),
    ) {
        let sentiments = &seed_sentiment[..rows.len()];
        let averages = topic_sentiment(&rows, sentiments).unwrap();
        prop_assert_eq!(averages.len(), 3);

        let lo = sentiments.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = sentiments.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for avg in averages {
            prop_assert!(avg.is_finite());
            prop_assert!(avg == 0.0 || (avg >= lo - 1e-9 && avg <= hi + 1e-9));
        }
    }

    #[test]
    fn prop_select_best_prefers_smallest_on_ties(score in -10.0f64..10.0, counts in proptest::collection::btree_set(2usize..40, 1..6)) {
        let scores: BTreeMap<usize, f64> = counts.iter().map(|&k| (k, score)).collect();
        let smallest = *counts.iter().next().unwrap();
        prop_assert_eq!(select_best(&scores), Some((smallest, score)));
    }
}
