//! Three-way merge rules for reference and dependent language maps.
//!
//! The reference language (usually `en_us`) drives the key lifecycle:
//! upstream decides which keys exist and in what order. Dependent
//! languages follow that key set while keeping human translations for
//! keys whose reference text did not change. An untranslated key is
//! represented by duplicating the reference text — downstream tooling
//! counts "needs translation" by value equality, so no placeholder may
//! ever be substituted.

use crate::diff::{
    DiffResult,
    diff,
};
use crate::map::LanguageMap;

/// Merge an incoming reference map against the previously stored one.
///
/// The merged map takes the incoming key set, order and values
/// wholesale; keys upstream dropped disappear and show up in
/// `DiffResult::deleted`. With no prior map every key is reported as
/// added.
#[must_use]
pub fn synchronize_reference(
    incoming: &LanguageMap,
    prior: Option<&LanguageMap>,
) -> (LanguageMap, DiffResult) {
    let diff_result = prior.map_or_else(
        || DiffResult {
            added: incoming.keys().map(str::to_string).collect(),
            ..DiffResult::default()
        },
        |prior| diff(prior, incoming),
    );

    (incoming.clone(), diff_result)
}

/// Merge a dependent language map against the merged reference.
///
/// Output keys and order are exactly the merged reference's. For each
/// key:
/// - changed in the reference (`added`/`modified`): take the incoming
///   dependent value, falling back to the reference text;
/// - otherwise: keep the prior dependent value, with the same fallback
///   chain when there is none.
///
/// Keys present only in the prior dependent map are dropped (orphans).
/// When `prior_reference` is `None` there is no diff that could justify
/// overwriting anything, so every key is treated as unchanged and prior
/// translations win over incoming ones.
#[must_use]
pub fn synchronize_dependent(
    merged_reference: &LanguageMap,
    incoming_dependent: Option<&LanguageMap>,
    prior_reference: Option<&LanguageMap>,
    prior_dependent: Option<&LanguageMap>,
    reference_diff: &DiffResult,
) -> LanguageMap {
    let mut merged = LanguageMap::with_capacity(merged_reference.len());

    for (key, reference_text) in merged_reference.iter() {
        let changed = prior_reference.is_some() && reference_diff.is_changed_key(key);

        let value = if changed {
            incoming_value(incoming_dependent, key).unwrap_or(reference_text)
        } else {
            prior_dependent
                .and_then(|prior| prior.get(key))
                .or_else(|| incoming_value(incoming_dependent, key))
                .unwrap_or(reference_text)
        };
        merged.insert(key, value);
    }

    merged
}

fn incoming_value<'a>(incoming: Option<&'a LanguageMap>, key: &str) -> Option<&'a str> {
    incoming.and_then(|map| map.get(key))
}

/// Merge a dependent map that arrived without any reference counterpart.
///
/// The incoming map is authoritative for its own key set, so this is
/// the reference-merge rule applied to dependent data: wholesale
/// adoption, diffed against the prior stored map for reporting.
#[must_use]
pub fn synchronize_primary_dependent(
    incoming: &LanguageMap,
    prior: Option<&LanguageMap>,
) -> (LanguageMap, DiffResult) {
    synchronize_reference(incoming, prior)
}

/// Reorder `target` to follow `reference` key order.
///
/// Keys shared with the reference come first in reference order, then
/// target-only keys in their original relative order. Values are
/// unchanged. Used to correct order drift without a content change.
#[must_use]
pub fn reorder_by_reference(target: &LanguageMap, reference: &LanguageMap) -> LanguageMap {
    let mut reordered = LanguageMap::with_capacity(target.len());

    for key in reference.keys() {
        if let Some(value) = target.get(key) {
            reordered.insert(key, value);
        }
    }
    for (key, value) in target.iter() {
        if !reordered.contains_key(key) {
            reordered.insert(key, value);
        }
    }

    reordered
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    fn map(pairs: &[(&str, &str)]) -> LanguageMap {
        pairs.iter().copied().collect()
    }

    fn keys(map: &LanguageMap) -> Vec<&str> {
        map.keys().collect()
    }

    #[googletest::test]
    fn test_reference_merge_without_prior_reports_all_added() {
        let incoming = map(&[("key1", "value1"), ("key2", "value2")]);

        let (merged, diff_result) = synchronize_reference(&incoming, None);

        expect_that!(merged, eq(&incoming));
        expect_that!(diff_result.added.len(), eq(2));
        expect_that!(diff_result.modified.is_empty(), eq(true));
        expect_that!(diff_result.deleted.is_empty(), eq(true));
    }

    #[googletest::test]
    fn test_reference_merge_adopts_incoming_order_and_drops_removed() {
        let prior = map(&[("a", "A"), ("b", "B")]);
        let incoming = map(&[("c", "C"), ("a", "A2")]);

        let (merged, diff_result) = synchronize_reference(&incoming, Some(&prior));

        expect_that!(keys(&merged), eq(&vec!["c", "a"]));
        expect_that!(merged.get("a"), some(eq("A2")));
        expect_that!(merged.contains_key("b"), eq(false));
        expect_that!(diff_result.deleted.contains("b"), eq(true));
        expect_that!(diff_result.modified.contains("a"), eq(true));
        expect_that!(diff_result.added.contains("c"), eq(true));
    }

    #[googletest::test]
    fn test_dependent_merge_reference_update_with_orphan() {
        // Reference changed "a", dropped "b", gained "c"; the stored
        // translation of "a" is stale, "b" is an orphan.
        let prior_reference = map(&[("a", "A"), ("b", "B")]);
        let incoming_reference = map(&[("a", "A2"), ("c", "C")]);
        let prior_dependent = map(&[("a", "甲"), ("b", "乙")]);

        let (merged_reference, diff_result) =
            synchronize_reference(&incoming_reference, Some(&prior_reference));
        let merged = synchronize_dependent(
            &merged_reference,
            None,
            Some(&prior_reference),
            Some(&prior_dependent),
            &diff_result,
        );

        expect_that!(merged, eq(&map(&[("a", "A2"), ("c", "C")])));
    }

    #[googletest::test]
    fn test_dependent_merge_preserves_translations() {
        let prior_reference = map(&[("a", "A")]);
        let incoming_reference = map(&[("a", "A"), ("d", "D")]);
        let prior_dependent = map(&[("a", "甲")]);

        let (merged_reference, diff_result) =
            synchronize_reference(&incoming_reference, Some(&prior_reference));
        let merged = synchronize_dependent(
            &merged_reference,
            None,
            Some(&prior_reference),
            Some(&prior_dependent),
            &diff_result,
        );

        expect_that!(merged, eq(&map(&[("a", "甲"), ("d", "D")])));
    }

    #[googletest::test]
    fn test_dependent_merge_prefers_incoming_for_changed_keys() {
        let prior_reference = map(&[("a", "A")]);
        let incoming_reference = map(&[("a", "A2"), ("b", "B")]);
        let prior_dependent = map(&[("a", "stale")]);
        let incoming_dependent = map(&[("a", "新しい"), ("b", "乙")]);

        let (merged_reference, diff_result) =
            synchronize_reference(&incoming_reference, Some(&prior_reference));
        let merged = synchronize_dependent(
            &merged_reference,
            Some(&incoming_dependent),
            Some(&prior_reference),
            Some(&prior_dependent),
            &diff_result,
        );

        expect_that!(merged.get("a"), some(eq("新しい")));
        expect_that!(merged.get("b"), some(eq("乙")));
    }

    #[googletest::test]
    fn test_dependent_merge_untranslated_falls_back_to_reference_text() {
        // Downstream counts "untranslated" by equality with the
        // reference text, so the fallback must copy it verbatim.
        let incoming_reference = map(&[("a", "A"), ("b", "B")]);

        let (merged_reference, diff_result) = synchronize_reference(&incoming_reference, None);
        let merged =
            synchronize_dependent(&merged_reference, None, None, None, &diff_result);

        expect_that!(merged.get("a"), some(eq("A")));
        expect_that!(merged.get("b"), some(eq("B")));
    }

    #[googletest::test]
    fn test_dependent_merge_no_prior_reference_prefers_prior_translation() {
        // First sync against a tracked reference: no diff justifies an
        // overwrite, so the stored translation wins over the incoming.
        let incoming_reference = map(&[("a", "A")]);
        let prior_dependent = map(&[("a", "甲")]);
        let incoming_dependent = map(&[("a", "incoming")]);

        let (merged_reference, diff_result) = synchronize_reference(&incoming_reference, None);
        let merged = synchronize_dependent(
            &merged_reference,
            Some(&incoming_dependent),
            None,
            Some(&prior_dependent),
            &diff_result,
        );

        expect_that!(merged.get("a"), some(eq("甲")));
    }

    #[googletest::test]
    fn test_dependent_merge_output_order_follows_reference() {
        let prior_reference = map(&[("a", "A"), ("b", "B")]);
        let incoming_reference = map(&[("b", "B"), ("z", "Z"), ("a", "A")]);
        let prior_dependent = map(&[("a", "甲"), ("b", "乙")]);

        let (merged_reference, diff_result) =
            synchronize_reference(&incoming_reference, Some(&prior_reference));
        let merged = synchronize_dependent(
            &merged_reference,
            None,
            Some(&prior_reference),
            Some(&prior_dependent),
            &diff_result,
        );

        expect_that!(keys(&merged), eq(&vec!["b", "z", "a"]));
        expect_that!(merged.get("a"), some(eq("甲")));
        expect_that!(merged.get("b"), some(eq("乙")));
        expect_that!(merged.get("z"), some(eq("Z")));
    }

    #[googletest::test]
    fn test_primary_dependent_merge() {
        let prior = map(&[("a", "旧"), ("b", "乙")]);
        let incoming = map(&[("a", "新"), ("c", "丙")]);

        let (merged, diff_result) = synchronize_primary_dependent(&incoming, Some(&prior));

        expect_that!(merged, eq(&incoming));
        expect_that!(diff_result.modified.contains("a"), eq(true));
        expect_that!(diff_result.deleted.contains("b"), eq(true));
        expect_that!(diff_result.added.contains("c"), eq(true));
    }

    #[googletest::test]
    fn test_reorder_by_reference() {
        let reference = map(&[("a", "A"), ("b", "B"), ("c", "C")]);
        let target = map(&[("c", "3"), ("extra", "x"), ("a", "1"), ("other", "y")]);

        let reordered = reorder_by_reference(&target, &reference);

        expect_that!(keys(&reordered), eq(&vec!["a", "c", "extra", "other"]));
        expect_that!(reordered.get("a"), some(eq("1")));
        expect_that!(reordered.get("extra"), some(eq("x")));
    }

    #[googletest::test]
    fn test_reorder_identical_order_is_noop() {
        let reference = map(&[("a", "A"), ("b", "B")]);
        let target = map(&[("a", "1"), ("b", "2")]);

        expect_that!(reorder_by_reference(&target, &reference), eq(&target));
    }
}
