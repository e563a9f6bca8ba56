//! Property-based tests for the source store and folder derivation.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use std::collections::HashSet;
    use std::path::Component;

    use proptest::prelude::*;
    use tempfile::TempDir;

    use crate::defaults::REPOS_DIRNAME;
    use crate::source::{folder_for_url, SourceDef};
    use crate::store::SourceStore;
    use crate::workspace::Workspace;

    const POOL: [&str; 5] = [
        "https://example.com/a.git",
        "https://example.com/b.git",
        "https://example.com/a",
        "git@example.com:org/a.git",
        "/srv/git/a",
    ];

    #[derive(Debug, Clone)]
    enum Op {
        Add(usize),
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..POOL.len()).prop_map(Op::Add),
            (0..POOL.len()).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: no sequence of add/remove leaves two sources with one URL
        #[test]
        fn store_never_holds_duplicate_urls(ops in prop::collection::vec(op(), 1..24)) {
            let temp_dir = TempDir::new().unwrap();
            let workspace = Workspace::init(temp_dir.path()).unwrap();
            let mut store = SourceStore::open(&workspace).unwrap();
            let mut model: Vec<&str> = Vec::new();

            for op in ops {
                match op {
                    Op::Add(i) => {
                        let added = store.add(POOL[i]).is_ok();
                        prop_assert_eq!(added, !model.contains(&POOL[i]));
                        if added {
                            model.push(POOL[i]);
                        }
                    }
                    Op::Remove(i) => {
                        let removed = store.remove(&SourceDef::parse(POOL[i])).is_ok();
                        prop_assert_eq!(removed, model.contains(&POOL[i]));
                        model.retain(|url| *url != POOL[i]);
                    }
                }

                let urls: Vec<&str> = store.list().iter().map(|s| s.url.as_str()).collect();
                let unique: HashSet<&str> = urls.iter().copied().collect();
                prop_assert_eq!(unique.len(), urls.len());
                prop_assert_eq!(&urls, &model);
            }

            // Reloading yields the same records, in the same order.
            let reopened = SourceStore::open(&workspace).unwrap();
            prop_assert_eq!(reopened.list(), store.list());
        }

        /// Property: ids are never reused, even after removals
        #[test]
        fn store_ids_strictly_increase(ops in prop::collection::vec(op(), 1..24)) {
            let temp_dir = TempDir::new().unwrap();
            let workspace = Workspace::init(temp_dir.path()).unwrap();
            let mut store = SourceStore::open(&workspace).unwrap();
            let mut last = 0;

            for op in ops {
                match op {
                    Op::Add(i) => {
                        if let Ok(source) = store.add(POOL[i]) {
                            prop_assert!(source.id.0 > last);
                            last = source.id.0;
                        }
                    }
                    Op::Remove(i) => {
                        let _ = store.remove(&SourceDef::parse(POOL[i]));
                    }
                }
            }
        }

        /// Property: folders stay one level below the repos directory
        #[test]
        fn folder_for_url_is_contained(url in ".*") {
            let folder = folder_for_url(&url);
            let components: Vec<Component> = folder.components().collect();
            prop_assert_eq!(components.len(), 2);
            prop_assert_eq!(components[0], Component::Normal(REPOS_DIRNAME.as_ref()));
            prop_assert!(matches!(components[1], Component::Normal(_)));
        }

        /// Property: folder_for_url is deterministic
        #[test]
        fn folder_for_url_is_deterministic(url in ".*") {
            prop_assert_eq!(folder_for_url(&url), folder_for_url(&url));
        }
    }
}
