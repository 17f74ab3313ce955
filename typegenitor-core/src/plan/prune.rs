//! Dead-type pruning: reachability closure over the tracker.

use std::collections::HashSet;

use crate::config::Config;
use crate::translator::Translation;

/// Names of the definitions that survive pruning.
///
/// Reachability starts from the retained operation set plus the
/// `error_mapping` targets and crosses every type edge: struct fields,
/// map/array elements, union variants, discriminator targets, composition
/// results, response types. With pruning disabled, or for a document with
/// no operations at all, everything survives.
pub(crate) fn retained_names(translation: &Translation, config: &Config) -> HashSet<String> {
    let all: HashSet<String> = translation
        .tracker
        .iter()
        .map(|def| def.name.clone())
        .collect();
    if config.skip_prune || translation.operations.is_empty() {
        return all;
    }

    let mut retained: HashSet<String> = HashSet::new();
    let mut worklist: Vec<String> = Vec::new();

    let mut seed = |name: &str, worklist: &mut Vec<String>| {
        if all.contains(name) {
            worklist.push(name.to_string());
        }
    };

    for op in &translation.operations {
        let mut names = Vec::new();
        for p in &op.params {
            p.type_ref.named_refs(&mut names);
        }
        if let Some(body) = &op.body {
            body.type_ref.named_refs(&mut names);
        }
        for r in &op.responses {
            if let Some(t) = &r.type_ref {
                t.named_refs(&mut names);
            }
        }
        for name in names {
            seed(name, &mut worklist);
        }
    }
    for name in config.error_mapping.keys() {
        seed(name, &mut worklist);
    }

    while let Some(name) = worklist.pop() {
        if !retained.insert(name.clone()) {
            continue;
        }
        let Some(def) = translation.tracker.lookup_by_name(&name) else {
            continue;
        };
        for referenced in def.referenced_names() {
            if all.contains(referenced) && !retained.contains(referenced) {
                worklist.push(referenced.to_string());
            }
        }
    }

    log::trace!("pruning dropped {} definitions", all.len() - retained.len());
    retained
}
