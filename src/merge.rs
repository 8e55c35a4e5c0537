//! Merging of the tasks of several sources

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::task::{CourseRef, DedupKey, NormalizedTask};

/// Removes the tasks that share the same [`DedupKey`].
///
/// The last occurrence of a key wins, but it takes the position of the first occurrence: the result is ordered by
/// first insertion of each key.
pub fn merge_and_dedup<I>(tasks: I) -> Vec<NormalizedTask>
where
    I: IntoIterator<Item = NormalizedTask>,
{
    let mut positions: HashMap<DedupKey, usize> = HashMap::new();
    let mut merged: Vec<NormalizedTask> = Vec::new();

    for task in tasks {
        match positions.entry(task.dedup_key()) {
            Entry::Occupied(entry) => {
                log::trace!("Replacing duplicate task {}", entry.key());
                merged[*entry.get()] = task;
            },
            Entry::Vacant(entry) => {
                entry.insert(merged.len());
                merged.push(task);
            },
        }
    }

    merged
}

/// The distinct courses referenced by these tasks, in order of first appearance
pub fn course_refs(tasks: &[NormalizedTask]) -> Vec<CourseRef> {
    let mut seen = HashSet::new();
    tasks.iter()
        .filter_map(NormalizedTask::course_ref)
        .filter(|course| seen.insert(course.clone()))
        .collect()
}
