//! Header row normalization

use rustc_hash::{FxHashMap, FxHashSet};

/// Turn a raw header row into unique column names.
///
/// Each value is trimmed. The first occurrence of a name is kept as is and
/// the Nth repeat becomes `<name>_<N>`. A generated name that is already taken
/// pushes the counter further, so the result is always pairwise unique.
pub fn normalize_headers<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut emitted: FxHashSet<String> = FxHashSet::default();
    let mut repeats: FxHashMap<String, usize> = FxHashMap::default();
    let mut names = Vec::with_capacity(raw.len());

    for value in raw {
        let base = value.as_ref().trim();

        let name = if emitted.contains(base) {
            let counter = repeats.entry(base.to_string()).or_insert(0);
            loop {
                *counter += 1;
                let candidate = format!("{}_{}", base, counter);
                if !emitted.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            base.to_string()
        };

        emitted.insert(name.clone());
        names.push(name);
    }

    names
}
