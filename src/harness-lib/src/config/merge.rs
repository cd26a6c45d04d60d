use serde_json::{Map, Value};

/// Merges `overlay` into `base`. Mappings merge key by key, everything else
/// (scalars, sequences, null) replaces what was there.
pub fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, other) => *slot = other,
    }
}

/// Merges `value` into the node at `path`, creating intermediate mappings and
/// replacing any non-mapping value found on the way. A mapping merges into an
/// existing mapping; anything else replaces the node.
pub fn merge_at_path(root: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        merge(root, value);
        return;
    };

    let mut current = root;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => unreachable!("value was just replaced by an object"),
        };
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        match map.get_mut(last) {
            Some(existing) => merge(existing, value),
            None => {
                map.insert(last.clone(), value);
            }
        }
    }
}

/// The node at `path`, if every segment names a mapping key.
pub fn value_at<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_recurses_into_mappings() {
        let mut base = json!({"http": {"timeout": 30, "factory": "http://a"}});
        merge(&mut base, json!({"http": {"timeout": 5}}));
        assert_eq!(base, json!({"http": {"timeout": 5, "factory": "http://a"}}));
    }

    #[test]
    fn test_merge_replaces_sequences() {
        let mut base = json!({"common": {"username": ["a", "b", "c"]}});
        merge(&mut base, json!({"common": {"username": ["z"]}}));
        assert_eq!(base, json!({"common": {"username": ["z"]}}));
    }

    #[test]
    fn test_merge_scalar_over_mapping_replaces() {
        let mut base = json!({"db": {"host": "localhost"}});
        merge(&mut base, json!({"db": "disabled"}));
        assert_eq!(base, json!({"db": "disabled"}));
    }

    #[test]
    fn test_merge_at_path_creates_intermediate_mappings() {
        let mut root = json!({});
        merge_at_path(
            &mut root,
            &["auth".to_string(), "factory".to_string(), "token".to_string()],
            json!("t"),
        );
        assert_eq!(root, json!({"auth": {"factory": {"token": "t"}}}));
    }

    #[test]
    fn test_merge_at_path_replaces_scalar_parent() {
        let mut root = json!({"http": 1});
        merge_at_path(
            &mut root,
            &["http".to_string(), "timeout".to_string()],
            json!(3),
        );
        assert_eq!(root, json!({"http": {"timeout": 3}}));
    }

    #[test]
    fn test_merge_at_path_keeps_sibling_keys() {
        let mut root = json!({"http": {"factory": "http://factory", "timeout": 10}});
        merge_at_path(&mut root, &["http".to_string()], json!({"timeout": 1}));
        assert_eq!(root, json!({"http": {"factory": "http://factory", "timeout": 1}}));

        merge_at_path(
            &mut root,
            &["http".to_string(), "timeout".to_string()],
            json!({"connect": 2}),
        );
        assert_eq!(root["http"]["timeout"], json!({"connect": 2}));
        let factory = ["http".to_string(), "factory".to_string()];
        assert_eq!(value_at(&root, &factory), Some(&json!("http://factory")));
        let missing = ["http".to_string(), "missing".to_string()];
        assert_eq!(value_at(&root, &missing), None);
    }
}
