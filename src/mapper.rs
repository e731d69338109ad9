//! Saved column slot -> current column slot, resolved through column ids.

use crate::template::SheetTemplate;
use crate::types::{ReportError, Result};
use std::collections::{BTreeMap, HashMap};

/// Saved position -> current position. Saved slots whose column was deleted are absent.
pub type PositionMap = BTreeMap<usize, usize>;

/// Map a template's saved column positions onto the current column order.
///
/// Templates without an id map fall back to the identity map over the current
/// columns. Duplicate ids in `current_config_ids`, or two ids claiming one saved
/// slot, are rejected rather than resolved by insertion order.
pub fn build_position_map(template: Option<&SheetTemplate>, current_config_ids: &[String]) -> Result<PositionMap> {
    let current_id_to_pos = index_ids(current_config_ids)?;

    let column_map = match template.and_then(SheetTemplate::identity_map) {
        Some(map) => map,
        None => {
            if template.is_some() {
                log::warn!(
                    "template has no column id map; applying cosmetics positionally to {} columns",
                    current_config_ids.len()
                );
            }
            return Ok((0..current_config_ids.len()).map(|i| (i, i)).collect());
        }
    };

    let mut saved_pos_to_id: BTreeMap<usize, &str> = BTreeMap::new();
    for (id, &pos) in column_map {
        if let Some(other) = saved_pos_to_id.insert(pos, id.as_str()) {
            let (first, second) = if other <= id.as_str() { (other, id.as_str()) } else { (id.as_str(), other) };
            return Err(ReportError::DuplicateTemplatePosition {
                position: pos,
                first: first.to_string(),
                second: second.to_string(),
            });
        }
    }

    let map: PositionMap = saved_pos_to_id
        .into_iter()
        .filter_map(|(saved, id)| current_id_to_pos.get(id).map(|&current| (saved, current)))
        .collect();

    log::debug!(
        "position map resolved {} of {} saved columns",
        map.len(),
        column_map.len()
    );
    Ok(map)
}

/// Current position -> saved position.
pub fn reverse_position_map(map: &PositionMap) -> HashMap<usize, usize> {
    map.iter().map(|(&saved, &current)| (current, saved)).collect()
}

fn index_ids(ids: &[String]) -> Result<HashMap<&str, usize>> {
    let mut index = HashMap::with_capacity(ids.len());
    for (pos, id) in ids.iter().enumerate() {
        if index.insert(id.as_str(), pos).is_some() {
            return Err(ReportError::DuplicateColumnId(id.clone()));
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{capture_template, WorkbookSnapshot};

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn template_for(saved: &[&str]) -> SheetTemplate {
        capture_template(WorkbookSnapshot::default(), &ids(saved), 0)
    }

    #[test]
    fn test_reordered_columns() {
        let template = template_for(&["A", "B", "C"]);
        let map = build_position_map(Some(&template), &ids(&["B", "C", "A"])).unwrap();
        assert_eq!(map, PositionMap::from([(0, 2), (1, 0), (2, 1)]));
    }

    #[test]
    fn test_deleted_column_is_dropped() {
        let template = template_for(&["A", "B", "C"]);
        let map = build_position_map(Some(&template), &ids(&["C", "NEW", "A"])).unwrap();
        assert_eq!(map, PositionMap::from([(0, 2), (2, 0)]));
        assert!(!map.contains_key(&1));
    }

    #[test]
    fn test_identity_without_template_or_map() {
        let current = ids(&["x", "y"]);
        assert_eq!(
            build_position_map(None, &current).unwrap(),
            PositionMap::from([(0, 0), (1, 1)])
        );

        let mut legacy = template_for(&["y", "x"]);
        legacy.version = 1;
        assert_eq!(
            build_position_map(Some(&legacy), &current).unwrap(),
            PositionMap::from([(0, 0), (1, 1)])
        );
    }

    #[test]
    fn test_duplicate_current_ids_rejected() {
        let err = build_position_map(None, &ids(&["a", "b", "a"])).unwrap_err();
        assert!(matches!(err, ReportError::DuplicateColumnId(id) if id == "a"));
    }

    #[test]
    fn test_duplicate_saved_positions_rejected() {
        let mut template = template_for(&["a", "b"]);
        if let Some(map) = template.column_map.as_mut() {
            map.insert("b".to_string(), 0);
        }
        let err = build_position_map(Some(&template), &ids(&["a", "b"])).unwrap_err();
        match err {
            ReportError::DuplicateTemplatePosition { position, first, second } => {
                assert_eq!(position, 0);
                assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reverse_map() {
        let map = PositionMap::from([(0, 2), (1, 0)]);
        let reverse = reverse_position_map(&map);
        assert_eq!(reverse[&2], 0);
        assert_eq!(reverse[&0], 1);
        assert!(!reverse.contains_key(&1));
    }
}
