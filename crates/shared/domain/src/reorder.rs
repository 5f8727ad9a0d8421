//! Manual reordering of an indexed list.

use crate::error::{DomainError, DomainResult};
use crate::record::Indexed;

/// Move the element at `doc_index` to `to_place` and renumber every element.
///
/// Both positions refer to the sequence as given, so callers fetch ordered by
/// `index` first. The input is never modified; on a precondition failure the
/// caller still holds the original sequence.
pub fn reorder<T>(items: &[T], to_place: usize, doc_index: usize) -> DomainResult<Vec<T>>
where
    T: Indexed + Clone,
{
    let len = items.len();
    if len == 0 || to_place >= len || doc_index >= len {
        return Err(DomainError::wrong_input(format!(
            "cannot move position {} to {} in a list of {}",
            doc_index, to_place, len
        )));
    }

    let mut reordered = items.to_vec();
    let moved = reordered.remove(doc_index);
    reordered.insert(to_place, moved);

    for (position, item) in reordered.iter_mut().enumerate() {
        item.set_index(position);
    }

    Ok(reordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: &'static str,
        index: usize,
    }

    impl Indexed for Item {
        fn index(&self) -> usize {
            self.index
        }

        fn set_index(&mut self, index: usize) {
            self.index = index;
        }
    }

    fn items(names: &[&'static str]) -> Vec<Item> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| Item { name, index })
            .collect()
    }

    fn names(items: &[Item]) -> Vec<&'static str> {
        items.iter().map(|i| i.name).collect()
    }

    #[test]
    fn test_move_forward() {
        let result = reorder(&items(&["a", "b", "c", "d"]), 2, 0).unwrap();
        assert_eq!(names(&result), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_move_backward() {
        let result = reorder(&items(&["a", "b", "c", "d"]), 0, 3).unwrap();
        assert_eq!(names(&result), vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn test_same_position_is_noop() {
        let input = items(&["a", "b", "c"]);
        for position in 0..input.len() {
            assert_eq!(reorder(&input, position, position).unwrap(), input);
        }
    }

    #[test]
    fn test_indices_are_dense_and_set_preserved() {
        let input = items(&["a", "b", "c", "d", "e"]);
        for from in 0..input.len() {
            for to in 0..input.len() {
                let result = reorder(&input, to, from).unwrap();
                let indices: Vec<usize> = result.iter().map(|i| i.index).collect();
                assert_eq!(indices, (0..input.len()).collect::<Vec<_>>());

                let mut sorted = names(&result);
                sorted.sort_unstable();
                assert_eq!(sorted, names(&input));
                assert_eq!(result[to].name, input[from].name);
            }
        }
    }

    #[test]
    fn test_renumbers_unsorted_index_fields() {
        let input = vec![
            Item { name: "a", index: 4 },
            Item { name: "b", index: 9 },
        ];
        let result = reorder(&input, 0, 1).unwrap();
        assert_eq!(result[0], Item { name: "b", index: 0 });
        assert_eq!(result[1], Item { name: "a", index: 1 });
    }

    #[test]
    fn test_out_of_range_is_wrong_input() {
        let input = items(&["a", "b"]);
        assert!(matches!(reorder(&input, 2, 0), Err(DomainError::WrongInput(_))));
        assert!(matches!(reorder(&input, 0, 5), Err(DomainError::WrongInput(_))));
        assert_eq!(input, items(&["a", "b"]));
    }

    #[test]
    fn test_empty_input_is_wrong_input() {
        let input: Vec<Item> = Vec::new();
        assert!(matches!(reorder(&input, 0, 0), Err(DomainError::WrongInput(_))));
    }
}
