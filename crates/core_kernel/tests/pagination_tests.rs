//! Tests for pagination requests and pages

use core_kernel::{Page, PageRequest, SortDirection};

#[test]
fn test_default_request() {
    let request = PageRequest::default();
    assert_eq!(request.page, 0);
    assert_eq!(request.size, 10);
    assert_eq!(request.sort_dir, SortDirection::Asc);
    assert_eq!(request.offset(), 0);
}

#[test]
fn test_offset_uses_page_and_size() {
    let request = PageRequest::new(3, 20).sorted_by("claimDate", SortDirection::Desc);
    assert_eq!(request.offset(), 60);
    assert_eq!(request.sort_by.as_deref(), Some("claimDate"));
}

#[test]
fn test_from_sorted_slices_requested_page() {
    let rows: Vec<u32> = (0..23).collect();
    let page = Page::from_sorted(rows, &PageRequest::new(2, 10));

    assert_eq!(page.content, vec![20, 21, 22]);
    assert_eq!(page.total_elements, 23);
    assert_eq!(page.total_pages, 3);
    assert!(page.last);
}

#[test]
fn test_page_past_the_end_is_empty() {
    let page = Page::from_sorted(vec![1, 2, 3], &PageRequest::new(5, 10));
    assert!(page.is_empty());
    assert_eq!(page.total_elements, 3);
}

#[test]
fn test_map_preserves_metadata() {
    let page = Page::from_sorted(vec![1, 2, 3, 4], &PageRequest::new(0, 2));
    let mapped = page.map(|n| n.to_string());
    assert_eq!(mapped.content, vec!["1".to_string(), "2".to_string()]);
    assert_eq!(mapped.total_pages, 2);
    assert!(mapped.first);
    assert!(!mapped.last);
}

#[test]
fn test_page_serializes_camel_case() {
    let page = Page::from_sorted(vec![1], &PageRequest::default());
    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["totalElements"], 1);
    assert_eq!(json["totalPages"], 1);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_size_always_clamped(page in 0u32..1000, size in any::<u32>()) {
            let request = PageRequest::new(page, size);
            prop_assert!((1..=100).contains(&request.size));
        }

        #[test]
        fn test_pages_cover_every_row(total in 0usize..500, size in 1u32..50) {
            let rows: Vec<usize> = (0..total).collect();
            let first = Page::from_sorted(rows.clone(), &PageRequest::new(0, size));

            let mut seen = Vec::new();
            for index in 0..first.total_pages.max(1) {
                let page = Page::from_sorted(rows.clone(), &PageRequest::new(index, size));
                seen.extend(page.content);
            }
            prop_assert_eq!(seen, rows);
        }
    }
}
