use super::*;

#[test]
fn new_rejects_empty_dimensions() {
    assert!(FrameBuffer::new(0, 4).is_err());
    assert!(FrameBuffer::new(4, 0).is_err());
    let fb = FrameBuffer::new(5, 3).unwrap();
    assert_eq!(fb.data().len(), 5 * 3 * 3);
    assert_eq!(fb.stride(), 15);
}

#[test]
fn partition_covers_every_row_exactly_once() {
    for height in 1u32..=37 {
        for workers in 1usize..=9 {
            let mut fb = FrameBuffer::new(3, height).unwrap();
            let sets = fb.partition_rows(workers);
            assert_eq!(sets.len(), workers);

            let mut seen = vec![0u32; height as usize];
            for set in &sets {
                for row in set.row_indices() {
                    assert_eq!(row as usize % workers, set.worker());
                    seen[row as usize] += 1;
                }
            }
            assert!(
                seen.iter().all(|&n| n == 1),
                "height={height} workers={workers} seen={seen:?}"
            );
        }
    }
}

#[test]
fn partition_rows_are_strided_and_ascending() {
    let mut fb = FrameBuffer::new(2, 10).unwrap();
    let sets = fb.partition_rows(4);
    let rows: Vec<Vec<u32>> = sets.iter().map(|s| s.row_indices().collect()).collect();
    assert_eq!(rows[0], vec![0, 4, 8]);
    assert_eq!(rows[1], vec![1, 5, 9]);
    assert_eq!(rows[2], vec![2, 6]);
    assert_eq!(rows[3], vec![3, 7]);
}

#[test]
fn more_workers_than_rows_leaves_empty_sets() {
    let mut fb = FrameBuffer::new(2, 2).unwrap();
    let sets = fb.partition_rows(5);
    assert_eq!(sets.iter().filter(|s| s.is_empty()).count(), 3);
}

#[test]
fn writes_through_row_slices_land_in_place() {
    let mut fb = FrameBuffer::new(2, 3).unwrap();
    for set in fb.partition_rows(2) {
        for (row, slice) in set {
            slice.fill(row as u8 + 1);
        }
    }
    assert_eq!(fb.pixel(0, 0), Some([1, 1, 1]));
    assert_eq!(fb.pixel(1, 2), Some([3, 3, 3]));
    assert_eq!(fb.pixel(2, 0), None);
}
