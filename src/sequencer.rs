use std::cmp::Ordering;

use crate::{
    enums::SliceOrder,
    series_table::{AttributeRecord, SeriesTable},
};

/// Order the table by projection onto the reference normal.
///
/// Equal projections fall back to the file path, so the key is unique and
/// [`SliceOrder::Descending`] is exactly the reverse of
/// [`SliceOrder::Ascending`].
pub fn sequence(table: &mut SeriesTable, order: SliceOrder) {
    match order {
        SliceOrder::Ascending => table.records.sort_unstable_by(ascending),
        SliceOrder::Descending => table.records.sort_unstable_by(|a, b| ascending(b, a)),
    }
}

fn ascending(a: &AttributeRecord, b: &AttributeRecord) -> Ordering {
    a.projection
        .total_cmp(&b.projection)
        .then_with(|| a.path.cmp(&b.path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        enums::ReadMode,
        series_table::ReferenceDescriptor,
        source::fake::{FakeSource, slice},
    };
    use std::path::PathBuf;

    const AXIAL: &str = "1\\0\\0\\0\\1\\0";

    fn table(positions: &[&str]) -> SeriesTable {
        let mut source = FakeSource::default();
        let paths: Vec<PathBuf> = positions
            .iter()
            .enumerate()
            .map(|(i, position)| source.insert(&format!("/s/{i}"), slice("A", AXIAL, position)))
            .collect();
        let reference = ReferenceDescriptor::from_attributes(&paths[0], &source.files[&paths[0]]);
        SeriesTable::build(&source, &paths, &reference, ReadMode::Sequential)
    }

    fn positions(table: &SeriesTable) -> Vec<&str> {
        table.records.iter().map(|r| r.position.as_str()).collect()
    }

    #[test]
    fn sorts_by_projection_in_both_directions() {
        let mut table = table(&["0\\0\\5", "0\\0\\10", "0\\0\\0"]);

        sequence(&mut table, SliceOrder::Ascending);
        assert_eq!(positions(&table), ["0\\0\\0", "0\\0\\5", "0\\0\\10"]);

        sequence(&mut table, SliceOrder::Descending);
        assert_eq!(positions(&table), ["0\\0\\10", "0\\0\\5", "0\\0\\0"]);
    }

    #[test]
    fn in_plane_offsets_do_not_affect_order() {
        let mut table = table(&["100\\-3\\2", "-50\\7\\1"]);

        sequence(&mut table, SliceOrder::Ascending);

        assert_eq!(positions(&table), ["-50\\7\\1", "100\\-3\\2"]);
    }

    #[test]
    fn descending_is_the_exact_reverse_even_with_ties() {
        let mut ascending = table(&["0\\0\\1", "5\\0\\1", "0\\0\\-2", "", "0\\0\\1"]);
        let mut descending = ascending.clone();

        sequence(&mut ascending, SliceOrder::Ascending);
        sequence(&mut descending, SliceOrder::Descending);

        let mut reversed = ascending.into_paths();
        reversed.reverse();
        assert_eq!(descending.into_paths(), reversed);
    }

    #[test]
    fn nan_projection_does_not_panic() {
        let mut table = table(&["0\\0\\1", "0\\0\\0"]);
        table.records[0].projection = f64::NAN;

        sequence(&mut table, SliceOrder::Ascending);

        assert_eq!(table.len(), 2);
    }
}
