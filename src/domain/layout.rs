/// A visible column as seen by the sticky layout pass, in display order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutColumn<'a> {
    pub id: &'a str,
    pub width: f64,
    pub sticky: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StickyOffset {
    pub column_id: String,
    pub left: f64,
}

/// Left offsets for pinned columns: each sticky column starts where the
/// previous sticky column ends. Non-sticky columns are skipped and get no
/// offset, whatever their width.
pub fn sticky_offsets<'a, I>(columns: I) -> Vec<StickyOffset>
where
    I: IntoIterator<Item = LayoutColumn<'a>>,
{
    let mut left = 0.0;
    columns
        .into_iter()
        .filter(|column| column.sticky)
        .map(|column| {
            let offset = StickyOffset {
                column_id: column.id.to_string(),
                left,
            };
            left += column.width;
            offset
        })
        .collect()
}
