/// Direction in which slices are stacked, measured along the seed's normal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SliceOrder {
    Ascending,
    #[default]
    Descending,
}

/// How per-file attribute reads are scheduled while building the series table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadMode {
    #[default]
    Parallel,
    Sequential,
}

/// Options for one series resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeriesOptions {
    pub order: SliceOrder,
    pub read_mode: ReadMode,
}

impl SeriesOptions {
    pub fn with_order(mut self, order: SliceOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }
}
