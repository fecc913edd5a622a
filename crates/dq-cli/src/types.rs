use std::path::PathBuf;

#[derive(Debug)]
pub struct InspectResult {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

#[derive(Debug)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub nulls: usize,
}
