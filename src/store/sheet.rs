//! Tab-separated sheet codec
//!
//! The persisted store is a plain-text sheet: one header line, then one line
//! per row. Each row is `status_cell <TAB> link <TAB> extra fields...`. The
//! status cell is the presentation of the link column; a row counts as
//! processed only when the status cell holds exactly [`PROCESSED_MARKER`].

/// The exact marker value that designates a row as processed
///
/// Matching is exact: any other value in the status cell, including a
/// different case, is not recognized as processed.
pub const PROCESSED_MARKER: &str = "done";

/// One raw row of the sheet, whether tracked or not
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetRow {
    /// The status cell carrying the processed marker, or empty
    pub status: String,
    /// The payload cells; the first one is the link
    pub cells: Vec<String>,
}

impl SheetRow {
    /// The row's link cell, if present and non-empty
    pub fn link(&self) -> Option<&str> {
        self.cells
            .first()
            .map(String::as_str)
            .filter(|link| !link.trim().is_empty())
    }

    /// Whether the status cell carries the exact processed marker
    pub fn is_processed(&self) -> bool {
        self.status == PROCESSED_MARKER
    }
}

/// In-memory model of a parsed sheet file
///
/// Keeps every raw row, including rows without a link, so that a commit
/// rewrites the file without dropping or reordering anything.
#[derive(Clone, Debug)]
pub struct Sheet {
    header: String,
    rows: Vec<SheetRow>,
}

impl Sheet {
    /// Parse sheet content. The first line is the header and is skipped.
    ///
    /// Returns a human-readable reason on failure; the caller wraps it into
    /// the store error taxonomy.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut lines = content.lines();
        let header = match lines.next() {
            Some(line) => line.to_string(),
            None => return Err("sheet is empty (missing header row)".to_string()),
        };

        let rows = lines
            .map(|line| {
                let mut cells = line.split('\t').map(str::to_string);
                // split always yields at least one item
                let status = cells.next().unwrap_or_default();
                SheetRow {
                    status,
                    cells: cells.collect(),
                }
            })
            .collect();

        Ok(Self { header, rows })
    }

    /// All raw rows in file order
    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    /// Write the processed marker into the status cell of the given raw row
    ///
    /// Returns the previous status cell value so a failed commit can be
    /// rolled back, or `None` if the row does not exist.
    pub fn apply_marker(&mut self, row: usize) -> Option<String> {
        let row = self.rows.get_mut(row)?;
        Some(std::mem::replace(
            &mut row.status,
            PROCESSED_MARKER.to_string(),
        ))
    }

    /// Restore a previously replaced status cell value
    pub fn restore_status(&mut self, row: usize, status: String) {
        if let Some(row) = self.rows.get_mut(row) {
            row.status = status;
        }
    }

    /// Render the sheet back to file content
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.header.len() + self.rows.len() * 32);
        out.push_str(&self.header);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.status);
            for cell in &row.cells {
                out.push('\t');
                out.push_str(cell);
            }
            out.push('\n');
        }
        out
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "status\tlink\tformat\tsize\n\
        \thttps://t.me/c/100/1\tmp4\t12MB\n\
        done\thttps://t.me/c/100/2\tmkv\t700MB\n\
        \t\tmp4\t3MB\n";

    #[test]
    fn parse_skips_header_and_keeps_every_row() {
        let sheet = Sheet::parse(SAMPLE).unwrap();
        assert_eq!(sheet.rows().len(), 3);
    }

    #[test]
    fn row_without_link_reports_none() {
        let sheet = Sheet::parse(SAMPLE).unwrap();
        assert!(sheet.rows()[2].link().is_none());
    }

    #[test]
    fn exact_marker_is_processed() {
        let sheet = Sheet::parse(SAMPLE).unwrap();
        assert!(!sheet.rows()[0].is_processed());
        assert!(sheet.rows()[1].is_processed());
    }

    #[test]
    fn marker_match_is_exact_not_case_insensitive() {
        let content = "status\tlink\nDONE\thttps://t.me/c/1/1\ndone \thttps://t.me/c/1/2\n";
        let sheet = Sheet::parse(content).unwrap();
        assert!(!sheet.rows()[0].is_processed(), "DONE is not the marker");
        assert!(
            !sheet.rows()[1].is_processed(),
            "trailing whitespace is not the marker"
        );
    }

    #[test]
    fn empty_content_fails_to_parse() {
        assert!(Sheet::parse("").is_err());
    }

    #[test]
    fn header_only_sheet_has_no_rows() {
        let sheet = Sheet::parse("status\tlink\n").unwrap();
        assert!(sheet.rows().is_empty());
    }

    #[test]
    fn apply_marker_returns_previous_status() {
        let mut sheet = Sheet::parse(SAMPLE).unwrap();
        let previous = sheet.apply_marker(0).unwrap();
        assert_eq!(previous, "");
        assert!(sheet.rows()[0].is_processed());
    }

    #[test]
    fn apply_marker_out_of_range_is_none() {
        let mut sheet = Sheet::parse(SAMPLE).unwrap();
        assert!(sheet.apply_marker(99).is_none());
    }

    #[test]
    fn restore_status_undoes_apply_marker() {
        let mut sheet = Sheet::parse(SAMPLE).unwrap();
        let previous = sheet.apply_marker(0).unwrap();
        sheet.restore_status(0, previous);
        assert!(!sheet.rows()[0].is_processed());
    }

    #[test]
    fn render_round_trips_content() {
        let sheet = Sheet::parse(SAMPLE).unwrap();
        assert_eq!(sheet.render(), SAMPLE);
    }

    #[test]
    fn render_after_marking_carries_the_marker() {
        let mut sheet = Sheet::parse(SAMPLE).unwrap();
        sheet.apply_marker(0);
        let rendered = sheet.render();
        let reparsed = Sheet::parse(&rendered).unwrap();
        assert!(reparsed.rows()[0].is_processed());
        assert_eq!(reparsed.rows().len(), 3, "no rows dropped by rewrite");
    }

    #[test]
    fn whitespace_only_link_reports_none() {
        let sheet = Sheet::parse("status\tlink\n\t   \n").unwrap();
        assert!(sheet.rows()[0].link().is_none());
    }
}
