//! Plain-text table with left-aligned columns.

use std::io::{self, Write};

const COLUMN_GAP: &str = "  ";

#[derive(Debug, Clone, Default)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Start a table with a header row.
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        table.add_row(header);
        table
    }

    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    /// Write every row, padding each column to its widest cell.
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let widths = self.column_widths();

        for row in &self.rows {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    line.push_str(COLUMN_GAP);
                }
                line.push_str(cell);
                let pad = widths[i].saturating_sub(cell.chars().count());
                line.extend(std::iter::repeat(' ').take(pad));
            }
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(())
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths = Vec::new();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let width = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) if *w < width => *w = width,
                    Some(_) => {}
                    None => widths.push(width),
                }
            }
        }
        widths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(table: &Table) -> String {
        let mut out = Vec::new();
        table.render(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_columns_are_left_aligned() {
        let mut table = Table::new(["PLUGIN", "NODE", "STATUS"]);
        table.add_row(["e2e", "global", "complete"]);
        table.add_row(["systemd-logs", "worker-1", "running"]);

        assert_eq!(
            rendered(&table),
            "PLUGIN        NODE      STATUS\n\
             e2e           global    complete\n\
             systemd-logs  worker-1  running\n"
        );
    }

    #[test]
    fn test_header_only() {
        let table = Table::new(["STATUS", "TEST"]);
        assert_eq!(rendered(&table), "STATUS  TEST\n");
    }

    #[test]
    fn test_width_counts_chars_not_bytes() {
        let mut table = Table::new(["A", "B"]);
        table.add_row(["ü", "x"]);
        assert_eq!(rendered(&table), "A  B\nü  x\n");
    }
}
