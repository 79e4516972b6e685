//! Table output formatting

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

/// Format rows as a rounded table with centered headers
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(data);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Tabled)]
    struct Row {
        #[tabled(rename = "HANDLE")]
        handle: String,
        #[tabled(rename = "TWEETS")]
        tweets: usize,
    }

    #[test]
    fn test_empty() {
        let rows: Vec<Row> = vec![];
        assert_eq!(format_table(&rows), "No results found.");
    }

    #[test]
    fn test_rows_and_rounded_style() {
        let rows = vec![
            Row {
                handle: "jack".to_string(),
                tweets: 20,
            },
            Row {
                handle: "jill".to_string(),
                tweets: 3,
            },
        ];

        let result = format_table(&rows);

        assert!(result.contains("HANDLE"));
        assert!(result.contains("jill"));
        assert!(result.contains("20"));
        assert!(result.contains("╭"));
        assert!(result.contains("╰"));
    }
}
