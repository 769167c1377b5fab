use super::{visible_columns, TableRow, TabularFormatter};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn display_width(field: &str) -> usize {
    field.chars().count()
}

pub struct TextFormatter<'a> {
    omit_fields: Vec<&'a str>,
    no_headers: bool,
    separator: &'a str,
}

impl<'a> TextFormatter<'a> {
    pub fn new(omit_fields: Vec<&'a str>, no_headers: bool, separator: &'a str) -> Self {
        Self {
            omit_fields,
            no_headers,
            separator,
        }
    }

    fn push_line(&self, output: &mut String, fields: &[(&str, usize)], bold: bool) {
        for (i, (field, width)) in fields.iter().enumerate() {
            if bold {
                output.push_str(BOLD);
                output.push_str(field);
                output.push_str(RESET);
            } else {
                output.push_str(field);
            }
            if i != fields.len() - 1 {
                output.push_str(&" ".repeat(width - display_width(field)));
                output.push_str(self.separator);
            }
        }
    }
}

impl TabularFormatter for TextFormatter<'_> {
    type Error = std::fmt::Error;

    fn format<R: TableRow>(&self, rows: &[R]) -> Result<String, Self::Error> {
        let visible = visible_columns(R::COLUMNS, &self.omit_fields);
        if visible.is_empty() {
            return Ok(String::new());
        }
        let cells: Vec<Vec<String>> = rows.iter().map(R::cells).collect();

        let widths: Vec<usize> = visible
            .iter()
            .map(|&i| {
                let title = if self.no_headers { 0 } else { display_width(R::COLUMNS[i].title) };
                cells
                    .iter()
                    .map(|row| display_width(&row[i]))
                    .fold(title, std::cmp::max)
            })
            .collect();

        let mut lines = Vec::with_capacity(rows.len() + 2);
        if !self.no_headers {
            let mut header = String::new();
            let titles: Vec<(&str, usize)> = visible
                .iter()
                .zip(&widths)
                .map(|(&i, &width)| (R::COLUMNS[i].title, width))
                .collect();
            self.push_line(&mut header, &titles, true);
            lines.push(header);
            let total = widths.iter().sum::<usize>() + (widths.len() - 1) * display_width(self.separator);
            lines.push("-".repeat(total));
        }
        for row in &cells {
            let mut line = String::new();
            let fields: Vec<(&str, usize)> = visible
                .iter()
                .zip(&widths)
                .map(|(&i, &width)| (row[i].as_str(), width))
                .collect();
            self.push_line(&mut line, &fields, false);
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }
}
