use serde_json::{Map, Value};

use super::{visible_columns, TableRow, TabularFormatter};

pub struct JsonFormatter<'a> {
    omit_fields: Vec<&'a str>,
    no_headers: bool,
}

impl<'a> JsonFormatter<'a> {
    pub fn new(omit_fields: Vec<&'a str>, no_headers: bool) -> Self {
        Self {
            omit_fields,
            no_headers,
        }
    }
}

impl TabularFormatter for JsonFormatter<'_> {
    type Error = serde_json::Error;

    fn format<R: TableRow>(&self, rows: &[R]) -> Result<String, Self::Error> {
        let visible = visible_columns(R::COLUMNS, &self.omit_fields);
        let json_rows: Vec<Value> = rows
            .iter()
            .map(|row| {
                let cells = row.cells();
                if self.no_headers {
                    Value::Array(
                        visible
                            .iter()
                            .map(|&i| Value::String(cells[i].clone()))
                            .collect(),
                    )
                } else {
                    let object: Map<String, Value> = visible
                        .iter()
                        .map(|&i| (R::COLUMNS[i].key.to_string(), Value::String(cells[i].clone())))
                        .collect();
                    Value::Object(object)
                }
            })
            .collect();
        serde_json::to_string(&json_rows)
    }
}
