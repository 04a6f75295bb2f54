//! Delimited-text export of table rows.

use serde_json::Value;

use crate::Row;

pub const FIELD_SEPARATOR: char = ';';
pub const ROW_SEPARATOR: &str = "\r\n";

/// Header row first, then one line per record; `headers` are also the keys
/// looked up in each record. Null and missing values render empty.
pub fn to_delimited(data: &[Row], headers: &[String]) -> String {
    let mut lines = Vec::with_capacity(data.len() + 1);
    lines.push(join_cells(headers.iter().map(|header| escape(header))));
    for record in data {
        lines.push(join_cells(
            headers
                .iter()
                .map(|header| escape(&render(record.get(header)))),
        ));
    }
    lines.join(ROW_SEPARATOR)
}

fn join_cells(cells: impl Iterator<Item = String>) -> String {
    cells.collect::<Vec<_>>().join(&FIELD_SEPARATOR.to_string())
}

fn render(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(other) => other.to_string(),
    }
}

fn escape(cell: &str) -> String {
    if cell.contains([FIELD_SEPARATOR, '"', '\r', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    #[test]
    fn writes_header_row_then_records_with_crlf() {
        let data = vec![
            row(json!({"algorithm": "CrowdTruth", "fmeasure": 0.5})),
            row(json!({"algorithm": "MajorityVoting", "fmeasure": null})),
        ];
        let headers = vec!["algorithm".to_string(), "fmeasure".to_string()];

        assert_eq!(
            to_delimited(&data, &headers),
            "algorithm;fmeasure\r\nCrowdTruth;0.5\r\nMajorityVoting;"
        );
    }

    #[test]
    fn missing_fields_render_empty() {
        let data = vec![row(json!({"emeId": "1", "A": "fp"}))];
        let headers = vec!["emeId".to_string(), "A".to_string(), "B".to_string()];
        assert_eq!(to_delimited(&data, &headers), "emeId;A;B\r\n1;fp;");
    }

    #[test]
    fn quotes_cells_containing_separators() {
        let data = vec![row(json!({"emeText": "a;b \"c\""}))];
        let headers = vec!["emeText".to_string()];
        assert_eq!(
            to_delimited(&data, &headers),
            "emeText\r\n\"a;b \"\"c\"\"\""
        );
    }

    #[test]
    fn empty_data_yields_header_only() {
        let headers = vec!["type".to_string(), "value".to_string()];
        assert_eq!(to_delimited(&[], &headers), "type;value");
    }
}
