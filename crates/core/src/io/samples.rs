//! Sample-point files (CSV or JSON).
//!
//! CSV needs `x`, `y` and `label` columns (`lon`/`lat` and `class` are
//! accepted too) plus an optional `id`; every other column is read as a
//! numeric auxiliary attribute. JSON is an array of [`SamplePoint`] objects.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Error, Result};
use crate::vector::{Coordinate, SamplePoint};

/// Read sample points, choosing the format from the file extension
pub fn read_sample_points<P: AsRef<Path>>(path: P) -> Result<Vec<SamplePoint>> {
    let path = path.as_ref();
    let file = BufReader::new(File::open(path)?);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("json") | Some("geojson") => read_sample_points_json(file),
        Some("csv") => read_sample_points_csv(file),
        other => Err(Error::invalid_param(
            "samples",
            path.display(),
            format!("unsupported extension {:?}, expected .csv or .json", other),
        )),
    }
}

pub fn read_sample_points_json<R: Read>(reader: R) -> Result<Vec<SamplePoint>> {
    let mut points: Vec<SamplePoint> = serde_json::from_reader(reader)?;
    fill_missing_ids(&mut points);
    Ok(points)
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

pub fn read_sample_points_csv<R: Read>(reader: R) -> Result<Vec<SamplePoint>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let missing = |what: &str| Error::invalid_param("samples", what, "required CSV column not found");
    let x_col = find_column(&headers, &["x", "lon", "longitude"]).ok_or_else(|| missing("x"))?;
    let y_col = find_column(&headers, &["y", "lat", "latitude"]).ok_or_else(|| missing("y"))?;
    let label_col = find_column(&headers, &["label", "class"]).ok_or_else(|| missing("label"))?;
    let id_col = find_column(&headers, &["id"]);

    let parse = |field: &str, column: &str, line: usize| -> Result<f64> {
        field.parse::<f64>().map_err(|_| {
            Error::invalid_param("samples", field, format!("column '{}' on line {} is not numeric", column, line))
        })
    };

    let mut points = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = i + 2;
        let field = |col: usize| record.get(col).unwrap_or("");

        let mut point = SamplePoint::new(
            id_col.map(|c| field(c).to_string()).unwrap_or_default(),
            Coordinate::new(parse(field(x_col), "x", line)?, parse(field(y_col), "y", line)?),
            field(label_col),
        );

        for (col, name) in headers.iter().enumerate() {
            if [x_col, y_col, label_col].contains(&col) || Some(col) == id_col {
                continue;
            }
            let value = field(col);
            if value.is_empty() {
                continue;
            }
            point.attributes.insert(name.trim().to_string(), parse(value, name, line)?);
        }
        points.push(point);
    }

    fill_missing_ids(&mut points);
    Ok(points)
}

fn fill_missing_ids(points: &mut [SamplePoint]) {
    for (i, p) in points.iter_mut().enumerate() {
        if p.id.is_empty() {
            p.id = format!("P{}", i + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_with_auxiliary_columns() {
        let csv = "lon,lat,label,soil_moisture,temperature\n\
                   76.91,11.02,healthy,0.31,27.5\n\
                   76.93,11.05,stressed,0.12,\n";
        let points = read_sample_points_csv(csv.as_bytes()).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].id, "P1");
        assert_eq!(points[0].location, Coordinate::new(76.91, 11.02));
        assert_eq!(points[0].attributes["temperature"], 27.5);
        assert_eq!(points[1].label, "stressed");
        assert!(!points[1].attributes.contains_key("temperature"));
    }

    #[test]
    fn test_csv_missing_label_column() {
        let csv = "x,y,state\n1,2,healthy\n";
        assert!(read_sample_points_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_csv_non_numeric_attribute() {
        let csv = "id,x,y,label,ph\nf1,1,2,healthy,acidic\n";
        let err = read_sample_points_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_json_points() {
        let json = r#"[{"x": 1.0, "y": 2.0, "label": "saline"}]"#;
        let points = read_sample_points_json(json.as_bytes()).unwrap();
        assert_eq!(points[0].id, "P1");
        assert_eq!(points[0].label, "saline");
    }
}
