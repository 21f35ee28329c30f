use anyhow::bail;
use serde_json::{Map, Value};

use crate::record::StudentRecord;

pub struct SheetImport {
    pub records: Vec<StudentRecord>,
    pub skipped_rows: usize,
    pub recognized_columns: usize,
}

/// Convert a spreadsheet values table (header row + cell rows, the shape the
/// upstream spreadsheet API returns) into normalized records. Headers are
/// matched after case and accent folding, so "Média", "media" and "MEDIA"
/// all map to the same field. Unrecognized columns are ignored; blank rows
/// are skipped and counted.
pub fn records_from_values(values: &Value) -> anyhow::Result<SheetImport> {
    let Some(rows) = values.as_array() else {
        bail!("values must be an array of rows");
    };
    let Some(header) = rows.first() else {
        bail!("values table has no header row");
    };
    let Some(header_cells) = header.as_array() else {
        bail!("header row must be an array of cells");
    };

    let columns: Vec<Option<&'static str>> = header_cells
        .iter()
        .map(|cell| cell.as_str().and_then(canonical_field))
        .collect();
    let recognized_columns = columns.iter().filter(|c| c.is_some()).count();
    if recognized_columns == 0 {
        bail!("no recognized columns in header row");
    }

    let mut records = Vec::new();
    let mut skipped_rows = 0usize;
    for row in rows.iter().skip(1) {
        let Some(cells) = row.as_array() else {
            skipped_rows += 1;
            continue;
        };

        let mut fields = Map::new();
        for (idx, field) in columns.iter().enumerate() {
            let Some(field) = field else {
                continue;
            };
            let Some(cell) = cells.get(idx) else {
                continue;
            };
            if cell_is_blank(cell) {
                continue;
            }
            fields.insert((*field).to_string(), cell.clone());
        }

        if fields.is_empty() {
            skipped_rows += 1;
            continue;
        }
        records.push(StudentRecord::from_value(&Value::Object(fields)));
    }

    Ok(SheetImport {
        records,
        skipped_rows,
        recognized_columns,
    })
}

fn cell_is_blank(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Map one header cell to the canonical record field it feeds.
fn canonical_field(header: &str) -> Option<&'static str> {
    match fold_header(header).as_str() {
        "nome" | "aluno" | "nomedoaluno" => Some("nome"),
        "faltas" | "totaldefaltas" => Some("faltas"),
        "nota1" => Some("nota1"),
        "nota2" => Some("nota2"),
        "nota3" => Some("nota3"),
        "mundodotrabalho1" | "mundotrabalho1" | "mt1" => Some("mundoTrabalho1"),
        "mundodotrabalho2" | "mundotrabalho2" | "mt2" => Some("mundoTrabalho2"),
        "mundodotrabalho3" | "mundotrabalho3" | "mt3" => Some("mundoTrabalho3"),
        "convivio1" => Some("convivio1"),
        "convivio2" => Some("convivio2"),
        "convivio3" => Some("convivio3"),
        "media" | "mediafinal" => Some("media"),
        "situacao" => Some("situacao"),
        "curso" => Some("curso"),
        "origem" | "codigodeorigem" => Some("origem"),
        "periodo" => Some("periodo"),
        _ => None,
    }
}

/// Lowercase, strip accents, and drop everything but letters and digits, so
/// header spelling variations collapse to one key.
fn fold_header(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => Some('a'),
            'é' | 'ê' => Some('e'),
            'í' => Some('i'),
            'ó' | 'ô' | 'õ' => Some('o'),
            'ú' | 'ü' => Some('u'),
            'ç' => Some('c'),
            c if c.is_ascii_alphanumeric() => Some(c),
            _ => None,
        })
        .collect()
}
