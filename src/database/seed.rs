use serde::Serialize;

use crate::{error::TypeError, schema::MeasurementUnit};

/*
Ingredient seed data, one ingredient per line:

name,unit
абрикосовое варенье,г
"булгур, крупа",г
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientSeedRow {
    pub name: String,
    pub measurement_unit: MeasurementUnit,
}

impl TryFrom<&str> for IngredientSeedRow {
    type Error = TypeError;

    fn try_from(line: &str) -> Result<Self, Self::Error> {
        let fields = split_fields(line)?;

        let [name, unit] = <[String; 2]>::try_from(fields)
            .map_err(|_| TypeError::new("Invalid syntax; Expected two columns"))?;

        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(TypeError::new("Invalid syntax; Empty name"));
        }

        Ok(Self {
            name,
            measurement_unit: unit.parse()?,
        })
    }
}

impl From<&IngredientSeedRow> for String {
    fn from(row: &IngredientSeedRow) -> String {
        if row.name.contains([',', '"']) {
            format!("\"{}\",{}", row.name.replace('"', "\"\""), row.measurement_unit)
        } else {
            format!("{},{}", row.name, row.measurement_unit)
        }
    }
}

/// Outcome of parsing one non-blank line; `line` is 1-based.
#[derive(Debug)]
pub struct ParsedLine {
    pub line: usize,
    pub row: Result<IngredientSeedRow, TypeError>,
}

/// Parses every non-blank record. A quoted field may span several lines;
/// such a record is reported under the line it starts on.
pub fn parse_ingredient_csv(input: &str) -> Vec<ParsedLine> {
    split_records(input)
        .into_iter()
        .filter(|(_, record)| !record.trim().is_empty())
        .map(|(line, record)| ParsedLine {
            line,
            row: IngredientSeedRow::try_from(record.trim_end_matches('\r')),
        })
        .collect()
}

fn split_records(input: &str) -> Vec<(usize, String)> {
    let mut records = vec![];
    let mut record = String::new();
    let mut line = 1;
    let mut start = 1;
    let mut quoted = false;
    let mut field_blank = true;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                record.push(c);
                if chars.peek() == Some(&'"') {
                    chars.next();
                    record.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if field_blank => {
                record.push(c);
                quoted = true;
                field_blank = false;
            }
            '\n' if quoted => {
                record.push(c);
                line += 1;
            }
            '\n' => {
                records.push((start, std::mem::take(&mut record)));
                field_blank = true;
                line += 1;
                start = line;
            }
            ',' if !quoted => {
                record.push(c);
                field_blank = true;
            }
            _ => {
                record.push(c);
                field_blank &= c.is_whitespace();
            }
        }
    }

    if !record.is_empty() {
        records.push((start, record));
    }
    records
}

fn split_fields(line: &str) -> Result<Vec<String>, TypeError> {
    let mut fields = vec![];
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                quoted = true;
            }
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if quoted {
        return Err(TypeError::new(
            "Invalid syntax; Unterminated quote, the field runs to the end of the file",
        ));
    }
    fields.push(field);

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_row() {
        let row = IngredientSeedRow::try_from("абрикосы,г").unwrap();
        assert_eq!(row.name, "абрикосы");
        assert_eq!(row.measurement_unit, MeasurementUnit::Gram);
    }

    #[test]
    fn parses_quoted_name_with_comma() {
        let row = IngredientSeedRow::try_from("\"булгур, крупа\",г").unwrap();
        assert_eq!(row.name, "булгур, крупа");
    }

    #[test]
    fn parses_escaped_quotes() {
        let row = IngredientSeedRow::try_from("\"сыр \"\"Российский\"\"\",г").unwrap();
        assert_eq!(row.name, "сыр \"Российский\"");
        assert_eq!(String::from(&row), "\"сыр \"\"Российский\"\"\",г");
    }

    #[test]
    fn multi_word_units_are_accepted() {
        let row = IngredientSeedRow::try_from("соль,по вкусу").unwrap();
        assert_eq!(row.measurement_unit, MeasurementUnit::ToTaste);
        let row = IngredientSeedRow::try_from("сахар,ч. л.").unwrap();
        assert_eq!(row.measurement_unit, MeasurementUnit::Teaspoon);
    }

    #[test]
    fn rejects_wrong_column_count_and_unknown_unit() {
        assert!(IngredientSeedRow::try_from("абрикосы").is_err());
        assert!(IngredientSeedRow::try_from("абрикосы,г,лишнее").is_err());
        assert!(IngredientSeedRow::try_from("абрикосы,cl").is_err());
        assert!(IngredientSeedRow::try_from(",г").is_err());
        assert!(IngredientSeedRow::try_from("\"абрикосы,г").is_err());
    }

    #[test]
    fn csv_keeps_line_numbers_and_skips_blank_lines() {
        let parsed = parse_ingredient_csv("абрикосы,г\n\nавокадо,шт.\r\nмука,cl\n");

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].line, 1);
        assert_eq!(parsed[1].line, 3);
        assert_eq!(
            parsed[1].row.as_ref().unwrap().measurement_unit,
            MeasurementUnit::Piece
        );
        assert_eq!(parsed[2].line, 4);
        assert!(parsed[2].row.is_err());
    }

    #[test]
    fn quoted_names_may_span_lines() {
        let parsed = parse_ingredient_csv("\"булгур,\nкрупа\",г\nмука,г\n");

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].line, 1);
        assert_eq!(parsed[0].row.as_ref().unwrap().name, "булгур,\nкрупа");
        assert_eq!(parsed[1].line, 3);
        assert_eq!(parsed[1].row.as_ref().unwrap().name, "мука");
    }

    #[test]
    fn unterminated_quote_is_one_invalid_record() {
        let parsed = parse_ingredient_csv("абрикосы,г\n\"мука,г\nсоль,г\n");

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].line, 2);
        let error = parsed[1].row.as_ref().unwrap_err();
        assert!(error.to_string().contains("Unterminated quote"));
    }
}
