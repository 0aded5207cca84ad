use std::io::Read;

use crate::command::TransactionKind;
use csv::{DeserializeRecordsIntoIter, Trim};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// One line of a ledger script.
///
/// `account` and `to` are script-local aliases, bound to real account ids by `open` rows.
#[derive(Debug, Deserialize)]
pub struct ScriptRow {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub account: String,
    pub owner: Option<String>,
    pub to: Option<String>,
    #[serde(default, deserialize_with = "exact_decimal")]
    pub amount: Option<Decimal>,
}

// Read the amount as text, csv would otherwise route it through f64 and drop its scale.
fn exact_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| Decimal::from_str_exact(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

/// Parses a ledger script in CSV format, yielding each row with its line number.
pub struct CsvScriptParser<R> {
    iter: DeserializeRecordsIntoIter<R, ScriptRow>,
}

impl<R> CsvScriptParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R> Iterator for CsvScriptParser<R>
where
    R: Read,
{
    type Item = (u64, Result<ScriptRow, csv::Error>);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row))
    }
}
