use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::marker::PhantomData;
use std::path::Path;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::aggregator::AggregationTable;
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::puzzle::{PuzzleCatalog, PuzzleId, PuzzleInstance, PuzzleSet, PuzzleType};

#[derive(Deserialize, Debug, Clone)]
struct PuzzleInfoRow {
    puzzle_type: String,
    allowed_moves: String,
}

#[derive(Deserialize, Debug, Clone)]
struct PuzzleRow {
    id: PuzzleId,
    puzzle_type: String,
    solution_state: String,
    initial_state: String,
    num_wildcards: usize,
}

#[derive(Deserialize, Debug, Clone)]
struct PuzzleTypeRow {
    id: PuzzleId,
    puzzle_type: String,
}

/// One `id,moves` row of a submission or candidate source.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub id: PuzzleId,
    pub moves: String,
}

/// How strictly the header of a file is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Columns must be exactly these, in this order.
    Exact,
    /// Columns must include these; others are ignored.
    Contains,
}

/// Typed streaming reader over the rows of one CSV source.
pub struct Records<R, T> {
    source_name: String,
    reader: csv::Reader<R>,
    headers: csv::StringRecord,
    config: ReaderConfig,
    _row: PhantomData<T>,
}

pub type CandidateRows<R> = Records<R, CandidateRow>;

impl<R: Read, T: DeserializeOwned> Records<R, T> {
    pub fn new(source_name: &str, rdr: R, columns: &[&str], schema: Schema, config: ReaderConfig) -> Result<Records<R, T>> {
        let mut reader = csv::ReaderBuilder::new().from_reader(rdr);
        let headers = reader.headers()?.clone();
        let ok = match schema {
            Schema::Exact => headers.iter().eq(columns.iter().copied()),
            Schema::Contains => columns.iter().all(|c| headers.iter().any(|h| h == *c)),
        };
        if !ok {
            return Err(Error::Schema {
                source_name: source_name.to_owned(),
                expected: columns.iter().map(|c| c.to_string()).collect(),
                actual: headers.iter().map(str::to_owned).collect(),
            });
        }
        Ok(Records {
            source_name: source_name.to_owned(),
            reader,
            headers,
            config,
            _row: PhantomData,
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    fn decode(&self, record: &csv::StringRecord) -> Result<T> {
        if let Some(len) = record.iter().map(str::len).max() {
            if len > self.config.max_field_len {
                return Err(Error::FieldTooLarge {
                    source_name: self.source_name.clone(),
                    line: record.position().map_or(0, |p| p.line()),
                    len,
                    limit: self.config.max_field_len,
                });
            }
        }
        Ok(record.deserialize(Some(&self.headers))?)
    }
}

impl<R: Read, T: DeserializeOwned> Iterator for Records<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = csv::StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(false) => None,
            Ok(true) => Some(self.decode(&record)),
            Err(e) => Some(Err(e.into())),
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

fn parse_allowed_moves(raw: &str) -> Result<Vec<(String, Vec<usize>)>> {
    // puzzle_info.csv holds python dict literals
    let moves: BTreeMap<String, Vec<usize>> = serde_json::from_str(&raw.replace('\'', "\""))?;
    Ok(moves.into_iter().collect())
}

pub fn read_catalog<R: Read>(source_name: &str, rdr: R, config: ReaderConfig) -> Result<PuzzleCatalog> {
    let rows = Records::<R, PuzzleInfoRow>::new(source_name, rdr, &["puzzle_type", "allowed_moves"], Schema::Contains, config)?;
    let mut catalog = PuzzleCatalog::new();
    for row in rows {
        let row = row?;
        let moves = parse_allowed_moves(&row.allowed_moves)?;
        catalog.insert(PuzzleType::new(row.puzzle_type, moves)?);
    }
    debug!("{source_name}: {} puzzle types", catalog.len());
    Ok(catalog)
}

pub fn read_puzzles<R: Read>(source_name: &str, rdr: R, catalog: &PuzzleCatalog, config: ReaderConfig) -> Result<PuzzleSet> {
    let columns = ["id", "puzzle_type", "solution_state", "initial_state", "num_wildcards"];
    let rows = Records::<R, PuzzleRow>::new(source_name, rdr, &columns, Schema::Contains, config)?;
    let mut puzzles = vec![];
    for row in rows {
        let row = row?;
        let goal: Vec<&str> = row.solution_state.split(';').collect();
        let init: Vec<&str> = row.initial_state.split(';').collect();
        puzzles.push(PuzzleInstance::from_catalog(catalog, row.id, &row.puzzle_type, &init, &goal, row.num_wildcards)?);
    }
    debug!("{source_name}: {} puzzles", puzzles.len());
    PuzzleSet::new(puzzles)
}

/// Puzzle type by id, without building the instances.
pub fn read_puzzle_types<R: Read>(source_name: &str, rdr: R, config: ReaderConfig) -> Result<HashMap<PuzzleId, String>> {
    let rows = Records::<R, PuzzleTypeRow>::new(source_name, rdr, &["id", "puzzle_type"], Schema::Contains, config)?;
    let mut types = HashMap::new();
    for row in rows {
        let row = row?;
        if types.insert(row.id, row.puzzle_type).is_some() {
            return Err(Error::DuplicatePuzzleId(row.id));
        }
    }
    Ok(types)
}

/// A submission must be exactly `id,moves`; candidate sources may carry more columns.
pub fn candidate_rows<R: Read>(source_name: &str, rdr: R, schema: Schema, config: ReaderConfig) -> Result<CandidateRows<R>> {
    Records::new(source_name, rdr, &["id", "moves"], schema, config)
}

pub fn load_catalog(path: &Path, config: ReaderConfig) -> Result<PuzzleCatalog> {
    read_catalog(&path.display().to_string(), open(path)?, config)
}

pub fn load_puzzles(path: &Path, catalog: &PuzzleCatalog, config: ReaderConfig) -> Result<PuzzleSet> {
    read_puzzles(&path.display().to_string(), open(path)?, catalog, config)
}

pub fn load_puzzle_types(path: &Path, config: ReaderConfig) -> Result<HashMap<PuzzleId, String>> {
    read_puzzle_types(&path.display().to_string(), open(path)?, config)
}

pub fn open_candidates(path: &Path, schema: Schema, config: ReaderConfig) -> Result<CandidateRows<BufReader<File>>> {
    candidate_rows(&path.display().to_string(), open(path)?, schema, config)
}

/// Writes `id,moves` rows in ascending id order.
pub fn write_table<W: Write>(wtr: W, table: &AggregationTable) -> Result<()> {
    let mut writer = csv::Writer::from_writer(wtr);
    writer.write_record(["id", "moves"])?;
    for (id, entry) in table.iter() {
        writer.write_record([id.to_string(), entry.candidate.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_table(path: &Path, table: &AggregationTable) -> Result<()> {
    write_table(BufWriter::new(File::create(path)?), table)
}
