use crate::{DatasetError, DestinationRecord, DocumentMetadata, TravelDocument};
use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

pub const DEFAULT_DATASET_FILE: &str = "Vacation_Bot_INR_Dataset.csv";

const COLUMN_DESTINATION: &str = "Destination";
const COLUMN_LOCATION: &str = "Location";
const COLUMN_RESORT_NAME: &str = "Resort_Name";
const COLUMN_PRICE: &str = "Price_INR";
const COLUMN_RATING: &str = "Rating";
const COLUMN_FACILITIES: &str = "Facilities";
const COLUMN_BEST_SEASON: &str = "Best_Season";
const COLUMN_DESCRIPTION: &str = "Description";

#[derive(Debug, Clone)]
pub struct DatasetSummary {
    pub rows: usize,
    pub checksum: String,
}

pub struct Dataset {
    pub records: Vec<DestinationRecord>,
    pub summary: DatasetSummary,
}

/// Reads the whole dataset. A missing file is fatal; missing columns and empty
/// cells read as "".
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    if !path.is_file() {
        return Err(DatasetError::MissingDataset(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    let records = parse_records(&bytes)?;
    let summary = DatasetSummary {
        rows: records.len(),
        checksum: digest_bytes(&bytes),
    };

    Ok(Dataset { records, summary })
}

pub fn parse_records(bytes: &[u8]) -> Result<Vec<DestinationRecord>, DatasetError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::from_headers(&headers);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(columns.record(&row));
    }

    Ok(records)
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

struct ColumnIndex {
    destination: Option<usize>,
    location: Option<usize>,
    resort_name: Option<usize>,
    price: Option<usize>,
    rating: Option<usize>,
    facilities: Option<usize>,
    best_season: Option<usize>,
    description: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Self {
        let position = |name: &str| headers.iter().position(|header| header.trim() == name);
        Self {
            destination: position(COLUMN_DESTINATION),
            location: position(COLUMN_LOCATION),
            resort_name: position(COLUMN_RESORT_NAME),
            price: position(COLUMN_PRICE),
            rating: position(COLUMN_RATING),
            facilities: position(COLUMN_FACILITIES),
            best_season: position(COLUMN_BEST_SEASON),
            description: position(COLUMN_DESCRIPTION),
        }
    }

    fn record(&self, row: &StringRecord) -> DestinationRecord {
        let field = |column: Option<usize>| {
            column
                .and_then(|index| row.get(index))
                .unwrap_or_default()
                .to_string()
        };

        DestinationRecord {
            destination: field(self.destination),
            location: field(self.location),
            resort_name: field(self.resort_name),
            price_inr: field(self.price),
            rating: field(self.rating),
            facilities: field(self.facilities),
            best_season: field(self.best_season),
            description: field(self.description),
        }
    }
}

pub fn build_document(index: usize, record: &DestinationRecord) -> TravelDocument {
    let content = format!(
        "Destination: {}. Location: {}. Resort Name: {}. Price per night: ₹{}. Rating: {}. \
         Facilities: {}. Best Season: {}. Description: {}.",
        record.destination,
        record.location,
        record.resort_name,
        record.price_inr,
        record.rating,
        record.facilities,
        record.best_season,
        record.description,
    );

    TravelDocument {
        id: index as u64,
        content,
        metadata: DocumentMetadata {
            destination: record.destination.clone(),
            location: record.location.clone(),
            price: record.price_inr.clone(),
            rating: record.rating.clone(),
            season: record.best_season.clone(),
        },
    }
}

pub fn build_documents(records: &[DestinationRecord]) -> Vec<TravelDocument> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| build_document(index, record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{build_document, build_documents, load_dataset, parse_records};
    use crate::{DatasetError, DestinationRecord};
    use std::fs;
    use tempfile::tempdir;

    const SAMPLE: &str = "\
Destination,Location,Resort_Name,Price_INR,Rating,Facilities,Best_Season,Description
Goa,India,Taj Exotica,18500,4.7,\"Pool, Spa, Beach Access\",November-February,Quiet luxury on Benaulim beach
Manali,India,Snow Valley Resorts,7200,4.3,\"Heater, Mountain View\",March-June,Cozy hill retreat near Mall Road
Dubai,UAE,Atlantis The Palm,42000,4.8,\"Waterpark, Aquarium\",November-March,Iconic resort on the Palm
";

    #[test]
    fn document_content_contains_every_non_empty_field() -> Result<(), Box<dyn std::error::Error>> {
        let records = parse_records(SAMPLE.as_bytes())?;
        let documents = build_documents(&records);

        assert_eq!(documents.len(), records.len());
        for (record, document) in records.iter().zip(&documents) {
            for value in [
                &record.destination,
                &record.location,
                &record.resort_name,
                &record.price_inr,
                &record.rating,
                &record.facilities,
                &record.best_season,
                &record.description,
            ] {
                if !value.is_empty() {
                    assert!(
                        document.content.contains(value.as_str()),
                        "{value} missing from {}",
                        document.content
                    );
                }
            }
            assert_eq!(document.metadata.price, record.price_inr);
            assert_eq!(document.metadata.rating, record.rating);
            assert_eq!(document.metadata.season, record.best_season);
        }
        Ok(())
    }

    #[test]
    fn documents_are_keyed_by_row_position() -> Result<(), Box<dyn std::error::Error>> {
        let records = parse_records(SAMPLE.as_bytes())?;
        let ids: Vec<u64> = build_documents(&records).iter().map(|doc| doc.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn blurb_follows_fixed_layout() {
        let record = DestinationRecord {
            destination: "Goa".to_string(),
            location: "India".to_string(),
            resort_name: "Taj Exotica".to_string(),
            price_inr: "18500".to_string(),
            rating: "4.7".to_string(),
            facilities: "Pool".to_string(),
            best_season: "Winter".to_string(),
            description: "Beachfront".to_string(),
        };

        let document = build_document(4, &record);
        assert_eq!(
            document.content,
            "Destination: Goa. Location: India. Resort Name: Taj Exotica. Price per night: ₹18500. \
             Rating: 4.7. Facilities: Pool. Best Season: Winter. Description: Beachfront."
        );
        assert_eq!(document.id, 4);
        assert_eq!(document.metadata.destination, "Goa");
        assert_eq!(document.metadata.location, "India");
    }

    #[test]
    fn missing_columns_and_cells_default_to_empty() -> Result<(), Box<dyn std::error::Error>> {
        let csv = "Destination,Price_INR,Rating\nShimla,,4.1\nOoty\n";
        let records = parse_records(csv.as_bytes())?;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].destination, "Shimla");
        assert_eq!(records[0].price_inr, "");
        assert_eq!(records[0].rating, "4.1");
        assert_eq!(records[0].best_season, "");
        assert_eq!(records[1].destination, "Ooty");
        assert_eq!(records[1].rating, "");
        Ok(())
    }

    #[test]
    fn missing_dataset_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("absent.csv");

        match load_dataset(&path) {
            Err(DatasetError::MissingDataset(reported)) => assert_eq!(reported, path),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("loading an absent dataset must fail"),
        }
        Ok(())
    }

    #[test]
    fn load_reports_rows_and_stable_checksum() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("dataset.csv");
        fs::write(&path, SAMPLE)?;

        let first = load_dataset(&path)?;
        let second = load_dataset(&path)?;

        assert_eq!(first.summary.rows, 3);
        assert_eq!(first.records.len(), 3);
        assert_eq!(first.summary.checksum, second.summary.checksum);
        Ok(())
    }
}
