use super::{FeedBatch, FeedError, RawBill};
use crate::bills::Chamber;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

const REFERENCE_URL_BASE: &str = "https://www.parl.ca/legisinfo/en/bill";

/// Decodes a LEGISinfo JSON listing.
///
/// The body must be a JSON array. Entries that are not objects of the expected
/// shape, or that lack a bill number or session code, are counted in
/// [`FeedBatch::dropped`] instead of failing the whole batch.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedBatch, FeedError> {
    let rows: Vec<serde_json::Value> = serde_json::from_slice(bytes).map_err(FeedError::Decode)?;
    let mut batch = FeedBatch::default();

    for value in rows {
        let row = match serde_json::from_value::<FeedRow>(value) {
            Ok(row) => row,
            Err(err) => {
                debug!(error = %err, "skipping malformed feed entry");
                batch.dropped += 1;
                continue;
            }
        };

        match row.into_raw_bill() {
            Some(bill) => batch.bills.push(bill),
            None => batch.dropped += 1,
        }
    }

    Ok(batch)
}

#[derive(Debug, Deserialize)]
struct FeedRow {
    #[serde(rename = "BillNumberFormatted", default, deserialize_with = "lenient_text")]
    bill_number: Option<String>,
    #[serde(rename = "ParlSessionCode", default, deserialize_with = "lenient_text")]
    session: Option<String>,
    #[serde(rename = "LongTitleEn", default, deserialize_with = "lenient_text")]
    long_title: Option<String>,
    #[serde(rename = "ShortTitleEn", default, deserialize_with = "lenient_text")]
    short_title: Option<String>,
    #[serde(rename = "CurrentStatusEn", default, deserialize_with = "lenient_text")]
    current_status: Option<String>,
    #[serde(
        rename = "LatestCompletedMajorStageEn",
        default,
        deserialize_with = "lenient_text"
    )]
    latest_major_stage: Option<String>,
    #[serde(rename = "CurrentStatusId", default, deserialize_with = "lenient_text")]
    status_id: Option<String>,
    #[serde(rename = "OriginatingChamberId", default, deserialize_with = "lenient_text")]
    originating_chamber_id: Option<String>,
    #[serde(rename = "Chamber", default, deserialize_with = "lenient_text")]
    chamber_name: Option<String>,
    #[serde(rename = "SponsorEn", default, deserialize_with = "lenient_text")]
    sponsor: Option<String>,
    #[serde(rename = "PoliticalAffiliationId", default, deserialize_with = "lenient_text")]
    affiliation_id: Option<String>,
    #[serde(
        rename = "ReceivedRoyalAssentDateTime",
        default,
        deserialize_with = "lenient_text"
    )]
    royal_assent_at: Option<String>,
    #[serde(rename = "LatestActivityDateTime", default, deserialize_with = "lenient_text")]
    latest_activity_at: Option<String>,
    #[serde(rename = "MinistryId", default, deserialize_with = "lenient_text")]
    ministry_id: Option<String>,
    #[serde(rename = "BillTypeEn", default, deserialize_with = "lenient_text")]
    bill_type: Option<String>,
    #[serde(rename = "Publications", default, deserialize_with = "publication_count")]
    publication_count: u32,
}

impl FeedRow {
    fn into_raw_bill(self) -> Option<RawBill> {
        let chamber = self.chamber();
        let has_royal_recommendation = self.has_royal_recommendation();

        let bill_id = self.bill_number?;
        let session = self.session?;
        let reference_url = format!("{REFERENCE_URL_BASE}/{session}/{bill_id}");

        Some(RawBill {
            title: self
                .long_title
                .or(self.short_title)
                .unwrap_or_else(|| "Unknown Title".to_string()),
            status_code: self.status_id.unwrap_or_else(|| "UNKNOWN".to_string()),
            status_text: self
                .current_status
                .or(self.latest_major_stage)
                .unwrap_or_else(|| "Unknown Status".to_string()),
            chamber,
            reference_url,
            sponsor: self.sponsor,
            sponsor_affiliation: self.affiliation_id,
            enactment_date: self.royal_assent_at.as_deref().and_then(parse_datetime),
            last_activity: self.latest_activity_at.as_deref().and_then(parse_datetime),
            has_royal_recommendation,
            publication_count: self.publication_count,
            bill_id,
            session,
        })
    }

    fn chamber(&self) -> Chamber {
        self.originating_chamber_id
            .as_deref()
            .and_then(Chamber::from_feed_id)
            .or_else(|| self.chamber_name.as_deref().map(Chamber::from_name))
            .unwrap_or(Chamber::Unknown)
    }

    fn has_royal_recommendation(&self) -> bool {
        let ministry = self
            .ministry_id
            .as_deref()
            .is_some_and(|id| id != "0");
        let government = self
            .bill_type
            .as_deref()
            .is_some_and(|kind| kind.contains("Government Bill"));
        ministry || government
    }
}

/// Accepts a string or a number and yields `None` for anything else, so a
/// cosmetic field of an unexpected type never costs the whole entry.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text.trim().to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
    .filter(|text| !text.is_empty()))
}

/// Counts publications given as an array, as an object wrapping one
/// (`{"Publication": [...]}`), or as a single wrapped object.
fn publication_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    fn count(value: &Value) -> usize {
        match value {
            Value::Array(items) => items.len(),
            Value::Object(fields) => fields.values().map(count_wrapped).max().unwrap_or(0),
            _ => 0,
        }
    }

    fn count_wrapped(value: &Value) -> usize {
        match value {
            Value::Array(items) => items.len(),
            Value::Object(_) => 1,
            _ => 0,
        }
    }

    let value = Option::<Value>::deserialize(deserializer)?;
    let total = value.as_ref().map_or(0, count);
    Ok(u32::try_from(total).unwrap_or(u32::MAX))
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}
