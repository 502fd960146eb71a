//! Flat CSV export of disclosure events

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{MarketError, MarketResult};
use crate::models::{Actor, DisclosureEvent};

/// Column labels, in output order
pub const EXPORT_COLUMNS: [&str; 9] = [
    "Date",
    "Buyer Name",
    "Buyer Email",
    "Buyer Phone",
    "Seller Name",
    "Seller Email",
    "Seller Phone",
    "Origin",
    "Agent",
];

/// One flattened export line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub date: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub seller_name: String,
    pub seller_email: String,
    pub seller_phone: String,
    pub origin: String,
    pub agent: String,
}

impl ExportRow {
    /// Missing actors and fields render as empty cells
    pub fn from_event(event: &DisclosureEvent, buyer: Option<&Actor>, seller: Option<&Actor>) -> Self {
        let name = |a: Option<&Actor>| a.map(|a| a.name.clone()).unwrap_or_default();
        let email = |a: Option<&Actor>| a.and_then(|a| a.email.clone()).unwrap_or_default();
        let phone = |a: Option<&Actor>| a.and_then(|a| a.phone.clone()).unwrap_or_default();

        Self {
            date: iso_timestamp(event.viewed_at),
            buyer_name: name(buyer),
            buyer_email: email(buyer),
            buyer_phone: phone(buyer),
            seller_name: name(seller),
            seller_email: email(seller),
            seller_phone: phone(seller),
            origin: event.origin.clone().unwrap_or_default(),
            agent: event.agent.clone().unwrap_or_default(),
        }
    }

    fn fields(&self) -> [&str; 9] {
        [
            self.date.as_str(),
            self.buyer_name.as_str(),
            self.buyer_email.as_str(),
            self.buyer_phone.as_str(),
            self.seller_name.as_str(),
            self.seller_email.as_str(),
            self.seller_phone.as_str(),
            self.origin.as_str(),
            self.agent.as_str(),
        ]
    }
}

pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Export file name carrying the export time in unix milliseconds
pub fn export_filename(at: DateTime<Utc>) -> String {
    format!("disclosure-events-{}.csv", at.timestamp_millis())
}

pub fn write_csv(rows: &[ExportRow]) -> MarketResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_COLUMNS)
        .map_err(|e| MarketError::Unexpected(format!("csv header: {}", e)))?;

    for row in rows {
        writer
            .write_record(row.fields())
            .map_err(|e| MarketError::Unexpected(format!("csv row: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| MarketError::Unexpected(format!("csv flush: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| MarketError::Unexpected(format!("csv encoding: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::TimeZone;

    #[test]
    fn test_csv_header_and_quoting() {
        let buyer = Actor::new("Ola, Jr.", Role::Buyer).with_email("ola@example.com", true);
        let seller = Actor::new("Pit Farm", Role::Seller).with_phone("0711");
        let mut event = DisclosureEvent::new(
            buyer.id,
            seller.id,
            Some("10.1.2.3".into()),
            Some("Mozilla/5.0 \"test\"".into()),
        );
        event.viewed_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        let row = ExportRow::from_event(&event, Some(&buyer), Some(&seller));
        let csv = write_csv(&[row]).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Date,Buyer Name,Buyer Email,Buyer Phone,Seller Name,Seller Email,Seller Phone,Origin,Agent"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2024-03-01T12:30:00.000Z,\"Ola, Jr.\",ola@example.com,,Pit Farm,,0711,10.1.2.3,\"Mozilla/5.0 \"\"test\"\"\""
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_missing_actor_renders_empty() {
        let event = DisclosureEvent::new(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), None, None);
        let row = ExportRow::from_event(&event, None, None);
        assert!(row.buyer_name.is_empty());
        assert!(row.seller_phone.is_empty());
        assert!(!row.date.is_empty());
    }

    #[test]
    fn test_export_filename() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(export_filename(at), "disclosure-events-1700000000123.csv");
    }
}
