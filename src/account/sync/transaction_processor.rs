use crate::account::{AccountConfig, Transaction};
use crate::statement::RawStatementRecord;
use tracing::debug;

/// Turns raw statement records into transaction candidates for one account.
#[derive(Clone, Default)]
pub struct TransactionProcessor;

impl TransactionProcessor {
	pub fn new() -> Self {
		Self
	}

	/// Map a raw record onto a candidate carrying the account's client and account ids
	pub fn process_record(
		&self,
		account_config: &AccountConfig,
		record: &RawStatementRecord,
	) -> Transaction {
		Transaction {
			id: None,
			client_id: account_config.client_id,
			account_id: account_config.id,
			date: record.date,
			iban: record.iban.clone(),
			bic: record.bic.clone(),
			name: record.name.clone(),
			text: record.text.clone(),
			amount: record.amount,
		}
	}

	/// Batch process raw records, preserving their order
	pub fn process_records(
		&self,
		account_config: &AccountConfig,
		records: &[RawStatementRecord],
	) -> Vec<Transaction> {
		debug!(
			"Converting {} raw records for account {}",
			records.len(),
			account_config.id
		);

		records
			.iter()
			.map(|record| self.process_record(account_config, record))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::account::sync::test_support::{account_config, raw_record};
	use chrono::NaiveDate;

	#[test]
	fn maps_every_field_and_tags_the_account() {
		let config = account_config(3234421, 1);
		let record = raw_record("rawstring1", "2019-04-27", "Tenant1", 1100);

		let transaction = TransactionProcessor::new().process_record(&config, &record);

		assert_eq!(
			transaction,
			Transaction {
				id: None,
				client_id: 1,
				account_id: 3234421,
				date: NaiveDate::from_ymd_opt(2019, 4, 27),
				iban: Some("IBAN".to_string()),
				bic: Some("BIC".to_string()),
				name: Some("Tenant1".to_string()),
				text: Some("text".to_string()),
				amount: Some(1100),
			}
		);
	}

	#[test]
	fn keeps_record_order() {
		let config = account_config(1, 2);
		let records = vec![
			raw_record("b", "2019-04-14", "B", 200),
			raw_record("a", "2019-04-13", "A", 100),
		];

		let transactions = TransactionProcessor::new().process_records(&config, &records);

		assert_eq!(transactions.len(), 2);
		assert_eq!(transactions[0].name.as_deref(), Some("B"));
		assert_eq!(transactions[1].name.as_deref(), Some("A"));
	}
}
