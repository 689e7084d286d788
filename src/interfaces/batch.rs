use super::csv::command_reader::{CommandKind, CommandRecord, CommandReader};
use crate::application::service::PaymentService;
use crate::domain::transaction::{Transaction, TransactionId};
use crate::error::{PaymentError, Result};
use std::collections::HashMap;
use std::io::Read;
use tracing::{info, warn};

/// Counts of what happened to the rows of one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub applied: usize,
    pub rejected: usize,
    pub unreadable: usize,
}

/// Feeds batch rows into a `PaymentService`, resolving `tx` labels to ids.
///
/// A row that cannot be read or is refused by the service is logged and
/// skipped; it never stops the batch.
pub struct BatchRunner<'a> {
    service: &'a PaymentService,
    labels: HashMap<String, TransactionId>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(service: &'a PaymentService) -> Self {
        Self {
            service,
            labels: HashMap::new(),
        }
    }

    pub async fn run<R: Read>(&mut self, reader: CommandReader<R>) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for (row, record) in reader.commands().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!(row = row + 1, error = %e, "Error reading command");
                    summary.unreadable += 1;
                    continue;
                }
            };

            match self.execute(&record).await {
                Ok(tx) => {
                    info!(row = row + 1, tx = %record.tx, status = %tx.status, "command applied");
                    summary.applied += 1;
                }
                Err(e) => {
                    warn!(row = row + 1, tx = %record.tx, command = ?record.command, error = %e, "Command rejected");
                    summary.rejected += 1;
                }
            }
        }
        summary
    }

    async fn execute(&mut self, record: &CommandRecord) -> Result<Transaction> {
        let user = record.user_id();
        match record.command {
            CommandKind::Submit => self.submit(record).await,
            CommandKind::Verify => self.service.verify(&user, self.resolve(&record.tx)?).await,
            CommandKind::Process => {
                self.service
                    .begin_processing(&user, self.resolve(&record.tx)?)
                    .await
            }
            CommandKind::Complete => self.service.complete(&user, self.resolve(&record.tx)?).await,
            CommandKind::Reject => {
                let reason = record.reason.as_deref().unwrap_or_default();
                self.service
                    .reject(&user, self.resolve(&record.tx)?, reason)
                    .await
            }
            CommandKind::Cancel => self.service.cancel(&user, self.resolve(&record.tx)?).await,
        }
    }

    async fn submit(&mut self, record: &CommandRecord) -> Result<Transaction> {
        if self.labels.contains_key(&record.tx) {
            return Err(PaymentError::validation(
                "tx",
                format!("label '{}' is already bound to a transaction", record.tx),
            ));
        }
        let tx = self
            .service
            .submit(&record.user_id(), &record.payment_request())
            .await?;
        self.labels.insert(record.tx.clone(), tx.id);
        Ok(tx)
    }

    fn resolve(&self, label: &str) -> Result<TransactionId> {
        self.labels.get(label).copied().ok_or_else(|| {
            PaymentError::validation("tx", format!("unknown transaction label '{}'", label))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaymentConfig;
    use crate::domain::transaction::TransactionStatus;
    use crate::infrastructure::in_memory::InMemoryTransactionStore;

    const HEADER: &str = "command,user,tx,amount,currency,provider,recipient_name,recipient_account_number,swift_code,recipient_bank_name,recipient_bank_address,purpose,reference,reason";

    fn service() -> PaymentService {
        PaymentService::new(
            Box::new(InMemoryTransactionStore::new()),
            PaymentConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_batch_drives_lifecycle() {
        let service = service();
        let data = format!(
            "{}\n\
             submit,alice,t1,500.00,USD,,John Smith,ABCD12345678,chasus33,Chase Bank\n\
             submit,alice,t2,20.00,EUR,FEDWIRE,Jane Doe,ZXCV98765432,deutdeff,Deutsche Bank\n\
             verify,alice,t1\n\
             process,alice,t1\n\
             complete,alice,t1\n\
             reject,alice,t2,,,,,,,,,,,compliance review\n",
            HEADER
        );

        let summary = BatchRunner::new(&service)
            .run(CommandReader::new(data.as_bytes()))
            .await;
        assert_eq!(
            summary,
            BatchSummary {
                applied: 6,
                rejected: 0,
                unreadable: 0
            }
        );

        let all = service.into_transactions().await.unwrap();
        let statuses: Vec<TransactionStatus> = all.iter().map(|tx| tx.status).collect();
        assert!(statuses.contains(&TransactionStatus::Completed));
        assert!(statuses.contains(&TransactionStatus::Rejected));
    }

    #[tokio::test]
    async fn test_bad_rows_are_skipped() {
        let service = service();
        let data = format!(
            "{}\n\
             refund,alice,t1\n\
             verify,alice,nope\n\
             submit,alice,t1,0.50,USD,,John Smith,ABCD12345678,chasus33,Chase Bank\n\
             submit,alice,t2,10.00,USD,,John Smith,ABCD12345678,chasus33,Chase Bank\n\
             submit,alice,t2,10.00,USD,,John Smith,ABCD12345678,chasus33,Chase Bank\n\
             cancel,bob,t2\n",
            HEADER
        );

        let summary = BatchRunner::new(&service)
            .run(CommandReader::new(data.as_bytes()))
            .await;
        assert_eq!(
            summary,
            BatchSummary {
                applied: 1,
                rejected: 4,
                unreadable: 1
            }
        );
    }
}
