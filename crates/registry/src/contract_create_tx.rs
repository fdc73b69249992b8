//! Contract creation transaction pipe
//!
//! Extracts contract deployments from blocks: every transaction without a
//! recipient becomes its own record.

use std::sync::Arc;

use conduit_pipeline::{Component, Pipe, PipeDefinition, PipeFactory, PipelineError, Result};
use conduit_protocol::{ComponentType, TransitData};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Block to contract-creation transactions
#[derive(Debug, Default)]
pub struct ContractCreateTxDefinition;

impl PipeDefinition for ContractCreateTxDefinition {
    fn name(&self) -> &'static str {
        "contract_create_tx"
    }

    fn transform(&self, data: TransitData) -> Result<Vec<TransitData>> {
        let Some(block) = data.as_block() else {
            return Err(PipelineError::transform(format!(
                "expected block, got {} from {}",
                data.value().kind(),
                data.origin()
            )));
        };

        let creations: Vec<TransitData> = block
            .transactions
            .iter()
            .filter(|tx| tx.is_contract_creation())
            .cloned()
            .map(|tx| TransitData::transaction(ComponentType::Pipe, tx))
            .collect();

        trace!(
            height = block.number(),
            tx_count = block.transactions.len(),
            creations = creations.len(),
            "scanned block for contract creations"
        );

        Ok(creations)
    }
}

/// Constructor for the contract creation pipe
pub struct ContractCreateTxFactory;

impl PipeFactory for ContractCreateTxFactory {
    fn create(
        &self,
        cancel: CancellationToken,
        input: mpsc::Receiver<TransitData>,
    ) -> Result<Arc<dyn Component>> {
        Ok(Arc::new(Pipe::new(
            cancel,
            input,
            Box::new(ContractCreateTxDefinition),
        )))
    }
}
